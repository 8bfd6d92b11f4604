use super::Point3;

/// Angle reported for incidences that have no direction: point-like
/// primitives and lines whose vertices all coincide.
pub const DEGENERATE_ANGLE: f32 = -9.0;

/// Direction of a line where it leaves its first vertex.
///
/// The first vertex that differs from the start is used, so repeated start
/// vertices do not produce a zero-length direction.
#[must_use]
pub fn begin_angle(points: &[Point3]) -> f32 {
    let Some(first) = points.first() else {
        return DEGENERATE_ANGLE;
    };
    points
        .iter()
        .skip(1)
        .find(|p| p.x != first.x || p.y != first.y)
        .map_or(DEGENERATE_ANGLE, |p| direction(first, p))
}

/// Direction of a line where it leaves its last vertex, walking backwards.
#[must_use]
pub fn end_angle(points: &[Point3]) -> f32 {
    let Some(last) = points.last() else {
        return DEGENERATE_ANGLE;
    };
    points
        .iter()
        .rev()
        .skip(1)
        .find(|p| p.x != last.x || p.y != last.y)
        .map_or(DEGENERATE_ANGLE, |p| direction(last, p))
}

#[allow(clippy::cast_possible_truncation)]
fn direction(from: &Point3, to: &Point3) -> f32 {
    (to.y - from.y).atan2(to.x - from.x) as f32
}
