use super::{Point3, TOLERANCE};

/// Location of a point relative to a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    OnBoundary,
}

/// Computes the signed area of a ring in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. A closing vertex
/// equal to the first one may be present or not.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Classifies `(x, y)` against a ring by crossing number.
///
/// Points within [`TOLERANCE`] of an edge are reported as on the boundary.
#[must_use]
pub fn point_location(x: f64, y: f64, ring: &[Point3]) -> PointLocation {
    let n = ring.len();
    if n < 3 {
        return PointLocation::Outside;
    }
    let mut inside = false;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        if on_segment(x, y, a, b) {
            return PointLocation::OnBoundary;
        }
        if (a.y > y) != (b.y > y) {
            let xi = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x < xi {
                inside = !inside;
            }
        }
    }
    if inside {
        PointLocation::Inside
    } else {
        PointLocation::Outside
    }
}

fn on_segment(x: f64, y: f64, a: &Point3, b: &Point3) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let cross = dx * (y - a.y) - dy * (x - a.x);
    let len = (dx * dx + dy * dy).sqrt();
    if cross.abs() > TOLERANCE * len.max(1.0) {
        return false;
    }
    x >= a.x.min(b.x) - TOLERANCE
        && x <= a.x.max(b.x) + TOLERANCE
        && y >= a.y.min(b.y) - TOLERANCE
        && y <= a.y.max(b.y) + TOLERANCE
}

/// Appends `points` to `ring`, dropping the first vertex when it repeats the
/// current last one.
pub fn append_to_ring(ring: &mut Vec<Point3>, points: impl IntoIterator<Item = Point3>) {
    for p in points {
        if ring.last().is_some_and(|l| l.x == p.x && l.y == p.y) {
            continue;
        }
        ring.push(p);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        let area = signed_area_2d(&square());
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square();
        pts.reverse();
        let area = signed_area_2d(&pts);
        assert!((area + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_with_closing_vertex() {
        let mut pts = square();
        pts.push(pts[0]);
        assert!((signed_area_2d(&pts) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!((signed_area_2d(&[Point3::new(0.0, 0.0, 0.0)])).abs() < TOLERANCE);
        assert!((signed_area_2d(&[])).abs() < TOLERANCE);
    }

    #[test]
    fn point_location_basic() {
        let ring = square();
        assert_eq!(point_location(0.5, 0.5, &ring), PointLocation::Inside);
        assert_eq!(point_location(1.5, 0.5, &ring), PointLocation::Outside);
        assert_eq!(point_location(1.0, 0.5, &ring), PointLocation::OnBoundary);
        assert_eq!(point_location(0.0, 0.0, &ring), PointLocation::OnBoundary);
    }

    #[test]
    fn point_location_concave() {
        // U shape opening upwards.
        let ring = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(2.0, 3.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        assert_eq!(point_location(1.5, 2.0, &ring), PointLocation::Outside);
        assert_eq!(point_location(0.5, 2.0, &ring), PointLocation::Inside);
        assert_eq!(point_location(1.5, 0.5, &ring), PointLocation::Inside);
    }

    #[test]
    fn append_skips_joint() {
        let mut ring = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        append_to_ring(
            &mut ring,
            [Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
        );
        assert_eq!(ring.len(), 3);
    }
}
