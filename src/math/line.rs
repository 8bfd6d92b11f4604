use super::Point3;

/// Planar length of a polyline.
#[must_use]
pub fn length_2d(points: &[Point3]) -> f64 {
    points
        .windows(2)
        .map(|w| ((w[1].x - w[0].x).powi(2) + (w[1].y - w[0].y).powi(2)).sqrt())
        .sum()
}

/// Planar distance between two points.
#[must_use]
pub fn distance_2d(a: &Point3, b: &Point3) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Returns `true` if both vertex sequences are identical, forward or reversed.
///
/// Comparison is exact; `ignore_z` drops the z coordinate from it.
#[must_use]
pub fn same_vertices(a: &[Point3], b: &[Point3], ignore_z: bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let eq = |p: &Point3, q: &Point3| p.x == q.x && p.y == q.y && (ignore_z || p.z == q.z);
    a.iter().zip(b).all(|(p, q)| eq(p, q)) || a.iter().zip(b.iter().rev()).all(|(p, q)| eq(p, q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn length_of_l_shape() {
        let pts = [p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(3.0, 4.0, 9.0)];
        assert!((length_2d(&pts) - 7.0).abs() < 1e-12);
        assert!(length_2d(&pts[..1]).abs() < f64::EPSILON);
    }

    #[test]
    fn same_vertices_forward_and_reversed() {
        let a = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)];
        let mut b = a.to_vec();
        b.reverse();
        assert!(same_vertices(&a, &a, false));
        assert!(same_vertices(&a, &b, false));
        assert!(!same_vertices(&a, &a[..2], false));
    }

    #[test]
    fn z_only_matters_when_asked() {
        let a = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)];
        let b = [p(0.0, 0.0, 5.0), p(1.0, 0.0, 0.0)];
        assert!(!same_vertices(&a, &b, false));
        assert!(same_vertices(&a, &b, true));
    }
}
