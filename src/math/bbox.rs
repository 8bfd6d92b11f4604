use super::Point3;

/// An axis-aligned bounding box.
///
/// An empty box has `min = +inf` and `max = -inf` on every axis, so that
/// extending it with any point or box yields exactly that point or box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    /// Minimum corner (west, south, bottom).
    pub min: Point3,
    /// Maximum corner (east, north, top).
    pub max: Point3,
}

impl Default for BoundBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundBox {
    /// Creates a box from its two corners.
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Creates a 2D box with an unbounded vertical extent.
    #[must_use]
    pub fn from_xy(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: Point3::new(min_x, min_y, f64::NEG_INFINITY),
            max: Point3::new(max_x, max_y, f64::INFINITY),
        }
    }

    /// Returns the empty box.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Returns the degenerate box of a single point.
    #[must_use]
    pub fn point(p: &Point3) -> Self {
        Self { min: *p, max: *p }
    }

    /// Returns the union of the extents of `points`.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.extend_point(p);
        }
        b
    }

    /// Returns `true` if the box contains no point at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to include `p`.
    pub fn extend_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Grows the box to include `other`.
    pub fn extend(&mut self, other: &BoundBox) {
        if other.is_empty() {
            return;
        }
        self.extend_point(&other.min);
        self.extend_point(&other.max);
    }

    /// Returns the smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &BoundBox) -> BoundBox {
        let mut b = *self;
        b.extend(other);
        b
    }

    /// Returns the intersection of both boxes, or `None` if they are disjoint.
    #[must_use]
    pub fn clip(&self, other: &BoundBox) -> Option<BoundBox> {
        let b = BoundBox {
            min: Point3::new(
                self.min.x.max(other.min.x),
                self.min.y.max(other.min.y),
                self.min.z.max(other.min.z),
            ),
            max: Point3::new(
                self.max.x.min(other.max.x),
                self.max.y.min(other.max.y),
                self.max.z.min(other.max.z),
            ),
        };
        (!b.is_empty()).then_some(b)
    }

    /// Returns a copy grown by `d` in x and y.
    #[must_use]
    pub fn expanded_2d(&self, d: f64) -> BoundBox {
        BoundBox {
            min: Point3::new(self.min.x - d, self.min.y - d, self.min.z),
            max: Point3::new(self.max.x + d, self.max.y + d, self.max.z),
        }
    }

    /// Returns `true` if the boxes share at least one point in x and y.
    #[must_use]
    pub fn overlaps_2d(&self, other: &BoundBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Returns `true` if the boxes share at least one point in x, y and z.
    #[must_use]
    pub fn overlaps(&self, other: &BoundBox) -> bool {
        self.overlaps_2d(other) && self.min.z <= other.max.z && other.min.z <= self.max.z
    }

    /// Returns `true` if `p` lies inside or on the border in x and y.
    #[must_use]
    pub fn contains_point_2d(&self, p: &Point3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Returns `true` if `other` lies entirely inside this box in x and y.
    #[must_use]
    pub fn contains_box_2d(&self, other: &BoundBox) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }

    /// Returns `true` if `other` lies entirely inside this box on all axes.
    #[must_use]
    pub fn contains_box(&self, other: &BoundBox) -> bool {
        self.contains_box_2d(other) && other.min.z >= self.min.z && other.max.z <= self.max.z
    }

    /// Planar area of the box; zero for empty boxes.
    #[must_use]
    pub fn area_2d(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.max.x - self.min.x) * (self.max.y - self.min.y)
    }

    /// Volume of the box; zero for empty boxes.
    #[must_use]
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.area_2d() * (self.max.z - self.min.z)
    }
}
