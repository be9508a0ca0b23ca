/// 3D point type used for vertex positions.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Relative tolerance used when deciding whether an extent is degenerate.
pub const SMALL: f64 = 1e-12;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box that contains exactly one point.
    #[must_use]
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Grows the box so that it contains `p`.
    pub fn include(&mut self, p: &Point3) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Returns the smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.include(&other.min);
        out.include(&other.max);
        out
    }

    /// Size of the box along each axis.
    #[must_use]
    pub fn extent(&self) -> Vector3 {
        self.max - self.min
    }
}

/// Number of axes along which `extent` is not degenerate.
///
/// An axis counts if its extent exceeds [`SMALL`] scaled by the largest
/// extent; the highest such axis index plus one is returned.
#[must_use]
pub fn significant_dimension(extent: &Vector3) -> usize {
    let rel_small = SMALL * extent.max();
    (0..3).rev().find(|&i| extent[i] > rel_small).map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn union_grows_both_corners() {
        let a = Aabb::from_point(Point3::new(0.0, 1.0, 2.0));
        let b = Aabb::from_point(Point3::new(-1.0, 3.0, 2.0));
        let u = a.union(&b);
        assert_relative_eq!(u.min, Point3::new(-1.0, 1.0, 2.0));
        assert_relative_eq!(u.max, Point3::new(0.0, 3.0, 2.0));
    }

    #[test]
    fn flat_box_is_two_dimensional() {
        assert_eq!(significant_dimension(&Vector3::new(2.0, 1.0, 0.0)), 2);
        assert_eq!(significant_dimension(&Vector3::new(2.0, 0.0, 0.0)), 1);
        assert_eq!(significant_dimension(&Vector3::new(0.0, 0.0, 1e-3)), 3);
    }

    #[test]
    fn degenerate_box_has_no_dimension() {
        assert_eq!(significant_dimension(&Vector3::zeros()), 0);
    }
}
