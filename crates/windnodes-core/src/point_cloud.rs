//! Stacked N×3 node coordinates

use serde::{Deserialize, Serialize};

/// A single (x, y, z) coordinate in meters
pub type Point3 = [f64; 3];

/// Axis-aligned bounding box of a point cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds {
    /// Bounds of a single point
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow the box to contain `p`
    pub fn include(&mut self, p: Point3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Smallest box containing both `self` and `other`
    pub fn union(mut self, other: &Bounds) -> Self {
        self.include(other.min);
        self.include(other.max);
        self
    }

    /// Edge lengths along x, y and z
    pub fn extent(&self) -> Point3 {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Ordered stack of node coordinates, one row per node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointCloud {
    points: Vec<Point3>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn push(&mut self, p: Point3) {
        self.points.push(p);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point3> {
        self.points.iter()
    }

    /// Mean coordinate, `None` for an empty cloud
    pub fn centroid(&self) -> Option<Point3> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sum = self.points.iter().fold([0f64; 3], |mut acc, p| {
            acc.iter_mut().zip(p.iter()).for_each(|(a, x)| *a += x);
            acc
        });
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    }

    /// Points whose three coordinates are all finite
    pub fn finite(&self) -> impl Iterator<Item = &Point3> {
        self.points.iter().filter(|p| p.iter().all(|v| v.is_finite()))
    }

    /// Axis-aligned bounds of the finite points, `None` if there are none
    pub fn bounds(&self) -> Option<Bounds> {
        let mut finite = self.finite();
        let mut bounds = Bounds::from_point(*finite.next()?);
        finite.for_each(|p| bounds.include(*p));
        Some(bounds)
    }
}

impl From<Vec<Point3>> for PointCloud {
    fn from(points: Vec<Point3>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point3> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3;
    type IntoIter = std::slice::Iter<'a, Point3>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cloud_has_no_summary() {
        let cloud = PointCloud::new();
        assert!(cloud.is_empty());
        assert_eq!(cloud.centroid(), None);
        assert_eq!(cloud.bounds(), None);
    }

    #[test]
    fn test_centroid_and_bounds() {
        let cloud: PointCloud = vec![[0.0, 0.0, 1.0], [2.0, -4.0, 3.0]].into();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.centroid(), Some([1.0, -2.0, 2.0]));

        let bounds = cloud.bounds().unwrap();
        assert_eq!(bounds.min, [0.0, -4.0, 1.0]);
        assert_eq!(bounds.max, [2.0, 0.0, 3.0]);
        assert_eq!(bounds.extent(), [2.0, 4.0, 2.0]);
    }

    #[test]
    fn test_bounds_skip_non_finite_points() {
        let cloud: PointCloud = vec![
            [f64::NAN, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [f64::INFINITY, -5.0, 0.0],
            [2.0, 0.0, 3.0],
        ]
        .into();
        assert_eq!(cloud.finite().count(), 2);
        let bounds = cloud.bounds().unwrap();
        assert_eq!(bounds.min, [1.0, 0.0, 1.0]);
        assert_eq!(bounds.max, [2.0, 1.0, 3.0]);
        assert!(cloud.centroid().unwrap()[0].is_nan());

        let lost: PointCloud = vec![[f64::NAN; 3]].into();
        assert_eq!(lost.bounds(), None);
    }

    #[test]
    fn test_bounds_union() {
        let a = Bounds::from_point([0.0, 0.0, 0.0]);
        let b = Bounds { min: [-1.0, 2.0, 0.5], max: [1.0, 3.0, 0.5] };
        let u = a.union(&b);
        assert_eq!(u.min, [-1.0, 0.0, 0.0]);
        assert_eq!(u.max, [1.0, 3.0, 0.5]);
    }
}
