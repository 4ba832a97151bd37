//! Axis-aligned bounding boxes.
//!
//! Boxes are closed: a point on any face is inside, and two boxes that only
//! share a face intersect. Region shapes and index nodes both rely on this, so
//! a point on the seam between two adjacent regions belongs to both.
//!
//! # Example
//!
//! ```
//! use ward_spatial::Aabb;
//! use nalgebra::Point3;
//!
//! let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0)).unwrap();
//! let b = Aabb::new(Point3::new(10.0, 0.0, 0.0), Point3::new(20.0, 5.0, 5.0)).unwrap();
//!
//! assert!(a.intersects(&b)); // shared face
//! assert!(a.contains(&Point3::new(10.0, 3.0, 3.0)));
//! ```

use nalgebra::Point3;

use crate::error::SpatialError;

/// An axis-aligned bounding box in world coordinates.
///
/// # Example
///
/// ```
/// use ward_spatial::Aabb;
/// use nalgebra::Point3;
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// ).unwrap();
///
/// assert!(aabb.contains(&Point3::new(5.0, 5.0, 5.0)));
/// assert!(!aabb.contains(&Point3::new(15.0, 5.0, 5.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3<f64>,
    /// Maximum corner of the bounding box.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates a new AABB from its minimum and maximum corners.
    ///
    /// Unlike [`Aabb::from_corners`], the corners are not reordered: an
    /// inverted axis is a malformed box.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidBox`] if a coordinate is NaN or infinite,
    /// or if `min` exceeds `max` on any axis.
    ///
    /// # Example
    ///
    /// ```
    /// use ward_spatial::Aabb;
    /// use nalgebra::Point3;
    ///
    /// assert!(Aabb::new(Point3::new(5.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0)).is_err());
    /// assert!(Aabb::new(Point3::new(f64::NAN, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).is_err());
    /// ```
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Result<Self, SpatialError> {
        let aabb = Self { min, max };
        aabb.validate()?;
        Ok(aabb)
    }

    /// Creates an AABB spanning two arbitrary corners.
    ///
    /// The corners are reordered per axis, so this never produces an inverted
    /// box (it may still hold non-finite values; see [`Aabb::validate`]).
    ///
    /// # Example
    ///
    /// ```
    /// use ward_spatial::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::from_corners(
    ///     Point3::new(10.0, 10.0, 10.0),
    ///     Point3::new(0.0, 0.0, 0.0),
    /// );
    /// assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
    /// assert_eq!(aabb.max, Point3::new(10.0, 10.0, 10.0));
    /// ```
    #[must_use]
    pub fn from_corners(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a zero-extent box at a single point.
    #[must_use]
    pub const fn point(p: Point3<f64>) -> Self {
        Self { min: p, max: p }
    }

    /// Checks that every coordinate is finite and no axis is inverted.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidBox`] describing the first problem found.
    pub fn validate(&self) -> Result<(), SpatialError> {
        let coords = [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(SpatialError::InvalidBox {
                aabb: *self,
                reason: "non-finite coordinate",
            });
        }
        if self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z {
            return Err(SpatialError::InvalidBox {
                aabb: *self,
                reason: "inverted axis",
            });
        }
        Ok(())
    }

    /// Returns `true` if the box passes [`Aabb::validate`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns the center point of the AABB.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Returns the full size (dimensions) of the AABB.
    #[must_use]
    pub fn size(&self) -> nalgebra::Vector3<f64> {
        nalgebra::Vector3::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }

    /// Returns the volume of the box.
    ///
    /// Flat boxes (for example a single block layer with `min.y == max.y`)
    /// have zero volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Returns the sum of the edge lengths (the "margin").
    ///
    /// Used to break ties between boxes of equal volume, which is common
    /// for flat boxes.
    #[must_use]
    pub fn margin(&self) -> f64 {
        let size = self.size();
        size.x + size.y + size.z
    }

    /// Checks if a point is inside the AABB.
    ///
    /// Points on the boundary are considered inside.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Checks if `other` lies entirely within this AABB.
    #[must_use]
    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// Checks if this AABB intersects another AABB.
    ///
    /// Touching boxes intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Expands this AABB to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Returns a new AABB that is the union of this AABB and another.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Returns the intersection of this AABB and another, if they overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = Point3::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        let max = Point3::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );

        if min.x <= max.x && min.y <= max.y && min.z <= max.z {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Returns how much this box's volume grows if it is extended to cover `other`.
    #[must_use]
    pub fn enlargement(&self, other: &Self) -> f64 {
        self.union(other).volume() - self.volume()
    }

    /// Returns the smallest box covering every box in the iterator, or `None`
    /// if the iterator is empty.
    pub fn covering<'a>(boxes: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        boxes
            .into_iter()
            .fold(None, |acc: Option<Self>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::point(Point3::origin())
    }
}
