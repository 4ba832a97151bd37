//! Region shapes.
//!
//! A [`Shape`] is one of three closed variants:
//!
//! - [`Shape::Cuboid`] - an axis-aligned box of blocks
//! - [`Shape::Polygon`] - a 2D polygon in the X/Z plane, extruded between
//!   two heights
//! - [`Shape::Global`] - the whole world
//!
//! All ranges are inclusive. Y is up. Points on a boundary (a face, an
//! edge, a vertex) are inside, for containment and intersection alike, so
//! two regions sharing an edge both claim the blocks on it.
//!
//! # Example
//!
//! ```
//! use region_types::Shape;
//! use nalgebra::{Point2, Point3};
//!
//! let plot = Shape::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(9.0, 255.0, 9.0))?;
//! assert!(plot.contains(&Point3::new(9.0, 64.0, 0.0)));
//!
//! let lake = Shape::polygon(
//!     vec![Point2::new(0.0, 0.0), Point2::new(20.0, 0.0), Point2::new(0.0, 20.0)],
//!     0.0,
//!     64.0,
//! )?;
//! assert!(lake.contains(&Point3::new(10.0, 10.0, 10.0)));
//! assert!(!lake.contains(&Point3::new(15.0, 10.0, 15.0)));
//! assert!(plot.intersects(&lake));
//! # Ok::<(), region_types::RegionError>(())
//! ```

use std::fmt;

use nalgebra::{Point2, Point3};
use ward_spatial::Aabb;

use crate::error::{RegionError, RegionResult};

/// The geometric extent of a region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// An axis-aligned box; both corners are inside.
    Cuboid(Aabb),
    /// A vertical prism over a polygon footprint.
    Polygon(Polygon),
    /// The whole world. Contains every point and has no bounding box.
    Global,
}

/// Discriminant of a [`Shape`], for summaries and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    /// [`Shape::Cuboid`].
    Cuboid,
    /// [`Shape::Polygon`].
    Polygon,
    /// [`Shape::Global`].
    Global,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cuboid => "cuboid",
            Self::Polygon => "polygon",
            Self::Global => "global",
        })
    }
}

impl Shape {
    /// Creates a cuboid from its minimum and maximum corners.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidShape`] if a coordinate is not finite
    /// or `min` exceeds `max` on any axis. Corners are not reordered.
    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> RegionResult<Self> {
        let shape = Self::Cuboid(Aabb { min, max });
        shape.validate()?;
        Ok(shape)
    }

    /// Creates an extruded polygon.
    ///
    /// `vertices` are `(x, z)` pairs; the last vertex connects back to the
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidShape`] if there are fewer than three
    /// vertices, any value is not finite, the footprint has zero area, or
    /// `min_y > max_y`.
    pub fn polygon(vertices: Vec<Point2<f64>>, min_y: f64, max_y: f64) -> RegionResult<Self> {
        Ok(Self::Polygon(Polygon::new(vertices, min_y, max_y)?))
    }

    /// Returns the variant of this shape.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Cuboid(_) => ShapeKind::Cuboid,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Global => ShapeKind::Global,
        }
    }

    /// Returns `true` for [`Shape::Global`].
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Checks that the shape is well formed.
    ///
    /// Shapes built with [`Shape::cuboid`] or [`Shape::polygon`] are always
    /// valid; this is for shapes assembled by hand or deserialized.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidShape`] describing the problem.
    pub fn validate(&self) -> RegionResult<()> {
        match self {
            Self::Cuboid(bbox) => bbox
                .validate()
                .map_err(|e| RegionError::invalid_shape(format!("cuboid: {e}"))),
            Self::Polygon(polygon) => polygon.validate(),
            Self::Global => Ok(()),
        }
    }

    /// Returns the box the spatial index stores for this shape.
    ///
    /// `None` for [`Shape::Global`], which has no finite extent.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        match self {
            Self::Cuboid(bbox) => Some(*bbox),
            Self::Polygon(polygon) => Some(polygon.bounding_box()),
            Self::Global => None,
        }
    }

    /// Returns `true` if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            Self::Cuboid(bbox) => bbox.contains(point),
            Self::Polygon(polygon) => polygon.contains(point),
            Self::Global => true,
        }
    }

    /// Returns `true` if the two shapes share at least one point.
    ///
    /// Touching counts. [`Shape::Global`] intersects nothing: it is the
    /// backdrop for every other region, never an overlap with one.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let (Some(a), Some(b)) = (self.bounding_box(), other.bounding_box()) else {
            return false;
        };
        if !a.intersects(&b) {
            return false;
        }
        if let (Self::Cuboid(_), Self::Cuboid(_)) = (self, other) {
            return true;
        }

        // Boxes overlap, so the vertical ranges do too; only the footprints
        // remain to be compared.
        let fa = self.footprint();
        let fb = other.footprint();
        fa.iter().any(|v| footprint_contains(&fb, v.x, v.y))
            || fb.iter().any(|v| footprint_contains(&fa, v.x, v.y))
            || edges_cross(&fa, &fb)
    }

    /// The X/Z outline of a bounded shape.
    fn footprint(&self) -> Vec<Point2<f64>> {
        match self {
            Self::Cuboid(bbox) => vec![
                Point2::new(bbox.min.x, bbox.min.z),
                Point2::new(bbox.max.x, bbox.min.z),
                Point2::new(bbox.max.x, bbox.max.z),
                Point2::new(bbox.min.x, bbox.max.z),
            ],
            Self::Polygon(polygon) => polygon.vertices.clone(),
            Self::Global => Vec::new(),
        }
    }
}

/// A polygon footprint in the X/Z plane extruded from `min_y` to `max_y`.
///
/// `Point2::y` holds the Z coordinate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PolygonParts", into = "PolygonParts")
)]
pub struct Polygon {
    vertices: Vec<Point2<f64>>,
    min_y: f64,
    max_y: f64,
    bounds: Aabb,
}

impl Polygon {
    /// Creates a validated polygon.
    ///
    /// # Errors
    ///
    /// See [`Shape::polygon`].
    pub fn new(vertices: Vec<Point2<f64>>, min_y: f64, max_y: f64) -> RegionResult<Self> {
        let bounds = polygon_bounds(&vertices, min_y, max_y);
        let polygon = Self {
            vertices,
            min_y,
            max_y,
            bounds,
        };
        polygon.validate()?;
        Ok(polygon)
    }

    /// Returns the footprint vertices as `(x, z)` pairs.
    #[must_use]
    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    /// Returns the lowest contained Y.
    #[must_use]
    pub const fn min_y(&self) -> f64 {
        self.min_y
    }

    /// Returns the highest contained Y.
    #[must_use]
    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Returns the bounding box of the prism.
    #[must_use]
    pub const fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    /// Returns the signed footprint area (positive when counter-clockwise).
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice / 2.0
    }

    #[allow(clippy::float_cmp)]
    fn validate(&self) -> RegionResult<()> {
        if self.vertices.len() < 3 {
            return Err(RegionError::invalid_shape(format!(
                "polygon needs at least 3 vertices, got {}",
                self.vertices.len()
            )));
        }
        if self
            .vertices
            .iter()
            .any(|v| !v.x.is_finite() || !v.y.is_finite())
            || !self.min_y.is_finite()
            || !self.max_y.is_finite()
        {
            return Err(RegionError::invalid_shape(
                "polygon has a non-finite coordinate",
            ));
        }
        if self.min_y > self.max_y {
            return Err(RegionError::invalid_shape(format!(
                "polygon min_y {} exceeds max_y {}",
                self.min_y, self.max_y
            )));
        }
        if self.signed_area() == 0.0 {
            return Err(RegionError::invalid_shape("polygon footprint has zero area"));
        }
        Ok(())
    }

    /// Returns `true` if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        if !self.bounds.contains(point) {
            return false;
        }
        footprint_contains(&self.vertices, point.x, point.z)
    }
}

fn polygon_bounds(vertices: &[Point2<f64>], min_y: f64, max_y: f64) -> Aabb {
    let mut bounds = Aabb::point(Point3::new(
        vertices.first().map_or(0.0, |v| v.x),
        min_y,
        vertices.first().map_or(0.0, |v| v.y),
    ));
    for v in vertices {
        bounds.expand_to_include(&Point3::new(v.x, min_y, v.y));
        bounds.expand_to_include(&Point3::new(v.x, max_y, v.y));
    }
    bounds
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct PolygonParts {
    vertices: Vec<Point2<f64>>,
    min_y: f64,
    max_y: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<PolygonParts> for Polygon {
    type Error = RegionError;

    fn try_from(parts: PolygonParts) -> Result<Self, Self::Error> {
        Self::new(parts.vertices, parts.min_y, parts.max_y)
    }
}

#[cfg(feature = "serde")]
impl From<Polygon> for PolygonParts {
    fn from(polygon: Polygon) -> Self {
        Self {
            vertices: polygon.vertices,
            min_y: polygon.min_y,
            max_y: polygon.max_y,
        }
    }
}

/// Point-in-polygon test in the X/Z plane with an inclusive boundary.
///
/// Crossing test over the edges, ordered by X. A vertex hit or a zero
/// cross product inside an edge's Z range means the point is on the
/// boundary. Edges are half-open at their left end so that a ray through a
/// vertex is counted once.
#[allow(clippy::float_cmp)]
fn footprint_contains(vertices: &[Point2<f64>], tx: f64, tz: f64) -> bool {
    let Some(&last) = vertices.last() else {
        return false;
    };

    let mut inside = false;
    let mut previous = last;

    for &current in vertices {
        if current.x == tx && current.y == tz {
            return true;
        }

        let (x1, z1, x2, z2) = if current.x > previous.x {
            (previous.x, previous.y, current.x, current.y)
        } else {
            (current.x, current.y, previous.x, previous.y)
        };

        if x1 <= tx && tx <= x2 {
            let cross = (tz - z1) * (x2 - x1) - (z2 - z1) * (tx - x1);
            if cross == 0.0 {
                if (z1 <= tz) == (tz <= z2) {
                    return true;
                }
            } else if cross < 0.0 && x1 != tx {
                inside = !inside;
            }
        }

        previous = current;
    }

    inside
}

fn orientation(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn within(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection; touching endpoints count.
#[allow(clippy::float_cmp)]
fn segments_touch(p1: Point2<f64>, p2: Point2<f64>, q1: Point2<f64>, q2: Point2<f64>) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within(q1, q2, p1))
        || (d2 == 0.0 && within(q1, q2, p2))
        || (d3 == 0.0 && within(p1, p2, q1))
        || (d4 == 0.0 && within(p1, p2, q2))
}

fn edges(polygon: &[Point2<f64>]) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

fn edges_cross(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    edges(a).any(|(p1, p2)| edges(b).any(|(q1, q2)| segments_touch(p1, p2, q1, q2)))
}
