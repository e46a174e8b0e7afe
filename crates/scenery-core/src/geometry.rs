//! Geometric primitives for cells and their cached view state.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Geometry`] - The position, size and control points stored on a cell
//!
//! # Coordinate System
//!
//! Scenery uses a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! A [`Geometry`] is expressed in the coordinate space of the cell's parent.
//! Absolute positions are obtained by summing the origins of all ancestors.

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use scenery_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Returns this point moved by `dx` and `dy`
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates the smallest bounds containing every point.
    ///
    /// Returns `None` when `points` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scenery_core::geometry::{Bounds, Point};
    /// let bounds = Bounds::from_points([Point::new(10.0, 5.0), Point::new(-2.0, 8.0)]).unwrap();
    /// assert_eq!(bounds.min_x(), -2.0);
    /// assert_eq!(bounds.max_y(), 8.0);
    /// ```
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let start = Self::new_from_top_left(first, Size::default());
        Some(points.fold(start, |bounds, point| {
            bounds.merge(&Self::new_from_top_left(point, Size::default()))
        }))
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Merges two bounds to create a larger bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scenery_core::geometry::{Bounds, Point, Size};
    /// let header = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let content = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = header.merge(&content);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns true if the point lies inside or on the border of the bounds
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Position, size and routing information of a single cell.
///
/// For vertices `x`/`y` is the top-left corner relative to the parent's
/// origin. When [`Geometry::is_relative`] is set the coordinates are
/// fractions of the parent's bounds instead (`0.5, 0.5` is the parent's
/// center). Edges use [`Geometry::points`] as control points and the
/// optional source/target points as the ends of a dangling edge.
///
/// Geometry compares by value, so two separately built geometries with the
/// same fields are equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    relative: bool,
    points: Option<Vec<Point>>,
    source_point: Option<Point>,
    target_point: Option<Point>,
}

impl Geometry {
    /// Creates an absolute geometry with the given position and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Creates an empty relative geometry, the default for edges
    pub fn relative() -> Self {
        Self {
            relative: true,
            ..Self::default()
        }
    }

    /// Sets whether the position is relative to the parent
    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    /// Sets the control points of an edge
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    /// Sets the loose end used when an edge has no source terminal
    pub fn with_source_point(mut self, point: Point) -> Self {
        self.source_point = Some(point);
        self
    }

    /// Sets the loose end used when an edge has no target terminal
    pub fn with_target_point(mut self, point: Point) -> Self {
        self.target_point = Some(point);
        self
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the top-left position as a point
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns the size of the geometry
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    /// Returns the control points, if any
    pub fn points(&self) -> Option<&[Point]> {
        self.points.as_deref()
    }

    pub fn source_point(&self) -> Option<Point> {
        self.source_point
    }

    pub fn target_point(&self) -> Option<Point> {
        self.target_point
    }

    /// Returns the loose end for the given side of an edge
    pub fn terminal_point(&self, is_source: bool) -> Option<Point> {
        if is_source {
            self.source_point
        } else {
            self.target_point
        }
    }

    /// Moves the geometry by the given amount.
    ///
    /// The position is only moved for absolute geometries. Control points and
    /// loose ends are always moved since they are never relative.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scenery_core::geometry::{Geometry, Point};
    /// let geo = Geometry::relative().with_points(vec![Point::new(10.0, 10.0)]);
    /// let moved = geo.translate(5.0, -5.0);
    ///
    /// assert_eq!(moved.x(), 0.0);
    /// assert_eq!(moved.points().unwrap()[0], Point::new(15.0, 5.0));
    /// ```
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        let mut geometry = self.clone();
        if !geometry.relative {
            geometry.x += dx;
            geometry.y += dy;
        }
        geometry.source_point = geometry.source_point.map(|p| p.translate(dx, dy));
        geometry.target_point = geometry.target_point.map(|p| p.translate(dx, dy));
        if let Some(points) = geometry.points.as_mut() {
            for point in points.iter_mut() {
                *point = point.translate(dx, dy);
            }
        }
        geometry
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn coordinate() -> impl Strategy<Value = f32> {
        -1000.0f32..1000.0
    }

    fn geometry_strategy() -> impl Strategy<Value = Geometry> {
        (
            coordinate(),
            coordinate(),
            0.0f32..500.0,
            0.0f32..500.0,
            any::<bool>(),
            prop::collection::vec((coordinate(), coordinate()), 0..4),
        )
            .prop_map(|(x, y, w, h, relative, points)| {
                Geometry::new(x, y, w, h)
                    .with_relative(relative)
                    .with_points(points.into_iter().map(|(x, y)| Point::new(x, y)).collect())
            })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Translating forth and back restores the geometry up to rounding.
    fn check_translate_inverse(
        geometry: Geometry,
        dx: f32,
        dy: f32,
    ) -> Result<(), TestCaseError> {
        let restored = geometry.translate(dx, dy).translate(-dx, -dy);

        prop_assert!(approx_eq!(f32, restored.x(), geometry.x(), epsilon = 0.01));
        prop_assert!(approx_eq!(f32, restored.y(), geometry.y(), epsilon = 0.01));
        let original = geometry.points().unwrap_or_default();
        let moved = restored.points().unwrap_or_default();
        prop_assert_eq!(original.len(), moved.len());
        for (a, b) in original.iter().zip(moved) {
            prop_assert!(approx_eq!(f32, a.x(), b.x(), epsilon = 0.01));
            prop_assert!(approx_eq!(f32, a.y(), b.y(), epsilon = 0.01));
        }
        Ok(())
    }

    /// Merged bounds contain the centers of both inputs.
    fn check_merge_contains_both(a: Geometry, b: Geometry) -> Result<(), TestCaseError> {
        let first = Bounds::new_from_top_left(a.position(), a.size());
        let second = Bounds::new_from_top_left(b.position(), b.size());
        let merged = first.merge(&second);

        prop_assert!(merged.contains_point(first.center()));
        prop_assert!(merged.contains_point(second.center()));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn translate_inverse(geometry in geometry_strategy(), dx in coordinate(), dy in coordinate()) {
            check_translate_inverse(geometry, dx, dy)?;
        }

        #[test]
        fn merge_contains_both(a in geometry_strategy(), b in geometry_strategy()) {
            check_merge_contains_both(a, b)?;
        }
    }
}
