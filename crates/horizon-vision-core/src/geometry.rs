//! Screen geometry types.
//!
//! All coordinates are integer physical screen pixels. [`Rect`] uses the
//! left/top/right/bottom representation; [`RectLtwh`] is the origin plus size
//! form most accessibility APIs report object locations in.
//!
//! A rectangle with `left == right` is valid and is how a caret line is
//! represented.

use std::iter::Sum;
use std::ops::{Add, Sub};

/// A point on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Whether this point lies to the right of `other`.
    #[inline]
    pub fn x_wise_greater_than(&self, other: Point) -> bool {
        self.x > other.x
    }

    /// Whether this point lies to the right of or level with `other`.
    #[inline]
    pub fn x_wise_greater_or_eq(&self, other: Point) -> bool {
        self.x >= other.x
    }

    /// Whether this point lies below `other`.
    #[inline]
    pub fn y_wise_greater_than(&self, other: Point) -> bool {
        self.y > other.y
    }

    /// Whether this point lies below or level with `other`.
    #[inline]
    pub fn y_wise_greater_or_eq(&self, other: Point) -> bool {
        self.y >= other.y
    }

    /// Whether this point lies to the left of `other`.
    #[inline]
    pub fn x_wise_less_than(&self, other: Point) -> bool {
        self.x < other.x
    }

    /// Whether this point lies to the left of or level with `other`.
    #[inline]
    pub fn x_wise_less_or_eq(&self, other: Point) -> bool {
        self.x <= other.x
    }

    /// Whether this point lies above `other`.
    #[inline]
    pub fn y_wise_less_than(&self, other: Point) -> bool {
        self.y < other.y
    }

    /// Whether this point lies above or level with `other`.
    #[inline]
    pub fn y_wise_less_or_eq(&self, other: Point) -> bool {
        self.y <= other.y
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl Sum for Point {
    fn sum<I: Iterator<Item = Point>>(iter: I) -> Point {
        iter.fold(Point::ZERO, Add::add)
    }
}

/// A rectangle defined by its four edges.
///
/// Invariant: `left <= right` and `top <= bottom`. Constructors normalize
/// swapped edges so the invariant always holds. Arithmetic on edges
/// saturates at the `i32` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from its edges.
    #[inline]
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Empty rectangle at the origin.
    pub const ZERO: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Create a rectangle from origin and size.
    #[inline]
    pub fn from_ltwh(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(
            left,
            top,
            left.saturating_add(width),
            top.saturating_add(height),
        )
    }

    /// A zero-size rectangle at `point`.
    #[inline]
    pub const fn from_point(point: Point) -> Self {
        Self {
            left: point.x,
            top: point.y,
            right: point.x,
            bottom: point.y,
        }
    }

    /// The smallest rectangle covering every item.
    ///
    /// Returns `None` for an empty iterator.
    pub fn bounding<I, T>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Rect>,
    {
        items.into_iter().map(Into::into).reduce(|acc: Rect, r| Rect {
            left: acc.left.min(r.left),
            top: acc.top.min(r.top),
            right: acc.right.max(r.right),
            bottom: acc.bottom.max(r.bottom),
        })
    }

    /// Width of the rectangle.
    #[inline]
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Height of the rectangle.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Whether the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Top-left corner.
    #[inline]
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Top-right corner.
    #[inline]
    pub fn top_right(&self) -> Point {
        Point::new(self.right, self.top)
    }

    /// Bottom-left corner.
    #[inline]
    pub fn bottom_left(&self) -> Point {
        Point::new(self.left, self.bottom)
    }

    /// Bottom-right corner.
    #[inline]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.right, self.bottom)
    }

    /// Center point, with halves rounded away from zero.
    pub fn center(&self) -> Point {
        Point::new(
            round_half(self.left, self.right),
            round_half(self.top, self.bottom),
        )
    }

    /// The overlapping area of two rectangles.
    ///
    /// Disjoint rectangles intersect in [`Rect::ZERO`].
    pub fn intersection(&self, other: &Rect) -> Rect {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left > right || top > bottom {
            return Rect::ZERO;
        }
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Whether `other` lies entirely within this rectangle (equality allowed).
    #[inline]
    pub fn is_superset(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// Whether this rectangle lies entirely within `other` (equality allowed).
    #[inline]
    pub fn is_subset(&self, other: &Rect) -> bool {
        other.is_superset(self)
    }

    /// Whether `other` is a proper subset of this rectangle.
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self != other && self.is_superset(other)
    }

    /// Whether `point` lies inside the rectangle.
    ///
    /// The right and bottom edges are exclusive.
    #[inline]
    pub fn contains_point(&self, point: Point) -> bool {
        self.left <= point.x && point.x < self.right && self.top <= point.y && point.y < self.bottom
    }

    /// Grow the rectangle by `margin` on every side.
    #[inline]
    pub fn inflate(&self, margin: i32) -> Rect {
        Rect::new(
            self.left.saturating_sub(margin),
            self.top.saturating_sub(margin),
            self.right.saturating_add(margin),
            self.bottom.saturating_add(margin),
        )
    }

    /// Convert to origin-plus-size form.
    #[inline]
    pub fn to_ltwh(&self) -> RectLtwh {
        RectLtwh {
            left: self.left,
            top: self.top,
            width: self.width(),
            height: self.height(),
        }
    }
}

impl From<Point> for Rect {
    fn from(point: Point) -> Self {
        Rect::from_point(point)
    }
}

impl From<RectLtwh> for Rect {
    fn from(r: RectLtwh) -> Self {
        Rect::from_ltwh(r.left, r.top, r.width, r.height)
    }
}

impl From<(i32, i32, i32, i32)> for Rect {
    fn from((left, top, right, bottom): (i32, i32, i32, i32)) -> Self {
        Rect::new(left, top, right, bottom)
    }
}

impl PartialEq<RectLtwh> for Rect {
    fn eq(&self, other: &RectLtwh) -> bool {
        *self == Rect::from(*other)
    }
}

/// A rectangle defined by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RectLtwh {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl RectLtwh {
    /// Create a new rectangle from origin and size.
    #[inline]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl From<Rect> for RectLtwh {
    fn from(r: Rect) -> Self {
        r.to_ltwh()
    }
}

fn round_half(a: i32, b: i32) -> i32 {
    let sum = i64::from(a) + i64::from(b);
    ((sum + sum.signum()) / 2) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ltrb(l: i32, t: i32, r: i32, b: i32) -> Rect {
        Rect::new(l, t, r, b)
    }

    #[test]
    fn test_intersection() {
        assert_eq!(
            ltrb(2, 2, 4, 4).intersection(&ltrb(3, 3, 5, 5)),
            ltrb(3, 3, 4, 4)
        );
        assert_eq!(ltrb(2, 2, 4, 4).intersection(&ltrb(5, 5, 7, 7)), Rect::ZERO);
    }

    #[test]
    fn test_superset_and_subset() {
        assert!(ltrb(2, 2, 6, 6).is_superset(&ltrb(2, 2, 4, 4)));
        assert!(ltrb(2, 2, 6, 6).is_superset(&ltrb(2, 2, 6, 6)));
        assert!(ltrb(2, 2, 4, 4).is_subset(&ltrb(2, 2, 6, 6)));
        assert!(ltrb(2, 2, 6, 6).is_subset(&ltrb(2, 2, 6, 6)));
        assert!(!ltrb(2, 2, 6, 6).is_subset(&ltrb(2, 2, 4, 4)));
    }

    #[test]
    fn test_containment() {
        assert!(ltrb(2, 2, 6, 6).contains_rect(&ltrb(2, 2, 4, 4)));
        assert!(!ltrb(2, 2, 4, 4).contains_rect(&ltrb(2, 2, 4, 4)));
        assert!(ltrb(2, 2, 6, 6).contains_point(Point::new(2, 2)));
        assert!(ltrb(2, 2, 6, 6).contains_point(Point::new(4, 4)));
        assert!(!ltrb(2, 2, 6, 6).contains_point(Point::new(2, 6)));
        assert!(!ltrb(2, 2, 6, 6).contains_point(Point::new(6, 6)));
    }

    #[test]
    fn test_ltwh_equality() {
        assert_eq!(ltrb(2, 2, 4, 4), RectLtwh::new(2, 2, 2, 2));
        assert_ne!(ltrb(2, 2, 4, 4), RectLtwh::new(2, 2, 4, 4));
        assert_eq!(ltrb(10, 15, 510, 1015).to_ltwh(), RectLtwh::new(10, 15, 500, 1000));
    }

    #[test]
    fn test_corners_and_center() {
        let rect = ltrb(-5, -5, 5, 5);
        assert_eq!(rect.top_left(), Point::new(-5, -5));
        assert_eq!(rect.top_right(), Point::new(5, -5));
        assert_eq!(rect.bottom_left(), Point::new(-5, 5));
        assert_eq!(rect.bottom_right(), Point::new(5, 5));
        assert_eq!(rect.center(), Point::ZERO);
        assert_eq!(ltrb(10, 10, 20, 20).center(), Point::new(15, 15));
        assert_eq!(ltrb(-20, -20, -10, -10).center(), Point::new(-15, -15));
        assert_eq!(ltrb(10, 10, 21, 21).center(), Point::new(16, 16));
        assert_eq!(ltrb(-21, -21, -10, -10).center(), Point::new(-16, -16));
    }

    #[test]
    fn test_bounding() {
        let rect = ltrb(10, 15, 500, 1000);
        let mut items: Vec<Rect> = vec![
            rect.top_left().into(),
            rect.bottom_right().into(),
            rect.center().into(),
        ];
        items.extend([(15, 15), (20, 20), (50, 50), (400, 400)].map(|p| Rect::from(Point::from(p))));
        items.push(ltrb(450, 450, 490, 990));
        assert_eq!(Rect::bounding(items), Some(rect));
        assert_eq!(Rect::bounding(Vec::<Rect>::new()), None);
    }

    #[test]
    fn test_normalizes_swapped_edges() {
        assert_eq!(Rect::new(4, 4, 2, 2), ltrb(2, 2, 4, 4));
        let caret = Rect::from_point(Point::new(7, 9));
        assert!(caret.is_empty());
        assert_eq!(caret.width(), 0);
    }

    #[test]
    fn test_inflate() {
        assert_eq!(ltrb(20, 20, 40, 30).inflate(15), ltrb(5, 5, 55, 45));
    }

    #[test]
    fn test_point_arithmetic() {
        assert_eq!(Point::new(2, 4) + Point::new(2, 4), Point::new(4, 8));
        assert_eq!(Point::new(2, 4) - Point::new(4, 8), Point::new(-2, -4));
        let point = Point::new(2, 4);
        assert_eq!([point, point, point].into_iter().sum::<Point>(), Point::new(6, 12));
    }

    #[test]
    fn test_arithmetic_saturates_at_bounds() {
        assert_eq!(
            Point::new(i32::MAX, 1) + Point::new(1, 1),
            Point::new(i32::MAX, 2)
        );
        assert_eq!(
            Point::new(i32::MIN, 0) - Point::new(1, 0),
            Point::new(i32::MIN, 0)
        );
        assert_eq!(
            Rect::from_ltwh(i32::MAX - 1, 0, 10, 10),
            ltrb(i32::MAX - 1, 0, i32::MAX, 10)
        );
        assert_eq!(
            ltrb(i32::MIN, 0, i32::MAX, 10).inflate(15),
            ltrb(i32::MIN, -15, i32::MAX, 25)
        );
        assert_eq!(ltrb(i32::MIN, 0, i32::MAX, 10).width(), i32::MAX);
    }

    #[test]
    fn test_point_comparisons() {
        let a = Point::new(3, 4);
        let b = Point::new(4, 3);
        assert!(a.y_wise_greater_than(b));
        assert!(!a.x_wise_greater_than(b));
        assert!(b.x_wise_greater_or_eq(a));
        assert!(!b.y_wise_greater_or_eq(a));
        assert!(b.y_wise_less_than(a));
        assert!(!b.x_wise_less_than(a));
        assert!(a.x_wise_less_or_eq(b));
        assert!(!a.y_wise_less_or_eq(b));
    }
}
