//! Rectangle and point arithmetic shared by capture, selection and drawing.
//!
//! Rectangles are integer, origin + size. During an interactive drag a
//! rectangle may carry a negative width or height; anything stored across a
//! component boundary goes through [`Rect::normalized`] first.

use std::ops::{Add, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points, kept in drag order.
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn is_normalized(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    pub fn normalized(&self) -> Rect {
        let (x, width) = if self.width < 0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Rect::new(x, y, width, height)
    }

    pub fn set_left(&mut self, x: i32) {
        let right = self.right();
        self.x = x;
        self.width = right - x;
    }

    pub fn set_top(&mut self, y: i32) {
        let bottom = self.bottom();
        self.y = y;
        self.height = bottom - y;
    }

    pub fn set_right(&mut self, x: i32) {
        self.width = x - self.x;
    }

    pub fn set_bottom(&mut self, y: i32) {
        self.height = y - self.y;
    }

    pub fn translated(&self, d: Point) -> Rect {
        Rect::new(self.x + d.x, self.y + d.y, self.width, self.height)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        let r = self.normalized();
        p.x >= r.x && p.x < r.right() && p.y >= r.y && p.y < r.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        b.x >= a.x && b.y >= a.y && b.right() <= a.right() && b.bottom() <= a.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();
        let x = a.x.max(b.x);
        let y = a.y.max(b.y);
        let right = a.right().min(b.right());
        let bottom = a.bottom().min(b.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: i32) -> Rect {
        let r = self.normalized();
        Rect::new(
            r.x - margin,
            r.y - margin,
            r.width + margin * 2,
            r.height + margin * 2,
        )
    }

    /// The four pixels at the corners of the normalized rectangle.
    ///
    /// A zero-sized axis collapses onto its origin, so an empty selection
    /// still yields testable points.
    pub fn corner_pixels(&self) -> [Point; 4] {
        let r = self.normalized();
        let right = r.x + (r.width - 1).max(0);
        let bottom = r.y + (r.height - 1).max(0);
        [
            Point::new(r.x, r.y),
            Point::new(right, r.y),
            Point::new(r.x, bottom),
            Point::new(right, bottom),
        ]
    }
}

/// Smallest rectangle containing every input; `None` for an empty list.
pub fn bounding_rect(rects: &[Rect]) -> Option<Rect> {
    let mut iter = rects.iter().map(Rect::normalized);
    let first = iter.next()?;
    let (mut left, mut top, mut right, mut bottom) =
        (first.x, first.y, first.right(), first.bottom());
    for r in iter {
        left = left.min(r.x);
        top = top.min(r.y);
        right = right.max(r.right());
        bottom = bottom.max(r.bottom());
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}

pub fn is_point_on_any(point: Point, screens: &[Rect]) -> bool {
    screens.iter().any(|screen| screen.contains(point))
}

/// Maps a point in a shared coordinate space into the space whose origin is `origin`.
pub fn to_local(point: Point, origin: Point) -> Point {
    point - origin
}

/// Closest point to `p` on the infinite line through `a` and `b`.
///
/// Degenerates to `a` when the two line points coincide.
pub fn closest_point_on_line(a: Point, b: Point, p: Point) -> Point {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        return a;
    }

    let t = ((p.x - a.x) as f64 * dx + (p.y - a.y) as f64 * dy) / length_sq;

    Point::new(
        (a.x as f64 + t * dx).round() as i32,
        (a.y as f64 + t * dy).round() as i32,
    )
}
