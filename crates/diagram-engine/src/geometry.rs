//! Geometric primitives for diagram elements
//!
//! Positions and sizes come from the external canvas in absolute
//! coordinates. Containment between stages and task nodes is decided
//! purely on these rectangles, never on stored parent references.

use serde::{Deserialize, Serialize};

/// A point in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by a delta
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Width and height of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Check whether `other` lies fully inside this rect
    ///
    /// Edges count as inside. A rect contains itself.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.top() >= self.top()
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check whether this rect overlaps `other` at all
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Smallest rect covering both this rect and `other`
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(Point::new(left, top), Size::new(right - left, bottom - top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_contains_rect_fully_inside() {
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        let inner = rect(10.0, 10.0, 20.0, 20.0);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
    }

    #[test]
    fn test_contains_rect_partial_overlap() {
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        let straddling = rect(90.0, 10.0, 20.0, 20.0);
        assert!(!outer.contains_rect(&straddling));
        assert!(outer.intersects(&straddling));
    }

    #[test]
    fn test_contains_rect_edges_count_as_inside() {
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        let flush = rect(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&flush));
    }

    #[test]
    fn test_intersects_disjoint() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 20.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_union_covers_both() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(20.0, 30.0, 10.0, 10.0);
        let u = a.union(&b);
        assert!(u.contains_rect(&a));
        assert!(u.contains_rect(&b));
        assert_eq!(u.size.width, 30.0);
        assert_eq!(u.size.height, 40.0);
    }
}
