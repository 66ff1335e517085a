//!
//! Integer rectangles.
//!

/// A rectangle with a top-left corner and a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// One past the rightmost column, widened so it cannot overflow.
    #[must_use]
    pub const fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    /// One past the bottom row.
    #[must_use]
    pub const fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    /// Overlap of two rectangles, or `None` when they do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= i64::from(x0) || y1 <= i64::from(y0) {
            return None;
        }
        // Bounded by the narrower input, so the size fits.
        let w = i32::try_from(x1 - i64::from(x0)).ok()?;
        let h = i32::try_from(y1 - i64::from(y0)).ok()?;
        Some(Rect::new(x0, y0, w, h))
    }

    /// Whether `other` lies entirely inside this rectangle.
    #[must_use]
    pub const fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Whether the point lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && (x as i64) < self.right() && (y as i64) < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_overlap() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 60, 100, 100);
        assert_eq!(a.intersection(&b), Some(Rect::new(50, 60, 50, 40)));
    }

    #[test]
    fn test_intersection_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersection(&Rect::new(10, 0, 5, 5)), None);
        assert_eq!(a.intersection(&Rect::new(-20, -20, 5, 5)), None);
    }

    #[test]
    fn test_empty_and_contains() {
        assert!(Rect::new(0, 0, 0, 10).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
        assert!(Rect::new(5, 5, 2, 2).contains(6, 6));
        assert!(!Rect::new(5, 5, 2, 2).contains(7, 6));
    }

    #[test]
    fn test_extreme_edges_do_not_overflow() {
        let screen = Rect::new(0, 0, 4, 4);
        let wide = Rect::new(1, 0, i32::MAX, 1);
        assert_eq!(wide.right(), 1 + i64::from(i32::MAX));
        assert_eq!(screen.intersection(&wide), Some(Rect::new(1, 0, 3, 1)));
        assert_eq!(wide.intersection(&screen), Some(Rect::new(1, 0, 3, 1)));
        assert!(Rect::new(i32::MAX, i32::MAX, i32::MAX, i32::MAX).contains(i32::MAX, i32::MAX));
        assert_eq!(
            Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX).intersection(&screen),
            None
        );
        assert!(!screen.encloses(&wide));
        assert!(screen.encloses(&Rect::new(1, 1, 3, 3)));
    }

    #[test]
    fn test_negative_size_never_intersects() {
        let screen = Rect::new(0, 0, 4, 4);
        assert_eq!(screen.intersection(&Rect::new(8, 3, -5, 1)), None);
        assert_eq!(Rect::new(8, 3, -5, 1).intersection(&screen), None);
        assert!(!Rect::new(3, 3, -5, -5).contains(0, 0));
    }
}
