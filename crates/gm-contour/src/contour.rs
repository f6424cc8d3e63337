use gm_core::{Point2i, Rect, Sides};

/// Closed polygon through pixel centers, in tracing order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contour {
    pub points: Vec<Point2i>,
}

impl Contour {
    pub fn new(points: Vec<Point2i>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area; positive for counterclockwise order in `y`-down
    /// coordinates.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut acc = 0i64;
        let mut prev = self.points[n - 1];
        for &p in &self.points {
            acc += i64::from(prev.x) * i64::from(p.y) - i64::from(p.x) * i64::from(prev.y);
            prev = p;
        }
        acc as f64 * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Perimeter of the closed polygon.
    pub fn arc_length(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }

        let mut len = 0.0;
        let mut prev = self.points[n - 1];
        for &p in &self.points {
            len += f64::from(p.x - prev.x).hypot(f64::from(p.y - prev.y));
            prev = p;
        }
        len
    }

    /// Smallest pixel rectangle containing every point. Points left of or
    /// above the origin are clamped to it.
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::default();
        };

        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }

        let x0 = x0.max(0);
        let y0 = y0.max(0);
        Rect::new(
            x0 as usize,
            y0 as usize,
            (x1 - x0 + 1).max(0) as usize,
            (y1 - y0 + 1).max(0) as usize,
        )
    }

    /// Sides of a `width` x `height` image that the contour runs along.
    pub fn border_contact(&self, width: usize, height: usize) -> Sides {
        let right = width as i64 - 1;
        let bottom = height as i64 - 1;
        let mut sides = Sides::default();
        for p in &self.points {
            sides.left |= p.x == 0;
            sides.top |= p.y == 0;
            sides.right |= i64::from(p.x) == right;
            sides.bottom |= i64::from(p.y) == bottom;
        }
        sides
    }

    pub fn touches_border(&self, width: usize, height: usize) -> bool {
        self.border_contact(width, height).any()
    }

    /// Shifts every point by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Contour {
        let offset = Point2i::new(dx, dy);
        Contour {
            points: self.points.iter().map(|&p| p + offset).collect(),
        }
    }
}

impl From<Vec<Point2i>> for Contour {
    fn from(points: Vec<Point2i>) -> Self {
        Self { points }
    }
}

#[cfg(test)]
mod tests {
    use gm_core::{Point2i, Rect};

    use super::Contour;

    fn square(x0: i32, y0: i32, side: i32) -> Contour {
        let mut pts = Vec::new();
        for x in x0..x0 + side {
            pts.push(Point2i::new(x, y0));
        }
        for y in y0..y0 + side {
            pts.push(Point2i::new(x0 + side, y));
        }
        for x in (x0 + 1..=x0 + side).rev() {
            pts.push(Point2i::new(x, y0 + side));
        }
        for y in (y0 + 1..=y0 + side).rev() {
            pts.push(Point2i::new(x0, y));
        }
        Contour::new(pts)
    }

    #[test]
    fn square_area_and_perimeter() {
        let c = square(2, 3, 4);
        assert_eq!(c.area(), 16.0);
        assert_eq!(c.arc_length(), 16.0);
        assert_eq!(c.bounding_rect(), Rect::new(2, 3, 5, 5));
    }

    #[test]
    fn orientation_flips_signed_area_only() {
        let c = square(0, 0, 3);
        let mut rev = c.clone();
        rev.points.reverse();
        assert_eq!(c.signed_area(), -rev.signed_area());
        assert_eq!(c.area(), rev.area());
    }

    #[test]
    fn degenerate_contours() {
        let single = Contour::new(vec![Point2i::new(4, 4)]);
        assert_eq!(single.area(), 0.0);
        assert_eq!(single.arc_length(), 0.0);
        assert_eq!(single.bounding_rect(), Rect::new(4, 4, 1, 1));

        let pair = Contour::new(vec![Point2i::new(0, 0), Point2i::new(3, 4)]);
        assert_eq!(pair.area(), 0.0);
        assert_eq!(pair.arc_length(), 10.0);
    }

    #[test]
    fn border_contact_reports_each_side() {
        let c = square(0, 2, 3);
        let sides = c.border_contact(10, 6);
        assert!(sides.left);
        assert!(!sides.top);
        assert!(!sides.right);
        assert!(sides.bottom);
        assert!(!square(1, 1, 3).touches_border(10, 10));
    }

    #[test]
    fn translation_moves_bounding_box() {
        let c = square(1, 1, 2).translated(10, -1);
        assert_eq!(c.bounding_rect(), Rect::new(11, 0, 3, 3));
    }
}
