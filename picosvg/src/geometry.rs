//! Points, vectors, rectangles and tolerant comparison.
//!
//! Points and vectors are kurbo's; [`Point`] minus [`Point`] is a [`Vector`],
//! [`Point`] plus or minus a [`Vector`] is a [`Point`].

pub use kurbo::{Point, Vec2 as Vector};

pub const DEFAULT_ALMOST_EQUAL_TOLERANCE: f64 = 1e-9;

pub fn almost_equal(v1: f64, v2: f64, tolerance: f64) -> bool {
    (v1 - v2).abs() <= tolerance
}

/// Equality within a tolerance.
pub trait AlmostEqual<Rhs = Self> {
    fn almost_equals(&self, other: &Rhs, tolerance: f64) -> bool;
}

impl AlmostEqual for f64 {
    #[inline]
    fn almost_equals(&self, other: &Self, tolerance: f64) -> bool {
        almost_equal(*self, *other, tolerance)
    }
}

impl AlmostEqual for Point {
    #[inline]
    fn almost_equals(&self, other: &Self, tolerance: f64) -> bool {
        self.x.almost_equals(&other.x, tolerance) && self.y.almost_equals(&other.y, tolerance)
    }
}

impl AlmostEqual for Vector {
    #[inline]
    fn almost_equals(&self, other: &Self, tolerance: f64) -> bool {
        self.x.almost_equals(&other.x, tolerance) && self.y.almost_equals(&other.y, tolerance)
    }
}

/// The vector operations kurbo doesn't spell the way we need them.
pub trait VectorExt {
    /// Rotated 90 degrees, counter-clockwise unless `clockwise`.
    fn perpendicular(self, clockwise: bool) -> Vector;

    /// Length 1 in the same direction, None for the zero vector.
    fn unit(self) -> Option<Vector>;

    /// Projection onto `other`; projecting onto the zero vector yields zero.
    fn projection(self, other: Vector) -> Vector;
}

impl VectorExt for Vector {
    fn perpendicular(self, clockwise: bool) -> Vector {
        if clockwise {
            Vector::new(self.y, -self.x)
        } else {
            Vector::new(-self.y, self.x)
        }
    }

    fn unit(self) -> Option<Vector> {
        let norm = self.hypot();
        if norm != 0.0 {
            Some(self / norm)
        } else {
            None
        }
    }

    fn projection(self, other: Vector) -> Vector {
        match other.unit() {
            Some(unit) => unit * (self.dot(other) / other.hypot()),
            None => Vector::ZERO,
        }
    }
}

/// Round half away from zero, never producing -0.
pub fn round_scalar(v: f64, ndigits: u32) -> f64 {
    let mul = 10f64.powi(ndigits as i32);
    let result = (v * mul).round() / mul;
    // -0.0 is rarely useful
    if result == 0.0 {
        0.0
    } else {
        result
    }
}

pub fn round_multiple(v: f64, of: f64) -> f64 {
    let result = (v / of).round() * of;
    if result == 0.0 {
        0.0
    } else {
        result
    }
}

/// Number to string, as short as possible: no trailing ".0", no "-0".
pub fn ntos(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    format!("{v}")
}

/// An axis aligned rectangle, origin plus non-negative extent.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const UNIT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect { x, y, w, h }
    }

    pub fn empty(&self) -> bool {
        self.w == 0.0 || self.h == 0.0
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        fn overlap(start1: f64, end1: f64, start2: f64, end2: f64) -> Option<(f64, f64)> {
            let start = start1.max(start2);
            let end = end1.min(end2);
            (start < end).then_some((start, end))
        }
        let (x1, x2) = overlap(self.x, self.x + self.w, other.x, other.x + other.w)?;
        let (y1, y2) = overlap(self.y, self.y + self.h, other.y, other.y + other.h)?;
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// The smallest rect containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.w).max(other.x + other.w);
        let y2 = (self.y + self.h).max(other.y + other.h);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

impl From<kurbo::Rect> for Rect {
    fn from(value: kurbo::Rect) -> Self {
        Rect::new(value.x0, value.y0, value.width(), value.height())
    }
}

impl From<Rect> for kurbo::Rect {
    fn from(value: Rect) -> Self {
        kurbo::Rect::new(value.x, value.y, value.x + value.w, value.y + value.h)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn point_arithmetic() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(Vector::new(2.0, 2.0), p - Point::new(1.0, 2.0));
        assert_eq!(Point::new(2.0, 2.0), p - Vector::new(1.0, 2.0));
        assert_eq!(Point::new(4.0, 6.0), p + Vector::new(1.0, 2.0));
    }

    #[rstest]
    #[case(Vector::new(1.0, 0.0), false, Vector::new(0.0, 1.0))]
    #[case(Vector::new(1.0, 0.0), true, Vector::new(0.0, -1.0))]
    #[case(Vector::new(2.0, 3.0), false, Vector::new(-3.0, 2.0))]
    fn perpendicular(#[case] v: Vector, #[case] clockwise: bool, #[case] expected: Vector) {
        assert_eq!(expected, v.perpendicular(clockwise));
    }

    #[test]
    fn unit_of_zero_is_none() {
        assert_eq!(None, Vector::ZERO.unit());
        let unit = Vector::new(3.0, 4.0).unit().unwrap();
        assert!(
            unit.almost_equals(&Vector::new(0.6, 0.8), DEFAULT_ALMOST_EQUAL_TOLERANCE),
            "{unit:?}"
        );
    }

    #[rstest]
    #[case(Vector::new(3.0, 4.0), Vector::new(10.0, 0.0), Vector::new(3.0, 0.0))]
    #[case(Vector::new(3.0, 4.0), Vector::new(0.0, -2.0), Vector::new(0.0, 4.0))]
    #[case(Vector::new(3.0, 4.0), Vector::ZERO, Vector::ZERO)]
    fn projection(#[case] v: Vector, #[case] onto: Vector, #[case] expected: Vector) {
        assert_eq!(expected, v.projection(onto));
    }

    #[rstest]
    #[case(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(5.0, 5.0, 10.0, 10.0), Some(Rect::new(5.0, 5.0, 5.0, 5.0)))]
    #[case(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(10.0, 0.0, 10.0, 10.0), None)]
    #[case(Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(2.0, 20.0, 1.0, 1.0), None)]
    fn rect_intersection(#[case] r1: Rect, #[case] r2: Rect, #[case] expected: Option<Rect>) {
        assert_eq!(expected, r1.intersection(&r2));
        assert_eq!(expected, r2.intersection(&r1));
    }

    #[rstest]
    #[case(Rect::new(1.0, 1.0, 0.0, 5.0), true)]
    #[case(Rect::new(1.0, 1.0, 5.0, 0.0), true)]
    #[case(Rect::new(1.0, 1.0, 5.0, 5.0), false)]
    fn rect_empty(#[case] rect: Rect, #[case] expected: bool) {
        assert_eq!(expected, rect.empty());
    }

    #[rstest]
    #[case(1.0, "1")]
    #[case(-0.0, "0")]
    #[case(0.5, "0.5")]
    #[case(-12.25, "-12.25")]
    #[case(100.0, "100")]
    fn number_to_string(#[case] v: f64, #[case] expected: &str) {
        assert_eq!(expected, ntos(v));
    }

    #[rstest]
    #[case(1.23456, 2, 1.23)]
    #[case(-0.0001, 2, 0.0)]
    #[case(2.5, 0, 3.0)]
    fn rounding(#[case] v: f64, #[case] ndigits: u32, #[case] expected: f64) {
        assert_eq!(expected, round_scalar(v, ndigits));
        assert!(!round_scalar(v, ndigits).is_sign_negative() || expected < 0.0);
    }

    #[test]
    fn round_to_multiple() {
        assert_eq!(30.0, round_multiple(27.0, 10.0));
        assert_eq!(0.25, round_multiple(0.3, 0.25));
        assert!(!round_multiple(-4.0, 10.0).is_sign_negative());
    }
}
