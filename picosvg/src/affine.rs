//! 2D affine transforms and the SVG `transform` attribute.
//!
//! See <https://www.w3.org/TR/SVG11/coords.html#TransformAttribute>

use std::{fmt::Display, str::FromStr, sync::OnceLock};

use regex::Regex;

use crate::{
    error::Error,
    geometry::{almost_equal, ntos, round_scalar, Point, Rect, Vector, DEFAULT_ALMOST_EQUAL_TOLERANCE},
};

/// A 2D affine transform, applied to row vectors: `[x y 1] · M`.
///
/// Laid out as a matrix:
///
/// ```text
/// a   c   e
/// b   d   f
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine2D {
    fn default() -> Self {
        Affine2D::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    /// What [`Affine2D::inverse`] returns when there is no inverse
    pub const DEGENERATE: Affine2D = Affine2D::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Affine2D {
        Affine2D { a, b, c, d, e, f }
    }

    pub fn as_coeffs(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Apply `first`, then `second`.
    pub fn product(first: Affine2D, second: Affine2D) -> Affine2D {
        Affine2D::new(
            first.a * second.a + first.b * second.c,
            first.a * second.b + first.b * second.d,
            first.c * second.a + first.d * second.c,
            first.c * second.b + first.d * second.d,
            second.a * first.e + second.c * first.f + second.e,
            second.b * first.e + second.d * first.f + second.f,
        )
    }

    /// Combines affines in logical order, e.g. "do [0] then [1] then [2]".
    pub fn compose_ltr(affines: &[Affine2D]) -> Affine2D {
        affines
            .iter()
            .rev()
            .fold(Affine2D::IDENTITY, |acc, affine| Affine2D::product(*affine, acc))
    }

    /// Prepend the given matrix, it applies before self
    pub fn matrix(self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Affine2D {
        Affine2D::product(Affine2D::new(a, b, c, d, e, f), self)
    }

    pub fn translate(self, tx: f64, ty: f64) -> Affine2D {
        if tx == 0.0 && ty == 0.0 {
            return self;
        }
        self.matrix(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(self, sx: f64, sy: f64) -> Affine2D {
        self.matrix(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotate by `angle` radians about (cx, cy).
    pub fn rotate(self, angle: f64, cx: f64, cy: f64) -> Affine2D {
        let (sin, cos) = angle.sin_cos();
        self.translate(cx, cy)
            .matrix(cos, sin, -sin, cos, 0.0, 0.0)
            .translate(-cx, -cy)
    }

    /// Skew along x by `angle` radians
    pub fn skew_x(self, angle: f64) -> Affine2D {
        self.matrix(1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0)
    }

    /// Skew along y by `angle` radians
    pub fn skew_y(self, angle: f64) -> Affine2D {
        self.matrix(1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation(&self) -> Vector {
        Vector::new(self.e, self.f)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// True if the 2x2 part can't be inverted
    pub fn is_degenerate(&self) -> bool {
        self.determinant().abs() <= f64::EPSILON
    }

    /// The inverse transform; a degenerate input yields [`Affine2D::DEGENERATE`].
    pub fn inverse(&self) -> Affine2D {
        if *self == Affine2D::IDENTITY {
            return *self;
        }
        if self.is_degenerate() {
            return Affine2D::DEGENERATE;
        }
        let det = self.determinant();
        let (a, b, c, d) = (self.d / det, -self.b / det, -self.c / det, self.a / det);
        let e = -(a * self.e + c * self.f);
        let f = -(b * self.e + d * self.f);
        Affine2D::new(a, b, c, d, e, f)
    }

    pub fn map_point(&self, pt: impl Into<Point>) -> Point {
        let pt = pt.into();
        Point::new(
            self.a * pt.x + self.c * pt.y + self.e,
            self.b * pt.x + self.d * pt.y + self.f,
        )
    }

    /// Map a vector; translation doesn't apply to vectors.
    pub fn map_vector(&self, vec: impl Into<Vector>) -> Vector {
        let vec = vec.into();
        Vector::new(self.a * vec.x + self.c * vec.y, self.b * vec.x + self.d * vec.y)
    }

    /// Scale and translate `src` to exactly cover `dst`, ignoring aspect ratio.
    pub fn rect_to_rect(src: Rect, dst: Rect) -> Affine2D {
        if src.empty() {
            return Affine2D::IDENTITY;
        }
        if dst.empty() {
            return Affine2D::DEGENERATE;
        }
        let sx = dst.w / src.w;
        let sy = dst.h / src.h;
        let tx = dst.x - src.x * sx;
        let ty = dst.y - src.y * sy;
        Affine2D::new(sx, 0.0, 0.0, sy, tx, ty)
    }

    pub fn round(&self, ndigits: u32) -> Affine2D {
        let [a, b, c, d, e, f] = self.as_coeffs().map(|v| round_scalar(v, ndigits));
        Affine2D::new(a, b, c, d, e, f)
    }

    pub fn almost_equals(&self, other: &Affine2D, tolerance: f64) -> bool {
        self.as_coeffs()
            .iter()
            .zip(other.as_coeffs())
            .all(|(v1, v2)| almost_equal(*v1, v2, tolerance))
    }

    /// Split into a scale and whatever remains, in left-to-right order.
    ///
    /// See SkMatrix::decomposeScale.
    pub fn decompose_scale(&self) -> (Affine2D, Affine2D) {
        let sx = self.a.hypot(self.b);
        let sy = self.c.hypot(self.d);
        let scale = Affine2D::new(sx, 0.0, 0.0, sy, 0.0, 0.0);
        let remaining = Affine2D::compose_ltr(&[scale.inverse(), *self]);
        (scale, remaining)
    }

    /// Split into a translation and the 2x2 part, in left-to-right order.
    ///
    /// The translation is how far to pre-translate such that applying the 2x2
    /// part alone lands where self would. A degenerate 2x2 part can't absorb
    /// the translation, self is returned as the remainder.
    pub fn decompose_translation(&self) -> (Affine2D, Affine2D) {
        let affine_prime = Affine2D { e: 0.0, f: 0.0, ..*self };
        if self.almost_equals(&affine_prime, DEFAULT_ALMOST_EQUAL_TOLERANCE) {
            return (Affine2D::IDENTITY, affine_prime);
        }
        if affine_prime.is_degenerate() {
            return (Affine2D::IDENTITY, *self);
        }
        let pre = affine_prime.inverse().map_vector((self.e, self.f));
        (Affine2D::IDENTITY.translate(pre.x, pre.y), affine_prime)
    }

    fn is_translation_only(&self) -> bool {
        self.a == 1.0 && self.b == 0.0 && self.c == 0.0 && self.d == 1.0
    }
}

impl Display for Affine2D {
    /// `translate(e, f)` when that says it all, otherwise `matrix(a b c d e f)`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_translation_only() {
            return write!(f, "translate({}, {})", ntos(self.e), ntos(self.f));
        }
        let coeffs: Vec<_> = self.as_coeffs().into_iter().map(ntos).collect();
        write!(f, "matrix({})", coeffs.join(" "))
    }
}

impl From<Affine2D> for kurbo::Affine {
    fn from(value: Affine2D) -> Self {
        kurbo::Affine::new(value.as_coeffs())
    }
}

impl From<kurbo::Affine> for Affine2D {
    fn from(value: kurbo::Affine) -> Self {
        let [a, b, c, d, e, f] = value.as_coeffs();
        Affine2D::new(a, b, c, d, e, f)
    }
}

fn transform_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(matrix|translate|scale|rotate|skewX|skewY)\s*\(([^)]*)\)").unwrap()
    })
}

fn arg_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[,\s]\s*").unwrap())
}

impl FromStr for Affine2D {
    type Err = Error;

    /// Parse an SVG transform list. Angles are in degrees.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let bad_transform = || Error::ParseTransform(raw.to_string());
        let mut transform = Affine2D::IDENTITY;
        for captures in transform_re().captures_iter(raw) {
            let op = captures[1].to_ascii_lowercase();
            let args = arg_separator_re()
                .split(captures[2].trim())
                .map(|v| v.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| bad_transform())?;
            transform = match (op.as_str(), args.as_slice()) {
                ("matrix", [a, b, c, d, e, f]) => transform.matrix(*a, *b, *c, *d, *e, *f),
                ("translate", [tx]) => transform.translate(*tx, 0.0),
                ("translate", [tx, ty]) => transform.translate(*tx, *ty),
                ("scale", [s]) => transform.scale(*s, *s),
                ("scale", [sx, sy]) => transform.scale(*sx, *sy),
                ("rotate", [angle]) => transform.rotate(angle.to_radians(), 0.0, 0.0),
                ("rotate", [angle, cx, cy]) => transform.rotate(angle.to_radians(), *cx, *cy),
                ("skewx", [angle]) => transform.skew_x(angle.to_radians()),
                ("skewy", [angle]) => transform.skew_y(angle.to_radians()),
                _ => return Err(bad_transform()),
            };
        }
        Ok(transform)
    }
}
