//! Winding-aware set operations, stroking and measurement over [`BezPath`].
//!
//! Boolean operations flatten curves to polylines (within a caller supplied
//! tolerance) before combining them, so their output contains only straight
//! segments. Every output is meant to be filled with the `nonzero` rule:
//! outer contours have positive signed area in the y-down SVG frame, holes
//! negative. Empty input produces empty output.

mod boolean;
mod error;
mod stroke;

use std::str::FromStr;

use kurbo::{Affine, BezPath, PathEl, Rect, Shape};

pub use error::Error;
pub use stroke::{stroke, LineCap, LineJoin, StrokeStyle};

use boolean::{Operand, SetOp};

/// How a point's winding number decides insideness.
///
/// See <https://www.w3.org/TR/SVG11/painting.html#FillRuleProperty>
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

impl FromStr for FillRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nonzero" => Ok(FillRule::NonZero),
            "evenodd" => Ok(FillRule::EvenOdd),
            _ => Err(Error::UnknownFillRule(s.to_string())),
        }
    }
}

fn operands(paths: &[(BezPath, FillRule)], tolerance: f64) -> Vec<Operand> {
    paths
        .iter()
        .map(|(path, fill_rule)| Operand::new(path, *fill_rule, tolerance))
        .collect()
}

/// The area covered by any of the inputs.
pub fn union(paths: &[(BezPath, FillRule)], tolerance: f64) -> BezPath {
    boolean::combine(&operands(paths, tolerance), SetOp::Union)
}

/// The area covered by all of the inputs.
pub fn intersection(paths: &[(BezPath, FillRule)], tolerance: f64) -> BezPath {
    if paths.is_empty() {
        return BezPath::new();
    }
    boolean::combine(&operands(paths, tolerance), SetOp::Intersection)
}

/// The area covered by the first input and by none of the others.
pub fn difference(paths: &[(BezPath, FillRule)], tolerance: f64) -> BezPath {
    if paths.is_empty() {
        return BezPath::new();
    }
    boolean::combine(&operands(paths, tolerance), SetOp::Difference)
}

/// Rewrite a path so it fills the same area under `nonzero` with no
/// self-overlapping contours.
pub fn remove_overlaps(path: &BezPath, fill_rule: FillRule, tolerance: f64) -> BezPath {
    boolean::combine(&[Operand::new(path, fill_rule, tolerance)], SetOp::Union)
}

pub fn transform(path: &BezPath, affine: Affine) -> BezPath {
    let mut path = path.clone();
    path.apply_affine(affine);
    path
}

/// The exact bounds of the path, or None if it draws nothing.
pub fn bounding_box(path: &BezPath) -> Option<Rect> {
    if !path
        .elements()
        .iter()
        .any(|el| !matches!(el, PathEl::MoveTo(_)))
    {
        return None;
    }
    Some(path.bounding_box())
}

/// The area painted when filling the path with the given rule.
pub fn area(path: &BezPath, fill_rule: FillRule, tolerance: f64) -> f64 {
    let simplified = remove_overlaps(path, fill_rule, tolerance);
    simplified.area().abs()
}
