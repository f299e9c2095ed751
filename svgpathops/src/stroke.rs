//! Turn a stroked path into the filled area it paints.

use std::str::FromStr;

use kurbo::{BezPath, Cap, Join, Stroke, StrokeOpts};
use log::debug;

use crate::{remove_overlaps, Error, FillRule};

/// <https://www.w3.org/TR/SVG11/painting.html#StrokeLinecapProperty>
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

impl FromStr for LineCap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            _ => Err(Error::UnknownLineCap(s.to_string())),
        }
    }
}

impl From<LineCap> for Cap {
    fn from(value: LineCap) -> Self {
        match value {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        }
    }
}

/// <https://www.w3.org/TR/SVG11/painting.html#StrokeLinejoinProperty>
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

impl FromStr for LineJoin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "miter" => Ok(LineJoin::Miter),
            "round" => Ok(LineJoin::Round),
            "bevel" => Ok(LineJoin::Bevel),
            _ => Err(Error::UnknownLineJoin(s.to_string())),
        }
    }
}

impl From<LineJoin> for Join {
    fn from(value: LineJoin) -> Self {
        match value {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    /// Even length; callers repeat odd length lists
    pub dash_array: Vec<f64>,
    pub dash_offset: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        StrokeStyle {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
        }
    }
}

impl StrokeStyle {
    fn to_kurbo(&self) -> Stroke {
        let stroke = Stroke::new(self.width)
            .with_caps(self.cap.into())
            .with_join(self.join.into())
            .with_miter_limit(self.miter_limit);
        let dashes_usable = !self.dash_array.is_empty()
            && self.dash_array.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.dash_array.iter().sum::<f64>() > 0.0;
        if !dashes_usable {
            if !self.dash_array.is_empty() {
                debug!("Ignoring unusable dash array {:?}", self.dash_array);
            }
            return stroke;
        }
        stroke.with_dashes(self.dash_offset, self.dash_array.iter().copied())
    }
}

/// The filled outline of stroking `path` with `style`, free of overlaps.
pub fn stroke(path: &BezPath, style: &StrokeStyle, tolerance: f64) -> BezPath {
    if style.width <= 0.0 {
        return BezPath::new();
    }
    let outline = kurbo::stroke(
        path.iter(),
        &style.to_kurbo(),
        &StrokeOpts::default(),
        tolerance,
    );
    remove_overlaps(&outline, FillRule::NonZero, tolerance)
}
