//! Linear and radial gradients.
//!
//! See <https://www.w3.org/TR/SVG11/pservers.html>

use std::fmt::Display;

use crate::{
    affine::Affine2D,
    error::Error,
    geometry::{ntos, round_scalar, Rect},
    tree::Element,
};

/// Digits kept when rewriting gradient geometry.
pub const GRADIENT_TRANSFORM_NDIGITS: u32 = 6;

const LINEAR_ATTRIBUTES: &[&str] = &[
    "x1",
    "y1",
    "x2",
    "y2",
    "gradientUnits",
    "gradientTransform",
    "spreadMethod",
];

const RADIAL_ATTRIBUTES: &[&str] = &[
    "cx",
    "cy",
    "r",
    "fr",
    "fx",
    "fy",
    "gradientUnits",
    "gradientTransform",
    "spreadMethod",
];

const STOP_ATTRIBUTES: &[&str] = &["offset", "stop-color", "stop-opacity"];

pub fn is_gradient_tag(tag: &str) -> bool {
    matches!(tag, "linearGradient" | "radialGradient")
}

/// The attributes a gradient inherits from its template, if absent.
pub fn template_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "linearGradient" => LINEAR_ATTRIBUTES,
        "radialGradient" => RADIAL_ATTRIBUTES,
        _ => &[],
    }
}

/// The attributes a gradient or stop element takes, None for other tags.
pub fn gradient_attributes(tag: &str) -> Option<&'static [&'static str]> {
    match tag {
        "linearGradient" => Some(LINEAR_ATTRIBUTES),
        "radialGradient" => Some(RADIAL_ATTRIBUTES),
        "stop" => Some(STOP_ATTRIBUTES),
        _ => None,
    }
}

/// The coordinate system percentages and coordinates are relative to.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum GradientUnits {
    #[default]
    ObjectBoundingBox,
    UserSpaceOnUse,
}

impl GradientUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradientUnits::ObjectBoundingBox => "objectBoundingBox",
            GradientUnits::UserSpaceOnUse => "userSpaceOnUse",
        }
    }
}

impl Display for GradientUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GradientKind {
    Linear {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Radial {
        cx: f64,
        cy: f64,
        r: f64,
        fr: f64,
        fx: f64,
        fy: f64,
    },
}

/// A gradient with every percentage resolved to a number.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub id: String,
    pub kind: GradientKind,
    pub units: GradientUnits,
    pub transform: Affine2D,
    pub spread_method: String,
}

/// Resolves `number` or `number%` against one dimension of a reference box.
struct Coordinates<'a> {
    el: &'a Element,
    reference: Option<Rect>,
}

impl Coordinates<'_> {
    /// An absent attribute is `default` times the extent of the reference,
    /// or 0 when there is no reference.
    fn get(&self, name: &str, default: f64, extent: impl Fn(&Rect) -> f64) -> Result<f64, Error> {
        let Some(raw) = self.el.attr(name).map(str::trim) else {
            return Ok(self
                .reference
                .as_ref()
                .map(|reference| default * extent(reference))
                .unwrap_or_default());
        };
        let Some(pct) = raw.strip_suffix('%') else {
            return raw.parse().map_err(|_| Error::number(name, raw));
        };
        let pct: f64 = pct.trim().parse().map_err(|_| Error::number(name, raw))?;
        let Some(reference) = self.reference.as_ref() else {
            return Err(Error::Unsupported(format!(
                "{name}=\"{raw}\" on a userSpaceOnUse gradient requires a viewBox"
            )));
        };
        Ok(pct / 100.0 * extent(reference))
    }

    fn x(&self, name: &str, default: f64) -> Result<f64, Error> {
        self.get(name, default, |r| r.w)
    }

    fn y(&self, name: &str, default: f64) -> Result<f64, Error> {
        self.get(name, default, |r| r.h)
    }
}

impl Gradient {
    /// Read a gradient element.
    ///
    /// Percentages are relative to the unit box for objectBoundingBox and
    /// to `view_box` for userSpaceOnUse.
    pub fn from_element(el: &Element, view_box: Option<Rect>) -> Result<Gradient, Error> {
        let units = match el.attr("gradientUnits").map(str::trim) {
            None | Some("objectBoundingBox") => GradientUnits::ObjectBoundingBox,
            Some("userSpaceOnUse") => GradientUnits::UserSpaceOnUse,
            Some(other) => {
                return Err(Error::Unsupported(format!(
                    "{} gradientUnits=\"{other}\"",
                    el.tag
                )))
            }
        };
        let coords = Coordinates {
            el,
            reference: match units {
                GradientUnits::ObjectBoundingBox => Some(Rect::UNIT),
                GradientUnits::UserSpaceOnUse => view_box,
            },
        };
        let kind = match el.tag.as_str() {
            "linearGradient" => GradientKind::Linear {
                x1: coords.x("x1", 0.0)?,
                y1: coords.y("y1", 0.0)?,
                x2: coords.x("x2", 1.0)?,
                y2: coords.y("y2", 0.0)?,
            },
            "radialGradient" => {
                let cx = coords.x("cx", 0.5)?;
                let cy = coords.y("cy", 0.5)?;
                GradientKind::Radial {
                    cx,
                    cy,
                    r: coords.x("r", 0.5)?,
                    fr: coords.x("fr", 0.0)?,
                    fx: match el.attr("fx") {
                        Some(_) => coords.x("fx", 0.0)?,
                        None => cx,
                    },
                    fy: match el.attr("fy") {
                        Some(_) => coords.y("fy", 0.0)?,
                        None => cy,
                    },
                }
            }
            other => return Err(Error::Unsupported(format!("<{other}> is not a gradient"))),
        };
        let transform = match el.attr("gradientTransform") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => Affine2D::IDENTITY,
        };
        Ok(Gradient {
            id: el.attr("id").unwrap_or_default().to_string(),
            kind,
            units,
            transform,
            spread_method: el.attr("spreadMethod").unwrap_or("pad").to_string(),
        })
    }

    pub fn tag(&self) -> &'static str {
        match self.kind {
            GradientKind::Linear { .. } => "linearGradient",
            GradientKind::Radial { .. } => "radialGradient",
        }
    }

    /// The element for this gradient, without stops.
    ///
    /// Coordinates are always written, optional attributes only when they
    /// differ from what a reader would assume.
    pub fn to_element(&self) -> Element {
        let mut el = Element::new(self.tag());
        let mut set = |name: &str, value: String| {
            el.attributes.insert(name.to_string(), value);
        };
        if !self.id.is_empty() {
            set("id", self.id.clone());
        }
        match self.kind {
            GradientKind::Linear { x1, y1, x2, y2 } => {
                set("x1", ntos(x1));
                set("y1", ntos(y1));
                set("x2", ntos(x2));
                set("y2", ntos(y2));
            }
            GradientKind::Radial {
                cx,
                cy,
                r,
                fr,
                fx,
                fy,
            } => {
                set("cx", ntos(cx));
                set("cy", ntos(cy));
                set("r", ntos(r));
                if fr != 0.0 {
                    set("fr", ntos(fr));
                }
                if fx != cx {
                    set("fx", ntos(fx));
                }
                if fy != cy {
                    set("fy", ntos(fy));
                }
            }
        }
        if self.transform != Affine2D::IDENTITY {
            set("gradientTransform", self.transform.to_string());
        }
        if self.units != GradientUnits::default() {
            set("gradientUnits", self.units.to_string());
        }
        if self.spread_method != "pad" {
            set("spreadMethod", self.spread_method.clone());
        }
        el
    }

    /// The same gradient expressed in user space for a shape bounded by `bbox`.
    pub fn as_user_space_units(&self, bbox: Rect) -> Gradient {
        if self.units == GradientUnits::UserSpaceOnUse {
            return self.clone();
        }
        Gradient {
            units: GradientUnits::UserSpaceOnUse,
            transform: Affine2D::compose_ltr(&[
                self.transform,
                Affine2D::rect_to_rect(Rect::UNIT, bbox),
            ]),
            ..self.clone()
        }
    }

    fn coordinate_pairs(&mut self) -> [(&mut f64, &mut f64); 2] {
        match &mut self.kind {
            GradientKind::Linear { x1, y1, x2, y2 } => [(x1, y1), (x2, y2)],
            GradientKind::Radial { cx, cy, fx, fy, .. } => [(cx, cy), (fx, fy)],
        }
    }

    /// Move any translation in the transform into the coordinates.
    pub fn apply_translation(&mut self) {
        let (translate, affine_prime) = self.transform.decompose_translation();
        if translate.round(GRADIENT_TRANSFORM_NDIGITS) != Affine2D::IDENTITY {
            for (x, y) in self.coordinate_pairs() {
                let pt = translate.map_point((*x, *y));
                *x = round_scalar(pt.x, GRADIENT_TRANSFORM_NDIGITS);
                *y = round_scalar(pt.y, GRADIENT_TRANSFORM_NDIGITS);
            }
        }
        self.transform = affine_prime.round(GRADIENT_TRANSFORM_NDIGITS);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::tree::Document;

    use super::*;

    fn parse(xml: &str, view_box: Option<Rect>) -> Result<Gradient, Error> {
        let doc = Document::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">{xml}</svg>"#
        ))
        .unwrap();
        let el = doc.element_children(doc.root()).next().unwrap();
        Gradient::from_element(doc.element(el).unwrap(), view_box)
    }

    fn attributes(gradient: &Gradient) -> Vec<(String, String)> {
        gradient.to_element().attributes.into_iter().collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case(
        r#"<linearGradient id="lg"/>"#,
        &[("id", "lg"), ("x1", "0"), ("y1", "0"), ("x2", "1"), ("y2", "0")]
    )]
    #[case(
        r#"<linearGradient x1="10%" x2="50" gradientUnits="userSpaceOnUse"/>"#,
        &[("x1", "10"), ("y1", "0"), ("x2", "50"), ("y2", "0"), ("gradientUnits", "userSpaceOnUse")]
    )]
    #[case(
        r#"<linearGradient gradientUnits="userSpaceOnUse"/>"#,
        &[("x1", "0"), ("y1", "0"), ("x2", "100"), ("y2", "0"), ("gradientUnits", "userSpaceOnUse")]
    )]
    #[case(
        r#"<radialGradient/>"#,
        &[("cx", "0.5"), ("cy", "0.5"), ("r", "0.5")]
    )]
    #[case(
        r#"<radialGradient fx="25%" fr="0.1" spreadMethod="reflect"/>"#,
        &[("cx", "0.5"), ("cy", "0.5"), ("r", "0.5"), ("fr", "0.1"), ("fx", "0.25"), ("spreadMethod", "reflect")]
    )]
    #[case(
        r#"<radialGradient gradientTransform="scale(2)"/>"#,
        &[("cx", "0.5"), ("cy", "0.5"), ("r", "0.5"), ("gradientTransform", "matrix(2 0 0 2 0 0)")]
    )]
    fn from_element(#[case] xml: &str, #[case] expected: &[(&str, &str)]) {
        let gradient = parse(xml, Some(Rect::new(0.0, 0.0, 100.0, 100.0))).unwrap();
        assert_eq!(pairs(expected), attributes(&gradient));
    }

    #[test]
    fn user_space_percentage_without_view_box() {
        assert!(matches!(
            parse(
                r#"<linearGradient x1="10%" gradientUnits="userSpaceOnUse"/>"#,
                None
            ),
            Err(Error::Unsupported(..))
        ));
        // fine as long as no percentage is involved
        assert!(parse(
            r#"<linearGradient x1="1" x2="2" gradientUnits="userSpaceOnUse"/>"#,
            None
        )
        .is_ok());
    }

    #[test]
    fn user_space_defaults_without_view_box() {
        let gradient = parse(
            r#"<radialGradient cx="5" cy="5" r="5" gradientUnits="userSpaceOnUse"/>"#,
            None,
        )
        .unwrap();
        assert_eq!(
            GradientKind::Radial {
                cx: 5.0,
                cy: 5.0,
                r: 5.0,
                fr: 0.0,
                fx: 5.0,
                fy: 5.0,
            },
            gradient.kind
        );

        let gradient = parse(r#"<linearGradient gradientUnits="userSpaceOnUse"/>"#, None).unwrap();
        assert_eq!(
            GradientKind::Linear {
                x1: 0.0,
                y1: 0.0,
                x2: 0.0,
                y2: 0.0,
            },
            gradient.kind
        );
    }

    #[test]
    fn normalize_user_space_gradient_without_view_box() {
        let result = crate::normalize_str(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
                r#"<defs><radialGradient id="g" gradientUnits="userSpaceOnUse" cx="5" cy="5" r="5" gradientTransform="matrix(2 0 0 2 3 4)">"#,
                r#"<stop offset="0" stop-color="red"/></radialGradient></defs>"#,
                r#"<rect width="10" height="10" fill="url(#g)"/>"#,
                "</svg>"
            ),
            &crate::Options::default(),
        );
        let Err(Error::Violations(violations)) = &result else {
            panic!("expected a missing viewBox, got {result:?}");
        };
        assert_eq!(&vec![crate::Violation::MissingViewBox], violations);
    }

    #[test]
    fn unknown_units() {
        assert!(matches!(
            parse(r#"<linearGradient gradientUnits="bogus"/>"#, None),
            Err(Error::Unsupported(..))
        ));
    }

    #[test]
    fn as_user_space_units() {
        let gradient = parse(r#"<linearGradient/>"#, None)
            .unwrap()
            .as_user_space_units(Rect::new(10.0, 20.0, 2.0, 4.0));
        assert_eq!(GradientUnits::UserSpaceOnUse, gradient.units);
        assert_eq!(
            Affine2D::new(2.0, 0.0, 0.0, 4.0, 10.0, 20.0),
            gradient.transform
        );
    }

    #[rstest]
    // no transform, no change
    #[case(
        r#"<linearGradient id="c" x1="63.85" x2="63.85" y1="4245" y2="4137.3" gradientUnits="userSpaceOnUse"/>"#,
        &[("id", "c"), ("x1", "63.85"), ("y1", "4245"), ("x2", "63.85"), ("y2", "4137.3"), ("gradientUnits", "userSpaceOnUse")]
    )]
    #[case(
        r#"<linearGradient id="c" x1="63.85" x2="63.85" y1="4245" y2="4137.3" gradientTransform="translate(1 -4122)" gradientUnits="userSpaceOnUse"/>"#,
        &[("id", "c"), ("x1", "64.85"), ("y1", "123"), ("x2", "64.85"), ("y2", "15.3"), ("gradientUnits", "userSpaceOnUse")]
    )]
    #[case(
        r#"<radialGradient id="b" cx="63.523" cy="12368" r="53.477" gradientTransform="matrix(.5 0 0 .2631 0 -3150)" gradientUnits="userSpaceOnUse"/>"#,
        &[("id", "b"), ("cx", "63.523"), ("cy", "395.366021"), ("r", "53.477"), ("gradientTransform", "matrix(0.5 0 0 0.2631 0 0)"), ("gradientUnits", "userSpaceOnUse")]
    )]
    #[case(
        r#"<radialGradient id="mbbox" cx="0.75" cy="0.75" r="0.40" gradientTransform="matrix(1 1 -0.7873 -0.001717 0.5 0)" gradientUnits="objectBoundingBox"/>"#,
        &[("id", "mbbox"), ("cx", "0.748907"), ("cy", "0.11353"), ("r", "0.4"), ("gradientTransform", "matrix(1 1 -0.7873 -0.001717 0 0)")]
    )]
    #[case(
        r#"<radialGradient id="f" cx="-779.79" cy="3150" r="58.471" gradientTransform="matrix(0 1 -1 0 3082.5 1129.5)" gradientUnits="userSpaceOnUse"/>"#,
        &[("id", "f"), ("cx", "349.71"), ("cy", "67.5"), ("r", "58.471"), ("gradientTransform", "matrix(0 1 -1 0 0 0)"), ("gradientUnits", "userSpaceOnUse")]
    )]
    fn apply_translation(#[case] xml: &str, #[case] expected: &[(&str, &str)]) {
        let mut gradient = parse(xml, None).unwrap();
        gradient.apply_translation();
        assert_eq!(pairs(expected), attributes(&gradient));
    }

    #[test]
    fn apply_translation_only_translate() {
        let mut gradient =
            parse(r#"<radialGradient gradientTransform="translate(1 2)"/>"#, None).unwrap();
        gradient.apply_translation();
        assert_eq!(
            pairs(&[("cx", "1.5"), ("cy", "2.5"), ("r", "0.5")]),
            attributes(&gradient)
        );
    }
}
