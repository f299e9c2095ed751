//! Basic shapes and the presentation attributes they carry.
//!
//! See <https://www.w3.org/TR/SVG11/shapes.html> and
//! <https://www.w3.org/TR/SVG11/painting.html>

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use svgpathops::{FillRule, LineCap, LineJoin, StrokeStyle};

use crate::{
    affine::Affine2D,
    css,
    error::Error,
    geometry::{ntos, round_multiple, round_scalar, Rect},
    path::Path,
    path_data,
    tree::Element,
};

/// Presentation attributes a shape understands, in the order they are written.
pub const PRESENTATION_ATTRIBUTES: [&str; 18] = [
    "id",
    "clip-path",
    "clip-rule",
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-opacity",
    "opacity",
    "transform",
    "style",
    "display",
];

/// The geometry attributes of each shape element.
pub fn geometry_attributes(tag: &str) -> Option<&'static [&'static str]> {
    let names: &'static [&'static str] = match tag {
        "path" => &["d"],
        "rect" => &["x", "y", "width", "height", "rx", "ry"],
        "circle" => &["r", "cx", "cy"],
        "ellipse" => &["rx", "ry", "cx", "cy"],
        "line" => &["x1", "y1", "x2", "y2"],
        "polygon" | "polyline" => &["points"],
        _ => return None,
    };
    Some(names)
}

pub fn is_shape_tag(tag: &str) -> bool {
    geometry_attributes(tag).is_some()
}

/// Whether a shape element takes `attr_name` at all
pub fn is_shape_attribute(tag: &str, attr_name: &str) -> bool {
    PRESENTATION_ATTRIBUTES.contains(&attr_name)
        || geometry_attributes(tag).is_some_and(|names| names.contains(&attr_name))
}

fn parse_number(attribute: &str, value: &str) -> Result<f64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::number(attribute, value))
}

/// The painting attributes shared by every shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub id: String,
    pub clip_path: String,
    pub clip_rule: FillRule,
    pub fill: String,
    pub fill_opacity: f64,
    pub fill_rule: FillRule,
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_linecap: LineCap,
    pub stroke_linejoin: LineJoin,
    pub stroke_miterlimit: f64,
    pub stroke_dasharray: String,
    pub stroke_dashoffset: f64,
    pub stroke_opacity: f64,
    pub opacity: f64,
    pub transform: String,
    pub style: String,
    pub display: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Presentation {
            id: String::new(),
            clip_path: String::new(),
            clip_rule: FillRule::NonZero,
            fill: "black".to_string(),
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: "none".to_string(),
            stroke_width: 1.0,
            stroke_linecap: LineCap::Butt,
            stroke_linejoin: LineJoin::Miter,
            stroke_miterlimit: 4.0,
            stroke_dasharray: "none".to_string(),
            stroke_dashoffset: 0.0,
            stroke_opacity: 1.0,
            opacity: 1.0,
            transform: String::new(),
            style: String::new(),
            display: "inline".to_string(),
        }
    }
}

impl Presentation {
    /// Set the field for `name`; false if `name` isn't a presentation attribute.
    pub fn set(&mut self, name: &str, value: &str) -> Result<bool, Error> {
        let number = || parse_number(name, value);
        match name {
            "id" => self.id = value.to_string(),
            "clip-path" => self.clip_path = value.to_string(),
            "clip-rule" => self.clip_rule = value.parse()?,
            "fill" => self.fill = value.to_string(),
            "fill-opacity" => self.fill_opacity = number()?,
            "fill-rule" => self.fill_rule = value.parse()?,
            "stroke" => self.stroke = value.to_string(),
            "stroke-width" => self.stroke_width = number()?,
            "stroke-linecap" => self.stroke_linecap = value.parse()?,
            "stroke-linejoin" => self.stroke_linejoin = value.parse()?,
            "stroke-miterlimit" => self.stroke_miterlimit = number()?,
            "stroke-dasharray" => self.stroke_dasharray = value.to_string(),
            "stroke-dashoffset" => self.stroke_dashoffset = number()?,
            "stroke-opacity" => self.stroke_opacity = number()?,
            "opacity" => self.opacity = number()?,
            "transform" => self.transform = value.to_string(),
            "style" => self.style = value.to_string(),
            "display" => self.display = value.to_string(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Name and value of every attribute that isn't at its default.
    pub fn to_attributes(&self) -> Vec<(&'static str, String)> {
        self.attribute_values()
            .into_iter()
            .zip(Presentation::default().attribute_values())
            .filter(|(mine, default)| mine.1 != default.1)
            .map(|(mine, _)| mine)
            .collect()
    }

    fn attribute_values(&self) -> [(&'static str, String); 18] {
        [
            ("id", self.id.clone()),
            ("clip-path", self.clip_path.clone()),
            ("clip-rule", self.clip_rule.as_str().to_string()),
            ("fill", self.fill.clone()),
            ("fill-opacity", ntos(self.fill_opacity)),
            ("fill-rule", self.fill_rule.as_str().to_string()),
            ("stroke", self.stroke.clone()),
            ("stroke-width", ntos(self.stroke_width)),
            ("stroke-linecap", self.stroke_linecap.as_str().to_string()),
            ("stroke-linejoin", self.stroke_linejoin.as_str().to_string()),
            ("stroke-miterlimit", ntos(self.stroke_miterlimit)),
            ("stroke-dasharray", self.stroke_dasharray.clone()),
            ("stroke-dashoffset", ntos(self.stroke_dashoffset)),
            ("stroke-opacity", ntos(self.stroke_opacity)),
            ("opacity", ntos(self.opacity)),
            ("transform", self.transform.clone()),
            ("style", self.style.clone()),
            ("display", self.display.clone()),
        ]
    }

    /// Put every stroke attribute back to its default
    pub fn reset_stroke(&mut self) {
        let default = Presentation::default();
        self.stroke = default.stroke;
        self.stroke_width = default.stroke_width;
        self.stroke_linecap = default.stroke_linecap;
        self.stroke_linejoin = default.stroke_linejoin;
        self.stroke_miterlimit = default.stroke_miterlimit;
        self.stroke_dasharray = default.stroke_dasharray;
        self.stroke_dashoffset = default.stroke_dashoffset;
        self.stroke_opacity = default.stroke_opacity;
    }

    fn map_numbers(&mut self, f: impl Fn(f64) -> f64) {
        for v in [
            &mut self.fill_opacity,
            &mut self.stroke_width,
            &mut self.stroke_miterlimit,
            &mut self.stroke_dashoffset,
            &mut self.stroke_opacity,
            &mut self.opacity,
        ] {
            *v = f(*v);
        }
    }
}

/// The default value of a presentation attribute, as text.
pub fn default_value(name: &str) -> Option<String> {
    Presentation::default()
        .attribute_values()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

/// The geometry of each kind of shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Path(Path),
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Circle {
        r: f64,
        cx: f64,
        cy: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
        cx: f64,
        cy: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polygon(String),
    Polyline(String),
}

impl Geometry {
    /// A rect, with corner radii resolved the way SVG does.
    ///
    /// A missing radius takes the value of the other, both are clamped to
    /// half the corresponding side.
    pub fn rect(x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64) -> Geometry {
        let (rx, ry) = match (rx, ry) {
            (rx, 0.0) => (rx, rx),
            (0.0, ry) => (ry, ry),
            radii => radii,
        };
        Geometry::Rect {
            x,
            y,
            width,
            height,
            rx: rx.min(width / 2.0),
            ry: ry.min(height / 2.0),
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Geometry::Path(_) => "path",
            Geometry::Rect { .. } => "rect",
            Geometry::Circle { .. } => "circle",
            Geometry::Ellipse { .. } => "ellipse",
            Geometry::Line { .. } => "line",
            Geometry::Polygon(_) => "polygon",
            Geometry::Polyline(_) => "polyline",
        }
    }

    fn from_attributes(tag: &str, attributes: &IndexMap<String, String>) -> Result<Geometry, Error> {
        let number = |name: &str| -> Result<f64, Error> {
            match attributes.get(name).filter(|v| !v.trim().is_empty()) {
                Some(value) => parse_number(name, value),
                None => Ok(0.0),
            }
        };
        let text = |name: &str| attributes.get(name).cloned().unwrap_or_default();
        let geometry = match tag {
            "path" => Geometry::Path(text("d").parse()?),
            "rect" => Geometry::rect(
                number("x")?,
                number("y")?,
                number("width")?,
                number("height")?,
                number("rx")?,
                number("ry")?,
            ),
            "circle" => Geometry::Circle {
                r: number("r")?,
                cx: number("cx")?,
                cy: number("cy")?,
            },
            "ellipse" => Geometry::Ellipse {
                rx: number("rx")?,
                ry: number("ry")?,
                cx: number("cx")?,
                cy: number("cy")?,
            },
            "line" => Geometry::Line {
                x1: number("x1")?,
                y1: number("y1")?,
                x2: number("x2")?,
                y2: number("y2")?,
            },
            "polygon" => Geometry::Polygon(text("points")),
            "polyline" => Geometry::Polyline(text("points")),
            _ => return Err(Error::Unsupported(format!("<{tag}> is not a shape"))),
        };
        Ok(geometry)
    }

    fn to_attributes(&self) -> Vec<(&'static str, String)> {
        let numbers = |values: &[(&'static str, f64)]| {
            values
                .iter()
                .filter(|(_, v)| *v != 0.0)
                .map(|(n, v)| (*n, ntos(*v)))
                .collect::<Vec<_>>()
        };
        match self {
            Geometry::Path(path) if path.is_empty() => Vec::new(),
            Geometry::Path(path) => vec![("d", path.to_string())],
            Geometry::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                let ry = if rx == ry { 0.0 } else { *ry };
                numbers(&[
                    ("x", *x),
                    ("y", *y),
                    ("width", *width),
                    ("height", *height),
                    ("rx", *rx),
                    ("ry", ry),
                ])
            }
            Geometry::Circle { r, cx, cy } => numbers(&[("r", *r), ("cx", *cx), ("cy", *cy)]),
            Geometry::Ellipse { rx, ry, cx, cy } => {
                numbers(&[("rx", *rx), ("ry", *ry), ("cx", *cx), ("cy", *cy)])
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                numbers(&[("x1", *x1), ("y1", *y1), ("x2", *x2), ("y2", *y2)])
            }
            Geometry::Polygon(points) | Geometry::Polyline(points) if points.is_empty() => {
                Vec::new()
            }
            Geometry::Polygon(points) | Geometry::Polyline(points) => {
                vec![("points", points.clone())]
            }
        }
    }

    /// The equivalent path, drawn the way browsers draw the shape.
    pub fn as_path(&self) -> Result<Path, Error> {
        let mut path = Path::new();
        match *self {
            Geometry::Path(ref p) => return Ok(p.clone()),
            Geometry::Rect {
                x,
                y,
                width: w,
                height: h,
                rx,
                ry,
            } => {
                path.move_to(x + rx, y).horizontal_to(x + w - rx);
                if rx > 0.0 {
                    path.arc_to(rx, ry, x + w, y + ry, false);
                }
                path.vertical_to(y + h - ry);
                if rx > 0.0 {
                    path.arc_to(rx, ry, x + w - rx, y + h, false);
                }
                path.horizontal_to(x + rx);
                if rx > 0.0 {
                    path.arc_to(rx, ry, x, y + h - ry, false);
                }
                path.vertical_to(y + ry);
                if rx > 0.0 {
                    path.arc_to(rx, ry, x + rx, y, false);
                }
                path.close();
            }
            Geometry::Circle { r, cx, cy } => {
                return Geometry::Ellipse { rx: r, ry: r, cx, cy }.as_path();
            }
            // An arc can't be a complete ellipse, draw two halves clockwise
            // starting at 3 o'clock.
            Geometry::Ellipse { rx, ry, cx, cy } => {
                path.move_to(cx + rx, cy)
                    .arc_to(rx, ry, cx - rx, cy, true)
                    .arc_to(rx, ry, cx + rx, cy, true)
                    .close();
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                path.move_to(x1, y1).line_to(x2, y2);
            }
            Geometry::Polygon(ref points) if !points.trim().is_empty() => {
                return format!("M{points} Z").parse();
            }
            Geometry::Polyline(ref points) if !points.trim().is_empty() => {
                return format!("M{points}").parse();
            }
            Geometry::Polygon(_) | Geometry::Polyline(_) => (),
        }
        Ok(path)
    }

    fn map_numbers(&mut self, f: impl Fn(f64) -> f64) {
        match self {
            Geometry::Path(path) => *path = path_map(path, &f),
            Geometry::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                for v in [x, y, width, height, rx, ry] {
                    *v = f(*v);
                }
            }
            Geometry::Circle { r, cx, cy } => {
                for v in [r, cx, cy] {
                    *v = f(*v);
                }
            }
            Geometry::Ellipse { rx, ry, cx, cy } => {
                for v in [rx, ry, cx, cy] {
                    *v = f(*v);
                }
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                for v in [x1, y1, x2, y2] {
                    *v = f(*v);
                }
            }
            Geometry::Polygon(points) | Geometry::Polyline(points) => {
                *points = points_map(points, &f);
            }
        }
    }
}

/// Map each number in a points list, leaving a list that won't parse as is.
fn points_map(points: &str, f: &impl Fn(f64) -> f64) -> String {
    let Ok(commands) = path_data::parse(&format!("M{points}"), false) else {
        return points.to_string();
    };
    commands
        .iter()
        .flat_map(|cmd| cmd.args.chunks(2))
        .map(|xy| xy.iter().map(|v| ntos(f(*v))).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join(" ")
}

fn path_map(path: &Path, f: &impl Fn(f64) -> f64) -> Path {
    Path::from_commands(path.iter().map(|cmd| {
        let mut cmd = *cmd;
        cmd.args_mut().iter_mut().for_each(|v| *v = f(*v));
        cmd
    }))
}

/// A basic shape: geometry plus how to paint it.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub presentation: Presentation,
    pub geometry: Geometry,
}

impl Shape {
    pub fn new(geometry: Geometry) -> Shape {
        Shape {
            presentation: Default::default(),
            geometry,
        }
    }

    pub fn from_path(path: Path) -> Shape {
        Shape::new(Geometry::Path(path))
    }

    /// Read a shape element. Blank attributes count as absent.
    pub fn from_element(el: &Element) -> Result<Shape, Error> {
        if !el.is_svg() || !is_shape_tag(&el.tag) {
            return Err(Error::Unsupported(format!("<{}> is not a shape", el.tag)));
        }
        let mut presentation = Presentation::default();
        for name in PRESENTATION_ATTRIBUTES {
            match el.attr(name) {
                Some(value) if !value.trim().is_empty() => {
                    presentation.set(name, value)?;
                }
                _ => (),
            }
        }
        Ok(Shape {
            presentation,
            geometry: Geometry::from_attributes(&el.tag, &el.attributes)?,
        })
    }

    pub fn tag(&self) -> &'static str {
        self.geometry.tag()
    }

    /// The element for this shape, attributes at their default omitted.
    pub fn to_element(&self) -> Element {
        let mut el = Element::new(self.tag());
        el.attributes.extend(
            self.presentation
                .to_attributes()
                .into_iter()
                .chain(self.geometry.to_attributes())
                .map(|(name, value)| (name.to_string(), value)),
        );
        el
    }

    /// The same shape drawn as a path
    pub fn to_path_shape(&self) -> Result<Shape, Error> {
        Ok(Shape {
            presentation: self.presentation.clone(),
            geometry: Geometry::Path(self.geometry.as_path()?),
        })
    }

    pub fn as_path(&self) -> Result<Path, Error> {
        self.geometry.as_path()
    }

    /// Absolute moves, lines and curves only.
    pub fn canonical_path(&self) -> Result<Path, Error> {
        Ok(self.as_path()?.canonical())
    }

    /// Paths become absolute, other shapes are unchanged
    pub fn absolute(&self) -> Shape {
        match &self.geometry {
            Geometry::Path(path) => Shape {
                presentation: self.presentation.clone(),
                geometry: Geometry::Path(path.absolute()),
            },
            _ => self.clone(),
        }
    }

    pub fn bounding_box(&self) -> Result<Option<Rect>, Error> {
        Ok(self.as_path()?.bounding_box())
    }

    /// This shape as a path transformed by `transform`.
    ///
    /// A degenerate transform collapses the shape to a lone move.
    pub fn apply_transform(&self, transform: &Affine2D) -> Result<Shape, Error> {
        let path = if transform.is_degenerate() {
            let mut path = Path::new();
            path.move_to(0.0, 0.0);
            path
        } else {
            self.as_path()?.transform(transform)
        };
        Ok(self.with_path(path))
    }

    /// The same presentation with different geometry
    pub fn with_path(&self, path: Path) -> Shape {
        Shape {
            presentation: self.presentation.clone(),
            geometry: Geometry::Path(path),
        }
    }

    /// Move declarations in `style` onto the matching attributes.
    ///
    /// Declarations that don't match a presentation attribute stay in `style`.
    pub fn apply_style_attribute(&self) -> Result<Shape, Error> {
        let mut shape = self.clone();
        if shape.presentation.style.is_empty() {
            return Ok(shape);
        }
        let declarations = css::parse_declarations(&shape.presentation.style, |name| {
            PRESENTATION_ATTRIBUTES.contains(&name)
        })?;
        for (name, value) in declarations.parsed.iter() {
            shape.presentation.set(name, value)?;
        }
        shape.presentation.style = declarations.unparsed;
        Ok(shape)
    }

    /// False if we're sure this shape will not paint, true if it might.
    pub fn might_paint(&self, tolerance: f64) -> Result<bool, Error> {
        let shape = self.apply_style_attribute()?;
        let p = &shape.presentation;
        if p.display == "none" {
            return Ok(false);
        }
        let path = shape.canonical_path()?;
        // if all you do is move the pen around you can't draw
        if path.only_moves() {
            return Ok(false);
        }
        let visible = |paint: &str, opacity: f64| paint != "none" && p.opacity * opacity != 0.0;
        if visible(&p.stroke, p.stroke_opacity) && p.stroke_width != 0.0 {
            return Ok(true);
        }
        if !visible(&p.fill, p.fill_opacity) {
            return Ok(false);
        }
        Ok(path.area(p.fill_rule, tolerance) > 0.0)
    }

    /// Fold fill or stroke opacity into opacity when the other paint is none.
    pub fn normalize_opacity(&mut self) {
        let p = &mut self.presentation;
        if p.fill == "none" && p.stroke == "none" {
            return;
        }
        if p.fill == "none" {
            p.opacity *= p.stroke_opacity;
            p.stroke_opacity = 1.0;
        }
        if p.stroke == "none" {
            p.opacity *= p.fill_opacity;
            p.fill_opacity = 1.0;
        }
    }

    /// The stroke attributes as a stroke style.
    ///
    /// An odd number of dashes is repeated to yield an even number, e.g.
    /// 5,3,2 => 5,3,2,5,3,2.
    pub fn stroke_style(&self) -> Result<StrokeStyle, Error> {
        let p = &self.presentation;
        let mut dash_array = Vec::new();
        if p.stroke_dasharray != "none" {
            dash_array = dash_separator_re()
                .split(&p.stroke_dasharray)
                .filter(|v| !v.is_empty())
                .map(|v| parse_number("stroke-dasharray", v))
                .collect::<Result<Vec<_>, _>>()?;
        }
        if dash_array.len() % 2 != 0 {
            dash_array.extend(dash_array.clone());
        }
        Ok(StrokeStyle {
            width: p.stroke_width,
            cap: p.stroke_linecap,
            join: p.stroke_linejoin,
            miter_limit: p.stroke_miterlimit,
            dash_array,
            dash_offset: p.stroke_dashoffset,
        })
    }

    /// The area the stroke paints, as a path.
    pub fn stroke_path(&self, tolerance: f64) -> Result<Path, Error> {
        let bez = self.as_path()?.to_bez_path();
        let outline = svgpathops::stroke(&bez, &self.stroke_style()?, tolerance);
        Ok(Path::from_bez_path(&outline))
    }

    /// This shape as a path free of overlaps, filled nonzero.
    pub fn remove_overlaps(&self, tolerance: f64) -> Result<Shape, Error> {
        let p = &self.presentation;
        let bez = self.as_path()?.to_bez_path();
        let simplified = svgpathops::remove_overlaps(&bez, p.fill_rule, tolerance);
        let mut shape = self.with_path(Path::from_bez_path(&simplified));
        shape.presentation.fill_rule = FillRule::NonZero;
        shape.presentation.clip_rule = FillRule::NonZero;
        Ok(shape)
    }

    pub fn round_floats(&self, ndigits: u32) -> Shape {
        self.map_numbers(|v| round_scalar(v, ndigits))
    }

    pub fn round_multiple(&self, multiple_of: f64) -> Shape {
        self.map_numbers(|v| round_multiple(v, multiple_of))
    }

    fn map_numbers(&self, f: impl Fn(f64) -> f64) -> Shape {
        let mut shape = self.clone();
        shape.presentation.map_numbers(&f);
        shape.geometry.map_numbers(&f);
        shape
    }

    /// Same path commands, arguments within `tolerance`.
    pub fn almost_equals(&self, other: &Shape, tolerance: f64) -> Result<bool, Error> {
        Ok(self.as_path()?.almost_equals(&other.as_path()?, tolerance))
    }
}

fn dash_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[, ]").unwrap())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::tree::Document;

    use super::*;

    fn shape(xml: &str) -> Shape {
        let doc = Document::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">{xml}</svg>"#
        ))
        .unwrap();
        let el = doc.element_children(doc.root()).next().unwrap();
        Shape::from_element(doc.element(el).unwrap()).unwrap()
    }

    #[rstest]
    #[case(r#"<rect width="1" height="1"/>"#, "M0,0 H1 V1 H0 V0 Z")]
    #[case(
        r#"<rect x="9" y="9" width="11" height="7" rx="2"/>"#,
        "M11,9 H18 A2 2 0 0 1 20,11 V14 A2 2 0 0 1 18,16 H11 A2 2 0 0 1 9,14 V11 A2 2 0 0 1 11,9 Z"
    )]
    // radii clamp to half the side
    #[case(
        r#"<rect width="4" height="2" ry="5"/>"#,
        "M2,0 H2 A2 1 0 0 1 4,1 V1 A2 1 0 0 1 2,2 H2 A2 1 0 0 1 0,1 V1 A2 1 0 0 1 2,0 Z"
    )]
    #[case(
        r#"<circle cx="600" cy="200" r="100"/>"#,
        "M700,200 A100 100 0 1 1 500,200 A100 100 0 1 1 700,200 Z"
    )]
    #[case(
        r#"<ellipse cx="100" cy="50" rx="100" ry="50"/>"#,
        "M200,50 A100 50 0 1 1 0,50 A100 50 0 1 1 200,50 Z"
    )]
    #[case(r#"<line x1="10" x2="50" y1="110" y2="150"/>"#, "M10,110 L50,150")]
    #[case(
        r#"<polygon points="50 160 55 180 70 180"/>"#,
        "M50,160 L55,180 L70,180 Z"
    )]
    #[case(r#"<polyline points="50,160 55,180 70,180"/>"#, "M50,160 L55,180 L70,180")]
    #[case(r#"<polygon/>"#, "")]
    #[case(r#"<path d="M1,1 2,2"/>"#, "M1,1 L2,2")]
    fn as_path(#[case] xml: &str, #[case] expected: &str) {
        assert_eq!(expected, shape(xml).as_path().unwrap().to_string());
    }

    #[test]
    fn to_element_omits_defaults() {
        let shape = shape(
            r#"<rect x="1" y="0" width="2" height="3" rx="1" fill="black" opacity="0.5" stroke-width="1"/>"#,
        );
        let el = shape.to_element();
        assert_eq!("rect", el.tag);
        assert_eq!(
            vec![
                ("opacity", "0.5"),
                ("x", "1"),
                ("width", "2"),
                ("height", "3"),
                ("rx", "1"),
            ],
            el.attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn bad_number() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10%"/></svg>"#,
        )
        .unwrap();
        let el = doc.element_children(doc.root()).next().unwrap();
        assert!(matches!(
            Shape::from_element(doc.element(el).unwrap()),
            Err(Error::ParseNumber { .. })
        ));
    }

    #[rstest]
    // no fill, no stroke
    #[case(r#"<path d="M1,1 L10,1 L10,10 Z" fill="none"/>"#, false)]
    // only moves
    #[case(r#"<path d="M1,1 M10,10"/>"#, false)]
    // no area
    #[case(r#"<path d="M1,1 L10,10"/>"#, false)]
    #[case(r#"<path d="M1,1 L10,1 L10,10 Z"/>"#, true)]
    #[case(r#"<path d="M1,1 L10,1 L10,10 Z" display="none"/>"#, false)]
    #[case(r#"<path d="M1,1 L10,1 L10,10 Z" style="display:none"/>"#, false)]
    #[case(r#"<path d="M1,1 L10,1 L10,10 Z" opacity="0"/>"#, false)]
    #[case(r#"<path d="M1,1 L10,1 L10,10 Z" fill-opacity="0"/>"#, false)]
    // a stroked line paints
    #[case(r#"<path d="M1,1 L10,10" stroke="red"/>"#, true)]
    #[case(r#"<path d="M1,1 L10,10" stroke="red" stroke-width="0"/>"#, false)]
    #[case(r#"<path d="M1,1 L10,10" stroke="red" stroke-opacity="0"/>"#, false)]
    fn might_paint(#[case] xml: &str, #[case] expected: bool) {
        assert_eq!(expected, shape(xml).might_paint(0.1).unwrap());
    }

    #[rstest]
    #[case(r#"<path fill-opacity="0.5" stroke-opacity="0.2"/>"#, 0.5, 1.0, 0.2)]
    #[case(
        r#"<path fill="none" stroke="red" fill-opacity="0.5" stroke-opacity="0.2"/>"#,
        0.2,
        0.5,
        1.0
    )]
    #[case(
        r#"<path fill="none" stroke="none" fill-opacity="0.5" stroke-opacity="0.2"/>"#,
        1.0,
        0.5,
        0.2
    )]
    #[case(
        r#"<path fill="red" stroke="blue" fill-opacity="0.5" stroke-opacity="0.2"/>"#,
        1.0,
        0.5,
        0.2
    )]
    fn normalize_opacity(
        #[case] xml: &str,
        #[case] opacity: f64,
        #[case] fill_opacity: f64,
        #[case] stroke_opacity: f64,
    ) {
        let mut shape = shape(xml);
        shape.normalize_opacity();
        let p = &shape.presentation;
        assert_eq!(
            (opacity, fill_opacity, stroke_opacity),
            (p.opacity, p.fill_opacity, p.stroke_opacity)
        );
    }

    #[test]
    fn apply_style_attribute() {
        let shape = shape(
            r#"<path d="M0,0" style="fill:red; stroke-width:2; enable-background:new"/>"#,
        )
        .apply_style_attribute()
        .unwrap();
        assert_eq!("red", shape.presentation.fill);
        assert_eq!(2.0, shape.presentation.stroke_width);
        assert_eq!("enable-background:new;", shape.presentation.style);
    }

    #[rstest]
    #[case("none", vec![])]
    #[case("5,3,2", vec![5.0, 3.0, 2.0, 5.0, 3.0, 2.0])]
    #[case("4 2", vec![4.0, 2.0])]
    fn stroke_dashes(#[case] dasharray: &str, #[case] expected: Vec<f64>) {
        let mut shape = shape(r#"<path d="M0,0 L10,0"/>"#);
        shape.presentation.stroke_dasharray = dasharray.to_string();
        assert_eq!(expected, shape.stroke_style().unwrap().dash_array);
    }

    #[test]
    fn stroke_path() {
        let shape = shape(r#"<path d="M0,5 L10,5" stroke="red" stroke-width="2"/>"#);
        let bbox = shape.stroke_path(0.1).unwrap().bounding_box().unwrap();
        let actual = [bbox.x, bbox.y, bbox.w, bbox.h];
        let expected = [0.0, 4.0, 10.0, 2.0];
        assert!(
            actual.iter().zip(expected).all(|(a, e)| (a - e).abs() < 1e-6),
            "{actual:?}"
        );
    }

    #[test]
    fn degenerate_transform() {
        let shape = shape(r#"<rect width="1" height="1"/>"#);
        let transformed = shape
            .apply_transform(&Affine2D::new(0.0, 0.0, 0.0, 0.0, 5.0, 5.0))
            .unwrap();
        assert_eq!("M0,0", transformed.as_path().unwrap().to_string());
        assert_eq!("path", transformed.tag());
    }

    #[test]
    fn round_floats() {
        let shape = shape(r#"<circle r="1.23456" opacity="0.33333"/>"#).round_floats(2);
        assert_eq!(
            Geometry::Circle {
                r: 1.23,
                cx: 0.0,
                cy: 0.0
            },
            shape.geometry
        );
        assert_eq!(0.33, shape.presentation.opacity);
    }

    #[rstest]
    #[case(
        r#"<polygon points="1.23456 2.5,3 -0.004"/>"#,
        Geometry::Polygon("1.23,2.5 3,0".to_string())
    )]
    #[case(
        r#"<polyline points="10.006,20 30-40.1"/>"#,
        Geometry::Polyline("10.01,20 30,-40.1".to_string())
    )]
    #[case(r#"<polygon points=""/>"#, Geometry::Polygon(String::new()))]
    // an odd count doesn't parse, leave it alone
    #[case(
        r#"<polyline points="1.23456 2 3"/>"#,
        Geometry::Polyline("1.23456 2 3".to_string())
    )]
    fn round_points(#[case] xml: &str, #[case] expected: Geometry) {
        assert_eq!(expected, shape(xml).round_floats(2).geometry);
    }

    #[test]
    fn default_values() {
        assert_eq!(Some("black".to_string()), default_value("fill"));
        assert_eq!(Some("1".to_string()), default_value("opacity"));
        assert_eq!(None, default_value("d"));
    }
}
