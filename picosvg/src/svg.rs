//! An SVG document and the passes that normalize it.

use std::{collections::HashMap, fs, str::FromStr, sync::OnceLock};

use log::{debug, trace, warn};
use regex::Regex;

use crate::{
    affine::Affine2D,
    check::{check, CheckResult, Violation},
    css,
    error::Error,
    geometry::Rect,
    inherit::inherit_attributes,
    shape::{is_shape_tag, Geometry, Shape},
    traverse::{traverse, Order, TraverseContext},
    tree::{Document, NodeData, NodeId, XLINK_HREF},
};

/// How much error, as a percentage of the smaller view box dimension, lossy
/// operations may introduce. For a 128x128 view box that's 0.128.
const MAX_PCT_ERROR: f64 = 0.1;

/// Tolerance, in user units, when there is no view box.
const DEFAULT_TOLERANCE: f64 = 0.1;

/// Controls [`Svg::topicosvg`].
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Digits kept after the decimal point in shape geometry
    pub ndigits: u32,
    /// Let text through untouched rather than rejecting it
    pub allow_text: bool,
    /// Remove unsupported elements rather than failing
    pub drop_unsupported: bool,
    /// Drop or clip whatever lies outside the view box
    pub clip_to_viewbox: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            ndigits: 3,
            allow_text: false,
            drop_unsupported: false,
            clip_to_viewbox: false,
        }
    }
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^url[(]#([\w-]+)[)]$").unwrap())
}

fn view_box_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",|\s+").unwrap())
}

/// The id in a `url(#id)` reference.
pub fn id_of_target(url: &str) -> Result<&str, Error> {
    url_re()
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::BadUrl(url.to_string()))
}

/// The one element `url` refers to, optionally requiring a specific tag.
pub fn resolve_url(
    doc: &Document,
    url: &str,
    expected_tag: Option<&'static str>,
) -> Result<NodeId, Error> {
    let id = id_of_target(url)?;
    let node = doc
        .find_by_id(id)?
        .ok_or_else(|| Error::MissingReference(id.to_string()))?;
    if let Some(expected) = expected_tag {
        let tag = doc.svg_tag(node).unwrap_or_default();
        if tag != expected {
            return Err(Error::UnexpectedTarget {
                id: id.to_string(),
                tag: tag.to_string(),
                expected,
            });
        }
    }
    Ok(node)
}

/// Parse `min-x min-y width height`.
pub fn parse_view_box(raw: &str) -> Result<Rect, Error> {
    let values = view_box_separator_re()
        .split(raw.trim())
        .map(|v| v.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::ParseViewBox(raw.to_string()))?;
    match values[..] {
        [x, y, w, h] => Ok(Rect::new(x, y, w, h)),
        _ => Err(Error::ParseViewBox(raw.to_string())),
    }
}

fn number_attr(doc: &Document, node: NodeId, name: &str, default: f64) -> Result<f64, Error> {
    match doc.attr(node, name) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| Error::number(name, raw))
        }
        _ => Ok(default),
    }
}

/// Where `view_box` lands within `viewport`.
///
/// See <https://www.w3.org/TR/SVG11/coords.html#PreserveAspectRatioAttribute>
fn view_box_transform(
    view_box: Rect,
    viewport: Rect,
    preserve_aspect_ratio: &str,
) -> Result<Affine2D, Error> {
    let mut parts = preserve_aspect_ratio.split_whitespace();
    let align = parts.next().unwrap_or("xMidYMid");
    let slice = match parts.next() {
        None | Some("meet") => false,
        Some("slice") => true,
        Some(other) => {
            return Err(Error::Unsupported(format!(
                "preserveAspectRatio=\"{preserve_aspect_ratio}\", '{other}'"
            )))
        }
    };
    if align == "none" || view_box.empty() || viewport.empty() {
        return Ok(Affine2D::rect_to_rect(view_box, viewport));
    }
    let (sx, sy) = (viewport.w / view_box.w, viewport.h / view_box.h);
    let scale = if slice { sx.max(sy) } else { sx.min(sy) };
    let offset = |part: Option<&str>, space: f64| match part {
        Some("Min") => Ok(0.0),
        Some("Mid") => Ok(space / 2.0),
        Some("Max") => Ok(space),
        _ => Err(Error::Unsupported(format!(
            "preserveAspectRatio=\"{preserve_aspect_ratio}\""
        ))),
    };
    let dx = offset(align.get(1..4), viewport.w - view_box.w * scale)?;
    let dy = offset(align.get(5..8), viewport.h - view_box.h * scale)?;
    Ok(Affine2D::new(
        scale,
        0.0,
        0.0,
        scale,
        viewport.x - view_box.x * scale + dx,
        viewport.y - view_box.y * scale + dy,
    ))
}

/// An SVG document.
#[derive(Debug, Clone)]
pub struct Svg {
    pub(crate) doc: Document,
}

impl FromStr for Svg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Svg::parse(s)
    }
}

impl Svg {
    pub fn new(doc: Document) -> Svg {
        Svg { doc }
    }

    pub fn parse(text: &str) -> Result<Svg, Error> {
        Ok(Svg {
            doc: Document::parse(text)?,
        })
    }

    pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Svg, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
        Svg::parse(&text)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn to_xml(&self, pretty: bool) -> Result<String, Error> {
        self.doc.to_xml(pretty)
    }

    /// The viewBox, or failing that `0 0 width height`.
    pub fn view_box(&self) -> Result<Option<Rect>, Error> {
        let root = self.doc.root();
        if let Some(raw) = self.doc.attr(root, "viewBox") {
            return parse_view_box(raw).map(Some);
        }
        let (Some(width), Some(height)) = (self.doc.attr(root, "width"), self.doc.attr(root, "height"))
        else {
            return Ok(None);
        };
        let length = |raw: &str| -> Result<f64, Error> {
            let trimmed = raw.trim();
            let value: f64 = trimmed
                .strip_suffix("px")
                .unwrap_or(trimmed)
                .parse()
                .map_err(|_| Error::ParseViewBox(format!("width=\"{width}\" height=\"{height}\"")))?;
            if value <= 0.0 {
                return Err(Error::ParseViewBox(format!(
                    "width=\"{width}\" height=\"{height}\""
                )));
            }
            Ok(value)
        };
        Ok(Some(Rect::new(0.0, 0.0, length(width)?, length(height)?)))
    }

    /// How far lossy operations may stray, in user units.
    pub fn tolerance(&self) -> Result<f64, Error> {
        Ok(match self.view_box()? {
            Some(vbox) => vbox.w.min(vbox.h) * MAX_PCT_ERROR / 100.0,
            None => DEFAULT_TOLERANCE,
        })
    }

    pub(crate) fn shape_nodes(&self) -> Vec<NodeId> {
        self.doc
            .elements()
            .into_iter()
            .filter(|n| self.doc.svg_tag(*n).is_some_and(is_shape_tag))
            .collect()
    }

    pub(crate) fn shape_at(&self, node: NodeId) -> Result<Shape, Error> {
        match self.doc.element(node) {
            Some(el) => Shape::from_element(el),
            None => Err(Error::Unsupported(format!("{node:?} is not an element"))),
        }
    }

    /// Every shape, in document order.
    pub fn shapes(&self) -> Result<Vec<Shape>, Error> {
        self.shape_nodes()
            .into_iter()
            .map(|n| self.shape_at(n))
            .collect()
    }

    /// The box around every shape, None if nothing draws.
    pub fn bounding_box(&self) -> Result<Option<Rect>, Error> {
        let mut bbox: Option<Rect> = None;
        for shape in self.shapes()? {
            if let Some(shape_box) = shape.bounding_box()? {
                bbox = Some(match bbox {
                    Some(bbox) => bbox.union(&shape_box),
                    None => shape_box,
                });
            }
        }
        Ok(bbox)
    }

    /// Replace the element at `node` with `shape`
    pub(crate) fn set_shape(&mut self, node: NodeId, shape: &Shape) {
        if let Some(el) = self.doc.element_mut(node) {
            *el = shape.to_element();
        }
    }

    fn update_shapes(&mut self, mut update: impl FnMut(Shape) -> Result<Shape, Error>) -> Result<(), Error> {
        for node in self.shape_nodes() {
            let shape = update(self.shape_at(node)?)?;
            self.set_shape(node, &shape);
        }
        Ok(())
    }

    /// Every path absolute; other shapes are unchanged.
    pub fn absolute(&mut self) -> Result<(), Error> {
        debug!("Make paths absolute");
        self.update_shapes(|shape| Ok(shape.absolute()))
    }

    /// Every basic shape becomes the equivalent path.
    pub fn shapes_to_paths(&mut self) -> Result<(), Error> {
        debug!("Convert shapes to paths");
        self.update_shapes(|shape| shape.to_path_shape())
    }

    /// No more H, V, S or T in paths.
    pub fn expand_shorthand(&mut self) -> Result<(), Error> {
        debug!("Expand shorthand");
        self.update_shapes(|shape| {
            Ok(match &shape.geometry {
                Geometry::Path(path) => shape.with_path(path.explicit_lines().expand_shorthand()),
                _ => shape,
            })
        })
    }

    pub fn round_floats(&mut self, ndigits: u32) -> Result<(), Error> {
        debug!("Round to {ndigits} digits");
        self.update_shapes(|shape| Ok(shape.round_floats(ndigits)))
    }

    /// Merge fill-opacity or stroke-opacity into opacity when possible.
    pub fn normalize_opacity(&mut self) -> Result<(), Error> {
        debug!("Normalize opacity");
        self.update_shapes(|mut shape| {
            shape.normalize_opacity();
            Ok(shape)
        })
    }

    /// Rewrite evenodd shapes to paths that fill the same area with nonzero.
    pub fn evenodd_to_nonzero_winding(&mut self) -> Result<(), Error> {
        debug!("Convert evenodd to nonzero");
        let tolerance = self.tolerance()?;
        self.update_shapes(|shape| {
            if shape.presentation.fill_rule == svgpathops::FillRule::EvenOdd {
                shape.remove_overlaps(tolerance)
            } else {
                Ok(shape)
            }
        })
    }

    /// Remove shapes that can't draw anything.
    pub fn remove_unpainted_shapes(&mut self) -> Result<(), Error> {
        debug!("Remove unpainted shapes");
        let tolerance = self.tolerance()?;
        for node in self.shape_nodes() {
            if !self.shape_at(node)?.might_paint(tolerance)? {
                trace!("Remove unpainted {:?}", self.doc.attr(node, "d"));
                self.doc.detach(node);
            }
        }
        Ok(())
    }

    /// Move every style declaration onto the equivalent attribute.
    pub fn apply_style_attributes(&mut self) -> Result<(), Error> {
        debug!("Apply style attributes");
        for node in self.doc.elements() {
            if self.doc.svg_tag(node).is_none() {
                continue;
            }
            let Some(style) = self.doc.remove_attr(node, "style") else {
                continue;
            };
            let declarations = css::parse_declarations(&style, |_| true)?;
            for (name, value) in declarations.parsed {
                self.doc.set_attr(node, &name, value);
            }
            if !declarations.unparsed.is_empty() {
                self.doc.set_attr(node, "style", declarations.unparsed);
            }
        }
        Ok(())
    }

    pub fn breadth_first(&self) -> Result<Vec<TraverseContext>, Error> {
        traverse(&self.doc, Order::BreadthFirst, self.tolerance()?)
    }

    pub fn depth_first(&self) -> Result<Vec<TraverseContext>, Error> {
        traverse(&self.doc, Order::DepthFirst, self.tolerance()?)
    }

    /// Remove elements and attributes outside the SVG and xlink namespaces.
    pub fn remove_nonsvg_content(&mut self) -> Result<(), Error> {
        debug!("Remove non-svg content");
        for node in self.doc.elements() {
            let Some(el) = self.doc.element_mut(node) else {
                continue;
            };
            if !el.is_svg() {
                trace!("Remove non-svg element {}", el.tag);
                self.doc.detach(node);
                continue;
            }
            el.attributes
                .retain(|name, _| !name.starts_with('{') && !name.starts_with("xml:"));
        }
        Ok(())
    }

    fn remove_nodes(&mut self, remove: impl Fn(&NodeData) -> bool) {
        let doomed: Vec<_> = self
            .doc
            .descendants(self.doc.root())
            .into_iter()
            .filter(|n| remove(self.doc.data(*n)))
            .collect();
        for node in doomed {
            self.doc.detach(node);
        }
    }

    pub fn remove_comments(&mut self) -> Result<(), Error> {
        debug!("Remove comments");
        self.remove_nodes(|data| matches!(data, NodeData::Comment(..)));
        Ok(())
    }

    pub fn remove_processing_instructions(&mut self) -> Result<(), Error> {
        debug!("Remove processing instructions");
        self.remove_nodes(|data| matches!(data, NodeData::ProcessingInstruction { .. }));
        Ok(())
    }

    /// A symbol without an id can't be used.
    pub fn remove_anonymous_symbols(&mut self) -> Result<(), Error> {
        debug!("Remove anonymous symbols");
        self.remove_nodes(|data| match data {
            NodeData::Element(el) => el.svg_tag() == Some("symbol") && el.attr("id").is_none(),
            _ => false,
        });
        Ok(())
    }

    pub fn remove_title_meta_desc(&mut self) -> Result<(), Error> {
        debug!("Remove title, desc and metadata");
        self.remove_nodes(|data| match data {
            NodeData::Element(el) => matches!(
                el.svg_tag(),
                Some("title" | "desc" | "metadata" | "comment")
            ),
            _ => false,
        });
        Ok(())
    }

    /// Set attributes on the root element.
    pub fn set_attributes<'a>(&mut self, name_values: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let root = self.doc.root();
        for (name, value) in name_values {
            self.doc.set_attr(root, name, value);
        }
    }

    /// Drop attributes, such as viewBox, width or height, from the root element.
    pub fn remove_attributes<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let root = self.doc.root();
        for name in names {
            self.doc.remove_attr(root, name);
        }
    }

    /// An id starting with `prefix` that nothing uses yet.
    pub(crate) fn new_id(&self, prefix: &str) -> Result<String, Error> {
        let used: std::collections::HashSet<&str> = self
            .doc
            .elements()
            .into_iter()
            .filter_map(|n| self.doc.attr(n, "id"))
            .collect();
        (0..1 << 16)
            .map(|i| format!("{prefix}{i}"))
            .find(|id| !used.contains(id.as_str()))
            .ok_or_else(|| Error::Unsupported(format!("No free id for {prefix}")))
    }

    /// Nested svg elements, not descending into them
    fn nested_svgs(&self, node: NodeId) -> Vec<NodeId> {
        let mut nested = Vec::new();
        let mut frontier: std::collections::VecDeque<_> =
            self.doc.element_children(node).collect();
        while let Some(next) = frontier.pop_front() {
            if self.doc.svg_tag(next) == Some("svg") {
                nested.push(next);
            } else {
                frontier.extend(self.doc.element_children(next));
            }
        }
        nested
    }

    /// Replace nested svg elements with equivalent groups.
    ///
    /// See <https://www.w3.org/TR/SVG/coords.html>
    pub fn resolve_nested_svgs(&mut self) -> Result<(), Error> {
        debug!("Resolve nested svgs");
        let nested = self.nested_svgs(self.doc.root());
        if nested.is_empty() {
            return Ok(());
        }
        let Some(vbox) = self.view_box()? else {
            return Err(Error::Unsupported(
                "Can't determine root SVG width/height, which is required for resolving nested SVGs"
                    .to_string(),
            ));
        };
        for svg in nested {
            let replacements = self.unnest_svg(svg, vbox.w, vbox.h)?;
            self.doc.replace_with(svg, &replacements);
        }
        Ok(())
    }

    fn unnest_svg(
        &mut self,
        svg: NodeId,
        parent_width: f64,
        parent_height: f64,
    ) -> Result<Vec<NodeId>, Error> {
        let x = number_attr(&self.doc, svg, "x", 0.0)?;
        let y = number_attr(&self.doc, svg, "y", 0.0)?;
        let width = number_attr(&self.doc, svg, "width", parent_width)?;
        let height = number_attr(&self.doc, svg, "height", parent_height)?;

        let viewport = Rect::new(x, y, width, height);
        let view_box = match self.doc.attr(svg, "viewBox") {
            Some(raw) => parse_view_box(raw)?,
            None => viewport,
        };

        for nested in self.nested_svgs(svg) {
            let replacements = self.unnest_svg(nested, view_box.w, view_box.h)?;
            self.doc.replace_with(nested, &replacements);
        }

        let g = self.doc.create_element("g");
        for child in self.doc.children(svg).to_vec() {
            self.doc.append_child(g, child);
        }

        let mut transform = if viewport != view_box {
            view_box_transform(
                view_box,
                viewport,
                self.doc.attr(svg, "preserveAspectRatio").unwrap_or("xMidYMid"),
            )?
        } else {
            Affine2D::IDENTITY.translate(x, y)
        };
        if let Some(raw) = self.doc.attr(svg, "transform") {
            transform = Affine2D::compose_ltr(&[transform, raw.parse()?]);
        }
        if transform != Affine2D::IDENTITY {
            self.doc.set_attr(g, "transform", transform.to_string());
        }

        // nested svgs default to overflow="hidden", clipping to their viewport
        match self.doc.attr(svg, "overflow").unwrap_or("hidden") {
            "visible" => return Ok(vec![g]),
            "hidden" => (),
            other => {
                return Err(Error::Unsupported(format!(
                    "overflow='{other}' is not supported"
                )))
            }
        }

        let clip_id = self.new_id("nested-svg-viewport-")?;
        let clip_path = self
            .doc
            .create_element_with("clipPath", [("id", clip_id.clone())]);
        let rect = Shape::new(Geometry::rect(x, y, width, height, 0.0, 0.0)).to_element();
        let rect = self.doc.add_element(rect);
        self.doc.append_child(clip_path, rect);

        let clipped = self
            .doc
            .create_element_with("g", [("clip-path", format!("url(#{clip_id})"))]);
        self.doc.append_child(clipped, g);
        Ok(vec![clip_path, clipped])
    }

    /// Instantiate `use` elements.
    ///
    /// See <https://www.w3.org/TR/SVG11/struct.html#UseElement>
    pub fn resolve_use(&mut self) -> Result<(), Error> {
        debug!("Resolve use");
        const NOT_COPIED: [&str; 7] = ["x", "y", "width", "height", "transform", XLINK_HREF, "href"];

        // by id up front, so targets stay stable as we rewrite
        let by_id: HashMap<String, NodeId> = self
            .doc
            .elements()
            .into_iter()
            .filter_map(|n| self.doc.attr(n, "id").map(|id| (id.to_string(), n)))
            .collect();

        // every round instantiates one more level of nesting
        for _ in 0..=by_id.len() {
            let uses: Vec<_> = self
                .doc
                .elements()
                .into_iter()
                .filter(|n| self.doc.svg_tag(*n) == Some("use"))
                .collect();
            if uses.is_empty() {
                return Ok(());
            }
            for use_el in uses {
                let reference = self
                    .doc
                    .attr(use_el, XLINK_HREF)
                    .or_else(|| self.doc.attr(use_el, "href"))
                    .unwrap_or_default()
                    .to_string();
                let Some(id) = reference.strip_prefix('#') else {
                    return Err(Error::Unsupported(format!(
                        "Only use #fragment supported, reject {reference}"
                    )));
                };
                let target = *by_id
                    .get(id)
                    .ok_or_else(|| Error::MissingReference(id.to_string()))?;

                let new_el = self.doc.deep_copy(target);
                // ids on instantiated content would be duplicates
                for node in self.doc.descendants(new_el) {
                    self.doc.remove_attr(node, "id");
                }

                let mut affine = Affine2D::IDENTITY.translate(
                    number_attr(&self.doc, use_el, "x", 0.0)?,
                    number_attr(&self.doc, use_el, "y", 0.0)?,
                );
                if let Some(raw) = self.doc.attr(use_el, "transform") {
                    affine = Affine2D::compose_ltr(&[affine, raw.parse()?]);
                }

                let mut group_attributes = indexmap::IndexMap::new();
                if affine != Affine2D::IDENTITY {
                    group_attributes.insert("transform".to_string(), affine.to_string());
                }
                if let Some(attributes) = self.doc.attributes(use_el) {
                    group_attributes.extend(
                        attributes
                            .iter()
                            .filter(|(name, _)| !NOT_COPIED.contains(&name.as_str()))
                            .map(|(k, v)| (k.clone(), v.clone())),
                    );
                }

                // a group around a single element always goes away
                let tag = self.doc.svg_tag(new_el).unwrap_or_default().to_string();
                if let Some(el) = self.doc.element_mut(new_el) {
                    inherit_attributes(&group_attributes, &tag, &mut el.attributes)?;
                }
                trace!("Replace use of #{id}");
                self.doc.replace_with(use_el, &[new_el]);
            }
        }
        Err(Error::CyclicReference(
            "use elements keep instantiating more use elements".to_string(),
        ))
    }

    /// Violations of the restricted subset, empty if there are none.
    pub fn checkpicosvg(&self, allow_text: bool) -> Result<Vec<Violation>, Error> {
        Ok(self.validate(allow_text)?.violations)
    }

    fn validate(&self, allow_text: bool) -> Result<CheckResult, Error> {
        let mut result = check(&self.doc, allow_text, self.tolerance()?)?;
        if self.view_box()?.is_none() {
            result.violations.push(Violation::MissingViewBox);
        }
        Ok(result)
    }

    /// Run every pass, leaving only paths, opacity groups and gradients.
    pub fn topicosvg(&mut self, options: &Options) -> Result<(), Error> {
        // Discard useless content
        self.remove_nonsvg_content()?;
        self.remove_processing_instructions()?;
        self.remove_comments()?;
        self.remove_anonymous_symbols()?;
        self.remove_title_meta_desc()?;

        // Simplify things that simplify in isolation
        self.apply_style_attributes()?;
        self.resolve_nested_svgs()?;
        self.shapes_to_paths()?;
        self.expand_shorthand()?;
        self.resolve_use()?;

        // Simplify things that do not simplify in isolation
        self.simplify()?;

        // Tidy up
        self.evenodd_to_nonzero_winding()?;
        self.remove_unpainted_shapes()?;
        self.normalize_opacity()?;
        if options.clip_to_viewbox {
            self.clip_to_viewbox()?;
        }
        self.absolute()?;
        self.round_floats(options.ndigits)?;

        let result = self.validate(options.allow_text)?;
        let mut violations = result.violations;
        if options.drop_unsupported {
            for node in result.bad_elements {
                warn!(
                    "Dropping unsupported <{}>",
                    self.doc.element(node).map(|el| el.tag.as_str()).unwrap_or_default()
                );
                self.doc.detach(node);
            }
            violations.retain(|v| !matches!(v, Violation::BadElement(..)));
        }
        if options.allow_text && self.doc.elements().iter().any(|n| self.doc.svg_tag(*n) == Some("text")) {
            warn!("Passing text through untouched");
        }
        if !violations.is_empty() {
            return Err(Error::Violations(violations));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn svg(body: &str) -> Svg {
        Svg::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 128 128">{body}</svg>"#
        ))
        .unwrap()
    }

    fn body(svg: &Svg) -> String {
        let xml = svg.to_xml(false).unwrap();
        let start = xml.find('>').unwrap() + 1;
        let end = xml.rfind("</svg>").unwrap_or(xml.len());
        xml[start..end].to_string()
    }

    #[rstest]
    #[case(r#"viewBox="7 7 12 12""#, Some(Rect::new(7.0, 7.0, 12.0, 12.0)))]
    #[case(r#"viewBox="7,7,12,12""#, Some(Rect::new(7.0, 7.0, 12.0, 12.0)))]
    #[case(r#"width="6" height="7""#, Some(Rect::new(0.0, 0.0, 6.0, 7.0)))]
    #[case(r#"width="6px" height="7px""#, Some(Rect::new(0.0, 0.0, 6.0, 7.0)))]
    #[case(r#"width="6""#, None)]
    #[case("", None)]
    fn view_box(#[case] attributes: &str, #[case] expected: Option<Rect>) {
        let svg = Svg::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" {attributes}/>"#
        ))
        .unwrap();
        assert_eq!(expected, svg.view_box().unwrap());
    }

    #[rstest]
    #[case(r#"width="-6" height="-7""#)]
    #[case(r#"width="0" height="10""#)]
    #[case(r#"width="6pt" height="7pt""#)]
    #[case(r#"viewBox="0 0 10""#)]
    fn bad_view_box(#[case] attributes: &str) {
        let svg = Svg::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" {attributes}/>"#
        ))
        .unwrap();
        assert!(matches!(svg.view_box(), Err(Error::ParseViewBox(..))));
    }

    #[rstest]
    #[case(r#"viewBox="7 7 12 12""#, 0.012)]
    #[case(r#"viewBox="0 0 128 128""#, 0.128)]
    #[case("", 0.1)]
    fn tolerance(#[case] attributes: &str, #[case] expected: f64) {
        let svg = Svg::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" {attributes}/>"#
        ))
        .unwrap();
        assert!((expected - svg.tolerance().unwrap()).abs() < 1e-9);
    }

    #[rstest]
    #[case(&["viewBox", "width", "height"], r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1"/>"#)]
    #[case(&["width", "height"], r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox="7 7 12 12"/>"#)]
    fn remove_attributes(#[case] names: &[&str], #[case] expected: &str) {
        let mut svg = Svg::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox="7 7 12 12" height="7" width="11"/>"#,
        )
        .unwrap();
        svg.remove_attributes(names.iter().copied());
        assert_eq!(expected, svg.to_xml(false).unwrap());
    }

    #[test]
    fn url_targets() {
        assert_eq!("a-1", id_of_target("url(#a-1)").unwrap());
        assert!(matches!(id_of_target("url(a)"), Err(Error::BadUrl(..))));
    }

    #[test]
    fn blank_attributes_are_defaults() {
        let svg = svg(r#"<path fill="" d=""/>"#);
        assert_eq!(
            vec![Shape::from_path(crate::path::Path::new())],
            svg.shapes().unwrap()
        );
    }

    #[test]
    fn shapes_to_paths() {
        let mut svg = svg(
            r#"<rect x="1" y="2" width="3" height="4" fill="red"/><line x1="0" y1="0" x2="5" y2="5" stroke="blue"/>"#,
        );
        svg.shapes_to_paths().unwrap();
        assert_eq!(
            r#"<path fill="red" d="M1,2 H4 V6 H1 V2 Z"/><path stroke="blue" d="M0,0 L5,5"/>"#,
            body(&svg)
        );
    }

    #[test]
    fn expand_shorthand() {
        let mut svg = svg(r#"<path d="M0,0 H5 V5 S10,10 15,15"/>"#);
        svg.expand_shorthand().unwrap();
        assert_eq!(
            r#"<path d="M0,0 L5,0 L5,5 C5,5 10,10 15,15"/>"#,
            body(&svg)
        );
    }

    #[test]
    fn apply_style_attributes() {
        let mut svg = svg(
            r#"<g style="fill:red; opacity:0.5"><path style="stroke:blue;stroke-width:2" d="M0,0"/></g>"#,
        );
        svg.apply_style_attributes().unwrap();
        assert_eq!(
            r#"<g fill="red" opacity="0.5"><path d="M0,0" stroke="blue" stroke-width="2"/></g>"#,
            body(&svg)
        );
    }

    #[test]
    fn remove_junk() {
        let mut svg = Svg::parse(
            r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?><svg xmlns="http://www.w3.org/2000/svg" xmlns:x="http://example.com/x" x:foo="1"><!-- hi --><title>T</title><x:thing/><symbol><path d="M0,0"/></symbol><symbol id="s"/><desc>D</desc></svg>"#,
        )
        .unwrap();
        svg.remove_nonsvg_content().unwrap();
        svg.remove_processing_instructions().unwrap();
        svg.remove_comments().unwrap();
        svg.remove_anonymous_symbols().unwrap();
        svg.remove_title_meta_desc().unwrap();
        assert_eq!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><symbol id="s"/></svg>"#,
            svg.to_xml(false).unwrap()
        );
    }

    #[test]
    fn resolve_use() {
        let mut svg = svg(
            r##"<defs><path id="p" d="M0,0 L1,1" fill="red"/></defs><use xlink:href="#p" x="5" y="6" opacity="0.5"/>"##,
        );
        svg.resolve_use().unwrap();
        assert_eq!(
            r#"<defs><path id="p" d="M0,0 L1,1" fill="red"/></defs><path d="M0,0 L1,1" fill="red" opacity="0.5" transform="translate(5, 6)"/>"#,
            body(&svg)
        );
    }

    #[test]
    fn resolve_use_cycle() {
        let mut svg = svg(r##"<g id="g"><use xlink:href="#g"/></g>"##);
        assert!(matches!(
            svg.resolve_use(),
            Err(Error::CyclicReference(..))
        ));
    }

    #[test]
    fn resolve_use_missing() {
        let mut svg = svg(r##"<use xlink:href="#nope"/>"##);
        assert!(matches!(
            svg.resolve_use(),
            Err(Error::MissingReference(..))
        ));
    }

    #[test]
    fn resolve_nested_svgs() {
        let mut svg = svg(
            r#"<svg x="10" y="20" width="20" height="20" viewBox="0 0 10 10"><path d="M0,0 L10,10"/></svg><svg x="1" overflow="visible"><path d="M0,0"/></svg>"#,
        );
        svg.resolve_nested_svgs().unwrap();
        assert_eq!(
            concat!(
                r#"<clipPath id="nested-svg-viewport-0"><rect x="10" y="20" width="20" height="20"/></clipPath>"#,
                r#"<g clip-path="url(#nested-svg-viewport-0)"><g transform="matrix(2 0 0 2 10 20)"><path d="M0,0 L10,10"/></g></g>"#,
                r#"<g transform="translate(1, 0)"><path d="M0,0"/></g>"#,
            ),
            body(&svg)
        );
    }

    #[test]
    fn nested_svg_bad_overflow() {
        let mut svg = svg(r#"<svg overflow="scroll"><path d="M0,0"/></svg>"#);
        assert!(matches!(
            svg.resolve_nested_svgs(),
            Err(Error::Unsupported(..))
        ));
    }

    #[rstest]
    #[case("xMidYMid", Affine2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 5.0))]
    #[case("xMinYMin", Affine2D::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0))]
    #[case("xMaxYMax slice", Affine2D::new(2.0, 0.0, 0.0, 2.0, -10.0, 0.0))]
    #[case("none", Affine2D::new(1.0, 0.0, 0.0, 2.0, 0.0, 0.0))]
    fn aspect_ratio(#[case] preserve_aspect_ratio: &str, #[case] expected: Affine2D) {
        assert_eq!(
            expected,
            view_box_transform(
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(0.0, 0.0, 10.0, 20.0),
                preserve_aspect_ratio
            )
            .unwrap()
        );
    }

    #[test]
    fn bounding_box() {
        let svg = svg(r#"<rect x="1" y="2" width="3" height="4"/><circle cx="10" cy="10" r="1"/>"#);
        let bbox = svg.bounding_box().unwrap().unwrap();
        assert!(
            (bbox.x - 1.0).abs() < 1e-6
                && (bbox.y - 2.0).abs() < 1e-6
                && (bbox.w - 10.0).abs() < 1e-6
                && (bbox.h - 9.0).abs() < 1e-6,
            "{bbox:?}"
        );
    }

    #[test]
    fn topicosvg_ndigits() {
        let mut svg = Svg::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox="0 0 128 128">"#,
            "<defs/>",
            r#"<path d="M60.4999,30 L100.06,30 L100.06,70 L60.4999,70 Z"/>"#,
            "</svg>"
        ))
        .unwrap();
        svg.topicosvg(&Options {
            ndigits: 1,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" viewBox="0 0 128 128">"#,
                "<defs/>",
                r#"<path d="M60.5,30 L100.1,30 L100.1,70 L60.5,70 Z"/>"#,
                "</svg>"
            ),
            svg.to_xml(false).unwrap()
        );
    }

    const TEXT: &str = r#"<text x="20" y="35"><tspan x="0" y="20">Hello</tspan></text>"#;

    #[test]
    fn text_is_rejected() {
        let mut svg = svg(TEXT);
        let Err(Error::Violations(violations)) = svg.topicosvg(&Options::default()) else {
            panic!("text should be rejected");
        };
        assert_eq!(
            vec![Violation::BadElement("/svg[0]/text[0]".to_string())],
            violations
        );
    }

    #[test]
    fn allow_text() {
        let mut svg = svg(TEXT);
        svg.topicosvg(&Options {
            allow_text: true,
            ..Default::default()
        })
        .unwrap();
        assert!(svg.to_xml(false).unwrap().contains("<tspan"));
    }

    #[test]
    fn drop_unsupported() {
        let mut svg = svg(&format!(r#"{TEXT}<path d="M0,0 L1,0 L1,1 Z"/>"#));
        svg.topicosvg(&Options {
            drop_unsupported: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(r#"<defs/><path d="M0,0 L1,0 L1,1 Z"/>"#, body(&svg));
    }
}
