//! The passes that need the whole tree: flattening groups, transforms,
//! clips and strokes into plain filled paths.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use svgpathops::FillRule;

use crate::{
    affine::Affine2D,
    error::Error,
    geometry::{ntos, Rect},
    gradient::{is_gradient_tag, template_attributes, Gradient, GRADIENT_TRANSFORM_NDIGITS},
    inherit::{
        drop_default_attributes, inherit_attributes, inherit_attributes_with,
        inheritable_attributes, InheritOptions, CUSTOM_INHERITANCE,
    },
    path::Path,
    shape::{is_shape_tag, Geometry, Shape},
    svg::{resolve_url, Svg},
    traverse::{intersection, TraverseContext},
    tree::{NodeData, NodeId, XLINK_HREF},
};

/// Handled by the group or by [`TraverseContext`] rather than by inheritance
const SIMPLIFY_SKIPS: [&str; 3] = ["clip-path", "transform", "opacity"];

fn group_opacity(svg: &Svg, group: NodeId) -> Result<f64, Error> {
    let opacity = match svg.doc.attr(group, "opacity") {
        Some(raw) => raw.trim().parse().map_err(|_| Error::number("opacity", raw))?,
        None => 1.0,
    };
    Ok(f64::clamp(opacity, 0.0, 1.0))
}

/// A shape with a stroke as the shapes that fill the same area, in draw order.
fn stroke_shape(shape: &Shape, tolerance: f64) -> Result<Vec<Shape>, Error> {
    let mut stroke = shape.with_path(shape.stroke_path(tolerance)?);
    let mut fill = shape.clone();

    // the stroker emits nonzero outlines
    stroke.presentation.fill_rule = FillRule::NonZero;
    stroke.presentation.clip_rule = FillRule::NonZero;
    stroke.presentation.opacity *= stroke.presentation.stroke_opacity;
    stroke.presentation.fill = stroke.presentation.stroke.clone();

    // fill and stroke are separate now, each carries just opacity
    fill.presentation.opacity *= fill.presentation.fill_opacity;
    fill.presentation.fill_opacity = 1.0;
    stroke.presentation.fill_opacity = 1.0;

    fill.presentation.reset_stroke();
    stroke.presentation.reset_stroke();

    if !fill.might_paint(tolerance)? {
        return Ok(vec![stroke]);
    }

    // the id can't refer to both
    fill.presentation.id.clear();
    stroke.presentation.id.clear();
    Ok(vec![fill, stroke])
}

/// `shape` limited to `clip`, filled nonzero.
fn clip_shape(shape: &Shape, clip: &Path, tolerance: f64) -> Result<Shape, Error> {
    let clipped = svgpathops::intersection(
        &[
            (shape.as_path()?.to_bez_path(), shape.presentation.fill_rule),
            (clip.to_bez_path(), FillRule::NonZero),
        ],
        tolerance,
    );
    let mut shape = shape.with_path(Path::from_bez_path(&clipped));
    shape.presentation.fill_rule = FillRule::NonZero;
    shape.presentation.clip_rule = FillRule::NonZero;
    Ok(shape)
}

impl Svg {
    /// Remove groups where possible, apply transforms, clip paths and strokes.
    ///
    /// Gradients end up in a single defs, the first child of the root.
    pub fn simplify(&mut self) -> Result<(), Error> {
        debug!("Simplify");
        let tolerance = self.tolerance()?;

        // leaves first
        let contexts = self.breadth_first()?;

        let root = self.doc.root();
        let defs = self.doc.create_element("defs");
        self.doc.insert_child(root, 0, defs);

        for context in contexts.into_iter().rev() {
            let node = context.node;
            if context.path.contains("clipPath") {
                self.doc.detach(node);
                continue;
            }
            trace!("Simplify {}", context.path);

            let Some(el) = self.doc.element_mut(node) else {
                continue;
            };
            for name in CUSTOM_INHERITANCE {
                el.attributes.shift_remove(name);
            }
            // the context holds final values, overwrite whatever is here
            for name in context.attributes.keys() {
                if !SIMPLIFY_SKIPS.contains(&name.as_str()) {
                    el.attributes.shift_remove(name);
                }
            }
            let tag = el.tag.clone();
            inherit_attributes_with(
                &context.attributes,
                &tag,
                &mut el.attributes,
                InheritOptions {
                    skips: &SIMPLIFY_SKIPS,
                    ..Default::default()
                },
            )?;

            match tag.as_str() {
                tag if is_shape_tag(tag) => self.simplify_shape(defs, &context, tolerance)?,
                tag if is_gradient_tag(tag) => {
                    self.doc.detach(node);
                    self.add_to_defs(defs, node);
                    self.apply_gradient_template(node)?;
                    self.apply_gradient_translation(node)?;
                }
                "defs" => {
                    // children were already processed, they just move
                    for child in self.doc.children(node).to_vec() {
                        self.add_to_defs(defs, child);
                    }
                    self.doc.detach(node);
                }
                "g" => {
                    self.try_remove_group(node, true)?;
                }
                "text" if context.transform != Affine2D::IDENTITY => {
                    self.doc
                        .set_attr(node, "transform", context.transform.to_string());
                }
                _ => (),
            }
        }

        // https://github.com/googlefonts/nanoemoji/issues/275
        for name in inheritable_attributes() {
            self.doc.remove_attr(root, name);
        }

        self.remove_orphaned_gradients()?;

        // only gradients may stay in defs
        for child in self.doc.children(defs).to_vec() {
            if !self.doc.svg_tag(child).is_some_and(is_gradient_tag) {
                self.doc.detach(child);
            }
        }
        Ok(())
    }

    fn simplify_shape(
        &mut self,
        defs: NodeId,
        context: &TraverseContext,
        tolerance: f64,
    ) -> Result<(), Error> {
        let node = context.node;
        if !self.doc.children(node).is_empty() {
            return Err(Error::Unsupported(format!(
                "{} has children, shapes can't",
                context.path
            )));
        }

        // a transformed shape needs its own copy of the gradient it uses
        let fill = self.doc.attr(node, "fill").unwrap_or_default();
        if context.transform != Affine2D::IDENTITY && fill.contains("url") {
            let fill = fill.to_string();
            let fill_el = resolve_url(&self.doc, &fill, None)?;
            self.apply_gradient_template(fill_el)?;
            let bbox = self.shape_at(node)?.bounding_box()?;
            let id = self.transformed_gradient(defs, fill_el, context.transform, bbox)?;
            self.doc.set_attr(node, "fill", format!("url(#{id})"));
        }

        let shape = self.shape_at(node)?;
        let initial = shape.with_path(shape.as_path()?.absolute());

        let mut shapes = if initial.presentation.stroke != "none" {
            stroke_shape(&initial, tolerance)?
        } else {
            vec![initial.clone()]
        };

        // stroke attributes without a stroke do nothing
        for shape in shapes.iter_mut() {
            shape.presentation.reset_stroke();
        }

        if context.transform != Affine2D::IDENTITY {
            shapes = shapes
                .iter()
                .map(|s| s.apply_transform(&context.transform))
                .collect::<Result<_, _>>()?;
        }

        if !context.clips.is_empty() {
            let clip = intersection(&context.clips, tolerance);
            shapes = shapes
                .iter()
                .map(|s| clip_shape(s, &clip, tolerance))
                .collect::<Result<_, _>>()?;
        }

        if shapes.len() != 1 || shapes[0] != initial {
            let replacements: Vec<_> = shapes
                .iter()
                .map(|s| self.doc.add_element(s.to_element()))
                .collect();
            self.doc.replace_with(node, &replacements);
        }
        Ok(())
    }

    /// Insert into `defs` ordered by id; elements without an id are of no use there.
    fn add_to_defs(&mut self, defs: NodeId, node: NodeId) {
        let Some(id) = self.doc.attr(node, "id").map(str::to_string) else {
            return;
        };
        let siblings = self.doc.children(defs);
        let index = siblings
            .iter()
            .position(|s| self.doc.attr(*s, "id").is_some_and(|other| id.as_str() < other))
            .unwrap_or(siblings.len());
        self.doc.insert_child(defs, index, node);
    }

    /// Fold the gradient an href points to into `gradient`.
    ///
    /// See <https://www.w3.org/TR/SVG/pservers.html#PaintServerTemplates>
    pub(crate) fn apply_gradient_template(&mut self, gradient: NodeId) -> Result<(), Error> {
        self.apply_gradient_template_inner(gradient, &mut Vec::new())
    }

    fn apply_gradient_template_inner(
        &mut self,
        gradient: NodeId,
        visiting: &mut Vec<NodeId>,
    ) -> Result<(), Error> {
        let Some(reference) = self
            .doc
            .attr(gradient, XLINK_HREF)
            .or_else(|| self.doc.attr(gradient, "href"))
            .map(str::to_string)
        else {
            return Ok(());
        };
        let Some(id) = reference.strip_prefix('#').map(str::trim) else {
            return Err(Error::Unsupported(format!(
                "Only use #fragment supported, reject {reference}"
            )));
        };
        if visiting.contains(&gradient) {
            return Err(Error::CyclicReference(id.to_string()));
        }
        visiting.push(gradient);

        let template = self
            .doc
            .find_by_id(id)?
            .ok_or_else(|| Error::MissingReference(id.to_string()))?;
        let template_tag = self.doc.svg_tag(template).unwrap_or_default();
        if !is_gradient_tag(template_tag) {
            return Err(Error::UnexpectedTarget {
                id: id.to_string(),
                tag: template_tag.to_string(),
                expected: "linearGradient or radialGradient",
            });
        }
        self.apply_gradient_template_inner(template, visiting)?;

        let tag = self.doc.svg_tag(gradient).unwrap_or_default().to_string();
        for name in template_attributes(&tag) {
            if self.doc.has_attr(gradient, name) {
                continue;
            }
            if let Some(value) = self.doc.attr(template, name).map(str::to_string) {
                self.doc.set_attr(gradient, name, value);
            }
        }

        // stops only come from the template if we have none of our own
        if self.doc.children(gradient).is_empty() {
            let stops: Vec<_> = self.doc.element_children(template).collect();
            for stop in stops {
                let stop = self.doc.deep_copy(stop);
                self.doc.remove_attr(stop, "id");
                self.doc.append_child(gradient, stop);
            }
        }

        self.doc.remove_attr(gradient, XLINK_HREF);
        self.doc.remove_attr(gradient, "href");
        Ok(())
    }

    /// Move the translation part of gradientTransform into the coordinates.
    fn apply_gradient_translation(&mut self, node: NodeId) -> Result<(), Error> {
        let view_box = self.view_box()?;
        let Some(el) = self.doc.element_mut(node) else {
            return Ok(());
        };
        let mut gradient = Gradient::from_element(el, view_box)?;
        gradient.apply_translation();
        el.attributes = gradient.to_element().attributes;
        Ok(())
    }

    /// A copy of `fill_el` in user space, under `transform`, added to `defs`.
    ///
    /// Returns the id of the copy.
    fn transformed_gradient(
        &mut self,
        defs: NodeId,
        fill_el: NodeId,
        transform: Affine2D,
        shape_bbox: Option<Rect>,
    ) -> Result<String, Error> {
        let view_box = self.view_box()?;
        let Some(el) = self.doc.element(fill_el).filter(|el| is_gradient_tag(&el.tag)) else {
            return Err(Error::UnexpectedTarget {
                id: self.doc.attr(fill_el, "id").unwrap_or_default().to_string(),
                tag: self.doc.svg_tag(fill_el).unwrap_or_default().to_string(),
                expected: "linearGradient or radialGradient",
            });
        };
        let mut gradient =
            Gradient::from_element(el, view_box)?.as_user_space_units(shape_bbox.unwrap_or_default());
        gradient.transform = Affine2D::compose_ltr(&[gradient.transform, transform])
            .round(GRADIENT_TRANSFORM_NDIGITS);
        gradient.id = self.new_id(&format!("{}_", gradient.id))?;
        gradient.apply_translation();

        let new_fill = self.doc.add_element(gradient.to_element());
        // TODO: normalize the copied stops too
        let stops: Vec<_> = self.doc.element_children(fill_el).collect();
        for stop in stops {
            let stop = self.doc.deep_copy(stop);
            self.doc.append_child(new_fill, stop);
        }
        self.add_to_defs(defs, new_fill);
        trace!("Transformed gradient {}", gradient.id);
        Ok(gradient.id)
    }

    /// Keep only the gradients some shape fills with.
    pub fn remove_orphaned_gradients(&mut self) -> Result<(), Error> {
        let mut used = HashSet::new();
        for shape in self.shapes()? {
            let fill = &shape.presentation.fill;
            if !fill.starts_with("url(") {
                continue;
            }
            let target = match resolve_url(&self.doc, fill, None) {
                Ok(target) => target,
                Err(Error::MissingReference(id)) => {
                    warn!("Nothing has id '{id}', fill=\"{fill}\" won't paint");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if self.doc.svg_tag(target).is_some_and(is_gradient_tag) {
                used.extend(self.doc.attr(target, "id").map(str::to_string));
            }
        }
        for node in self.doc.elements() {
            if self.doc.svg_tag(node).is_some_and(is_gradient_tag)
                && !self.doc.attr(node, "id").is_some_and(|id| used.contains(id))
            {
                trace!("Remove orphaned gradient {:?}", self.doc.attr(node, "id"));
                self.doc.detach(node);
            }
        }
        Ok(())
    }

    /// Lift the children of `group` into its parent if that looks the same.
    ///
    /// A group with 0 < opacity < 1 and more than one child must stay, though
    /// it's reduced to just the opacity. This over-retains groups; no
    /// difference unless children overlap. Returns whether the group went.
    pub(crate) fn try_remove_group(&mut self, group: NodeId, push_opacity: bool) -> Result<bool, Error> {
        let opacity = group_opacity(self, group)?;
        let no_attributes = self.doc.attributes(group).map_or(true, |a| a.is_empty());
        let num_children = self
            .doc
            .children(group)
            .iter()
            .filter(|c| !matches!(self.doc.data(**c), NodeData::Comment(..)))
            .count();
        let remove = no_attributes || num_children <= 1 || opacity == 0.0 || opacity == 1.0;

        if remove {
            let children = self.doc.children(group).to_vec();
            self.doc.replace_with(group, &children);
            if push_opacity {
                let pushed = IndexMap::from([("opacity".to_string(), ntos(opacity))]);
                for child in children {
                    let Some(el) = self.doc.element_mut(child) else {
                        continue;
                    };
                    let tag = el.tag.clone();
                    inherit_attributes(&pushed, &tag, &mut el.attributes)?;
                }
            }
        } else if let Some(el) = self.doc.element_mut(group) {
            el.attributes.clear();
            el.attributes.insert("opacity".to_string(), ntos(opacity));
            drop_default_attributes(&mut el.attributes);
        }
        Ok(remove)
    }

    /// Drop shapes entirely outside the view box, clip those partly outside.
    pub fn clip_to_viewbox(&mut self) -> Result<(), Error> {
        debug!("Clip to viewBox");
        let Some(view_box) = self.view_box()? else {
            warn!("No viewBox, nothing to clip to");
            return Ok(());
        };

        for node in self.shape_nodes() {
            let shape = self.shape_at(node)?;
            let bbox = shape.bounding_box()?;
            let Some(isct) = bbox.and_then(|b| view_box.intersection(&b)) else {
                trace!("Drop {:?}, it's outside the viewBox", shape.geometry);
                self.doc.detach(node);
                continue;
            };
            if bbox == Some(isct) {
                continue;
            }
            let clip = Geometry::rect(isct.x, isct.y, isct.w, isct.h, 0.0, 0.0)
                .as_path()?
                .absolute();
            let path = shape.as_path()?.absolute();
            let shape = shape.with_path(intersection(&[path, clip], self.tolerance()?));
            self.set_shape(node, &shape);
        }

        // we may now have useless groups
        for context in self.depth_first()?.into_iter().rev() {
            if self.doc.svg_tag(context.node) == Some("g") {
                self.try_remove_group(context.node, true)?;
            }
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

    fn assert_bbox(expected: Rect, actual: Option<Rect>) {
        let actual = actual.expect("should have a bounding box");
        let close = |a: f64, b: f64| (a - b).abs() < 1e-3;
        assert!(
            close(expected.x, actual.x)
                && close(expected.y, actual.y)
                && close(expected.w, actual.w)
                && close(expected.h, actual.h),
            "expected {expected:?}, got {actual:?}"
        );
    }

    const TRIANGLE: &str = "M0,0 L1,0 L1,1 Z";

    #[rstest]
    #[case::transform(
        r#"<g transform="translate(10,0)"><path d="M0,0 L1,0 L1,1 Z"/></g>"#,
        r#"<defs/><path d="M10,0 L11,0 L11,1 Z"/>"#
    )]
    #[case::nested_transforms(
        r#"<g transform="translate(10,0)"><g transform="scale(2)"><path d="M0,0 L1,0 L1,1 Z"/></g></g>"#,
        r#"<defs/><path d="M10,0 L12,0 L12,2 Z"/>"#
    )]
    #[case::inherit_fill(
        r#"<g fill="red"><path d="M0,0 L1,0 L1,1 Z"/></g>"#,
        r#"<defs/><path d="M0,0 L1,0 L1,1 Z" fill="red"/>"#
    )]
    #[case::child_fill_wins(
        r#"<g fill="red"><path fill="blue" d="M0,0 L1,0 L1,1 Z"/></g>"#,
        r#"<defs/><path d="M0,0 L1,0 L1,1 Z" fill="blue"/>"#
    )]
    #[case::push_opacity(
        r#"<g opacity="0.5"><path d="M0,0 L1,0 L1,1 Z"/></g>"#,
        r#"<defs/><path d="M0,0 L1,0 L1,1 Z" opacity="0.5"/>"#
    )]
    #[case::keep_opacity_group(
        r#"<g opacity="0.5" fill="red"><path d="M0,0 L1,0 L1,1 Z"/><path d="M2,0 L3,0 L3,1 Z"/></g>"#,
        r#"<defs/><g opacity="0.5"><path d="M0,0 L1,0 L1,1 Z" fill="red"/><path d="M2,0 L3,0 L3,1 Z" fill="red"/></g>"#
    )]
    #[case::drop_non_gradient_defs(
        r#"<defs><path id="unused" d="M0,0 L1,1"/></defs><path d="M0,0 L1,0 L1,1 Z"/>"#,
        r#"<defs/><path d="M0,0 L1,0 L1,1 Z"/>"#
    )]
    #[case::root_attributes(
        r#"<path d="M0,0 L1,0 L1,1 Z"/>"#,
        r#"<defs/><path d="M0,0 L1,0 L1,1 Z"/>"#
    )]
    fn simplify(#[case] input: &str, #[case] expected: &str) {
        let mut svg = svg(input);
        svg.simplify().unwrap();
        assert_eq!(expected, body(&svg));
    }

    #[test]
    fn inheritable_attributes_leave_root() {
        let mut svg = Svg::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10" fill="red"><path d="{TRIANGLE}"/></svg>"#
        ))
        .unwrap();
        svg.simplify().unwrap();
        assert_eq!(
            format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><defs/><path d="{TRIANGLE}" fill="red"/></svg>"#
            ),
            svg.to_xml(false).unwrap()
        );
    }

    #[test]
    fn transformed_gradient() {
        let mut svg = svg(concat!(
            r#"<defs><linearGradient id="lg" x1="0" y1="0" x2="1" y2="0" gradientUnits="userSpaceOnUse"/></defs>"#,
            r#"<g transform="translate(5,5)"><path fill="url(#lg)" d="M0,0 L1,0 L1,1 Z"/></g>"#,
        ));
        svg.simplify().unwrap();
        assert_eq!(
            concat!(
                r#"<defs><linearGradient id="lg_0" x1="5" y1="5" x2="6" y2="5" gradientUnits="userSpaceOnUse"/></defs>"#,
                r#"<path fill="url(#lg_0)" d="M5,5 L6,5 L6,6 Z"/>"#,
            ),
            body(&svg)
        );
    }

    #[test]
    fn gradients_sorted_into_defs() {
        let mut svg = svg(concat!(
            r#"<linearGradient id="b" x2="1"/><linearGradient id="a" x2="1"/>"#,
            r#"<path fill="url(#a)" d="M0,0 L1,0 L1,1 Z"/><path fill="url(#b)" d="M0,0 L1,0 L1,1 Z"/>"#,
        ));
        svg.simplify().unwrap();
        let defs = svg.doc.element_children(svg.doc.root()).next().unwrap();
        let ids: Vec<_> = svg
            .doc
            .element_children(defs)
            .filter_map(|n| svg.doc.attr(n, "id"))
            .collect();
        assert_eq!(vec!["a", "b"], ids);
    }

    #[test]
    fn stroke_becomes_fill() {
        let mut svg = svg(r#"<path d="M0,0 L10,0" stroke="blue" stroke-width="2"/>"#);
        svg.simplify().unwrap();
        let shapes = svg.shapes().unwrap();
        assert_eq!(1, shapes.len(), "{shapes:?}");
        let p = &shapes[0].presentation;
        assert_eq!(("blue", "none"), (p.fill.as_str(), p.stroke.as_str()));
        assert_bbox(Rect::new(0.0, -1.0, 10.0, 2.0), shapes[0].bounding_box().unwrap());
    }

    #[test]
    fn stroke_and_fill() {
        let mut svg = svg(
            r#"<path id="p" d="M0,0 L10,0 L10,10 Z" fill="red" fill-opacity="0.5" stroke="blue"/>"#,
        );
        svg.simplify().unwrap();
        let shapes = svg.shapes().unwrap();
        let paints: Vec<_> = shapes
            .iter()
            .map(|s| {
                let p = &s.presentation;
                (p.id.as_str(), p.fill.as_str(), p.opacity, p.fill_opacity)
            })
            .collect();
        assert_eq!(vec![("", "red", 0.5, 1.0), ("", "blue", 1.0, 1.0)], paints);
    }

    #[test]
    fn clip_path() {
        let mut svg = svg(concat!(
            r#"<clipPath id="c"><rect x="0" y="0" width="5" height="5"/></clipPath>"#,
            r#"<path clip-path="url(#c)" d="M0,0 L10,0 L10,10 L0,10 Z"/>"#,
        ));
        svg.simplify().unwrap();
        assert!(!svg.to_xml(false).unwrap().contains("clipPath"));
        let shapes = svg.shapes().unwrap();
        assert_eq!(1, shapes.len());
        assert_bbox(Rect::new(0.0, 0.0, 5.0, 5.0), shapes[0].bounding_box().unwrap());
    }

    #[test]
    fn gradient_template() {
        let mut svg = svg(concat!(
            r#"<linearGradient id="a" x1="1" x2="2"><stop offset="0" id="s"/></linearGradient>"#,
            r##"<linearGradient id="b" xlink:href="#a" y1="3"/>"##,
        ));
        let b = svg.doc.find_by_id("b").unwrap().unwrap();
        svg.apply_gradient_template(b).unwrap();
        let attributes = |node| -> Vec<(String, String)> {
            svg.doc
                .attributes(node)
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        let expected = |pairs: &[(&str, &str)]| -> Vec<(String, String)> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        assert_eq!(
            expected(&[("id", "b"), ("y1", "3"), ("x1", "1"), ("x2", "2")]),
            attributes(b)
        );
        let stops: Vec<_> = svg.doc.element_children(b).map(attributes).collect();
        assert_eq!(vec![expected(&[("offset", "0")])], stops);
    }

    #[test]
    fn gradient_template_keeps_own_stops() {
        let mut svg = svg(concat!(
            r#"<linearGradient id="a"><stop offset="0"/></linearGradient>"#,
            r##"<linearGradient id="b" href="#a"><stop offset="1"/></linearGradient>"##,
        ));
        let b = svg.doc.find_by_id("b").unwrap().unwrap();
        svg.apply_gradient_template(b).unwrap();
        let offsets: Vec<_> = svg
            .doc
            .element_children(b)
            .filter_map(|n| svg.doc.attr(n, "offset"))
            .collect();
        assert_eq!(vec!["1"], offsets);
        assert!(!svg.doc.has_attr(b, "href"));
    }

    #[rstest]
    #[case::self_reference(r##"<linearGradient id="a" xlink:href="#a"/>"##)]
    #[case::loop_of_two(
        r##"<linearGradient id="a" xlink:href="#b"/><linearGradient id="b" xlink:href="#a"/>"##
    )]
    fn gradient_template_cycle(#[case] gradients: &str) {
        let mut svg = svg(gradients);
        let a = svg.doc.find_by_id("a").unwrap().unwrap();
        assert!(matches!(
            svg.apply_gradient_template(a),
            Err(Error::CyclicReference(..))
        ));
    }

    #[test]
    fn gradient_template_must_be_gradient() {
        let mut svg = svg(r##"<path id="p" d="M0,0"/><linearGradient id="a" xlink:href="#p"/>"##);
        let a = svg.doc.find_by_id("a").unwrap().unwrap();
        assert!(matches!(
            svg.apply_gradient_template(a),
            Err(Error::UnexpectedTarget { .. })
        ));
    }

    #[rstest]
    #[case::no_attributes("<g><path/><path/></g>", true, "<path/><path/>")]
    #[case::one_child(r#"<g fill="red"><path/></g>"#, true, "<path/>")]
    #[case::opaque(r#"<g opacity="1"><path/><path/></g>"#, true, "<path/><path/>")]
    #[case::transparent(
        r#"<g opacity="0"><path/><path/></g>"#,
        true,
        r#"<path opacity="0"/><path opacity="0"/>"#
    )]
    #[case::clamped(r#"<g opacity="2"><path/><path/></g>"#, true, "<path/><path/>")]
    #[case::must_stay(
        r#"<g opacity="0.5" fill="red"><path/><path/></g>"#,
        false,
        r#"<g opacity="0.5"><path/><path/></g>"#
    )]
    fn try_remove_group(#[case] input: &str, #[case] removed: bool, #[case] expected: &str) {
        let mut svg = svg(input);
        let group = svg.doc.element_children(svg.doc.root()).next().unwrap();
        assert_eq!(removed, svg.try_remove_group(group, true).unwrap());
        assert_eq!(expected, body(&svg));
    }

    #[test]
    fn clip_to_viewbox() {
        let mut svg = svg(concat!(
            r#"<path d="M-10,-10 L-5,-10 L-5,-5 Z"/>"#,
            r#"<g opacity="0.5"><path d="M120,0 L130,0 L130,10 L120,10 Z"/>"#,
            r#"<path d="M-20,0 L-10,0 L-10,10 Z"/></g>"#,
            r#"<path d="M1,1 L2,1 L2,2 Z"/>"#,
        ));
        svg.clip_to_viewbox().unwrap();
        let shapes = svg.shapes().unwrap();
        assert_eq!(2, shapes.len(), "{shapes:?}");
        assert_bbox(Rect::new(120.0, 0.0, 8.0, 10.0), shapes[0].bounding_box().unwrap());
        assert_eq!(Some("0.5"), svg.doc.attr(svg.shape_nodes()[0], "opacity"));
        assert_eq!(
            Shape::from_path("M1,1 L2,1 L2,2 Z".parse().unwrap()),
            shapes[1]
        );
    }

    #[test]
    fn topicosvg_clip_to_viewbox() {
        let mut svg = svg(r#"<rect x="100" y="100" width="100" height="100"/>"#);
        svg.topicosvg(&crate::svg::Options {
            clip_to_viewbox: true,
            ..Default::default()
        })
        .unwrap();
        assert_bbox(
            Rect::new(100.0, 100.0, 28.0, 28.0),
            svg.bounding_box().unwrap(),
        );
    }
}
