//! Walk the tree computing what each element inherits.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use log::trace;
use svgpathops::FillRule;

use crate::{
    affine::Affine2D,
    error::Error,
    gradient::is_gradient_tag,
    inherit::attributes_to_pass_on,
    path::Path,
    shape::Shape,
    svg::{id_of_target, resolve_url},
    tree::{Document, NodeId},
};

/// What an element sees once its ancestors are taken into account.
#[derive(Debug, Clone)]
pub struct TraverseContext {
    /// Index among siblings with the same tag
    pub nth_of_type: usize,
    pub node: NodeId,
    /// e.g. `/svg[0]/g[1]/path[0]`
    pub path: String,
    /// Every transform from here to the root, composed.
    pub transform: Affine2D,
    /// Clip paths from here to the root, each already in user space.
    pub clips: Vec<Path>,
    /// Inherited attributes other than clip-path and transform.
    pub attributes: IndexMap<String, String>,
}

impl TraverseContext {
    pub fn depth(&self) -> usize {
        self.path.matches('/').count() - 1
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Order {
    /// Children before siblings, in document order
    DepthFirst,
    /// All of a level before the next
    BreadthFirst,
}

/// The transform of `node` composed with `current`.
///
/// Gradients are transformed by gradientTransform, everything else by transform.
pub fn element_transform(
    doc: &Document,
    node: NodeId,
    current: Affine2D,
) -> Result<Affine2D, Error> {
    let attr_name = match doc.svg_tag(node) {
        Some(tag) if is_gradient_tag(tag) => "gradientTransform",
        _ => "transform",
    };
    match doc.attr(node, attr_name) {
        Some(raw) if !raw.trim().is_empty() => {
            Ok(Affine2D::compose_ltr(&[raw.parse()?, current]))
        }
        _ => Ok(current),
    }
}

/// The area a `clip-path="url(#id)"` reference leaves visible, in user space.
pub fn resolve_clip_path(
    doc: &Document,
    url: &str,
    transform: Affine2D,
    tolerance: f64,
) -> Result<Path, Error> {
    resolve_clip_path_inner(doc, url, transform, tolerance, &mut Vec::new())
}

fn resolve_clip_path_inner(
    doc: &Document,
    url: &str,
    transform: Affine2D,
    tolerance: f64,
    visiting: &mut Vec<String>,
) -> Result<Path, Error> {
    let id = id_of_target(url)?;
    if visiting.iter().any(|v| v == id) {
        return Err(Error::CyclicReference(id.to_string()));
    }
    visiting.push(id.to_string());

    let clip_el = resolve_url(doc, url, Some("clipPath"))?;
    if doc.attr(clip_el, "clipPathUnits") == Some("objectBoundingBox") {
        return Err(Error::Unsupported(format!(
            "clipPath '{id}' has clipPathUnits=\"objectBoundingBox\""
        )));
    }
    let transform = element_transform(doc, clip_el, transform)?;

    let mut clip_shapes = Vec::new();
    for child in doc.element_children(clip_el) {
        let Some(el) = doc.element(child) else {
            continue;
        };
        let shape = Shape::from_element(el)?;
        let shape = shape.apply_transform(&element_transform(doc, child, transform)?)?;
        clip_shapes.push((shape.as_path()?.to_bez_path(), shape.presentation.clip_rule));
    }
    let mut clip = Path::from_bez_path(&svgpathops::union(&clip_shapes, tolerance));

    if let Some(nested) = doc.attr(clip_el, "clip-path") {
        let nested = resolve_clip_path_inner(doc, nested, transform, tolerance, visiting)?;
        clip = intersection(&[clip, nested], tolerance);
    }
    visiting.pop();
    Ok(clip)
}

/// The area every one of `paths` covers, filled nonzero.
pub fn intersection(paths: &[Path], tolerance: f64) -> Path {
    let operands: Vec<_> = paths
        .iter()
        .map(|p| (p.to_bez_path(), FillRule::NonZero))
        .collect();
    Path::from_bez_path(&svgpathops::intersection(&operands, tolerance))
}

/// Yields a [`TraverseContext`] for every element under the root, the root included.
pub struct Traverse<'a> {
    doc: &'a Document,
    order: Order,
    tolerance: f64,
    frontier: VecDeque<TraverseContext>,
    failed: bool,
}

impl<'a> Traverse<'a> {
    pub fn new(doc: &'a Document, order: Order, tolerance: f64) -> Result<Traverse<'a>, Error> {
        let root = doc.root();
        let attributes = match doc.attributes(root) {
            Some(attributes) => attributes_to_pass_on(attributes, &IndexMap::new())?,
            None => IndexMap::new(),
        };
        let root_context = TraverseContext {
            nth_of_type: 0,
            node: root,
            path: "/svg[0]".to_string(),
            transform: Affine2D::IDENTITY,
            clips: Vec::new(),
            attributes,
        };
        Ok(Traverse {
            doc,
            order,
            tolerance,
            frontier: VecDeque::from([root_context]),
            failed: false,
        })
    }

    fn children(&self, context: &TraverseContext) -> Result<Vec<TraverseContext>, Error> {
        let doc = self.doc;
        let mut nth_of_type: HashMap<&str, usize> = HashMap::new();
        let mut children = Vec::new();
        for child in doc.element_children(context.node) {
            let Some(el) = doc.element(child) else {
                continue;
            };
            let transform = element_transform(doc, child, context.transform)?;
            let mut clips = context.clips.clone();
            if let Some(clip_paths) = el.attr("clip-path") {
                for url in clip_paths.split(',').filter(|u| !u.trim().is_empty()) {
                    clips.push(resolve_clip_path(doc, url.trim(), transform, self.tolerance)?);
                }
            }
            let nth = nth_of_type.entry(el.tag.as_str()).or_default();
            let path = format!("{}/{}[{}]", context.path, el.tag, nth);
            children.push(TraverseContext {
                nth_of_type: *nth,
                node: child,
                path,
                transform,
                clips,
                attributes: attributes_to_pass_on(&el.attributes, &context.attributes)?,
            });
            *nth += 1;
        }
        Ok(children)
    }
}

impl Iterator for Traverse<'_> {
    type Item = Result<TraverseContext, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let context = match self.order {
            Order::DepthFirst => self.frontier.pop_back()?,
            Order::BreadthFirst => self.frontier.pop_front()?,
        };
        let children = match self.children(&context) {
            Ok(children) => children,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        match self.order {
            // popped from the back, reverse so children still come out in order
            Order::DepthFirst => self.frontier.extend(children.into_iter().rev()),
            Order::BreadthFirst => self.frontier.extend(children),
        }
        trace!("Visit {}", context.path);
        Some(Ok(context))
    }
}

/// Every context in `order`, or the first error.
pub fn traverse(
    doc: &Document,
    order: Order,
    tolerance: f64,
) -> Result<Vec<TraverseContext>, Error> {
    Traverse::new(doc, order, tolerance)?.collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">{body}</svg>"#
        ))
        .unwrap()
    }

    const NESTED: &str = r#"
        <g id="g1" fill="red" opacity="0.5">
            <path id="p1" d="M0,0 L1,1"/>
            <g id="g2" transform="translate(1, 2)" opacity="0.5">
                <path id="p2" d="M0,0 L1,1" fill="blue"/>
            </g>
        </g>
        <path id="p3" d="M0,0"/>
    "#;

    #[rstest]
    #[case(
        Order::DepthFirst,
        &["/svg[0]", "/svg[0]/g[0]", "/svg[0]/g[0]/path[0]", "/svg[0]/g[0]/g[0]", "/svg[0]/g[0]/g[0]/path[0]", "/svg[0]/path[0]"]
    )]
    #[case(
        Order::BreadthFirst,
        &["/svg[0]", "/svg[0]/g[0]", "/svg[0]/path[0]", "/svg[0]/g[0]/path[0]", "/svg[0]/g[0]/g[0]", "/svg[0]/g[0]/g[0]/path[0]"]
    )]
    fn traversal_order(#[case] order: Order, #[case] expected: &[&str]) {
        let doc = doc(NESTED);
        let paths: Vec<_> = traverse(&doc, order, 0.1)
            .unwrap()
            .into_iter()
            .map(|c| c.path)
            .collect();
        assert_eq!(expected, paths);
    }

    #[test]
    fn context() {
        let doc = doc(NESTED);
        let contexts = traverse(&doc, Order::DepthFirst, 0.1).unwrap();
        let p2 = contexts
            .iter()
            .find(|c| doc.attr(c.node, "id") == Some("p2"))
            .unwrap();
        assert_eq!(3, p2.depth());
        assert_eq!(Affine2D::IDENTITY.translate(1.0, 2.0), p2.transform);
        assert_eq!(Some("blue"), p2.attributes.get("fill").map(String::as_str));
        assert_eq!(Some("0.25"), p2.attributes.get("opacity").map(String::as_str));

        let p1 = contexts
            .iter()
            .find(|c| doc.attr(c.node, "id") == Some("p1"))
            .unwrap();
        assert_eq!(Some("red"), p1.attributes.get("fill").map(String::as_str));
        assert_eq!(Affine2D::IDENTITY, p1.transform);
    }

    #[test]
    fn clip_paths_accumulate() {
        let doc = doc(
            r#"
            <clipPath id="c1"><rect width="5" height="5"/></clipPath>
            <clipPath id="c2" transform="translate(1, 1)"><rect width="5" height="5"/></clipPath>
            <g clip-path="url(#c1)">
                <path clip-path="url(#c2)" d="M0,0 L10,0 L10,10 Z"/>
            </g>
            "#,
        );
        let contexts = traverse(&doc, Order::DepthFirst, 0.1).unwrap();
        let path = contexts.last().unwrap();
        assert_eq!("/svg[0]/g[0]/path[0]", path.path);
        assert_eq!(2, path.clips.len());
        let bbox = path.clips[1].bounding_box().unwrap();
        assert_eq!((1.0, 1.0, 5.0, 5.0), (bbox.x, bbox.y, bbox.w, bbox.h));
    }

    #[test]
    fn clip_path_cycle() {
        let doc = doc(
            r#"
            <clipPath id="c1" clip-path="url(#c2)"><rect width="5" height="5"/></clipPath>
            <clipPath id="c2" clip-path="url(#c1)"><rect width="5" height="5"/></clipPath>
            <path clip-path="url(#c1)" d="M0,0 L10,0 L10,10 Z"/>
            "#,
        );
        assert!(matches!(
            traverse(&doc, Order::DepthFirst, 0.1),
            Err(Error::CyclicReference(..))
        ));
    }

    #[test]
    fn missing_clip_path() {
        let doc = doc(r#"<path clip-path="url(#nope)" d="M0,0 L10,0 L10,10 Z"/>"#);
        assert!(matches!(
            traverse(&doc, Order::BreadthFirst, 0.1),
            Err(Error::MissingReference(..))
        ));
    }

    #[test]
    fn gradient_transform() {
        let doc = doc(r#"<linearGradient id="lg" gradientTransform="scale(2)" transform="scale(3)"/>"#);
        let lg = doc.element_children(doc.root()).next().unwrap();
        assert_eq!(
            Affine2D::IDENTITY.scale(2.0, 2.0),
            element_transform(&doc, lg, Affine2D::IDENTITY).unwrap()
        );
    }
}
