//! A mutable SVG document.
//!
//! Nodes live in an arena and refer to one another by [`NodeId`]. Detaching
//! a node leaves it in the arena, it just isn't reachable from the root
//! anymore. Parsing is done by roxmltree, writing by quick-xml.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::trace;
use quick_xml::{
    events::{BytesEnd, BytesPI, BytesStart, BytesText, Event},
    Writer,
};

use crate::error::Error;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub const XLINK_HREF: &str = "xlink:href";
/// Stands in for xlink:href in documents that don't declare xlink
const XLINK_TEMP: &str = "xlink_";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element: tag, namespace and attributes in document order.
///
/// Attribute names are plain for unqualified attributes, `xlink:` or `xml:`
/// prefixed for those namespaces and `{uri}local` for anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// None for SVG
    pub namespace: Option<String>,
    pub attributes: IndexMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Element {
        Element {
            tag: tag.into(),
            namespace: None,
            attributes: Default::default(),
        }
    }

    pub fn is_svg(&self) -> bool {
        self.namespace.is_none()
    }

    /// The tag, if this is an SVG element
    pub fn svg_tag(&self) -> Option<&str> {
        self.is_svg().then_some(self.tag.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: String },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// A document holding only an empty root element
    pub fn new(root_tag: &str) -> Document {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element(root_tag);
        doc
    }

    pub fn parse(text: &str) -> Result<Document, Error> {
        // svgs are fond of not declaring xlink
        let fixed_text;
        let mut text = text;
        let xlink_temp = text.contains("xlink") && !text.contains("xmlns:xlink");
        if xlink_temp {
            fixed_text = text.replace(XLINK_HREF, XLINK_TEMP);
            text = &fixed_text;
        }
        let xml = roxmltree::Document::parse_with_options(
            text,
            roxmltree::ParsingOptions {
                allow_dtd: true,
                ..Default::default()
            },
        )?;

        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.convert(xml.root_element(), xlink_temp);
        Ok(doc)
    }

    fn convert(&mut self, xml_node: roxmltree::Node, xlink_temp: bool) -> NodeId {
        let tag_name = xml_node.tag_name();
        let namespace = tag_name
            .namespace()
            .filter(|ns| *ns != SVG_NS)
            .map(str::to_string);
        let attributes = xml_node
            .attributes()
            .map(|attr| {
                let name = match attr.namespace() {
                    None | Some(SVG_NS) if xlink_temp && attr.name() == XLINK_TEMP => {
                        XLINK_HREF.to_string()
                    }
                    None | Some(SVG_NS) => attr.name().to_string(),
                    Some(XLINK_NS) => format!("xlink:{}", attr.name()),
                    Some(XML_NS) => format!("xml:{}", attr.name()),
                    Some(ns) => format!("{{{ns}}}{}", attr.name()),
                };
                (name, attr.value().to_string())
            })
            .collect();
        let id = self.push(NodeData::Element(Element {
            tag: tag_name.name().to_string(),
            namespace,
            attributes,
        }));

        for child in xml_node.children() {
            let child_id = if child.is_element() {
                self.convert(child, xlink_temp)
            } else if child.is_text() {
                match child.text() {
                    Some(text) if !text.trim().is_empty() => {
                        self.push(NodeData::Text(text.to_string()))
                    }
                    _ => continue,
                }
            } else if child.is_comment() {
                self.push(NodeData::Comment(child.text().unwrap_or_default().to_string()))
            } else if let Some(pi) = child.pi() {
                self.push(NodeData::ProcessingInstruction {
                    target: pi.target.to_string(),
                    value: pi.value.unwrap_or_default().to_string(),
                })
            } else {
                continue;
            };
            self.append_child(id, child_id);
        }
        id
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// The tag of an SVG element, None for anything else
    pub fn svg_tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(Element::svg_tag)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)
            .and_then(|el| el.attributes.shift_remove(name))
    }

    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        self.element(id).map(|el| &el.attributes)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.element(*c).is_some())
    }

    /// `id` and everything below it, in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        result
    }

    /// Every element reachable from the root, in document order
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.element(*id).is_some())
            .collect()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    pub fn create_element_with<'a>(
        &mut self,
        tag: &str,
        attributes: impl IntoIterator<Item = (&'a str, String)>,
    ) -> NodeId {
        let mut el = Element::new(tag);
        el.attributes
            .extend(attributes.into_iter().map(|(k, v)| (k.to_string(), v)));
        self.push(NodeData::Element(el))
    }

    /// A detached node holding `el`
    pub fn add_element(&mut self, el: Element) -> NodeId {
        self.push(NodeData::Element(el))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert at `index`, or at the end if `index` is past it
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Remove from the parent, if any
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Put `replacements` where `old` was and detach `old`.
    ///
    /// Does nothing to a node without a parent.
    pub fn replace_with(&mut self, old: NodeId, replacements: &[NodeId]) {
        let (Some(parent), Some(index)) = (self.parent(old), self.index_in_parent(old)) else {
            return;
        };
        self.detach(old);
        for (i, new) in replacements.iter().enumerate() {
            self.insert_child(parent, index + i, *new);
        }
    }

    /// A detached copy of `id` and everything below it
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let copy = self.push(self.nodes[id.0].data.clone());
        for child in self.children(id).to_vec() {
            let child_copy = self.deep_copy(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// The reachable element with the given id.
    pub fn find_by_id(&self, id_value: &str) -> Result<Option<NodeId>, Error> {
        let mut matches = self
            .elements()
            .into_iter()
            .filter(|id| self.attr(*id, "id") == Some(id_value));
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let others = matches.count();
        if others > 0 {
            return Err(Error::AmbiguousReference {
                id: id_value.to_string(),
                count: others + 1,
            });
        }
        Ok(Some(first))
    }

    /// Serialize the tree reachable from the root.
    pub fn to_xml(&self, pretty: bool) -> Result<String, Error> {
        let reachable = self.elements();
        let mut use_xlink = false;
        let mut foreign_attr_ns = Vec::new();
        let mut seen = HashSet::new();
        for id in reachable.iter() {
            for name in self.attributes(*id).into_iter().flat_map(|a| a.keys()) {
                if name.starts_with("xlink:") {
                    use_xlink = true;
                } else if let Some(ns) = foreign_namespace(name) {
                    if seen.insert(ns) {
                        foreign_attr_ns.push(ns);
                    }
                }
            }
        }
        let prefixes: HashMap<&str, String> = foreign_attr_ns
            .iter()
            .enumerate()
            .map(|(i, ns)| (*ns, format!("ns{i}")))
            .collect();

        let mut root_decls = vec![("xmlns".to_string(), SVG_NS.to_string())];
        if use_xlink {
            root_decls.push(("xmlns:xlink".to_string(), XLINK_NS.to_string()));
        }
        for ns in foreign_attr_ns.iter() {
            root_decls.push((format!("xmlns:{}", prefixes[ns]), ns.to_string()));
        }
        trace!("Writing {} elements", reachable.len());

        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        let mut state = WriteState {
            writer: &mut writer,
            prefixes: &prefixes,
        };
        self.write_node(&mut state, self.root, SVG_NS, Some(root_decls.as_slice()))?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::XmlWrite(e.to_string()))
    }

    fn write_node(
        &self,
        state: &mut WriteState,
        id: NodeId,
        parent_ns: &str,
        decls: Option<&[(String, String)]>,
    ) -> Result<(), Error> {
        let event = match self.data(id) {
            NodeData::Text(text) => Event::Text(BytesText::new(text)),
            NodeData::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
            NodeData::ProcessingInstruction { target, value } => {
                let content = if value.is_empty() {
                    target.clone()
                } else {
                    format!("{target} {value}")
                };
                Event::PI(BytesPI::new(content))
            }
            NodeData::Element(el) => {
                let ns = el.namespace.as_deref().unwrap_or(SVG_NS);
                let mut start = BytesStart::new(el.tag.as_str());
                for (name, value) in decls.into_iter().flatten() {
                    start.push_attribute((name.as_str(), value.as_str()));
                }
                if decls.is_none() && ns != parent_ns {
                    start.push_attribute(("xmlns", ns));
                }
                for (name, value) in el.attributes.iter() {
                    let name = match foreign_namespace(name) {
                        Some(attr_ns) => {
                            let local = &name[attr_ns.len() + 2..];
                            format!("{}:{local}", state.prefixes[attr_ns])
                        }
                        None => name.clone(),
                    };
                    start.push_attribute((name.as_str(), value.as_str()));
                }
                let children = self.children(id);
                if children.is_empty() {
                    Event::Empty(start)
                } else {
                    write_event(state.writer, Event::Start(start))?;
                    for child in children {
                        self.write_node(state, *child, ns, None)?;
                    }
                    Event::End(BytesEnd::new(el.tag.as_str()))
                }
            }
        };
        write_event(state.writer, event)
    }
}

struct WriteState<'a> {
    writer: &'a mut Writer<Vec<u8>>,
    prefixes: &'a HashMap<&'a str, String>,
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<(), Error> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlWrite(e.to_string()))
}

/// The namespace of a `{uri}local` attribute name
fn foreign_namespace(name: &str) -> Option<&str> {
    name.strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map(|(ns, _)| ns)
}
