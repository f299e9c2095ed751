//! Is a document in the restricted subset we produce?

use std::{collections::HashMap, fmt::Display, sync::OnceLock};

use regex::Regex;

use crate::{
    error::Error,
    traverse::{Order, Traverse},
    tree::{Document, NodeId},
};

/// Something that disqualifies a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// An element that has no place in the output
    BadElement(String),
    ReusedId {
        path: String,
        id: String,
        first_seen: String,
    },
    MissingElement(String),
    /// Neither a viewBox nor a width and height on the root
    MissingViewBox,
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::BadElement(path) => write!(f, "BadElement: {path}"),
            Violation::ReusedId {
                path,
                id,
                first_seen,
            } => write!(
                f,
                "BadElement: {path} reuses id=\"{id}\", first seen at {first_seen}"
            ),
            Violation::MissingElement(path) => write!(f, "MissingElement: {path}"),
            Violation::MissingViewBox => write!(f, "MissingViewBox: /svg[0] has no viewBox"),
        }
    }
}

const REQUIRED_PATHS: [&str; 2] = ["/svg[0]", "/svg[0]/defs[0]"];

fn allowed_paths() -> &'static [Regex] {
    static ALLOWED: OnceLock<Vec<Regex>> = OnceLock::new();
    ALLOWED.get_or_init(|| {
        [
            r"^/svg\[0\]$",
            r"^/svg\[0\]/defs\[0\]$",
            r"^/svg\[0\]/defs\[0\]/(linear|radial)Gradient\[\d+\](/stop\[\d+\])?$",
            r"^/svg\[0\](/(path|g)\[\d+\])+$",
        ]
        .into_iter()
        .map(|re| Regex::new(re).unwrap())
        .collect()
    })
}

fn text_path() -> &'static Regex {
    static TEXT: OnceLock<Regex> = OnceLock::new();
    TEXT.get_or_init(|| {
        Regex::new(r"^/svg\[0\](/(path|g)\[\d+\])*/text\[\d+\](/(tspan|textPath)\[\d+\])*$")
            .unwrap()
    })
}

/// The outcome of checking a document.
#[derive(Debug, Default)]
pub struct CheckResult {
    pub violations: Vec<Violation>,
    /// The elements behind each [`Violation::BadElement`], outermost only
    pub bad_elements: Vec<NodeId>,
}

/// Check every element's position and id.
///
/// Below a bad element nothing is reported; once the parent is gone
/// so are the children.
pub fn check(doc: &Document, allow_text: bool, tolerance: f64) -> Result<CheckResult, Error> {
    let mut result = CheckResult::default();
    let mut bad_paths: Vec<String> = Vec::new();
    let mut ids: HashMap<String, String> = HashMap::new();
    let mut required: Vec<&str> = REQUIRED_PATHS.to_vec();

    for context in Traverse::new(doc, Order::BreadthFirst, tolerance)? {
        let context = context?;
        if bad_paths.iter().any(|bad| {
            context
                .path
                .strip_prefix(bad.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
        }) {
            continue;
        }
        let allowed = allowed_paths().iter().any(|re| re.is_match(&context.path))
            || (allow_text && text_path().is_match(&context.path));
        if !allowed {
            result
                .violations
                .push(Violation::BadElement(context.path.clone()));
            result.bad_elements.push(context.node);
            bad_paths.push(context.path);
            continue;
        }
        required.retain(|path| *path != context.path);

        if let Some(id) = doc.attr(context.node, "id") {
            match ids.get(id) {
                Some(first_seen) => result.violations.push(Violation::ReusedId {
                    path: context.path.clone(),
                    id: id.to_string(),
                    first_seen: first_seen.clone(),
                }),
                None => {
                    ids.insert(id.to_string(), context.path.clone());
                }
            }
        }
    }

    result.violations.extend(
        required
            .into_iter()
            .map(|path| Violation::MissingElement(path.to_string())),
    );
    Ok(result)
}
