use std::{io, path::PathBuf};

use thiserror::Error;

use crate::check::Violation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse {token} from \"{context}\"")]
    ParsePath { token: String, context: String },
    #[error("{command} has sets of {expected} args, {found} invalid")]
    PathArity {
        command: char,
        expected: usize,
        found: usize,
    },
    #[error("Unable to parse transform '{0}'")]
    ParseTransform(String),
    #[error("Unable to parse '{value}' as a number for {attribute}")]
    ParseNumber { attribute: String, value: String },
    #[error("Unable to parse viewBox: '{0}'")]
    ParseViewBox(String),
    #[error("Invalid CSS declaration syntax: '{0}'")]
    InvalidCss(String),
    #[error("Unrecognized url \"{0}\"")]
    BadUrl(String),
    #[error("No element has id '{0}'")]
    MissingReference(String),
    #[error("Expected one element with id '{id}', found {count}")]
    AmbiguousReference { id: String, count: usize },
    #[error("Element with id '{id}' is a <{tag}>, expected {expected}")]
    UnexpectedTarget {
        id: String,
        tag: String,
        expected: &'static str,
    },
    #[error("Cyclic reference through id '{0}'")]
    CyclicReference(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Unable to convert to picosvg: {}", .0.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))]
    Violations(Vec<Violation>),
    #[error(transparent)]
    Xml(#[from] roxmltree::Error),
    #[error("Unable to write xml: '{0}'")]
    XmlWrite(String),
    #[error("Bad arguments: {0}")]
    InvalidArgs(String),
    #[error("io failed for '{path}': '{source}'")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    PathOps(#[from] svgpathops::Error),
}

impl Error {
    pub(crate) fn number(attribute: &str, value: &str) -> Error {
        Error::ParseNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}
