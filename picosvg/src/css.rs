//! The `style` attribute.
//!
//! See <https://www.w3.org/TR/2013/REC-css-style-attr-20131107/#syntax>

use crate::error::Error;

/// Declarations from a `style` attribute.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Declarations {
    /// (property, value) in the order written
    pub parsed: Vec<(String, String)>,
    /// Declarations `accept` rejected, re-joined as a style string
    pub unparsed: String,
}

/// Parse a CSS declaration list, as found in an SVG element's style attribute.
///
/// Only properties for which `accept` returns true are parsed, the rest are
/// kept as text.
pub fn parse_declarations(style: &str, accept: impl Fn(&str) -> bool) -> Result<Declarations, Error> {
    let mut declarations = Declarations::default();
    let mut unparsed = Vec::new();
    for declaration in style.split(';') {
        let mut parts = declaration.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => {
                let name = name.trim();
                if accept(name) {
                    declarations
                        .parsed
                        .push((name.to_string(), value.trim().to_string()));
                } else {
                    unparsed.push(declaration.trim());
                }
            }
            _ if declaration.trim().is_empty() => (),
            _ => return Err(Error::InvalidCss(declaration.to_string())),
        }
    }
    if !unparsed.is_empty() {
        declarations.unparsed = unparsed.join("; ") + ";";
    }
    Ok(declarations)
}
