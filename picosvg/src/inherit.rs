//! How attributes flow from an element onto its children.

use indexmap::IndexMap;
use log::trace;

use crate::{
    affine::Affine2D,
    error::Error,
    geometry::ntos,
    gradient::gradient_attributes,
    shape::{default_value, geometry_attributes, is_shape_attribute},
};

/// Attributes whose inheritance the tree walker computes itself.
pub const CUSTOM_INHERITANCE: [&str; 2] = ["clip-path", "transform"];

/// How a parent value combines with a child value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// The child keeps its own value, if it has one.
    CopyIfAbsent,
    /// Parent and child values multiply.
    Multiply,
    /// The child transform applies first, then the parent's.
    MatrixCompose,
    /// Both sets of clips apply.
    ClipPathUnion,
    /// Like [`Strategy::CopyIfAbsent`], only when the parent isn't `visible`.
    NonDefaultOverflow,
    Never,
}

/// Every attribute with a known inheritance strategy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InheritedAttribute {
    ClipPath,
    ClipRule,
    Color,
    DataName,
    Display,
    EnableBackground,
    Fill,
    FillOpacity,
    FillRule,
    Id,
    Opacity,
    Overflow,
    Stroke,
    StrokeDasharray,
    StrokeDashoffset,
    StrokeLinecap,
    StrokeLinejoin,
    StrokeMiterlimit,
    StrokeOpacity,
    StrokeWidth,
    Style,
    Transform,
}

impl InheritedAttribute {
    pub const ALL: [InheritedAttribute; 22] = [
        InheritedAttribute::ClipPath,
        InheritedAttribute::ClipRule,
        InheritedAttribute::Color,
        InheritedAttribute::DataName,
        InheritedAttribute::Display,
        InheritedAttribute::EnableBackground,
        InheritedAttribute::Fill,
        InheritedAttribute::FillOpacity,
        InheritedAttribute::FillRule,
        InheritedAttribute::Id,
        InheritedAttribute::Opacity,
        InheritedAttribute::Overflow,
        InheritedAttribute::Stroke,
        InheritedAttribute::StrokeDasharray,
        InheritedAttribute::StrokeDashoffset,
        InheritedAttribute::StrokeLinecap,
        InheritedAttribute::StrokeLinejoin,
        InheritedAttribute::StrokeMiterlimit,
        InheritedAttribute::StrokeOpacity,
        InheritedAttribute::StrokeWidth,
        InheritedAttribute::Style,
        InheritedAttribute::Transform,
    ];

    pub fn from_name(name: &str) -> Option<InheritedAttribute> {
        InheritedAttribute::ALL
            .into_iter()
            .find(|attr| attr.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            InheritedAttribute::ClipPath => "clip-path",
            InheritedAttribute::ClipRule => "clip-rule",
            InheritedAttribute::Color => "color",
            InheritedAttribute::DataName => "data-name",
            InheritedAttribute::Display => "display",
            InheritedAttribute::EnableBackground => "enable-background",
            InheritedAttribute::Fill => "fill",
            InheritedAttribute::FillOpacity => "fill-opacity",
            InheritedAttribute::FillRule => "fill-rule",
            InheritedAttribute::Id => "id",
            InheritedAttribute::Opacity => "opacity",
            InheritedAttribute::Overflow => "overflow",
            InheritedAttribute::Stroke => "stroke",
            InheritedAttribute::StrokeDasharray => "stroke-dasharray",
            InheritedAttribute::StrokeDashoffset => "stroke-dashoffset",
            InheritedAttribute::StrokeLinecap => "stroke-linecap",
            InheritedAttribute::StrokeLinejoin => "stroke-linejoin",
            InheritedAttribute::StrokeMiterlimit => "stroke-miterlimit",
            InheritedAttribute::StrokeOpacity => "stroke-opacity",
            InheritedAttribute::StrokeWidth => "stroke-width",
            InheritedAttribute::Style => "style",
            InheritedAttribute::Transform => "transform",
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            InheritedAttribute::ClipRule
            | InheritedAttribute::Color
            | InheritedAttribute::Display
            | InheritedAttribute::Fill
            | InheritedAttribute::FillOpacity
            | InheritedAttribute::FillRule
            | InheritedAttribute::Stroke
            | InheritedAttribute::StrokeDasharray
            | InheritedAttribute::StrokeDashoffset
            | InheritedAttribute::StrokeLinecap
            | InheritedAttribute::StrokeLinejoin
            | InheritedAttribute::StrokeMiterlimit
            | InheritedAttribute::StrokeOpacity
            | InheritedAttribute::StrokeWidth
            | InheritedAttribute::Style => Strategy::CopyIfAbsent,
            InheritedAttribute::Opacity => Strategy::Multiply,
            InheritedAttribute::Transform => Strategy::MatrixCompose,
            InheritedAttribute::ClipPath => Strategy::ClipPathUnion,
            InheritedAttribute::Overflow => Strategy::NonDefaultOverflow,
            InheritedAttribute::Id
            | InheritedAttribute::DataName
            | InheritedAttribute::EnableBackground => Strategy::Never,
        }
    }

    /// Something that inherits at all
    pub fn is_inheritable(self) -> bool {
        self.strategy() != Strategy::Never
    }
}

/// Names of every attribute that actually passes to children.
pub fn inheritable_attributes() -> impl Iterator<Item = &'static str> {
    InheritedAttribute::ALL
        .into_iter()
        .filter(|attr| attr.is_inheritable())
        .map(InheritedAttribute::name)
}

/// Whether an element with `tag` takes `name`; true for tags we know nothing about.
pub fn is_supported(tag: &str, name: &str) -> bool {
    if geometry_attributes(tag).is_some() {
        return is_shape_attribute(tag, name);
    }
    if let Some(names) = gradient_attributes(tag) {
        return names.contains(&name);
    }
    true
}

fn number(name: &str, value: Option<&String>) -> Result<f64, Error> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::number(name, value)),
        None => Ok(1.0),
    }
}

/// Remove attributes whose value is the default for that attribute.
pub fn drop_default_attributes(attributes: &mut IndexMap<String, String>) {
    attributes.retain(|name, value| {
        let Some(default) = default_value(name) else {
            return true;
        };
        match (default.parse::<f64>(), value.trim().parse::<f64>()) {
            (Ok(default), Ok(value)) => default != value,
            _ => default != *value,
        }
    });
}

/// Options for [`inherit_attributes_with`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InheritOptions<'a> {
    /// Names that don't pass on at all.
    pub skips: &'a [&'a str],
    /// Leave attributes with no inheritance strategy behind instead of failing.
    pub skip_unhandled: bool,
    /// Keep the incoming attributes that are at their default value.
    pub keep_defaults: bool,
}

/// Combine `parent` attributes into those of a `child_tag` element.
///
/// Fails if `parent` has something we don't know how to inherit.
pub fn inherit_attributes(
    parent: &IndexMap<String, String>,
    child_tag: &str,
    child: &mut IndexMap<String, String>,
) -> Result<(), Error> {
    inherit_attributes_with(parent, child_tag, child, InheritOptions::default())
}

pub fn inherit_attributes_with(
    parent: &IndexMap<String, String>,
    child_tag: &str,
    child: &mut IndexMap<String, String>,
    options: InheritOptions,
) -> Result<(), Error> {
    let mut parent = parent.clone();
    if !options.keep_defaults {
        drop_default_attributes(&mut parent);
    }
    parent.sort_keys();

    let mut unhandled = Vec::new();
    for (name, _) in parent.iter() {
        if options.skips.contains(&name.as_str()) || !is_supported(child_tag, name) {
            continue;
        }
        let Some(attr) = InheritedAttribute::from_name(name) else {
            unhandled.push(name.as_str());
            continue;
        };
        inherit_one(attr, &parent, child)?;
    }

    if !unhandled.is_empty() && !options.skip_unhandled {
        return Err(Error::Unsupported(format!(
            "Unable to process attributes {unhandled:?}"
        )));
    }
    Ok(())
}

fn inherit_one(
    attr: InheritedAttribute,
    parent: &IndexMap<String, String>,
    child: &mut IndexMap<String, String>,
) -> Result<(), Error> {
    let name = attr.name();
    let copy_if_absent = |child: &mut IndexMap<String, String>| {
        if let (false, Some(value)) = (child.contains_key(name), parent.get(name)) {
            child.insert(name.to_string(), value.clone());
        }
    };
    match attr.strategy() {
        Strategy::CopyIfAbsent => copy_if_absent(child),
        Strategy::Multiply => {
            let value = number(name, parent.get(name))? * number(name, child.get(name))?;
            child.insert(name.to_string(), ntos(value));
        }
        Strategy::MatrixCompose => {
            let mut transform = match parent.get(name) {
                Some(raw) => raw.parse()?,
                None => Affine2D::IDENTITY,
            };
            if let Some(raw) = child.get(name) {
                transform = Affine2D::compose_ltr(&[raw.parse()?, transform]);
            }
            if transform != Affine2D::IDENTITY {
                child.insert(name.to_string(), transform.to_string());
            } else {
                child.shift_remove(name);
            }
        }
        Strategy::ClipPathUnion => {
            let mut clips: Vec<&str> = child
                .get(name)
                .map(|v| v.split(',').collect())
                .unwrap_or_default();
            clips.extend(parent.get(name).map(String::as_str));
            clips.retain(|c| !c.is_empty());
            clips.sort();
            let value = clips.join(",");
            child.insert(name.to_string(), value);
        }
        Strategy::NonDefaultOverflow => {
            if parent.get(name).is_some_and(|v| v != "visible") {
                copy_if_absent(child);
            }
        }
        Strategy::Never => (),
    }
    Ok(())
}

/// The attributes an element passes on to its children.
///
/// The element's own values win over what it inherited from `inherited`;
/// clip-path and transform are left to the caller.
pub fn attributes_to_pass_on(
    attributes: &IndexMap<String, String>,
    inherited: &IndexMap<String, String>,
) -> Result<IndexMap<String, String>, Error> {
    let mut passed = IndexMap::new();
    inherit_attributes_with(
        attributes,
        "",
        &mut passed,
        InheritOptions {
            skips: &CUSTOM_INHERITANCE,
            skip_unhandled: true,
            keep_defaults: true,
        },
    )?;
    inherit_attributes_with(
        inherited,
        "",
        &mut passed,
        InheritOptions {
            skips: &CUSTOM_INHERITANCE,
            ..Default::default()
        },
    )?;
    trace!("Passing on {passed:?}");
    Ok(passed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case(&[("fill", "red")], &[], &[("fill", "red")])]
    #[case(&[("fill", "red")], &[("fill", "blue")], &[("fill", "blue")])]
    #[case(&[("opacity", "0.5")], &[("opacity", "0.5")], &[("opacity", "0.25")])]
    #[case(&[("opacity", "0.5")], &[], &[("opacity", "0.5")])]
    #[case(
        &[("transform", "translate(1, 0)")],
        &[("transform", "scale(2)")],
        &[("transform", "matrix(2 0 0 2 1 0)")]
    )]
    #[case(
        &[("transform", "translate(1, 0)")],
        &[("transform", "translate(-1, 0)")],
        &[]
    )]
    #[case(
        &[("clip-path", "url(#b)")],
        &[("clip-path", "url(#a)")],
        &[("clip-path", "url(#a),url(#b)")]
    )]
    #[case(&[("overflow", "visible")], &[], &[])]
    #[case(&[("overflow", "hidden")], &[], &[("overflow", "hidden")])]
    #[case(&[("id", "parent"), ("data-name", "x")], &[], &[])]
    // defaults don't pass on
    #[case(&[("fill", "black"), ("stroke-width", "1.0")], &[], &[])]
    fn inherit(
        #[case] parent: &[(&str, &str)],
        #[case] child: &[(&str, &str)],
        #[case] expected: &[(&str, &str)],
    ) {
        let mut child = attrs(child);
        inherit_attributes(&attrs(parent), "g", &mut child).unwrap();
        child.sort_keys();
        assert_eq!(attrs(expected), child);
    }

    #[test]
    fn unsupported_attributes_dropped_by_tag() {
        let mut child = IndexMap::new();
        inherit_attributes(
            &attrs(&[("fill", "red"), ("overflow", "hidden")]),
            "stop",
            &mut child,
        )
        .unwrap();
        assert!(child.is_empty(), "{child:?}");
    }

    #[test]
    fn unhandled_attribute() {
        let mut child = IndexMap::new();
        assert!(matches!(
            inherit_attributes(&attrs(&[("class", "fancy")]), "g", &mut child),
            Err(Error::Unsupported(..))
        ));
    }

    #[test]
    fn pass_on_prefers_own_values() {
        let passed = attributes_to_pass_on(
            &attrs(&[
                ("fill", "black"),
                ("opacity", "0.5"),
                ("transform", "scale(2)"),
                ("d", "M0,0"),
            ]),
            &attrs(&[("fill", "red"), ("opacity", "0.5"), ("stroke", "blue")]),
        )
        .unwrap();
        assert_eq!(
            attrs(&[
                ("fill", "black"),
                ("opacity", "0.25"),
                ("stroke", "blue"),
            ]),
            passed
        );
    }

    #[test]
    fn drop_defaults() {
        let mut attributes = attrs(&[
            ("fill", "black"),
            ("opacity", "1.0"),
            ("stroke-miterlimit", "4"),
            ("stroke", "red"),
            ("d", "M1,1"),
        ]);
        drop_default_attributes(&mut attributes);
        assert_eq!(attrs(&[("stroke", "red"), ("d", "M1,1")]), attributes);
    }

    #[test]
    fn strategies_cover_every_attribute() {
        for attr in InheritedAttribute::ALL {
            assert_eq!(Some(attr), InheritedAttribute::from_name(attr.name()));
        }
        assert!(!inheritable_attributes().any(|name| name == "id"));
    }
}
