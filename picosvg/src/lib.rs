//! Normalize SVG into a small, canonical subset: absolute paths, gradients
//! and opacity-only groups.

pub mod affine;
pub mod arc;
#[cfg(feature = "cli")]
mod args;
pub mod check;
pub mod css;
mod error;
pub mod geometry;
pub mod gradient;
pub mod inherit;
pub mod path;
pub mod path_data;
pub mod reuse;
pub mod shape;
mod simplify;
pub mod svg;
pub mod traverse;
pub mod tree;

#[cfg(feature = "cli")]
pub use args::Args;
pub use check::Violation;
pub use error::Error;
pub use svg::{Options, Svg};

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use rayon::prelude::*;

/// Normalize the text of one svg document, returning the pretty printed result.
pub fn normalize_str(text: &str, options: &Options) -> Result<String, Error> {
    let mut svg = Svg::parse(text)?;
    svg.topicosvg(options)?;
    let mut output = svg.to_xml(true)?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

/// Normalize `input`, writing the result to `output`.
pub fn normalize_file(input: &Path, output: &Path, options: &Options) -> Result<(), Error> {
    debug!("Normalize {input:?} to {output:?}");
    let text = fs::read_to_string(input).map_err(|source| Error::FileIo {
        path: input.to_path_buf(),
        source,
    })?;
    let normalized = normalize_str(&text, options)?;
    fs::write(output, normalized).map_err(|source| Error::FileIo {
        path: output.to_path_buf(),
        source,
    })
}

/// Normalize each input into `output_dir`, in parallel.
///
/// Each output has the file name of its input. One failure doesn't stop the
/// others; the failures are returned alongside the input that failed.
pub fn normalize_files(
    inputs: &[PathBuf],
    output_dir: &Path,
    options: &Options,
) -> Result<Vec<(PathBuf, Error)>, Error> {
    if !output_dir.is_dir() {
        fs::create_dir_all(output_dir).map_err(|source| Error::FileIo {
            path: output_dir.to_path_buf(),
            source,
        })?;
    }
    Ok(inputs
        .par_iter()
        .filter_map(|input| {
            let result = match input.file_name() {
                Some(name) => normalize_file(input, &output_dir.join(name), options),
                None => Err(Error::InvalidArgs(format!("{input:?} is not a file"))),
            };
            result.err().map(|e| (input.clone(), e))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    const INPUT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
        <!-- a comment -->
        <g transform="translate(1,1)"><rect width="2" height="2"/></g>
    </svg>"#;

    const EXPECTED: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <defs/>
  <path d="M1,1 L3,1 L3,3 L1,3 L1,1 Z"/>
</svg>
"#;

    #[test]
    fn normalize_text() {
        assert_eq!(EXPECTED, normalize_str(INPUT, &Options::default()).unwrap());
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_str(INPUT, &Options::default()).unwrap();
        let twice = normalize_str(&once, &Options::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_one_file() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("in.svg");
        let output = temp_dir.path().join("out.svg");
        fs::write(&input, INPUT).unwrap();

        normalize_file(&input, &output, &Options::default()).unwrap();

        assert_eq!(EXPECTED, fs::read_to_string(output).unwrap());
    }

    #[test]
    fn missing_input_names_the_file() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("nope.svg");
        let result = normalize_file(&input, &temp_dir.path().join("out.svg"), &Options::default());
        assert!(
            matches!(&result, Err(Error::FileIo { path, .. }) if *path == input),
            "{result:?}"
        );
    }

    #[test]
    fn normalize_many_files() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("out");
        let good: Vec<_> = (0..4)
            .map(|i| {
                let input = temp_dir.path().join(format!("good_{i}.svg"));
                fs::write(&input, INPUT).unwrap();
                input
            })
            .collect();
        let bad = temp_dir.path().join("bad.svg");
        fs::write(&bad, "<svg").unwrap();

        let mut inputs = good.clone();
        inputs.push(bad.clone());
        let failures = normalize_files(&inputs, &output_dir, &Options::default()).unwrap();

        assert_eq!(
            vec![bad],
            failures.into_iter().map(|(p, _)| p).collect::<Vec<_>>()
        );
        for input in good {
            let output = output_dir.join(input.file_name().unwrap());
            assert_eq!(EXPECTED, fs::read_to_string(output).unwrap());
        }
    }
}
