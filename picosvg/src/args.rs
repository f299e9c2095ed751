//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::svg::Options;

/// Normalize SVG into a small, canonical subset.
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct Args {
    /// SVG files to normalize. Read from stdin if none are given.
    pub input: Vec<PathBuf>,

    /// Digits to keep after the decimal point in geometry
    #[arg(long)]
    #[clap(default_value = "3")]
    pub ndigits: u32,

    /// Whether to clip content outside the viewBox
    #[arg(long)]
    pub clip_to_viewbox: bool,

    /// Whether to let text elements through untouched
    #[arg(long)]
    pub allow_text: bool,

    /// Whether to drop unsupported elements instead of failing
    #[arg(long)]
    pub drop_unsupported: bool,

    /// Output SVG file ('-' means stdout). Only for a single input.
    #[arg(short, long)]
    #[clap(default_value = "-")]
    pub output_file: PathBuf,

    /// Directory to write to, one file per input with the input's name.
    ///
    /// Required for more than one input. Inputs are processed in parallel.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl Args {
    /// The normalization [`Options`] these arguments ask for.
    pub fn options(&self) -> Options {
        Options {
            ndigits: self.ndigits,
            allow_text: self.allow_text,
            drop_unsupported: self.drop_unsupported,
            clip_to_viewbox: self.clip_to_viewbox,
        }
    }

    /// Whether output goes to stdout
    pub fn to_stdout(&self) -> bool {
        self.output_dir.is_none() && self.output_file.as_os_str() == "-"
    }
}
