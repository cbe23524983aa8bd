//! Outline import errors.

use std::fmt;

/// Errors that can occur when importing a vector outline.
#[derive(Debug)]
pub enum OutlineError {
    /// The source file could not be read.
    Io(String),
    /// The file extension is not a supported vector format.
    UnsupportedFormat(String),
    /// The vector data could not be parsed.
    Parse(String),
    /// The file parsed but contained no drawable path data.
    Empty,
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "cannot read outline source: {msg}"),
            Self::UnsupportedFormat(ext) => write!(f, "unsupported vector format: .{ext}"),
            Self::Parse(msg) => write!(f, "malformed vector data: {msg}"),
            Self::Empty => write!(f, "no drawable path data in source"),
        }
    }
}

impl std::error::Error for OutlineError {}
