//! Pipeline errors.
//!
//! The taxonomy follows the run's failure policy: everything here is
//! fatal. Tolerated conditions (a missing hinting tool, a hinter that
//! exits non-zero) never surface as errors in the first place.

use std::fmt;
use std::path::PathBuf;

use webfont_font::FontError;
use webfont_outline::OutlineError;

/// A fatal pipeline error. No partial font is considered valid after
/// one of these; files already written stay on disk as-is.
#[derive(Debug)]
pub enum PipelineError {
    /// A source file could not be read or rewritten.
    Source {
        /// The offending file or directory.
        path: PathBuf,
        /// Human-readable cause.
        message: String,
    },
    /// A source file's outline could not be imported.
    Outline {
        /// The offending file.
        path: PathBuf,
        /// Underlying importer error.
        source: OutlineError,
    },
    /// The font model rejected an operation (duplicate codepoint,
    /// unknown ligature component) or compilation failed.
    Font(FontError),
    /// An artifact could not be written.
    Export {
        /// The artifact path.
        path: PathBuf,
        /// Human-readable cause.
        message: String,
    },
    /// The external legacy-format converter failed; there is no fallback
    /// artifact, so this is fatal.
    Converter {
        /// The tool that was invoked.
        tool: String,
        /// Human-readable cause.
        message: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { path, message } => {
                write!(f, "source file {}: {message}", path.display())
            }
            Self::Outline { path, source } => {
                write!(f, "importing {}: {source}", path.display())
            }
            Self::Font(e) => write!(f, "{e}"),
            Self::Export { path, message } => {
                write!(f, "writing {}: {message}", path.display())
            }
            Self::Converter { tool, message } => write!(f, "{tool}: {message}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Outline { source, .. } => Some(source),
            Self::Font(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FontError> for PipelineError {
    fn from(e: FontError) -> Self {
        Self::Font(e)
    }
}

/// Convenience alias for results using [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;
