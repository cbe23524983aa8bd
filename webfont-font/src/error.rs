//! Font model and compilation errors.

use std::fmt;

/// Errors that can occur while building or compiling a font.
#[derive(Debug)]
pub enum FontError {
    /// A glyph was inserted at a codepoint that is already occupied.
    DuplicateCodepoint(u32),
    /// A ligature rule references a glyph name that does not exist.
    UnknownLigatureComponent {
        /// The ligature glyph the rule maps to.
        ligature: String,
        /// The missing component name.
        component: String,
    },
    /// Binary table construction failed.
    Compile(String),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCodepoint(cp) => {
                write!(f, "codepoint U+{cp:04X} is already assigned")
            }
            Self::UnknownLigatureComponent { ligature, component } => write!(
                f,
                "ligature `{ligature}` references unknown component glyph `{component}`"
            ),
            Self::Compile(msg) => write!(f, "font compilation failed: {msg}"),
        }
    }
}

impl std::error::Error for FontError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_codepoint_as_unicode() {
        let s = format!("{}", FontError::DuplicateCodepoint(0xE001));
        assert!(s.contains("U+E001"), "missing codepoint: {s}");
    }
}
