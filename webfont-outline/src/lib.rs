//! Vector outline import for `webfont`.
//!
//! Converts SVG and EPS glyph sources into [`kurbo::BezPath`] outlines
//! scaled into the target font's em box. The two formats differ in their
//! coordinate conventions, and both are normalized here:
//! - SVG is Y-down with the origin at the top-left of the viewport. The
//!   viewport (from `viewBox`, or `width`/`height`) is scaled uniformly so
//!   its height spans the em, then flipped so the top maps to the ascent
//!   and the bottom to `-descent`.
//! - EPS is already Y-up; the `%%BoundingBox` comment plays the role of
//!   the viewport and maps to the same ascent/descent band.
//!
//! Consumers see only `kurbo` types; the `svg` crate is an implementation
//! detail of the SVG reader.

use std::fs;
use std::path::Path;

use kurbo::BezPath;

pub mod eps;
pub mod error;
pub mod svg;

pub use error::OutlineError;

/// The vertical band a glyph outline is scaled into, in font units.
///
/// `ascent + descent` is normally the em height, but the importer does not
/// require it; the viewport height always maps to `em`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmBox {
    /// Units per em.
    pub em: f64,
    /// Height above the baseline.
    pub ascent: f64,
    /// Depth below the baseline (positive).
    pub descent: f64,
}

impl EmBox {
    /// Create an em box from font metrics.
    #[must_use]
    pub const fn new(em: f64, ascent: f64, descent: f64) -> Self {
        Self {
            em,
            ascent,
            descent,
        }
    }
}

/// Import a glyph outline from a vector source file.
///
/// The format is chosen by file extension (`svg` or `eps`,
/// case-insensitive). Returns the outline scaled into `embox`.
pub fn import(path: &Path, embox: EmBox) -> Result<BezPath, OutlineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "svg" => {
            let content = fs::read_to_string(path).map_err(|e| OutlineError::Io(e.to_string()))?;
            svg::import_str(&content, embox)
        }
        "eps" => {
            let data = fs::read(path).map_err(|e| OutlineError::Io(e.to_string()))?;
            eps::import_bytes(&data, embox)
        }
        other => Err(OutlineError::UnsupportedFormat(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = import(Path::new("glyph.png"), EmBox::new(512.0, 448.0, 64.0))
            .expect_err("png must be rejected");
        assert!(
            matches!(err, OutlineError::UnsupportedFormat(ref e) if e == "png"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = import(
            Path::new("/nonexistent/glyph.svg"),
            EmBox::new(512.0, 448.0, 64.0),
        )
        .expect_err("missing file must fail");
        assert!(matches!(err, OutlineError::Io(_)), "unexpected error: {err}");
    }
}
