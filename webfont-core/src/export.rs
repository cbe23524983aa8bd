//! Artifact export.
//!
//! Drives the output side of a run: compile the TTF once, hint it if the
//! hinter is available, then derive every requested format from the
//! (possibly hinted) TTF bytes. The TTF is always produced as the working
//! master and deleted at the end when it was not itself requested.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use webfont_font::{svgfont, ttf, woff, Font};

use crate::error::{PipelineError, PipelineResult};
use crate::tools;

/// Default name of the external TTF-to-EOT converter.
pub const DEFAULT_EOT_CONVERTER: &str = "ttf2eot";

// ---------------------------------------------------------------------------
// Output formats
// ---------------------------------------------------------------------------

/// One requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputFormat {
    /// TrueType.
    Ttf,
    /// SVG font.
    Svg,
    /// WOFF (version 1).
    Woff,
    /// Embedded OpenType, via the external converter.
    Eot,
}

impl OutputFormat {
    /// The file extension for this format, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Ttf => "ttf",
            Self::Svg => "svg",
            Self::Woff => "woff",
            Self::Eot => "eot",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ttf" => Ok(Self::Ttf),
            "svg" => Ok(Self::Svg),
            "woff" => Ok(Self::Woff),
            "eot" => Ok(Self::Eot),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parse a comma-separated format list, e.g. `"woff,svg"`.
pub fn parse_formats(s: &str) -> Result<BTreeSet<OutputFormat>, String> {
    let formats = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(OutputFormat::from_str)
        .collect::<Result<BTreeSet<_>, _>>()?;
    if formats.is_empty() {
        return Err("no output formats requested".to_owned());
    }
    Ok(formats)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// What to produce and how.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Requested output formats.
    pub formats: BTreeSet<OutputFormat>,
    /// Name of the external EOT converter executable.
    pub eot_converter: String,
}

impl ExportOptions {
    /// Export the given formats with default tooling.
    #[must_use]
    pub fn new(formats: BTreeSet<OutputFormat>) -> Self {
        Self {
            formats,
            eot_converter: DEFAULT_EOT_CONVERTER.to_owned(),
        }
    }
}

/// Compile `font` and write every requested artifact next to `base`
/// (the output path without extension). Returns `base`.
pub fn export(font: &Font, base: &Path, options: &ExportOptions) -> PipelineResult<PathBuf> {
    let ttf_path = base.with_extension("ttf");

    // The TTF master is always produced; other formats derive from it.
    let mut ttf_bytes = ttf::compile(font)?;
    write_artifact(&ttf_path, &ttf_bytes)?;
    info!("compiled {} ({} glyphs)", ttf_path.display(), font.glyphs().len());

    if tools::hint(&ttf_path) {
        // Re-read so WOFF and EOT wrap the hinted outlines.
        ttf_bytes = fs::read(&ttf_path).map_err(|e| PipelineError::Export {
            path: ttf_path.clone(),
            message: e.to_string(),
        })?;
    }

    if options.formats.contains(&OutputFormat::Svg) {
        let svg_path = base.with_extension("svg");
        let document = svgfont::render(font).to_string();
        write_artifact(&svg_path, document.as_bytes())?;
        fix_svg_namespace(&svg_path)?;
    }

    if options.formats.contains(&OutputFormat::Woff) {
        let woff_path = base.with_extension("woff");
        let woff_bytes = woff::wrap(&ttf_bytes)?;
        write_artifact(&woff_path, &woff_bytes)?;
    }

    if options.formats.contains(&OutputFormat::Eot) {
        let eot_path = base.with_extension("eot");
        tools::convert_eot(&ttf_path, &eot_path, &options.eot_converter)?;
    }

    if !options.formats.contains(&OutputFormat::Ttf) {
        debug!("removing intermediate {}", ttf_path.display());
        fs::remove_file(&ttf_path).map_err(|e| PipelineError::Export {
            path: ttf_path.clone(),
            message: e.to_string(),
        })?;
    }

    Ok(base.to_path_buf())
}

fn write_artifact(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    fs::write(path, bytes).map_err(|e| PipelineError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Ensure the root `<svg>` tag of the file carries the SVG namespace.
/// Idempotent: a root that already declares `xmlns` is left alone.
pub fn fix_svg_namespace(path: &Path) -> PipelineResult<()> {
    let content = fs::read_to_string(path).map_err(|e| PipelineError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let Some(start) = content.find("<svg") else {
        return Ok(());
    };
    let Some(end) = content[start..].find('>') else {
        return Ok(());
    };
    if content[start..start + end].contains("xmlns") {
        return Ok(());
    }

    let mut fixed = String::with_capacity(content.len() + 40);
    fixed.push_str(&content[..start + 4]);
    fixed.push_str(r#" xmlns="http://www.w3.org/2000/svg""#);
    fixed.push_str(&content[start + 4..]);

    fs::write(path, fixed).map_err(|e| PipelineError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::BezPath;
    use webfont_font::{FontMetrics, Glyph};

    fn sample_font() -> Font {
        let mut font = Font::new("Icons", FontMetrics::default());
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((100.0, 0.0));
        p.line_to((100.0, 100.0));
        p.close_path();
        let mut g = Glyph::new(0xE001, "tri", p);
        g.fit_advance(512);
        font.add_glyph(g).expect("glyph");
        font
    }

    #[test]
    fn format_parsing_accepts_known_lists() {
        let formats = parse_formats("woff, svg,TTF").expect("parse");
        assert!(formats.contains(&OutputFormat::Woff));
        assert!(formats.contains(&OutputFormat::Svg));
        assert!(formats.contains(&OutputFormat::Ttf));
        assert!(!formats.contains(&OutputFormat::Eot));
    }

    #[test]
    fn format_parsing_rejects_unknown_and_empty() {
        assert!(parse_formats("otf").is_err());
        assert!(parse_formats("").is_err());
        assert!(parse_formats(" , ,").is_err());
    }

    #[test]
    fn namespace_fixup_is_applied_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("font.svg");
        fs::write(&path, "<svg><defs/></svg>").expect("write");

        fix_svg_namespace(&path).expect("first pass");
        fix_svg_namespace(&path).expect("second pass");

        let fixed = fs::read_to_string(&path).expect("read back");
        assert_eq!(
            fixed.matches("xmlns").count(),
            1,
            "fix-up must be idempotent: {fixed}"
        );
        assert!(fixed.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg">"#));
    }

    #[test]
    fn ttf_survives_when_requested() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("icons");
        let options = ExportOptions::new([OutputFormat::Ttf].into());
        export(&sample_font(), &base, &options).expect("export");
        assert!(base.with_extension("ttf").exists());
    }

    #[test]
    fn intermediate_ttf_is_removed_for_woff_only_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("icons");
        let options = ExportOptions::new([OutputFormat::Woff].into());
        export(&sample_font(), &base, &options).expect("export");
        assert!(base.with_extension("woff").exists(), "woff must exist");
        assert!(!base.with_extension("ttf").exists(), "ttf must be cleaned up");
    }

    #[test]
    fn svg_output_carries_namespace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("icons");
        let options = ExportOptions::new([OutputFormat::Svg, OutputFormat::Ttf].into());
        export(&sample_font(), &base, &options).expect("export");

        let doc = fs::read_to_string(base.with_extension("svg")).expect("svg");
        assert!(
            doc.contains(r#"xmlns="http://www.w3.org/2000/svg""#),
            "namespace missing: {doc}"
        );
    }
}
