//! The `webfont` build pipeline.
//!
//! Wires the crates together into the one operation the tool performs:
//! scan a directory of vector glyph sources, assemble a font model, and
//! export it in the requested formats. See [`build`].

use std::collections::BTreeSet;
use std::path::PathBuf;

use log::{debug, info};
use webfont_font::MetricsConfig;

pub mod builder;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod source;
pub mod tools;

pub use builder::{GlyphTableBuilder, CODEPOINT_BASE};
pub use error::{PipelineError, PipelineResult};
pub use export::{parse_formats, ExportOptions, OutputFormat, DEFAULT_EOT_CONVERTER};
pub use fingerprint::Fingerprint;

/// Everything one build needs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory scanned for vector glyph sources.
    pub input_dir: PathBuf,
    /// Directory the artifacts are written into.
    pub output_dir: PathBuf,
    /// Font family name, also used as the output base name.
    pub font_name: String,
    /// Requested output formats.
    pub formats: BTreeSet<OutputFormat>,
    /// Suffix output names with the source fingerprint.
    pub hashes: bool,
    /// Compile ligature substitutions from glyph names.
    pub ligatures: bool,
    /// Metric overrides.
    pub metrics: MetricsConfig,
    /// Override for the EOT converter executable name.
    pub eot_converter: Option<String>,
}

/// Run a complete build and return the output base path (without
/// extension); append a format's extension to get its artifact.
pub fn build(request: &BuildRequest) -> PipelineResult<PathBuf> {
    let sources = source::scan(&request.input_dir)?;
    info!(
        "building '{}' from {} sources",
        request.font_name,
        sources.len()
    );

    let metrics = request.metrics.resolve();
    let mut table = GlyphTableBuilder::new(&request.font_name, metrics, request.ligatures);
    let mut fingerprint = Fingerprint::new();

    for file in &sources {
        source::preprocess(file)?;
        fingerprint.update(&file.name, file.size);
        table.add_source(file)?;
    }
    let font = table.finish();

    let base_name = if request.hashes {
        let digest = fingerprint.finalize();
        debug!("source fingerprint {digest}");
        format!("{}-{digest}", request.font_name)
    } else {
        request.font_name.clone()
    };
    let base = request.output_dir.join(base_name);

    let mut options = ExportOptions::new(request.formats.clone());
    if let Some(converter) = &request.eot_converter {
        options.eot_converter.clone_from(converter);
    }
    export::export(&font, &base, &options)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SQUARE_SVG: &str =
        r#"<svg viewBox="0 0 16 16"><path d="M0 0 L16 0 L16 16 L0 16 Z"/></svg>"#;

    fn request(input: &std::path::Path, output: &std::path::Path) -> BuildRequest {
        BuildRequest {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            font_name: "icons".to_owned(),
            formats: [OutputFormat::Ttf].into(),
            hashes: false,
            ligatures: false,
            metrics: MetricsConfig::default(),
            eot_converter: None,
        }
    }

    #[test]
    fn build_produces_requested_artifacts() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        fs::write(input.path().join("a.svg"), SQUARE_SVG).expect("a.svg");
        fs::write(input.path().join("b.svg"), SQUARE_SVG).expect("b.svg");

        let base = build(&request(input.path(), output.path())).expect("build");
        assert_eq!(base, output.path().join("icons"));
        assert!(base.with_extension("ttf").exists());
    }

    #[test]
    fn hashed_names_are_stable_across_runs() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        fs::write(input.path().join("a.svg"), SQUARE_SVG).expect("a.svg");

        let mut req = request(input.path(), output.path());
        req.hashes = true;
        let first = build(&req).expect("first build");
        let second = build(&req).expect("second build");
        assert_eq!(first, second, "same sources must fingerprint identically");

        let name = first
            .file_name()
            .and_then(|n| n.to_str())
            .expect("base name");
        assert!(
            name.starts_with("icons-") && name.len() == "icons-".len() + 32,
            "expected md5 suffix: {name}"
        );
    }

    #[test]
    fn hashed_names_change_when_a_source_grows() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        fs::write(input.path().join("a.svg"), SQUARE_SVG).expect("a.svg");

        let mut req = request(input.path(), output.path());
        req.hashes = true;
        let first = build(&req).expect("first build");

        // Same name, different size.
        fs::write(
            input.path().join("a.svg"),
            format!("{SQUARE_SVG}<!-- padding -->"),
        )
        .expect("rewrite");
        let second = build(&req).expect("second build");
        assert_ne!(first, second);
    }

    #[test]
    fn hashed_names_ignore_content_at_constant_size() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        fs::write(input.path().join("a.svg"), SQUARE_SVG).expect("a.svg");

        let mut req = request(input.path(), output.path());
        req.hashes = true;
        let first = build(&req).expect("first build");

        // Same name and byte length, different geometry.
        let reshaped = SQUARE_SVG.replace("L16 16", "L16 12");
        assert_eq!(reshaped.len(), SQUARE_SVG.len());
        fs::write(input.path().join("a.svg"), reshaped).expect("rewrite");
        let second = build(&req).expect("second build");
        assert_eq!(
            first, second,
            "fingerprint covers names and sizes, not contents"
        );
    }

    #[test]
    fn switch_wrappers_are_stripped_before_import() {
        let input = tempfile::tempdir().expect("input");
        let output = tempfile::tempdir().expect("output");
        fs::write(
            input.path().join("a.svg"),
            format!("<svg viewBox=\"0 0 16 16\"><switch>{}</switch></svg>",
                r#"<path d="M0 0 L16 0 L16 16 L0 16 Z"/>"#),
        )
        .expect("a.svg");

        let base = build(&request(input.path(), output.path())).expect("build");
        assert!(base.with_extension("ttf").exists());
        let rewritten = fs::read_to_string(input.path().join("a.svg")).expect("read back");
        assert!(!rewritten.contains("switch"), "wrapper must be stripped");
    }
}
