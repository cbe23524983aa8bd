//! The vector source feed.
//!
//! Enumerates candidate glyph sources under an input directory. Only
//! `.svg` and `.eps` files (case-insensitive) are accepted; everything
//! else is skipped silently. Accepted entries are sorted by file name
//! (full path as tiebreak) so codepoint assignment and the fingerprint
//! are deterministic across platforms instead of inheriting whatever
//! order the host filesystem yields.
//!
//! SVG sources additionally get an in-place preprocessing rewrite that
//! strips `<switch>`/`</switch>` wrapper tags: the outline importer does
//! not understand conditional-rendering wrappers, and some editors emit
//! them around the whole drawing. Note that the recorded file size (the
//! fingerprint input) is taken *before* the rewrite.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{PipelineError, PipelineResult};

/// A vector format the feed accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    /// Scalable Vector Graphics.
    Svg,
    /// Encapsulated PostScript.
    Eps,
}

impl VectorFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "eps" => Some(Self::Eps),
            _ => None,
        }
    }
}

/// One accepted glyph source.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name including extension.
    pub name: String,
    /// File name without extension; becomes the glyph name.
    pub stem: String,
    /// Accepted format.
    pub format: VectorFormat,
    /// Size in bytes at scan time (pre-rewrite).
    pub size: u64,
    /// Full path.
    pub path: PathBuf,
}

/// Recursively scan `root` for accepted vector sources, sorted by name.
pub fn scan(root: &Path) -> PipelineResult<Vec<SourceFile>> {
    let mut files = Vec::new();
    walk(root, &mut files)?;
    files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    debug!("accepted {} vector sources under {}", files.len(), root.display());
    Ok(files)
}

fn walk(dir: &Path, out: &mut Vec<SourceFile>) -> PipelineResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::Source {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::Source {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out)?;
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(format) = VectorFormat::from_extension(ext) else {
            continue;
        };
        let (Some(name), Some(stem)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        let metadata = entry.metadata().map_err(|e| PipelineError::Source {
            path: path.clone(),
            message: e.to_string(),
        })?;

        out.push(SourceFile {
            name: name.to_owned(),
            stem: stem.to_owned(),
            format,
            size: metadata.len(),
            path,
        });
    }
    Ok(())
}

/// Apply format-specific preprocessing. For SVG this rewrites the file
/// in place with every `<switch>`/`</switch>` occurrence removed; EPS
/// needs nothing.
pub fn preprocess(file: &SourceFile) -> PipelineResult<()> {
    if file.format != VectorFormat::Svg {
        return Ok(());
    }

    let content = fs::read_to_string(&file.path).map_err(|e| PipelineError::Source {
        path: file.path.clone(),
        message: e.to_string(),
    })?;

    let stripped = strip_switch_wrappers(&content);
    if stripped != content {
        debug!("stripping <switch> wrappers from {}", file.path.display());
        fs::write(&file.path, stripped).map_err(|e| PipelineError::Source {
            path: file.path.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove every `<switch>` and `</switch>` tag, preserving all other
/// content (including the wrapped children).
#[must_use]
pub fn strip_switch_wrappers(content: &str) -> String {
    content.replace("<switch>", "").replace("</switch>", "")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
