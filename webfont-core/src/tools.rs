//! External tool invocations.
//!
//! Two subprocesses can participate in a run: the `ttfautohint` hinter
//! (best-effort, its absence or failure is tolerated) and the EOT
//! converter (required when EOT output is requested, its failure is
//! fatal).

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};

use crate::error::{PipelineError, PipelineResult};

/// Locate an executable by scanning the `PATH` environment variable.
#[must_use]
pub fn find_tool(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Run `ttfautohint` over the TTF at `ttf`, replacing it in place on
/// success. Returns whether the file was actually rewritten; a missing
/// tool or a failed invocation leaves the unhinted file untouched.
pub fn hint(ttf: &Path) -> bool {
    let Some(tool) = find_tool("ttfautohint") else {
        debug!("ttfautohint not found, skipping hinting");
        return false;
    };

    let hinted = ttf.with_extension("hinted.ttf");
    let status = Command::new(&tool)
        .arg("--symbol")
        .arg("--fallback-script=latn")
        .arg("--windows-compatibility")
        .arg("--no-info")
        .arg(ttf)
        .arg(&hinted)
        .status();

    match status {
        Ok(status) if status.success() => {
            if let Err(e) = std::fs::rename(&hinted, ttf) {
                warn!("could not move hinted font into place: {e}");
                let _ = std::fs::remove_file(&hinted);
                return false;
            }
            debug!("hinted {}", ttf.display());
            true
        }
        Ok(status) => {
            warn!("ttfautohint exited with {status}, keeping unhinted font");
            let _ = std::fs::remove_file(&hinted);
            false
        }
        Err(e) => {
            warn!("could not run ttfautohint: {e}");
            false
        }
    }
}

/// Convert `ttf` to EOT at `eot` using the configured external converter.
/// Unlike hinting there is no fallback, so any failure is fatal.
pub fn convert_eot(ttf: &Path, eot: &Path, converter: &str) -> PipelineResult<()> {
    let tool = find_tool(converter).ok_or_else(|| PipelineError::Converter {
        tool: converter.to_owned(),
        message: "not found on PATH".to_owned(),
    })?;

    let status = Command::new(&tool)
        .arg(ttf)
        .arg("--output")
        .arg(eot)
        .status()
        .map_err(|e| PipelineError::Converter {
            tool: converter.to_owned(),
            message: e.to_string(),
        })?;

    if !status.success() {
        return Err(PipelineError::Converter {
            tool: converter.to_owned(),
            message: format!("exited with {status}"),
        });
    }
    debug!("converted {} to {}", ttf.display(), eot.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
