//! `webfont` CLI — compile a directory of vector glyphs into a webfont.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use webfont_core::{build, parse_formats, BuildRequest, OutputFormat};
use webfont_font::MetricsConfig;

#[derive(Parser)]
#[command(version, about = "Compile SVG/EPS glyph sources into webfont artifacts")]
struct Cli {
    /// Directory containing the vector glyph sources
    input_dir: PathBuf,

    /// Directory the font files are written into
    output_dir: PathBuf,

    /// Font name, also used as the output file base name
    font: String,

    /// Comma-separated output formats: ttf, svg, woff, eot
    #[arg(value_parser = parse_formats)]
    types: BTreeSet<OutputFormat>,

    /// Suffix output names with a fingerprint of the sources
    #[arg(long)]
    hashes: bool,

    /// Build ligature substitutions from multi-character glyph names
    #[arg(long)]
    ligatures: bool,

    /// Design (crisp) size in points
    #[arg(long, value_name = "PT")]
    size: Option<u16>,

    /// Em height in font units
    #[arg(long, value_name = "UNITS")]
    em: Option<u16>,

    /// Ascender height in font units
    #[arg(long, value_name = "UNITS")]
    ascent: Option<u16>,

    /// Descender depth in font units (positive)
    #[arg(long, value_name = "UNITS")]
    descent: Option<u16>,

    /// Name of the external TTF-to-EOT converter executable
    #[arg(long, value_name = "TOOL")]
    eot_converter: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let request = BuildRequest {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        font_name: cli.font,
        formats: cli.types,
        hashes: cli.hashes,
        ligatures: cli.ligatures,
        metrics: MetricsConfig {
            size: cli.size,
            em: cli.em,
            ascent: cli.ascent,
            descent: cli.descent,
        },
        eot_converter: cli.eot_converter,
    };

    match build(&request) {
        Ok(base) => {
            // Machine-readable result for callers driving this tool.
            println!("{}", serde_json::json!({ "file": base }));
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
