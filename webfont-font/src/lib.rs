//! In-memory font model and compilers for `webfont`.
//!
//! This crate owns everything font-shaped: the [`Font`] aggregate being
//! assembled by the pipeline, its [`Glyph`]s and [`LigatureRule`]s, and
//! the compilers that turn the finished model into on-disk formats
//! (TTF via `write-fonts`, WOFF1 via `flate2`, SVG font via the `svg`
//! crate). It is intentionally independent of the pipeline crate: all
//! inputs are plain values, all outputs are byte buffers or documents.

pub mod error;
pub mod font;
pub mod metrics;
pub mod svgfont;
pub mod ttf;
pub mod woff;

pub use error::FontError;
pub use font::{Font, Glyph, LigatureRule};
pub use metrics::{FontMetrics, MetricsConfig};
