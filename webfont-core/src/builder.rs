//! Glyph table assembly.
//!
//! Consumes the source feed one file at a time, in feed order, and grows
//! the font model: codepoints are assigned sequentially from
//! [`CODEPOINT_BASE`], outlines are imported and normalized, and in
//! ligature mode each glyph name also spawns per-character placeholder
//! glyphs plus a substitution rule.

use log::debug;
use webfont_font::{Font, FontMetrics, Glyph, LigatureRule};
use webfont_outline::EmBox;

use crate::error::{PipelineError, PipelineResult};
use crate::source::SourceFile;

/// First codepoint handed out, in the Unicode private use area.
pub const CODEPOINT_BASE: u32 = 0xE001;

/// Incremental builder that turns accepted source files into font glyphs.
pub struct GlyphTableBuilder {
    font: Font,
    next_codepoint: u32,
    ligatures: bool,
}

impl GlyphTableBuilder {
    /// Start building a font with the given identity and metrics.
    /// `ligatures` enables placeholder glyphs and substitution rules.
    #[must_use]
    pub fn new(name: impl Into<String>, metrics: FontMetrics, ligatures: bool) -> Self {
        Self {
            font: Font::new(name, metrics),
            next_codepoint: CODEPOINT_BASE,
            ligatures,
        }
    }

    /// Accept one source file: allocate the next codepoint, import and
    /// normalize its outline, and (in ligature mode) register the
    /// per-character placeholders and the substitution rule.
    pub fn add_source(&mut self, file: &SourceFile) -> PipelineResult<()> {
        let codepoint = self.next_codepoint;
        self.next_codepoint += 1;

        if self.ligatures {
            // Placeholders are shared between ligature names, so 'ab'
            // and 'ac' both reuse the 'a' component glyph.
            for c in file.stem.chars() {
                if !self.font.contains_codepoint(c as u32) {
                    self.font.add_glyph(Glyph::placeholder(c))?;
                }
            }
        }

        let metrics = self.font.metrics();
        let embox = EmBox::new(
            f64::from(metrics.em),
            f64::from(metrics.ascent),
            f64::from(metrics.descent),
        );
        let outline =
            webfont_outline::import(&file.path, embox).map_err(|source| PipelineError::Outline {
                path: file.path.clone(),
                source,
            })?;

        self.font.add_glyph(Glyph::new(codepoint, &file.stem, outline))?;
        if let Some(glyph) = self.font.last_glyph_mut() {
            glyph.zero_side_bearings();
            glyph.snap_to_grid();
            glyph.fit_advance(metrics.em);
        }
        debug!("glyph '{}' assigned U+{codepoint:04X}", file.stem);

        if self.ligatures {
            self.font.add_ligature(LigatureRule::for_name(&file.stem))?;
        }
        Ok(())
    }

    /// Finish and hand over the font model.
    #[must_use]
    pub fn finish(self) -> Font {
        self.font
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
