//! Font metrics and their configuration.
//!
//! Metric overrides are modeled as explicit optionals: `None` means "use
//! the default", so a requested `0` is honored as zero instead of being
//! silently swallowed by a falsy-value check.

/// Default design (crisp) size in points.
pub const DEFAULT_SIZE: u16 = 16;
/// Default em height in font units.
pub const DEFAULT_EM: u16 = 512;
/// Default ascender height in font units.
pub const DEFAULT_ASCENT: u16 = 448;
/// Default descender depth in font units (positive).
pub const DEFAULT_DESCENT: u16 = 64;

/// Optional metric overrides, as collected from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Design size override.
    pub size: Option<u16>,
    /// Em height override.
    pub em: Option<u16>,
    /// Ascent override.
    pub ascent: Option<u16>,
    /// Descent override.
    pub descent: Option<u16>,
}

impl MetricsConfig {
    /// Resolve overrides against the defaults.
    #[must_use]
    pub fn resolve(self) -> FontMetrics {
        FontMetrics {
            size: self.size.unwrap_or(DEFAULT_SIZE),
            em: self.em.unwrap_or(DEFAULT_EM),
            ascent: self.ascent.unwrap_or(DEFAULT_ASCENT),
            descent: self.descent.unwrap_or(DEFAULT_DESCENT),
        }
    }
}

/// Resolved global metrics. Set once per font, before any glyph is added,
/// and never mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    /// Design (crisp) size in points.
    pub size: u16,
    /// Units per em.
    pub em: u16,
    /// Ascender height in font units.
    pub ascent: u16,
    /// Descender depth in font units (positive).
    pub descent: u16,
}

impl Default for FontMetrics {
    fn default() -> Self {
        MetricsConfig::default().resolve()
    }
}
