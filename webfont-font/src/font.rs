//! The font aggregate: glyphs, ligature rules, and metrics.

use std::collections::BTreeMap;

use kurbo::{Affine, BezPath, PathEl, Shape};

use crate::error::FontError;
use crate::metrics::FontMetrics;

// ---------------------------------------------------------------------------
// Glyph
// ---------------------------------------------------------------------------

/// One compiled character.
///
/// The outline is written exactly once at construction; afterwards only
/// the normalization operations ([`Glyph::zero_side_bearings`],
/// [`Glyph::snap_to_grid`], [`Glyph::fit_advance`]) touch it.
#[derive(Debug, Clone)]
pub struct Glyph {
    codepoint: u32,
    name: String,
    outline: BezPath,
    advance: u16,
    placeholder: bool,
}

impl Glyph {
    /// Create a glyph backed by an imported outline.
    #[must_use]
    pub fn new(codepoint: u32, name: impl Into<String>, outline: BezPath) -> Self {
        Self {
            codepoint,
            name: name.into(),
            outline,
            advance: 0,
            placeholder: false,
        }
    }

    /// Create an empty placeholder glyph for a ligature component
    /// character. Its outline is a single zero-length point at the origin:
    /// minimal, valid, and invisible.
    #[must_use]
    pub fn placeholder(c: char) -> Self {
        let mut outline = BezPath::new();
        outline.move_to((0.0, 0.0));
        Self {
            codepoint: c as u32,
            name: c.to_string(),
            outline,
            advance: 0,
            placeholder: true,
        }
    }

    /// The assigned codepoint.
    #[must_use]
    pub const fn codepoint(&self) -> u32 {
        self.codepoint
    }

    /// The glyph's display name (source file base name, or the component
    /// character for placeholders).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The outline in font units (Y-up).
    #[must_use]
    pub const fn outline(&self) -> &BezPath {
        &self.outline
    }

    /// Advance width in font units.
    #[must_use]
    pub const fn advance(&self) -> u16 {
        self.advance
    }

    /// Whether this is an empty ligature-component placeholder rather
    /// than a glyph backed by a source file.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Force both side bearings to zero by translating the outline so its
    /// left edge sits at x = 0. The advance is recomputed separately by
    /// [`Glyph::fit_advance`].
    pub fn zero_side_bearings(&mut self) {
        if !self.has_drawable() {
            return;
        }
        let bb = self.outline.bounding_box();
        if bb.x0 != 0.0 {
            self.outline.apply_affine(Affine::translate((-bb.x0, 0.0)));
        }
    }

    /// Snap every outline coordinate to the integer grid.
    pub fn snap_to_grid(&mut self) {
        let snapped: BezPath = self
            .outline
            .elements()
            .iter()
            .map(|el| match el {
                PathEl::MoveTo(p) => PathEl::MoveTo(p.round()),
                PathEl::LineTo(p) => PathEl::LineTo(p.round()),
                PathEl::QuadTo(c, p) => PathEl::QuadTo(c.round(), p.round()),
                PathEl::CurveTo(c1, c2, p) => PathEl::CurveTo(c1.round(), c2.round(), p.round()),
                PathEl::ClosePath => PathEl::ClosePath,
            })
            .collect();
        self.outline = snapped;
    }

    /// Recompute the advance width from the outline extent: left bound 0,
    /// right bound the outline's right edge, clamped to `max`. Idempotent.
    pub fn fit_advance(&mut self, max: u16) {
        if !self.has_drawable() {
            return;
        }
        let bb = self.outline.bounding_box();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = bb.x1.round().clamp(0.0, f64::from(max)) as u16;
        self.advance = width;
    }

    fn has_drawable(&self) -> bool {
        self.outline.elements().iter().any(|el| {
            matches!(
                el,
                PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..)
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Ligature rule
// ---------------------------------------------------------------------------

/// An ordered sequence of component glyph names substituted by one
/// ligature glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigatureRule {
    components: Vec<String>,
    glyph: String,
}

impl LigatureRule {
    /// Build the rule for a ligature glyph named `name`: one component
    /// per character of the name.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        Self {
            components: name.chars().map(|c| c.to_string()).collect(),
            glyph: name.to_owned(),
        }
    }

    /// Ordered component glyph names.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The ligature glyph name the components map to.
    #[must_use]
    pub fn glyph(&self) -> &str {
        &self.glyph
    }
}

// ---------------------------------------------------------------------------
// Font
// ---------------------------------------------------------------------------

/// The single mutable aggregate the pipeline builds.
///
/// Metrics and identity are fixed at construction; glyphs are appended in
/// insertion order with codepoint uniqueness enforced; at most one
/// ligature lookup exists, represented by the rule list.
#[derive(Debug, Clone)]
pub struct Font {
    name: String,
    metrics: FontMetrics,
    glyphs: Vec<Glyph>,
    by_codepoint: BTreeMap<u32, usize>,
    ligatures: Vec<LigatureRule>,
}

impl Font {
    /// Create an empty font with its identity and metrics fixed.
    #[must_use]
    pub fn new(name: impl Into<String>, metrics: FontMetrics) -> Self {
        Self {
            name: name.into(),
            metrics,
            glyphs: Vec::new(),
            by_codepoint: BTreeMap::new(),
            ligatures: Vec::new(),
        }
    }

    /// The font family/font/full name (all three are identical).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global metrics.
    #[must_use]
    pub const fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Append a glyph, enforcing codepoint uniqueness.
    pub fn add_glyph(&mut self, glyph: Glyph) -> Result<(), FontError> {
        if self.by_codepoint.contains_key(&glyph.codepoint()) {
            return Err(FontError::DuplicateCodepoint(glyph.codepoint()));
        }
        self.by_codepoint.insert(glyph.codepoint(), self.glyphs.len());
        self.glyphs.push(glyph);
        Ok(())
    }

    /// Glyphs in insertion order.
    #[must_use]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Mutable access to the most recently added glyph, for the builder's
    /// normalization passes.
    pub fn last_glyph_mut(&mut self) -> Option<&mut Glyph> {
        self.glyphs.last_mut()
    }

    /// Look up a glyph by codepoint.
    #[must_use]
    pub fn glyph_at(&self, codepoint: u32) -> Option<&Glyph> {
        self.by_codepoint.get(&codepoint).map(|&i| &self.glyphs[i])
    }

    /// Look up a glyph by name.
    #[must_use]
    pub fn glyph_named(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name() == name)
    }

    /// Whether a codepoint is already assigned.
    #[must_use]
    pub fn contains_codepoint(&self, codepoint: u32) -> bool {
        self.by_codepoint.contains_key(&codepoint)
    }

    /// Register a ligature rule. Every component, and the target glyph,
    /// must already exist.
    pub fn add_ligature(&mut self, rule: LigatureRule) -> Result<(), FontError> {
        for component in rule.components() {
            if self.glyph_named(component).is_none() {
                return Err(FontError::UnknownLigatureComponent {
                    ligature: rule.glyph().to_owned(),
                    component: component.clone(),
                });
            }
        }
        if self.glyph_named(rule.glyph()).is_none() {
            return Err(FontError::UnknownLigatureComponent {
                ligature: rule.glyph().to_owned(),
                component: rule.glyph().to_owned(),
            });
        }
        self.ligatures.push(rule);
        Ok(())
    }

    /// Registered ligature rules, in registration order.
    #[must_use]
    pub fn ligatures(&self) -> &[LigatureRule] {
        &self.ligatures
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> BezPath {
        let mut p = BezPath::new();
        p.move_to((10.0, 0.0));
        p.line_to((10.0 + side, 0.0));
        p.line_to((10.0 + side, side));
        p.line_to((10.0, side));
        p.close_path();
        p
    }

    #[test]
    fn duplicate_codepoint_is_rejected() {
        let mut font = Font::new("Icons", FontMetrics::default());
        font.add_glyph(Glyph::new(0xE001, "a", square(100.0)))
            .expect("first insert");
        let err = font
            .add_glyph(Glyph::new(0xE001, "b", square(100.0)))
            .expect_err("duplicate must fail");
        assert!(matches!(err, FontError::DuplicateCodepoint(0xE001)));
    }

    #[test]
    fn zero_side_bearings_moves_left_edge_to_origin() {
        let mut g = Glyph::new(0xE001, "sq", square(100.0));
        g.zero_side_bearings();
        let bb = g.outline().bounding_box();
        assert!((bb.x0).abs() < 1e-9, "left edge: {}", bb.x0);
    }

    #[test]
    fn fit_advance_is_idempotent() {
        let mut g = Glyph::new(0xE001, "sq", square(100.0));
        g.zero_side_bearings();
        g.fit_advance(512);
        let first = g.advance();
        g.fit_advance(512);
        g.fit_advance(512);
        assert_eq!(g.advance(), first, "repeated fits must not drift");
        assert_eq!(first, 100);
    }

    #[test]
    fn fit_advance_clamps_to_em() {
        let mut g = Glyph::new(0xE001, "wide", square(9000.0));
        g.zero_side_bearings();
        g.fit_advance(512);
        assert_eq!(g.advance(), 512);
    }

    #[test]
    fn snap_to_grid_rounds_coordinates() {
        let mut p = BezPath::new();
        p.move_to((0.4, 0.6));
        p.line_to((99.5, 0.2));
        let mut g = Glyph::new(0xE001, "x", p);
        g.snap_to_grid();
        g.snap_to_grid();
        let bb = g.outline().bounding_box();
        assert_eq!(bb.x0, 0.0);
        assert_eq!(bb.x1, 100.0);
    }

    #[test]
    fn placeholder_is_degenerate_and_marked() {
        let g = Glyph::placeholder('a');
        assert!(g.is_placeholder());
        assert_eq!(g.codepoint(), u32::from('a'));
        assert_eq!(g.name(), "a");
        assert_eq!(g.outline().elements().len(), 1, "single move only");
    }

    #[test]
    fn ligature_requires_existing_components() {
        let mut font = Font::new("Icons", FontMetrics::default());
        font.add_glyph(Glyph::placeholder('a')).expect("a");
        font.add_glyph(Glyph::new(0xE001, "ab", square(10.0)))
            .expect("ab");
        let err = font
            .add_ligature(LigatureRule::for_name("ab"))
            .expect_err("component `b` is missing");
        assert!(
            matches!(err, FontError::UnknownLigatureComponent { ref component, .. } if component == "b"),
            "got: {err}"
        );

        font.add_glyph(Glyph::placeholder('b')).expect("b");
        font.add_ligature(LigatureRule::for_name("ab"))
            .expect("all components present");
        assert_eq!(font.ligatures().len(), 1);
    }

    #[test]
    fn ligature_rule_shape_matches_name() {
        let rule = LigatureRule::for_name("abc");
        assert_eq!(rule.components(), ["a", "b", "c"]);
        assert_eq!(rule.glyph(), "abc");
    }
}
