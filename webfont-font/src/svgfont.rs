//! SVG font generation.
//!
//! Emits the legacy SVG font format: `<defs><font>` with a `<font-face>`,
//! a `<missing-glyph>`, and one `<glyph>` per model glyph. Glyph path
//! data is written in font units, which are already Y-up, the coordinate
//! system SVG fonts expect, so no flip happens here.
//!
//! Ligatures are expressed the SVG way: an extra `<glyph>` whose
//! `unicode` attribute is the multi-character component sequence.
//!
//! The document root is emitted without an `xmlns` attribute; the export
//! pipeline injects it as a post-processing step shared with every other
//! generator path.

use svg::node::element::Element;
use svg::Node;

use crate::font::Font;

/// Render the font model to an SVG font document rooted at `<svg>`.
#[must_use]
pub fn render(font: &Font) -> Element {
    let metrics = font.metrics();

    let mut face = Element::new("font-face");
    face.assign("font-family", font.name());
    face.assign("units-per-em", i32::from(metrics.em));
    face.assign("ascent", i32::from(metrics.ascent));
    face.assign("descent", -i32::from(metrics.descent));

    let mut missing = Element::new("missing-glyph");
    missing.assign("horiz-adv-x", i32::from(metrics.em / 2));

    let mut font_el = Element::new("font");
    font_el.assign("id", font.name());
    font_el.assign("horiz-adv-x", i32::from(metrics.em));
    font_el.append(face);
    font_el.append(missing);

    for glyph in font.glyphs() {
        let mut el = Element::new("glyph");
        el.assign("glyph-name", glyph.name());
        if let Some(c) = char::from_u32(glyph.codepoint()) {
            el.assign("unicode", c.to_string());
        }
        el.assign("horiz-adv-x", i32::from(glyph.advance()));
        if !glyph.is_placeholder() {
            el.assign("d", glyph.outline().to_svg());
        }
        font_el.append(el);
    }

    // Ligature entries reuse the target glyph's outline under the
    // multi-character unicode value.
    for rule in font.ligatures() {
        let Some(target) = font.glyph_named(rule.glyph()) else {
            continue;
        };
        let mut el = Element::new("glyph");
        el.assign("glyph-name", format!("{}.liga", rule.glyph()));
        el.assign("unicode", rule.components().concat());
        el.assign("horiz-adv-x", i32::from(target.advance()));
        el.assign("d", target.outline().to_svg());
        font_el.append(el);
    }

    let mut defs = Element::new("defs");
    defs.append(font_el);

    let mut root = Element::new("svg");
    root.append(defs);
    root
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{Glyph, LigatureRule};
    use crate::metrics::FontMetrics;
    use kurbo::BezPath;

    fn sample_font(with_liga: bool) -> Font {
        let mut font = Font::new("Icons", FontMetrics::default());
        if with_liga {
            font.add_glyph(Glyph::placeholder('a')).expect("a");
            font.add_glyph(Glyph::placeholder('b')).expect("b");
        }
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((100.0, 0.0));
        p.line_to((100.0, 100.0));
        p.close_path();
        let mut g = Glyph::new(0xE001, "ab", p);
        g.fit_advance(512);
        font.add_glyph(g).expect("ab");
        if with_liga {
            font.add_ligature(LigatureRule::for_name("ab")).expect("rule");
        }
        font
    }

    #[test]
    fn document_contains_font_structure() {
        let doc = render(&sample_font(false)).to_string();
        assert!(doc.contains("<font "), "missing font element: {doc}");
        assert!(doc.contains("<font-face "), "missing font-face: {doc}");
        assert!(doc.contains("<missing-glyph "), "missing missing-glyph: {doc}");
        assert!(doc.contains("units-per-em=\"512\""), "missing em: {doc}");
        assert!(doc.contains("descent=\"-64\""), "descent must be negative: {doc}");
    }

    #[test]
    fn real_glyph_carries_path_data() {
        let doc = render(&sample_font(false)).to_string();
        assert!(
            doc.contains("glyph-name=\"ab\"") && doc.contains(" d=\"M"),
            "glyph path missing: {doc}"
        );
    }

    #[test]
    fn placeholders_have_no_path_data() {
        let doc = render(&sample_font(true)).to_string();
        // The placeholder entries exist but draw nothing.
        assert!(doc.contains("glyph-name=\"a\""), "placeholder a missing: {doc}");
        let a_entry = doc
            .split("glyph-name=\"a\"")
            .nth(1)
            .and_then(|s| s.split("/>").next())
            .expect("placeholder entry");
        assert!(!a_entry.contains(" d=\""), "placeholder must be empty: {a_entry}");
    }

    #[test]
    fn ligature_entry_uses_component_sequence() {
        let doc = render(&sample_font(true)).to_string();
        assert!(
            doc.contains("unicode=\"ab\""),
            "ligature unicode sequence missing: {doc}"
        );
    }

    #[test]
    fn root_has_no_namespace_yet() {
        // The namespace is injected by the export pipeline fix-up.
        let doc = render(&sample_font(false)).to_string();
        let root = doc.split('>').next().expect("root tag");
        assert!(
            !root.contains("xmlns"),
            "generator must not set xmlns (pipeline does): {root}"
        );
    }
}
