//! TTF compilation via `write-fonts`.
//!
//! Builds the full table set for a static TrueType font: `glyf`/`loca`
//! from the model outlines, `cmap` from the codepoint assignments,
//! horizontal metrics, naming, and (when ligature rules are registered)
//! a single GSUB `liga` lookup with one ligature-substitution subtable.
//!
//! Glyph 0 is always `.notdef`; model glyphs follow in insertion order.
//! Outlines arrive as cubic paths and are converted to the quadratic
//! segments `glyf` requires before table construction.

use std::collections::BTreeMap;

use kurbo::{BezPath, CubicBez, ParamCurve, PathEl, Point};
use write_fonts::{
    tables::{
        cmap::Cmap,
        glyf::{GlyfLocaBuilder, Glyph as RawGlyph, SimpleGlyph},
        gsub::{
            Gsub, Ligature, LigatureSet, LigatureSubstFormat1, SubstitutionLookup,
            SubstitutionLookupList,
        },
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        layout::{
            CoverageTableBuilder, Feature, FeatureList, FeatureRecord, LangSys, Lookup,
            LookupFlag, Script, ScriptList, ScriptRecord,
        },
        loca::LocaFormat,
        maxp::Maxp,
        name::{Name, NameRecord},
        os2::Os2,
        post::Post,
    },
    types::{FWord, GlyphId, GlyphId16, NameId, Tag, UfWord},
    FontBuilder,
};

use crate::error::FontError;
use crate::font::Font;

/// Maximum deviation (in font units) when approximating cubic segments
/// with quadratics. Coordinates are snapped to the integer grid anyway,
/// so half a unit is invisible.
const QUAD_TOLERANCE: f64 = 0.5;

/// Compile the font model into TTF bytes.
pub fn compile(font: &Font) -> Result<Vec<u8>, FontError> {
    let metrics = font.metrics();

    // Glyph order: .notdef, then model glyphs in insertion order.
    let mut glyph_names: Vec<String> = vec![".notdef".to_owned()];
    let mut gid_by_name: BTreeMap<String, GlyphId16> = BTreeMap::new();
    for (i, glyph) in font.glyphs().iter().enumerate() {
        let gid = u16::try_from(i + 1)
            .map_err(|_| FontError::Compile("more than 65534 glyphs".to_owned()))?;
        glyph_names.push(glyph.name().to_owned());
        gid_by_name.insert(glyph.name().to_owned(), GlyphId16::new(gid));
    }

    // glyf/loca, gathering the union bounding box and metrics extremes.
    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut metrics_rows: Vec<LongMetric> = Vec::new();
    let mut bbox: Option<(i16, i16, i16, i16)> = None;
    let mut advance_max: u16 = 0;

    glyf_builder
        .add_glyph(&RawGlyph::Empty)
        .map_err(|e| FontError::Compile(format!(".notdef: {e}")))?;
    metrics_rows.push(LongMetric::new(metrics.em / 2, 0));

    for glyph in font.glyphs() {
        let raw = build_raw_glyph(glyph.outline())
            .map_err(|e| FontError::Compile(format!("glyph `{}`: {e}", glyph.name())))?;
        if let RawGlyph::Simple(ref simple) = raw {
            let b = simple.bbox;
            bbox = Some(match bbox {
                None => (b.x_min, b.y_min, b.x_max, b.y_max),
                Some((x0, y0, x1, y1)) => (
                    x0.min(b.x_min),
                    y0.min(b.y_min),
                    x1.max(b.x_max),
                    y1.max(b.y_max),
                ),
            });
        }
        glyf_builder
            .add_glyph(&raw)
            .map_err(|e| FontError::Compile(format!("glyph `{}`: {e}", glyph.name())))?;
        metrics_rows.push(LongMetric::new(glyph.advance(), 0));
        advance_max = advance_max.max(glyph.advance());
    }

    let (glyf, loca, loca_format) = glyf_builder.build();
    let (x_min, y_min, x_max, y_max) = bbox.unwrap_or((0, 0, 0, 0));

    // cmap: every glyph is reachable from its codepoint, placeholders
    // included.
    let mut mappings: Vec<(char, GlyphId)> = Vec::new();
    for (i, glyph) in font.glyphs().iter().enumerate() {
        let c = char::from_u32(glyph.codepoint()).ok_or_else(|| {
            FontError::Compile(format!("codepoint U+{:04X} is not a scalar", glyph.codepoint()))
        })?;
        #[allow(clippy::cast_possible_truncation)]
        let gid = GlyphId::new((i + 1) as u32);
        mappings.push((c, gid));
    }
    let cmap =
        Cmap::from_mappings(mappings).map_err(|e| FontError::Compile(format!("cmap: {e}")))?;

    #[allow(clippy::cast_possible_wrap)]
    let ascent = metrics.ascent as i16;
    #[allow(clippy::cast_possible_wrap)]
    let descent = metrics.descent as i16;

    let head = Head {
        units_per_em: metrics.em,
        x_min,
        y_min,
        x_max,
        y_max,
        index_to_loc_format: match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
        ..Default::default()
    };

    #[allow(clippy::cast_possible_truncation)]
    let glyph_count = (font.glyphs().len() + 1) as u16;

    let hhea = Hhea {
        ascender: FWord::new(ascent),
        descender: FWord::new(-descent),
        line_gap: FWord::new(0),
        advance_width_max: UfWord::new(advance_max.max(metrics.em / 2)),
        min_left_side_bearing: FWord::new(0),
        min_right_side_bearing: FWord::new(0),
        x_max_extent: FWord::new(x_max),
        caret_slope_rise: 1,
        caret_slope_run: 0,
        caret_offset: 0,
        number_of_h_metrics: glyph_count,
        ..Default::default()
    };

    let maxp = Maxp {
        num_glyphs: glyph_count,
        ..Default::default()
    };

    let hmtx = Hmtx::new(metrics_rows, Vec::new());

    let os2 = Os2 {
        us_weight_class: 400,
        us_width_class: 5,
        s_typo_ascender: ascent,
        s_typo_descender: -descent,
        s_typo_line_gap: 0,
        us_win_ascent: metrics.ascent,
        us_win_descent: metrics.descent,
        ..Default::default()
    };

    let name = build_name(font.name());
    let post = Post::new_v2(glyph_names.iter().map(String::as_str));

    let mut builder = FontBuilder::new();
    builder
        .add_table(&head)
        .and_then(|b| b.add_table(&hhea))
        .and_then(|b| b.add_table(&maxp))
        .and_then(|b| b.add_table(&os2))
        .and_then(|b| b.add_table(&hmtx))
        .and_then(|b| b.add_table(&cmap))
        .and_then(|b| b.add_table(&glyf))
        .and_then(|b| b.add_table(&loca))
        .and_then(|b| b.add_table(&name))
        .and_then(|b| b.add_table(&post))
        .map_err(|e| FontError::Compile(e.to_string()))?;

    if let Some(gsub) = build_gsub(font, &gid_by_name)? {
        log::debug!("GSUB with {} ligature rules", font.ligatures().len());
        builder
            .add_table(&gsub)
            .map_err(|e| FontError::Compile(e.to_string()))?;
    }

    Ok(builder.build())
}

// ---------------------------------------------------------------------------
// Outline conversion
// ---------------------------------------------------------------------------

/// Convert a model outline into a raw `glyf` glyph. Outlines without
/// drawable segments (placeholders) become empty glyphs.
fn build_raw_glyph(outline: &BezPath) -> Result<RawGlyph, FontError> {
    let quads = to_quadratic(outline);
    if !quads.elements().iter().any(|el| {
        matches!(el, PathEl::LineTo(_) | PathEl::QuadTo(..))
    }) {
        return Ok(RawGlyph::Empty);
    }
    let simple = SimpleGlyph::from_bezpath(&quads)
        .map_err(|e| FontError::Compile(format!("outline conversion: {e:?}")))?;
    Ok(RawGlyph::Simple(simple))
}

/// Replace every cubic segment with quadratic approximations within
/// [`QUAD_TOLERANCE`].
fn to_quadratic(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut cur = Point::ZERO;
    let mut start = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                out.move_to(p);
                cur = p;
                start = p;
            }
            PathEl::LineTo(p) => {
                out.line_to(p);
                cur = p;
            }
            PathEl::QuadTo(c, p) => {
                out.quad_to(c, p);
                cur = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                cubic_to_quads(CubicBez::new(cur, c1, c2, p), &mut out);
                cur = p;
            }
            PathEl::ClosePath => {
                out.close_path();
                cur = start;
            }
        }
    }
    out
}

/// Split a cubic into enough pieces that the one-quad-per-piece midpoint
/// approximation stays within tolerance, then emit the quads.
///
/// The error of approximating one cubic by the midpoint quadratic is
/// bounded by `sqrt(3)/36 * |p3 - 3*p2 + 3*p1 - p0|`, and subdividing
/// into `n` pieces divides the bound by `n^2`.
fn cubic_to_quads(cubic: CubicBez, out: &mut BezPath) {
    let d = cubic.p3.to_vec2() - cubic.p2.to_vec2() * 3.0 + cubic.p1.to_vec2() * 3.0
        - cubic.p0.to_vec2();
    let err = 3f64.sqrt() / 36.0 * d.hypot();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = ((err / QUAD_TOLERANCE).sqrt().ceil() as usize).max(1);

    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let range = (i as f64 / n as f64)..((i + 1) as f64 / n as f64);
        let seg = cubic.subsegment(range);
        // Midpoint quad: control = (3*(c1 + c2) - (p0 + p3)) / 4.
        let ctrl = Point::new(
            (3.0 * (seg.p1.x + seg.p2.x) - (seg.p0.x + seg.p3.x)) / 4.0,
            (3.0 * (seg.p1.y + seg.p2.y) - (seg.p0.y + seg.p3.y)) / 4.0,
        );
        out.quad_to(ctrl, seg.p3);
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Family, subfamily, unique, full, version and PostScript name records
/// (Windows platform, Unicode BMP, US English). Family, full and
/// PostScript names are all the requested font name.
fn build_name(font_name: &str) -> Name {
    let records = vec![
        NameRecord::new(3, 1, 0x409, NameId::FAMILY_NAME, font_name.to_owned().into()),
        NameRecord::new(
            3,
            1,
            0x409,
            NameId::SUBFAMILY_NAME,
            "Regular".to_owned().into(),
        ),
        NameRecord::new(
            3,
            1,
            0x409,
            NameId::UNIQUE_ID,
            format!("{font_name} Regular").into(),
        ),
        NameRecord::new(3, 1, 0x409, NameId::FULL_NAME, font_name.to_owned().into()),
        NameRecord::new(
            3,
            1,
            0x409,
            NameId::VERSION_STRING,
            "Version 1.0".to_owned().into(),
        ),
        NameRecord::new(
            3,
            1,
            0x409,
            NameId::POSTSCRIPT_NAME,
            font_name.replace(' ', "").into(),
        ),
    ];
    Name::new(records)
}

// ---------------------------------------------------------------------------
// GSUB ligatures
// ---------------------------------------------------------------------------

/// Build the single `liga` lookup/subtable pair, or `None` when the font
/// has no ligature rules.
fn build_gsub(
    font: &Font,
    gid_by_name: &BTreeMap<String, GlyphId16>,
) -> Result<Option<Gsub>, FontError> {
    if font.ligatures().is_empty() {
        return Ok(None);
    }

    let resolve = |name: &str| -> Result<GlyphId16, FontError> {
        gid_by_name
            .get(name)
            .copied()
            .ok_or_else(|| FontError::UnknownLigatureComponent {
                ligature: name.to_owned(),
                component: name.to_owned(),
            })
    };

    // Rules grouped by first component, in coverage (glyph id) order.
    let mut sets: BTreeMap<GlyphId16, Vec<(Vec<GlyphId16>, GlyphId16)>> = BTreeMap::new();
    for rule in font.ligatures() {
        let mut components = Vec::with_capacity(rule.components().len());
        for name in rule.components() {
            components.push(resolve(name)?);
        }
        let target = resolve(rule.glyph())?;
        let Some((&first, rest)) = components.split_first() else {
            continue;
        };
        sets.entry(first).or_default().push((rest.to_vec(), target));
    }

    // Longer sequences first within a set so shorter prefixes do not
    // shadow them during shaping.
    for ligs in sets.values_mut() {
        ligs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    let coverage = sets
        .keys()
        .copied()
        .collect::<CoverageTableBuilder>()
        .build();
    let ligature_sets: Vec<LigatureSet> = sets
        .values()
        .map(|ligs| {
            LigatureSet::new(
                ligs.iter()
                    .map(|(rest, target)| Ligature::new(*target, rest.clone()))
                    .collect(),
            )
        })
        .collect();

    let subtable = LigatureSubstFormat1::new(coverage, ligature_sets);
    let lookup = SubstitutionLookup::Ligature(Lookup::new(LookupFlag::empty(), vec![subtable]));
    let lookup_list = SubstitutionLookupList::new(vec![lookup]);

    let feature = Feature::new(None, vec![0]);
    let feature_list = FeatureList::new(vec![FeatureRecord::new(Tag::new(b"liga"), feature)]);

    let script_list = ScriptList::new(vec![
        ScriptRecord::new(
            Tag::new(b"DFLT"),
            Script::new(Some(LangSys::new(vec![0])), vec![]),
        ),
        ScriptRecord::new(
            Tag::new(b"latn"),
            Script::new(Some(LangSys::new(vec![0])), vec![]),
        ),
    ]);

    Ok(Some(Gsub::new(script_list, feature_list, lookup_list)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{Glyph, LigatureRule};
    use crate::metrics::FontMetrics;
    use write_fonts::read::{FontRef, TableProvider};

    fn square(side: f64) -> BezPath {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((side, 0.0));
        p.line_to((side, side));
        p.line_to((0.0, side));
        p.close_path();
        p
    }

    fn sample_font() -> Font {
        let mut font = Font::new("Icons", FontMetrics::default());
        let mut g = Glyph::new(0xE001, "alpha", square(100.0));
        g.fit_advance(512);
        font.add_glyph(g).expect("alpha");
        let mut g = Glyph::new(0xE002, "beta", square(200.0));
        g.fit_advance(512);
        font.add_glyph(g).expect("beta");
        font
    }

    #[test]
    fn compiled_font_parses_back() {
        let bytes = compile(&sample_font()).expect("compile");
        let font = FontRef::new(&bytes).expect("parse back");

        let maxp = font.maxp().expect("maxp");
        assert_eq!(maxp.num_glyphs(), 3, ".notdef + 2 glyphs");

        let head = font.head().expect("head");
        assert_eq!(head.units_per_em(), 512);

        let hmtx = font.hmtx().expect("hmtx");
        // gid1 = alpha, advance equals its outline width.
        assert_eq!(hmtx.advance(GlyphId::new(1)), Some(100));
        assert_eq!(hmtx.advance(GlyphId::new(2)), Some(200));

        let hhea = font.hhea().expect("hhea");
        assert_eq!(hhea.number_of_h_metrics(), 3, "one metric row per glyph");

        let os2 = font.os2().expect("os2");
        assert_eq!(os2.s_typo_ascender(), 448);
        assert_eq!(os2.s_typo_descender(), -64);
        assert_eq!(os2.us_win_descent(), 64);
    }

    #[test]
    fn cmap_maps_private_use_codepoints() {
        let bytes = compile(&sample_font()).expect("compile");
        let font = FontRef::new(&bytes).expect("parse back");
        let cmap = font.cmap().expect("cmap");
        assert_eq!(
            cmap.map_codepoint(0xE001u32).map(|g| g.to_u32()),
            Some(1),
            "first glyph at first PUA codepoint"
        );
        assert_eq!(cmap.map_codepoint(0xE002u32).map(|g| g.to_u32()), Some(2));
        assert_eq!(cmap.map_codepoint(0xE003u32), None);
    }

    #[test]
    fn ligature_font_carries_gsub() {
        let mut font = Font::new("Icons", FontMetrics::default());
        font.add_glyph(Glyph::placeholder('a')).expect("a");
        font.add_glyph(Glyph::placeholder('b')).expect("b");
        let mut g = Glyph::new(0xE001, "ab", square(100.0));
        g.fit_advance(512);
        font.add_glyph(g).expect("ab");
        font.add_ligature(LigatureRule::for_name("ab"))
            .expect("rule");

        let bytes = compile(&font).expect("compile");
        let parsed = FontRef::new(&bytes).expect("parse back");
        assert!(parsed.gsub().is_ok(), "GSUB table must be present");
    }

    #[test]
    fn no_gsub_without_rules() {
        let bytes = compile(&sample_font()).expect("compile");
        let parsed = FontRef::new(&bytes).expect("parse back");
        assert!(parsed.gsub().is_err(), "GSUB must be absent");
    }

    #[test]
    fn cubic_outlines_become_quadratic() {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.curve_to((30.0, 100.0), (70.0, 100.0), (100.0, 0.0));
        p.close_path();
        let quads = to_quadratic(&p);
        assert!(
            !quads
                .elements()
                .iter()
                .any(|el| matches!(el, PathEl::CurveTo(..))),
            "no cubics may remain"
        );
        assert!(
            quads
                .elements()
                .iter()
                .any(|el| matches!(el, PathEl::QuadTo(..))),
            "cubic must become quads"
        );
    }

    #[test]
    fn placeholder_glyphs_compile_empty() {
        let raw = build_raw_glyph(Glyph::placeholder('x').outline()).expect("placeholder");
        assert!(matches!(raw, RawGlyph::Empty));
    }
}
