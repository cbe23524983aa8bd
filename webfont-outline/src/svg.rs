//! SVG outline reader.
//!
//! Walks the SVG event stream collecting `<path>` data and the basic
//! shapes (`rect`, `circle`, `ellipse`, `line`, `polyline`, `polygon`)
//! into a single [`BezPath`]. Group and element `transform` attributes
//! are applied; presentation attributes (fill, stroke) are ignored. The
//! glyph is the union of all drawn geometry.
//!
//! The viewport comes from the root `viewBox`, falling back to
//! `width`/`height`, falling back to the bounding box of the collected
//! geometry. See the crate docs for the coordinate mapping.

use kurbo::{Affine, Arc, BezPath, Circle, Ellipse, Point, Rect, Shape, SvgArc, Vec2};
use svg::node::element::path::{Command, Data, Position};
use svg::node::element::tag::Type;
use svg::parser::Event;

use crate::error::OutlineError;
use crate::EmBox;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse SVG text into an outline scaled into `embox`.
pub fn import_str(content: &str, embox: EmBox) -> Result<BezPath, OutlineError> {
    let parser = svg::read(content).map_err(|e| OutlineError::Parse(e.to_string()))?;

    let mut path = BezPath::new();
    let mut viewport: Option<Rect> = None;
    // Transform stack; one entry per open tag, each pre-multiplied by its
    // parent so the top is always the full current transform.
    let mut stack: Vec<Affine> = vec![Affine::IDENTITY];

    for event in parser {
        match event {
            Event::Tag(name, Type::Start, attrs) => {
                let own = parse_transform(attrs.get("transform").map(|v| &**v))?;
                let current = *stack.last().unwrap_or(&Affine::IDENTITY) * own;
                stack.push(current);

                if name == "svg" && viewport.is_none() {
                    viewport = parse_viewport(&attrs);
                }
                emit_shape(name, &attrs, current, &mut path)?;
            }
            Event::Tag(name, Type::Empty, attrs) => {
                let own = parse_transform(attrs.get("transform").map(|v| &**v))?;
                let current = *stack.last().unwrap_or(&Affine::IDENTITY) * own;
                emit_shape(name, &attrs, current, &mut path)?;
            }
            Event::Tag(_, Type::End, _) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Error(e) => return Err(OutlineError::Parse(e.to_string())),
            _ => {}
        }
    }

    if !has_drawable(&path) {
        return Err(OutlineError::Empty);
    }

    let vb = viewport.unwrap_or_else(|| {
        log::debug!("no viewport declared, using geometry extent");
        path.bounding_box()
    });
    if vb.height() <= 0.0 {
        return Err(OutlineError::Parse("viewport has zero height".to_owned()));
    }

    // Uniform scale: viewport height spans the em; Y flips so the viewport
    // top lands on the ascent and the bottom on -descent.
    let s = embox.em / vb.height();
    let map = Affine::new([s, 0.0, 0.0, -s, -vb.x0 * s, embox.ascent + vb.y0 * s]);
    path.apply_affine(map);
    Ok(path)
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

type Attributes = std::collections::HashMap<String, svg::node::Value>;

fn parse_viewport(attrs: &Attributes) -> Option<Rect> {
    if let Some(vb) = attrs.get("viewBox") {
        let nums: Vec<f64> = vb
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if let [x, y, w, h] = nums[..] {
            if w > 0.0 && h > 0.0 {
                return Some(Rect::new(x, y, x + w, y + h));
            }
        }
        return None;
    }

    let w = attrs.get("width").and_then(|v| parse_length(v))?;
    let h = attrs.get("height").and_then(|v| parse_length(v))?;
    if w > 0.0 && h > 0.0 {
        Some(Rect::new(0.0, 0.0, w, h))
    } else {
        None
    }
}

/// Parse a length attribute, tolerating a trailing unit (`px`, `pt`, ...).
fn parse_length(value: &str) -> Option<f64> {
    let digits = value.trim().trim_end_matches(|c: char| c.is_alphabetic() || c == '%');
    digits.trim().parse().ok()
}

// ---------------------------------------------------------------------------
// Shape elements
// ---------------------------------------------------------------------------

fn emit_shape(
    name: &str,
    attrs: &Attributes,
    transform: Affine,
    out: &mut BezPath,
) -> Result<(), OutlineError> {
    let mut local = BezPath::new();

    match name {
        "path" => {
            if let Some(d) = attrs.get("d") {
                let data =
                    Data::parse(d).map_err(|e| OutlineError::Parse(format!("path data: {e}")))?;
                data_to_path(&data, &mut local)?;
            }
        }
        "rect" => {
            let x = attr_f64(attrs, "x").unwrap_or(0.0);
            let y = attr_f64(attrs, "y").unwrap_or(0.0);
            let w = attr_f64(attrs, "width").unwrap_or(0.0);
            let h = attr_f64(attrs, "height").unwrap_or(0.0);
            if w > 0.0 && h > 0.0 {
                local = Rect::new(x, y, x + w, y + h).to_path(0.1);
            }
        }
        "circle" => {
            let cx = attr_f64(attrs, "cx").unwrap_or(0.0);
            let cy = attr_f64(attrs, "cy").unwrap_or(0.0);
            let r = attr_f64(attrs, "r").unwrap_or(0.0);
            if r > 0.0 {
                local = Circle::new((cx, cy), r).to_path(0.1);
            }
        }
        "ellipse" => {
            let cx = attr_f64(attrs, "cx").unwrap_or(0.0);
            let cy = attr_f64(attrs, "cy").unwrap_or(0.0);
            let rx = attr_f64(attrs, "rx").unwrap_or(0.0);
            let ry = attr_f64(attrs, "ry").unwrap_or(0.0);
            if rx > 0.0 && ry > 0.0 {
                local = Ellipse::new((cx, cy), (rx, ry), 0.0).to_path(0.1);
            }
        }
        "line" => {
            let x1 = attr_f64(attrs, "x1").unwrap_or(0.0);
            let y1 = attr_f64(attrs, "y1").unwrap_or(0.0);
            let x2 = attr_f64(attrs, "x2").unwrap_or(0.0);
            let y2 = attr_f64(attrs, "y2").unwrap_or(0.0);
            local.move_to((x1, y1));
            local.line_to((x2, y2));
        }
        "polyline" | "polygon" => {
            if let Some(points) = attrs.get("points") {
                let nums: Vec<f64> = points
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| s.parse().ok())
                    .collect();
                for (i, pair) in nums.chunks_exact(2).enumerate() {
                    let p = Point::new(pair[0], pair[1]);
                    if i == 0 {
                        local.move_to(p);
                    } else {
                        local.line_to(p);
                    }
                }
                if name == "polygon" && !local.elements().is_empty() {
                    local.close_path();
                }
            }
        }
        _ => {}
    }

    if !local.elements().is_empty() {
        local.apply_affine(transform);
        out.extend(local);
    }
    Ok(())
}

fn attr_f64(attrs: &Attributes, name: &str) -> Option<f64> {
    attrs.get(name).and_then(|v| parse_length(v))
}

// ---------------------------------------------------------------------------
// Path data → BezPath
// ---------------------------------------------------------------------------

/// Convert parsed SVG path data into `out`.
///
/// Tracks the current point, the sub-path start (for `Z`), and the last
/// control point (for the `S`/`T` reflection rules).
fn data_to_path(data: &Data, out: &mut BezPath) -> Result<(), OutlineError> {
    let mut cur = Point::ZERO;
    let mut start = Point::ZERO;
    let mut last_cubic_ctrl: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;

    for command in data.iter() {
        match command {
            Command::Move(pos, params) => {
                let p = take(params, 2)?;
                for (i, pair) in p.chunks_exact(2).enumerate() {
                    let mut pt = Point::new(pair[0], pair[1]);
                    if *pos == Position::Relative {
                        pt += cur.to_vec2();
                    }
                    // Extra coordinate pairs after a moveto are implicit
                    // lineto commands.
                    if i == 0 {
                        out.move_to(pt);
                        start = pt;
                    } else {
                        out.line_to(pt);
                    }
                    cur = pt;
                }
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            Command::Line(pos, params) => {
                let p = take(params, 2)?;
                for pair in p.chunks_exact(2) {
                    let mut pt = Point::new(pair[0], pair[1]);
                    if *pos == Position::Relative {
                        pt += cur.to_vec2();
                    }
                    out.line_to(pt);
                    cur = pt;
                }
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            Command::HorizontalLine(pos, params) => {
                let p = take(params, 1)?;
                for x in &p {
                    let pt = match pos {
                        Position::Absolute => Point::new(*x, cur.y),
                        Position::Relative => Point::new(cur.x + x, cur.y),
                    };
                    out.line_to(pt);
                    cur = pt;
                }
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            Command::VerticalLine(pos, params) => {
                let p = take(params, 1)?;
                for y in &p {
                    let pt = match pos {
                        Position::Absolute => Point::new(cur.x, *y),
                        Position::Relative => Point::new(cur.x, cur.y + y),
                    };
                    out.line_to(pt);
                    cur = pt;
                }
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            Command::CubicCurve(pos, params) => {
                let p = take(params, 6)?;
                for seg in p.chunks_exact(6) {
                    let base = rel_base(*pos, cur);
                    let c1 = Point::new(seg[0], seg[1]) + base;
                    let c2 = Point::new(seg[2], seg[3]) + base;
                    let to = Point::new(seg[4], seg[5]) + base;
                    out.curve_to(c1, c2, to);
                    last_cubic_ctrl = Some(c2);
                    cur = to;
                }
                last_quad_ctrl = None;
            }
            Command::SmoothCubicCurve(pos, params) => {
                let p = take(params, 4)?;
                for seg in p.chunks_exact(4) {
                    let base = rel_base(*pos, cur);
                    let c1 = reflect(cur, last_cubic_ctrl);
                    let c2 = Point::new(seg[0], seg[1]) + base;
                    let to = Point::new(seg[2], seg[3]) + base;
                    out.curve_to(c1, c2, to);
                    last_cubic_ctrl = Some(c2);
                    cur = to;
                }
                last_quad_ctrl = None;
            }
            Command::QuadraticCurve(pos, params) => {
                let p = take(params, 4)?;
                for seg in p.chunks_exact(4) {
                    let base = rel_base(*pos, cur);
                    let c = Point::new(seg[0], seg[1]) + base;
                    let to = Point::new(seg[2], seg[3]) + base;
                    out.quad_to(c, to);
                    last_quad_ctrl = Some(c);
                    cur = to;
                }
                last_cubic_ctrl = None;
            }
            Command::SmoothQuadraticCurve(pos, params) => {
                let p = take(params, 2)?;
                for seg in p.chunks_exact(2) {
                    let base = rel_base(*pos, cur);
                    let c = reflect(cur, last_quad_ctrl);
                    let to = Point::new(seg[0], seg[1]) + base;
                    out.quad_to(c, to);
                    last_quad_ctrl = Some(c);
                    cur = to;
                }
                last_cubic_ctrl = None;
            }
            Command::EllipticalArc(pos, params) => {
                let p = take(params, 7)?;
                for seg in p.chunks_exact(7) {
                    let base = rel_base(*pos, cur);
                    let to = Point::new(seg[5], seg[6]) + base;
                    append_arc(out, cur, to, seg[0], seg[1], seg[2], seg[3] != 0.0, seg[4] != 0.0);
                    cur = to;
                }
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            Command::Close => {
                out.close_path();
                cur = start;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
        }
    }
    Ok(())
}

/// Validate parameter count and widen to f64.
fn take(params: &[f32], group: usize) -> Result<Vec<f64>, OutlineError> {
    if params.is_empty() || params.len() % group != 0 {
        return Err(OutlineError::Parse(format!(
            "path command expects parameter groups of {group}, got {} values",
            params.len()
        )));
    }
    Ok(params.iter().map(|v| f64::from(*v)).collect())
}

const fn rel_base(pos: Position, cur: Point) -> Vec2 {
    match pos {
        Position::Absolute => Vec2::new(0.0, 0.0),
        Position::Relative => Vec2::new(cur.x, cur.y),
    }
}

/// Reflection of the previous control point across the current point,
/// falling back to the current point when the previous command set none.
fn reflect(cur: Point, prev_ctrl: Option<Point>) -> Point {
    match prev_ctrl {
        Some(c) => Point::new(2.0 * cur.x - c.x, 2.0 * cur.y - c.y),
        None => cur,
    }
}

/// Append an elliptical arc as cubic segments.
fn append_arc(
    out: &mut BezPath,
    from: Point,
    to: Point,
    rx: f64,
    ry: f64,
    x_rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
) {
    let svg_arc = SvgArc {
        from,
        to,
        radii: Vec2::new(rx.abs(), ry.abs()),
        x_rotation: x_rotation_deg.to_radians(),
        large_arc,
        sweep,
    };
    match Arc::from_svg_arc(&svg_arc) {
        Some(arc) => {
            arc.to_cubic_beziers(0.1, |c1, c2, p| {
                out.curve_to(c1, c2, p);
            });
        }
        // Degenerate arc (zero radius or coincident endpoints).
        None => {
            out.line_to(to);
        }
    }
}

// ---------------------------------------------------------------------------
// Transform attribute
// ---------------------------------------------------------------------------

/// Parse an SVG `transform` attribute into an [`Affine`].
///
/// Supports `matrix`, `translate`, `scale`, `rotate`, `skewX`, `skewY`;
/// multiple operations compose left to right.
fn parse_transform(value: Option<&str>) -> Result<Affine, OutlineError> {
    let Some(value) = value else {
        return Ok(Affine::IDENTITY);
    };

    let mut result = Affine::IDENTITY;
    for op in value.split(')') {
        let op = op.trim().trim_start_matches(',').trim();
        if op.is_empty() {
            continue;
        }
        let (name, args) = op
            .split_once('(')
            .ok_or_else(|| OutlineError::Parse(format!("malformed transform: {op}")))?;
        let nums: Vec<f64> = args
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .map_err(|_| OutlineError::Parse(format!("transform number: {s}")))
            })
            .collect::<Result<_, _>>()?;

        let t = match (name.trim(), nums.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
            ("translate", [tx]) => Affine::translate((*tx, 0.0)),
            ("translate", [tx, ty]) => Affine::translate((*tx, *ty)),
            ("scale", [s]) => Affine::scale(*s),
            ("scale", [sx, sy]) => Affine::scale_non_uniform(*sx, *sy),
            ("rotate", [deg]) => Affine::rotate(deg.to_radians()),
            ("rotate", [deg, cx, cy]) => {
                Affine::translate((*cx, *cy))
                    * Affine::rotate(deg.to_radians())
                    * Affine::translate((-cx, -cy))
            }
            ("skewX", [deg]) => Affine::new([1.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0]),
            ("skewY", [deg]) => Affine::new([1.0, deg.to_radians().tan(), 0.0, 1.0, 0.0, 0.0]),
            _ => {
                return Err(OutlineError::Parse(format!(
                    "unsupported transform: {name}"
                )))
            }
        };
        result = result * t;
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// True if the path contains anything beyond bare move commands.
fn has_drawable(path: &BezPath) -> bool {
    use kurbo::PathEl;
    path.elements().iter().any(|el| {
        matches!(
            el,
            PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..)
        )
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: EmBox = EmBox::new(512.0, 448.0, 64.0);

    fn bbox(path: &BezPath) -> Rect {
        path.bounding_box()
    }

    #[test]
    fn square_path_fills_em() {
        let svg = r#"<svg viewBox="0 0 16 16"><path d="M0 0 L16 0 L16 16 L0 16 Z"/></svg>"#;
        let path = import_str(svg, BOX).expect("import square");
        let bb = bbox(&path);
        assert!((bb.width() - 512.0).abs() < 1e-6, "width: {}", bb.width());
        // Top of the viewport → ascent, bottom → -descent.
        assert!((bb.max_y() - 448.0).abs() < 1e-6, "max_y: {}", bb.max_y());
        assert!((bb.min_y() + 64.0).abs() < 1e-6, "min_y: {}", bb.min_y());
    }

    #[test]
    fn y_axis_is_flipped() {
        // A path hugging the viewport top should land at the ascent.
        let svg = r#"<svg viewBox="0 0 16 16"><path d="M0 0 L16 0 L16 1 L0 1 Z"/></svg>"#;
        let path = import_str(svg, BOX).expect("import strip");
        let bb = bbox(&path);
        assert!(bb.max_y() > 400.0, "top strip should be near ascent: {bb:?}");
    }

    #[test]
    fn width_height_viewport_fallback() {
        let svg = r#"<svg width="16px" height="16px"><path d="M0 0 L16 16 L0 16 Z"/></svg>"#;
        let path = import_str(svg, BOX).expect("import with width/height");
        assert!((bbox(&path).width() - 512.0).abs() < 1e-6);
    }

    #[test]
    fn relative_commands_match_absolute() {
        let abs = import_str(
            r#"<svg viewBox="0 0 10 10"><path d="M1 1 L9 1 L9 9 Z"/></svg>"#,
            BOX,
        )
        .expect("absolute");
        let rel = import_str(
            r#"<svg viewBox="0 0 10 10"><path d="M1 1 l8 0 l0 8 z"/></svg>"#,
            BOX,
        )
        .expect("relative");
        let (a, b) = (bbox(&abs), bbox(&rel));
        assert!((a.x0 - b.x0).abs() < 1e-6 && (a.y1 - b.y1).abs() < 1e-6);
    }

    #[test]
    fn basic_shapes_are_collected() {
        let svg = r#"<svg viewBox="0 0 10 10">
            <rect x="1" y="1" width="4" height="4"/>
            <circle cx="7" cy="7" r="2"/>
        </svg>"#;
        let path = import_str(svg, BOX).expect("import shapes");
        assert!(has_drawable(&path));
    }

    #[test]
    fn group_transform_applies() {
        let plain = import_str(
            r#"<svg viewBox="0 0 10 10"><path d="M0 0 L2 0 L2 2 Z"/></svg>"#,
            BOX,
        )
        .expect("plain");
        let shifted = import_str(
            r#"<svg viewBox="0 0 10 10"><g transform="translate(4 0)"><path d="M0 0 L2 0 L2 2 Z"/></g></svg>"#,
            BOX,
        )
        .expect("shifted");
        let dx = bbox(&shifted).x0 - bbox(&plain).x0;
        // 4 viewport units at scale 51.2.
        assert!((dx - 204.8).abs() < 1e-6, "dx = {dx}");
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = import_str(r#"<svg viewBox="0 0 10 10"></svg>"#, BOX)
            .expect_err("no geometry must fail");
        assert!(matches!(err, OutlineError::Empty), "got: {err}");
    }

    #[test]
    fn malformed_path_data_is_parse_error() {
        let err = import_str(
            r#"<svg viewBox="0 0 10 10"><path d="M 1"/></svg>"#,
            BOX,
        )
        .expect_err("odd parameter count must fail");
        assert!(matches!(err, OutlineError::Parse(_)), "got: {err}");
    }

    #[test]
    fn smooth_cubic_reflection() {
        // S after C must not panic and must extend the path.
        let svg = r#"<svg viewBox="0 0 10 10"><path d="M0 5 C2 0 4 0 5 5 S8 10 10 5"/></svg>"#;
        let path = import_str(svg, BOX).expect("smooth curves");
        assert!(has_drawable(&path));
    }
}
