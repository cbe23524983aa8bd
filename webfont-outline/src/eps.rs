//! EPS outline reader.
//!
//! A minimal PostScript path interpreter covering the subset emitted by
//! common vector editors: an operand stack of numbers, the path operators
//! `moveto`/`lineto`/`curveto`/`closepath` (and their `r*` relative
//! forms), and the Adobe Illustrator single-letter abbreviations. Paint
//! and graphics-state operators are recognized only far enough to keep
//! the operand stack consistent; everything else clears the stack.
//!
//! The `%%BoundingBox` DSC comment defines the viewport. EPS coordinates
//! are already Y-up, so no flip is needed; the box top maps to the ascent
//! and the bottom to `-descent`.
//!
//! Files carrying a TIFF/WMF preview header (magic `C5 D0 D3 C6`) are
//! supported by extracting the embedded PostScript section.

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape};

use crate::error::OutlineError;
use crate::EmBox;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse EPS bytes into an outline scaled into `embox`.
pub fn import_bytes(data: &[u8], embox: EmBox) -> Result<BezPath, OutlineError> {
    let ps = postscript_section(data)?;
    let mut interp = Interpreter::new(ps);
    interp.run()?;

    if !has_drawable(&interp.path) {
        return Err(OutlineError::Empty);
    }

    let bb = match interp.bounding_box {
        Some(bb) if bb.height() > 0.0 => bb,
        _ => interp.path.bounding_box(),
    };
    if bb.height() <= 0.0 {
        return Err(OutlineError::Parse("bounding box has zero height".to_owned()));
    }

    let s = embox.em / bb.height();
    // Y-up already: box bottom → -descent, top → ascent.
    let map = Affine::new([s, 0.0, 0.0, s, -bb.x0 * s, -bb.y0 * s - embox.descent]);
    let mut path = interp.path;
    path.apply_affine(map);
    Ok(path)
}

/// Locate the PostScript text inside `data`, skipping a binary preview
/// header if present.
fn postscript_section(data: &[u8]) -> Result<&[u8], OutlineError> {
    const PREVIEW_MAGIC: [u8; 4] = [0xC5, 0xD0, 0xD3, 0xC6];

    if data.len() >= 12 && data[..4] == PREVIEW_MAGIC {
        let offset = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let length = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
        return data
            .get(offset..offset + length)
            .ok_or_else(|| OutlineError::Parse("truncated EPS preview header".to_owned()));
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

struct Interpreter<'a> {
    src: &'a [u8],
    pos: usize,
    /// Numeric operand stack.
    stack: Vec<f64>,
    path: BezPath,
    current: Point,
    bounding_box: Option<Rect>,
    /// Set once a sub-path is open, so stray draw operators before any
    /// moveto are reported instead of panicking.
    open: bool,
}

impl<'a> Interpreter<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            stack: Vec::new(),
            path: BezPath::new(),
            current: Point::ZERO,
            bounding_box: None,
            open: false,
        }
    }

    fn run(&mut self) -> Result<(), OutlineError> {
        while let Some(token) = self.next_token() {
            match token {
                Token::Number(n) => self.stack.push(n),
                Token::Name(name) => self.execute(name)?,
            }
        }
        Ok(())
    }

    // -- Tokenizer --

    fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            self.skip_whitespace();
            let c = *self.src.get(self.pos)?;
            match c {
                b'%' => self.skip_comment(),
                b'(' => self.skip_string(),
                // Procedure/array/dict delimiters: structure we do not
                // execute. Treated as stack noise.
                b'{' | b'}' | b'[' | b']' | b'<' | b'>' => {
                    self.pos += 1;
                    self.stack.clear();
                }
                b'/' => {
                    self.pos += 1;
                    self.read_word();
                }
                _ => {
                    let start = self.pos;
                    let word = self.read_word();
                    if word.is_empty() {
                        // Unrecognized single byte; skip it.
                        self.pos = start + 1;
                        continue;
                    }
                    let text = std::str::from_utf8(word).ok()?;
                    if let Ok(n) = text.parse::<f64>() {
                        return Some(Token::Number(n));
                    }
                    return Some(Token::Name(text));
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.src.get(self.pos) {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        let start = self.pos;
        while let Some(&c) = self.src.get(self.pos) {
            if c == b'\n' || c == b'\r' {
                break;
            }
            self.pos += 1;
        }
        if let Ok(comment) = std::str::from_utf8(&self.src[start..self.pos]) {
            if let Some(rest) = comment.strip_prefix("%%BoundingBox:") {
                let nums: Vec<f64> = rest
                    .split_whitespace()
                    .filter_map(|s| s.parse().ok())
                    .collect();
                if let [llx, lly, urx, ury] = nums[..] {
                    self.bounding_box = Some(Rect::new(llx, lly, urx, ury));
                }
            }
        }
    }

    /// Skip a parenthesized string, honoring nesting and `\` escapes.
    fn skip_string(&mut self) {
        let mut depth = 0u32;
        while let Some(&c) = self.src.get(self.pos) {
            self.pos += 1;
            match c {
                b'\\' => {
                    self.pos += 1;
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    fn read_word(&mut self) -> &'a [u8] {
        let start = self.pos;
        while let Some(&c) = self.src.get(self.pos) {
            if c.is_ascii_whitespace() || matches!(c, b'%' | b'(' | b'{' | b'}' | b'[' | b']' | b'/') {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    // -- Operators --

    fn execute(&mut self, name: &str) -> Result<(), OutlineError> {
        match name {
            "moveto" | "m" => {
                let [x, y] = self.operands(name)?;
                self.move_to(Point::new(x, y));
            }
            "rmoveto" => {
                let [dx, dy] = self.operands(name)?;
                self.move_to(self.current + kurbo::Vec2::new(dx, dy));
            }
            "lineto" | "l" | "L" => {
                let [x, y] = self.operands(name)?;
                self.line_to(Point::new(x, y))?;
            }
            "rlineto" => {
                let [dx, dy] = self.operands(name)?;
                self.line_to(self.current + kurbo::Vec2::new(dx, dy))?;
            }
            "curveto" | "c" | "C" => {
                let [x1, y1, x2, y2, x3, y3] = self.operands(name)?;
                self.curve_to(
                    Point::new(x1, y1),
                    Point::new(x2, y2),
                    Point::new(x3, y3),
                )?;
            }
            "rcurveto" => {
                let [x1, y1, x2, y2, x3, y3] = self.operands(name)?;
                let base = self.current.to_vec2();
                self.curve_to(
                    Point::new(x1, y1) + base,
                    Point::new(x2, y2) + base,
                    Point::new(x3, y3) + base,
                )?;
            }
            // Illustrator: first control point coincides with the current point.
            "v" | "V" => {
                let [x2, y2, x3, y3] = self.operands(name)?;
                self.curve_to(self.current, Point::new(x2, y2), Point::new(x3, y3))?;
            }
            // Illustrator: second control point coincides with the endpoint.
            "y" | "Y" => {
                let [x1, y1, x3, y3] = self.operands(name)?;
                self.curve_to(Point::new(x1, y1), Point::new(x3, y3), Point::new(x3, y3))?;
            }
            "closepath" | "h" | "H" => self.close(),
            // `s`/`S` and `b`/`B` close before painting.
            "s" | "S" | "b" | "B" => self.close(),
            // Paint and path-reset operators: the path is kept (a glyph is
            // the union of everything drawn), only the stack resets.
            "fill" | "eofill" | "stroke" | "f" | "F" | "n" | "N" | "newpath" | "showpage" => {}
            // Anything else: a graphics-state or unknown operator. Its
            // operands are whatever is left on the stack.
            _ => {}
        }
        self.stack.clear();
        Ok(())
    }

    /// Pop the trailing `N` operands for an operator.
    fn operands<const N: usize>(&mut self, op: &str) -> Result<[f64; N], OutlineError> {
        if self.stack.len() < N {
            return Err(OutlineError::Parse(format!(
                "operator `{op}` needs {N} operands, stack has {}",
                self.stack.len()
            )));
        }
        let mut out = [0.0; N];
        let at = self.stack.len() - N;
        out.copy_from_slice(&self.stack[at..]);
        self.stack.truncate(at);
        Ok(out)
    }

    fn move_to(&mut self, p: Point) {
        self.path.move_to(p);
        self.current = p;
        self.open = true;
    }

    fn line_to(&mut self, p: Point) -> Result<(), OutlineError> {
        self.require_open("lineto")?;
        self.path.line_to(p);
        self.current = p;
        Ok(())
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point) -> Result<(), OutlineError> {
        self.require_open("curveto")?;
        self.path.curve_to(c1, c2, p);
        self.current = p;
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.path.close_path();
        }
    }

    fn require_open(&self, op: &str) -> Result<(), OutlineError> {
        if self.open {
            Ok(())
        } else {
            Err(OutlineError::Parse(format!("`{op}` before any moveto")))
        }
    }
}

enum Token<'a> {
    Number(f64),
    Name(&'a str),
}

/// True if the path contains anything beyond bare move commands.
fn has_drawable(path: &BezPath) -> bool {
    path.elements()
        .iter()
        .any(|el| matches!(el, PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
