//! Table extraction from PDF documents.
//!
//! Each page's content stream is decoded with `lopdf` and every text run is
//! placed at the position the text operators move it to, mapped through the
//! graphics state's transformation matrix. Runs sharing a baseline form a
//! line; lines with at least two runs are treated as table rows. Columns are
//! anchored on the first row found (the header).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Baselines closer than this (in PDF units) belong to the same line.
const LINE_TOLERANCE: f32 = 2.0;

/// `TJ` kerning at or below this value is read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Page tree depth searched for inherited resources.
const MAX_TREE_DEPTH: usize = 32;

/// A piece of text drawn at a single position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Extract the table rows of every page, concatenated in page order.
///
/// The first row is the header; cells are `None` where a row has nothing in
/// that column.
pub fn extract_rows(path: &Path) -> Result<Vec<Vec<Option<String>>>> {
    let document = Document::load(path).context("opening PDF document")?;

    let mut lines = Vec::new();
    for (page_no, page_id) in document.get_pages() {
        let data = document
            .get_page_content(page_id)
            .with_context(|| format!("reading content of page {page_no}"))?;
        let fonts = page_fonts(&document, page_id);
        let runs =
            text_runs(&data, &fonts).with_context(|| format!("decoding page {page_no}"))?;
        let page_lines: Vec<Vec<TextRun>> = group_lines(runs)
            .into_iter()
            .filter(|line| line.len() >= 2)
            .collect();
        log::debug!("page {page_no}: {} table line(s)", page_lines.len());
        lines.extend(page_lines);
    }

    Ok(rows_from_lines(lines))
}

// ---------------------------------------------------------------------------
// Fonts → text decoding
// ---------------------------------------------------------------------------

/// Simple font without a `ToUnicode` map, used when no font is selected.
static LATIN1: FontDecoder = FontDecoder {
    two_byte: false,
    to_unicode: None,
};

/// Font resources of one page, keyed by the name `Tf` selects them with.
pub type PageFonts = BTreeMap<Vec<u8>, FontDecoder>;

/// Turns the bytes of a shown string into text for one font.
///
/// Composite (`Type0`) fonts read two-byte codes. A `ToUnicode` map, when the
/// font has one, takes precedence over the byte values themselves.
#[derive(Debug, Clone)]
pub struct FontDecoder {
    two_byte: bool,
    to_unicode: Option<BTreeMap<u32, String>>,
}

impl FontDecoder {
    fn from_font(document: &Document, font: &Dictionary) -> Self {
        let two_byte = font
            .get(b"Subtype")
            .and_then(|subtype| subtype.as_name())
            .is_ok_and(|name| name == b"Type0");
        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| document.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_stream().ok())
            .map(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                parse_to_unicode(&data)
            });
        FontDecoder {
            two_byte,
            to_unicode,
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let Some(map) = &self.to_unicode else {
            return decode_bytes(bytes);
        };
        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks_exact(2)
                .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        };
        let mut text = String::new();
        for code in codes {
            match map.get(&code) {
                Some(mapped) => text.push_str(mapped),
                None if !self.two_byte => text.push(char::from(code as u8)),
                None => text.push(char::REPLACEMENT_CHARACTER),
            }
        }
        text
    }
}

/// Collect the decoders for the fonts a page can select.
///
/// Resources are looked up on the page first, then up the page tree.
fn page_fonts(document: &Document, page_id: ObjectId) -> PageFonts {
    let Some(fonts) = page_resources(document, page_id)
        .and_then(|resources| resources.get(b"Font").ok())
        .and_then(|fonts| document.dereference(fonts).ok())
        .and_then(|(_, fonts)| fonts.as_dict().ok())
    else {
        return PageFonts::new();
    };

    fonts
        .iter()
        .filter_map(|(name, font)| {
            let (_, font) = document.dereference(font).ok()?;
            let font = font.as_dict().ok()?;
            Some((name.clone(), FontDecoder::from_font(document, font)))
        })
        .collect()
}

fn page_resources(document: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return document.dereference(resources).ok()?.1.as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

// ---------------------------------------------------------------------------
// ToUnicode CMaps
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn cmap_tokens(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => {
                tokens.push(CMapToken::Word("<<".into()));
                i += 2;
            }
            b'>' if data.get(i + 1) == Some(&b'>') => {
                tokens.push(CMapToken::Word(">>".into()));
                i += 2;
            }
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| start + p);
                tokens.push(CMapToken::Hex(hex_bytes(&data[start..end])));
                i = end + 1;
            }
            b'(' => {
                // Literal strings only name things here; skip them.
                let mut depth = 0;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !b"<>[]()%".contains(&data[i])
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                tokens.push(CMapToken::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let mut nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&d| char::from(d).to_digit(16))
        .map(|n| n as u8)
        .collect();
    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }
    nibbles.chunks_exact(2).map(|p| p[0] << 4 | p[1]).collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().take(4).fold(0, |acc, &b| acc << 8 | u32::from(b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Destination of `offset` within a `bfrange` that starts at `base`.
fn utf16_offset(base: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = base
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

/// Read the `bfchar` and `bfrange` sections of a `ToUnicode` CMap.
pub fn parse_to_unicode(data: &[u8]) -> BTreeMap<u32, String> {
    let tokens = cmap_tokens(data);
    let mut map = BTreeMap::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            CMapToken::Word(word) if word == "beginbfchar" => {
                i += 1;
                while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    map.insert(code_of(src), utf16_text(dst));
                    i += 2;
                }
            }
            CMapToken::Word(word) if word == "beginbfrange" => {
                i += 1;
                while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    i += 2;
                    match tokens.get(i) {
                        Some(CMapToken::Hex(base)) if hi >= lo && hi - lo <= 0xFFFF => {
                            for offset in 0..=hi - lo {
                                map.insert(lo + offset, utf16_offset(base, offset));
                            }
                            i += 1;
                        }
                        Some(CMapToken::ArrayStart) => {
                            i += 1;
                            let mut code = lo;
                            while let Some(CMapToken::Hex(dst)) = tokens.get(i) {
                                if code <= hi {
                                    map.insert(code, utf16_text(dst));
                                }
                                code += 1;
                                i += 1;
                            }
                            if tokens.get(i) == Some(&CMapToken::ArrayEnd) {
                                i += 1;
                            }
                        }
                        _ => i += 1,
                    }
                }
            }
            _ => i += 1,
        }
    }
    map
}

// ---------------------------------------------------------------------------
// Content stream → positioned text runs
// ---------------------------------------------------------------------------

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(self, tx: f32, ty: f32) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        Matrix([a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d])
    }

    /// `self × other`: apply `self` first, then `other`.
    fn multiply(self, other: Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

struct TextState<'a> {
    fonts: &'a PageFonts,
    font: Option<Vec<u8>>,
    /// Current transformation matrix and the `q`/`Q` stack of saved ones.
    ctm: Matrix,
    saved: Vec<Matrix>,
    line: Matrix,
    leading: f32,
    runs: Vec<TextRun>,
}

impl<'a> TextState<'a> {
    fn new(fonts: &'a PageFonts) -> Self {
        TextState {
            fonts,
            font: None,
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            line: Matrix::IDENTITY,
            leading: 0.0,
            runs: Vec::new(),
        }
    }

    fn next_line(&mut self) {
        self.line = self.line.translate(0.0, -self.leading);
    }

    fn decoder(&self) -> &'a FontDecoder {
        let fonts: &'a PageFonts = self.fonts;
        self.font
            .as_ref()
            .and_then(|name| fonts.get(name))
            .unwrap_or(&LATIN1)
    }

    fn show(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let [.., e, f] = self.line.0;
        let (x, y) = self.ctm.apply(e, f);
        // Consecutive shows without repositioning continue the same run.
        if let Some(last) = self.runs.last_mut() {
            if last.x == x && last.y == y {
                last.text.push_str(&text);
                return;
            }
        }
        self.runs.push(TextRun { text, x, y });
    }
}

/// Decode a page content stream into positioned text runs.
///
/// Strings are decoded with the font `Tf` selected from `fonts`; unknown or
/// unselected fonts read bytes as Latin-1.
pub fn text_runs(content: &[u8], fonts: &PageFonts) -> Result<Vec<TextRun>> {
    let content = Content::decode(content).context("parsing content stream")?;
    let mut state = TextState::new(fonts);

    for op in &content.operations {
        let nums: Vec<f32> = op.operands.iter().filter_map(number).collect();
        match op.operator.as_str() {
            "q" => state.saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" if nums.len() >= 6 => {
                let m = Matrix([nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]]);
                state.ctm = m.multiply(state.ctm);
            }
            "BT" => state.line = Matrix::IDENTITY,
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    state.font = Some(name.clone());
                }
            }
            "Td" if nums.len() >= 2 => state.line = state.line.translate(nums[0], nums[1]),
            "TD" if nums.len() >= 2 => {
                state.leading = -nums[1];
                state.line = state.line.translate(nums[0], nums[1]);
            }
            "Tm" if nums.len() >= 6 => {
                state.line = Matrix([nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]]);
            }
            "TL" if !nums.is_empty() => state.leading = nums[0],
            "T*" => state.next_line(),
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    state.next_line();
                }
                let operand = if op.operator == "\"" { 2 } else { 0 };
                let decoder = state.decoder();
                if let Some(text) = op.operands.get(operand).and_then(|o| string(o, decoder)) {
                    state.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let text = tj_text(items, state.decoder());
                    state.show(text);
                }
            }
            _ => {}
        }
    }

    Ok(state.runs)
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn string(obj: &Object, font: &FontDecoder) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(font.decode(bytes)),
        _ => None,
    }
}

fn tj_text(items: &[Object], font: &FontDecoder) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&font.decode(bytes)),
            other => {
                if number(other).is_some_and(|n| n <= TJ_SPACE_THRESHOLD) {
                    text.push(' ');
                }
            }
        }
    }
    text
}

/// UTF-16BE when the string carries a byte-order mark, Latin-1 otherwise.
fn decode_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16_text(rest);
    }
    bytes.iter().map(|&b| b as char).collect()
}


// ---------------------------------------------------------------------------
// Runs → lines → rows
// ---------------------------------------------------------------------------

/// Group runs into lines, top of the page first, each line left to right.
pub fn group_lines(mut runs: Vec<TextRun>) -> Vec<Vec<TextRun>> {
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    for run in runs {
        match lines.last_mut() {
            Some(line) if (line[0].y - run.y).abs() <= LINE_TOLERANCE => line.push(run),
            _ => lines.push(vec![run]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

/// Lay lines out on the header's columns.
///
/// Every run is assigned to the header column whose x is closest. Runs that
/// land in the same column are joined with a space.
pub fn rows_from_lines(lines: Vec<Vec<TextRun>>) -> Vec<Vec<Option<String>>> {
    let Some(header) = lines.first() else {
        return Vec::new();
    };
    let anchors: Vec<f32> = header.iter().map(|run| run.x).collect();

    lines
        .iter()
        .map(|line| {
            let mut cells: Vec<Option<String>> = vec![None; anchors.len()];
            for run in line {
                let column = nearest(&anchors, run.x);
                let text = run.text.trim();
                if let Some(existing) = &mut cells[column] {
                    existing.push(' ');
                    existing.push_str(text);
                } else {
                    cells[column] = Some(text.to_string());
                }
            }
            cells
        })
        .collect()
}

fn nearest(anchors: &[f32], x: f32) -> usize {
    anchors
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
