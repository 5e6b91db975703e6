//! Positioned word extraction from PDF content streams
//!
//! Walks each page's content stream tracking the graphics and text state,
//! decodes show-operator strings through font encodings and ToUnicode CMaps,
//! and splits the decoded runs into words with estimated left/right edges.
//! The segmentation heuristic keys off those edges.

use crate::tounicode::{font_cmap, ToUnicodeMap};
use crate::PdfError;
use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;
use std::path::Path;

/// A single word with position information
///
/// Coordinates are PDF page points, origin at the bottom-left. `x1` is an
/// estimate: glyph widths are approximated from the font size, not measured
/// from font metrics.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word text (no surrounding whitespace)
    pub text: String,
    /// Left edge
    pub x0: f32,
    /// Estimated right edge
    pub x1: f32,
    /// Baseline y
    pub y: f32,
    /// Approximate glyph height (effective font size)
    pub height: f32,
    /// Effective font size after the text matrix scale
    pub font_size: f32,
    /// Page number (1-indexed)
    pub page: u32,
}

/// All words of one page, in reading order, plus the page's native size
#[derive(Debug, Clone)]
pub struct PageWords {
    pub page: u32,
    /// Page width in points (from MediaBox)
    pub width: f32,
    /// Page height in points (from MediaBox)
    pub height: f32,
    pub words: Vec<Word>,
}

/// Extract positioned words for a page range from a PDF file
///
/// Pages are 1-indexed and inclusive. Pages missing from the page tree are
/// skipped; range validation belongs to the caller.
pub fn extract_words<P: AsRef<Path>>(
    path: P,
    first_page: u32,
    last_page: u32,
) -> Result<Vec<PageWords>, PdfError> {
    let doc = Document::load(path)?;
    extract_words_from_doc(&doc, first_page, last_page)
}

/// Extract positioned words for a page range from a memory buffer
pub fn extract_words_mem(
    buffer: &[u8],
    first_page: u32,
    last_page: u32,
) -> Result<Vec<PageWords>, PdfError> {
    let doc = Document::load_mem(buffer)?;
    extract_words_from_doc(&doc, first_page, last_page)
}

fn extract_words_from_doc(
    doc: &Document,
    first_page: u32,
    last_page: u32,
) -> Result<Vec<PageWords>, PdfError> {
    let pages = doc.get_pages();
    let mut out = Vec::new();

    for page_num in first_page..=last_page {
        if let Some(&page_id) = pages.get(&page_num) {
            out.push(extract_page_words(doc, page_id, page_num)?);
        }
    }

    Ok(out)
}

/// Extract the ordered words of a single page
pub fn extract_page_words(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<PageWords, PdfError> {
    let (width, height) = page_size(doc, page_id);
    let runs = scan_page_runs(doc, page_id)?;

    let mut words = Vec::new();
    for run in &runs {
        split_run(run, page_num, &mut words);
    }

    Ok(PageWords {
        page: page_num,
        width,
        height,
        words: order_into_lines(words),
    })
}

/// A decoded show-operator run before word splitting
struct TextRun {
    text: String,
    x: f32,
    y: f32,
    size: f32,
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Walk a page's content stream and collect decoded text runs
fn scan_page_runs(doc: &Document, page_id: ObjectId) -> Result<Vec<TextRun>, PdfError> {
    use lopdf::content::Content;

    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    // ToUnicode CMaps and Type0 flags per font resource name, resolved once
    let mut cmaps: HashMap<String, ToUnicodeMap> = HashMap::new();
    let mut two_byte: HashMap<String, bool> = HashMap::new();
    for (name, &font_dict) in &fonts {
        let name = String::from_utf8_lossy(name).to_string();
        if let Some(cmap) = font_cmap(doc, font_dict) {
            cmaps.insert(name.clone(), cmap);
        }
        let is_type0 =
            matches!(font_dict.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Type0");
        two_byte.insert(name, is_type0);
    }

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let mut runs = Vec::new();

    // Graphics state
    let mut ctm = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut ctm_stack: Vec<[f32; 6]> = Vec::new();

    // Text state
    let mut current_font = String::new();
    let mut current_font_size: f32 = 12.0;
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    let push_run = |text: String,
                    text_matrix: &[f32; 6],
                    ctm: &[f32; 6],
                    font_size: f32,
                    runs: &mut Vec<TextRun>| {
        if text.trim().is_empty() {
            return;
        }
        let size = effective_font_size(font_size, text_matrix);
        let combined = multiply_matrices(text_matrix, ctm);
        runs.push(TextRun {
            text,
            x: combined[4],
            y: combined[5],
            size,
        });
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => {
                ctm_stack.push(ctm);
            }
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let new_matrix = [
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    ];
                    ctm = multiply_matrices(&new_matrix, &ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        current_font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        current_font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] =
                            get_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                // Approximate line height; TL leading is not tracked
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
            }
            "Tj" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Some(text) =
                        decode_operand(&op.operands[0], doc, &fonts, &cmaps, &two_byte, &current_font)
                    {
                        push_run(text, &text_matrix, &ctm, current_font_size, &mut runs);
                    }
                }
            }
            "TJ" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Ok(array) = op.operands[0].as_array() {
                        let mut combined_text = String::new();
                        for item in array {
                            if let Some(text) =
                                decode_operand(item, doc, &fonts, &cmaps, &two_byte, &current_font)
                            {
                                combined_text.push_str(&text);
                            }
                        }
                        push_run(combined_text, &text_matrix, &ctm, current_font_size, &mut runs);
                    }
                }
            }
            "'" | "\"" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
                // For `"` the string is the third operand after the two spacings
                let string_idx = if op.operator == "'" { 0 } else { 2 };
                if in_text_block {
                    if let Some(operand) = op.operands.get(string_idx) {
                        if let Some(text) =
                            decode_operand(operand, doc, &fonts, &cmaps, &two_byte, &current_font)
                        {
                            push_run(text, &text_matrix, &ctm, current_font_size, &mut runs);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and text matrix scale
fn effective_font_size(base_size: f32, text_matrix: &[f32; 6]) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a string operand through the font's ToUnicode CMap, its declared
/// encoding, then UTF-16BE / Latin-1 fallbacks
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &std::collections::BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    cmaps: &HashMap<String, ToUnicodeMap>,
    two_byte: &HashMap<String, bool>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    // Embedded ToUnicode CMap wins when it covers the string
    if let Some(cmap) = cmaps.get(current_font) {
        if two_byte.get(current_font).copied().unwrap_or(false) {
            return Some(cmap.decode_two_byte(bytes));
        }
        if let Some(text) = cmap.decode_single_byte(bytes) {
            return Some(text);
        }
    }

    // Declared font encoding
    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    // Latin-1 fallback
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Average glyph advance as a fraction of the font size
///
/// Word edges are estimates, not font metrics; the segmenter only needs to
/// know which side of the body margin a short numeric token ends on.
const CHAR_ADVANCE_FACTOR: f32 = 0.5;

/// Split a decoded run into whitespace-delimited words with estimated edges
fn split_run(run: &TextRun, page: u32, out: &mut Vec<Word>) {
    let advance = run.size * CHAR_ADVANCE_FACTOR;
    let mut col = 0usize;
    let mut start_col = 0usize;
    let mut buf = String::new();

    for ch in run.text.chars() {
        if ch.is_whitespace() {
            if !buf.is_empty() {
                push_word(&mut buf, start_col, advance, run, page, out);
            }
        } else {
            if buf.is_empty() {
                start_col = col;
            }
            buf.push(ch);
        }
        col += 1;
    }
    if !buf.is_empty() {
        push_word(&mut buf, start_col, advance, run, page, out);
    }
}

fn push_word(
    buf: &mut String,
    start_col: usize,
    advance: f32,
    run: &TextRun,
    page: u32,
    out: &mut Vec<Word>,
) {
    let len = buf.chars().count();
    let x0 = run.x + start_col as f32 * advance;
    out.push(Word {
        text: std::mem::take(buf),
        x0,
        x1: x0 + len as f32 * advance,
        y: run.y,
        height: run.size,
        font_size: run.size,
        page,
    });
}

/// Baseline distance below which two runs count as the same line
const LINE_Y_TOLERANCE: f32 = 3.0;

/// Order words into reading order
///
/// Preserves PDF stream order (which is typically reading order) between
/// lines; only consecutive words on the same baseline are grouped, then each
/// line is sorted left to right.
fn order_into_lines(words: Vec<Word>) -> Vec<Word> {
    let mut lines: Vec<(f32, Vec<Word>)> = Vec::new();

    for word in words {
        match lines.last_mut() {
            Some((y, line)) if (*y - word.y).abs() < LINE_Y_TOLERANCE => line.push(word),
            _ => lines.push((word.y, vec![word])),
        }
    }

    let mut ordered = Vec::new();
    for (_, mut line) in lines {
        line.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal));
        ordered.extend(line);
    }
    ordered
}

/// Page width/height in points from the MediaBox, walking Parent inheritance
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    match media_box(doc, page_id) {
        Some([x0, y0, x1, y1]) => (x1 - x0, y1 - y0),
        None => {
            log::warn!("page {:?} has no MediaBox, assuming US Letter", page_id);
            (612.0, 792.0)
        }
    }
}

fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let mut dict = doc.get_dictionary(page_id).ok()?;

    loop {
        if let Ok(obj) = dict.get(b"MediaBox") {
            let arr = match obj {
                Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
                _ => obj.as_array().ok()?,
            };
            if arr.len() < 4 {
                return None;
            }
            let mut bounds = [0f32; 4];
            for (i, value) in arr.iter().take(4).enumerate() {
                bounds[i] = get_number(value)?;
            }
            return Some(bounds);
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => {
                dict = doc.get_dictionary(*id).ok()?;
            }
            _ => return None,
        }
    }
}
