//! Text-layer probe for a page range
//!
//! Scans content streams for text-show operators without running the full
//! extractor, so a scanned page can be reported up front instead of
//! producing an empty spreadsheet.

use lopdf::{Document, Object, ObjectId};

/// Per-page probe result
#[derive(Debug, Clone)]
pub struct PageProbe {
    /// Page number (1-indexed)
    pub page: u32,
    /// Count of Tj/TJ show operators found
    pub text_ops: u32,
    /// Whether image placement (Do) was seen
    pub has_images: bool,
}

impl PageProbe {
    /// Whether the page has any extractable text at all
    pub fn has_text(&self) -> bool {
        self.text_ops > 0
    }
}

/// Probe each page of an inclusive 1-indexed range
///
/// Pages missing from the page tree are skipped.
pub fn probe_pages(doc: &Document, first_page: u32, last_page: u32) -> Vec<PageProbe> {
    let pages = doc.get_pages();

    (first_page..=last_page)
        .filter_map(|page| {
            pages
                .get(&page)
                .map(|&page_id| probe_page(doc, page_id, page))
        })
        .collect()
}

/// Probe a single page's content streams
fn probe_page(doc: &Document, page_id: ObjectId, page: u32) -> PageProbe {
    let mut text_ops = 0u32;
    let mut has_images = false;

    for content_id in doc.get_page_contents(page_id) {
        if let Ok(Object::Stream(stream)) = doc.get_object(content_id) {
            let content = match stream.decompressed_content() {
                Ok(data) => data,
                Err(_) => stream.content.clone(),
            };
            let (ops, imgs) = scan_for_show_operators(&content);
            text_ops += ops;
            has_images = has_images || imgs;
        }
    }

    PageProbe {
        page,
        text_ops,
        has_images,
    }
}

/// Fast byte scan for text-show (Tj/TJ) and image placement (Do) operators
fn scan_for_show_operators(content: &[u8]) -> (u32, bool) {
    let mut text_ops = 0u32;
    let mut has_images = false;

    for (i, &b) in content.iter().enumerate() {
        let boundary =
            |idx: usize| idx >= content.len() || content[idx].is_ascii_whitespace();

        if b == b'T' {
            if let Some(&next) = content.get(i + 1) {
                if (next == b'j' || next == b'J') && boundary(i + 2) {
                    text_ops += 1;
                }
            }
        }

        if b == b'D' && content.get(i + 1) == Some(&b'o') && boundary(i + 2) {
            has_images = true;
        }
    }

    (text_ops, has_images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_show_operators() {
        let content = b"BT /F1 12 Tf 100 700 Td (Hello World) Tj ET";
        let (ops, imgs) = scan_for_show_operators(content);
        assert_eq!(ops, 1);
        assert!(!imgs);

        let content2 = b"BT /F1 12 Tf 100 700 Td [(H) 10 (ello)] TJ ET";
        let (ops2, _) = scan_for_show_operators(content2);
        assert_eq!(ops2, 1);

        let content3 = b"q 100 0 0 100 50 700 cm /Img1 Do Q";
        let (ops3, imgs3) = scan_for_show_operators(content3);
        assert_eq!(ops3, 0);
        assert!(imgs3);
    }

    #[test]
    fn test_operator_needs_boundary() {
        // "TJunk" is not a show operator
        let (ops, _) = scan_for_show_operators(b"TJunk");
        assert_eq!(ops, 0);
    }
}
