//! Region-based PDF text clipping using lopdf
//!
//! This crate provides:
//! - Positioned word extraction from PDF content streams
//! - Remapping between a scaled preview and PDF page coordinates
//! - A segmentation heuristic that splits leading line-item numbers
//!   from body text based on a learned left margin
//! - Two-column spreadsheet output
//!
//! The `pdf2sheet` binary puts a GUI on top: draw a rectangle on a page
//! preview, pick a page range, and convert the region to a spreadsheet.

pub mod extractor;
pub mod probe;
pub mod region;
pub mod segment;
pub mod sheet;
pub mod tounicode;

pub use extractor::{extract_words, extract_words_mem, PageWords, Word};
pub use region::{PreviewMap, Rect};
pub use segment::{Segmented, Segmenter};
pub use sheet::{rows_from_segments, write_csv, Row};

use lopdf::Document;
use rayon::prelude::*;
use std::path::Path;

/// Options for a region clipping run
#[derive(Debug, Clone)]
pub struct ClipOptions {
    /// First page to clip (1-indexed, inclusive)
    pub first_page: u32,
    /// Last page to clip (1-indexed, inclusive)
    pub last_page: u32,
    /// Selection rectangle in PDF page coordinates
    pub region: Rect,
}

/// Result of a region clipping run
#[derive(Debug)]
pub struct ClipResult {
    /// Extracted rows (line-item number, body text)
    pub rows: Vec<Row>,
    /// Number of pages processed
    pub pages_processed: u32,
    /// Pages in the range that had no text operators at all
    pub pages_without_text: Vec<u32>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Clip a region from a page range of a PDF file into rows
///
/// This function will:
/// 1. Validate the page range against the document's page count
/// 2. Probe the selected pages for a text layer (scanned pages have none)
/// 3. Extract positioned words per page, clip them to the region, and run
///    the number/body segmenter across the whole range
pub fn clip_region<P: AsRef<Path>>(path: P, options: &ClipOptions) -> Result<ClipResult, PdfError> {
    let doc = Document::load(path)?;
    clip_region_from_doc(&doc, options)
}

/// Clip a region from a PDF held in memory
pub fn clip_region_mem(buffer: &[u8], options: &ClipOptions) -> Result<ClipResult, PdfError> {
    let doc = Document::load_mem(buffer)?;
    clip_region_from_doc(&doc, options)
}

/// Internal clipping logic on a loaded document
fn clip_region_from_doc(doc: &Document, options: &ClipOptions) -> Result<ClipResult, PdfError> {
    let start = std::time::Instant::now();

    if doc.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    let pages = doc.get_pages();
    let page_count = pages.len() as u32;

    let (first, last) = (options.first_page, options.last_page);
    if first > last {
        return Err(PdfError::InvertedRange { first, last });
    }
    if first < 1 || last > page_count {
        return Err(PdfError::PageRange {
            first,
            last,
            page_count,
        });
    }

    // Probe before extracting: a scanned range should be a clear error,
    // not an empty spreadsheet.
    let probes = probe::probe_pages(doc, first, last);
    let pages_without_text: Vec<u32> = probes
        .iter()
        .filter(|p| !p.has_text())
        .map(|p| p.page)
        .collect();
    if pages_without_text.len() == probes.len() {
        return Err(PdfError::NoTextLayer(pages_without_text));
    }
    for page in &pages_without_text {
        log::warn!("page {} has no text operators, skipping", page);
    }

    let page_ids: Vec<(u32, lopdf::ObjectId)> = (first..=last)
        .filter_map(|n| pages.get(&n).map(|&id| (n, id)))
        .collect();

    let page_words: Vec<PageWords> = page_ids
        .par_iter()
        .map(|&(page_num, page_id)| extractor::extract_page_words(doc, page_id, page_num))
        .collect::<Result<Vec<_>, _>>()?;

    // One segmenter spans the whole range: the left margin is learned once
    // and the in-progress item carries across page breaks.
    let mut segmenter = Segmenter::new();
    for page in &page_words {
        for word in page
            .words
            .iter()
            .filter(|w| options.region.contains(w.x0, w.y))
        {
            segmenter.push(&word.text, word.x0, word.x1);
        }
    }
    let segmented = segmenter.finish();
    let rows = rows_from_segments(&segmented);

    log::info!(
        "clipped {} rows from pages {}-{} in {}ms",
        rows.len(),
        first,
        last,
        start.elapsed().as_millis()
    );

    Ok(ClipResult {
        rows,
        pages_processed: page_words.len() as u32,
        pages_without_text,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("page range {first}-{last} is outside the document (1-{page_count})")]
    PageRange { first: u32, last: u32, page_count: u32 },
    #[error("start page {first} is after end page {last}")]
    InvertedRange { first: u32, last: u32 },
    #[error("no text layer found on pages {0:?} (scanned document?)")]
    NoTextLayer(Vec<u32>),
    #[error("spreadsheet write error: {0}")]
    Sheet(#[from] csv::Error),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}
