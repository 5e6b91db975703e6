//! Debug tool: dump the extractor's positioned words for one page

use pdf_clipper::extract_words;
use std::env;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <pdf_file> [page]", args[0]);
        process::exit(1);
    }

    let pdf_path = &args[1];
    let page: u32 = args
        .get(2)
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);

    match extract_words(pdf_path, page, page) {
        Ok(pages) => {
            let Some(page_words) = pages.first() else {
                eprintln!("Page {} not found", page);
                process::exit(1);
            };
            println!(
                "Page {} ({}x{} pt), {} words:",
                page_words.page,
                page_words.width,
                page_words.height,
                page_words.words.len()
            );
            for word in &page_words.words {
                println!(
                    "  x0={:8.2} x1={:8.2} y={:8.2} size={:5.1} {:?}",
                    word.x0, word.x1, word.y, word.font_size, word.text
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
