//! Numeric / body-text segmentation
//!
//! Splits a stream of words in reading order into two columns: line-item
//! numbers and body text. A word is only accepted as an item number when its
//! right edge sits left of the body text's left margin; the margin is
//! learned from the first non-numeric word seen. Numbers that occur inside
//! the running text (years, amounts) fail that test and stay in the body.
//!
//! One `Segmenter` is fed the words of the whole page range so the learned
//! margin and the in-progress item carry across page breaks.

/// The two accumulated columns, one line per item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmented {
    /// Newline-separated item numbers
    pub numbers: String,
    /// Newline-separated body text, aligned with `numbers`
    pub body: String,
}

/// Streaming state machine over words in reading order
#[derive(Debug, Default)]
pub struct Segmenter {
    numbers: String,
    body: String,
    /// Left edge of the first non-numeric word; the body-text margin
    margin: Option<f32>,
    seen_first_number: bool,
    prev_was_number: bool,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one word with its left and right edges in page coordinates
    pub fn push(&mut self, text: &str, x0: f32, x1: f32) {
        if is_numeric_token(text) {
            if !self.seen_first_number {
                // The very first number opens the first item unconditionally
                self.seen_first_number = true;
                self.numbers.push_str(text);
                self.prev_was_number = true;
            } else if matches!(self.margin, Some(margin) if x1 < margin) {
                // A number ending left of the margin starts a new item
                if !self.prev_was_number {
                    self.numbers.push('\n');
                    self.body.push('\n');
                }
                self.numbers.push_str(text);
                self.prev_was_number = true;
            } else {
                // Indented number: part of the running text
                self.body.push_str(text);
                self.body.push(' ');
                self.prev_was_number = false;
            }
        } else {
            if self.margin.is_none() {
                self.margin = Some(x0);
            }
            self.body.push_str(text);
            self.body.push(' ');
            self.prev_was_number = false;
        }
    }

    /// Finish the run, trimming outer whitespace from both columns
    pub fn finish(self) -> Segmented {
        Segmented {
            numbers: self.numbers.trim().to_string(),
            body: self.body.trim().to_string(),
        }
    }
}

/// Whether a token is numeric: removing ASCII periods must leave a
/// non-empty run of ASCII digits ("1", "2.3", "10." — but not "..." or "a1")
pub fn is_numeric_token(text: &str) -> bool {
    let mut saw_digit = false;
    for c in text.chars() {
        if c == '.' {
            continue;
        }
        if !c.is_ascii_digit() {
            return false;
        }
        saw_digit = true;
    }
    saw_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Push a word 6pt per character wide, the advance of 12pt text
    fn push(seg: &mut Segmenter, text: &str, x0: f32) {
        seg.push(text, x0, x0 + text.len() as f32 * 6.0);
    }

    #[test]
    fn test_is_numeric_token() {
        assert!(is_numeric_token("1"));
        assert!(is_numeric_token("12."));
        assert!(is_numeric_token("2.3"));
        assert!(is_numeric_token(".7."));
        assert!(!is_numeric_token("..."));
        assert!(!is_numeric_token(""));
        assert!(!is_numeric_token("a1"));
        assert!(!is_numeric_token("1,000"));
    }

    #[test]
    fn test_two_items_split() {
        let mut seg = Segmenter::new();
        push(&mut seg, "1.", 72.0);
        push(&mut seg, "First", 100.0);
        push(&mut seg, "item", 140.0);
        push(&mut seg, "2.", 72.0);
        push(&mut seg, "Second", 100.0);

        let out = seg.finish();
        assert_eq!(out.numbers, "1.\n2.");
        assert_eq!(out.body, "First item \nSecond");
    }

    #[test]
    fn test_number_in_body_stays_in_body() {
        let mut seg = Segmenter::new();
        push(&mut seg, "1.", 72.0);
        push(&mut seg, "Issued", 100.0);
        push(&mut seg, "in", 140.0);
        // A year inside the text: right edge is far past the margin
        push(&mut seg, "2015", 160.0);
        push(&mut seg, "2.", 72.0);
        push(&mut seg, "Next", 100.0);

        let out = seg.finish();
        assert_eq!(out.numbers, "1.\n2.");
        assert_eq!(out.body, "Issued in 2015 \nNext");
    }

    #[test]
    fn test_margin_learned_from_first_body_word() {
        let mut seg = Segmenter::new();
        push(&mut seg, "1.", 72.0);
        push(&mut seg, "Alpha", 100.0);
        // x1 = 90 + 6 = 96 < 100: this starts a new item even though it is
        // further right than the first number
        push(&mut seg, "2", 90.0);
        push(&mut seg, "Beta", 100.0);

        let out = seg.finish();
        assert_eq!(out.numbers, "1.\n2");
        assert_eq!(out.body, "Alpha \nBeta");
    }

    #[test]
    fn test_all_numeric_never_learns_margin() {
        let mut seg = Segmenter::new();
        push(&mut seg, "1.", 72.0);
        push(&mut seg, "2.", 72.0);
        push(&mut seg, "3.", 72.0);

        // Without a margin only the first number is an item; the rest fall
        // through to the body
        let out = seg.finish();
        assert_eq!(out.numbers, "1.");
        assert_eq!(out.body, "2. 3.");
    }

    #[test]
    fn test_consecutive_item_numbers_concatenate() {
        let mut seg = Segmenter::new();
        push(&mut seg, "1.", 72.0);
        push(&mut seg, "Body", 110.0);
        push(&mut seg, "2", 72.0);
        push(&mut seg, "3", 80.0);
        push(&mut seg, "More", 110.0);

        // Two accepted numbers in a row join the same item's number cell
        let out = seg.finish();
        assert_eq!(out.numbers, "1.\n23");
        assert_eq!(out.body, "Body \nMore");
    }

    #[test]
    fn test_leading_body_text_before_any_number() {
        let mut seg = Segmenter::new();
        push(&mut seg, "Preamble", 100.0);
        push(&mut seg, "text", 150.0);
        push(&mut seg, "1.", 72.0);
        push(&mut seg, "Item", 100.0);

        // The first number opens the number column without breaking the
        // body line, so the preamble and the item text share a row
        let out = seg.finish();
        assert_eq!(out.numbers, "1.");
        assert_eq!(out.body, "Preamble text Item");
    }

    #[test]
    fn test_deterministic_for_fixed_input() {
        let words = [("1.", 72.0), ("Alpha", 100.0), ("2.", 72.0), ("Beta", 100.0)];
        let run = || {
            let mut seg = Segmenter::new();
            for (text, x0) in words {
                push(&mut seg, text, x0);
            }
            seg.finish()
        };
        assert_eq!(run(), run());
    }
}
