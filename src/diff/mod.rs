//! Diff computation and formatting
//!
//! Text flows through four stages: the tokenizer splits each input into
//! units of the requested granularity, an aligner computes a minimal edit
//! script, the classifier annotates it and the renderer turns it into
//! marker-delimited text.

pub mod algorithms;
pub mod classifier;
pub mod formatter;
pub mod generator;
pub mod report;
pub mod tokenizer;

// Re-export the main types for easier use
pub use algorithms::{
    AlignAlgorithm, Aligner, EditOp, EditScript, LcsAligner, MyersAligner, OpTag,
};
pub use classifier::{ClassifiedOp, Classifier, LineNumbers};
pub use formatter::Renderer;
pub use generator::{Comparison, DiffGenerator, DiffOptions};
pub use report::{DiffReport, DiffStats};
pub use tokenizer::{decode, Granularity, Token, TokenKind, TokenSeq, Tokenizer, Unit};

use crate::error::Result;

fn generate(expected: &[u8], actual: &[u8], options: DiffOptions) -> Result<String> {
    DiffGenerator::default()
        .generate(expected, actual, &options)
        .map(DiffReport::into_string)
}

/// Compare two texts character by character
pub fn diff_chars(
    expected: impl AsRef<[u8]>,
    actual: impl AsRef<[u8]>,
    highlight_whitespaces: bool,
) -> Result<String> {
    generate(
        expected.as_ref(),
        actual.as_ref(),
        DiffOptions::chars(highlight_whitespaces),
    )
}

/// Compare two texts word by word
pub fn diff_words(
    expected: impl AsRef<[u8]>,
    actual: impl AsRef<[u8]>,
    highlight_whitespaces: bool,
) -> Result<String> {
    generate(
        expected.as_ref(),
        actual.as_ref(),
        DiffOptions::words(highlight_whitespaces),
    )
}

/// Compare two texts line by line
pub fn diff_lines(
    expected: impl AsRef<[u8]>,
    actual: impl AsRef<[u8]>,
    display_line_numbers: bool,
) -> Result<String> {
    generate(
        expected.as_ref(),
        actual.as_ref(),
        DiffOptions::lines(display_line_numbers),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convenience_functions() {
        assert_eq!(diff_chars("cat", "cot", false).unwrap(), "c[-a-]{+o+}t");
        assert_eq!(
            diff_words("hello world", "hello there", false).unwrap(),
            "hello [-world-]{+there+}"
        );
        assert_eq!(
            diff_lines("line1\nline2", "line1\nmodified", false).unwrap(),
            "line1\n[-line2-]\n{+modified+}"
        );
    }

    #[test]
    fn test_accepts_owned_and_byte_inputs() {
        let expected = String::from("abc");
        let actual = b"abd".to_vec();
        assert_eq!(diff_chars(&expected, &actual, false).unwrap(), "ab[-c-]{+d+}");
    }
}
