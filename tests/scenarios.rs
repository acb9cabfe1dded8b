mod common;

use plaindiff::diff::{ClassifiedOp, Comparison, OpTag};
use plaindiff::{
    diff_chars, diff_lines, diff_words, DiffError, DiffGenerator, DiffOptions, Side,
};
use pretty_assertions::assert_eq;

fn op_texts<'a>(comparison: &Comparison<'a>) -> Vec<(OpTag, &'a str)> {
    comparison
        .ops()
        .iter()
        .map(|op: &ClassifiedOp| match op.tag() {
            OpTag::Insert => (op.tag(), comparison.actual_text(op)),
            OpTag::Equal | OpTag::Delete => (op.tag(), comparison.expected_text(op)),
        })
        .collect()
}

#[test]
fn test_char_replace_scenario() {
    common::init_tracing();
    let generator = DiffGenerator::default();
    let comparison = generator
        .compare("cat", "cot", &DiffOptions::chars(false))
        .unwrap();

    assert_eq!(
        op_texts(&comparison),
        vec![
            (OpTag::Equal, "c"),
            (OpTag::Delete, "a"),
            (OpTag::Insert, "o"),
            (OpTag::Equal, "t"),
        ]
    );
    assert_eq!(diff_chars("cat", "cot", false).unwrap(), "c[-a-]{+o+}t");
}

#[test]
fn test_word_replace_scenario() {
    common::init_tracing();
    let generator = DiffGenerator::default();
    let comparison = generator
        .compare("the cat sat", "the dog sat", &DiffOptions::words(false))
        .unwrap();

    assert_eq!(
        op_texts(&comparison),
        vec![
            (OpTag::Equal, "the "),
            (OpTag::Delete, "cat"),
            (OpTag::Insert, "dog"),
            (OpTag::Equal, " sat"),
        ]
    );
}

#[test]
fn test_line_numbers_scenario() {
    common::init_tracing();
    let generator = DiffGenerator::default();
    let comparison = generator
        .compare("a\nb\nc", "a\nx\nc", &DiffOptions::lines(true))
        .unwrap();

    let numbered: Vec<_> = comparison
        .ops()
        .iter()
        .map(|op| (op.tag(), op.display_line(0)))
        .collect();
    assert_eq!(
        numbered,
        vec![
            (OpTag::Equal, Some(1)),
            (OpTag::Delete, Some(2)),
            (OpTag::Insert, Some(2)),
            (OpTag::Equal, Some(3)),
        ]
    );

    assert_eq!(
        diff_lines("a\nb\nc", "a\nx\nc", true).unwrap(),
        "  1 | a\n  2 | [-b-]\n  2 | {+x+}\n  3 | c"
    );
}

#[test]
fn test_whitespace_only_scenario() {
    common::init_tracing();
    let generator = DiffGenerator::default();
    let comparison = generator
        .compare("a  b", "a b", &DiffOptions::chars(true))
        .unwrap();

    let changed: Vec<_> = comparison.ops().iter().filter(|op| op.is_change()).collect();
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|op| op.whitespace_only));
    assert_eq!(comparison.stats().whitespace_only, 1);

    let output = diff_chars("a  b", "a b", true).unwrap();
    assert_eq!(output, "a {~ ~}b");
    assert!(!output.contains("[-"));
    assert!(!output.contains("{+"));
}

#[test]
fn test_whitespace_only_words() {
    common::init_tracing();
    assert_eq!(
        diff_words("fn  main()", "fn main()", true).unwrap(),
        "fn{~  ~}{~ ~}main()"
    );
    assert_eq!(
        diff_words("fn  main()", "fn main()", false).unwrap(),
        "fn[-  -]{+ +}main()"
    );
}

#[test]
fn test_empty_lines_scenario() {
    common::init_tracing();
    let generator = DiffGenerator::default();
    let comparison = generator.compare("", "", &DiffOptions::lines(true)).unwrap();

    assert!(comparison.ops().is_empty());
    assert_eq!(diff_lines("", "", true).unwrap(), "");
}

#[test]
fn test_invalid_utf8_scenario() {
    common::init_tracing();
    let bad: &[u8] = b"caf\xe9";
    let expected_err = DiffError::InvalidEncoding {
        side: Side::Expected,
        offset: 3,
    };

    assert_eq!(diff_chars(bad, "cafe", false).unwrap_err(), expected_err);
    assert_eq!(diff_words(bad, "cafe", true).unwrap_err(), expected_err);
    assert_eq!(diff_lines(bad, "cafe", true).unwrap_err(), expected_err);

    assert_eq!(
        diff_lines("cafe", bad, false).unwrap_err(),
        DiffError::InvalidEncoding {
            side: Side::Actual,
            offset: 3
        }
    );
}

#[test]
fn test_added_and_removed_text() {
    common::init_tracing();
    assert_eq!(
        diff_lines("", "one\ntwo\n", true).unwrap(),
        "  1 | {+one+}\n  2 | {+two+}"
    );
    assert_eq!(diff_lines("one\ntwo", "", false).unwrap(), "[-one-]\n[-two-]");
    assert_eq!(diff_words("", "hi there", false).unwrap(), "{+hi there+}");
}

#[test]
fn test_multibyte_characters() {
    common::init_tracing();
    assert_eq!(
        diff_chars("naïve 🚀", "naive 🚁", false).unwrap(),
        "na[-ï-]{+i+}ve [-🚀-]{+🚁+}"
    );
}

#[test]
fn test_repeated_text_matches_first_occurrence() {
    common::init_tracing();
    assert_eq!(diff_chars("a", "xaxa", false).unwrap(), "{+x+}a{+xa+}");
    assert_eq!(diff_chars("b", "abab", false).unwrap(), "{+a+}b{+ab+}");
    assert_eq!(diff_chars("ab", "xabab", false).unwrap(), "{+x+}ab{+ab+}");
    assert_eq!(diff_chars("xaxa", "a", false).unwrap(), "[-x-]a[-xa-]");
    assert_eq!(
        diff_words("fix the bug", "fix the bug and the test", false).unwrap(),
        "fix the bug{+ and the test+}"
    );
    assert_eq!(
        diff_lines("b", "a\nb\na\nb", true).unwrap(),
        "  1 | {+a+}\n  1 | b\n  3 | {+a+}\n  4 | {+b+}"
    );
}

#[test]
fn test_swapping_inputs_mirrors_the_diff() {
    common::init_tracing();
    assert_eq!(diff_chars("ab", "baa", false).unwrap(), "[-a-]b{+aa+}");
    assert_eq!(diff_chars("baa", "ab", false).unwrap(), "{+a+}b[-aa-]");
}

#[test]
fn test_line_terminator_styles() {
    common::init_tracing();
    // terminators are not compared unless configured
    assert_eq!(diff_lines("a\r\nb\r\n", "a\nb", false).unwrap(), "a\nb");

    let mut config = plaindiff::PlainDiffConfig::default();
    config.lines.strict_line_endings = true;
    let report = DiffGenerator::new(config)
        .unwrap()
        .generate_str("a\r\nb", "a\nb", &DiffOptions::lines(false))
        .unwrap();

    assert_eq!(report.as_str(), "[-a-]\n{+a+}\nb");
    assert_eq!(report.summary(), "1 insertion, 1 deletion, 1 change");
}

#[test]
fn test_large_line_input() {
    common::init_tracing();
    let mut expected = String::new();
    let mut actual = String::new();

    for i in 0..5000 {
        expected.push_str(&format!("Line {} of old text\n", i));
        if i % 100 == 0 {
            actual.push_str(&format!("MODIFIED Line {} of new text\n", i));
        } else {
            actual.push_str(&format!("Line {} of old text\n", i));
        }
    }

    let report = DiffGenerator::default()
        .generate_str(&expected, &actual, &DiffOptions::lines(true))
        .unwrap();

    assert_eq!(report.stats().changes, 50);
    assert_eq!(report.stats().inserted, 50);
    assert_eq!(report.stats().deleted, 50);
    assert_eq!(report.stats().equal, 4950);
    // 5000 lines need a four digit gutter
    assert!(report
        .as_str()
        .contains("\n 101 | [-Line 100 of old text-]\n 101 | {+MODIFIED Line 100 of new text+}\n"));
    assert!(report
        .as_str()
        .starts_with("   1 | [-Line 0 of old text-]\n   1 | {+MODIFIED Line 0 of new text+}\n"));
}
