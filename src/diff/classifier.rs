//! Post-processing of raw edit scripts
//!
//! The classifier makes runs maximal, flags change groups whose only effect
//! is on whitespace and, in line mode, attaches line numbers to every op.

use serde::{Deserialize, Serialize};

use super::algorithms::{EditOp, EditScript, OpTag};
use super::tokenizer::{Granularity, Token, TokenKind, TokenSeq};
use crate::error::{DiffError, Result};

/// 1-based line numbers of the first line of an op on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineNumbers {
    pub expected: usize,
    pub actual: usize,
}

/// An edit operation enriched for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedOp {
    pub op: EditOp,
    /// The change group this op belongs to only alters whitespace
    pub whitespace_only: bool,
    /// Set in line mode only
    pub lines: Option<LineNumbers>,
}

impl ClassifiedOp {
    pub fn tag(&self) -> OpTag {
        self.op.tag
    }

    pub fn len(&self) -> usize {
        self.op.len()
    }

    pub fn is_empty(&self) -> bool {
        self.op.is_empty()
    }

    pub fn is_change(&self) -> bool {
        self.op.is_change()
    }

    /// Line number of the `index`-th line of this op on the side it is
    /// displayed with: expected for equal and deleted runs, actual for
    /// inserted runs.
    pub fn display_line(&self, index: usize) -> Option<usize> {
        self.lines.map(|lines| match self.op.tag {
            OpTag::Insert => lines.actual + index,
            OpTag::Equal | OpTag::Delete => lines.expected + index,
        })
    }
}

/// Turns an `EditScript` into a sequence of `ClassifiedOp`
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    highlight_whitespaces: bool,
}

impl Classifier {
    pub fn new(highlight_whitespaces: bool) -> Self {
        Self {
            highlight_whitespaces,
        }
    }

    pub fn classify(
        &self,
        script: &EditScript,
        expected: &TokenSeq<'_>,
        actual: &TokenSeq<'_>,
    ) -> Result<Vec<ClassifiedOp>> {
        let merged = merge_runs(script.ops())?;

        let mut classified = Vec::new();
        classified
            .try_reserve_exact(merged.len())
            .map_err(|_| DiffError::allocation("classification"))?;
        classified.extend(merged.into_iter().map(|op| ClassifiedOp {
            op,
            whitespace_only: false,
            lines: None,
        }));

        if self.highlight_whitespaces {
            mark_whitespace_groups(&mut classified, expected, actual);
        }

        if expected.granularity() == Granularity::Line {
            number_lines(&mut classified, expected, actual);
        }

        for op in &classified {
            tracing::trace!(
                tag = ?op.tag(),
                expected = ?op.op.expected,
                actual = ?op.op.actual,
                whitespace_only = op.whitespace_only,
                "classified op"
            );
        }
        Ok(classified)
    }
}

fn merge_runs(ops: &[EditOp]) -> Result<Vec<EditOp>> {
    let mut merged: Vec<EditOp> = Vec::new();
    merged
        .try_reserve(ops.len())
        .map_err(|_| DiffError::allocation("classification"))?;

    for op in ops.iter().filter(|op| !op.is_empty()) {
        match merged.last_mut() {
            Some(last)
                if last.tag == op.tag
                    && last.expected.end == op.expected.start
                    && last.actual.end == op.actual.start =>
            {
                last.expected.end = op.expected.end;
                last.actual.end = op.actual.end;
            }
            _ => merged.push(op.clone()),
        }
    }

    Ok(merged)
}

fn mark_whitespace_groups(
    ops: &mut [ClassifiedOp],
    expected: &TokenSeq<'_>,
    actual: &TokenSeq<'_>,
) {
    let mut start = 0;
    while start < ops.len() {
        if !ops[start].is_change() {
            start += 1;
            continue;
        }

        let end = ops[start..]
            .iter()
            .position(|op| !op.is_change())
            .map_or(ops.len(), |offset| start + offset);
        let group = &mut ops[start..end];

        // within a group the expected side only moves on deletions and the
        // actual side only on insertions
        let expected_units = group[0].op.expected.start..group[group.len() - 1].op.expected.end;
        let actual_units = group[0].op.actual.start..group[group.len() - 1].op.actual.end;

        let whitespace_only = same_ignoring_whitespace(
            expected.tokens_for(expected_units),
            actual.tokens_for(actual_units),
        );
        for op in group.iter_mut() {
            op.whitespace_only = whitespace_only;
        }

        start = end;
    }
}

fn significant_chars<'t, 'a: 't>(tokens: &'t [Token<'a>]) -> impl Iterator<Item = char> + 't {
    tokens
        .iter()
        .flat_map(|token| token.text.chars())
        .filter(|c| !c.is_whitespace())
}

/// True when both token runs spell the same text once whitespace is removed
pub fn same_ignoring_whitespace(expected: &[Token<'_>], actual: &[Token<'_>]) -> bool {
    significant_chars(expected).eq(significant_chars(actual))
}

fn count_lines(tokens: &[Token<'_>]) -> usize {
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::LineContent)
        .count()
}

fn number_lines(ops: &mut [ClassifiedOp], expected: &TokenSeq<'_>, actual: &TokenSeq<'_>) {
    let mut expected_line = 1;
    let mut actual_line = 1;

    for op in ops.iter_mut() {
        op.lines = Some(LineNumbers {
            expected: expected_line,
            actual: actual_line,
        });
        // equal runs advance both counters, deletions and insertions only
        // their own side since the other range is empty
        expected_line += count_lines(expected.tokens_for(op.op.expected.clone()));
        actual_line += count_lines(actual.tokens_for(op.op.actual.clone()));
    }
}
