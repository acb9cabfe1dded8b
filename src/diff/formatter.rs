use std::fmt::Write;

use super::algorithms::OpTag;
use super::classifier::ClassifiedOp;
use super::generator::Comparison;
use super::report::DiffReport;
use super::tokenizer::{Granularity, Token, TokenKind};
use crate::config::{LineConfig, Markers, Theme};
use crate::error::{DiffError, Result};

/// Formats classified comparisons into marker-annotated text
pub struct Renderer<'c> {
    theme: &'c Theme,
    lines: &'c LineConfig,
}

impl<'c> Renderer<'c> {
    pub fn new(theme: &'c Theme, lines: &'c LineConfig) -> Self {
        Self { theme, lines }
    }

    pub fn render(&self, comparison: &Comparison<'_>) -> Result<DiffReport> {
        let mut output = String::new();
        output
            .try_reserve(self.estimate_len(comparison))
            .map_err(|_| DiffError::allocation("rendering"))?;

        match comparison.granularity() {
            Granularity::Line => self.render_lines(comparison, &mut output),
            Granularity::Char | Granularity::Word => self.render_inline(comparison, &mut output),
        }

        Ok(DiffReport::new(
            output,
            comparison.granularity(),
            comparison.stats(),
        ))
    }

    fn estimate_len(&self, comparison: &Comparison<'_>) -> usize {
        let text = comparison.expected().source().len() + comparison.actual().source().len();
        let marker = self
            .theme
            .removed
            .overhead()
            .max(self.theme.added.overhead())
            .max(self.theme.whitespace.overhead());

        let overhead = match comparison.granularity() {
            Granularity::Line => {
                let lines = comparison.expected().unit_count() + comparison.actual().unit_count();
                let gutter = self.lines.min_number_width + self.lines.number_separator.len() + 1;
                lines * (marker + gutter)
            }
            Granularity::Char | Granularity::Word => comparison.ops().len() * marker,
        };

        text + overhead
    }

    /// Marker pair for a changed op, `None` for equal runs
    fn markers_for(&self, op: &ClassifiedOp) -> Option<&Markers> {
        match op.tag() {
            OpTag::Equal => None,
            _ if op.whitespace_only => Some(&self.theme.whitespace),
            OpTag::Delete => Some(&self.theme.removed),
            OpTag::Insert => Some(&self.theme.added),
        }
    }

    fn render_inline(&self, comparison: &Comparison<'_>, output: &mut String) {
        for op in comparison.ops() {
            let text = match op.tag() {
                OpTag::Insert => comparison.actual_text(op),
                OpTag::Equal | OpTag::Delete => comparison.expected_text(op),
            };

            match self.markers_for(op) {
                Some(markers) => {
                    output.push_str(&markers.open);
                    output.push_str(text);
                    output.push_str(&markers.close);
                }
                None => output.push_str(text),
            }
        }
    }

    fn number_width(&self, comparison: &Comparison<'_>) -> usize {
        let largest = comparison
            .expected()
            .line_count()
            .max(comparison.actual().line_count());
        let digits = largest.max(1).to_string().len();
        digits.max(self.lines.min_number_width)
    }

    fn render_lines(&self, comparison: &Comparison<'_>, output: &mut String) {
        let numbers = comparison.options().display_line_numbers;
        let width = self.number_width(comparison);
        let mut first = true;

        for op in comparison.ops() {
            let tokens = match op.tag() {
                OpTag::Insert => comparison.actual_tokens(op),
                OpTag::Equal | OpTag::Delete => comparison.expected_tokens(op),
            };
            let markers = self.markers_for(op);

            for (index, content) in line_contents(tokens).enumerate() {
                if !first {
                    output.push('\n');
                }
                first = false;

                let line_start = output.len();
                if numbers {
                    if let Some(number) = op.display_line(index) {
                        // writing to a String cannot fail
                        let _ = write!(output, "{number:>width$}{}", self.lines.number_separator);
                    }
                }

                match markers {
                    Some(markers) => {
                        output.push_str(&markers.open);
                        output.push_str(content.text);
                        output.push_str(&markers.close);
                    }
                    None if content.is_empty() => {
                        let trimmed = output[line_start..].trim_end().len();
                        output.truncate(line_start + trimmed);
                    }
                    None => output.push_str(content.text),
                }
            }
        }
    }
}

fn line_contents<'t, 'a: 't>(tokens: &'t [Token<'a>]) -> impl Iterator<Item = &'t Token<'a>> + 't {
    tokens
        .iter()
        .filter(|token| token.kind == TokenKind::LineContent)
}
