use super::algorithms::{Aligner, OpTag};
use super::classifier::{ClassifiedOp, Classifier};
use super::formatter::Renderer;
use super::report::{DiffReport, DiffStats};
use super::tokenizer::{decode, Granularity, Token, TokenSeq, Tokenizer};
use crate::config::PlainDiffConfig;
use crate::error::{DiffError, Result, Side};

/// Everything that varies between the character, word and line entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffOptions {
    pub granularity: Granularity,
    pub highlight_whitespaces: bool,
    pub display_line_numbers: bool,
}

impl DiffOptions {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Self::default()
        }
    }

    pub fn chars(highlight_whitespaces: bool) -> Self {
        Self::new(Granularity::Char).highlight_whitespaces(highlight_whitespaces)
    }

    pub fn words(highlight_whitespaces: bool) -> Self {
        Self::new(Granularity::Word).highlight_whitespaces(highlight_whitespaces)
    }

    pub fn lines(display_line_numbers: bool) -> Self {
        Self::new(Granularity::Line).display_line_numbers(display_line_numbers)
    }

    pub fn highlight_whitespaces(mut self, highlight: bool) -> Self {
        self.highlight_whitespaces = highlight;
        self
    }

    pub fn display_line_numbers(mut self, display: bool) -> Self {
        self.display_line_numbers = display;
        self
    }
}

/// Result of running tokenizer, aligner and classifier over two texts
#[derive(Debug, Clone)]
pub struct Comparison<'a> {
    options: DiffOptions,
    expected: TokenSeq<'a>,
    actual: TokenSeq<'a>,
    ops: Vec<ClassifiedOp>,
}

impl<'a> Comparison<'a> {
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn granularity(&self) -> Granularity {
        self.options.granularity
    }

    pub fn expected(&self) -> &TokenSeq<'a> {
        &self.expected
    }

    pub fn actual(&self) -> &TokenSeq<'a> {
        &self.actual
    }

    pub fn ops(&self) -> &[ClassifiedOp] {
        &self.ops
    }

    pub fn expected_tokens(&self, op: &ClassifiedOp) -> &[Token<'a>] {
        self.expected.tokens_for(op.op.expected.clone())
    }

    pub fn actual_tokens(&self, op: &ClassifiedOp) -> &[Token<'a>] {
        self.actual.tokens_for(op.op.actual.clone())
    }

    pub fn expected_text(&self, op: &ClassifiedOp) -> &'a str {
        self.expected.text_for(op.op.expected.clone())
    }

    pub fn actual_text(&self, op: &ClassifiedOp) -> &'a str {
        self.actual.text_for(op.op.actual.clone())
    }

    pub fn has_changes(&self) -> bool {
        self.ops.iter().any(ClassifiedOp::is_change)
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        let mut in_group = false;

        for op in &self.ops {
            match op.tag() {
                OpTag::Equal => {
                    stats.equal += op.len();
                    in_group = false;
                    continue;
                }
                OpTag::Insert => stats.inserted += op.len(),
                OpTag::Delete => stats.deleted += op.len(),
            }

            if !in_group {
                stats.changes += 1;
                if op.whitespace_only {
                    stats.whitespace_only += 1;
                }
                in_group = true;
            }
        }

        stats
    }
}

/// Runs the full diff pipeline with one configuration
pub struct DiffGenerator {
    config: PlainDiffConfig,
    aligner: Box<dyn Aligner>,
}

impl DiffGenerator {
    /// Create a new diff generator using the configured alignment algorithm
    ///
    /// Fails with [`DiffError::InvalidConfig`] when `config` does not pass
    /// [`PlainDiffConfig::validate`].
    pub fn new(config: PlainDiffConfig) -> Result<Self> {
        validated(&config)?;
        Ok(Self::build(config))
    }

    /// Create a diff generator with a custom aligner
    pub fn with_aligner(config: PlainDiffConfig, aligner: Box<dyn Aligner>) -> Result<Self> {
        validated(&config)?;
        Ok(Self { config, aligner })
    }

    fn build(config: PlainDiffConfig) -> Self {
        let aligner = config.align.algorithm.create(&config.align);
        Self { config, aligner }
    }

    pub fn config(&self) -> &PlainDiffConfig {
        &self.config
    }

    /// Get the current aligner name
    pub fn aligner_name(&self) -> &str {
        self.aligner.name()
    }

    /// Tokenize, align and classify two texts
    pub fn compare<'a>(
        &self,
        expected: &'a str,
        actual: &'a str,
        options: &DiffOptions,
    ) -> Result<Comparison<'a>> {
        let span = tracing::debug_span!("compare", granularity = %options.granularity);
        let _guard = span.enter();

        let tokenizer = Tokenizer::new(options.granularity)
            .strict_line_endings(self.config.lines.strict_line_endings);
        let expected = tokenizer.tokenize(expected)?;
        let actual = tokenizer.tokenize(actual)?;
        tracing::debug!(
            expected_units = expected.unit_count(),
            actual_units = actual.unit_count(),
            "tokenized inputs"
        );

        let script = self.aligner.align(&expected.keys()?, &actual.keys()?)?;
        tracing::debug!(
            aligner = self.aligner.name(),
            ops = script.len(),
            edit_distance = script.edit_distance(),
            "aligned inputs"
        );

        let ops = Classifier::new(options.highlight_whitespaces).classify(
            &script,
            &expected,
            &actual,
        )?;

        let comparison = Comparison {
            options: *options,
            expected,
            actual,
            ops,
        };
        let stats = comparison.stats();
        tracing::debug!(
            changes = stats.changes,
            whitespace_only = stats.whitespace_only,
            "classified changes"
        );

        Ok(comparison)
    }

    /// Validate both inputs as UTF-8, compare and render them
    pub fn generate(
        &self,
        expected: &[u8],
        actual: &[u8],
        options: &DiffOptions,
    ) -> Result<DiffReport> {
        let expected = decode(expected, Side::Expected)?;
        let actual = decode(actual, Side::Actual)?;
        self.generate_str(expected, actual, options)
    }

    pub fn generate_str(
        &self,
        expected: &str,
        actual: &str,
        options: &DiffOptions,
    ) -> Result<DiffReport> {
        let comparison = self.compare(expected, actual, options)?;
        Renderer::new(&self.config.theme, &self.config.lines).render(&comparison)
    }
}

impl Default for DiffGenerator {
    fn default() -> Self {
        Self::build(PlainDiffConfig::default())
    }
}

fn validated(config: &PlainDiffConfig) -> Result<()> {
    config
        .validate()
        .map_err(|reason| DiffError::InvalidConfig { reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Markers;
    use crate::diff::algorithms::{AlignAlgorithm, LcsAligner, MyersAligner};

    #[test]
    fn test_diff_generator() {
        let generator = DiffGenerator::default();
        let report = generator
            .generate_str("a\nb\nc", "a\nx\nc", &DiffOptions::lines(false))
            .unwrap();

        assert_eq!(generator.aligner_name(), "Myers");
        assert_eq!(report.stats().inserted, 1);
        assert_eq!(report.stats().deleted, 1);
        assert_eq!(report.stats().changes, 1);
    }

    #[test]
    fn test_configured_algorithm() {
        let mut config = PlainDiffConfig::default();
        config.align.algorithm = AlignAlgorithm::Lcs;

        let generator = DiffGenerator::new(config.clone()).unwrap();
        assert_eq!(generator.aligner_name(), "LCS");

        let custom = DiffGenerator::with_aligner(config, Box::new(LcsAligner::new(16))).unwrap();
        let report = custom
            .generate_str("kitten", "sitting", &DiffOptions::chars(false))
            .unwrap();
        assert_eq!(report.stats().total_changes(), 5);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = PlainDiffConfig::default();
        config.theme.whitespace = Markers::new("{+", "+}");

        match DiffGenerator::new(config.clone()) {
            Err(DiffError::InvalidConfig { reason }) => assert!(reason.contains("distinct")),
            _ => panic!("clashing markers were accepted"),
        }

        let err = DiffGenerator::with_aligner(config, Box::new(MyersAligner::default()))
            .err()
            .unwrap();
        assert!(matches!(err, DiffError::InvalidConfig { .. }));

        let mut config = PlainDiffConfig::default();
        config.align.band_max_cells = 0;
        assert!(DiffGenerator::new(config).is_err());
    }

    #[test]
    fn test_comparison_texts() {
        let generator = DiffGenerator::default();
        let comparison = generator
            .compare("the cat sat", "the dog sat", &DiffOptions::words(false))
            .unwrap();

        let parts: Vec<_> = comparison
            .ops()
            .iter()
            .map(|op| match op.tag() {
                OpTag::Insert => (op.tag(), comparison.actual_text(op)),
                _ => (op.tag(), comparison.expected_text(op)),
            })
            .collect();

        assert_eq!(
            parts,
            vec![
                (OpTag::Equal, "the "),
                (OpTag::Delete, "cat"),
                (OpTag::Insert, "dog"),
                (OpTag::Equal, " sat"),
            ]
        );
    }

    #[test]
    fn test_stats_count_groups() {
        let generator = DiffGenerator::default();
        let comparison = generator
            .compare("a b c d", "a x c d e", &DiffOptions::words(false))
            .unwrap();

        let stats = comparison.stats();
        assert_eq!(stats.changes, 2);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.inserted, 3);
    }

    #[test]
    fn test_invalid_encoding_on_either_side() {
        let generator = DiffGenerator::default();
        let options = DiffOptions::words(false);

        let err = generator.generate(b"ok", b"bad \xc3", &options).unwrap_err();
        assert_eq!(
            err,
            DiffError::InvalidEncoding {
                side: Side::Actual,
                offset: 4
            }
        );

        let err = generator.generate(b"\x80", b"\x80", &options).unwrap_err();
        assert!(matches!(
            err,
            DiffError::InvalidEncoding {
                side: Side::Expected,
                ..
            }
        ));
    }

    #[test]
    fn test_options_presets() {
        let options = DiffOptions::lines(true);
        assert_eq!(options.granularity, Granularity::Line);
        assert!(options.display_line_numbers);
        assert!(!options.highlight_whitespaces);

        let options = DiffOptions::chars(true);
        assert_eq!(options.granularity, Granularity::Char);
        assert!(options.highlight_whitespaces);
    }
}
