//! Configuration management for plaindiff
//!
//! This module provides the marker theme used by the renderer together with
//! line-mode and alignment settings. Values can come from defaults, a TOML
//! file or `PLAINDIFF_*` environment variables.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::diff::AlignAlgorithm;

/// Global configuration for plaindiff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlainDiffConfig {
    /// Markers delimiting changed regions
    pub theme: Theme,
    /// Line mode configuration
    pub lines: LineConfig,
    /// Alignment configuration
    pub align: AlignConfig,
}

/// Opening and closing marker around a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub open: String,
    pub close: String,
}

impl Markers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Combined byte length of both markers
    pub fn overhead(&self) -> usize {
        self.open.len() + self.close.len()
    }
}

/// In-band markers for the three kinds of changed regions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub removed: Markers,
    pub added: Markers,
    pub whitespace: Markers,
}

/// Configuration for line mode output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Minimum width of the right-aligned line number field
    pub min_number_width: usize,
    /// Placed between the line number and the line content
    pub number_separator: String,
    /// Compare line terminators as part of each line
    pub strict_line_endings: bool,
}

/// Configuration for the alignment stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub algorithm: AlignAlgorithm,
    /// Largest table the LCS aligner builds before switching to Myers
    pub lcs_max_cells: usize,
    /// Largest band searched to settle ties between equally short scripts;
    /// beyond it the Myers script is kept as produced
    pub band_max_cells: usize,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            removed: Markers::new("[-", "-]"),
            added: Markers::new("{+", "+}"),
            whitespace: Markers::new("{~", "~}"),
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            min_number_width: 3,
            number_separator: " | ".to_string(),
            strict_line_endings: false,
        }
    }
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            algorithm: AlignAlgorithm::Myers,
            lcs_max_cells: 64 * 1024,
            band_max_cells: 4 * 1024 * 1024,
        }
    }
}

impl Theme {
    /// Validate that every category has markers of its own
    pub fn validate(&self) -> Result<(), String> {
        let categories = [
            ("removed", &self.removed),
            ("added", &self.added),
            ("whitespace", &self.whitespace),
        ];

        for (name, markers) in &categories {
            if markers.open.is_empty() || markers.close.is_empty() {
                return Err(format!("{name} markers must not be empty"));
            }
        }

        for (i, (name, markers)) in categories.iter().enumerate() {
            for (other_name, other) in &categories[i + 1..] {
                if markers.open == other.open || markers.close == other.close {
                    return Err(format!(
                        "{name} and {other_name} markers must be distinct"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Configuration loading and management
impl PlainDiffConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        config
            .validate()
            .map_err(|err| anyhow::anyhow!("invalid config file {}: {err}", path.display()))?;

        Ok(config)
    }

    /// Load the file named by `PLAINDIFF_CONFIG` when set, then apply
    /// environment overrides
    pub fn load_or_default() -> Self {
        let base = match std::env::var("PLAINDIFF_CONFIG") {
            Ok(path) => Self::load(&path).unwrap_or_else(|err| {
                tracing::warn!(path = %path, error = %err, "using default configuration");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        base.with_env_overrides()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(algorithm) = env_value::<AlignAlgorithm>("PLAINDIFF_ALGORITHM") {
            self.align.algorithm = algorithm;
        }

        if let Some(cells) = env_value::<usize>("PLAINDIFF_LCS_MAX_CELLS") {
            self.align.lcs_max_cells = cells;
        }

        if let Some(cells) = env_value::<usize>("PLAINDIFF_BAND_MAX_CELLS") {
            self.align.band_max_cells = cells;
        }

        if let Some(width) = env_value::<usize>("PLAINDIFF_LINE_NUMBER_WIDTH") {
            self.lines.min_number_width = width;
        }

        if let Some(strict) = env_value::<bool>("PLAINDIFF_STRICT_LINE_ENDINGS") {
            self.lines.strict_line_endings = strict;
        }

        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.theme.validate()?;

        if self.align.lcs_max_cells == 0 {
            return Err("lcs_max_cells must be greater than 0".to_string());
        }

        if self.align.band_max_cells == 0 {
            return Err("band_max_cells must be greater than 0".to_string());
        }

        Ok(())
    }
}

fn env_value<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(variable = name, value = %raw, error = %err, "ignoring invalid value");
            None
        }
    }
}
