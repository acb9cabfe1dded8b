use std::fmt;

use serde::{Deserialize, Serialize};

use super::tokenizer::Granularity;

/// Statistics about a comparison, counted in comparison units
/// (characters, word tokens or lines)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub equal: usize,
    pub inserted: usize,
    pub deleted: usize,
    /// Number of change groups
    pub changes: usize,
    /// Change groups that only alter whitespace
    pub whitespace_only: usize,
}

impl DiffStats {
    pub fn total_changes(&self) -> usize {
        self.inserted + self.deleted
    }

    pub fn net_change(&self) -> isize {
        self.inserted as isize - self.deleted as isize
    }

    pub fn is_identical(&self) -> bool {
        self.changes == 0
    }
}

/// Rendered diff, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    text: String,
    granularity: Granularity,
    stats: DiffStats,
}

impl DiffReport {
    pub fn new(text: String, granularity: Granularity, stats: DiffStats) -> Self {
        Self {
            text,
            granularity,
            stats,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn stats(&self) -> &DiffStats {
        &self.stats
    }

    pub fn has_changes(&self) -> bool {
        !self.stats.is_identical()
    }

    /// Human readable one-line summary
    pub fn summary(&self) -> String {
        let stats = &self.stats;

        if stats.is_identical() {
            return "No changes".to_string();
        }

        let mut parts = Vec::new();

        if stats.inserted > 0 {
            parts.push(format!(
                "{} insertion{}",
                stats.inserted,
                if stats.inserted == 1 { "" } else { "s" }
            ));
        }

        if stats.deleted > 0 {
            parts.push(format!(
                "{} deletion{}",
                stats.deleted,
                if stats.deleted == 1 { "" } else { "s" }
            ));
        }

        parts.push(format!(
            "{} change{}",
            stats.changes,
            if stats.changes == 1 { "" } else { "s" }
        ));

        if stats.whitespace_only > 0 {
            parts.push(format!("{} whitespace-only", stats.whitespace_only));
        }

        parts.join(", ")
    }

    /// Report with its statistics as JSON, for further tooling
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<DiffReport> for String {
    fn from(report: DiffReport) -> Self {
        report.text
    }
}
