pub mod config;
pub mod diff;
pub mod error;

pub use config::{AlignConfig, LineConfig, Markers, PlainDiffConfig, Theme};
pub use diff::{diff_chars, diff_lines, diff_words};
pub use diff::{DiffGenerator, DiffOptions, DiffReport, DiffStats, Granularity};
pub use error::{DiffError, Side};
