use std::fmt;

use thiserror::Error;

/// Which configuration field a multiline pattern came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PatternField {
    LineStart,
    LineEnd,
}

impl PatternField {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternField::LineStart => "line_start_pattern",
            PatternField::LineEnd => "line_end_pattern",
        }
    }
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced while turning configuration into a split strategy.
///
/// Everything except [`SplitConfigError::InvalidPattern`] is a configuration
/// error; see [`SplitConfigError::is_pattern_error`].
#[derive(Debug, Error)]
pub enum SplitConfigError {
    #[error("only one of line_start_pattern or line_end_pattern can be set")]
    ConflictingPatterns,
    #[error("line_start_pattern or line_end_pattern should not be set when using nop encoding")]
    PatternWithNopEncoding,
    #[error("max_log_size must be greater than zero")]
    ZeroMaxRecordSize,
    #[error("unsupported encoding {0:?}")]
    UnsupportedEncoding(String),
    #[error("compile {field} regex {pattern:?}: {source}")]
    InvalidPattern {
        field: PatternField,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to parse tokenizer config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SplitConfigError {
    /// True when the failure came from compiling a user supplied pattern.
    pub fn is_pattern_error(&self) -> bool {
        matches!(self, SplitConfigError::InvalidPattern { .. })
    }
}

/// Unrecoverable fault reported by a split strategy.
///
/// None of the built-in strategies produce one; "need more data" is never an
/// error.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct SplitError {
    message: String,
}

impl SplitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`crate::Scanner`] and `AsyncScanner`.
///
/// A scanner yields nothing further after returning one of these.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed reading input: {0}")]
    Io(#[from] std::io::Error),
    #[error("split function failed: {0}")]
    Split(#[from] SplitError),
    #[error("split function advanced {advance} bytes but only {available} were buffered")]
    AdvanceOutOfRange { advance: usize, available: usize },
    #[error("split function returned {0} consecutive empty tokens without advancing")]
    NoProgress(usize),
}
