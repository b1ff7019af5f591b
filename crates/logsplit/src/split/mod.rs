//! Split strategies: decide how many leading bytes of a buffer form the next
//! record.

mod line_end;
mod line_start;
mod newline;
mod no_split;

use regex::bytes::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::encoding::Encoding;
use crate::error::{PatternField, SplitConfigError, SplitError};

pub use line_end::LineEndSplit;
pub use line_start::LineStartSplit;
pub use newline::NewlineSplit;
pub use no_split::NoSplit;

/// Result of one split decision.
///
/// `advance` is how many bytes the caller must drop from the front of its
/// buffer; `token`, when present, borrows the buffer that was passed in.
/// `advance == 0` with no token asks the caller to read more bytes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SplitOutcome<'a> {
    pub advance: usize,
    pub token: Option<&'a [u8]>,
}

impl<'a> SplitOutcome<'a> {
    pub const NEED_MORE: SplitOutcome<'static> = SplitOutcome {
        advance: 0,
        token: None,
    };

    pub fn emit(advance: usize, token: &'a [u8]) -> Self {
        Self {
            advance,
            token: Some(token),
        }
    }

    pub fn is_need_more(&self) -> bool {
        self.advance == 0 && self.token.is_none()
    }
}

/// A splitting policy over a read-only view of the unconsumed bytes.
///
/// Implementations must keep `advance <= data.len()` and hold no mutable
/// state between calls.
pub trait SplitFunc {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError>;

    /// Post-processing for a token the scanner cut on its own (a force flush)
    /// rather than one this strategy chose.
    fn finish_forced<'a>(&self, token: &'a [u8]) -> &'a [u8] {
        token
    }

    /// Bytes per code unit of the data this strategy reads. Records the
    /// scanner cuts on its own are kept to multiples of it.
    fn code_unit_width(&self) -> usize {
        1
    }
}

impl<S: SplitFunc + ?Sized> SplitFunc for &S {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        (**self).split(data, at_eof)
    }

    fn finish_forced<'a>(&self, token: &'a [u8]) -> &'a [u8] {
        (**self).finish_forced(token)
    }

    fn code_unit_width(&self) -> usize {
        (**self).code_unit_width()
    }
}

impl<S: SplitFunc + ?Sized> SplitFunc for Box<S> {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        (**self).split(data, at_eof)
    }

    fn finish_forced<'a>(&self, token: &'a [u8]) -> &'a [u8] {
        (**self).finish_forced(token)
    }

    fn code_unit_width(&self) -> usize {
        (**self).code_unit_width()
    }
}

/// Emits the whole buffer when the stream is over and flushing is enabled.
pub(crate) fn flush_remaining(data: &[u8], at_eof: bool, flush_at_eof: bool) -> SplitOutcome<'_> {
    if at_eof && flush_at_eof && !data.is_empty() {
        SplitOutcome::emit(data.len(), data)
    } else {
        SplitOutcome::NEED_MORE
    }
}

/// The strategy chosen by [`SplitConfig::build`].
#[derive(Debug, Clone)]
pub enum Splitter {
    NoSplit(NoSplit),
    Newline(NewlineSplit),
    LineStart(LineStartSplit),
    LineEnd(LineEndSplit),
}

impl Splitter {
    pub fn name(&self) -> &'static str {
        match self {
            Splitter::NoSplit(_) => "no_split",
            Splitter::Newline(_) => "newline",
            Splitter::LineStart(_) => "line_start",
            Splitter::LineEnd(_) => "line_end",
        }
    }
}

impl SplitFunc for Splitter {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        match self {
            Splitter::NoSplit(inner) => inner.split(data, at_eof),
            Splitter::Newline(inner) => inner.split(data, at_eof),
            Splitter::LineStart(inner) => inner.split(data, at_eof),
            Splitter::LineEnd(inner) => inner.split(data, at_eof),
        }
    }

    fn code_unit_width(&self) -> usize {
        match self {
            Splitter::Newline(inner) => inner.code_unit_width(),
            Splitter::NoSplit(_) | Splitter::LineStart(_) | Splitter::LineEnd(_) => 1,
        }
    }
}

/// Multiline configuration: at most one of the two patterns may be set.
///
/// An empty string means "unset".
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    pub line_start_pattern: String,
    pub line_end_pattern: String,
}

impl SplitConfig {
    pub fn line_start(pattern: impl Into<String>) -> Self {
        Self {
            line_start_pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn line_end(pattern: impl Into<String>) -> Self {
        Self {
            line_end_pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration and constructs exactly one strategy.
    pub fn build(
        &self,
        encoding: Encoding,
        flush_at_eof: bool,
        max_record_size: usize,
    ) -> Result<Splitter, SplitConfigError> {
        if max_record_size == 0 {
            return Err(SplitConfigError::ZeroMaxRecordSize);
        }
        let has_start = !self.line_start_pattern.is_empty();
        let has_end = !self.line_end_pattern.is_empty();

        let splitter = match (has_start, has_end) {
            (true, true) => return Err(SplitConfigError::ConflictingPatterns),
            _ if encoding.is_nop() && (has_start || has_end) => {
                return Err(SplitConfigError::PatternWithNopEncoding)
            }
            _ if encoding.is_nop() => Splitter::NoSplit(NoSplit::new(max_record_size)?),
            (false, false) => Splitter::Newline(NewlineSplit::new(encoding, flush_at_eof)),
            (false, true) => {
                let re = compile_multiline(PatternField::LineEnd, &self.line_end_pattern)?;
                Splitter::LineEnd(LineEndSplit::new(re, flush_at_eof))
            }
            (true, false) => {
                let re = compile_multiline(PatternField::LineStart, &self.line_start_pattern)?;
                Splitter::LineStart(LineStartSplit::new(re, flush_at_eof))
            }
        };

        debug!(
            strategy = splitter.name(),
            encoding = %encoding,
            flush_at_eof,
            max_record_size,
            "constructed split strategy"
        );
        Ok(splitter)
    }
}

fn compile_multiline(field: PatternField, pattern: &str) -> Result<Regex, SplitConfigError> {
    Regex::new(&format!("(?m){pattern}")).map_err(|source| SplitConfigError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}
