use regex::bytes::Regex;

use crate::error::SplitError;

use super::{flush_remaining, SplitFunc, SplitOutcome};

/// Multiline records terminated by an end marker; the marker stays in the
/// token.
#[derive(Debug, Clone)]
pub struct LineEndSplit {
    pattern: Regex,
    flush_at_eof: bool,
}

impl LineEndSplit {
    /// `pattern` should already carry the multiline flag.
    pub fn new(pattern: Regex, flush_at_eof: bool) -> Self {
        Self {
            pattern,
            flush_at_eof,
        }
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl SplitFunc for LineEndSplit {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        let Some(found) = self.pattern.find(data) else {
            return Ok(flush_remaining(data, at_eof, self.flush_at_eof));
        };

        // A match ending on the last buffered byte may grow once more bytes
        // arrive.
        let end = found.end();
        if !at_eof && end + 1 == data.len() {
            return Ok(SplitOutcome::NEED_MORE);
        }
        Ok(SplitOutcome::emit(end, &data[..end]))
    }
}
