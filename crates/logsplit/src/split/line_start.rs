use regex::bytes::Regex;

use crate::error::SplitError;

use super::{flush_remaining, SplitFunc, SplitOutcome};

/// Multiline records introduced by a start marker (a timestamp prefix, say)
/// and running until the next marker.
///
/// A record is only emitted once the following marker has been seen, so the
/// last record of a stream is held until more data or an end-of-stream flush.
#[derive(Debug, Clone)]
pub struct LineStartSplit {
    pattern: Regex,
    flush_at_eof: bool,
}

impl LineStartSplit {
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

impl SplitFunc for LineStartSplit {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        let Some(first) = self.pattern.find(data) else {
            return Ok(flush_remaining(data, at_eof, self.flush_at_eof));
        };

        // Data ahead of the first marker (a partial record or noise) goes out
        // on its own; the marker stays for the next call.
        if first.start() != 0 {
            let start = first.start();
            return Ok(SplitOutcome::emit(start, &data[..start]));
        }

        if first.end() == data.len() {
            return Ok(flush_remaining(data, at_eof, self.flush_at_eof));
        }

        // The second search starts one byte past the first match so a marker
        // cannot match twice at the same position. The tail is searched as its
        // own haystack, so `^` anchors at its first byte.
        let offset = first.end() + 1;
        match self.pattern.find(&data[offset..]) {
            Some(second) => {
                let second_start = offset + second.start();
                Ok(SplitOutcome::emit(second_start, &data[..second_start]))
            }
            None => Ok(flush_remaining(data, at_eof, self.flush_at_eof)),
        }
    }
}
