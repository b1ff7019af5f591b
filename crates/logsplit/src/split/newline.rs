use crate::encoding::{EncodedSeparators, Encoding};
use crate::error::SplitError;

use super::{flush_remaining, SplitFunc, SplitOutcome};

/// Splits on the encoded newline, stripping one carriage return before it.
///
/// Unlike a plain line scanner, end-of-stream is never treated as a line
/// terminator unless `flush_at_eof` is set.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewlineSplit {
    separators: EncodedSeparators,
    flush_at_eof: bool,
}

impl NewlineSplit {
    pub fn new(encoding: Encoding, flush_at_eof: bool) -> Self {
        Self {
            separators: encoding.separators(),
            flush_at_eof,
        }
    }

    pub fn separators(&self) -> &EncodedSeparators {
        &self.separators
    }
}

impl SplitFunc for NewlineSplit {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        if at_eof && data.is_empty() {
            return Ok(SplitOutcome::NEED_MORE);
        }

        let newline_len = self.separators.newline().len();
        match self.separators.find_newline(data) {
            Some(0) => Ok(SplitOutcome::emit(newline_len, &data[..0])),
            Some(idx) => {
                let token = self.separators.trim_carriage_return(&data[..idx]);
                Ok(SplitOutcome::emit(idx + newline_len, token))
            }
            None => Ok(flush_remaining(data, at_eof, self.flush_at_eof)),
        }
    }

    fn code_unit_width(&self) -> usize {
        self.separators.unit_width()
    }
}
