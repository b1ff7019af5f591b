use crate::error::{SplitConfigError, SplitError};

use super::{SplitFunc, SplitOutcome};

/// Passes bytes through untouched, cutting only at `max_record_size`.
///
/// Used with the `nop` encoding, where there are no text boundaries to find.
/// Records longer than the bound come out as several tokens with no marker.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NoSplit {
    max_record_size: usize,
}

impl NoSplit {
    pub fn new(max_record_size: usize) -> Result<Self, SplitConfigError> {
        if max_record_size == 0 {
            return Err(SplitConfigError::ZeroMaxRecordSize);
        }
        Ok(Self { max_record_size })
    }

    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }
}

impl SplitFunc for NoSplit {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        if data.len() >= self.max_record_size {
            let max = self.max_record_size;
            return Ok(SplitOutcome::emit(max, &data[..max]));
        }
        if !at_eof || data.is_empty() {
            return Ok(SplitOutcome::NEED_MORE);
        }
        Ok(SplitOutcome::emit(data.len(), data))
    }
}
