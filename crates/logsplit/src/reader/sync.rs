use std::io::{ErrorKind, Read};

use crate::config::ScanLimits;
use crate::error::ScanError;
use crate::split::SplitFunc;

use super::state::{ScanState, ScannedRecord, Step};

/// Drives a split strategy over a blocking reader.
///
/// End-of-stream reaches the strategy only once the reader returns `Ok(0)`.
/// Bytes the strategy declines to flush at that point are left unconsumed and
/// excluded from [`Scanner::position`], so a tailing caller can reopen the
/// source at that offset and pick up where it left off.
pub struct Scanner<R: Read, S: SplitFunc> {
    reader: R,
    state: ScanState<S>,
}

impl<R: Read, S: SplitFunc> Scanner<R, S> {
    pub fn new(reader: R, split: S, limits: ScanLimits) -> Self {
        Self {
            reader,
            state: ScanState::new(split, limits),
        }
    }

    /// Offsets records as if the stream had started `offset` bytes earlier.
    pub fn with_start_offset(mut self, offset: u64) -> Self {
        self.state.set_position(offset);
        self
    }

    /// Stream offset of the first byte not yet consumed by a record.
    pub fn position(&self) -> u64 {
        self.state.position()
    }

    /// Bytes read but not yet part of any record.
    pub fn pending(&self) -> &[u8] {
        self.state.pending()
    }

    pub fn split_func(&self) -> &S {
        self.state.split_func()
    }

    pub fn into_parts(self) -> (R, S) {
        (self.reader, self.state.into_split_func())
    }

    fn fill(&mut self) -> Result<(), ScanError> {
        loop {
            let spare = self.state.read_buf();
            match self.reader.read(spare) {
                Ok(read) => {
                    self.state.commit_read(read);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.state.fail(ScanError::Io(err))),
            }
        }
    }
}

impl<R: Read, S: SplitFunc> Iterator for Scanner<R, S> {
    type Item = Result<ScannedRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.is_done() {
            return None;
        }

        loop {
            match self.state.step() {
                Ok(Step::Emit(record)) => return Some(Ok(record)),
                Ok(Step::Done) => return None,
                Ok(Step::Read) => {
                    if let Err(err) = self.fill() {
                        return Some(Err(err));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
