use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time;

use crate::config::ScanLimits;
use crate::error::ScanError;
use crate::split::SplitFunc;

use super::state::{ScanState, ScannedRecord, Step};

/// Async counterpart of [`crate::Scanner`].
///
/// With a force-flush period set, bytes that sit in the buffer for a whole
/// period without more input arriving are emitted as one record, even if the
/// split strategy is still waiting for a boundary.
pub struct AsyncScanner<R: AsyncRead + Unpin, S: SplitFunc> {
    reader: R,
    state: ScanState<S>,
    force_flush_period: Option<Duration>,
}

impl<R: AsyncRead + Unpin, S: SplitFunc> AsyncScanner<R, S> {
    pub fn new(reader: R, split: S, limits: ScanLimits) -> Self {
        Self {
            reader,
            state: ScanState::new(split, limits),
            force_flush_period: None,
        }
    }

    pub fn with_start_offset(mut self, offset: u64) -> Self {
        self.state.set_position(offset);
        self
    }

    /// A zero period disables force flushing.
    pub fn with_force_flush_period(mut self, period: Duration) -> Self {
        self.force_flush_period = (!period.is_zero()).then_some(period);
        self
    }

    pub fn position(&self) -> u64 {
        self.state.position()
    }

    pub fn pending(&self) -> &[u8] {
        self.state.pending()
    }

    pub fn split_func(&self) -> &S {
        self.state.split_func()
    }

    pub fn into_parts(self) -> (R, S) {
        (self.reader, self.state.into_split_func())
    }

    /// Returns the next record, or `None` once the stream is exhausted or an
    /// error has been returned.
    ///
    /// Cancel safe: the only await point is a single read.
    pub async fn next_record(&mut self) -> Option<Result<ScannedRecord, ScanError>> {
        if self.state.is_done() {
            return None;
        }

        loop {
            match self.state.step() {
                Ok(Step::Emit(record)) => return Some(Ok(record)),
                Ok(Step::Done) => return None,
                Ok(Step::Read) => match self.fill().await {
                    Ok(Some(record)) => return Some(Ok(record)),
                    Ok(None) => {}
                    Err(err) => return Some(Err(err)),
                },
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// Reads once; yields a force-flushed record if the period lapses first.
    async fn fill(&mut self) -> Result<Option<ScannedRecord>, ScanError> {
        let flush_after = match self.force_flush_period {
            Some(period) if !self.state.pending().is_empty() => Some(period),
            _ => None,
        };

        loop {
            let spare = self.state.read_buf();
            let read = match flush_after {
                Some(period) => match time::timeout(period, self.reader.read(spare)).await {
                    Ok(read) => read,
                    Err(_elapsed) => return Ok(self.state.force_flush()),
                },
                None => self.reader.read(spare).await,
            };
            match read {
                Ok(read) => {
                    self.state.commit_read(read);
                    return Ok(None);
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.state.fail(ScanError::Io(err))),
            }
        }
    }
}
