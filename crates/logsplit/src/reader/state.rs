use tracing::{debug, warn};

use crate::config::ScanLimits;
use crate::error::ScanError;
use crate::split::SplitFunc;

/// Consecutive zero-advance tokens tolerated before a strategy is declared stuck.
pub(crate) const MAX_EMPTY_TOKENS: usize = 100;

/// One record carved out of the stream.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScannedRecord {
    /// 1-based position of the record in the stream.
    pub record_number: usize,
    /// Stream offset of the first byte consumed for this record.
    pub offset: u64,
    pub bytes: Vec<u8>,
    /// Set when the record was cut at `max_record_size` instead of at a
    /// boundary chosen by the split strategy.
    pub truncated: bool,
}

pub(crate) enum Step {
    Emit(ScannedRecord),
    Read,
    Done,
}

/// Buffer bookkeeping shared by the sync and async scanners.
///
/// Unconsumed bytes live in `buf[start..end]`; `position` is the stream
/// offset of `buf[start]`.
pub(crate) struct ScanState<S> {
    split: S,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    max_record_size: usize,
    position: u64,
    record_number: usize,
    empty_tokens: usize,
    at_eof: bool,
    done: bool,
}

impl<S: SplitFunc> ScanState<S> {
    pub(crate) fn new(split: S, limits: ScanLimits) -> Self {
        let max_record_size = limits.max_record_size.max(1);
        let initial = limits.initial_buffer_size.clamp(1, max_record_size);
        Self {
            split,
            buf: vec![0u8; initial],
            start: 0,
            end: 0,
            max_record_size,
            position: 0,
            record_number: 0,
            empty_tokens: 0,
            at_eof: false,
            done: false,
        }
    }

    pub(crate) fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn pending(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn split_func(&self) -> &S {
        &self.split
    }

    pub(crate) fn into_split_func(self) -> S {
        self.split
    }

    pub(crate) fn fail(&mut self, err: ScanError) -> ScanError {
        self.done = true;
        err
    }

    /// Runs the strategy over the pending bytes and decides what happens next.
    pub(crate) fn step(&mut self) -> Result<Step, ScanError> {
        loop {
            if self.done {
                return Ok(Step::Done);
            }

            let data = &self.buf[self.start..self.end];
            let available = data.len();
            if available > 0 || self.at_eof {
                let outcome = match self.split.split(data, self.at_eof) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(position = self.position, error = %err, "split function failed");
                        return Err(self.fail(ScanError::Split(err)));
                    }
                };
                let advance = outcome.advance;
                if advance > available {
                    warn!(advance, available, "split function advanced past buffered data");
                    return Err(self.fail(ScanError::AdvanceOutOfRange { advance, available }));
                }

                // The token borrows the buffer; copy it out before consuming.
                if let Some(token) = outcome.token.map(<[u8]>::to_vec) {
                    if advance == 0 {
                        self.empty_tokens += 1;
                        if self.empty_tokens > MAX_EMPTY_TOKENS {
                            return Err(self.fail(ScanError::NoProgress(self.empty_tokens)));
                        }
                    } else {
                        self.empty_tokens = 0;
                    }
                    let record = self.record(token, false);
                    self.consume(advance);
                    return Ok(Step::Emit(record));
                }

                if advance > 0 {
                    self.consume(advance);
                    continue;
                }
            }

            if self.at_eof {
                if !self.pending().is_empty() {
                    debug!(
                        position = self.position,
                        unflushed_bytes = self.pending().len(),
                        "stream ended with bytes the split function did not flush"
                    );
                }
                self.done = true;
                return Ok(Step::Done);
            }

            if self.pending().len() >= self.max_record_size {
                return Ok(Step::Emit(self.truncate()));
            }
            return Ok(Step::Read);
        }
    }

    /// Makes room and hands out the spare tail of the buffer for the next read.
    pub(crate) fn read_buf(&mut self) -> &mut [u8] {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == self.buf.len() {
            let grown = (self.buf.len() * 2).clamp(self.end + 1, self.max_record_size.max(self.end + 1));
            self.buf.resize(grown, 0);
        }
        &mut self.buf[self.end..]
    }

    /// Records the result of a read into [`ScanState::read_buf`]; zero means end-of-stream.
    pub(crate) fn commit_read(&mut self, read: usize) {
        if read == 0 {
            self.at_eof = true;
        } else {
            self.end += read;
        }
    }

    /// Consumes everything pending as one record, regardless of the strategy.
    ///
    /// A trailing partial code unit stays pending.
    #[cfg(any(feature = "tokio", test))]
    pub(crate) fn force_flush(&mut self) -> Option<ScannedRecord> {
        if self.done {
            return None;
        }
        let len = self.unit_floor(self.end - self.start);
        if len == 0 {
            return None;
        }
        let bytes = self
            .split
            .finish_forced(&self.buf[self.start..self.start + len])
            .to_vec();
        debug!(position = self.position, bytes = len, "force flushing pending bytes");
        self.empty_tokens = 0;
        let record = self.record(bytes, false);
        self.consume(len);
        Some(record)
    }

    /// Cuts `max_record_size` bytes, rounded down to whole code units.
    fn truncate(&mut self) -> ScannedRecord {
        let len = match self.unit_floor(self.max_record_size) {
            0 => self.max_record_size,
            len => len,
        };
        let bytes = self.buf[self.start..self.start + len].to_vec();
        debug!(
            position = self.position,
            max_record_size = self.max_record_size,
            bytes = len,
            "record exceeded max size; truncating"
        );
        self.empty_tokens = 0;
        let record = self.record(bytes, true);
        self.consume(len);
        record
    }

    fn unit_floor(&self, len: usize) -> usize {
        let width = self.split.code_unit_width().max(1);
        len - len % width
    }

    fn record(&mut self, bytes: Vec<u8>, truncated: bool) -> ScannedRecord {
        self.record_number += 1;
        ScannedRecord {
            record_number: self.record_number,
            offset: self.position,
            bytes,
            truncated,
        }
    }

    fn consume(&mut self, len: usize) {
        self.start += len;
        self.position += len as u64;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Encoding;
    use crate::split::{SplitConfig, Splitter};

    fn newline(flush_at_eof: bool) -> Splitter {
        SplitConfig::default()
            .build(Encoding::Utf8, flush_at_eof, 1024)
            .unwrap()
    }

    fn feed<S: SplitFunc>(state: &mut ScanState<S>, bytes: &[u8]) {
        let spare = state.read_buf();
        spare[..bytes.len()].copy_from_slice(bytes);
        state.commit_read(bytes.len());
    }

    #[test]
    fn empty_state_asks_for_data() {
        let mut state = ScanState::new(newline(false), ScanLimits::default());
        assert!(matches!(state.step().unwrap(), Step::Read));
    }

    #[test]
    fn emits_records_with_offsets() {
        let mut state = ScanState::new(newline(false), ScanLimits::default());
        feed(&mut state, b"ab\ncd\nef");

        let Step::Emit(first) = state.step().unwrap() else {
            panic!("expected a record");
        };
        assert_eq!((first.record_number, first.offset), (1, 0));
        assert_eq!(first.bytes, b"ab");

        let Step::Emit(second) = state.step().unwrap() else {
            panic!("expected a record");
        };
        assert_eq!((second.record_number, second.offset), (2, 3));
        assert!(matches!(state.step().unwrap(), Step::Read));
        assert_eq!(state.position(), 6);
        assert_eq!(state.pending(), b"ef");
    }

    #[test]
    fn truncates_when_buffer_is_full() {
        let limits = ScanLimits {
            max_record_size: 4,
            initial_buffer_size: 2,
        };
        let mut state = ScanState::new(newline(false), limits);
        feed(&mut state, b"ab");
        assert!(matches!(state.step().unwrap(), Step::Read));
        feed(&mut state, b"cd");

        let Step::Emit(record) = state.step().unwrap() else {
            panic!("expected a truncated record");
        };
        assert!(record.truncated);
        assert_eq!(record.bytes, b"abcd");
        assert_eq!(state.position(), 4);
    }

    #[test]
    fn force_flush_takes_everything_pending() {
        let mut state = ScanState::new(newline(false), ScanLimits::default());
        feed(&mut state, b"no newline yet");
        assert!(matches!(state.step().unwrap(), Step::Read));

        let record = state.force_flush().unwrap();
        assert_eq!(record.bytes, b"no newline yet");
        assert!(!record.truncated);
        assert!(state.force_flush().is_none());
    }

    #[test]
    fn truncation_keeps_utf16_code_units_whole() {
        let split = SplitConfig::default()
            .build(Encoding::Utf16Le, false, 1024)
            .unwrap();
        let limits = ScanLimits {
            max_record_size: 7,
            initial_buffer_size: 8,
        };
        let mut state = ScanState::new(split, limits);
        feed(&mut state, b"a\0b\0c\0d");

        let Step::Emit(record) = state.step().unwrap() else {
            panic!("expected a truncated record");
        };
        assert!(record.truncated);
        assert_eq!(record.bytes, b"a\0b\0c\0");
        assert_eq!(state.pending(), b"d");
        assert_eq!(state.position(), 6);
    }

    #[test]
    fn force_flush_leaves_partial_code_unit_pending() {
        let split = SplitConfig::default()
            .build(Encoding::Utf16Be, false, 1024)
            .unwrap();
        let mut state = ScanState::new(split, ScanLimits::default());
        feed(&mut state, b"\0a\0");
        assert!(matches!(state.step().unwrap(), Step::Read));

        let record = state.force_flush().unwrap();
        assert_eq!(record.bytes, b"\0a");
        assert_eq!(state.pending(), b"\0");
        assert!(state.force_flush().is_none());
    }

    #[test]
    fn eof_without_flush_keeps_bytes_unconsumed() {
        let mut state = ScanState::new(newline(false), ScanLimits::default());
        feed(&mut state, b"x\ny");
        assert!(matches!(state.step().unwrap(), Step::Emit(_)));
        state.commit_read(0);
        assert!(matches!(state.step().unwrap(), Step::Done));
        assert_eq!(state.position(), 2);
        assert!(state.is_done());
    }

    struct Stuck;

    impl SplitFunc for Stuck {
        fn split<'a>(
            &self,
            data: &'a [u8],
            _at_eof: bool,
        ) -> Result<crate::split::SplitOutcome<'a>, crate::SplitError> {
            Ok(crate::split::SplitOutcome::emit(0, &data[..0]))
        }
    }

    #[test]
    fn repeated_empty_tokens_without_progress_fail() {
        let mut state = ScanState::new(Stuck, ScanLimits::default());
        feed(&mut state, b"abc");
        for _ in 0..MAX_EMPTY_TOKENS {
            assert!(matches!(state.step().unwrap(), Step::Emit(_)));
        }
        let err = state.step().err().unwrap();
        assert!(matches!(err, ScanError::NoProgress(n) if n == MAX_EMPTY_TOKENS + 1));
        assert!(matches!(state.step().unwrap(), Step::Done));
    }

    struct Overreach;

    impl SplitFunc for Overreach {
        fn split<'a>(
            &self,
            data: &'a [u8],
            _at_eof: bool,
        ) -> Result<crate::split::SplitOutcome<'a>, crate::SplitError> {
            Ok(crate::split::SplitOutcome {
                advance: data.len() + 1,
                token: None,
            })
        }
    }

    #[test]
    fn advance_past_buffer_is_rejected() {
        let mut state = ScanState::new(Overreach, ScanLimits::default());
        feed(&mut state, b"abc");
        let err = state.step().err().unwrap();
        assert!(matches!(
            err,
            ScanError::AdvanceOutOfRange {
                advance: 4,
                available: 3
            }
        ));
    }
}
