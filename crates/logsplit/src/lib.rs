#![forbid(unsafe_code)]
//! Record splitting for log collection.
//!
//! Turns an incrementally arriving byte stream (a tailed file, a socket, a
//! pipe) into discrete log records before any parsing happens. It provides:
//! - Split strategies over a read-only buffer view: newline (encoding aware),
//!   line-start and line-end regular expressions for multiline records, and a
//!   size-bounded passthrough for raw bytes.
//! - A selector that validates configuration and builds exactly one strategy.
//! - Bounded-memory scanners that own the buffer and drive a strategy over a
//!   `Read` (sync) or, with the `tokio` feature, an `AsyncRead`.
//!
//! ```
//! use logsplit::{Encoding, SplitConfig, SplitFunc, SplitOutcome};
//!
//! let split = SplitConfig::line_start("^LOG:")
//!     .build(Encoding::Utf8, false, 1024)
//!     .unwrap();
//! let out = split.split(b"LOG:a\nLOG:b\nLOG:c", false).unwrap();
//! assert_eq!(out, SplitOutcome::emit(6, b"LOG:a\n"));
//! ```

mod config;
mod encoding;
mod error;
mod reader;
mod split;
mod trim;

pub use config::{
    ScanLimits, Tokenizer, TokenizerConfig, DEFAULT_FORCE_FLUSH_PERIOD,
    DEFAULT_INITIAL_BUFFER_SIZE, DEFAULT_MAX_LOG_SIZE,
};
pub use encoding::{EncodedSeparators, Encoding};
pub use error::{PatternField, ScanError, SplitConfigError, SplitError};
pub use reader::{ScannedRecord, Scanner};
pub use split::{
    LineEndSplit, LineStartSplit, NewlineSplit, NoSplit, SplitConfig, SplitFunc, SplitOutcome,
    Splitter,
};
pub use trim::{Trim, TrimConfig, TrimMode};

#[cfg(feature = "tokio")]
pub use reader::AsyncScanner;
