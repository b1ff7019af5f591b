use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::encoding::Encoding;
use crate::error::SplitConfigError;
use crate::reader::Scanner;
use crate::split::{SplitConfig, Splitter};
use crate::trim::{Trim, TrimConfig, TrimMode};

pub const DEFAULT_MAX_LOG_SIZE: usize = 1024 * 1024;
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 16 * 1024;
pub const DEFAULT_FORCE_FLUSH_PERIOD: Duration = Duration::from_millis(500);

/// Buffer bounds for a scanner.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ScanLimits {
    /// Largest record the scanner will hold; longer ones are truncated.
    pub max_record_size: usize,
    pub initial_buffer_size: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_LOG_SIZE,
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
        }
    }
}

/// Everything needed to tokenize one kind of stream.
///
/// ```toml
/// encoding = "utf-8"
/// flush_at_eof = true
/// max_log_size = 65536
///
/// [multiline]
/// line_start_pattern = '^\d{4}-\d{2}-\d{2}'
/// ```
///
/// Unknown keys are rejected, so a misspelled option fails to load instead
/// of silently keeping its default.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    pub encoding: String,
    pub multiline: SplitConfig,
    pub flush_at_eof: bool,
    pub max_log_size: usize,
    pub initial_buffer_size: usize,
    /// Milliseconds a partial record may wait for more input before the async
    /// scanner flushes it; zero disables.
    pub force_flush_period_ms: u64,
    pub preserve_leading_whitespaces: bool,
    pub preserve_trailing_whitespaces: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8.name().to_string(),
            multiline: SplitConfig::default(),
            flush_at_eof: false,
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            force_flush_period_ms: DEFAULT_FORCE_FLUSH_PERIOD.as_millis() as u64,
            preserve_leading_whitespaces: false,
            preserve_trailing_whitespaces: false,
        }
    }
}

impl TokenizerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, SplitConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn limits(&self) -> ScanLimits {
        ScanLimits {
            max_record_size: self.max_log_size,
            initial_buffer_size: self.initial_buffer_size,
        }
    }

    pub fn trim(&self) -> TrimConfig {
        TrimConfig {
            preserve_leading_whitespaces: self.preserve_leading_whitespaces,
            preserve_trailing_whitespaces: self.preserve_trailing_whitespaces,
        }
    }

    pub fn build(&self) -> Result<Tokenizer, SplitConfigError> {
        let encoding = Encoding::lookup(&self.encoding)?;
        let splitter = self
            .multiline
            .build(encoding, self.flush_at_eof, self.max_log_size)?;

        let mut trim = self.trim().mode();
        if trim != TrimMode::None && !encoding.is_ascii_compatible() {
            debug!(encoding = %encoding, "whitespace trimming disabled for encoding");
            trim = TrimMode::None;
        }

        Ok(Tokenizer {
            encoding,
            splitter: Trim::new(splitter, trim),
            limits: self.limits(),
            force_flush_period: (self.force_flush_period_ms > 0)
                .then(|| Duration::from_millis(self.force_flush_period_ms)),
        })
    }
}

/// A validated configuration, ready to open scanners.
///
/// The strategy is immutable, so one tokenizer can serve any number of
/// streams; each scanner gets its own copy.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    encoding: Encoding,
    splitter: Trim<Splitter>,
    limits: ScanLimits,
    force_flush_period: Option<Duration>,
}

impl Tokenizer {
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn splitter(&self) -> &Trim<Splitter> {
        &self.splitter
    }

    pub fn limits(&self) -> ScanLimits {
        self.limits
    }

    pub fn force_flush_period(&self) -> Option<Duration> {
        self.force_flush_period
    }

    pub fn scan<R: Read>(&self, reader: R) -> Scanner<R, Trim<Splitter>> {
        Scanner::new(reader, self.splitter.clone(), self.limits)
    }

    #[cfg(feature = "tokio")]
    pub fn scan_async<R>(&self, reader: R) -> crate::AsyncScanner<R, Trim<Splitter>>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let scanner = crate::AsyncScanner::new(reader, self.splitter.clone(), self.limits);
        match self.force_flush_period {
            Some(period) => scanner.with_force_flush_period(period),
            None => scanner,
        }
    }
}
