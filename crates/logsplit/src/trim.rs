use serde::Deserialize;

use crate::error::SplitError;
use crate::split::{SplitFunc, SplitOutcome};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub preserve_leading_whitespaces: bool,
    pub preserve_trailing_whitespaces: bool,
}

impl TrimConfig {
    pub fn mode(&self) -> TrimMode {
        match (
            self.preserve_leading_whitespaces,
            self.preserve_trailing_whitespaces,
        ) {
            (true, true) => TrimMode::None,
            (true, false) => TrimMode::Trailing,
            (false, true) => TrimMode::Leading,
            (false, false) => TrimMode::Both,
        }
    }
}

/// Which ends of a token lose their ASCII whitespace.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum TrimMode {
    #[default]
    None,
    Leading,
    Trailing,
    Both,
}

impl TrimMode {
    pub fn apply<'a>(self, token: &'a [u8]) -> &'a [u8] {
        match self {
            TrimMode::None => token,
            TrimMode::Leading => trim_leading(token),
            TrimMode::Trailing => trim_trailing(token),
            TrimMode::Both => trim_trailing(trim_leading(token)),
        }
    }
}

fn is_space(byte: &u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

fn trim_leading(token: &[u8]) -> &[u8] {
    let start = token
        .iter()
        .position(|b| !is_space(b))
        .unwrap_or(token.len());
    &token[start..]
}

fn trim_trailing(token: &[u8]) -> &[u8] {
    let end = token.iter().rposition(|b| !is_space(b)).map_or(0, |i| i + 1);
    &token[..end]
}

/// Wraps a strategy and trims every token it emits.
///
/// "Need more data" passes through untouched, and the advance is never
/// changed, so trimmed bytes are still consumed.
#[derive(Debug, Clone)]
pub struct Trim<S> {
    inner: S,
    mode: TrimMode,
}

impl<S> Trim<S> {
    pub fn new(inner: S, mode: TrimMode) -> Self {
        Self { inner, mode }
    }

    pub fn mode(&self) -> TrimMode {
        self.mode
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SplitFunc> SplitFunc for Trim<S> {
    fn split<'a>(&self, data: &'a [u8], at_eof: bool) -> Result<SplitOutcome<'a>, SplitError> {
        let outcome = self.inner.split(data, at_eof)?;
        if outcome.is_need_more() {
            return Ok(outcome);
        }
        Ok(SplitOutcome {
            advance: outcome.advance,
            token: outcome.token.map(|token| self.mode.apply(token)),
        })
    }

    fn finish_forced<'a>(&self, token: &'a [u8]) -> &'a [u8] {
        self.mode.apply(self.inner.finish_forced(token))
    }

    fn code_unit_width(&self) -> usize {
        self.inner.code_unit_width()
    }
}
