use std::{fmt, str::FromStr};

use memchr::memmem;

use crate::error::SplitConfigError;

/// Text encoding of the incoming byte stream.
///
/// Only the byte shape of `\n` and `\r` matters to the tokenizer, so
/// ASCII-compatible encodings share their separators with UTF-8.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum Encoding {
    /// Raw bytes with no text semantics.
    Nop,
    #[default]
    Utf8,
    /// UTF-8 that is passed through without replacing invalid sequences.
    Utf8Raw,
    Utf16Le,
    Utf16Be,
    Latin1,
    Windows1252,
    ShiftJis,
    Big5,
    Gbk,
    Gb18030,
    EucJp,
    EucKr,
}

impl Encoding {
    /// Resolves a configured encoding name, ignoring ASCII case.
    ///
    /// An empty name selects UTF-8.
    pub fn lookup(name: &str) -> Result<Self, SplitConfigError> {
        let normalized = name.trim().to_ascii_lowercase();
        let encoding = match normalized.as_str() {
            "nop" => Encoding::Nop,
            "" | "utf-8" | "utf8" | "ascii" | "us-ascii" => Encoding::Utf8,
            "utf8-raw" | "utf-8-raw" => Encoding::Utf8Raw,
            "utf-16" | "utf16" | "utf-16le" | "utf16le" | "utf16-le" => Encoding::Utf16Le,
            "utf-16be" | "utf16be" | "utf16-be" => Encoding::Utf16Be,
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Encoding::Latin1,
            "windows-1252" | "cp1252" => Encoding::Windows1252,
            "shift_jis" | "shift-jis" | "sjis" => Encoding::ShiftJis,
            "big5" => Encoding::Big5,
            "gbk" | "gb2312" => Encoding::Gbk,
            "gb18030" => Encoding::Gb18030,
            "euc-jp" => Encoding::EucJp,
            "euc-kr" => Encoding::EucKr,
            _ => return Err(SplitConfigError::UnsupportedEncoding(name.to_string())),
        };
        Ok(encoding)
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Nop => "nop",
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8Raw => "utf8-raw",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Latin1 => "iso-8859-1",
            Encoding::Windows1252 => "windows-1252",
            Encoding::ShiftJis => "shift_jis",
            Encoding::Big5 => "big5",
            Encoding::Gbk => "gbk",
            Encoding::Gb18030 => "gb18030",
            Encoding::EucJp => "euc-jp",
            Encoding::EucKr => "euc-kr",
        }
    }

    pub fn is_nop(self) -> bool {
        self == Encoding::Nop
    }

    /// True when every ASCII character encodes to its own single byte.
    pub fn is_ascii_compatible(self) -> bool {
        !matches!(self, Encoding::Nop | Encoding::Utf16Le | Encoding::Utf16Be)
    }

    /// Width in bytes of one code unit; separators only occur on multiples of it.
    pub fn unit_width(self) -> usize {
        match self {
            Encoding::Utf16Le | Encoding::Utf16Be => 2,
            _ => 1,
        }
    }

    /// Encodes one ASCII control character.
    fn encode_ascii(self, byte: u8) -> Vec<u8> {
        debug_assert!(byte.is_ascii());
        match self {
            Encoding::Utf16Le => vec![byte, 0x00],
            Encoding::Utf16Be => vec![0x00, byte],
            _ => vec![byte],
        }
    }

    pub fn separators(self) -> EncodedSeparators {
        EncodedSeparators {
            newline: self.encode_ascii(b'\n'),
            carriage_return: self.encode_ascii(b'\r'),
            unit_width: self.unit_width(),
        }
    }
}

impl FromStr for Encoding {
    type Err = SplitConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Encoding::lookup(s)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Newline and carriage return as they appear on the wire in one encoding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EncodedSeparators {
    newline: Vec<u8>,
    carriage_return: Vec<u8>,
    unit_width: usize,
}

impl EncodedSeparators {
    pub fn newline(&self) -> &[u8] {
        &self.newline
    }

    pub fn carriage_return(&self) -> &[u8] {
        &self.carriage_return
    }

    pub fn unit_width(&self) -> usize {
        self.unit_width
    }

    /// Offset of the first newline that starts on a code unit boundary.
    pub fn find_newline(&self, data: &[u8]) -> Option<usize> {
        find_aligned(data, &self.newline, self.unit_width)
    }

    /// Drops one trailing carriage return, if present.
    pub fn trim_carriage_return<'a>(&self, token: &'a [u8]) -> &'a [u8] {
        token
            .strip_suffix(self.carriage_return.as_slice())
            .unwrap_or(token)
    }
}

fn find_aligned(haystack: &[u8], needle: &[u8], align: usize) -> Option<usize> {
    // Encoded separators never overlap themselves, so skipping past a
    // misaligned hit cannot hide an aligned one.
    memmem::find_iter(haystack, needle).find(|idx| idx % align.max(1) == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_defaults_to_utf8() {
        assert_eq!(Encoding::lookup("").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::lookup("UTF-8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::lookup("Nop").unwrap(), Encoding::Nop);
        assert_eq!("utf-16be".parse::<Encoding>().unwrap(), Encoding::Utf16Be);
        assert_eq!(Encoding::lookup("Shift-JIS").unwrap(), Encoding::ShiftJis);
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let err = Encoding::lookup("klingon").unwrap_err();
        assert!(matches!(err, SplitConfigError::UnsupportedEncoding(name) if name == "klingon"));
    }

    #[test]
    fn utf16_separators_are_two_bytes() {
        let le = Encoding::Utf16Le.separators();
        assert_eq!(le.newline(), &[0x0A, 0x00]);
        assert_eq!(le.carriage_return(), &[0x0D, 0x00]);

        let be = Encoding::Utf16Be.separators();
        assert_eq!(be.newline(), &[0x00, 0x0A]);
        assert_eq!(be.carriage_return(), &[0x00, 0x0D]);
    }

    #[test]
    fn ascii_compatible_separators_are_single_bytes() {
        for enc in [Encoding::Utf8, Encoding::Latin1, Encoding::Big5, Encoding::Nop] {
            let seps = enc.separators();
            assert_eq!(seps.newline(), b"\n", "{enc}");
            assert_eq!(seps.carriage_return(), b"\r", "{enc}");
        }
    }

    #[test]
    fn newline_search_skips_misaligned_code_units() {
        let seps = Encoding::Utf16Le.separators();
        // U+0A41 ('ੁ') followed by U+0000 contains 0x0A 0x00 at an odd offset.
        let data = [0x41, 0x0A, 0x00, 0x00, 0x0A, 0x00];
        assert_eq!(seps.find_newline(&data), Some(4));
    }

    #[test]
    fn newline_search_passes_over_repeated_misaligned_hits() {
        let be = Encoding::Utf16Be.separators();
        // Three U+0A00 units hide 0x00 0x0A at offsets 1 and 3.
        let data = [0x0A, 0x00, 0x0A, 0x00, 0x0A, 0x00, 0x00, 0x0A];
        assert_eq!(be.find_newline(&data), Some(6));
        assert_eq!(be.find_newline(&data[..6]), None);

        let utf8 = Encoding::Utf8.separators();
        assert_eq!(utf8.find_newline(b"ab\ncd\n"), Some(2));
        assert_eq!(utf8.find_newline(b""), None);
    }

    #[test]
    fn carriage_return_trim_removes_one_suffix() {
        let seps = Encoding::Utf8.separators();
        assert_eq!(seps.trim_carriage_return(b"line\r\r"), b"line\r");
        assert_eq!(seps.trim_carriage_return(b"line"), b"line");
    }
}
