//! Text encodings for strings stored in MXE and XLB files

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Byte encoding of stored text
///
/// The game's internal strings are Shift-JIS; UTF-8 is accepted for
/// hand-made files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    ShiftJis,
    Utf8,
}

impl TextEncoding {
    #[inline]
    pub fn as_encoding_rs(self) -> &'static Encoding {
        match self {
            TextEncoding::ShiftJis => SHIFT_JIS,
            TextEncoding::Utf8 => UTF_8,
        }
    }

    /// Decode bytes, replacing malformed sequences
    pub fn decode(self, bytes: &[u8]) -> String {
        let (cow, _had_errors) = self.as_encoding_rs().decode_without_bom_handling(bytes);
        cow.into_owned()
    }

    /// Decode a C-style string: stop at the first NUL
    pub fn decode_cstr(self, bytes: &[u8]) -> String {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.decode(&bytes[..end])
    }

    /// Encode text; unrepresentable characters are replaced
    pub fn encode(self, s: &str) -> Vec<u8> {
        let (cow, _, _had_errors) = self.as_encoding_rs().encode(s);
        cow.into_owned()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::ShiftJis => f.write_str("shift_jis"),
            TextEncoding::Utf8 => f.write_str("utf-8"),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "shift_jis" | "shift_jisx0213" | "sjis" | "cp932" => Ok(TextEncoding::ShiftJis),
            "utf_8" | "utf8" => Ok(TextEncoding::Utf8),
            other => Err(Error::Config(format!("unsupported text encoding '{}'", other))),
        }
    }
}
