//! Field data types used by record templates

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Byte order of a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl FromStr for Endianness {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "<" | "little" => Ok(Endianness::Little),
            ">" | "big" => Ok(Endianness::Big),
            other => Err(Error::Config(format!(
                "endianness must be '<' or '>', got '{}'",
                other
            ))),
        }
    }
}

/// Data type of a single record field
///
/// Identifiers follow the template file notation: an endianness prefix
/// (`<` or `>`) followed by the type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// `<i` / `>i` - signed 32-bit integer
    Int32(Endianness),
    /// `<i2` / `>i2` - signed 16-bit integer
    Int16(Endianness),
    /// `<f` / `>f` - 32-bit float, shown rounded to 2 decimals
    Float32(Endianness),
    /// `<h` / `>h` - 4 raw bytes shown as `0x12-34-AB-CD`
    Hex(Endianness),
    /// `i1` - signed 8-bit integer
    Int8,
    /// `<ip` / `>ip` - XLB text id stored directly in the record
    Id(Endianness),
    /// `<pi` / `>pi` - address of a string holding an XLB text id
    IdPointer(Endianness),
    /// `<p` / `>p` - address of a string stored inside the MXE
    StringPointer(Endianness),
    /// `s` - null-terminated text of variable length
    Text,
}

impl DataType {
    /// Every data type, in template notation order
    pub const ALL: [DataType; 16] = [
        DataType::Int32(Endianness::Little),
        DataType::Int16(Endianness::Little),
        DataType::Float32(Endianness::Little),
        DataType::Hex(Endianness::Little),
        DataType::Int32(Endianness::Big),
        DataType::Int16(Endianness::Big),
        DataType::Float32(Endianness::Big),
        DataType::Hex(Endianness::Big),
        DataType::Int8,
        DataType::Id(Endianness::Little),
        DataType::IdPointer(Endianness::Little),
        DataType::StringPointer(Endianness::Little),
        DataType::Id(Endianness::Big),
        DataType::IdPointer(Endianness::Big),
        DataType::StringPointer(Endianness::Big),
        DataType::Text,
    ];

    /// Template identifier of this type
    pub fn as_str(&self) -> &'static str {
        use Endianness::*;
        match self {
            DataType::Int32(Little) => "<i",
            DataType::Int32(Big) => ">i",
            DataType::Int16(Little) => "<i2",
            DataType::Int16(Big) => ">i2",
            DataType::Float32(Little) => "<f",
            DataType::Float32(Big) => ">f",
            DataType::Hex(Little) => "<h",
            DataType::Hex(Big) => ">h",
            DataType::Int8 => "i1",
            DataType::Id(Little) => "<ip",
            DataType::Id(Big) => ">ip",
            DataType::IdPointer(Little) => "<pi",
            DataType::IdPointer(Big) => ">pi",
            DataType::StringPointer(Little) => "<p",
            DataType::StringPointer(Big) => ">p",
            DataType::Text => "s",
        }
    }

    /// Size of the field in bytes, `None` for variable-length text
    pub fn width(&self) -> Option<usize> {
        match self {
            DataType::Int32(_)
            | DataType::Float32(_)
            | DataType::Hex(_)
            | DataType::Id(_)
            | DataType::IdPointer(_)
            | DataType::StringPointer(_) => Some(4),
            DataType::Int16(_) => Some(2),
            DataType::Int8 => Some(1),
            DataType::Text => None,
        }
    }

    /// Whether the stored value is an address or id rather than plain data
    ///
    /// Pointer fields are never rewritten from a record table.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            DataType::Id(_) | DataType::IdPointer(_) | DataType::StringPointer(_)
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .iter()
            .find(|dt| dt.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownDataType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_roundtrip() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
        }
    }

    #[test]
    fn test_unknown_identifier() {
        assert!(matches!(
            "<q".parse::<DataType>(),
            Err(Error::UnknownDataType(s)) if s == "<q"
        ));
    }

    #[test]
    fn test_widths() {
        assert_eq!(DataType::Int8.width(), Some(1));
        assert_eq!(DataType::Int16(Endianness::Big).width(), Some(2));
        assert_eq!(DataType::IdPointer(Endianness::Little).width(), Some(4));
        assert_eq!(DataType::Text.width(), None);
    }

    #[test]
    fn test_pointer_types() {
        assert!(DataType::StringPointer(Endianness::Little).is_pointer());
        assert!(DataType::IdPointer(Endianness::Big).is_pointer());
        assert!(DataType::Id(Endianness::Little).is_pointer());
        assert!(!DataType::Hex(Endianness::Little).is_pointer());
        assert!(!DataType::Int32(Endianness::Big).is_pointer());
    }
}
