//! Field codec
//!
//! Converts the raw bytes of a record field into a displayable [`Value`] and
//! back, according to the field's [`DataType`].
//!
//! ## Fidelity
//!
//! Floats are rounded to 2 decimal digits on decode. Most float fields in the
//! game data carry no fractional precision beyond that, but an MXE rewritten
//! from exported values is not guaranteed to be bit-identical for floats that
//! were not already at that precision.
//!
//! ## Example
//!
//! ```rust
//! use mxe::codec::{decode, encode, DataType, TextEncoding, Value};
//!
//! let dt: DataType = "<h".parse()?;
//! let value = decode(&[0xCD, 0xAB, 0x34, 0x12], dt, TextEncoding::default())?;
//! assert_eq!(value.to_string(), "0x12-34-AB-CD");
//! assert_eq!(encode(&value, dt, TextEncoding::default())?, vec![0xCD, 0xAB, 0x34, 0x12]);
//! # Ok::<(), mxe::Error>(())
//! ```

mod text;
mod types;

pub use text::TextEncoding;
pub use types::{DataType, Endianness};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;

use crate::error::{Error, Result};

/// Decoded, displayable form of a field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    /// Hex display string, e.g. `0x12-34-AB-CD`
    Hex(String),
    Text(String),
}

impl Value {
    /// Parse a table cell into a value of the given type
    pub fn parse(text: &str, data_type: DataType) -> Result<Value> {
        let invalid = |reason: String| Error::InvalidValue {
            value: text.to_string(),
            data_type: data_type.to_string(),
            reason,
        };

        match data_type {
            DataType::Int32(_)
            | DataType::Int16(_)
            | DataType::Int8
            | DataType::Id(_)
            | DataType::IdPointer(_)
            | DataType::StringPointer(_) => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| invalid(e.to_string())),
            DataType::Float32(_) => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| invalid(e.to_string())),
            DataType::Hex(_) => {
                parse_hex(text).map_err(invalid)?;
                Ok(Value::Hex(text.trim().to_string()))
            }
            DataType::Text => Ok(Value::Text(text.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            // Always keep a decimal point so integral floats read as floats
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Hex(s) | Value::Text(s) => f.write_str(s),
        }
    }
}

/// Decode field bytes into a value
///
/// `bytes` must hold at least the type's width; extra bytes are ignored.
pub fn decode(bytes: &[u8], data_type: DataType, encoding: TextEncoding) -> Result<Value> {
    if let Some(width) = data_type.width() {
        if bytes.len() < width {
            return Err(Error::InvalidValue {
                value: format_hex(bytes, Endianness::Big),
                data_type: data_type.to_string(),
                reason: format!("expected {} bytes, got {}", width, bytes.len()),
            });
        }
    }

    let mut cursor = Cursor::new(bytes);
    let value = match data_type {
        DataType::Int32(e) | DataType::Id(e) | DataType::IdPointer(e) | DataType::StringPointer(e) => {
            Value::Int(read_i32(&mut cursor, e)? as i64)
        }
        DataType::Int16(e) => {
            let v = match e {
                Endianness::Little => cursor.read_i16::<LittleEndian>()?,
                Endianness::Big => cursor.read_i16::<BigEndian>()?,
            };
            Value::Int(v as i64)
        }
        DataType::Int8 => Value::Int(cursor.read_i8()? as i64),
        DataType::Float32(e) => {
            let raw = match e {
                Endianness::Little => cursor.read_f32::<LittleEndian>()?,
                Endianness::Big => cursor.read_f32::<BigEndian>()?,
            };
            Value::Float(round2(raw as f64))
        }
        DataType::Hex(e) => Value::Hex(format_hex(&bytes[..4], e)),
        DataType::Text => Value::Text(encoding.decode(bytes).trim_end_matches('\0').to_string()),
    };
    Ok(value)
}

/// Encode a value into field bytes
///
/// Text is encoded as-is; no terminating NUL or padding is added.
pub fn encode(value: &Value, data_type: DataType, encoding: TextEncoding) -> Result<Vec<u8>> {
    let invalid = |reason: &str| Error::InvalidValue {
        value: value.to_string(),
        data_type: data_type.to_string(),
        reason: reason.to_string(),
    };

    let mut buf = Vec::with_capacity(data_type.width().unwrap_or(0));
    match (data_type, value) {
        (
            DataType::Int32(e) | DataType::Id(e) | DataType::IdPointer(e) | DataType::StringPointer(e),
            Value::Int(v),
        ) => {
            let v = i32::try_from(*v).map_err(|_| invalid("out of range for a 32-bit integer"))?;
            match e {
                Endianness::Little => buf.write_i32::<LittleEndian>(v)?,
                Endianness::Big => buf.write_i32::<BigEndian>(v)?,
            }
        }
        (DataType::Int16(e), Value::Int(v)) => {
            let v = i16::try_from(*v).map_err(|_| invalid("out of range for a 16-bit integer"))?;
            match e {
                Endianness::Little => buf.write_i16::<LittleEndian>(v)?,
                Endianness::Big => buf.write_i16::<BigEndian>(v)?,
            }
        }
        (DataType::Int8, Value::Int(v)) => {
            let v = i8::try_from(*v).map_err(|_| invalid("out of range for an 8-bit integer"))?;
            buf.write_i8(v)?;
        }
        (DataType::Float32(e), Value::Float(v)) => {
            let narrowed = *v as f32;
            if v.is_finite() && !narrowed.is_finite() {
                return Err(invalid("out of range for a 32-bit float"));
            }
            write_f32(&mut buf, narrowed, e)?
        }
        (DataType::Float32(e), Value::Int(v)) => write_f32(&mut buf, *v as f32, e)?,
        (DataType::Hex(e), Value::Hex(s)) => {
            let mut bytes = parse_hex(s).map_err(|reason| invalid(&reason))?;
            if e == Endianness::Little {
                bytes.reverse();
            }
            buf.extend_from_slice(&bytes);
        }
        (DataType::Text, Value::Text(s)) => buf.extend_from_slice(&encoding.encode(s)),
        _ => return Err(invalid("value kind does not match data type")),
    }
    Ok(buf)
}

/// Decode bytes straight to their display text
pub fn bytes_to_text(bytes: &[u8], data_type: DataType, encoding: TextEncoding) -> Result<String> {
    decode(bytes, data_type, encoding).map(|v| v.to_string())
}

/// Parse display text and encode it to bytes
pub fn text_to_bytes(text: &str, data_type: DataType, encoding: TextEncoding) -> Result<Vec<u8>> {
    encode(&Value::parse(text, data_type)?, data_type, encoding)
}

/// Format bytes as `0x12-34-AB-CD`
///
/// Little-endian display lists the bytes in reverse order.
pub fn format_hex(bytes: &[u8], endianness: Endianness) -> String {
    let pairs: Vec<String> = match endianness {
        Endianness::Big => bytes.iter().map(|b| format!("{:02X}", b)).collect(),
        Endianness::Little => bytes.iter().rev().map(|b| format!("{:02X}", b)).collect(),
    };
    format!("0x{}", pairs.join("-"))
}

/// Parse a 4-byte hex display back into bytes in display order
fn parse_hex(text: &str) -> std::result::Result<Vec<u8>, String> {
    let digits: String = text.trim().replace("0x", "").replace('-', "");
    if digits.len() != 8 {
        return Err(format!("expected 8 hex digits, got {}", digits.len()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex digits at position {}", i))
        })
        .collect()
}

fn read_i32(cursor: &mut Cursor<&[u8]>, endianness: Endianness) -> Result<i32> {
    Ok(match endianness {
        Endianness::Little => cursor.read_i32::<LittleEndian>()?,
        Endianness::Big => cursor.read_i32::<BigEndian>()?,
    })
}

fn write_f32(buf: &mut Vec<u8>, v: f32, endianness: Endianness) -> Result<()> {
    match endianness {
        Endianness::Little => buf.write_f32::<LittleEndian>(v)?,
        Endianness::Big => buf.write_f32::<BigEndian>(v)?,
    }
    Ok(())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENC: TextEncoding = TextEncoding::Utf8;

    fn dt(s: &str) -> DataType {
        s.parse().unwrap()
    }

    #[test]
    fn test_integers() {
        assert_eq!(decode(&[0x10, 0, 0, 0], dt("<i"), ENC).unwrap(), Value::Int(16));
        assert_eq!(decode(&[0, 0, 0, 0x10], dt(">i"), ENC).unwrap(), Value::Int(16));
        assert_eq!(decode(&[0xFF, 0xFF], dt("<i2"), ENC).unwrap(), Value::Int(-1));
        assert_eq!(decode(&[0x01, 0x00], dt(">i2"), ENC).unwrap(), Value::Int(256));
        assert_eq!(decode(&[0x80], dt("i1"), ENC).unwrap(), Value::Int(-128));

        assert_eq!(text_to_bytes("-2", dt("<i"), ENC).unwrap(), vec![0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(text_to_bytes("258", dt(">i2"), ENC).unwrap(), vec![0x01, 0x02]);
        assert_eq!(text_to_bytes("127", dt("i1"), ENC).unwrap(), vec![0x7F]);
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(matches!(
            text_to_bytes("128", dt("i1"), ENC),
            Err(Error::InvalidValue { .. })
        ));
        assert!(text_to_bytes("70000", dt("<i2"), ENC).is_err());
        assert!(text_to_bytes("abc", dt("<i"), ENC).is_err());
    }

    #[test]
    fn test_float_rounds_to_two_decimals() {
        let bytes = 12.3456f32.to_le_bytes();
        assert_eq!(decode(&bytes, dt("<f"), ENC).unwrap(), Value::Float(12.35));

        let bytes = 0.0004f32.to_be_bytes();
        assert_eq!(decode(&bytes, dt(">f"), ENC).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_float_display_and_roundtrip() {
        let bytes = 1.5f32.to_le_bytes();
        let text = bytes_to_text(&bytes, dt("<f"), ENC).unwrap();
        assert_eq!(text, "1.5");
        assert_eq!(text_to_bytes(&text, dt("<f"), ENC).unwrap(), bytes.to_vec());

        let bytes = 3.0f32.to_le_bytes();
        assert_eq!(bytes_to_text(&bytes, dt("<f"), ENC).unwrap(), "3.0");
        assert_eq!(text_to_bytes("3", dt("<f"), ENC).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_float_out_of_range() {
        assert!(matches!(
            text_to_bytes("1e39", dt("<f"), ENC),
            Err(Error::InvalidValue { .. })
        ));
        assert!(text_to_bytes("-1e39", dt(">f"), ENC).is_err());
        assert_eq!(
            text_to_bytes("3.4e38", dt("<f"), ENC).unwrap(),
            3.4e38f32.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_hex_display() {
        let bytes = [0x12, 0x34, 0xAB, 0xCD];
        assert_eq!(bytes_to_text(&bytes, dt(">h"), ENC).unwrap(), "0x12-34-AB-CD");
        assert_eq!(bytes_to_text(&bytes, dt("<h"), ENC).unwrap(), "0xCD-AB-34-12");
    }

    #[test]
    fn test_hex_roundtrip_both_endians() {
        let bytes = vec![0x01, 0x02, 0x0A, 0xFF];
        for id in ["<h", ">h"] {
            let text = bytes_to_text(&bytes, dt(id), ENC).unwrap();
            assert_eq!(text_to_bytes(&text, dt(id), ENC).unwrap(), bytes);
        }
        assert!(text_to_bytes("0x12-34", dt("<h"), ENC).is_err());
        assert!(text_to_bytes("0xZZ-34-56-78", dt("<h"), ENC).is_err());
    }

    #[test]
    fn test_pointer_types_decode_as_addresses() {
        assert_eq!(decode(&[0x00, 0x01, 0, 0], dt("<p"), ENC).unwrap(), Value::Int(256));
        assert_eq!(decode(&[0, 0, 0x01, 0x00], dt(">pi"), ENC).unwrap(), Value::Int(256));
        assert_eq!(decode(&[0x2A, 0, 0, 0], dt("<ip"), ENC).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_text_strips_trailing_nuls() {
        assert_eq!(
            decode(b"Gallian\0\0\0", DataType::Text, ENC).unwrap(),
            Value::Text("Gallian".into())
        );
        assert_eq!(text_to_bytes("Gallian", DataType::Text, ENC).unwrap(), b"Gallian".to_vec());
    }

    #[test]
    fn test_short_input_is_rejected() {
        assert!(decode(&[0x01, 0x02], dt("<i"), ENC).is_err());
    }

    #[test]
    fn test_value_kind_mismatch() {
        assert!(encode(&Value::Text("x".into()), dt("<i"), ENC).is_err());
    }
}
