//! XLB section headers

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::codec::TextEncoding;
use crate::error::{Error, Result};

/// Offset of the section count
pub const SECTION_COUNT_OFFSET: u64 = 0x04;
/// Offset of the first section header
pub const SECTIONS_OFFSET: u64 = 0x10;
/// Tag that separates section headers from payload records
pub const CHUNK_MARKER: &[u8; 4] = b"CHNK";

/// One text slot of a section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XlbSlot {
    /// Text id
    pub key: i32,
    /// Encoded text, empty until a payload record is placed here
    pub payload: Vec<u8>,
    pub(crate) filled: bool,
}

impl XlbSlot {
    pub fn is_filled(&self) -> bool {
        self.filled
    }
}

/// A group of text records sharing one record layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XlbSection {
    /// Byte stride of a skeleton row
    pub record_size: u32,
    pub description: String,
    pub slots: Vec<XlbSlot>,
}

impl XlbSection {
    /// Number of slots; fixed once the header is read
    pub fn record_count(&self) -> usize {
        self.slots.len()
    }

    /// Read one section header and its skeleton rows
    pub(crate) fn parse(cursor: &mut Cursor<&[u8]>, encoding: TextEncoding) -> Result<Self> {
        let header_pos = cursor.position();
        let record_size = cursor.read_i32::<LittleEndian>()?;
        let record_count = cursor.read_i32::<LittleEndian>()?;
        let description_len = cursor.read_i32::<LittleEndian>()?;

        if record_size < 4 || record_count < 0 || description_len < 0 {
            return Err(Error::InvalidXlb(format!(
                "bad section header at {:#x}: record size {}, record count {}, description length {}",
                header_pos, record_size, record_count, description_len
            )));
        }

        let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
        if description_len as u64 + record_count as u64 * record_size as u64 > remaining {
            return Err(Error::InvalidXlb(format!(
                "section at {:#x} extends past the end of the file",
                header_pos
            )));
        }

        let mut description = vec![0u8; description_len as usize];
        cursor.read_exact(&mut description)?;
        let description = encoding.decode(&description).trim_end_matches('\0').to_string();

        let mut slots = Vec::with_capacity(record_count as usize);
        for _ in 0..record_count {
            let key = cursor.read_i32::<LittleEndian>()?;
            cursor.seek(SeekFrom::Current(record_size as i64 - 4))?;
            slots.push(XlbSlot {
                key,
                payload: Vec::new(),
                filled: false,
            });
        }

        Ok(XlbSection {
            record_size: record_size as u32,
            description,
            slots,
        })
    }
}
