//! XLB container reader and slot placement

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::codec::TextEncoding;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};
use crate::xlb::header::{XlbSection, CHUNK_MARKER, SECTIONS_OFFSET, SECTION_COUNT_OFFSET};

/// Key of the first slot of the first section
const FIRST_KEY: i64 = 48;
/// Key distance between two neighbouring slots
const KEY_STRIDE: i64 = 16;
/// Slots consumed by every section boundary
const SECTION_BOUNDARY_COST: i64 = 3;

/// Section transitions whose computed slot is wrong in the shipped
/// `text_mx.xlb`: (previous key, key, slot)
const BOUNDARY_ANOMALIES: &[(i32, i32, i64)] = &[
    (108120, 108184, 0),
    (157368, 157496, 0),
    (160248, 160312, 0),
    (175880, 177416, 1),
    (172856, 174456, 0),
];

/// Parsed XLB text container
#[derive(Debug, Clone)]
pub struct Xlb {
    sections: Vec<XlbSection>,
    diagnostics: Vec<Diagnostic>,
}

impl Xlb {
    /// Read and parse an XLB file
    pub fn open<P: AsRef<Path>>(path: P, encoding: TextEncoding) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Reading XLB file: {}", path.display());
        let data = fs::read(path)?;
        Self::parse(&data, encoding)
    }

    /// Parse XLB data
    pub fn parse(data: &[u8], encoding: TextEncoding) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        cursor.seek(SeekFrom::Start(SECTION_COUNT_OFFSET))?;
        let section_count = cursor.read_i32::<LittleEndian>()?;
        if section_count < 0 {
            return Err(Error::InvalidXlb(format!("negative section count {}", section_count)));
        }

        cursor.seek(SeekFrom::Start(SECTIONS_OFFSET))?;
        let mut sections = Vec::new();
        for _ in 0..section_count {
            sections.push(XlbSection::parse(&mut cursor, encoding)?);
        }

        let marker_pos = cursor.position();
        let mut marker = [0u8; 4];
        cursor.read_exact(&mut marker)?;
        if &marker != CHUNK_MARKER {
            return Err(Error::InvalidXlb(format!(
                "expected CHNK after section headers at {:#x}, found {:02X?}",
                marker_pos, marker
            )));
        }

        let payload_count = cursor.read_i32::<LittleEndian>()?;
        let counts: Vec<usize> = sections.iter().map(|s| s.record_count()).collect();
        let mut placer = SlotPlacer::new(&counts);
        let mut diagnostics = Vec::new();

        for index in 0..payload_count.max(0) as usize {
            let key = cursor.read_i32::<LittleEndian>()?;
            let len = cursor.read_i32::<LittleEndian>()?;
            let remaining = (data.len() as u64).saturating_sub(cursor.position());
            if len < 0 || len as u64 > remaining {
                return Err(Error::InvalidXlb(format!(
                    "payload record {} (key {}) has invalid length {}",
                    index, key, len
                )));
            }
            let mut payload = vec![0u8; len as usize];
            cursor.read_exact(&mut payload)?;

            let (section, slot) = placer.place(key);
            let target = match (sections.get_mut(section), usize::try_from(slot)) {
                (Some(placed), Ok(slot)) => placed.slots.get_mut(slot),
                _ => None,
            };

            let reason = match target {
                Some(target) if !target.filled => {
                    target.payload = payload;
                    target.filled = true;
                    continue;
                }
                Some(_) => "slot already filled",
                None => "position outside of every section",
            };
            diagnostics.push(
                Diagnostic::entry(
                    index,
                    DiagnosticKind::XlbPlacement {
                        key,
                        section,
                        slot,
                        reason: reason.to_string(),
                    },
                )
                .emit(),
            );
        }

        tracing::info!(
            "XLB: {} sections, {} payload records, {} unplaced",
            sections.len(),
            payload_count,
            diagnostics.len()
        );

        Ok(Xlb {
            sections,
            diagnostics,
        })
    }

    /// Payload stored under a text id
    ///
    /// Returns an empty slice for a known id whose slot received no payload.
    pub fn find_by_id(&self, key: i32) -> Option<&[u8]> {
        self.sections
            .iter()
            .flat_map(|section| section.slots.iter())
            .find(|slot| slot.key == key)
            .map(|slot| slot.payload.as_slice())
    }

    /// Decoded text stored under a text id, trailing NULs removed
    pub fn find_text(&self, key: i32, encoding: TextEncoding) -> Option<String> {
        self.find_by_id(key)
            .map(|payload| encoding.decode(payload).trim_end_matches('\0').to_string())
    }

    pub fn sections(&self) -> &[XlbSection] {
        &self.sections
    }

    /// Payload records that could not be placed
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Walks payload keys and infers their (section, slot) position
///
/// Payload records carry no slot index. Consecutive keys are `KEY_STRIDE`
/// apart per slot, and crossing into the next section costs
/// `SECTION_BOUNDARY_COST` extra slots worth of keys.
#[derive(Debug)]
pub(crate) struct SlotPlacer<'a> {
    counts: &'a [usize],
    section: usize,
    slot: i64,
    previous_key: Option<i32>,
}

impl<'a> SlotPlacer<'a> {
    pub(crate) fn new(counts: &'a [usize]) -> Self {
        Self {
            counts,
            section: 0,
            slot: 0,
            previous_key: None,
        }
    }

    fn capacity(&self, section: usize) -> i64 {
        self.counts.get(section).map_or(0, |&c| c as i64)
    }

    /// Position of the next payload record
    ///
    /// The slot may be negative or beyond the last section; callers reject
    /// such positions.
    pub(crate) fn place(&mut self, key: i32) -> (usize, i64) {
        let Some(previous_key) = self.previous_key.replace(key) else {
            self.section = 0;
            self.slot = (key as i64 - FIRST_KEY).div_euclid(KEY_STRIDE);
            return (self.section, self.slot);
        };

        let delta = (key as i64 - previous_key as i64).div_euclid(KEY_STRIDE);
        if self.slot + delta < self.capacity(self.section) {
            self.slot += delta;
            return (self.section, self.slot);
        }

        let empty_left = self.capacity(self.section) - 1 - self.slot;
        self.section += 1;
        self.slot = delta - empty_left - SECTION_BOUNDARY_COST;

        if let Some(&(_, _, slot)) = BOUNDARY_ANOMALIES
            .iter()
            .find(|&&(prev, next, _)| prev == previous_key && next == key)
        {
            self.slot = slot;
        }

        // Skip sections too small to hold the slot, usually empty ones
        while self.section < self.counts.len() && self.slot >= self.capacity(self.section) {
            self.slot -= self.capacity(self.section) - 1 + SECTION_BOUNDARY_COST;
            self.section += 1;
        }

        (self.section, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an XLB image: sections of (stride, skeleton keys, description)
    /// followed by (key, payload) records
    fn build_xlb(sections: &[(i32, &[i32], &str)], payloads: &[(i32, &[u8])]) -> Vec<u8> {
        let mut data = b"XLB\0".to_vec();
        data.extend_from_slice(&(sections.len() as i32).to_le_bytes());
        data.resize(SECTIONS_OFFSET as usize, 0);
        for (stride, keys, description) in sections {
            data.extend_from_slice(&stride.to_le_bytes());
            data.extend_from_slice(&(keys.len() as i32).to_le_bytes());
            data.extend_from_slice(&(description.len() as i32).to_le_bytes());
            data.extend_from_slice(description.as_bytes());
            for key in keys.iter() {
                data.extend_from_slice(&key.to_le_bytes());
                data.extend(std::iter::repeat(0xAA).take(*stride as usize - 4));
            }
        }
        data.extend_from_slice(CHUNK_MARKER);
        data.extend_from_slice(&(payloads.len() as i32).to_le_bytes());
        for (key, payload) in payloads {
            data.extend_from_slice(&key.to_le_bytes());
            data.extend_from_slice(&(payload.len() as i32).to_le_bytes());
            data.extend_from_slice(payload);
        }
        data
    }

    fn payloads(xlb: &Xlb, section: usize) -> Vec<&[u8]> {
        xlb.sections()[section]
            .slots
            .iter()
            .map(|s| s.payload.as_slice())
            .collect()
    }

    #[test]
    fn test_consecutive_keys_fill_consecutive_slots() {
        let data = build_xlb(
            &[(8, &[48, 64, 80, 96], "Names")],
            &[(48, b"a"), (64, b"b"), (80, b"c")],
        );
        let xlb = Xlb::parse(&data, TextEncoding::Utf8).unwrap();
        assert_eq!(xlb.sections()[0].description, "Names");
        assert_eq!(xlb.sections()[0].record_size, 8);
        assert_eq!(payloads(&xlb, 0), vec![&b"a"[..], b"b", b"c", b""]);
        assert!(xlb.diagnostics().is_empty());
    }

    #[test]
    fn test_key_gap_skips_slots() {
        let data = build_xlb(&[(4, &[48, 64, 80, 96], "")], &[(64, b"x"), (96, b"y")]);
        let xlb = Xlb::parse(&data, TextEncoding::Utf8).unwrap();
        assert_eq!(payloads(&xlb, 0), vec![&b""[..], b"x", b"", b"y"]);
        assert!(xlb.sections()[0].slots[1].is_filled());
        assert!(!xlb.sections()[0].slots[2].is_filled());
    }

    #[test]
    fn test_section_boundary_costs_three_slots() {
        // After slot 1 of a 2-slot section, a delta of 3 lands on slot 0 of
        // the next section: 3 - 0 left - 3
        let data = build_xlb(
            &[(4, &[48, 64], "First"), (4, &[112, 128, 144, 160, 176], "Second")],
            &[(48, b"a"), (64, b"b"), (112, b"c"), (128, b"d")],
        );
        let xlb = Xlb::parse(&data, TextEncoding::Utf8).unwrap();
        assert_eq!(payloads(&xlb, 0), vec![&b"a"[..], b"b"]);
        assert_eq!(payloads(&xlb, 1), vec![&b"c"[..], b"d", b"", b"", b""]);
    }

    #[test]
    fn test_boundary_with_empty_slots_left() {
        let counts = [4, 4];
        let mut placer = SlotPlacer::new(&counts);
        assert_eq!(placer.place(48), (0, 0));
        // delta 6 from slot 0: 3 slots left empty, 6 - 3 - 3 = 0
        assert_eq!(placer.place(144), (1, 0));
        assert_eq!(placer.place(176), (1, 2));
    }

    #[test]
    fn test_empty_section_is_skipped() {
        let counts = [1, 0, 3];
        let mut placer = SlotPlacer::new(&counts);
        assert_eq!(placer.place(48), (0, 0));
        assert_eq!(placer.place(128), (2, 0));
    }

    #[test]
    fn test_boundary_anomaly_overrides_slot() {
        let counts = [6755, 4];
        let mut placer = SlotPlacer::new(&counts);
        assert_eq!(placer.place(108120), (0, 6754));
        assert_eq!(placer.place(108184), (1, 0));

        // same geometry without a table entry keeps the computed slot
        let mut placer = SlotPlacer::new(&counts);
        assert_eq!(placer.place(108120), (0, 6754));
        assert_eq!(placer.place(108200), (1, 2));
    }

    #[test]
    fn test_unplaceable_record_is_reported() {
        let data = build_xlb(&[(4, &[48], "")], &[(48, b"a"), (400, b"b")]);
        let xlb = Xlb::parse(&data, TextEncoding::Utf8).unwrap();
        assert_eq!(payloads(&xlb, 0), vec![&b"a"[..]]);
        assert_eq!(xlb.diagnostics().len(), 1);
        assert!(matches!(
            xlb.diagnostics()[0].kind,
            DiagnosticKind::XlbPlacement { key: 400, .. }
        ));
    }

    #[test]
    fn test_wrong_marker_is_fatal() {
        let mut data = build_xlb(&[(4, &[48], "")], &[(48, b"a")]);
        let marker = data.windows(4).position(|w| w == CHUNK_MARKER).unwrap();
        data[marker..marker + 4].copy_from_slice(b"JUNK");
        assert!(matches!(
            Xlb::parse(&data, TextEncoding::Utf8),
            Err(Error::InvalidXlb(_))
        ));
    }

    #[test]
    fn test_find_by_id() {
        let data = build_xlb(
            &[(4, &[48, 64], "")],
            &[(48, b"Line one\nLine two\0"), (64, b"")],
        );
        let xlb = Xlb::parse(&data, TextEncoding::Utf8).unwrap();
        assert_eq!(
            xlb.find_text(48, TextEncoding::Utf8).as_deref(),
            Some("Line one\nLine two")
        );
        assert_eq!(xlb.find_by_id(64), Some(&b""[..]));
        assert_eq!(xlb.find_by_id(999), None);
    }
}
