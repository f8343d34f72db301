//! # mxe
//!
//! A Rust library for reading and editing the Main Table of Valkyria
//! Chronicles 4 `.mxe` files.
//!
//! ## Overview
//!
//! An MXE file is a table of contents indexing fixed-layout records. The
//! field layout of each record type is not stored in the file; it comes from
//! an external template file. This library provides:
//!
//! - Template-driven decoding and in-place re-encoding of records
//! - Pointer resolution for strings in the MXE and text ids in `text_mx.xlb`
//! - Export of every record type to an editable table (CSV) and import back
//! - Lossless write-back: pointers are written exactly as they were read
//!
//! Records are never added, removed, moved or resized.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mxe::config::Settings;
//! use mxe::mxe::{MainTable, WriteOptions};
//! use mxe::table::{apply_table, export_tables, Table};
//! use mxe::template::TemplateRegistry;
//! use mxe::xlb::Xlb;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::default();
//!     let templates = TemplateRegistry::load("VlMx_entry_templates.csv")?;
//!     let xlb = Xlb::open("text_mx.xlb", settings.layout.encoding)?;
//!
//!     let mut main = MainTable::open(
//!         "game_info.mxe",
//!         &templates,
//!         &settings.layout,
//!         &settings.policy,
//!     )?
//!     .table;
//!
//!     // Export
//!     for table in export_tables(&main, &templates, Some(&xlb), &settings)?.tables {
//!         table.write_csv(format!("{}.csv", table.name), settings.layout.encoding)?;
//!     }
//!
//!     // Import an edited table and write the file back in place
//!     let edited = Table::read_csv("Weapon.csv", "Weapon", settings.layout.encoding)?;
//!     apply_table(&edited, &mut main, &templates, settings.layout.encoding)?;
//!     main.write("game_info.mxe", &templates, &settings.layout, WriteOptions::default())?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod csv;
pub mod diagnostics;
pub mod error;
pub mod mxe;
pub mod mxe_utils;
pub mod table;
pub mod template;
pub mod utils;
pub mod xlb;

pub use codec::{DataType, Endianness, TextEncoding, Value};
pub use config::{MxeLayout, OutputModifiers, ResolvePolicy, Settings};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use mxe::{FieldValue, MainTable, ReadOutcome, Resolved, TocEntry, WriteOptions, WriteReport};
pub use table::{apply_table, export_tables, ExportOutcome, ImportReport, Table};
pub use template::{FieldSpec, FieldTemplate, TemplateRegistry};
pub use utils::{collect_csv_files, create_glob_matcher, matches_filter};
pub use xlb::Xlb;

/// Synthetic MXE and XLB data shared by unit tests
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::codec::{Endianness, TextEncoding};
    use crate::config::{MxeLayout, ResolvePolicy};
    use crate::mxe::{MainTable, ReadOutcome};
    use crate::template::TemplateRegistry;
    use crate::xlb::{Xlb, CHUNK_MARKER};

    /// Stored addresses; file offsets are 0x40 higher
    pub const TOC_ADDR: i32 = 0xC0;
    pub const WEAPON_NAME_ADDR: i32 = 0x140;
    pub const UNKNOWN_NAME_ADDR: i32 = 0x150;
    pub const RECORD_ADDR: i32 = 0x1C0;
    pub const LABEL_ADDR: i32 = 0x240;
    pub const NAME_ID_ADDR: i32 = 0x250;

    const FILE_LEN: usize = 0x2A0;

    pub const TEMPLATES: &str = "Weapon,<i:Damage,<f:Range,<p:Label,<pi:Name,>i2:Ammo,i1:Flag,<h:Mask\r\n\
                                 Armor,<i:Defense\r\n";

    pub fn templates() -> TemplateRegistry {
        TemplateRegistry::parse(TEMPLATES).unwrap()
    }

    fn put(data: &mut [u8], address: i32, bytes: &[u8]) {
        let start = address as usize + 0x40;
        data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn word(value: i32, endianness: Endianness) -> [u8; 4] {
        match endianness {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }

    /// Two TOC entries: `Weapon:Main` with a full record, `Unknown` without
    /// a template
    pub fn mxe_with_endianness(endianness: Endianness) -> Vec<u8> {
        let mut data = vec![0u8; FILE_LEN];
        data[0xC8..0xCC].copy_from_slice(&word(2, endianness));
        data[0xE0..0xE4].copy_from_slice(&word(TOC_ADDR, endianness));

        let entries = [
            (0, 7, WEAPON_NAME_ADDR, RECORD_ADDR),
            (1, 9, UNKNOWN_NAME_ADDR, RECORD_ADDR + 0x20),
        ];
        for (i, (id, type_code, name, record)) in entries.into_iter().enumerate() {
            let base = TOC_ADDR + i as i32 * 32;
            put(&mut data, base, &word(id, endianness));
            put(&mut data, base + 4, &word(type_code, endianness));
            put(&mut data, base + 8, &word(name, endianness));
            put(&mut data, base + 16, &word(record, endianness));
        }

        put(&mut data, WEAPON_NAME_ADDR, b"Weapon:Main\0");
        put(&mut data, UNKNOWN_NAME_ADDR, b"Unknown\0");

        let mut record = Vec::new();
        record.extend_from_slice(&120i32.to_le_bytes());
        record.extend_from_slice(&2.5f32.to_le_bytes());
        record.extend_from_slice(&LABEL_ADDR.to_le_bytes());
        record.extend_from_slice(&NAME_ID_ADDR.to_le_bytes());
        record.extend_from_slice(&30i16.to_be_bytes());
        record.push(0xFF);
        record.extend_from_slice(&[0x78, 0x56, 0x34, 0x12]);
        put(&mut data, RECORD_ADDR, &record);

        put(&mut data, LABEL_ADDR, b"Rifle\0");
        put(&mut data, NAME_ID_ADDR, b"112\0");
        data
    }

    pub fn mxe() -> Vec<u8> {
        mxe_with_endianness(Endianness::Little)
    }

    pub fn read(data: &[u8]) -> ReadOutcome {
        MainTable::read(data, &templates(), &MxeLayout::default(), &ResolvePolicy::default())
            .unwrap()
    }

    /// One section with keys 48..=112; 48 is "Zero", 112 is "Assault\nRifle"
    pub fn xlb_bytes() -> Vec<u8> {
        let keys = [48i32, 64, 80, 96, 112];
        let mut data = b"XLB\0".to_vec();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.resize(0x10, 0);
        data.extend_from_slice(&8i32.to_le_bytes());
        data.extend_from_slice(&(keys.len() as i32).to_le_bytes());
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(b"Name");
        for key in keys {
            data.extend_from_slice(&key.to_le_bytes());
            data.extend_from_slice(&[0; 4]);
        }
        data.extend_from_slice(CHUNK_MARKER);
        let payloads: [(i32, &[u8]); 2] = [(48, b"Zero\0"), (112, b"Assault\nRifle\0")];
        data.extend_from_slice(&(payloads.len() as i32).to_le_bytes());
        for (key, payload) in payloads {
            data.extend_from_slice(&key.to_le_bytes());
            data.extend_from_slice(&(payload.len() as i32).to_le_bytes());
            data.extend_from_slice(payload);
        }
        data
    }

    pub fn xlb() -> Xlb {
        Xlb::parse(&xlb_bytes(), TextEncoding::ShiftJis).unwrap()
    }
}
