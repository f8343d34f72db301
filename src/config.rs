//! Settings and the JSON configuration file
//!
//! Settings are built once (from defaults or a configuration file) and passed
//! by reference to every operation.
//!
//! ```json
//! {
//!   "MXE_SETTINGS": { "MXE_ADDRESS_OFFSET": 64, "TOC_ENDIANNESS": "<" },
//!   "OUTPUT_MODIFIERS": { "FORCE_HEX_OUTPUT": true }
//! }
//! ```
//!
//! Every key is optional; a missing or `null` key keeps its default.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::codec::{Endianness, TextEncoding};
use crate::error::{Error, Result};

/// Where the Main Table lives inside an MXE file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxeLayout {
    /// Added to every stored address to get a file offset
    pub address_offset: i64,
    /// File offset of the entry count
    pub count_addr: u64,
    /// File offset of the stored TOC start address
    pub start_addr_addr: u64,
    /// Byte size of one TOC entry
    pub entry_size: usize,
    /// Byte order of the TOC header words and entry fields
    pub endianness: Endianness,
    pub field_id: usize,
    pub field_type: usize,
    pub field_typename_addr: usize,
    pub field_record_addr: usize,
    /// Encoding of type names, classic pointer targets and record tables
    pub encoding: TextEncoding,
}

impl Default for MxeLayout {
    fn default() -> Self {
        Self {
            address_offset: 0x40,
            count_addr: 0xC8,
            start_addr_addr: 0xE0,
            entry_size: 32,
            endianness: Endianness::Little,
            field_id: 0,
            field_type: 4,
            field_typename_addr: 8,
            field_record_addr: 16,
            encoding: TextEncoding::ShiftJis,
        }
    }
}

impl MxeLayout {
    /// File offset a stored address points to
    pub fn follow(&self, address: i32) -> Option<u64> {
        u64::try_from(address as i64 + self.address_offset).ok()
    }

    /// Check that every TOC field word fits inside one TOC entry
    pub(crate) fn validate(&self) -> Result<()> {
        let fields = [
            ("TOC_FIELD_ID", self.field_id),
            ("TOC_FIELD_TYPE", self.field_type),
            ("TOC_FIELD_TYPENAME_ADDR", self.field_typename_addr),
            ("TOC_FIELD_RECORD_ADDR", self.field_record_addr),
        ];
        for (key, offset) in fields {
            if offset.checked_add(4).map_or(true, |end| end > self.entry_size) {
                return Err(Error::Config(format!(
                    "{} = {} does not fit a TOC entry of {} bytes",
                    key, offset, self.entry_size
                )));
            }
        }
        Ok(())
    }
}

/// Which pointers are followed while reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub resolve_classic_pointers: bool,
    pub resolve_xlb_pointers: bool,
    /// Look id strings up in the XLB when exporting
    pub resolve_xlb_strings: bool,
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self {
            resolve_classic_pointers: true,
            resolve_xlb_pointers: true,
            resolve_xlb_strings: true,
        }
    }
}

/// How record tables render cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputModifiers {
    /// Render every cell as big-endian hex of its stored bytes
    pub force_hex_output: bool,
    pub force_raw_classic_pointers: bool,
    pub force_raw_xlb_pointers: bool,
    /// Render id strings instead of their XLB text
    pub force_xlb_ids: bool,
}

/// All settings of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub layout: MxeLayout,
    pub policy: ResolvePolicy,
    pub modifiers: OutputModifiers,
}

impl Settings {
    /// Load settings from a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse settings from JSON text, starting from the defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;

        let mut settings = Settings::default();
        if let Some(mxe) = file.mxe_settings {
            mxe.apply(&mut settings)?;
        }
        if let Some(out) = file.output_modifiers {
            out.apply(&mut settings.modifiers);
        }
        settings.layout.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ConfigFile {
    mxe_settings: Option<MxeSettingsSection>,
    output_modifiers: Option<OutputModifiersSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct MxeSettingsSection {
    mxe_address_offset: Option<i64>,
    main_table_count_addr: Option<u64>,
    main_table_startaddr_addr: Option<u64>,
    toc_entry_size: Option<usize>,
    toc_endianness: Option<String>,
    toc_field_id: Option<usize>,
    toc_field_type: Option<usize>,
    toc_field_typename_addr: Option<usize>,
    toc_field_record_addr: Option<usize>,
    resolve_classic_pointers: Option<bool>,
    resolve_xlb_pointers: Option<bool>,
    resolve_xlb_strings: Option<bool>,
    text_encoding: Option<String>,
}

impl MxeSettingsSection {
    fn apply(self, settings: &mut Settings) -> Result<()> {
        let layout = &mut settings.layout;
        let policy = &mut settings.policy;

        set(&mut layout.address_offset, self.mxe_address_offset);
        set(&mut layout.count_addr, self.main_table_count_addr);
        set(&mut layout.start_addr_addr, self.main_table_startaddr_addr);
        set(&mut layout.entry_size, self.toc_entry_size);
        set(&mut layout.field_id, self.toc_field_id);
        set(&mut layout.field_type, self.toc_field_type);
        set(&mut layout.field_typename_addr, self.toc_field_typename_addr);
        set(&mut layout.field_record_addr, self.toc_field_record_addr);
        if let Some(endianness) = self.toc_endianness {
            layout.endianness = endianness.parse()?;
        }
        if let Some(encoding) = self.text_encoding {
            layout.encoding = encoding.parse()?;
        }

        set(&mut policy.resolve_classic_pointers, self.resolve_classic_pointers);
        set(&mut policy.resolve_xlb_pointers, self.resolve_xlb_pointers);
        set(&mut policy.resolve_xlb_strings, self.resolve_xlb_strings);
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct OutputModifiersSection {
    force_hex_output: Option<bool>,
    force_raw_classic_pointers: Option<bool>,
    force_raw_xlb_pointers: Option<bool>,
    force_xlb_ids: Option<bool>,
}

impl OutputModifiersSection {
    fn apply(self, modifiers: &mut OutputModifiers) {
        set(&mut modifiers.force_hex_output, self.force_hex_output);
        set(&mut modifiers.force_raw_classic_pointers, self.force_raw_classic_pointers);
        set(&mut modifiers.force_raw_xlb_pointers, self.force_raw_xlb_pointers);
        set(&mut modifiers.force_xlb_ids, self.force_xlb_ids);
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
