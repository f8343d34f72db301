//! Main Table reader

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::codec::{DataType, Endianness};
use crate::config::{MxeLayout, ResolvePolicy};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};
use crate::mxe::types::*;
use crate::template::{FieldTemplate, TemplateRegistry};

impl MainTable {
    /// Read the Main Table of an MXE file
    pub fn open<P: AsRef<Path>>(
        path: P,
        templates: &TemplateRegistry,
        layout: &MxeLayout,
        policy: &ResolvePolicy,
    ) -> Result<ReadOutcome> {
        let path = path.as_ref();
        tracing::info!("Reading MXE file: {}", path.display());
        let data = fs::read(path)?;
        Self::read(&data, templates, layout, policy)
    }

    /// Read the Main Table from MXE data
    ///
    /// Entries without a template are kept with no fields. Unusable template
    /// fields are skipped. Both are reported as diagnostics.
    pub fn read(
        data: &[u8],
        templates: &TemplateRegistry,
        layout: &MxeLayout,
        policy: &ResolvePolicy,
    ) -> Result<ReadOutcome> {
        layout.validate()?;
        let entry_count = word_at(data, layout.count_addr, layout.endianness, "entry count")?;
        let toc_address = word_at(data, layout.start_addr_addr, layout.endianness, "TOC address")?;
        if entry_count < 0 {
            return Err(Error::InvalidMxe(format!("negative entry count {}", entry_count)));
        }
        let toc_start = layout
            .follow(toc_address)
            .ok_or_else(|| Error::InvalidMxe(format!("invalid TOC address {:#x}", toc_address)))?;

        tracing::info!("Main TOC at {:#x}, entry count {}", toc_start, entry_count);
        let toc_len = (entry_count as usize)
            .checked_mul(layout.entry_size)
            .ok_or_else(|| Error::InvalidMxe(format!("TOC of {} entries is too large", entry_count)))?;
        bytes_at(data, toc_start, toc_len, "Main TOC")?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for index in 0..entry_count as u64 {
            let entry_start = toc_start + index * layout.entry_size as u64;
            let toc = bytes_at(data, entry_start, layout.entry_size, "TOC entry")?;

            let word = |offset: usize| toc_word(toc, offset, layout.endianness);
            let name_address = word(layout.field_typename_addr)?;
            let name = string_at(data, layout.follow(name_address));

            entries.push(TocEntry {
                id: word(layout.field_id)?,
                type_code: word(layout.field_type)?,
                type_name: TypeName {
                    address: name_address,
                    name: layout.encoding.decode_cstr(name),
                },
                record_address: word(layout.field_record_addr)?,
                fields: Vec::new(),
            });
        }

        let mut diagnostics = Vec::new();
        for (index, entry) in entries.iter_mut().enumerate() {
            match templates.get(entry.type_name.template_key()) {
                Some(template) => {
                    entry.fields =
                        read_fields(data, index, entry, template, layout, policy, &mut diagnostics)?;
                }
                None => diagnostics.push(
                    Diagnostic::entry(
                        index,
                        DiagnosticKind::TemplateNotFound {
                            type_name: entry.type_name.template_key().to_string(),
                        },
                    )
                    .emit(),
                ),
            }
        }

        tracing::info!(
            "Read {} entries ({} diagnostics)",
            entries.len(),
            diagnostics.len()
        );

        Ok(ReadOutcome {
            table: MainTable { entries },
            diagnostics,
        })
    }
}

fn read_fields(
    data: &[u8],
    index: usize,
    entry: &TocEntry,
    template: &FieldTemplate,
    layout: &MxeLayout,
    policy: &ResolvePolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<FieldValue>> {
    for (field_index, spec) in template.fields.iter().enumerate() {
        if spec.layout_type().is_none() {
            diagnostics.push(
                Diagnostic::field(
                    index,
                    field_index,
                    DiagnosticKind::UnknownFieldType {
                        template: template.name.clone(),
                        type_id: spec.type_id.clone(),
                        name: spec.name.clone(),
                    },
                )
                .emit(),
            );
        }
    }

    let record_size = template.record_size();
    let record = layout
        .follow(entry.record_address)
        .and_then(|start| bytes_at(data, start, record_size, "record").ok());
    let Some(record) = record else {
        diagnostics.push(
            Diagnostic::entry(
                index,
                DiagnosticKind::RecordOutOfBounds {
                    address: entry.record_address,
                    size: record_size,
                },
            )
            .emit(),
        );
        return Ok(Vec::new());
    };

    let mut fields = Vec::new();
    let mut offset = 0;
    for (_, data_type) in template.layout() {
        let width = data_type.width().unwrap_or(0);
        let bytes = &record[offset..offset + width];
        offset += width;

        let value = match data_type {
            DataType::StringPointer(e) if policy.resolve_classic_pointers => {
                let target = string_at(data, layout.follow(read_word(bytes, e)?));
                FieldValue::ResolvedPointer {
                    raw: bytes.to_vec(),
                    resolved: Resolved::Text(layout.encoding.decode_cstr(target)),
                }
            }
            DataType::IdPointer(e) if policy.resolve_xlb_pointers => {
                let target = string_at(data, layout.follow(read_word(bytes, e)?));
                let end = target.iter().position(|&b| b == 0).unwrap_or(target.len());
                FieldValue::ResolvedPointer {
                    raw: bytes.to_vec(),
                    resolved: Resolved::Id(target[..end].to_vec()),
                }
            }
            _ => FieldValue::Scalar(bytes.to_vec()),
        };
        fields.push(value);
    }
    Ok(fields)
}

/// `len` bytes at a file offset, or an error naming what was being read
fn bytes_at<'a>(data: &'a [u8], offset: u64, len: usize, what: &str) -> Result<&'a [u8]> {
    usize::try_from(offset)
        .ok()
        .and_then(|start| data.get(start..start.checked_add(len)?))
        .ok_or_else(|| {
            Error::InvalidMxe(format!(
                "{} at {:#x} ({} bytes) is past the end of the data ({} bytes)",
                what,
                offset,
                len,
                data.len()
            ))
        })
}

fn word_at(data: &[u8], offset: u64, endianness: Endianness, what: &str) -> Result<i32> {
    read_word(bytes_at(data, offset, 4, what)?, endianness)
}

/// Word at an offset inside one TOC entry
fn toc_word(toc: &[u8], offset: usize, endianness: Endianness) -> Result<i32> {
    let bytes = toc.get(offset..).ok_or_else(|| {
        Error::InvalidMxe(format!(
            "TOC field offset {} is outside an entry of {} bytes",
            offset,
            toc.len()
        ))
    })?;
    read_word(bytes, endianness)
}

fn read_word(bytes: &[u8], endianness: Endianness) -> Result<i32> {
    let mut cursor = Cursor::new(bytes);
    Ok(match endianness {
        Endianness::Little => cursor.read_i32::<LittleEndian>()?,
        Endianness::Big => cursor.read_i32::<BigEndian>()?,
    })
}

/// Bytes from a file offset to the end of the data; empty when the offset
/// is outside the data
fn string_at(data: &[u8], offset: Option<u64>) -> &[u8] {
    offset
        .and_then(|o| usize::try_from(o).ok())
        .and_then(|start| data.get(start..))
        .unwrap_or_default()
}
