//! Main Table write-back

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::{format_hex, Endianness};
use crate::config::MxeLayout;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};
use crate::mxe::types::MainTable;
use crate::template::TemplateRegistry;

/// Options for [`MainTable::write`]
#[derive(Default)]
pub struct WriteOptions<'a> {
    /// Copy the original file here before writing
    pub backup: Option<PathBuf>,
    /// Receives one line per written field
    pub trace: Option<&'a mut dyn Write>,
}

/// Summary of a write
#[derive(Debug, Clone)]
pub struct WriteReport {
    pub entries_written: usize,
    pub backup: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One field write
struct PlannedWrite<'a> {
    entry: usize,
    field: usize,
    offset: u64,
    bytes: &'a [u8],
}

impl MainTable {
    /// Write field values back into an existing MXE file in place
    ///
    /// Pointer fields write back their stored address bytes. Every write is
    /// checked against the file length before the file is touched, so the
    /// file length never changes.
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        templates: &TemplateRegistry,
        layout: &MxeLayout,
        options: WriteOptions<'_>,
    ) -> Result<WriteReport> {
        let path = path.as_ref();
        let file_len = fs::metadata(path)?.len();

        let mut diagnostics = Vec::new();
        let mut plan = Vec::new();
        let mut entries_written = 0;

        for (index, entry) in self.entries.iter().enumerate() {
            let Some(template) = templates.get(entry.type_name.template_key()) else {
                diagnostics.push(
                    Diagnostic::entry(
                        index,
                        DiagnosticKind::TemplateNotFound {
                            type_name: entry.type_name.template_key().to_string(),
                        },
                    )
                    .emit(),
                );
                continue;
            };
            // Records that could not be read hold no fields and stay untouched
            if entry.fields.is_empty() {
                continue;
            }

            let mut offset = layout.follow(entry.record_address).ok_or_else(|| {
                Error::InvalidMxe(format!(
                    "entry {} has invalid record address {:#x}",
                    index, entry.record_address
                ))
            })?;

            for (field, ((_, data_type), value)) in
                template.layout().zip(entry.fields.iter()).enumerate()
            {
                let bytes = value.stored_bytes();
                if Some(bytes.len()) != data_type.width() {
                    return Err(Error::InvalidMxe(format!(
                        "entry {} field {} holds {} bytes, {} needs {:?}",
                        index,
                        field,
                        bytes.len(),
                        data_type,
                        data_type.width()
                    )));
                }
                if offset + bytes.len() as u64 > file_len {
                    return Err(Error::InvalidMxe(format!(
                        "entry {} field {} at {:#x} is past the end of the file ({} bytes)",
                        index, field, offset, file_len
                    )));
                }
                plan.push(PlannedWrite {
                    entry: index,
                    field,
                    offset,
                    bytes,
                });
                offset += bytes.len() as u64;
            }
            entries_written += 1;
        }

        if let Some(backup) = &options.backup {
            tracing::info!("Backing up {} to {}", path.display(), backup.display());
            fs::copy(path, backup)?;
        }

        if let Some(trace) = options.trace {
            for write in &plan {
                writeln!(
                    trace,
                    "entry={} field={} offset={:#x} bytes={}",
                    write.entry,
                    write.field,
                    write.offset,
                    format_hex(write.bytes, Endianness::Big)
                )?;
            }
            trace.flush()?;
        }

        tracing::info!("Writing {} fields to {}", plan.len(), path.display());
        {
            let mut file = OpenOptions::new().write(true).open(path)?;
            for write in &plan {
                file.seek(SeekFrom::Start(write.offset))?;
                file.write_all(write.bytes)?;
            }
            file.flush()?;
        }

        tracing::info!("Wrote {} entries", entries_written);

        Ok(WriteReport {
            entries_written,
            backup: options.backup,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::mxe::FieldValue;

    fn write_fixture(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("test.mxe");
        fs::write(&path, fixtures::mxe()).unwrap();
        path
    }

    #[test]
    fn test_unchanged_table_writes_identical_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let original = fs::read(&path).unwrap();

        let outcome = fixtures::read(&original);
        let report = outcome
            .table
            .write(&path, &fixtures::templates(), &MxeLayout::default(), WriteOptions::default())
            .unwrap();

        assert_eq!(report.entries_written, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_unread_record_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let original = fs::read(&path).unwrap();

        let mut data = original.clone();
        let record_word = fixtures::TOC_ADDR as usize + 0x40 + 16;
        data[record_word..record_word + 4].copy_from_slice(&(-0x100i32).to_le_bytes());
        let table = fixtures::read(&data).table;

        let report = table
            .write(&path, &fixtures::templates(), &MxeLayout::default(), WriteOptions::default())
            .unwrap();
        assert_eq!(report.entries_written, 0);
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_scalar_change_is_written_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let original = fs::read(&path).unwrap();

        let mut table = fixtures::read(&original).table;
        let old = table.get_mut(0).unwrap().replace_scalar(0, 999i32.to_le_bytes().to_vec());
        assert_eq!(old, Some(120i32.to_le_bytes().to_vec()));

        table
            .write(&path, &fixtures::templates(), &MxeLayout::default(), WriteOptions::default())
            .unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(written.len(), original.len());
        let record = fixtures::RECORD_ADDR as usize + 0x40;
        assert_eq!(&written[record..record + 4], &999i32.to_le_bytes());
        assert_eq!(&written[record + 4..], &original[record + 4..]);
        assert_eq!(&written[..record], &original[..record]);
    }

    #[test]
    fn test_pointer_write_back_uses_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let original = fs::read(&path).unwrap();

        let mut table = fixtures::read(&original).table;
        // pointer fields refuse replacement
        assert_eq!(table.get_mut(0).unwrap().replace_scalar(2, vec![0xAA; 4]), None);
        assert!(matches!(table.entries()[0].fields()[2], FieldValue::ResolvedPointer { .. }));

        table
            .write(&path, &fixtures::templates(), &MxeLayout::default(), WriteOptions::default())
            .unwrap();
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_out_of_bounds_plan_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let original = fs::read(&path).unwrap();
        let mut table = fixtures::read(&original).table;
        table.get_mut(0).unwrap().replace_scalar(0, 5i32.to_le_bytes().to_vec());

        // same table, shorter file
        let short = &original[..fixtures::RECORD_ADDR as usize + 0x40 + 10];
        fs::write(&path, short).unwrap();
        let backup = dir.path().join("test.mxe.bak");

        let result = table.write(
            &path,
            &fixtures::templates(),
            &MxeLayout::default(),
            WriteOptions {
                backup: Some(backup.clone()),
                trace: None,
            },
        );
        assert!(matches!(result, Err(Error::InvalidMxe(_))));
        assert_eq!(fs::read(&path).unwrap(), short);
        assert!(!backup.exists());
    }

    #[test]
    fn test_backup_and_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir);
        let original = fs::read(&path).unwrap();
        let mut table = fixtures::read(&original).table;
        table.get_mut(0).unwrap().replace_scalar(5, vec![0x01]);

        let backup = dir.path().join("test.mxe_backup.bak");
        let mut trace = Vec::new();
        let report = table
            .write(
                &path,
                &fixtures::templates(),
                &MxeLayout::default(),
                WriteOptions {
                    backup: Some(backup.clone()),
                    trace: Some(&mut trace),
                },
            )
            .unwrap();

        assert_eq!(report.backup.as_deref(), Some(backup.as_path()));
        assert_eq!(fs::read(&backup).unwrap(), original);

        let trace = String::from_utf8(trace).unwrap();
        let lines: Vec<_> = trace.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "entry=0 field=0 offset=0x200 bytes=0x78-00-00-00");
        assert!(lines[5].starts_with("entry=0 field=5 offset=0x212 bytes=0x01"));
    }
}
