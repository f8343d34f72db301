//! Record tables back into the Main Table

use crate::codec::{format_hex, text_to_bytes, Endianness, TextEncoding};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};
use crate::mxe::MainTable;
use crate::table::{Table, INTERNAL_NAME_COLUMN, RECORD_ID_COLUMN};
use crate::template::{FieldSpec, TemplateRegistry};

/// Summary of [`apply_table`]
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Number of fields whose bytes changed
    pub changed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Apply edited cells of a table to the Main Table
///
/// RecordId is the entry's index in the Main Table. Only non-pointer fields
/// whose column declares the template's data type are written; everything
/// else is skipped with a diagnostic.
pub fn apply_table(
    table: &Table,
    main: &mut MainTable,
    templates: &TemplateRegistry,
    encoding: TextEncoding,
) -> Result<ImportReport> {
    let header_ok = table.header.first().map(String::as_str) == Some(RECORD_ID_COLUMN)
        && table.header.get(1).map(String::as_str) == Some(INTERNAL_NAME_COLUMN);
    if !header_ok {
        return Err(Error::TableHeader(format!(
            "{}: expected first columns '{},{}', found '{}'",
            table.name,
            RECORD_ID_COLUMN,
            INTERNAL_NAME_COLUMN,
            table.header.iter().take(2).cloned().collect::<Vec<_>>().join(",")
        )));
    }

    let column_types: Vec<String> = table.header[2..]
        .iter()
        .map(|cell| FieldSpec::parse(cell).type_id)
        .collect();

    let mut report = ImportReport::default();

    for row in &table.rows {
        let record_id = row.first().map(String::as_str).unwrap_or_default();
        let target = match record_id.trim().parse::<usize>() {
            Ok(index) => main.get_mut(index).map(|entry| (index, entry)),
            Err(_) => None,
        };
        let Some((index, entry)) = target else {
            report.diagnostics.push(
                Diagnostic::general(DiagnosticKind::RowOutOfRange {
                    record_id: record_id.to_string(),
                })
                .emit(),
            );
            continue;
        };

        let Some(template) = templates.for_type_name(&entry.type_name.name) else {
            report.diagnostics.push(
                Diagnostic::entry(
                    index,
                    DiagnosticKind::NoTemplateForRow {
                        type_name: entry.type_name.name.clone(),
                    },
                )
                .emit(),
            );
            continue;
        };

        for (field, (spec, data_type)) in template.layout().enumerate() {
            let skip = |kind| Diagnostic::field(index, field, kind);

            let Some(column_type) = column_types.get(field) else {
                report.diagnostics.push(skip(DiagnosticKind::MissingCell).emit());
                continue;
            };
            if *column_type != spec.type_id {
                report.diagnostics.push(
                    skip(DiagnosticKind::TypeMismatch {
                        template_type: spec.type_id.clone(),
                        header_type: column_type.clone(),
                    })
                    .emit(),
                );
                continue;
            }
            if data_type.is_pointer() {
                tracing::debug!("Entry {} field {}: pointer column skipped", index, field);
                report.diagnostics.push(skip(DiagnosticKind::PointerSkipped {
                    data_type: spec.type_id.clone(),
                }));
                continue;
            }
            let Some(cell) = row.get(2 + field) else {
                report.diagnostics.push(skip(DiagnosticKind::MissingCell).emit());
                continue;
            };

            let bytes = match text_to_bytes(cell, data_type, encoding) {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.diagnostics.push(
                        skip(DiagnosticKind::InvalidCell {
                            value: cell.clone(),
                            reason: e.to_string(),
                        })
                        .emit(),
                    );
                    continue;
                }
            };

            if let Some(old) = entry.replace_scalar(field, bytes) {
                tracing::debug!(
                    "Entry {} field {}: {} -> {}",
                    index,
                    field,
                    format_hex(&old, Endianness::Big),
                    cell
                );
                report.changed += 1;
            }
        }
    }

    tracing::info!(
        "Applied {}: {} fields changed, {} skipped",
        table.name,
        report.changed,
        report.diagnostics.len()
    );
    Ok(report)
}
