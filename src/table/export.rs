//! Main Table to record tables

use std::collections::BTreeMap;

use crate::codec::{bytes_to_text, format_hex, DataType, Endianness};
use crate::config::Settings;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::Result;
use crate::mxe::{FieldValue, MainTable, Resolved, TocEntry};
use crate::table::{Table, INTERNAL_NAME_COLUMN, RECORD_ID_COLUMN};
use crate::template::{FieldTemplate, TemplateRegistry};
use crate::xlb::Xlb;

/// Line breaks in XLB text are rendered as this literal
const LINE_BREAK: &str = "\\LF";

/// Tables built by [`export_tables`]
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// One table per template key, sorted by key
    pub tables: Vec<Table>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build one table per template key found in the Main Table
///
/// `xlb` is only consulted for id pointers when XLB strings are resolved.
pub fn export_tables(
    main: &MainTable,
    templates: &TemplateRegistry,
    xlb: Option<&Xlb>,
    settings: &Settings,
) -> Result<ExportOutcome> {
    let mut groups: BTreeMap<&str, Vec<&TocEntry>> = BTreeMap::new();
    for entry in main.entries() {
        groups
            .entry(entry.type_name.template_key())
            .or_default()
            .push(entry);
    }

    let mut tables = Vec::with_capacity(groups.len());
    let mut diagnostics = Vec::new();

    for (key, entries) in groups {
        let Some(template) = templates.get(key) else {
            diagnostics.push(
                Diagnostic::general(DiagnosticKind::TemplateNotFound {
                    type_name: key.to_string(),
                })
                .emit(),
            );
            continue;
        };

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            rows.push(render_row(entry, template, xlb, settings)?);
        }

        tables.push(Table {
            name: key.to_string(),
            header: header(template),
            rows,
        });
    }

    tracing::info!("Exported {} tables", tables.len());
    Ok(ExportOutcome { tables, diagnostics })
}

fn header(template: &FieldTemplate) -> Vec<String> {
    [RECORD_ID_COLUMN.to_string(), INTERNAL_NAME_COLUMN.to_string()]
        .into_iter()
        .chain(template.layout().map(|(spec, _)| spec.header()))
        .collect()
}

fn render_row(
    entry: &TocEntry,
    template: &FieldTemplate,
    xlb: Option<&Xlb>,
    settings: &Settings,
) -> Result<Vec<String>> {
    let mut row = vec![entry.id.to_string(), entry.type_name.name.clone()];
    for ((_, data_type), value) in template.layout().zip(entry.fields()) {
        row.push(render_cell(value, data_type, xlb, settings)?);
    }
    Ok(row)
}

/// Display text of one field
fn render_cell(
    value: &FieldValue,
    data_type: DataType,
    xlb: Option<&Xlb>,
    settings: &Settings,
) -> Result<String> {
    let modifiers = &settings.modifiers;
    let encoding = settings.layout.encoding;
    let natural = || bytes_to_text(value.stored_bytes(), data_type, encoding);

    if modifiers.force_hex_output {
        return Ok(format_hex(value.stored_bytes(), Endianness::Big));
    }

    match (data_type, value.resolved()) {
        (DataType::StringPointer(_), Some(Resolved::Text(text)))
            if !modifiers.force_raw_classic_pointers =>
        {
            Ok(text.clone())
        }
        (DataType::IdPointer(_), Some(Resolved::Id(id))) if !modifiers.force_raw_xlb_pointers => {
            let id_text = encoding.decode(id);
            match xlb {
                Some(xlb) if settings.policy.resolve_xlb_strings => {
                    if modifiers.force_xlb_ids {
                        Ok(id_text)
                    } else {
                        Ok(lookup_text(xlb, &id_text, settings))
                    }
                }
                _ => Ok(id_text.replace('\n', LINE_BREAK)),
            }
        }
        _ => natural(),
    }
}

/// XLB text for an id string
///
/// Blank and unknown ids render empty; a non-numeric id renders as itself.
fn lookup_text(xlb: &Xlb, id_text: &str, settings: &Settings) -> String {
    if id_text.is_empty() {
        return String::new();
    }
    match id_text.trim().parse::<i32>() {
        Ok(id) => xlb
            .find_text(id, settings.layout.encoding)
            .map(|text| text.replace('\n', LINE_BREAK))
            .unwrap_or_default(),
        Err(_) => id_text.replace('\n', LINE_BREAK),
    }
}
