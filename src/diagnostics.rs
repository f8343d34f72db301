//! Recoverable per-item problems
//!
//! Reading, importing and writing keep going when a single entry, row or
//! field cannot be processed. Each such case is logged and returned to the
//! caller as a [`Diagnostic`] next to the successful result.

use std::fmt;

/// What went wrong with one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// No template matches the entry's type name
    TemplateNotFound { type_name: String },
    /// The entry's record body lies outside the data; its fields are not read
    RecordOutOfBounds { address: i32, size: usize },
    /// A template field has an unknown or variable-length data type
    UnknownFieldType {
        template: String,
        type_id: String,
        name: String,
    },
    /// A table row addresses no Main Table entry
    RowOutOfRange { record_id: String },
    /// A table column declares a different data type than the template
    TypeMismatch { template_type: String, header_type: String },
    /// Pointer columns are never imported
    PointerSkipped { data_type: String },
    /// A cell could not be converted to the field's data type
    InvalidCell { value: String, reason: String },
    /// The row has fewer cells than the template has fields
    MissingCell,
    /// A table row belongs to a type without a template
    NoTemplateForRow { type_name: String },
    /// An XLB payload record could not be placed into a slot
    XlbPlacement { key: i32, section: usize, slot: i64, reason: String },
}

/// A recoverable problem with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Main Table entry index (or XLB record index)
    pub entry: Option<usize>,
    /// Field index. For `UnknownFieldType` this is the position in the
    /// template's field list; for every other kind it is the position among
    /// the usable fields of `FieldTemplate::layout`, which is also the
    /// record table column index after `RecordId, InternalName`.
    pub field: Option<usize>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn entry(entry: usize, kind: DiagnosticKind) -> Self {
        Self {
            entry: Some(entry),
            field: None,
            kind,
        }
    }

    pub fn field(entry: usize, field: usize, kind: DiagnosticKind) -> Self {
        Self {
            entry: Some(entry),
            field: Some(field),
            kind,
        }
    }

    pub fn general(kind: DiagnosticKind) -> Self {
        Self {
            entry: None,
            field: None,
            kind,
        }
    }

    /// Log this diagnostic as a warning
    pub(crate) fn emit(self) -> Self {
        tracing::warn!("{}", self);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.entry, self.field) {
            (Some(e), Some(i)) => write!(f, "entry {}, field {}: ", e, i)?,
            (Some(e), None) => write!(f, "entry {}: ", e)?,
            _ => {}
        }

        match &self.kind {
            DiagnosticKind::TemplateNotFound { type_name } => {
                write!(f, "template not found for '{}', entry skipped", type_name)
            }
            DiagnosticKind::RecordOutOfBounds { address, size } => write!(
                f,
                "record of {} bytes at {:#x} is outside the data, fields not read",
                size, address
            ),
            DiagnosticKind::UnknownFieldType { template, type_id, name } => write!(
                f,
                "illegal field '{}:{}' in template {} skipped",
                type_id, name, template
            ),
            DiagnosticKind::RowOutOfRange { record_id } => {
                write!(f, "record id {} not found in main table, row skipped", record_id)
            }
            DiagnosticKind::TypeMismatch { template_type, header_type } => write!(
                f,
                "mismatched data type skipped - template={}; table header={}",
                template_type, header_type
            ),
            DiagnosticKind::PointerSkipped { data_type } => {
                write!(f, "pointer data type {} is not imported, skipped", data_type)
            }
            DiagnosticKind::InvalidCell { value, reason } => {
                write!(f, "cannot convert '{}': {}, skipped", value, reason)
            }
            DiagnosticKind::MissingCell => write!(f, "row has no cell for this field, skipped"),
            DiagnosticKind::NoTemplateForRow { type_name } => {
                write!(f, "no template for '{}', row skipped", type_name)
            }
            DiagnosticKind::XlbPlacement { key, section, slot, reason } => write!(
                f,
                "XLB record {} cannot be placed at section {} slot {}: {}",
                key, section, slot, reason
            ),
        }
    }
}
