//! Main Table data model

use crate::diagnostics::Diagnostic;
use crate::template::template_key;

/// Type name of a TOC entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// Address as stored in the TOC
    pub address: i32,
    /// Decoded name, possibly with a `:` qualifier
    pub name: String,
}

impl TypeName {
    /// Name of the template describing this entry
    pub fn template_key(&self) -> &str {
        template_key(&self.name)
    }
}

/// Value reached by following a pointer field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Classic pointer target, decoded
    Text(String),
    /// Id pointer target: the id string bytes, usually ASCII digits
    Id(Vec<u8>),
}

/// Stored value of one record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Field bytes exactly as stored
    Scalar(Vec<u8>),
    /// Pointer field that was followed on read
    ResolvedPointer { raw: Vec<u8>, resolved: Resolved },
}

impl FieldValue {
    /// Bytes stored in the record; the address for pointers
    pub fn stored_bytes(&self) -> &[u8] {
        match self {
            FieldValue::Scalar(bytes) => bytes,
            FieldValue::ResolvedPointer { raw, .. } => raw,
        }
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        match self {
            FieldValue::Scalar(_) => None,
            FieldValue::ResolvedPointer { resolved, .. } => Some(resolved),
        }
    }
}

/// One Main Table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub id: i32,
    pub type_code: i32,
    pub type_name: TypeName,
    /// Record address as stored in the TOC
    pub record_address: i32,
    pub(crate) fields: Vec<FieldValue>,
}

impl TocEntry {
    /// Field values, one per usable field of the entry's template
    ///
    /// Empty when no template was found on read.
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    /// Overwrite a scalar field
    ///
    /// Returns the previous bytes if the field was a scalar and the bytes
    /// differ. Pointer fields are never replaced.
    pub(crate) fn replace_scalar(&mut self, index: usize, bytes: Vec<u8>) -> Option<Vec<u8>> {
        match self.fields.get_mut(index) {
            Some(FieldValue::Scalar(current)) if *current != bytes => {
                Some(std::mem::replace(current, bytes))
            }
            _ => None,
        }
    }
}

/// Decoded Main Table of an MXE file
///
/// The number and order of entries are fixed when the table is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainTable {
    pub(crate) entries: Vec<TocEntry>,
}

impl MainTable {
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TocEntry> {
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut TocEntry> {
        self.entries.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of reading a Main Table
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub table: MainTable,
    pub diagnostics: Vec<Diagnostic>,
}
