//! Record templates
//!
//! A template file describes the field layout of each record type, one type
//! per row:
//!
//! ```text
//! Weapon,<i:Damage,<f:Range,<p:Label,<pi:Name,i1
//! ```
//!
//! The first cell is the type name, every following cell is a data type
//! identifier optionally followed by `:` and a field name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::codec::DataType;
use crate::csv;
use crate::error::{Error, Result};

/// Template key of a stored type name: everything before the first `:`
///
/// Type names such as `Weapon:Main` share the `Weapon` template.
pub fn template_key(type_name: &str) -> &str {
    type_name.split(':').next().unwrap_or(type_name)
}

/// One field declaration of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Data type identifier as written in the template file
    pub type_id: String,
    /// Field name, empty when not given
    pub name: String,
}

impl FieldSpec {
    /// Parse a `datatype[:fieldname]` cell
    pub fn parse(cell: &str) -> Self {
        match cell.split_once(':') {
            Some((type_id, name)) => FieldSpec {
                type_id: type_id.to_string(),
                name: name.to_string(),
            },
            None => FieldSpec {
                type_id: cell.to_string(),
                name: String::new(),
            },
        }
    }

    pub fn data_type(&self) -> Result<DataType> {
        self.type_id.parse()
    }

    /// Data type if this field can be part of a fixed record layout
    pub fn layout_type(&self) -> Option<DataType> {
        self.data_type().ok().filter(|dt| dt.width().is_some())
    }

    /// Column header used in record tables
    pub fn header(&self) -> String {
        if self.name.is_empty() {
            self.type_id.clone()
        } else {
            format!("{}:{}", self.type_id, self.name)
        }
    }
}

/// Field layout of one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTemplate {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl FieldTemplate {
    /// Fields usable in a fixed layout, in order, with their data types
    ///
    /// Decoded records hold exactly one value per item of this iterator.
    pub fn layout(&self) -> impl Iterator<Item = (&FieldSpec, DataType)> {
        self.fields
            .iter()
            .filter_map(|spec| spec.layout_type().map(|dt| (spec, dt)))
    }

    /// Total byte size of the usable fields
    pub fn record_size(&self) -> usize {
        self.layout().filter_map(|(_, dt)| dt.width()).sum()
    }
}

/// All templates loaded from a template file, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, FieldTemplate>,
}

impl TemplateRegistry {
    /// Load templates from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| Error::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&String::from_utf8_lossy(&data))
    }

    /// Parse templates from CSV text
    pub fn parse(text: &str) -> Result<Self> {
        let mut templates: HashMap<String, FieldTemplate> = HashMap::new();

        for record in csv::parse(text) {
            let (name, cells) = match record.fields.split_first() {
                Some((name, cells)) if !name.is_empty() => (name, cells),
                Some(_) => {
                    return Err(Error::MalformedTemplate {
                        line: record.line,
                        reason: "empty type name".into(),
                    })
                }
                None => {
                    return Err(Error::MalformedTemplate {
                        line: record.line,
                        reason: "row has no columns".into(),
                    })
                }
            };

            if templates.contains_key(name) {
                tracing::warn!(
                    "Duplicate template '{}' at line {} ignored, keeping the first definition",
                    name,
                    record.line
                );
                continue;
            }

            let fields = cells.iter().map(|cell| FieldSpec::parse(cell)).collect();
            templates.insert(
                name.clone(),
                FieldTemplate {
                    name: name.clone(),
                    fields,
                },
            );
        }

        Ok(Self { templates })
    }

    /// Template by exact type name
    pub fn get(&self, name: &str) -> Option<&FieldTemplate> {
        self.templates.get(name)
    }

    /// Template for a stored type name, ignoring any `:` qualifier
    pub fn for_type_name(&self, type_name: &str) -> Option<&FieldTemplate> {
        self.get(template_key(type_name))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
