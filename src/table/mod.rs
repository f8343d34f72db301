//! Record tables
//!
//! A [`Table`] is the row/column form of all Main Table entries sharing one
//! template. It is what gets exported to CSV for editing and applied back.
//!
//! ```text
//! RecordId,InternalName,<i:Damage,<f:Range,<p:Label
//! 0,Weapon:Main,120,2.5,Rifle
//! ```

mod export;
mod import;

pub use export::{export_tables, ExportOutcome};
pub use import::{apply_table, ImportReport};

use std::fs;
use std::path::Path;

use crate::codec::TextEncoding;
use crate::csv;
use crate::error::Result;

/// Header of the first column
pub const RECORD_ID_COLUMN: &str = "RecordId";
/// Header of the second column
pub const INTERNAL_NAME_COLUMN: &str = "InternalName";

/// Tabular form of one record type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Template key; also the CSV file stem
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Render as CSV text
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        csv::write_record(&mut out, &self.header);
        for row in &self.rows {
            csv::write_record(&mut out, row);
        }
        out
    }

    /// Parse CSV text; the first row is the header
    ///
    /// Blank lines are ignored.
    pub fn from_csv(name: &str, text: &str) -> Self {
        let mut records = csv::parse(text)
            .into_iter()
            .map(|record| record.fields)
            .filter(|fields| !fields.is_empty());

        Table {
            name: name.to_string(),
            header: records.next().unwrap_or_default(),
            rows: records.collect(),
        }
    }

    /// Write the table to a CSV file in the given encoding
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, encoding: TextEncoding) -> Result<()> {
        fs::write(path, encoding.encode(&self.to_csv()))?;
        Ok(())
    }

    /// Read a table from a CSV file in the given encoding
    pub fn read_csv<P: AsRef<Path>>(path: P, name: &str, encoding: TextEncoding) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::from_csv(name, &encoding.decode(&data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_file_roundtrip_shift_jis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Weapon.csv");
        let table = Table {
            name: "Weapon".into(),
            header: vec!["RecordId".into(), "InternalName".into(), "<p:Label".into()],
            rows: vec![vec!["0".into(), "Weapon:Main".into(), "ライフル, \"改\"".into()]],
        };

        table.write_csv(&path, TextEncoding::ShiftJis).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.ends_with(b"\r\n"));
        assert!(std::str::from_utf8(&bytes).is_err());

        let read = Table::read_csv(&path, "Weapon", TextEncoding::ShiftJis).unwrap();
        assert_eq!(read, table);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let table = Table::from_csv("T", "RecordId,InternalName\n\n0,T\n\n");
        assert_eq!(table.header, vec!["RecordId", "InternalName"]);
        assert_eq!(table.rows, vec![vec!["0", "T"]]);
    }

    #[test]
    fn test_missing_file() {
        assert!(Table::read_csv("/nonexistent/T.csv", "T", TextEncoding::Utf8).is_err());
    }
}
