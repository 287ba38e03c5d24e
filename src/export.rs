//! Spreadsheet export.
//!
//! Headers come from the keys of the first row, in serialization order.
//! Rows keep their input order.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::ExportConfig;
use crate::error::ExportError;

/// A header row plus data rows, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Build a table from rows that serialize to objects.
    pub fn from_rows<T: Serialize>(rows: &[T]) -> Result<Self, ExportError> {
        let objects = rows
            .iter()
            .enumerate()
            .map(|(i, row)| match serde_json::to_value(row)? {
                Value::Object(map) => Ok(map),
                _ => Err(ExportError::NotAnObject(i)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let headers: Vec<String> = objects
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        let rows = objects
            .iter()
            .map(|object| {
                headers
                    .iter()
                    .map(|key| object.get(key).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Write a single-sheet `.xlsx` file with a bold header row.
    pub fn write_xlsx(&self, path: &Path, sheet_name: &str) -> Result<(), ExportError> {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| ExportError::Spreadsheet("default worksheet missing".to_string()))?;
        sheet.set_name(sheet_name);

        for (col, header) in self.headers.iter().enumerate() {
            let cell = sheet.get_cell_mut((column(col), 1));
            cell.set_value(header.as_str());
            cell.get_style_mut().get_font_mut().set_bold(true);
        }
        for (row_idx, row) in self.rows.iter().enumerate() {
            let row_num = row_idx as u32 + 2;
            for (col, value) in row.iter().enumerate() {
                sheet
                    .get_cell_mut((column(col), row_num))
                    .set_value(value.as_str());
            }
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, path)
            .map_err(|e| ExportError::Spreadsheet(e.to_string()))?;
        Ok(())
    }
}

/// Export `rows` to `dir/<file_name>` and return the written path.
pub fn export_records<T: Serialize>(
    rows: &[T],
    dir: &Path,
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let table = ExportTable::from_rows(rows)?;
    let path = dir.join(&config.file_name);
    table.write_xlsx(&path, &config.sheet_name)?;
    info!(path = %path.display(), rows = table.rows.len(), "exported spreadsheet");
    Ok(path)
}

fn column(index: usize) -> u32 {
    index as u32 + 1
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Answer, Record};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_headers_from_first_row() {
        let rows = vec![
            json!({"id": "1-1", "answer": "A"}),
            json!({"id": "1-2", "answer": "B"}),
        ];

        let table = ExportTable::from_rows(&rows).unwrap();
        assert_eq!(table.headers, ["id", "answer"]);
        assert_eq!(table.rows, [["1-1", "A"], ["1-2", "B"]]);
    }

    #[test]
    fn test_rows_follow_first_row_keys() {
        let rows = vec![
            json!({"id": "1-1", "answer": "A"}),
            json!({"answer": "C", "extra": true, "id": "1-2"}),
            json!({"id": "1-3", "answer": null}),
            json!({"id": "1-4"}),
        ];

        let table = ExportTable::from_rows(&rows).unwrap();
        assert_eq!(
            table.rows,
            [
                vec!["1-1", "A"],
                vec!["1-2", "C"],
                vec!["1-3", ""],
                vec!["1-4", ""],
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let rows: Vec<Value> = Vec::new();
        assert_eq!(ExportTable::from_rows(&rows).unwrap(), ExportTable::default());
    }

    #[test]
    fn test_rejects_non_object_rows() {
        let rows = vec![json!({"id": "1-1"}), json!("loose")];
        assert!(matches!(
            ExportTable::from_rows(&rows),
            Err(ExportError::NotAnObject(1))
        ));
    }

    #[test]
    fn test_record_columns() {
        let record = Record {
            id: "1-1".to_string(),
            provenance: "2018 Fujian".to_string(),
            stem: "stem".to_string(),
            topic: "topic".to_string(),
            options: "Paris | London".to_string(),
            answer: Answer::A,
            analyze: "analyze".to_string(),
        };

        let table = ExportTable::from_rows(&[record]).unwrap();
        assert_eq!(
            table.headers,
            ["id", "provenance", "stem", "topic", "options", "answer", "analyze"]
        );
        assert_eq!(table.rows[0][5], "A");
    }

    #[test]
    fn test_export_writes_fixed_file_name() {
        let temp = TempDir::new().unwrap();
        let rows = vec![json!({"id": "1-1", "answer": "A"})];
        let config = ExportConfig::default();

        let path = export_records(&rows, temp.path(), &config).unwrap();
        assert_eq!(path, temp.path().join("question-bank.xlsx"));
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    fn cell_text(sheet: &umya_spreadsheet::Worksheet, col: u32, row: u32) -> Option<String> {
        sheet.get_cell((col, row)).map(|c| c.get_value().to_string())
    }

    #[test]
    fn test_written_sheet_layout() {
        let temp = TempDir::new().unwrap();
        let rows = vec![
            json!({"id": "1-1", "answer": "A"}),
            json!({"answer": "B", "id": "1-2"}),
        ];
        let config = ExportConfig::default();

        let path = export_records(&rows, temp.path(), &config).unwrap();
        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();

        assert_eq!(book.get_sheet_collection().len(), 1);
        let sheet = &book.get_sheet_collection()[0];
        assert_eq!(sheet.get_name(), "Questions");

        assert_eq!(cell_text(sheet, 1, 1).as_deref(), Some("id"));
        assert_eq!(cell_text(sheet, 2, 1).as_deref(), Some("answer"));
        assert_eq!(cell_text(sheet, 1, 2).as_deref(), Some("1-1"));
        assert_eq!(cell_text(sheet, 2, 2).as_deref(), Some("A"));
        assert_eq!(cell_text(sheet, 1, 3).as_deref(), Some("1-2"));
        assert_eq!(cell_text(sheet, 2, 3).as_deref(), Some("B"));
        assert_eq!(sheet.get_highest_column_and_row(), (2, 3));
    }
}
