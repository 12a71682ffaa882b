use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::model::RawTable;

/// Read a headed CSV into a [`RawTable`].
///
/// Headers are trimmed and a leading UTF-8 BOM is dropped. Records may be
/// shorter or longer than the header. Empty and whitespace-only cells become
/// missing.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').trim().to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut table = RawTable::new(headers);
    for record in csv_reader.records() {
        let record = record?;
        table.rows.push(
            record
                .iter()
                .map(|cell| {
                    if cell.trim().is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(table)
}

/// Load a CSV file from disk
pub fn load_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_table(file).with_context(|| format!("Failed to parse CSV {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_table_blank_cells_missing() {
        let csv = "제품명,1일 섭취량당 가격\nOmega,\"12,000\"\n,  \n";
        let table = read_table(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["제품명", "1일 섭취량당 가격"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1].as_deref(), Some("12,000"));
        assert_eq!(table.rows[1], vec![None, None]);
    }

    #[test]
    fn test_read_table_strips_bom_and_header_space() {
        let csv = "\u{feff}제품명 , 브랜드\nA,Acme\n";
        let table = read_table(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["제품명", "브랜드"]);
        assert_eq!(table.column_index("브랜드"), Some(1));
    }

    #[test]
    fn test_read_table_ragged_rows() {
        let csv = "a,b,c\n1\n1,2,3,4\n";
        let table = read_table(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 2), Some("3"));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("dose_rank_test_missing_input.csv");
        let _ = std::fs::remove_file(&path);
        assert!(load_table(&path).is_err());
    }
}
