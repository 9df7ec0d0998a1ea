//! Mapping file parsing.
//!
//! The mapping file is a plain comma-separated file. Quotes have no special
//! meaning and every field is trimmed:
//!
//! ```text
//! Filename,ArtifactTypeId,Custom_03
//! bug1.png,3,EXT-42
//! ```
//!
//! The third header column names the custom property that holds the external
//! key on the remote artifact. Without it nothing can be linked, so the rows
//! are not read at all.

use crate::error::ConfigError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub filename: String,
    pub artifact_type_id: i32,
    pub external_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    custom_property_field: Option<String>,
    // lowercased filename -> index of the first entry with that name
    by_name: HashMap<String, usize>,
}

impl MappingTable {
    /// A table with no entries and no custom property field.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and parse the mapping file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::MappingFileNotFound(path.to_path_buf()));
        }
        let file =
            File::open(path).map_err(|_| ConfigError::MappingFileNotFound(path.to_path_buf()))?;
        let table = Self::parse(file)?;
        debug!(
            path = %path.display(),
            entries = table.len(),
            field = ?table.custom_property_field,
            "Loaded mapping file"
        );
        Ok(table)
    }

    /// Parse mapping rows from any reader. The first malformed row aborts
    /// the parse.
    pub fn parse<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut records = ReaderBuilder::new()
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader)
            .into_records();
        let mut table = MappingTable::empty();

        let header = match records.next() {
            Some(record) => record.map_err(|e| csv_malformed(1, e))?,
            None => return Ok(table),
        };
        match header.get(2) {
            Some(field) if !field.is_empty() => {
                table.custom_property_field = Some(field.to_string());
            }
            _ => {
                warn!("Mapping header has no custom property column, artifact linking disabled");
                return Ok(table);
            }
        }

        for (idx, record) in records.enumerate() {
            // header is line 1
            let fallback_line = idx + 2;
            let record = record.map_err(|e| csv_malformed(fallback_line, e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(fallback_line);
            let entry = parse_record(&record).map_err(|reason| malformed(line, reason))?;
            table.push(entry);
        }
        Ok(table)
    }

    fn push(&mut self, entry: MappingEntry) {
        let key = entry.filename.to_lowercase();
        if self.by_name.contains_key(&key) {
            warn!(filename = %entry.filename, "Duplicate mapping row ignored, first row wins");
        } else {
            self.by_name.insert(key, self.entries.len());
        }
        self.entries.push(entry);
    }

    /// Case-insensitive lookup on the bare file name.
    pub fn find(&self, filename: &str) -> Option<&MappingEntry> {
        self.by_name
            .get(&filename.to_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    pub fn custom_property_field(&self) -> Option<&str> {
        self.custom_property_field.as_deref()
    }

    /// Whether any entry in this table can be linked to an artifact.
    pub fn is_linkable(&self) -> bool {
        self.custom_property_field.is_some()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_record(record: &StringRecord) -> Result<MappingEntry, String> {
    if record.len() != 3 {
        return Err(format!("expected 3 fields, found {}", record.len()));
    }
    let artifact_type_id = record[1]
        .parse::<i32>()
        .map_err(|_| format!("artifact type id '{}' is not a number", &record[1]))?;
    Ok(MappingEntry {
        filename: record[0].to_string(),
        artifact_type_id,
        external_key: record[2].to_string(),
    })
}

fn malformed(line: usize, reason: String) -> ConfigError {
    ConfigError::MalformedMappingRow { line, reason }
}

fn csv_malformed(fallback_line: usize, err: csv::Error) -> ConfigError {
    let line = err
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(fallback_line);
    malformed(line, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn parse(text: &str) -> Result<MappingTable, ConfigError> {
        MappingTable::parse(Cursor::new(text))
    }

    #[test]
    fn test_parse_header_and_rows() {
        let table = parse("Filename,ArtifactTypeId,Custom_03\nbug1.png,3,EXT-42\nlog.txt,3,EXT-7\n").unwrap();
        assert_eq!(table.custom_property_field(), Some("Custom_03"));
        assert_eq!(table.len(), 2);
        let entry = table.find("bug1.png").unwrap();
        assert_eq!(entry.artifact_type_id, 3);
        assert_eq!(entry.external_key, "EXT-42");
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let table = parse("Filename,ArtifactTypeId,Custom_03\nBug1.PNG,3,EXT-42\n").unwrap();
        assert!(table.find("bug1.png").is_some());
        assert!(table.find("BUG1.png").is_some());
        assert!(table.find("bug2.png").is_none());
        assert!(table.find("bug1").is_none());
    }

    #[test]
    fn test_blank_third_header_disables_linking() {
        for text in [
            "Filename,ArtifactTypeId, \nbug1.png,3,EXT-42\n",
            "Filename,ArtifactTypeId\nbug1.png,3,EXT-42\n",
        ] {
            let table = parse(text).unwrap();
            assert!(!table.is_linkable());
            assert!(table.find("bug1.png").is_none());
        }
    }

    #[test]
    fn test_header_field_is_trimmed() {
        let table = parse("Filename,ArtifactTypeId,  Custom_05 \r\n").unwrap();
        assert_eq!(table.custom_property_field(), Some("Custom_05"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_non_numeric_type_aborts_parse() {
        let err = parse("Filename,ArtifactTypeId,Custom_03\nok.png,3,A\nbad.png,three,B\n").unwrap_err();
        match err {
            ConfigError::MalformedMappingRow { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_field_count_aborts_parse() {
        assert!(matches!(
            parse("Filename,ArtifactTypeId,Custom_03\nbug1.png,3\n"),
            Err(ConfigError::MalformedMappingRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let table = parse("Filename,ArtifactTypeId,Custom_03\n\nbug1.png,3,EXT-42\n   \n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_quotes_are_literal() {
        let table = parse("Filename,ArtifactTypeId,Custom_03\n\"bug1.png\",3,\"EXT,42\"\n");
        // the quoted comma is a field separator, so the row has four fields
        assert!(matches!(
            table,
            Err(ConfigError::MalformedMappingRow { line: 2, .. })
        ));

        let table = parse("Filename,ArtifactTypeId,Custom_03\n\"bug1.png\",3,EXT-42\n").unwrap();
        assert!(table.find("bug1.png").is_none());
        assert_eq!(table.find("\"bug1.png\"").unwrap().external_key, "EXT-42");
    }

    #[test]
    fn test_invalid_utf8_aborts_parse() {
        let bytes: &[u8] = b"Filename,ArtifactTypeId,Custom_03\nbug\xff.png,3,EXT-42\n";
        assert!(matches!(
            MappingTable::parse(bytes),
            Err(ConfigError::MalformedMappingRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_rows_first_wins() {
        let table = parse("Filename,ArtifactTypeId,Custom_03\nbug1.png,3,FIRST\nBUG1.png,3,SECOND\n").unwrap();
        assert_eq!(table.find("bug1.png").unwrap().external_key, "FIRST");
        assert_eq!(table.entries().len(), 2);
    }

    #[test]
    fn test_empty_file_is_unlinkable() {
        let table = parse("").unwrap();
        assert!(!table.is_linkable());
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.csv");
        assert!(matches!(
            MappingTable::load(&missing),
            Err(ConfigError::MappingFileNotFound(_))
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("map.csv");
        std::fs::write(&path, "Filename,ArtifactTypeId,Custom_03\nbug1.png,3,EXT-42\n").unwrap();
        let table = MappingTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
    }
}
