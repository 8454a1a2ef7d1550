use screen_core::{ExportSink, NamedTable, ScreenError};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each table to `<dir>/<name>.csv`, header row first.
///
/// Existing files with the same name are overwritten, so repeated runs on the
/// same date replace rather than append.
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table: &NamedTable) -> PathBuf {
        self.dir.join(format!("{}.csv", table.name))
    }

    fn write_table(&self, table: &NamedTable) -> Result<PathBuf, ScreenError> {
        let path = self.path_for(table);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(|e| ScreenError::Export(format!("{}: {}", path.display(), e)))?;

        writer
            .write_record(&table.columns)
            .map_err(|e| ScreenError::Export(format!("{} header: {}", table.name, e)))?;
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|e| ScreenError::Export(format!("{} row: {}", table.name, e)))?;
        }
        writer
            .flush()
            .map_err(|e| ScreenError::Export(format!("{}: {}", path.display(), e)))?;

        Ok(path)
    }
}

impl ExportSink for CsvDirectorySink {
    fn write_tables(&mut self, tables: &[NamedTable]) -> Result<(), ScreenError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| ScreenError::Export(format!("create {}: {}", self.dir.display(), e)))?;

        for table in tables {
            let path = self.write_table(table)?;
            tracing::info!("💾 Wrote {} rows to {}", table.rows.len(), path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> NamedTable {
        NamedTable {
            name: name.to_string(),
            columns: vec!["Ticker".to_string(), "Net_Score".to_string()],
            rows: vec![
                vec!["RELIANCE".to_string(), "15".to_string()],
                vec!["M&M, LTD".to_string(), String::new()],
            ],
        }
    }

    #[test]
    fn test_writes_one_file_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvDirectorySink::new(dir.path().join("scan"));

        sink.write_tables(&[table("matched"), table("missed")]).unwrap();

        for name in ["matched", "missed"] {
            let path = dir.path().join("scan").join(format!("{}.csv", name));
            let mut reader = csv::Reader::from_path(&path).unwrap();
            let headers = reader.headers().unwrap().clone();
            assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["Ticker", "Net_Score"]);

            let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
            assert_eq!(rows.len(), 2);
            assert_eq!(&rows[1][0], "M&M, LTD");
            assert_eq!(&rows[1][1], "");
        }
    }

    #[test]
    fn test_rewrite_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvDirectorySink::new(dir.path());

        sink.write_tables(&[table("matched")]).unwrap();
        let first = fs::read_to_string(dir.path().join("matched.csv")).unwrap();
        sink.write_tables(&[table("matched")]).unwrap();
        let second = fs::read_to_string(dir.path().join("matched.csv")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvDirectorySink::new(dir.path());
        let mut empty = table("missed");
        empty.rows.clear();

        sink.write_tables(&[empty]).unwrap();

        let content = fs::read_to_string(dir.path().join("missed.csv")).unwrap();
        assert_eq!(content, "Ticker,Net_Score\n");
    }

    #[test]
    fn test_unwritable_dir_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let mut sink = CsvDirectorySink::new(blocker.join("nested"));

        let err = sink.write_tables(&[table("matched")]).unwrap_err();
        assert!(matches!(err, ScreenError::Export(_)));
    }
}
