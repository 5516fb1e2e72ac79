use csv::WriterBuilder;
use std::fs;
use std::path::PathBuf;
use study_core::domain::Table;
use study_core::ports::{Error, Result, TableWriter};
use tracing::info;

/// CSV writer adapter implementation
pub struct CsvTableWriter {
    output_path: PathBuf,
    missing_marker: String,
}

impl CsvTableWriter {
    pub fn new(output_path: PathBuf, missing_marker: String) -> Self {
        Self {
            output_path,
            missing_marker,
        }
    }

    fn write_table(&self, table: &Table) -> csv::Result<()> {
        let mut writer = WriterBuilder::new().from_path(&self.output_path)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.render(&self.missing_marker)))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl TableWriter for CsvTableWriter {
    fn write(&self, table: &Table) -> Result<()> {
        // Create output directory if it doesn't exist
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        self.write_table(table)
            .map_err(|e| Error::Sink(format!("{}: {e}", self.output_path.display())))?;
        info!(path = %self.output_path.display(), rows = table.len(), "wrote table");
        Ok(())
    }
}
