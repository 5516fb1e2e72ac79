use crate::domain::{RawRecord, Table};
use std::io::Write;

pub use crate::error::{Error, Result};

pub trait RecordSource {
    // Fetches every raw record with its payload already decoded into `result.json`
    fn fetch_all_records(&self) -> Result<Vec<RawRecord>>;
}

/// Trait for persisting the finished analysis table
/// This is a port (interface) that defines how the core communicates with output adapters
pub trait TableWriter: Send + Sync {
    fn write(&self, table: &Table) -> Result<()>;
}

/// Trait for rendering a batch of issued access codes
pub trait CodeWriter {
    fn write(&self, codes: &[String], out: &mut dyn Write) -> Result<()>;
}
