use crate::codes::issue_batch;
use crate::columns::ColumnMapping;
use crate::config::CodeConfig;
use crate::domain::{Payload, Table};
use crate::filter::RecordFilter;
use crate::ports::{CodeWriter, RecordSource, Result, TableWriter};
use crate::table::build_table;
use std::io::Write;
use tracing::{info, warn};

/// Application service that turns the response export into the analysis table
pub struct AnalysisServiceImpl {
    record_source: Box<dyn RecordSource>,
    table_writer: Box<dyn TableWriter>,
    filter: RecordFilter,
    mapping: ColumnMapping,
}

impl AnalysisServiceImpl {
    /// Creates a new AnalysisServiceImpl with the given dependencies
    pub fn new(
        record_source: Box<dyn RecordSource>,
        table_writer: Box<dyn TableWriter>,
        filter: RecordFilter,
        mapping: ColumnMapping,
    ) -> Self {
        Self {
            record_source,
            table_writer,
            filter,
            mapping,
        }
    }

    /// Executes the analysis: fetches records, filters them, builds the table and writes it
    pub fn execute_analysis(&self) -> Result<Table> {
        let records = self.record_source.fetch_all_records()?;
        info!(records = records.len(), "loaded records");

        let records = self.filter.apply(records);
        let payloads: Vec<Payload<'_>> = records.iter().map(|r| r.payload()).collect();
        let table = build_table(&payloads, &self.mapping);
        if table.is_empty() {
            warn!("no records left after filtering; writing header only");
        }
        info!(rows = table.len(), columns = table.columns.len(), "built table");

        self.table_writer.write(&table)?;
        Ok(table)
    }
}

/// Application service that issues a batch of access codes
pub struct CodeIssuanceServiceImpl {
    code_writers: Vec<Box<dyn CodeWriter>>,
    config: CodeConfig,
}

impl CodeIssuanceServiceImpl {
    pub fn new(code_writers: Vec<Box<dyn CodeWriter>>, config: CodeConfig) -> Self {
        Self {
            code_writers,
            config,
        }
    }

    /// Generates the configured batch and renders it with every writer in turn
    pub fn execute_issuance(&self, out: &mut dyn Write) -> Result<Vec<String>> {
        self.config.validate()?;
        let codes = issue_batch(
            self.config.seed,
            self.config.length,
            self.config.count,
            self.config.batch,
        )?;
        info!(
            count = codes.len(),
            batch = self.config.batch,
            seed = self.config.seed,
            "generated codes"
        );

        for writer in &self.code_writers {
            writer.write(&codes, out)?;
        }
        out.flush()?;
        Ok(codes)
    }
}
