use crate::columns::ColumnMapping;
use crate::domain::{Cell, Payload, Table};
use tracing::debug;

/// Runs every column's extractor over every payload. A failed extraction
/// becomes `Cell::Missing`; rows are never dropped and keep payload order.
pub fn build_table(payloads: &[Payload<'_>], mapping: &ColumnMapping) -> Table {
    let mut missing = vec![0usize; mapping.len()];

    let rows = payloads
        .iter()
        .map(|payload| {
            mapping
                .iter()
                .enumerate()
                .map(|(col, spec)| {
                    (spec.extract)(payload).unwrap_or_else(|| {
                        missing[col] += 1;
                        Cell::Missing
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    for (spec, count) in mapping.iter().zip(&missing) {
        if *count > 0 {
            debug!(column = %spec.name, missing = count, "cells without a value");
        }
    }

    Table {
        columns: mapping.names(),
        rows,
    }
}
