// Aggregate Merger
//
// Merges aggregate queries without GROUP BY. Every shard returns exactly one
// row of partial aggregates, and the merged cursor yields exactly one row.

use std::sync::Arc;
use log::debug;

use crate::common::types::DataValue;
use crate::merger::aggregator::Aggregator;
use crate::merger::column::{ColumnType, collapse_avg_columns};
use crate::merger::context::QueryContext;
use crate::merger::cursor::{Cursor, MergedCursor, RowProducer};
use crate::merger::error::{MergerError, MergerResult};
use crate::merger::source::{BoxedRowSource, RowScanner, ScanError};
use super::{Merger, avg_indexes, check_results};

/// Merger for aggregate-only queries (no GROUP BY)
pub struct AggregateMerger {
    aggregators: Arc<Vec<Box<dyn Aggregator>>>,
    columns: Vec<String>,
    avg_indexes: Arc<Vec<usize>>,
}

impl AggregateMerger {
    /// Aggregators are listed in output column order
    pub fn new(aggregators: Vec<Box<dyn Aggregator>>) -> Self {
        let columns = aggregators.iter().map(|agg| agg.column().select_name()).collect();
        let avg_indexes = avg_indexes(&aggregators);
        AggregateMerger {
            aggregators: Arc::new(aggregators),
            columns,
            avg_indexes: Arc::new(avg_indexes),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Merge into the concrete cursor type
    pub fn merge_rows(
        &self,
        ctx: &QueryContext,
        results: Vec<Option<BoxedRowSource>>,
    ) -> MergerResult<MergedCursor<AggregateRows>> {
        let sources = check_results(ctx, results)?;
        debug!(
            "Merging {} aggregate column(s) from {} shard(s)",
            self.aggregators.len(),
            sources.len()
        );
        let producer = AggregateRows {
            aggregators: Arc::clone(&self.aggregators),
            avg_indexes: Arc::clone(&self.avg_indexes),
            produced: false,
        };
        Ok(MergedCursor::new(sources, self.columns.clone(), producer))
    }
}

impl Merger for AggregateMerger {
    fn merge(&self, ctx: &QueryContext, results: Vec<Option<BoxedRowSource>>) -> MergerResult<Box<dyn Cursor>> {
        Ok(Box::new(self.merge_rows(ctx, results)?))
    }
}

/// Produces the single merged aggregate row
pub struct AggregateRows {
    aggregators: Arc<Vec<Box<dyn Aggregator>>>,
    avg_indexes: Arc<Vec<usize>>,
    produced: bool,
}

impl AggregateRows {
    /// One partial row from every shard
    fn scan_partials(sources: &mut [BoxedRowSource]) -> MergerResult<Vec<Vec<DataValue>>> {
        let mut partials = Vec::with_capacity(sources.len());
        for source in sources.iter_mut() {
            let mut scanner = RowScanner::new(source.as_mut())?;
            match scanner.scan() {
                Ok(row) => partials.push(row),
                Err(ScanError::NoMoreRows) => return Err(MergerError::AggregateHasEmptyRows),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(partials)
    }
}

impl RowProducer for AggregateRows {
    fn produce(&mut self, sources: &mut [BoxedRowSource]) -> MergerResult<Option<Vec<DataValue>>> {
        if self.produced {
            return Ok(None);
        }
        self.produced = true;

        let partials = Self::scan_partials(sources)?;
        self.aggregators
            .iter()
            .map(|agg| agg.aggregate(&partials))
            .collect::<MergerResult<Vec<_>>>()
            .map(Some)
    }

    fn column_types(&self, sources: &[BoxedRowSource]) -> MergerResult<Vec<ColumnType>> {
        let types = sources[0].column_types()?;
        Ok(collapse_avg_columns(&types, &self.avg_indexes))
    }
}
