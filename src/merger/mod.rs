// Shard Result Merger Module
//
// Combines the partial result sets returned by every shard of a fanned-out
// aggregate query into one logical cursor.

pub mod aggregate;
pub mod aggregator;
pub mod column;
pub mod context;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod groupby;
pub mod source;

pub use aggregate::AggregateMerger;
pub use aggregator::{AggregateType, Aggregator};
pub use column::{ColumnDescriptor, ColumnType};
pub use context::QueryContext;
pub use convert::ScanTarget;
pub use cursor::Cursor;
pub use error::{MergerError, MergerResult};
pub use groupby::GroupByMerger;
pub use source::{BoxedRowSource, MemoryRowSource, RowScanner, RowSource, ScanError, SourceError};

/// A merger turns one row source per shard into a single merged cursor
pub trait Merger: Send + Sync {
    fn merge(&self, ctx: &QueryContext, results: Vec<Option<BoxedRowSource>>) -> MergerResult<Box<dyn Cursor>>;
}

/// Entry checks shared by every merger: cancellation, at least one source,
/// and no missing source.
fn check_results(ctx: &QueryContext, results: Vec<Option<BoxedRowSource>>) -> MergerResult<Vec<BoxedRowSource>> {
    ctx.check()?;
    if results.is_empty() {
        return Err(MergerError::EmptyRows);
    }
    if results.iter().any(Option::is_none) {
        return Err(MergerError::RowsIsNull);
    }
    Ok(results.into_iter().flatten().collect())
}

/// Sorted source indexes of the AVG columns among the aggregators
fn avg_indexes(aggregators: &[Box<dyn Aggregator>]) -> Vec<usize> {
    let mut indexes: Vec<usize> = aggregators
        .iter()
        .filter(|agg| agg.name() == AggregateType::Avg)
        .map(|agg| agg.column().index)
        .collect();
    indexes.sort_unstable();
    indexes
}
