// Shard Merge Engine
//
// Second-stage aggregation for sharded queries: combines the partial results
// of every shard into one logical cursor.

pub mod common;
pub mod merger;
pub mod plan;
pub mod result_set;

// Re-export key items for convenient access
pub use common::types::{DataValue, Nullable, Scalar, ScalarKind};
pub use merger::{
    AggregateMerger, AggregateType, Aggregator, ColumnDescriptor, ColumnType, Cursor, GroupByMerger,
    MemoryRowSource, Merger, MergerError, MergerResult, QueryContext, RowSource, ScanTarget,
};
pub use plan::MergePlan;
pub use result_set::ResultSet;
