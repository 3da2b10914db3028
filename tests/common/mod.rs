#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use shardmerge::common::types::{DataValue, ScalarKind};
use shardmerge::merger::{BoxedRowSource, ColumnType, MemoryRowSource};

// Column metadata with a declared scan kind
pub fn column(name: &str, database_type: &str, kind: ScalarKind) -> ColumnType {
    ColumnType::new(name, database_type).with_scan_kind(kind)
}

// Wrap an in-memory source the way the shard executor hands them over
pub fn boxed(source: MemoryRowSource) -> Option<BoxedRowSource> {
    Some(Box::new(source))
}

// Shard with the given columns and rows
pub fn shard(name: &str, columns: &[ColumnType], rows: Vec<Vec<DataValue>>) -> Option<BoxedRowSource> {
    boxed(MemoryRowSource::new(name, columns.to_vec(), rows))
}

// Shard plus a flag reporting whether the merger closed it
pub fn tracked_shard(
    name: &str,
    columns: &[ColumnType],
    rows: Vec<Vec<DataValue>>,
) -> (Option<BoxedRowSource>, Arc<AtomicBool>) {
    let source = MemoryRowSource::new(name, columns.to_vec(), rows);
    let flag = source.closed_flag();
    (boxed(source), flag)
}

// One shard per partial value of a single aggregate column
pub fn single_column_shards(name: &str, kind: ScalarKind, partials: Vec<DataValue>) -> Vec<Option<BoxedRowSource>> {
    let columns = vec![column(name, kind.name(), kind)];
    partials
        .into_iter()
        .enumerate()
        .map(|(i, value)| shard(&format!("shard-{}", i), &columns, vec![vec![value]]))
        .collect()
}

// Layout used by the group-by tests:
// region, COUNT(id), AVG(score), SUM(score), COUNT(score)
pub fn sales_columns() -> Vec<ColumnType> {
    vec![
        column("region", "VARCHAR", ScalarKind::Text),
        column("COUNT(id)", "BIGINT", ScalarKind::Int64),
        column("AVG(score)", "DOUBLE", ScalarKind::Float64),
        column("SUM(score)", "BIGINT", ScalarKind::Int64),
        column("COUNT(score)", "BIGINT", ScalarKind::Int64),
    ]
}

pub fn sales_row(region: &str, count: i64, sum: i64, scored: i64) -> Vec<DataValue> {
    let avg = if scored == 0 { 0.0 } else { sum as f64 / scored as f64 };
    vec![region.into(), count.into(), avg.into(), sum.into(), scored.into()]
}
