use anyhow::Result;
use std::sync::atomic::Ordering;

use shardmerge::common::types::{DataValue, ScalarKind};
use shardmerge::merger::{
    AggregateType, Aggregator, ColumnDescriptor, GroupByMerger, Merger, MergerError, QueryContext,
};
use shardmerge::result_set::ResultSet;

#[path = "../common/mod.rs"]
mod common;
use common::{column, sales_columns, sales_row, shard, tracked_shard};

fn sales_merger() -> GroupByMerger {
    let aggregators: Vec<Box<dyn Aggregator>> = vec![
        AggregateType::Count.aggregator(ColumnDescriptor::aggregate(1, "id", AggregateType::Count)),
        AggregateType::Avg.aggregator(ColumnDescriptor::aggregate(2, "score", AggregateType::Avg)),
    ];
    GroupByMerger::new(aggregators, vec![ColumnDescriptor::new(0, "region")])
}

#[test]
fn test_groups_merge_across_shards_in_first_seen_order() -> Result<()> {
    let columns = sales_columns();
    let merger = sales_merger();
    let cursor = merger.merge(
        &QueryContext::new(),
        vec![
            shard("s0", &columns, vec![sales_row("west", 3, 30, 3), sales_row("east", 2, 10, 2)]),
            shard("s1", &columns, vec![sales_row("north", 1, 4, 1), sales_row("east", 4, 50, 3)]),
            shard("s2", &columns, vec![sales_row("west", 1, 2, 1)]),
        ],
    )?;

    assert_eq!(cursor.columns()?, vec!["region", "COUNT(id)", "AVG(score)"]);
    let type_names: Vec<String> = cursor.column_types()?.into_iter().map(|c| c.name).collect();
    assert_eq!(type_names, vec!["region", "COUNT(id)", "AVG(score)"]);

    let result = ResultSet::from_cursor(cursor.as_ref())?;
    assert_eq!(
        result.rows(),
        &[
            vec![DataValue::from("west"), DataValue::from(4i64), DataValue::from(8.0f64)],
            vec![DataValue::from("east"), DataValue::from(6i64), DataValue::from(12.0f64)],
            vec![DataValue::from("north"), DataValue::from(1i64), DataValue::from(4.0f64)],
        ]
    );
    Ok(())
}

#[test]
fn test_composite_keys() -> Result<()> {
    let columns = vec![
        column("region", "VARCHAR", ScalarKind::Text),
        column("year", "INT", ScalarKind::Int32),
        column("SUM(amount)", "DOUBLE", ScalarKind::Float64),
    ];
    let row = |region: &str, year: i32, amount: f64| -> Vec<DataValue> { vec![region.into(), year.into(), amount.into()] };
    let merger = GroupByMerger::new(
        vec![AggregateType::Sum.aggregator(ColumnDescriptor::aggregate(2, "amount", AggregateType::Sum))],
        vec![ColumnDescriptor::new(0, "region"), ColumnDescriptor::new(1, "year")],
    );

    let cursor = merger.merge(
        &QueryContext::new(),
        vec![
            shard("s0", &columns, vec![row("east", 2023, 1.0), row("east", 2024, 2.0)]),
            shard("s1", &columns, vec![row("east", 2024, 3.0), row("west", 2023, 4.0)]),
        ],
    )?;

    let mut merged = Vec::new();
    while cursor.next() {
        let (mut region, mut year, mut amount) = (String::new(), 0i32, 0f64);
        cursor.scan(&mut [&mut region, &mut year, &mut amount])?;
        merged.push((region, year, amount));
    }
    assert!(cursor.err().is_none());
    assert_eq!(
        merged,
        vec![
            ("east".to_string(), 2023, 1.0),
            ("east".to_string(), 2024, 5.0),
            ("west".to_string(), 2023, 4.0),
        ]
    );
    Ok(())
}

#[test]
fn test_signed_zero_keys_merge_into_one_group() -> Result<()> {
    let columns = vec![
        column("discount", "DOUBLE", ScalarKind::Float64),
        column("COUNT(id)", "BIGINT", ScalarKind::Int64),
    ];
    let merger = GroupByMerger::new(
        vec![AggregateType::Count.aggregator(ColumnDescriptor::aggregate(1, "id", AggregateType::Count))],
        vec![ColumnDescriptor::new(0, "discount")],
    );

    let cursor = merger.merge(
        &QueryContext::new(),
        vec![
            shard("s0", &columns, vec![vec![0.0f64.into(), 3i64.into()], vec![0.5f64.into(), 1i64.into()]]),
            shard("s1", &columns, vec![vec![(-0.0f64).into(), 4i64.into()]]),
        ],
    )?;

    let result = ResultSet::from_cursor(cursor.as_ref())?;
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows()[0][1], DataValue::from(7i64));
    assert_eq!(result.rows()[1], vec![DataValue::from(0.5f64), DataValue::from(1i64)]);
    Ok(())
}

#[test]
fn test_merge_reads_every_row_up_front() -> Result<()> {
    let columns = sales_columns();
    let (s0, closed0) = tracked_shard("s0", &columns, vec![sales_row("east", 1, 1, 1)]);
    let cursor = sales_merger().merge(&QueryContext::new(), vec![s0])?;

    // Column types stay available although the source is exhausted.
    assert_eq!(cursor.column_types()?.len(), 3);
    assert!(!closed0.load(Ordering::SeqCst));

    assert!(cursor.next());
    assert!(!cursor.next());
    assert!(closed0.load(Ordering::SeqCst));
    assert_eq!(cursor.row(), Err(MergerError::RowsClosed));
    Ok(())
}

#[test]
fn test_shards_without_rows_produce_no_groups() -> Result<()> {
    let columns = sales_columns();
    let cursor = sales_merger().merge(
        &QueryContext::new(),
        vec![shard("s0", &columns, vec![]), shard("s1", &columns, vec![])],
    )?;
    assert!(!cursor.next());
    assert!(cursor.err().is_none());
    Ok(())
}

#[test]
fn test_scan_failure_aborts_merge_and_closes_shards() -> Result<()> {
    let columns = sales_columns();
    let (s0, closed0) = tracked_shard("s0", &columns, vec![sales_row("east", 1, 1, 1)]);
    let broken = shardmerge::merger::MemoryRowSource::new("s1", columns.clone(), vec![sales_row("west", 1, 1, 1)])
        .with_row_error(0, "connection reset");

    match sales_merger().merge(&QueryContext::new(), vec![s0, common::boxed(broken)]) {
        Err(MergerError::Scan(err)) => assert_eq!(err.to_string(), "s1: connection reset"),
        Err(other) => panic!("expected scan failure, got {:?}", other),
        Ok(_) => panic!("expected scan failure"),
    }
    assert!(closed0.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn test_null_group_key_is_rejected() -> Result<()> {
    let columns = sales_columns();
    let mut row = sales_row("east", 1, 1, 1);
    row[0] = DataValue::null(ScalarKind::Text);

    let result = sales_merger().merge(&QueryContext::new(), vec![shard("s0", &columns, vec![row])]);
    assert_eq!(
        result.err(),
        Some(MergerError::NullGroupKey {
            column: "region".to_string()
        })
    );
    Ok(())
}

#[test]
fn test_group_column_out_of_range() -> Result<()> {
    let columns = sales_columns();
    let merger = GroupByMerger::new(
        vec![AggregateType::Count.aggregator(ColumnDescriptor::aggregate(1, "id", AggregateType::Count))],
        vec![ColumnDescriptor::new(9, "region")],
    );
    let result = merger.merge(&QueryContext::new(), vec![shard("s0", &columns, vec![sales_row("east", 1, 1, 1)])]);
    assert_eq!(
        result.err(),
        Some(MergerError::InvalidGroupColumnIndex { index: 9, width: 5 })
    );
    Ok(())
}
