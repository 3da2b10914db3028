use anyhow::Result;
use std::sync::Arc;
use std::thread;

use shardmerge::common::types::{DataValue, ScalarKind};
use shardmerge::merger::{
    AggregateType, ColumnDescriptor, Cursor, GroupByMerger, Merger, MergerError, QueryContext,
};

#[path = "../common/mod.rs"]
mod common;
use common::{column, shard};

fn grouped_cursor(groups: i64) -> Result<Box<dyn Cursor>> {
    let columns = vec![
        column("bucket", "BIGINT", ScalarKind::Int64),
        column("COUNT(id)", "BIGINT", ScalarKind::Int64),
    ];
    let rows = |offset: i64| -> Vec<Vec<DataValue>> {
        (0..groups).map(|g| vec![g.into(), (g + offset).into()]).collect()
    };
    let merger = GroupByMerger::new(
        vec![AggregateType::Count.aggregator(ColumnDescriptor::aggregate(1, "id", AggregateType::Count))],
        vec![ColumnDescriptor::new(0, "bucket")],
    );
    Ok(merger.merge(
        &QueryContext::new(),
        vec![shard("s0", &columns, rows(0)), shard("s1", &columns, rows(1))],
    )?)
}

#[test]
fn test_concurrent_readers_and_iterator() -> Result<()> {
    let cursor: Arc<dyn Cursor> = Arc::from(grouped_cursor(200)?);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cursor = Arc::clone(&cursor);
            thread::spawn(move || {
                for _ in 0..100 {
                    match cursor.columns() {
                        Ok(columns) => assert_eq!(columns, vec!["bucket", "COUNT(id)"]),
                        Err(err) => assert_eq!(err, MergerError::RowsClosed),
                    }
                    assert!(cursor.err().is_none());
                }
            })
        })
        .collect();

    let mut buckets = Vec::new();
    while cursor.next() {
        let (mut bucket, mut count) = (0i64, 0i64);
        cursor.scan(&mut [&mut bucket, &mut count])?;
        assert_eq!(count, 2 * bucket + 1);
        buckets.push(bucket);
    }

    for reader in readers {
        reader.join().map_err(|_| anyhow::anyhow!("reader thread panicked"))?;
    }
    assert_eq!(buckets, (0..200).collect::<Vec<i64>>());
    Ok(())
}

#[test]
fn test_concurrent_next_yields_each_row_once() -> Result<()> {
    let cursor: Arc<dyn Cursor> = Arc::from(grouped_cursor(100)?);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let cursor = Arc::clone(&cursor);
            thread::spawn(move || {
                let mut seen = 0usize;
                while cursor.next() {
                    seen += 1;
                }
                seen
            })
        })
        .collect();

    let mut total = 0;
    for worker in workers {
        total += worker.join().map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
    }
    assert_eq!(total, 100);
    assert!(cursor.close().is_ok());
    Ok(())
}

#[test]
fn test_lifecycle() -> Result<()> {
    let cursor = grouped_cursor(2)?;
    let mut bucket = 0i64;

    assert_eq!(cursor.scan(&mut [&mut bucket]), Err(MergerError::ScanNotNext));
    assert!(!cursor.next_result_set());

    assert!(cursor.next());
    cursor.scan(&mut [&mut bucket])?;
    assert_eq!(bucket, 0);

    let (mut a, mut b, mut c) = (0i64, 0i64, 0i64);
    assert_eq!(
        cursor.scan(&mut [&mut a, &mut b, &mut c]),
        Err(MergerError::ScanArity { expected: 2, got: 3 })
    );

    cursor.close()?;
    assert!(!cursor.next());
    assert_eq!(cursor.scan(&mut [&mut bucket]), Err(MergerError::RowsClosed));
    assert_eq!(cursor.columns(), Err(MergerError::RowsClosed));
    cursor.close()?;
    Ok(())
}
