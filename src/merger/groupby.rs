// Group-By Merger
//
// Merges GROUP BY aggregate queries. Every shard row is read during Merge and
// bucketed under its composite group key; the cursor then emits one merged
// row per distinct key, in the order keys were first seen.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use log::{debug, warn};

use crate::common::types::{DataValue, Scalar};
use crate::merger::aggregator::Aggregator;
use crate::merger::column::{ColumnDescriptor, ColumnType, collapse_avg_columns};
use crate::merger::context::QueryContext;
use crate::merger::cursor::{Cursor, MergedCursor, RowProducer};
use crate::merger::error::{MergerError, MergerResult};
use crate::merger::source::{BoxedRowSource, RowScanner};
use super::{Merger, avg_indexes, check_results};

/// Composite group key: one non-null value per group-by column.
///
/// Keys compare lexicographically, each component by its scalar ordering.
/// A bare value and a valid nullable wrapper of the same scalar are equal.
#[derive(Debug, Clone)]
pub struct GroupKey {
    values: Vec<DataValue>,
}

impl GroupKey {
    /// Extract the key of `row` for the given group columns
    fn from_row(row: &[DataValue], group_columns: &[ColumnDescriptor]) -> MergerResult<Self> {
        let mut values = Vec::with_capacity(group_columns.len());
        for column in group_columns {
            let value = row.get(column.index).ok_or(MergerError::InvalidGroupColumnIndex {
                index: column.index,
                width: row.len(),
            })?;
            if value.is_null() {
                return Err(MergerError::NullGroupKey {
                    column: column.select_name(),
                });
            }
            values.push(value.clone());
        }
        Ok(GroupKey { values })
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    fn scalars(&self) -> impl Iterator<Item = &Scalar> {
        self.values.iter().filter_map(DataValue::non_null)
    }

    /// Every component must have the kind of the matching component of `first`
    fn check_kinds(&self, first: &GroupKey) -> MergerResult<()> {
        for (expected, found) in first.scalars().zip(self.scalars()) {
            if expected.kind() != found.kind() {
                return Err(MergerError::MismatchedKinds {
                    expected: expected.kind(),
                    found: found.kind(),
                });
            }
        }
        Ok(())
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.scalars().zip(other.scalars()) {
            let ord = a.compare(b).unwrap_or_else(|| a.kind().cmp(&b.kind()));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.values.len().cmp(&other.values.len())
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

/// All shard rows bucketed under one key
#[derive(Debug)]
struct Group {
    key: GroupKey,
    rows: Vec<Vec<DataValue>>,
}

/// Ordered key lookup plus the groups in first-seen order
#[derive(Debug, Default)]
struct GroupIndex {
    slots: BTreeMap<GroupKey, usize>,
    groups: Vec<Group>,
}

impl GroupIndex {
    fn insert(&mut self, key: GroupKey, row: Vec<DataValue>) -> MergerResult<()> {
        if let Some(first) = self.groups.first() {
            key.check_kinds(&first.key)?;
        }
        match self.slots.entry(key) {
            Entry::Occupied(slot) => self.groups[*slot.get()].rows.push(row),
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                slot.insert(self.groups.len());
                self.groups.push(Group { key, rows: vec![row] });
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.groups.len()
    }
}

/// Merger for GROUP BY aggregate queries
pub struct GroupByMerger {
    aggregators: Arc<Vec<Box<dyn Aggregator>>>,
    group_columns: Vec<ColumnDescriptor>,
    columns: Vec<String>,
    avg_indexes: Arc<Vec<usize>>,
}

impl GroupByMerger {
    /// Output columns are the group columns followed by the aggregates
    pub fn new(aggregators: Vec<Box<dyn Aggregator>>, group_columns: Vec<ColumnDescriptor>) -> Self {
        let columns = group_columns
            .iter()
            .map(ColumnDescriptor::select_name)
            .chain(aggregators.iter().map(|agg| agg.column().select_name()))
            .collect();
        let avg_indexes = avg_indexes(&aggregators);
        GroupByMerger {
            aggregators: Arc::new(aggregators),
            group_columns,
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
    ) -> MergerResult<MergedCursor<GroupByRows>> {
        let mut sources = check_results(ctx, results)?;
        debug!("Merging grouped rows from {} shard(s)", sources.len());

        // Shard column types must be read before the scan exhausts the sources.
        let scanned = sources[0]
            .column_types()
            .map_err(MergerError::from)
            .and_then(|types| self.build_index(&mut sources).map(|index| (types, index)));
        let (column_types, index) = match scanned {
            Ok(indexed) => indexed,
            Err(err) => {
                for source in sources.iter_mut() {
                    if let Err(close_err) = source.close() {
                        warn!("Failed to close row source after failed merge: {}", close_err);
                    }
                }
                return Err(err);
            }
        };
        debug!("Built {} group(s)", index.len());

        let producer = GroupByRows {
            aggregators: Arc::clone(&self.aggregators),
            column_types: collapse_avg_columns(&column_types, &self.avg_indexes),
            groups: index.groups,
            position: 0,
        };
        Ok(MergedCursor::new(sources, self.columns.clone(), producer))
    }

    /// Scan every row of every shard, in shard order, into the index
    fn build_index(&self, sources: &mut [BoxedRowSource]) -> MergerResult<GroupIndex> {
        let mut index = GroupIndex::default();
        for source in sources.iter_mut() {
            let rows = RowScanner::new(source.as_mut())?.scan_all()?;
            for row in rows {
                let key = GroupKey::from_row(&row, &self.group_columns)?;
                index.insert(key, row)?;
            }
        }
        Ok(index)
    }
}

impl Merger for GroupByMerger {
    fn merge(&self, ctx: &QueryContext, results: Vec<Option<BoxedRowSource>>) -> MergerResult<Box<dyn Cursor>> {
        Ok(Box::new(self.merge_rows(ctx, results)?))
    }
}

/// Walks the groups in first-seen order, one merged row per group
pub struct GroupByRows {
    aggregators: Arc<Vec<Box<dyn Aggregator>>>,
    column_types: Vec<ColumnType>,
    groups: Vec<Group>,
    position: usize,
}

impl RowProducer for GroupByRows {
    fn produce(&mut self, _sources: &mut [BoxedRowSource]) -> MergerResult<Option<Vec<DataValue>>> {
        let Some(group) = self.groups.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;

        let mut row = group.key.values().to_vec();
        for agg in self.aggregators.iter() {
            row.push(agg.aggregate(&group.rows)?);
        }
        Ok(Some(row))
    }

    fn column_types(&self, _sources: &[BoxedRowSource]) -> MergerResult<Vec<ColumnType>> {
        Ok(self.column_types.clone())
    }
}
