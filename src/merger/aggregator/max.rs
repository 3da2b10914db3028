use crate::common::types::DataValue;
use crate::merger::column::ColumnDescriptor;
use crate::merger::error::MergerResult;
use super::{Aggregator, AggregateType, max_func, merge_column};

/// Merges shard-local MAX partials into the global maximum
#[derive(Debug, Clone)]
pub struct Max {
    column: ColumnDescriptor,
}

impl Max {
    pub fn new(column: ColumnDescriptor) -> Self {
        Max { column }
    }
}

impl Aggregator for Max {
    fn aggregate(&self, rows: &[Vec<DataValue>]) -> MergerResult<DataValue> {
        merge_column(rows, self.column.index, AggregateType::Max, max_func)
    }

    fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    fn name(&self) -> AggregateType {
        AggregateType::Max
    }
}
