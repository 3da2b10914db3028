use crate::common::types::DataValue;
use crate::merger::column::ColumnDescriptor;
use crate::merger::error::MergerResult;
use super::{Aggregator, AggregateType, merge_column, min_func};

/// Merges shard-local MIN partials into the global minimum
#[derive(Debug, Clone)]
pub struct Min {
    column: ColumnDescriptor,
}

impl Min {
    pub fn new(column: ColumnDescriptor) -> Self {
        Min { column }
    }
}

impl Aggregator for Min {
    fn aggregate(&self, rows: &[Vec<DataValue>]) -> MergerResult<DataValue> {
        merge_column(rows, self.column.index, AggregateType::Min, min_func)
    }

    fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    fn name(&self) -> AggregateType {
        AggregateType::Min
    }
}
