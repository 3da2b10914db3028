use crate::common::types::DataValue;
use crate::merger::column::ColumnDescriptor;
use crate::merger::error::MergerResult;
use super::{Aggregator, AggregateType, count_func, merge_column};

/// Merges shard-local COUNT partials by adding them together
#[derive(Debug, Clone)]
pub struct Count {
    column: ColumnDescriptor,
}

impl Count {
    pub fn new(column: ColumnDescriptor) -> Self {
        Count { column }
    }
}

impl Aggregator for Count {
    fn aggregate(&self, rows: &[Vec<DataValue>]) -> MergerResult<DataValue> {
        merge_column(rows, self.column.index, AggregateType::Count, count_func)
    }

    fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    fn name(&self) -> AggregateType {
        AggregateType::Count
    }
}
