// Column Metadata
//
// Descriptors that locate merged values inside shard rows and name them in
// the merged output, plus the per-column type metadata reported by sources.

use serde::{Deserialize, Serialize};

use crate::common::types::ScalarKind;
use crate::merger::aggregator::AggregateType;

/// Identifies a result column by its position in shard rows, its name and
/// the aggregate function that produced it, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Position of the source value within each shard row
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub aggregate: Option<AggregateType>,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ColumnDescriptor {
    /// A plain (group-by) column
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        ColumnDescriptor {
            index,
            name: name.into(),
            aggregate: None,
            alias: None,
        }
    }

    /// A column produced by an aggregate function
    pub fn aggregate(index: usize, name: impl Into<String>, func: AggregateType) -> Self {
        ColumnDescriptor {
            aggregate: Some(func),
            ..ColumnDescriptor::new(index, name)
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Externally visible column name, e.g. `SUM(amount)`
    pub fn select_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.aggregate {
            Some(func) => format!("{}({})", func, self.name),
            None => self.name.clone(),
        }
    }
}

/// Column metadata reported by a shard row source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub name: String,
    /// Driver type name, e.g. `BIGINT`
    pub database_type: String,
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Kind of the values scanned from this column
    #[serde(default)]
    pub scan_kind: Option<ScalarKind>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>, database_type: impl Into<String>) -> Self {
        ColumnType {
            name: name.into(),
            database_type: database_type.into(),
            nullable: None,
            scan_kind: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn with_scan_kind(mut self, kind: ScalarKind) -> Self {
        self.scan_kind = Some(kind);
        self
    }
}

/// Hide the two synthetic SUM/COUNT columns the AVG rewrite inserts right
/// after each AVG column.
///
/// `avg_indexes` must be ascending. Columns after the last pair are kept.
pub fn collapse_avg_columns(types: &[ColumnType], avg_indexes: &[usize]) -> Vec<ColumnType> {
    if avg_indexes.is_empty() {
        return types.to_vec();
    }
    let mut collapsed = Vec::with_capacity(types.len());
    let mut prev = 0;
    for &idx in avg_indexes {
        let end = (idx + 1).min(types.len());
        if prev < end {
            collapsed.extend_from_slice(&types[prev..end]);
        }
        prev = idx + 3;
    }
    if prev < types.len() {
        collapsed.extend_from_slice(&types[prev..]);
    }
    collapsed
}
