// Merge Plans
//
// JSON description of one merge: the group-by columns, the aggregates and the
// partial rows every shard returned. Used by the command line tool to replay
// shard results through the mergers.

use std::path::Path;
use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::types::{DataValue, Nullable, Scalar, ScalarKind};
use crate::merger::aggregate::AggregateMerger;
use crate::merger::aggregator::AggregateType;
use crate::merger::column::{ColumnDescriptor, ColumnType};
use crate::merger::context::QueryContext;
use crate::merger::convert::ScanTarget;
use crate::merger::groupby::GroupByMerger;
use crate::merger::source::{BoxedRowSource, MemoryRowSource};
use crate::merger::{Merger, MergerResult};
use crate::result_set::ResultSet;

/// Complete merge description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePlan {
    #[serde(default)]
    pub group_by: Vec<ColumnDescriptor>,
    pub aggregates: Vec<PlanAggregate>,
    pub shards: Vec<PlanShard>,
}

/// One aggregate output column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAggregate {
    pub func: AggregateType,
    /// Position of the partial value within each shard row
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl PlanAggregate {
    fn descriptor(&self) -> ColumnDescriptor {
        let column = ColumnDescriptor::aggregate(self.index, self.name.clone(), self.func);
        match &self.alias {
            Some(alias) => column.with_alias(alias.clone()),
            None => column,
        }
    }
}

/// The partial result set of one shard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanShard {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<ColumnType>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl PlanShard {
    fn into_source(self, position: usize) -> Result<BoxedRowSource> {
        let name = self.name.unwrap_or_else(|| format!("shard-{}", position));
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != self.columns.len() {
                    bail!(
                        "{}: row {} has {} values but {} columns are declared",
                        name,
                        i,
                        row.len(),
                        self.columns.len()
                    );
                }
                row.iter()
                    .zip(&self.columns)
                    .map(|(value, column)| {
                        cell_value(value, column).with_context(|| format!("{}: row {}, column {}", name, i, column.name))
                    })
                    .collect::<Result<Vec<DataValue>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(MemoryRowSource::new(name, self.columns, rows)))
    }
}

/// Read a plan from a JSON file
pub fn load_plan(path: impl AsRef<Path>) -> Result<MergePlan> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read plan {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse plan {}", path.display()))
}

/// Run the plan through the merger it calls for and collect the output
pub fn run_plan(plan: MergePlan, ctx: &QueryContext) -> Result<ResultSet> {
    let aggregators = plan
        .aggregates
        .iter()
        .map(|agg| agg.func.aggregator(agg.descriptor()))
        .collect();
    let merger: Box<dyn Merger> = if plan.group_by.is_empty() {
        Box::new(AggregateMerger::new(aggregators))
    } else {
        Box::new(GroupByMerger::new(aggregators, plan.group_by))
    };

    debug!("Running merge plan over {} shard(s)", plan.shards.len());
    let sources = plan
        .shards
        .into_iter()
        .enumerate()
        .map(|(i, shard)| shard.into_source(i).map(Some))
        .collect::<Result<Vec<_>>>()?;

    let cursor = merger.merge(ctx, sources)?;
    Ok(ResultSet::from_cursor(cursor.as_ref())?)
}

/// Convert one JSON cell into the value a driver would scan for `column`.
///
/// JSON null becomes a typed NULL of the column's scan kind (Float64 when
/// none is declared). Nullable columns wrap present values.
fn cell_value(value: &Value, column: &ColumnType) -> Result<DataValue> {
    let kind = column.scan_kind;
    if value.is_null() {
        return Ok(DataValue::null(kind.unwrap_or(ScalarKind::Float64)));
    }

    let raw = json_scalar(value)?;
    let scalar = match kind {
        Some(kind) => coerce(&DataValue::Scalar(raw), kind)?,
        None => raw,
    };
    if column.nullable == Some(true) {
        Ok(DataValue::Nullable(Nullable::valid(scalar)))
    } else {
        Ok(DataValue::Scalar(scalar))
    }
}

fn json_scalar(value: &Value) -> Result<Scalar> {
    match value {
        Value::Bool(b) => Ok(Scalar::Boolean(*b)),
        Value::String(s) => Ok(Scalar::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int64)
            .or_else(|| n.as_u64().map(Scalar::UInt64))
            .or_else(|| n.as_f64().map(Scalar::Float64))
            .ok_or_else(|| anyhow!("unsupported number {}", n)),
        other => Err(anyhow!("unsupported JSON value {}", other)),
    }
}

fn scan_as<T: ScanTarget + Default + Into<Scalar>>(value: &DataValue) -> MergerResult<Scalar> {
    let mut target = T::default();
    target.assign(value)?;
    Ok(target.into())
}

fn coerce(value: &DataValue, kind: ScalarKind) -> MergerResult<Scalar> {
    match kind {
        ScalarKind::Int8 => scan_as::<i8>(value),
        ScalarKind::Int16 => scan_as::<i16>(value),
        ScalarKind::Int32 => scan_as::<i32>(value),
        ScalarKind::Int64 => scan_as::<i64>(value),
        ScalarKind::UInt8 => scan_as::<u8>(value),
        ScalarKind::UInt16 => scan_as::<u16>(value),
        ScalarKind::UInt32 => scan_as::<u32>(value),
        ScalarKind::UInt64 => scan_as::<u64>(value),
        ScalarKind::Float32 => scan_as::<f32>(value),
        ScalarKind::Float64 => scan_as::<f64>(value),
        ScalarKind::Text => scan_as::<String>(value),
        ScalarKind::Boolean => scan_as::<bool>(value),
    }
}
