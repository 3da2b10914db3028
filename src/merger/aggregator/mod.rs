// Aggregators Module
//
// Second-level aggregate functions. Each aggregator reduces one column of
// shard-partial rows (one row per shard, or every row bucketed under one
// group key) into a single merged value: sum of sums, sum of counts, min of
// mins, max of maxes, and AVG derived from its SUM/COUNT sub-columns.

mod avg;
mod count;
mod max;
mod min;
mod sum;

pub use avg::Avg;
pub use count::Count;
pub use max::Max;
pub use min::Min;
pub use sum::Sum;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::common::types::{DataValue, Scalar, ScalarKind};
use crate::merger::column::ColumnDescriptor;
use crate::merger::error::{MergerError, MergerResult};

/// Types of supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateType {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateType::Count => "COUNT",
            AggregateType::Sum => "SUM",
            AggregateType::Avg => "AVG",
            AggregateType::Min => "MIN",
            AggregateType::Max => "MAX",
        }
    }

    /// Build the aggregator for this function over the given column
    pub fn aggregator(self, column: ColumnDescriptor) -> Box<dyn Aggregator> {
        match self {
            AggregateType::Count => Box::new(Count::new(column)),
            AggregateType::Sum => Box::new(Sum::new(column)),
            AggregateType::Avg => Box::new(Avg::new(column)),
            AggregateType::Min => Box::new(Min::new(column)),
            AggregateType::Max => Box::new(Max::new(column)),
        }
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COUNT" => Ok(AggregateType::Count),
            "SUM" => Ok(AggregateType::Sum),
            "AVG" => Ok(AggregateType::Avg),
            "MIN" => Ok(AggregateType::Min),
            "MAX" => Ok(AggregateType::Max),
            other => Err(format!("Unsupported aggregate function: {}", other)),
        }
    }
}

/// A second-level aggregate over shard-partial rows.
///
/// Implementations are stateless: `aggregate` is a pure function of its
/// input, and the combining step is associative and commutative so shard
/// order never changes the result.
pub trait Aggregator: Send + Sync + fmt::Debug {
    /// Merge the values at this aggregator's column across `rows`
    fn aggregate(&self, rows: &[Vec<DataValue>]) -> MergerResult<DataValue>;

    /// The column this aggregator reads and names
    fn column(&self) -> &ColumnDescriptor;

    /// Function tag
    fn name(&self) -> AggregateType;
}

/// Combining function for one scalar kind. Receives the first non-null
/// partial and the remaining ones.
pub(crate) type CombineFn = fn(&Scalar, &[&Scalar]) -> MergerResult<Scalar>;

/// Lookup from scalar kind to combining function
pub(crate) type Registry = fn(ScalarKind) -> Option<CombineFn>;

/// Non-null partials of one column, or the first value when every one is NULL
enum Partition<'a> {
    AllNull(&'a DataValue),
    NonNull { first: &'a Scalar, rest: Vec<&'a Scalar> },
}

/// Gather the values at `index` from every row, split into the first value
/// and the rest.
///
/// The index is validated against the first row; later rows that are too
/// short fail the same way.
fn column_values(rows: &[Vec<DataValue>], index: usize) -> MergerResult<(&DataValue, Vec<&DataValue>)> {
    let Some((head, tail)) = rows.split_first() else {
        return Err(MergerError::InvalidAggregateColumnIndex { index, width: 0 });
    };
    let first = head.get(index).ok_or(MergerError::InvalidAggregateColumnIndex {
        index,
        width: head.len(),
    })?;
    let rest = tail
        .iter()
        .map(|row| {
            row.get(index).ok_or(MergerError::InvalidAggregateColumnIndex {
                index,
                width: row.len(),
            })
        })
        .collect::<MergerResult<Vec<_>>>()?;
    Ok((first, rest))
}

/// Drop NULLs and check that the remaining values share one kind
fn partition_nulls<'a>(first: &'a DataValue, rest: &[&'a DataValue]) -> MergerResult<Partition<'a>> {
    let mut non_null = std::iter::once(first)
        .chain(rest.iter().copied())
        .filter_map(DataValue::non_null);
    let Some(head) = non_null.next() else {
        return Ok(Partition::AllNull(first));
    };

    let kind = head.kind();
    let mut tail = Vec::with_capacity(rest.len());
    for scalar in non_null {
        if scalar.kind() != kind {
            return Err(MergerError::MismatchedKinds {
                expected: kind,
                found: scalar.kind(),
            });
        }
        tail.push(scalar);
    }
    Ok(Partition::NonNull { first: head, rest: tail })
}

/// Merge one column with the combining function registered for its kind.
///
/// All-NULL input yields the first NULL unchanged; otherwise NULLs are
/// skipped and the result is a bare scalar.
pub(crate) fn merge_column(
    rows: &[Vec<DataValue>],
    index: usize,
    func: AggregateType,
    registry: Registry,
) -> MergerResult<DataValue> {
    let (first, rest) = column_values(rows, index)?;
    match partition_nulls(first, &rest)? {
        Partition::AllNull(first) => Ok(first.clone()),
        Partition::NonNull { first, rest } => {
            let kind = first.kind();
            let combine = registry(kind).ok_or(MergerError::AggregateFuncNotFound { func, kind })?;
            Ok(DataValue::Scalar(combine(first, &rest)?))
        }
    }
}

/// Native numeric type that partials can be combined as
trait Element: Copy {
    const KIND: ScalarKind;

    fn extract(scalar: &Scalar) -> Option<Self>;
    fn wrap(self) -> Scalar;
    /// `None` on overflow
    fn plus(self, other: Self) -> Option<Self>;
    /// Total order, IEEE `totalOrder` for floats
    fn order(self, other: Self) -> Ordering;
}

macro_rules! integer_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;

                fn extract(scalar: &Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::$variant(v) => Some(*v),
                        _ => None,
                    }
                }

                fn wrap(self) -> Scalar {
                    Scalar::$variant(self)
                }

                fn plus(self, other: Self) -> Option<Self> {
                    self.checked_add(other)
                }

                fn order(self, other: Self) -> Ordering {
                    self.cmp(&other)
                }
            }
        )*
    };
}

macro_rules! float_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;

                fn extract(scalar: &Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::$variant(v) => Some(*v),
                        _ => None,
                    }
                }

                fn wrap(self) -> Scalar {
                    Scalar::$variant(self)
                }

                fn plus(self, other: Self) -> Option<Self> {
                    Some(self + other)
                }

                fn order(self, other: Self) -> Ordering {
                    self.total_cmp(&other)
                }
            }
        )*
    };
}

integer_element! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
}

float_element! {
    f32 => Float32,
    f64 => Float64,
}

fn extract<T: Element>(scalar: &Scalar) -> MergerResult<T> {
    T::extract(scalar).ok_or(MergerError::MismatchedKinds {
        expected: T::KIND,
        found: scalar.kind(),
    })
}

fn add_all<T: Element>(first: &Scalar, rest: &[&Scalar]) -> MergerResult<Scalar> {
    let mut total = extract::<T>(first)?;
    for scalar in rest {
        total = total.plus(extract(scalar)?).ok_or(MergerError::NumericOverflow)?;
    }
    Ok(total.wrap())
}

fn least<T: Element>(first: &Scalar, rest: &[&Scalar]) -> MergerResult<Scalar> {
    pick::<T>(first, rest, Ordering::Less)
}

fn greatest<T: Element>(first: &Scalar, rest: &[&Scalar]) -> MergerResult<Scalar> {
    pick::<T>(first, rest, Ordering::Greater)
}

/// Keep the partial that orders `wanted` against all others under the total
/// order, so the pick never depends on shard order
fn pick<T: Element>(first: &Scalar, rest: &[&Scalar], wanted: Ordering) -> MergerResult<Scalar> {
    let mut best = extract::<T>(first)?;
    for scalar in rest {
        let candidate = extract::<T>(scalar)?;
        if candidate.order(best) == wanted {
            best = candidate;
        }
    }
    Ok(best.wrap())
}

/// Map every numeric kind to `$func::<native type>`; text and booleans have
/// no entry
macro_rules! numeric_registry {
    ($kind:expr, $func:ident) => {
        match $kind {
            ScalarKind::Int8 => Some($func::<i8> as CombineFn),
            ScalarKind::Int16 => Some($func::<i16> as CombineFn),
            ScalarKind::Int32 => Some($func::<i32> as CombineFn),
            ScalarKind::Int64 => Some($func::<i64> as CombineFn),
            ScalarKind::UInt8 => Some($func::<u8> as CombineFn),
            ScalarKind::UInt16 => Some($func::<u16> as CombineFn),
            ScalarKind::UInt32 => Some($func::<u32> as CombineFn),
            ScalarKind::UInt64 => Some($func::<u64> as CombineFn),
            ScalarKind::Float32 => Some($func::<f32> as CombineFn),
            ScalarKind::Float64 => Some($func::<f64> as CombineFn),
            ScalarKind::Text | ScalarKind::Boolean => None,
        }
    };
}

pub(crate) fn sum_func(kind: ScalarKind) -> Option<CombineFn> {
    numeric_registry!(kind, add_all)
}

/// Partial counts are added together: global count is the sum of shard counts
pub(crate) fn count_func(kind: ScalarKind) -> Option<CombineFn> {
    numeric_registry!(kind, add_all)
}

pub(crate) fn min_func(kind: ScalarKind) -> Option<CombineFn> {
    numeric_registry!(kind, least)
}

pub(crate) fn max_func(kind: ScalarKind) -> Option<CombineFn> {
    numeric_registry!(kind, greatest)
}
