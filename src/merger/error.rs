use thiserror::Error;

use crate::common::types::ScalarKind;
use crate::merger::aggregator::AggregateType;
use crate::merger::source::{ScanError, SourceError};

/// Errors raised while merging shard result sets or reading the merged cursor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergerError {
    #[error("merger: no row sources were supplied")]
    EmptyRows,

    #[error("merger: a supplied row source is null")]
    RowsIsNull,

    #[error("merger: rows are already closed")]
    RowsClosed,

    #[error("merger: Scan called before a successful Next")]
    ScanNotNext,

    #[error("merger: aggregate column index {index} is out of range for rows of width {width}")]
    InvalidAggregateColumnIndex { index: usize, width: usize },

    #[error("merger: group column index {index} is out of range for rows of width {width}")]
    InvalidGroupColumnIndex { index: usize, width: usize },

    #[error("merger: no {func} function registered for {kind} values")]
    AggregateFuncNotFound { func: AggregateType, kind: ScalarKind },

    #[error("merger: aggregate query returned no rows from a shard")]
    AggregateHasEmptyRows,

    #[error("merger: query context was cancelled")]
    Cancelled,

    #[error("merger: {0}")]
    Source(#[from] SourceError),

    #[error("merger: scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("merger: expected {expected} values but found {found}")]
    MismatchedKinds { expected: ScalarKind, found: ScalarKind },

    #[error("merger: group column {column} is NULL")]
    NullGroupKey { column: String },

    #[error("merger: numeric overflow")]
    NumericOverflow,

    #[error("merger: expected at most {expected} destination arguments in Scan, got {got}")]
    ScanArity { expected: usize, got: usize },

    #[error("merger: {0}")]
    Conversion(String),

    #[error("merger: failed to close {} row source(s): {}", .0.len(), join_errors(.0))]
    CloseFailed(Vec<SourceError>),
}

fn join_errors(errors: &[SourceError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Result type for merger operations
pub type MergerResult<T> = Result<T, MergerError>;
