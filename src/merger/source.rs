// Shard Row Sources
//
// This module defines the interface the mergers consume for each shard's raw
// result set, the row-scanning helper that pulls whole rows out of a source,
// and an in-memory source implementation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::common::types::DataValue;
use crate::merger::column::ColumnType;

/// Failure reported by a shard row source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{shard}: {message}")]
pub struct SourceError {
    shard: String,
    message: String,
}

impl SourceError {
    pub fn new(shard: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError {
            shard: shard.into(),
            message: message.into(),
        }
    }

    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors from the row scanner. Exhaustion is reported separately from
/// malformed data and source failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("no more rows")]
    NoMoreRows,

    #[error("row has {actual} values but the source reports {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// One shard's raw result set.
///
/// Implementations deliver rows sequentially; `next_row` returns `Ok(None)`
/// once the source is exhausted.
pub trait RowSource: Send + Sync {
    /// Column metadata for the rows this source produces
    fn column_types(&self) -> Result<Vec<ColumnType>, SourceError>;

    /// Column names, in row order
    fn columns(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.column_types()?.into_iter().map(|c| c.name).collect())
    }

    /// Fetch the next row's scalar values
    fn next_row(&mut self) -> Result<Option<Vec<DataValue>>, SourceError>;

    /// Release the source
    fn close(&mut self) -> Result<(), SourceError>;
}

/// Owned, type-erased row source
pub type BoxedRowSource = Box<dyn RowSource>;

/// Pulls complete rows out of a row source and checks their width
pub struct RowScanner<'a> {
    source: &'a mut dyn RowSource,
    width: usize,
}

impl<'a> RowScanner<'a> {
    pub fn new(source: &'a mut dyn RowSource) -> Result<Self, ScanError> {
        let width = source.columns()?.len();
        Ok(RowScanner { source, width })
    }

    /// Scan the next row, or `ScanError::NoMoreRows` when exhausted
    pub fn scan(&mut self) -> Result<Vec<DataValue>, ScanError> {
        match self.source.next_row()? {
            Some(row) => self.check_width(row),
            None => Err(ScanError::NoMoreRows),
        }
    }

    /// Scan every remaining row
    pub fn scan_all(&mut self) -> Result<Vec<Vec<DataValue>>, ScanError> {
        let mut rows = Vec::new();
        while let Some(row) = self.source.next_row()? {
            rows.push(self.check_width(row)?);
        }
        Ok(rows)
    }

    fn check_width(&self, row: Vec<DataValue>) -> Result<Vec<DataValue>, ScanError> {
        if row.len() != self.width {
            return Err(ScanError::ColumnCountMismatch {
                expected: self.width,
                actual: row.len(),
            });
        }
        Ok(row)
    }
}

/// Row source over rows already held in memory
#[derive(Debug)]
pub struct MemoryRowSource {
    name: String,
    column_types: Vec<ColumnType>,
    rows: VecDeque<Vec<DataValue>>,
    rows_read: usize,
    row_error: Option<(usize, String)>,
    close_error: Option<String>,
    closed: Arc<AtomicBool>,
}

impl MemoryRowSource {
    pub fn new(name: impl Into<String>, column_types: Vec<ColumnType>, rows: Vec<Vec<DataValue>>) -> Self {
        MemoryRowSource {
            name: name.into(),
            column_types,
            rows: rows.into(),
            rows_read: 0,
            row_error: None,
            close_error: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail when the row at `position` (0-based) is requested
    pub fn with_row_error(mut self, position: usize, message: impl Into<String>) -> Self {
        self.row_error = Some((position, message.into()));
        self
    }

    /// Fail every close attempt with the given message
    pub fn with_close_error(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    /// Flag set once `close` has been called, observable after the source is
    /// handed to a merger
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn error(&self, message: impl Into<String>) -> SourceError {
        SourceError::new(self.name.clone(), message)
    }
}

impl RowSource for MemoryRowSource {
    fn column_types(&self) -> Result<Vec<ColumnType>, SourceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.error("source is closed"));
        }
        Ok(self.column_types.clone())
    }

    fn next_row(&mut self) -> Result<Option<Vec<DataValue>>, SourceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.error("source is closed"));
        }
        if let Some((position, message)) = &self.row_error {
            if *position == self.rows_read {
                return Err(self.error(message.clone()));
            }
        }
        let row = self.rows.pop_front();
        if row.is_some() {
            self.rows_read += 1;
        }
        Ok(row)
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::SeqCst);
        match &self.close_error {
            Some(message) => Err(self.error(message.clone())),
            None => Ok(()),
        }
    }
}
