// Merged Cursor
//
// The forward-only cursor both mergers hand back to callers. All cursor
// state lives behind one read/write lock: Next, Scan and Close take the
// write side, Columns, ColumnTypes and Err take the read side.

use log::{trace, warn};
use parking_lot::RwLock;

use crate::common::types::DataValue;
use crate::merger::column::ColumnType;
use crate::merger::convert::ScanTarget;
use crate::merger::error::{MergerError, MergerResult};
use crate::merger::source::BoxedRowSource;

/// Forward-only result cursor over merged rows
pub trait Cursor: Send + Sync {
    /// Advance to the next merged row. Returns false on exhaustion or error;
    /// either way the cursor closes itself and its shard sources.
    fn next(&self) -> bool;

    /// Copy the current row into `dest` by position
    fn scan(&self, dest: &mut [&mut dyn ScanTarget]) -> MergerResult<()>;

    /// Clone of the current row, under the same rules as `scan`
    fn row(&self) -> MergerResult<Vec<DataValue>>;

    /// Externally visible column names
    fn columns(&self) -> MergerResult<Vec<String>>;

    /// Column metadata with the synthetic AVG columns hidden
    fn column_types(&self) -> MergerResult<Vec<ColumnType>>;

    /// Close every shard source, combining all close failures
    fn close(&self) -> MergerResult<()>;

    /// Error recorded by `next`, if any
    fn err(&self) -> Option<MergerError>;

    /// Merged results are always a single result set
    fn next_result_set(&self) -> bool {
        false
    }
}

/// Strategy that turns the owned shard sources into merged rows
pub trait RowProducer: Send + Sync {
    /// Produce the next merged row, `None` once exhausted
    fn produce(&mut self, sources: &mut [BoxedRowSource]) -> MergerResult<Option<Vec<DataValue>>>;

    fn column_types(&self, sources: &[BoxedRowSource]) -> MergerResult<Vec<ColumnType>>;
}

struct CursorState<P> {
    sources: Vec<BoxedRowSource>,
    /// Per-source flag, set once that source closed successfully
    source_closed: Vec<bool>,
    producer: P,
    closed: bool,
    last_err: Option<MergerError>,
    current: Option<Vec<DataValue>>,
}

impl<P> CursorState<P> {
    /// Mark the cursor closed and close every source not yet closed
    fn shutdown(&mut self) -> MergerResult<()> {
        self.closed = true;
        self.current = None;
        let mut errors = Vec::new();
        for (source, done) in self.sources.iter_mut().zip(self.source_closed.iter_mut()) {
            if *done {
                continue;
            }
            match source.close() {
                Ok(()) => *done = true,
                Err(err) => {
                    warn!("Failed to close row source: {}", err);
                    errors.push(err);
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MergerError::CloseFailed(errors))
        }
    }

    fn current_row(&self) -> MergerResult<&Vec<DataValue>> {
        if let Some(err) = &self.last_err {
            return Err(err.clone());
        }
        if self.closed {
            return Err(MergerError::RowsClosed);
        }
        self.current.as_ref().ok_or(MergerError::ScanNotNext)
    }
}

/// Cursor over rows produced by a merger
pub struct MergedCursor<P> {
    columns: Vec<String>,
    state: RwLock<CursorState<P>>,
}

impl<P: RowProducer> MergedCursor<P> {
    pub fn new(sources: Vec<BoxedRowSource>, columns: Vec<String>, producer: P) -> Self {
        let source_closed = vec![false; sources.len()];
        MergedCursor {
            columns,
            state: RwLock::new(CursorState {
                sources,
                source_closed,
                producer,
                closed: false,
                last_err: None,
                current: None,
            }),
        }
    }
}

impl<P: RowProducer> Cursor for MergedCursor<P> {
    fn next(&self) -> bool {
        let mut state = self.state.write();
        if state.closed || state.last_err.is_some() {
            return false;
        }

        let CursorState { producer, sources, .. } = &mut *state;
        match producer.produce(sources) {
            Ok(Some(row)) => {
                trace!("Merged row with {} values", row.len());
                state.current = Some(row);
                true
            }
            Ok(None) => {
                // Close errors on exhaustion stay available to an explicit close.
                let _ = state.shutdown();
                false
            }
            Err(err) => {
                state.last_err = Some(err);
                let _ = state.shutdown();
                false
            }
        }
    }

    fn scan(&self, dest: &mut [&mut dyn ScanTarget]) -> MergerResult<()> {
        let state = self.state.write();
        let row = state.current_row()?;
        if dest.len() > row.len() {
            return Err(MergerError::ScanArity {
                expected: row.len(),
                got: dest.len(),
            });
        }
        for (target, value) in dest.iter_mut().zip(row) {
            target.assign(value)?;
        }
        Ok(())
    }

    fn row(&self) -> MergerResult<Vec<DataValue>> {
        let state = self.state.write();
        state.current_row().cloned()
    }

    fn columns(&self) -> MergerResult<Vec<String>> {
        let state = self.state.read();
        if state.closed {
            return Err(MergerError::RowsClosed);
        }
        Ok(self.columns.clone())
    }

    fn column_types(&self) -> MergerResult<Vec<ColumnType>> {
        let state = self.state.read();
        if state.closed {
            return Err(MergerError::RowsClosed);
        }
        state.producer.column_types(&state.sources)
    }

    fn close(&self) -> MergerResult<()> {
        self.state.write().shutdown()
    }

    fn err(&self) -> Option<MergerError> {
        self.state.read().last_err.clone()
    }
}
