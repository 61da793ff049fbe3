use rbridge_api::error::HostError;
use rbridge_api::relational::{Row, RowSet};
use rbridge_api::schema::ColumnDescriptor;
use rbridge_api::sink::RowSetSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StoreState {
    #[default]
    Created,
    Storing,
    Done,
}

/// Materialized row-set handed back to the caller of a tuple- or set-returning call.
#[derive(Debug, Default)]
pub struct TupleStore {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
    state: StoreState,
    bytes: usize,
}

impl TupleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.state == StoreState::Done
    }

    pub fn stored_bytes(&self) -> usize {
        self.bytes
    }

    pub fn into_row_set(self) -> RowSet {
        RowSet {
            columns: self.columns,
            rows: self.rows,
        }
    }
}

impl RowSetSink for TupleStore {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<(), HostError> {
        if self.state != StoreState::Created {
            return Err(HostError::sink("tuplestore already started"));
        }
        self.columns = columns.to_vec();
        self.state = StoreState::Storing;
        Ok(())
    }

    fn append(&mut self, row: Row) -> Result<(), HostError> {
        if self.state != StoreState::Storing {
            return Err(HostError::sink("tuplestore is not accepting rows"));
        }
        if row.width() != self.columns.len() {
            return Err(HostError::sink(format!(
                "row has {} values, tuplestore has {} columns",
                row.width(),
                self.columns.len()
            )));
        }
        self.bytes += row.stored_size();
        self.rows.push(row);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), HostError> {
        if self.state != StoreState::Storing {
            return Err(HostError::sink("tuplestore finished before it was started"));
        }
        self.state = StoreState::Done;
        Ok(())
    }
}
