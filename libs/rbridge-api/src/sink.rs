use crate::error::HostError;
use crate::relational::Row;
use crate::schema::ColumnDescriptor;

/// Destination for a materialized row-set.
///
/// Call order: `begin` once, `append` per row, `finish` once. Rows are
/// complete when appended; the sink never sees a partial row.
pub trait RowSetSink {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<(), HostError>;
    fn append(&mut self, row: Row) -> Result<(), HostError>;
    fn finish(&mut self) -> Result<(), HostError>;
}
