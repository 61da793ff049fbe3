//! Tabular codec: row-sets to data frames, and frames, matrices and vectors
//! back to rows.

use rbridge_api::relational::{Datum, Row};
use rbridge_api::runtime::{Elements, Frame, RuntimeScalar, RuntimeValue, Vector};
use rbridge_api::schema::ColumnDescriptor;
use rbridge_api::types::TypeInfo;

use crate::array::{array_to_runtime, value_to_array};
use crate::context::{ConversionContext, TypeCache};
use crate::error::ConversionError;
use crate::scalar::{datum_to_scalar, element_text, text_to_datum};
use crate::vector::new_vector;

/// A column's relational type, with its element type when it is array-typed.
struct ResolvedColumn {
    name: String,
    info: TypeInfo,
    elem: Option<TypeInfo>,
}

fn resolve_columns(columns: &[ColumnDescriptor], types: &TypeCache<'_>) -> Result<Vec<ResolvedColumn>, ConversionError> {
    columns
        .iter()
        .map(|c| {
            let info = types.lookup(c.type_oid).map_err(|e| e.with_context(format!("column {}", c.name)))?;
            // `name` carries an element type but is not an array.
            let elem = if info.is_array() {
                let elem_oid = c.elem_type.or(info.elem).unwrap_or_default();
                Some(types.lookup(elem_oid).map_err(|e| e.with_context(format!("column {}", c.name)))?)
            } else {
                None
            };
            Ok(ResolvedColumn { name: c.name.clone(), info, elem })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════
//  Rows → frame
// ═══════════════════════════════════════════════════════════════

/// Row-set argument to a data frame. Zero rows is the runtime null.
pub fn rows_to_frame(
    columns: &[ColumnDescriptor],
    rows: &[Row],
    types: &TypeCache<'_>,
) -> Result<RuntimeValue, ConversionError> {
    if rows.is_empty() {
        return Ok(RuntimeValue::Null);
    }
    let nr = rows.len();
    let resolved = resolve_columns(columns, types)?;

    let mut out = Vec::with_capacity(resolved.len());
    for (j, col) in resolved.iter().enumerate() {
        let cells = rows.iter().enumerate().map(|(i, row)| {
            row.0.get(j).ok_or_else(|| {
                ConversionError::BadInternalRepresentation(format!(
                    "row {} has {} values for {} columns",
                    i + 1,
                    row.width(),
                    resolved.len()
                ))
            })
        });

        let vector = match &col.elem {
            Some(_) => {
                let values = cells
                    .map(|cell| match cell? {
                        None => Ok(RuntimeValue::from(Vector::missing())),
                        Some(Datum::Array(a)) => array_to_runtime(a, types).map(RuntimeValue::from),
                        Some(other) => Err(ConversionError::BadInternalRepresentation(format!(
                            "column {} is array-typed but holds {other:?}",
                            col.name
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Vector::list(values)
            }
            None => {
                let mut v = new_vector(col.info.class, nr);
                for (i, cell) in cells.enumerate() {
                    v.set(i, datum_to_scalar(cell?.as_ref(), &col.info)?)?;
                }
                v
            }
        };
        out.push((col.name.clone(), vector));
    }

    tracing::debug!(nrow = nr, ncol = out.len(), "row-set converted to data frame");
    let row_names = (1..=nr).map(|i| i.to_string()).collect();
    Ok(Frame::new(out).with_row_names(row_names).into())
}

// ═══════════════════════════════════════════════════════════════
//  Frame / matrix / vector → rows
// ═══════════════════════════════════════════════════════════════

pub(crate) fn check_column_count(
    produced: usize,
    columns: &[ColumnDescriptor],
    what: &str,
) -> Result<(), ConversionError> {
    if produced != columns.len() {
        return Err(ConversionError::ShapeMismatch(format!(
            "expected {} columns, {what} has {produced}",
            columns.len()
        )));
    }
    Ok(())
}

fn rows_to_take(nrow: usize, single_row_only: bool) -> usize {
    if single_row_only && nrow > 1 {
        tracing::warn!(ignored = nrow - 1, "single-row result ignores trailing rows");
    }
    if single_row_only { nrow.min(1) } else { nrow }
}

fn is_missing_cell(cell: &RuntimeValue) -> bool {
    match cell {
        RuntimeValue::Null => true,
        RuntimeValue::Vector(v) => v.len() == 1 && v.scalar_at(0) == Some(RuntimeScalar::Missing),
        RuntimeValue::Frame(_) => false,
    }
}

/// One output cell. List cells of array-typed columns go through the array codec.
fn cell_datum(source: &Vector, index: usize, col: &ResolvedColumn) -> Result<Option<Datum>, ConversionError> {
    if let (Some(elem), Elements::List(cells)) = (&col.elem, source.elements()) {
        let cell = cells.get(index).ok_or_else(|| {
            ConversionError::BadInternalRepresentation(format!(
                "index {index} out of bounds for list of length {}",
                cells.len()
            ))
        })?;
        if is_missing_cell(cell) {
            return Ok(None);
        }
        return value_to_array(cell, elem).map(|a| Some(Datum::Array(a)));
    }
    text_to_datum(element_text(source, index)?.as_deref(), &col.info)
}

fn build_rows(
    nrow: usize,
    resolved: &[ResolvedColumn],
    cell: impl Fn(usize, usize, &ResolvedColumn) -> Result<Option<Datum>, ConversionError>,
) -> Result<Vec<Row>, ConversionError> {
    (0..nrow)
        .map(|i| {
            resolved
                .iter()
                .enumerate()
                .map(|(j, col)| cell(i, j, col).map_err(|e| e.with_context(format!("row {}, column {}", i + 1, col.name))))
                .collect::<Result<Vec<_>, _>>()
                .map(Row)
        })
        .collect()
}

/// Data frame result to rows. The leading column's length is the row count.
pub fn frame_to_rows(
    frame: &Frame,
    columns: &[ColumnDescriptor],
    single_row_only: bool,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Row>, ConversionError> {
    check_column_count(frame.ncol(), columns, "data frame")?;
    let nrow = frame.nrow();
    if ctx.settings().check_column_lengths {
        for (j, col) in frame.columns().iter().enumerate().skip(1) {
            if col.len() != nrow {
                return Err(ConversionError::ShapeMismatch(format!(
                    "data frame column {} has {} rows, leading column has {nrow}",
                    j + 1,
                    col.len()
                )));
            }
        }
    }
    let resolved = resolve_columns(columns, ctx.types())?;
    let take = rows_to_take(nrow, single_row_only);
    let rows = build_rows(take, &resolved, |i, j, col| {
        let source = frame.column(j).ok_or_else(|| {
            ConversionError::BadInternalRepresentation(format!("data frame has no column {}", j + 1))
        })?;
        cell_datum(source, i, col)
    })?;
    tracing::debug!(nrow = rows.len(), ncol = columns.len(), "data frame converted to rows");
    Ok(rows)
}

/// Matrix result to rows: row i, column j reads offset `j * nr + i`.
pub fn matrix_to_rows(
    vector: &Vector,
    nr: usize,
    nc: usize,
    columns: &[ColumnDescriptor],
    single_row_only: bool,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Row>, ConversionError> {
    check_column_count(nc, columns, "matrix")?;
    if nr.checked_mul(nc) != Some(vector.len()) {
        return Err(ConversionError::BadInternalRepresentation(format!(
            "matrix of {nr}x{nc} holds {} elements",
            vector.len()
        )));
    }
    let resolved = resolve_columns(columns, ctx.types())?;
    let take = rows_to_take(nr, single_row_only);
    let rows = build_rows(take, &resolved, |i, j, col| cell_datum(vector, j * nr + i, col))?;
    tracing::debug!(nrow = rows.len(), ncol = nc, "matrix converted to rows");
    Ok(rows)
}

/// Plain vector result to rows: one column, one row per element.
pub fn vector_to_rows(
    vector: &Vector,
    columns: &[ColumnDescriptor],
    single_row_only: bool,
    ctx: &ConversionContext<'_>,
) -> Result<Vec<Row>, ConversionError> {
    check_column_count(1, columns, "vector")?;
    let resolved = resolve_columns(columns, ctx.types())?;
    let take = rows_to_take(vector.len(), single_row_only);
    let rows = build_rows(take, &resolved, |i, _, col| cell_datum(vector, i, col))?;
    tracing::debug!(nrow = rows.len(), kind = %vector.kind(), "vector converted to rows");
    Ok(rows)
}
