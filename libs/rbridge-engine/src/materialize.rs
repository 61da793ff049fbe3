//! Result materializer.
//!
//! A runtime result is classified once into a [`ResultShape`] and then takes
//! exactly one of three paths: a scalar datum, an array datum, or a
//! materialized row-set. The row-set path is only open to calls that return
//! a tuple or a set, and only when the caller accepts a materialized result.

use serde::{Deserialize, Serialize};

use rbridge_api::relational::RelationalValue;
use rbridge_api::runtime::{Frame, RuntimeValue, Vector};
use rbridge_api::schema::ColumnDescriptor;
use rbridge_api::sink::RowSetSink;

use crate::array::runtime_to_array;
use crate::context::ConversionContext;
use crate::error::ConversionError;
use crate::region::RegionScope;
use crate::scalar::scalar_result;
use crate::tabular::{check_column_count, frame_to_rows, matrix_to_rows, vector_to_rows};
use crate::tuplestore::TupleStore;

/// What the caller expects from a tuple- or set-returning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSetInfo {
    pub expected: Vec<ColumnDescriptor>,
    #[serde(default = "default_materialize_allowed")]
    pub materialize_allowed: bool,
}

fn default_materialize_allowed() -> bool {
    true
}

impl ResultSetInfo {
    pub fn new(expected: Vec<ColumnDescriptor>) -> Self {
        Self {
            expected,
            materialize_allowed: true,
        }
    }
}

/// Outcome of converting one call result.
#[derive(Debug)]
pub enum CallOutput {
    Null,
    Value(RelationalValue),
    RowSet(TupleStore),
}

/// Runtime result, classified.
#[derive(Debug, Clone, Copy)]
pub enum ResultShape<'v> {
    /// Runtime null, or a value of length zero.
    Empty,
    Frame(&'v Frame),
    Matrix { vector: &'v Vector, nrow: usize, ncol: usize },
    /// Vector with three or more extents.
    Dimensioned { vector: &'v Vector, dims: &'v [usize] },
    Generic(&'v Vector),
}

impl<'v> ResultShape<'v> {
    pub fn classify(value: &'v RuntimeValue) -> Self {
        if value.is_empty() {
            return ResultShape::Empty;
        }
        match value {
            RuntimeValue::Null => ResultShape::Empty,
            RuntimeValue::Frame(frame) => ResultShape::Frame(frame),
            RuntimeValue::Vector(vector) => match vector.dim() {
                Some(&[nrow, ncol]) => ResultShape::Matrix { vector, nrow, ncol },
                Some(dims) if dims.len() > 2 => ResultShape::Dimensioned { vector, dims },
                _ => ResultShape::Generic(vector),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResultShape::Empty => "empty",
            ResultShape::Frame(_) => "frame",
            ResultShape::Matrix { .. } => "matrix",
            ResultShape::Dimensioned { .. } => "dimensioned",
            ResultShape::Generic(_) => "generic",
        }
    }
}

/// Convert a call's runtime result. The value is consumed.
pub fn materialize(
    value: RuntimeValue,
    ctx: &ConversionContext<'_>,
    rsinfo: Option<&ResultSetInfo>,
) -> Result<CallOutput, ConversionError> {
    let shape = ResultShape::classify(&value);
    let call = ctx.call_shape();
    tracing::debug!(
        shape = shape.name(),
        returns_set = call.returns_set,
        returns_tuple = call.returns_tuple,
        "materializing result"
    );

    if call.produces_rows() {
        return materialize_rows(shape, ctx, rsinfo).map(CallOutput::RowSet);
    }

    let binding = ctx.result_binding()?;
    if matches!(shape, ResultShape::Empty) {
        return Ok(CallOutput::Null);
    }
    if binding.element.is_none() {
        return Ok(match scalar_result(&value, &binding.result)? {
            None => CallOutput::Null,
            Some(datum) => {
                ctx.regions().charge(datum.stored_size());
                CallOutput::Value(RelationalValue::Scalar {
                    type_oid: binding.result.oid,
                    value: Some(datum),
                })
            }
        });
    }

    let array = runtime_to_array(&value, ctx)?;
    Ok(CallOutput::Value(RelationalValue::Array {
        type_oid: binding.result.oid,
        value: array,
    }))
}

/// Build every row of the result into a tuplestore allocated in the per-query region.
pub fn materialize_rows(
    shape: ResultShape<'_>,
    ctx: &ConversionContext<'_>,
    rsinfo: Option<&ResultSetInfo>,
) -> Result<TupleStore, ConversionError> {
    let call = ctx.call_shape();
    if !call.produces_rows() {
        return Err(ConversionError::MaterializationNotPermitted(
            "call returns neither a set nor a tuple".into(),
        ));
    }
    let info = rsinfo.ok_or_else(|| {
        ConversionError::MaterializationNotPermitted("caller provided no result-set description".into())
    })?;
    if !info.materialize_allowed {
        return Err(ConversionError::MaterializationNotPermitted(
            "caller does not accept a materialized row-set".into(),
        ));
    }

    let single_row_only = !call.returns_set;
    let regions = ctx.regions();
    let _query = regions.switch_to(RegionScope::Query);

    let mut store = TupleStore::new();
    store.begin(&info.expected)?;
    let rows = match shape {
        ResultShape::Empty => {
            check_column_count(1, &info.expected, "empty result")?;
            Vec::new()
        }
        ResultShape::Frame(frame) => frame_to_rows(frame, &info.expected, single_row_only, ctx)?,
        ResultShape::Matrix { vector, nrow, ncol } => {
            matrix_to_rows(vector, nrow, ncol, &info.expected, single_row_only, ctx)?
        }
        ResultShape::Dimensioned { vector, .. } | ResultShape::Generic(vector) => {
            vector_to_rows(vector, &info.expected, single_row_only, ctx)?
        }
    };
    for row in rows {
        regions.charge(row.stored_size());
        store.append(row)?;
    }
    store.finish()?;

    tracing::debug!(
        rows = store.len(),
        columns = store.columns().len(),
        bytes = store.stored_bytes(),
        "row-set materialized"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use crate::context::CallShape;
    use crate::region::CallRegions;
    use rbridge_api::oid::*;
    use rbridge_api::relational::{ArrayValue, Datum, Row};

    #[test]
    fn classification() {
        let null = RuntimeValue::Null;
        assert!(matches!(ResultShape::classify(&null), ResultShape::Empty));
        let empty = RuntimeValue::from(Vector::integer(vec![]));
        assert!(matches!(ResultShape::classify(&empty), ResultShape::Empty));
        let m = RuntimeValue::from(Vector::integer(vec![Some(1); 6]).with_dim(vec![2, 3]));
        assert!(matches!(ResultShape::classify(&m), ResultShape::Matrix { nrow: 2, ncol: 3, .. }));
        let cube = RuntimeValue::from(Vector::integer(vec![Some(1); 8]).with_dim(vec![2, 2, 2]));
        assert!(matches!(ResultShape::classify(&cube), ResultShape::Dimensioned { .. }));
        let plain = RuntimeValue::from(Vector::integer(vec![Some(1)]).with_dim(vec![1]));
        assert!(matches!(ResultShape::classify(&plain), ResultShape::Generic(_)));
    }

    #[test]
    fn scalar_result_path() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).bind_result(INT8OID).unwrap();
        let out = materialize(Vector::real(vec![Some(42.0), Some(7.0)]).into(), &ctx, None).unwrap();
        assert!(matches!(
            out,
            CallOutput::Value(RelationalValue::Scalar { type_oid: INT8OID, value: Some(Datum::Int8(42)) })
        ));

        let out = materialize(Vector::real(vec![None]).into(), &ctx, None).unwrap();
        assert!(matches!(out, CallOutput::Null));
        let out = materialize(RuntimeValue::Null, &ctx, None).unwrap();
        assert!(matches!(out, CallOutput::Null));
    }

    #[test]
    fn array_result_path() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).bind_result(TEXTARRAYOID).unwrap();
        let m = Vector::character(["a", "c", "b", "d"].map(|s| Some(s.to_string())).to_vec()).with_dim(vec![2, 2]);
        let CallOutput::Value(RelationalValue::Array { type_oid, value }) = materialize(m.into(), &ctx, None).unwrap()
        else {
            panic!("expected an array value");
        };
        assert_eq!(type_oid, TEXTARRAYOID);
        let expected = ArrayValue::new(
            TEXTOID,
            vec![2, 2],
            ["a", "b", "c", "d"].map(|s| Datum::Text(s.into())).to_vec(),
        )
        .unwrap();
        assert_eq!(value, expected);

        assert!(matches!(materialize(RuntimeValue::Null, &ctx, None).unwrap(), CallOutput::Null));
    }

    #[test]
    fn rows_require_tuple_or_set_call() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions);
        let rsinfo = ResultSetInfo::new(vec![ColumnDescriptor::scalar("x", INT4OID)]);
        let value = RuntimeValue::from(Vector::integer(vec![Some(1)]));
        let err = materialize_rows(ResultShape::classify(&value), &ctx, Some(&rsinfo)).unwrap_err();
        assert!(matches!(err, ConversionError::MaterializationNotPermitted(_)));
    }

    #[test]
    fn rows_require_caller_permission() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).with_call_shape(CallShape::set_of_scalars());
        let value = RuntimeValue::from(Vector::integer(vec![Some(1)]));

        let err = materialize(value.clone(), &ctx, None).unwrap_err();
        assert!(matches!(err, ConversionError::MaterializationNotPermitted(_)));

        let mut rsinfo = ResultSetInfo::new(vec![ColumnDescriptor::scalar("x", INT4OID)]);
        rsinfo.materialize_allowed = false;
        let err = materialize(value, &ctx, Some(&rsinfo)).unwrap_err();
        assert!(matches!(err, ConversionError::MaterializationNotPermitted(_)));
        assert_eq!(regions.current(), RegionScope::Call);
    }

    #[test]
    fn set_of_scalars_materializes_every_element() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).with_call_shape(CallShape::set_of_scalars());
        let rsinfo = ResultSetInfo::new(vec![ColumnDescriptor::scalar("x", INT4OID)]);
        let CallOutput::RowSet(store) =
            materialize(Vector::integer(vec![Some(3), None, Some(5)]).into(), &ctx, Some(&rsinfo)).unwrap()
        else {
            panic!("expected a row-set");
        };
        assert!(store.is_finished());
        assert_eq!(
            store.rows(),
            &[
                Row(vec![Some(Datum::Int4(3))]),
                Row(vec![None]),
                Row(vec![Some(Datum::Int4(5))]),
            ]
        );
        assert_eq!(regions.current(), RegionScope::Call);
        assert_eq!(regions.region(RegionScope::Query).bytes(), 8);
    }

    #[test]
    fn tuple_call_takes_first_row_only() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).with_call_shape(CallShape::tuple());
        let rsinfo = ResultSetInfo::new(vec![
            ColumnDescriptor::scalar("a", INT4OID),
            ColumnDescriptor::scalar("b", TEXTOID),
        ]);
        let frame = Frame::new(vec![
            ("a".into(), Vector::integer(vec![Some(1), Some(2)])),
            ("b".into(), Vector::character(vec![Some("x".into()), Some("y".into())])),
        ]);
        let CallOutput::RowSet(store) = materialize(frame.into(), &ctx, Some(&rsinfo)).unwrap() else {
            panic!("expected a row-set");
        };
        assert_eq!(store.len(), 1);
        assert_eq!(store.columns(), rsinfo.expected.as_slice());
    }

    #[test]
    fn empty_result_is_empty_finished_row_set() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).with_call_shape(CallShape::set_of_tuples());
        let rsinfo = ResultSetInfo::new(vec![ColumnDescriptor::scalar("a", INT4OID)]);
        let CallOutput::RowSet(store) = materialize(RuntimeValue::Null, &ctx, Some(&rsinfo)).unwrap() else {
            panic!("expected a row-set");
        };
        assert!(store.is_empty());
        assert!(store.is_finished());
    }

    #[test]
    fn empty_result_still_checks_column_count() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).with_call_shape(CallShape::set_of_tuples());
        let rsinfo = ResultSetInfo::new(vec![
            ColumnDescriptor::scalar("a", INT4OID),
            ColumnDescriptor::scalar("b", TEXTOID),
        ]);
        let err = materialize(RuntimeValue::Null, &ctx, Some(&rsinfo)).unwrap_err();
        assert!(matches!(err, ConversionError::ShapeMismatch(_)), "{err}");
        assert_eq!(regions.current(), RegionScope::Call);
    }

    #[test]
    fn failed_materialization_restores_region() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).with_call_shape(CallShape::set_of_tuples());
        let rsinfo = ResultSetInfo::new(vec![ColumnDescriptor::scalar("a", INT2OID)]);
        let value = Vector::integer(vec![Some(1), Some(1_000_000)]);
        let err = materialize(value.into(), &ctx, Some(&rsinfo)).unwrap_err();
        assert!(matches!(err, ConversionError::MalformedElement(_)));
        assert_eq!(regions.current(), RegionScope::Call);
    }
}
