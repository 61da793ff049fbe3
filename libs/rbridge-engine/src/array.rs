//! Array codec: relational N-d arrays to runtime vectors and back.
//!
//! Relational arrays store elements with the last subscript varying fastest.
//! Runtime matrices and 3-arrays are column-major. [`Grid`] is the single
//! place that maps between the two layouts.

use rbridge_api::relational::{ArrayValue, Datum};
use rbridge_api::runtime::{Frame, RuntimeValue, Vector};
use rbridge_api::types::{TypeInfo, TypeLayout};

use crate::context::{ConversionContext, TypeCache};
use crate::error::ConversionError;
use crate::scalar::{datum_to_scalar, element_text, input_datum};
use crate::vector::new_vector;

pub const MAX_DIMENSIONS: usize = 3;

/// Extents of an array of at most three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    nr: usize,
    nc: usize,
    nz: usize,
}

impl Grid {
    /// Fails when there are more than three extents or their product overflows.
    pub fn new(dims: &[usize], context: &'static str) -> Result<Self, ConversionError> {
        let grid = match *dims {
            [nr] => Self { nr, nc: 1, nz: 1 },
            [nr, nc] => Self { nr, nc, nz: 1 },
            [nr, nc, nz] => Self { nr, nc, nz },
            _ => return Err(ConversionError::UnsupportedDimensionality { context, ndims: dims.len() }),
        };
        grid.nr
            .checked_mul(grid.nc)
            .and_then(|n| n.checked_mul(grid.nz))
            .ok_or_else(|| {
                ConversionError::BadInternalRepresentation(format!("{context}: extents {dims:?} are too large"))
            })?;
        Ok(grid)
    }

    pub fn count(&self) -> usize {
        self.nr * self.nc * self.nz
    }

    /// Column-major offset of subscript (i, j, k).
    pub fn runtime_offset(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.nr * self.nc + j * self.nr + i
    }

    /// Runtime offsets, yielded in relational storage order.
    pub fn storage_order(self) -> impl Iterator<Item = usize> {
        (0..self.nr).flat_map(move |i| {
            (0..self.nc).flat_map(move |j| (0..self.nz).map(move |k| self.runtime_offset(i, j, k)))
        })
    }
}

/// Relational array argument to a runtime vector.
///
/// One-dimensional arrays become plain vectors; 2- and 3-dimensional arrays
/// carry their extents as the dimension attribute. An empty array becomes a
/// single missing element.
pub fn array_to_runtime(array: &ArrayValue, types: &TypeCache<'_>) -> Result<Vector, ConversionError> {
    if array.is_empty() {
        tracing::trace!(elem = array.elem_type(), "empty array argument");
        return Ok(Vector::missing());
    }
    let grid = Grid::new(array.dims(), "array argument")?;
    let elem = types.lookup(array.elem_type())?;

    let mut out = new_vector(elem.class, grid.count());
    for (datum, offset) in array.elements().iter().zip(grid.storage_order()) {
        out.set(offset, datum_to_scalar(Some(datum), &elem)?)?;
    }
    tracing::debug!(
        elem = %elem.name,
        ndims = array.ndim(),
        nitems = array.len(),
        "array argument converted"
    );

    if array.ndim() > 1 {
        out = out.with_dim(array.dims().to_vec());
    }
    Ok(out)
}

/// Runtime value to a relational array of the context's bound result type.
pub fn runtime_to_array(value: &RuntimeValue, ctx: &ConversionContext<'_>) -> Result<ArrayValue, ConversionError> {
    let binding = ctx.result_binding()?;
    let elem = binding.element.as_ref().ok_or_else(|| {
        ConversionError::Config(format!("result type {} is not an array type", binding.result.name))
    })?;
    let array = value_to_array(value, elem)?;
    ctx.regions().charge(payload_size(array.elements(), elem.layout));
    Ok(array)
}

/// Dispatch on the runtime shape. A null value is the empty array.
pub(crate) fn value_to_array(value: &RuntimeValue, elem: &TypeInfo) -> Result<ArrayValue, ConversionError> {
    match value {
        RuntimeValue::Null => Ok(ArrayValue::empty(elem.oid)),
        RuntimeValue::Frame(frame) => frame_to_array(frame, elem),
        RuntimeValue::Vector(v) => match v.dim() {
            Some(dims) if dims.len() > 1 => dimensioned_to_array(v, dims, elem),
            _ => vector_to_array(v, elem),
        },
    }
}

/// Frame column j, row i lands at array offset `i * ncol + j`; extents (nrow, ncol).
pub fn frame_to_array(frame: &Frame, elem: &TypeInfo) -> Result<ArrayValue, ConversionError> {
    let (nr, nc) = (frame.nrow(), frame.ncol());
    for (j, col) in frame.columns().iter().enumerate() {
        if col.len() != nr {
            return Err(ConversionError::BadInternalRepresentation(format!(
                "data frame column {} has {} rows, expected {nr}",
                j + 1,
                col.len()
            )));
        }
    }
    if nr == 0 || nc == 0 {
        return Ok(ArrayValue::empty(elem.oid));
    }

    let mut elements = Vec::with_capacity(nr * nc);
    for i in 0..nr {
        for (j, col) in frame.columns().iter().enumerate() {
            elements.push(element_datum(col, i, i * nc + j, elem)?);
        }
    }
    tracing::debug!(elem = %elem.name, nrow = nr, ncol = nc, "data frame converted to array");
    build(elem, vec![nr, nc], elements)
}

/// Matrix or 3-array to an array with the same extents.
pub fn dimensioned_to_array(vector: &Vector, dims: &[usize], elem: &TypeInfo) -> Result<ArrayValue, ConversionError> {
    let grid = Grid::new(dims, "array result")?;
    if vector.len() != grid.count() {
        return Err(ConversionError::BadInternalRepresentation(format!(
            "dimension attribute {dims:?} implies {} elements, vector has {}",
            grid.count(),
            vector.len()
        )));
    }
    if grid.count() == 0 {
        return Ok(ArrayValue::empty(elem.oid));
    }

    let elements = grid
        .storage_order()
        .enumerate()
        .map(|(position, offset)| element_datum(vector, offset, position, elem))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(elem = %elem.name, ?dims, "dimensioned vector converted to array");
    build(elem, dims.to_vec(), elements)
}

/// Plain vector to a one-dimensional array.
pub fn vector_to_array(vector: &Vector, elem: &TypeInfo) -> Result<ArrayValue, ConversionError> {
    let elements = (0..vector.len())
        .map(|i| element_datum(vector, i, i, elem))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(elem = %elem.name, nitems = elements.len(), "vector converted to array");
    Ok(ArrayValue::from_elements(elem.oid, elements))
}

fn element_datum(vector: &Vector, offset: usize, position: usize, elem: &TypeInfo) -> Result<Datum, ConversionError> {
    let text = element_text(vector, offset)?
        .ok_or(ConversionError::MissingElementInArrayResult { index: position })?;
    input_datum(&text, elem)
}

fn build(elem: &TypeInfo, dims: Vec<usize>, elements: Vec<Datum>) -> Result<ArrayValue, ConversionError> {
    ArrayValue::new(elem.oid, dims, elements).map_err(|e| ConversionError::BadInternalRepresentation(e.to_string()))
}

/// Bytes the element payload occupies once laid out with `layout`.
pub fn payload_size(elements: &[Datum], layout: TypeLayout) -> usize {
    elements.iter().fold(0, |offset, datum| {
        let width = if layout.is_varlena() {
            datum.stored_size()
        } else {
            layout.len as usize
        };
        layout.align.align(offset) + width
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use crate::region::CallRegions;
    use rbridge_api::oid::*;
    use rbridge_api::runtime::RuntimeScalar;
    use rbridge_api::types::{TypeAlign, TypeCatalog};

    fn int4s(values: &[i32]) -> Vec<Datum> {
        values.iter().copied().map(Datum::Int4).collect()
    }

    #[test]
    fn grid_offsets() {
        let grid = Grid::new(&[2, 3, 4], "test").unwrap();
        assert_eq!(grid.count(), 24);
        assert_eq!(grid.runtime_offset(1, 2, 3), 3 * 6 + 2 * 2 + 1);
        let order: Vec<_> = Grid::new(&[2, 2], "test").unwrap().storage_order().collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn grid_rejects_four_dimensions() {
        assert!(matches!(
            Grid::new(&[1, 1, 1, 1], "array argument"),
            Err(ConversionError::UnsupportedDimensionality { ndims: 4, .. })
        ));
    }

    #[test]
    fn grid_rejects_overflowing_extents() {
        let huge = 1usize << 32;
        assert!(matches!(
            Grid::new(&[huge, huge + 1], "array result"),
            Err(ConversionError::BadInternalRepresentation(_))
        ));
        assert!(Grid::new(&[huge, 2, 0], "array result").is_ok());
    }

    #[test]
    fn one_dimensional_argument_is_plain_vector() {
        let catalog = BuiltinCatalog::new();
        let types = TypeCache::new(&catalog);
        let array = ArrayValue::from_elements(INT4OID, int4s(&[1, 2, 3]));
        let v = array_to_runtime(&array, &types).unwrap();
        assert_eq!(v, Vector::integer(vec![Some(1), Some(2), Some(3)]));
        assert_eq!(v.dim(), None);
    }

    #[test]
    fn matrix_argument_is_column_major() {
        let catalog = BuiltinCatalog::new();
        let types = TypeCache::new(&catalog);
        let array = ArrayValue::new(INT4OID, vec![2, 3], int4s(&[1, 2, 3, 4, 5, 6])).unwrap();
        let v = array_to_runtime(&array, &types).unwrap();
        assert_eq!(v.dim(), Some(&[2, 3][..]));
        assert_eq!(
            v,
            Vector::integer([1, 4, 2, 5, 3, 6].map(Some).to_vec()).with_dim(vec![2, 3])
        );
    }

    #[test]
    fn empty_argument_is_single_missing() {
        let catalog = BuiltinCatalog::new();
        let types = TypeCache::new(&catalog);
        let v = array_to_runtime(&ArrayValue::empty(TEXTOID), &types).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v.scalar_at(0), Some(RuntimeScalar::Missing));
    }

    #[test]
    fn four_dimensional_argument_is_rejected() {
        let catalog = BuiltinCatalog::new();
        let types = TypeCache::new(&catalog);
        let array = ArrayValue::new(INT4OID, vec![1, 1, 1, 2], int4s(&[1, 2])).unwrap();
        assert!(matches!(
            array_to_runtime(&array, &types),
            Err(ConversionError::UnsupportedDimensionality { context: "array argument", ndims: 4 })
        ));
    }

    #[test]
    fn frame_result_is_row_major() {
        let elem = BuiltinCatalog::new().lookup(INT4OID).unwrap();
        let frame = Frame::new(vec![
            ("a".into(), Vector::integer(vec![Some(1), Some(3)])),
            ("b".into(), Vector::real(vec![Some(2.0), Some(4.0)])),
        ]);
        let array = frame_to_array(&frame, &elem).unwrap();
        assert_eq!(array.dims(), &[2, 2]);
        assert_eq!(array.elements(), int4s(&[1, 2, 3, 4]).as_slice());
    }

    #[test]
    fn frame_factor_columns_use_labels() {
        let elem = BuiltinCatalog::new().lookup(TEXTOID).unwrap();
        let frame = Frame::new(vec![(
            "f".into(),
            Vector::factor(vec![Some(2), Some(1)], vec!["x".into(), "y".into()]),
        )]);
        let array = frame_to_array(&frame, &elem).unwrap();
        assert_eq!(array.elements(), &[Datum::Text("y".into()), Datum::Text("x".into())]);
    }

    #[test]
    fn missing_element_fails_array_result() {
        let elem = BuiltinCatalog::new().lookup(INT4OID).unwrap();
        let v = Vector::integer(vec![Some(1), None, Some(3)]);
        assert!(matches!(
            vector_to_array(&v, &elem),
            Err(ConversionError::MissingElementInArrayResult { index: 1 })
        ));

        let frame = Frame::new(vec![
            ("a".into(), Vector::integer(vec![Some(1), Some(2)])),
            ("b".into(), Vector::integer(vec![Some(1), None])),
        ]);
        assert!(matches!(
            frame_to_array(&frame, &elem),
            Err(ConversionError::MissingElementInArrayResult { index: 3 })
        ));
    }

    #[test]
    fn dimension_attribute_beyond_three_is_rejected() {
        let elem = BuiltinCatalog::new().lookup(INT4OID).unwrap();
        let v = Vector::integer(vec![Some(1); 16]).with_dim(vec![2, 2, 2, 2]);
        assert!(matches!(
            value_to_array(&v.into(), &elem),
            Err(ConversionError::UnsupportedDimensionality { context: "array result", ndims: 4 })
        ));
    }

    #[test]
    fn dimension_attribute_must_match_length() {
        let elem = BuiltinCatalog::new().lookup(INT4OID).unwrap();
        let v = Vector::integer(vec![Some(1); 5]).with_dim(vec![2, 3]);
        assert!(matches!(
            dimensioned_to_array(&v, &[2, 3], &elem),
            Err(ConversionError::BadInternalRepresentation(_))
        ));
    }

    #[test]
    fn malformed_element_fails() {
        let elem = BuiltinCatalog::new().lookup(INT2OID).unwrap();
        let v = Vector::integer(vec![Some(1), Some(100_000)]);
        assert!(matches!(vector_to_array(&v, &elem), Err(ConversionError::MalformedElement(_))));
    }

    #[test]
    fn result_charges_aligned_payload() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).bind_result(INT8ARRAYOID).unwrap();
        let v = Vector::real(vec![Some(1.0), Some(2.0)]);
        let array = runtime_to_array(&v.into(), &ctx).unwrap();
        assert_eq!(array.elements(), &[Datum::Int8(1), Datum::Int8(2)]);
        assert_eq!(regions.region(crate::region::RegionScope::Call).bytes(), 16);
    }

    #[test]
    fn payload_aligns_fixed_width_elements() {
        let layout = TypeLayout::fixed(2, true, TypeAlign::Short);
        assert_eq!(payload_size(&[Datum::Int2(1), Datum::Int2(2), Datum::Int2(3)], layout), 6);
        let text = TypeLayout::varlena(TypeAlign::Int);
        // 4 + 1 = 5, aligned to 8, + 4 + 2 = 14
        assert_eq!(payload_size(&[Datum::Text("a".into()), Datum::Text("bc".into())], text), 14);
    }

    #[test]
    fn non_array_result_type_is_config_error() {
        let catalog = BuiltinCatalog::new();
        let regions = CallRegions::new();
        let ctx = ConversionContext::new(&catalog, &regions).bind_result(INT4OID).unwrap();
        let v = Vector::integer(vec![Some(1)]);
        assert!(matches!(runtime_to_array(&v.into(), &ctx), Err(ConversionError::Config(_))));
    }
}
