use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::oid::TypeOid;
use crate::schema::ColumnDescriptor;

/// Non-null relational value.
///
/// Nullability lives one level up (`Option<Datum>`), so array elements,
/// which are never null, are plain `Datum`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datum {
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    /// Amount in cents.
    Money(i64),
    /// Canonical decimal text, as produced by the numeric input function.
    Numeric(String),
    Text(String),
    Array(ArrayValue),
}

impl Datum {
    /// Approximate stored size in bytes (header included for variable-length values).
    pub fn stored_size(&self) -> usize {
        match self {
            Datum::Bool(_) => 1,
            Datum::Int2(_) => 2,
            Datum::Int4(_) | Datum::Float4(_) => 4,
            Datum::Int8(_) | Datum::Float8(_) | Datum::Money(_) => 8,
            Datum::Numeric(s) | Datum::Text(s) => 4 + s.len(),
            Datum::Array(a) => a.stored_size(),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  ArrayValue
// ════════════════════════════════════════════════════════════════

/// Dimensioned relational array.
///
/// Elements are kept in storage order: the last subscript varies fastest.
/// An empty array has no dimensions at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArray")]
pub struct ArrayValue {
    elem_type: TypeOid,
    dims: Vec<usize>,
    lower_bounds: Vec<i32>,
    elements: Vec<Datum>,
}

#[derive(Deserialize)]
struct RawArray {
    elem_type: TypeOid,
    #[serde(default)]
    dims: Vec<usize>,
    #[serde(default)]
    lower_bounds: Vec<i32>,
    #[serde(default)]
    elements: Vec<Datum>,
}

impl TryFrom<RawArray> for ArrayValue {
    type Error = HostError;

    fn try_from(raw: RawArray) -> Result<Self, Self::Error> {
        if raw.lower_bounds.is_empty() {
            ArrayValue::new(raw.elem_type, raw.dims, raw.elements)
        } else {
            ArrayValue::with_lower_bounds(raw.elem_type, raw.dims, raw.lower_bounds, raw.elements)
        }
    }
}

impl ArrayValue {
    /// Build an array with all lower bounds set to 1.
    pub fn new(elem_type: TypeOid, dims: Vec<usize>, elements: Vec<Datum>) -> Result<Self, HostError> {
        let lower_bounds = vec![1; dims.len()];
        Self::with_lower_bounds(elem_type, dims, lower_bounds, elements)
    }

    pub fn with_lower_bounds(
        elem_type: TypeOid,
        dims: Vec<usize>,
        lower_bounds: Vec<i32>,
        elements: Vec<Datum>,
    ) -> Result<Self, HostError> {
        if dims.len() != lower_bounds.len() {
            return Err(HostError::invalid_input(format!(
                "array has {} dimensions but {} lower bounds",
                dims.len(),
                lower_bounds.len()
            )));
        }
        let nitems = item_count(&dims)
            .ok_or_else(|| HostError::invalid_input(format!("array size exceeds the maximum allowed: {dims:?}")))?;
        if nitems != elements.len() {
            return Err(HostError::invalid_input(format!(
                "array dimensions {dims:?} require {nitems} elements, got {}",
                elements.len()
            )));
        }
        if nitems == 0 {
            return Ok(Self::empty(elem_type));
        }
        Ok(Self { elem_type, dims, lower_bounds, elements })
    }

    /// One-dimensional array over `elements`.
    pub fn from_elements(elem_type: TypeOid, elements: Vec<Datum>) -> Self {
        if elements.is_empty() {
            return Self::empty(elem_type);
        }
        Self {
            elem_type,
            dims: vec![elements.len()],
            lower_bounds: vec![1],
            elements,
        }
    }

    pub fn empty(elem_type: TypeOid) -> Self {
        Self {
            elem_type,
            dims: Vec::new(),
            lower_bounds: Vec::new(),
            elements: Vec::new(),
        }
    }

    pub fn elem_type(&self) -> TypeOid {
        self.elem_type
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn lower_bounds(&self) -> &[i32] {
        &self.lower_bounds
    }

    pub fn elements(&self) -> &[Datum] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Approximate stored size: fixed header, one extent and lower bound per
    /// dimension, then the element payloads.
    pub fn stored_size(&self) -> usize {
        16 + self.dims.len() * 8 + self.elements.iter().map(Datum::stored_size).sum::<usize>()
    }
}

/// Number of elements implied by a list of extents. No extents means no
/// elements; `None` when the product overflows.
pub fn item_count(dims: &[usize]) -> Option<usize> {
    if dims.is_empty() {
        Some(0)
    } else {
        dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

// ════════════════════════════════════════════════════════════════
//  Rows and values
// ════════════════════════════════════════════════════════════════

/// Positional row. Order matches the column descriptors it was built against.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row(pub Vec<Option<Datum>>);

impl Row {
    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn stored_size(&self) -> usize {
        self.0
            .iter()
            .map(|v| v.as_ref().map_or(0, Datum::stored_size))
            .sum()
    }
}

/// Ordered rows with their column descriptors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowSet {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
}

/// Relational value as the host hands it to a call, or receives it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationalValue {
    Scalar {
        type_oid: TypeOid,
        value: Option<Datum>,
    },
    Array {
        type_oid: TypeOid,
        value: ArrayValue,
    },
    RowSet(RowSet),
}

impl RelationalValue {
    pub fn null(type_oid: TypeOid) -> Self {
        RelationalValue::Scalar { type_oid, value: None }
    }
}
