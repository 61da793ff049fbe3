use std::fmt;

use serde::{Deserialize, Serialize};

/// One element of a runtime vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeScalar {
    Integer(i32),
    Real(f64),
    Logical(bool),
    Character(String),
    /// Per-element null marker.
    Missing,
}

impl RuntimeScalar {
    pub fn is_missing(&self) -> bool {
        matches!(self, RuntimeScalar::Missing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorKind {
    Integer,
    Real,
    Logical,
    Character,
    Factor,
    List,
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorKind::Integer => f.write_str("integer"),
            VectorKind::Real => f.write_str("real"),
            VectorKind::Logical => f.write_str("logical"),
            VectorKind::Character => f.write_str("character"),
            VectorKind::Factor => f.write_str("factor"),
            VectorKind::List => f.write_str("list"),
        }
    }
}

/// Typed element storage. `None` is a missing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Elements {
    Integer(Vec<Option<i32>>),
    Real(Vec<Option<f64>>),
    Logical(Vec<Option<bool>>),
    Character(Vec<Option<String>>),
    /// Category-coded values: 1-based codes into `levels`.
    Factor {
        codes: Vec<Option<i32>>,
        levels: Vec<String>,
    },
    /// Heterogeneous cells, each an independent runtime value.
    List(Vec<RuntimeValue>),
}

impl Elements {
    pub fn len(&self) -> usize {
        match self {
            Elements::Integer(v) => v.len(),
            Elements::Real(v) => v.len(),
            Elements::Logical(v) => v.len(),
            Elements::Character(v) => v.len(),
            Elements::Factor { codes, .. } => codes.len(),
            Elements::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> VectorKind {
        match self {
            Elements::Integer(_) => VectorKind::Integer,
            Elements::Real(_) => VectorKind::Real,
            Elements::Logical(_) => VectorKind::Logical,
            Elements::Character(_) => VectorKind::Character,
            Elements::Factor { .. } => VectorKind::Factor,
            Elements::List(_) => VectorKind::List,
        }
    }
}

/// Failure to store a scalar into a vector slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SetError {
    OutOfBounds { index: usize, len: usize },
    KindMismatch { kind: VectorKind, value: RuntimeScalar },
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetError::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for vector of length {len}")
            }
            SetError::KindMismatch { kind, value } => {
                write!(f, "cannot store {value:?} in a {kind} vector")
            }
        }
    }
}

impl std::error::Error for SetError {}

// ════════════════════════════════════════════════════════════════
//  Vector
// ════════════════════════════════════════════════════════════════

/// Runtime vector with an optional dimension attribute.
///
/// With a 2- or 3-extent dimension attribute the vector is a matrix or a
/// 3-array, stored column-major (first subscript varies fastest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    elements: Elements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dim: Option<Vec<usize>>,
}

impl Vector {
    pub fn new(elements: Elements) -> Self {
        Self { elements, dim: None }
    }

    pub fn integer(values: Vec<Option<i32>>) -> Self {
        Self::new(Elements::Integer(values))
    }

    pub fn real(values: Vec<Option<f64>>) -> Self {
        Self::new(Elements::Real(values))
    }

    pub fn logical(values: Vec<Option<bool>>) -> Self {
        Self::new(Elements::Logical(values))
    }

    pub fn character(values: Vec<Option<String>>) -> Self {
        Self::new(Elements::Character(values))
    }

    pub fn factor(codes: Vec<Option<i32>>, levels: Vec<String>) -> Self {
        Self::new(Elements::Factor { codes, levels })
    }

    pub fn list(values: Vec<RuntimeValue>) -> Self {
        Self::new(Elements::List(values))
    }

    /// Length-1 character vector holding a single missing element.
    pub fn missing() -> Self {
        Self::character(vec![None])
    }

    pub fn with_dim(mut self, dim: Vec<usize>) -> Self {
        self.dim = Some(dim);
        self
    }

    pub fn dim(&self) -> Option<&[usize]> {
        self.dim.as_deref()
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self.dim.as_deref(), Some([_, _]))
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn kind(&self) -> VectorKind {
        self.elements.kind()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index` as a scalar. Factors yield their integer code;
    /// list cells yield `None`, as does an index out of bounds.
    pub fn scalar_at(&self, index: usize) -> Option<RuntimeScalar> {
        fn wrap<T: Clone>(v: &[Option<T>], i: usize, f: impl Fn(T) -> RuntimeScalar) -> Option<RuntimeScalar> {
            v.get(i).map(|e| e.clone().map_or(RuntimeScalar::Missing, f))
        }
        match &self.elements {
            Elements::Integer(v) => wrap(v, index, RuntimeScalar::Integer),
            Elements::Real(v) => wrap(v, index, RuntimeScalar::Real),
            Elements::Logical(v) => wrap(v, index, RuntimeScalar::Logical),
            Elements::Character(v) => wrap(v, index, RuntimeScalar::Character),
            Elements::Factor { codes, .. } => wrap(codes, index, RuntimeScalar::Integer),
            Elements::List(_) => None,
        }
    }

    /// Store `value` at `index`. `Missing` is accepted by every atomic kind.
    pub fn set(&mut self, index: usize, value: RuntimeScalar) -> Result<(), SetError> {
        let len = self.len();
        if index >= len {
            return Err(SetError::OutOfBounds { index, len });
        }
        let kind = self.kind();
        match (&mut self.elements, value) {
            (Elements::Integer(v), RuntimeScalar::Integer(x)) => v[index] = Some(x),
            (Elements::Real(v), RuntimeScalar::Real(x)) => v[index] = Some(x),
            (Elements::Logical(v), RuntimeScalar::Logical(x)) => v[index] = Some(x),
            (Elements::Character(v), RuntimeScalar::Character(x)) => v[index] = Some(x),
            (Elements::Integer(v), RuntimeScalar::Missing) => v[index] = None,
            (Elements::Real(v), RuntimeScalar::Missing) => v[index] = None,
            (Elements::Logical(v), RuntimeScalar::Missing) => v[index] = None,
            (Elements::Character(v), RuntimeScalar::Missing) => v[index] = None,
            (Elements::Factor { codes, .. }, RuntimeScalar::Missing) => codes[index] = None,
            (_, value) => return Err(SetError::KindMismatch { kind, value }),
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════
//  Frame
// ════════════════════════════════════════════════════════════════

/// Named columns with row labels, the runtime analogue of a table.
///
/// Columns are expected to share one length; the type does not enforce it
/// because frames produced by the evaluator are foreign input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vector>,
    #[serde(default)]
    row_names: Vec<String>,
}

impl Frame {
    /// Build a frame with row labels `"1"..="n"`, `n` being the leading column's length.
    pub fn new(columns: Vec<(String, Vector)>) -> Self {
        let (names, columns): (Vec<String>, Vec<Vector>) = columns.into_iter().unzip();
        let nrow = columns.first().map_or(0, Vector::len);
        let row_names = (1..=nrow).map(|i| i.to_string()).collect();
        Self { names, columns, row_names }
    }

    pub fn with_row_names(mut self, row_names: Vec<String>) -> Self {
        self.row_names = row_names;
        self
    }

    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    /// Row count implied by the leading column.
    pub fn nrow(&self) -> usize {
        self.columns.first().map_or(0, Vector::len)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Vector> {
        self.columns.get(index)
    }

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }
}

// ════════════════════════════════════════════════════════════════
//  RuntimeValue
// ════════════════════════════════════════════════════════════════

/// Value as seen by the embedded evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeValue {
    Null,
    Vector(Vector),
    Frame(Frame),
}

impl RuntimeValue {
    /// Runtime length: element count of a vector, column count of a frame.
    pub fn len(&self) -> usize {
        match self {
            RuntimeValue::Null => 0,
            RuntimeValue::Vector(v) => v.len(),
            RuntimeValue::Frame(f) => f.ncol(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            RuntimeValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            RuntimeValue::Frame(f) => Some(f),
            _ => None,
        }
    }
}

impl From<Vector> for RuntimeValue {
    fn from(v: Vector) -> Self {
        RuntimeValue::Vector(v)
    }
}

impl From<Frame> for RuntimeValue {
    fn from(f: Frame) -> Self {
        RuntimeValue::Frame(f)
    }
}
