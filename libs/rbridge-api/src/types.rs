use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::oid::{
    BOOLOID, CASHOID, FLOAT4OID, FLOAT8OID, INT2OID, INT4OID, INT8OID, NUMERICOID, TypeOid,
};
use crate::relational::Datum;

// ════════════════════════════════════════════════════════════════
//  Type classification
// ════════════════════════════════════════════════════════════════

/// Coarse bucket selecting the conversion strategy for a relational type.
///
/// - `SmallInt`: 2- and 4-byte integers → runtime integer
/// - `Numeric64`: int8, float4, float8, money, numeric → runtime real
///   (the runtime integer is only 32 bits wide)
/// - `Boolean` → runtime logical
/// - `Text`: everything else → runtime character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeClass {
    SmallInt,
    Numeric64,
    Boolean,
    Text,
}

impl TypeClass {
    /// Classification of a built-in type identifier. Unknown identifiers are `Text`.
    pub fn of(oid: TypeOid) -> Self {
        match oid {
            INT2OID | INT4OID => TypeClass::SmallInt,
            INT8OID | FLOAT4OID | FLOAT8OID | CASHOID | NUMERICOID => TypeClass::Numeric64,
            BOOLOID => TypeClass::Boolean,
            _ => TypeClass::Text,
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeClass::SmallInt => f.write_str("smallint"),
            TypeClass::Numeric64 => f.write_str("numeric64"),
            TypeClass::Boolean => f.write_str("boolean"),
            TypeClass::Text => f.write_str("text"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Physical layout
// ════════════════════════════════════════════════════════════════

/// Storage alignment requirement of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeAlign {
    Char,
    Short,
    Int,
    Double,
}

impl TypeAlign {
    pub fn bytes(self) -> usize {
        match self {
            TypeAlign::Char => 1,
            TypeAlign::Short => 2,
            TypeAlign::Int => 4,
            TypeAlign::Double => 8,
        }
    }

    /// Round `offset` up to this alignment.
    pub fn align(self, offset: usize) -> usize {
        let a = self.bytes();
        offset.div_ceil(a) * a
    }
}

/// Length, pass-by-value flag and alignment of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    /// Fixed byte length, or `-1` for variable-length types.
    pub len: i16,
    pub by_val: bool,
    pub align: TypeAlign,
}

impl TypeLayout {
    pub const fn fixed(len: i16, by_val: bool, align: TypeAlign) -> Self {
        Self { len, by_val, align }
    }

    pub const fn varlena(align: TypeAlign) -> Self {
        Self { len: -1, by_val: false, align }
    }

    pub fn is_varlena(&self) -> bool {
        self.len < 0
    }
}

// ════════════════════════════════════════════════════════════════
//  Type I/O functions
// ════════════════════════════════════════════════════════════════

/// Text input function of a relational type (`text → Datum`).
pub trait TypeInput: Send + Sync {
    fn input(&self, text: &str, typmod: i32) -> Result<Datum, HostError>;
}

/// Text output function of a relational type (`Datum → text`).
pub trait TypeOutput: Send + Sync {
    fn output(&self, datum: &Datum) -> Result<String, HostError>;
}

/// Catalog entry for one relational type.
#[derive(Clone)]
pub struct TypeInfo {
    pub oid: TypeOid,
    pub name: String,
    pub class: TypeClass,
    pub layout: TypeLayout,
    /// Element type. Set for array types, and for fixed-length types that
    /// are subscriptable without being arrays (`name`).
    pub elem: Option<TypeOid>,
    /// Array type whose elements are of this type.
    pub array: Option<TypeOid>,
    pub input: Arc<dyn TypeInput>,
    pub output: Arc<dyn TypeOutput>,
}

impl TypeInfo {
    /// True for true array types. Fixed-length subscriptable types such as
    /// `name` carry an element type but are handled as scalars.
    pub fn is_array(&self) -> bool {
        self.elem.is_some() && self.layout.is_varlena()
    }

    pub fn element_type(&self) -> Option<TypeOid> {
        if self.is_array() { self.elem } else { None }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("oid", &self.oid)
            .field("name", &self.name)
            .field("class", &self.class)
            .field("layout", &self.layout)
            .field("elem", &self.elem)
            .field("array", &self.array)
            .finish()
    }
}

/// Read-only type metadata service of the relational engine.
pub trait TypeCatalog: Send + Sync {
    fn lookup(&self, oid: TypeOid) -> Result<TypeInfo, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::{NAMEOID, TEXTOID, VARCHAROID};

    #[test]
    fn classification_buckets() {
        assert_eq!(TypeClass::of(INT2OID), TypeClass::SmallInt);
        assert_eq!(TypeClass::of(INT4OID), TypeClass::SmallInt);
        assert_eq!(TypeClass::of(INT8OID), TypeClass::Numeric64);
        assert_eq!(TypeClass::of(NUMERICOID), TypeClass::Numeric64);
        assert_eq!(TypeClass::of(CASHOID), TypeClass::Numeric64);
        assert_eq!(TypeClass::of(BOOLOID), TypeClass::Boolean);
        assert_eq!(TypeClass::of(TEXTOID), TypeClass::Text);
        assert_eq!(TypeClass::of(VARCHAROID), TypeClass::Text);
        assert_eq!(TypeClass::of(NAMEOID), TypeClass::Text);
        assert_eq!(TypeClass::of(999_999), TypeClass::Text);
    }

    #[test]
    fn align_rounds_up() {
        assert_eq!(TypeAlign::Int.align(5), 8);
        assert_eq!(TypeAlign::Double.align(8), 8);
        assert_eq!(TypeAlign::Char.align(3), 3);
        assert_eq!(TypeAlign::Short.align(0), 0);
    }
}
