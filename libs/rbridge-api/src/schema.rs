use serde::{Deserialize, Serialize};

use crate::oid::TypeOid;

/// One column of a relational row shape.
///
/// Produced by the host's row metadata; read-only input to the tabular codec
/// and the result materializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_oid: TypeOid,
    /// Element type when the column itself is array-typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem_type: Option<TypeOid>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_oid: TypeOid, elem_type: Option<TypeOid>) -> Self {
        Self { name: name.into(), type_oid, elem_type }
    }

    /// Shortcut: scalar column.
    pub fn scalar(name: impl Into<String>, type_oid: TypeOid) -> Self {
        Self::new(name, type_oid, None)
    }

    /// Shortcut: array column.
    pub fn array(name: impl Into<String>, type_oid: TypeOid, elem_type: TypeOid) -> Self {
        Self::new(name, type_oid, Some(elem_type))
    }

    pub fn is_array(&self) -> bool {
        self.elem_type.is_some()
    }
}
