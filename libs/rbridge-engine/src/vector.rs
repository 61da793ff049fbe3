use rbridge_api::runtime::Vector;
use rbridge_api::types::TypeClass;

/// A vector of `len` missing slots, of the kind matching `class`.
pub fn new_vector(class: TypeClass, len: usize) -> Vector {
    match class {
        TypeClass::SmallInt => Vector::integer(vec![None; len]),
        TypeClass::Numeric64 => Vector::real(vec![None; len]),
        TypeClass::Boolean => Vector::logical(vec![None; len]),
        TypeClass::Text => Vector::character(vec![None; len]),
    }
}
