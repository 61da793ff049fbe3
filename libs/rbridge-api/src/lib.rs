pub mod error;
pub mod oid;
pub mod relational;
pub mod runtime;
pub mod schema;
pub mod sink;
pub mod types;
