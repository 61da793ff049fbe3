pub mod array;
pub mod bridge;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod materialize;
pub mod region;
pub mod scalar;
pub mod tabular;
pub mod tuplestore;
pub mod vector;

pub use bridge::{Bridge, convert_arguments, convert_result};
pub use context::{CallShape, ConversionContext};
pub use error::ConversionError;
pub use materialize::{CallOutput, ResultSetInfo};
