use serde::{Deserialize, Serialize};

use rbridge_api::oid::TypeOid;
use rbridge_api::relational::{RelationalValue, RowSet};
use rbridge_api::runtime::RuntimeValue;
use rbridge_api::schema::ColumnDescriptor;
use rbridge_engine::region::{CallRegions, RegionScope};
use rbridge_engine::{Bridge, CallOutput, CallShape, ResultSetInfo};

use super::error::CliError;
use super::read_call;

/// Call file for `rbridge result`.
#[derive(Debug, Deserialize)]
pub struct ResultCall {
    /// Declared result type. Not needed when the call produces rows.
    #[serde(default)]
    pub result_type: Option<TypeOid>,
    #[serde(default)]
    pub returns_set: bool,
    #[serde(default)]
    pub returns_tuple: bool,
    /// Expected row shape for tuple- and set-returning calls.
    #[serde(default)]
    pub columns: Option<Vec<ColumnDescriptor>>,
    #[serde(default = "default_materialize")]
    pub materialize: bool,
    pub value: RuntimeValue,
}

fn default_materialize() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ResultDoc {
    Null,
    Value { value: RelationalValue },
    RowSet { row_set: RowSet, query_bytes: usize },
}

pub fn run(bridge: &Bridge, file: &str) -> Result<serde_json::Value, CliError> {
    let call: ResultCall = read_call(file)?;
    let regions = CallRegions::new();
    let mut ctx = bridge.context(&regions).with_call_shape(CallShape {
        returns_set: call.returns_set,
        returns_tuple: call.returns_tuple,
    });
    if let Some(oid) = call.result_type {
        ctx = ctx.bind_result(oid)?;
    }
    let rsinfo = call.columns.map(|expected| ResultSetInfo {
        expected,
        materialize_allowed: call.materialize,
    });

    let doc = match rbridge_engine::convert_result(call.value, &ctx, rsinfo.as_ref())? {
        CallOutput::Null => ResultDoc::Null,
        CallOutput::Value(value) => ResultDoc::Value { value },
        CallOutput::RowSet(store) => ResultDoc::RowSet {
            row_set: store.into_row_set(),
            query_bytes: regions.region(RegionScope::Query).bytes(),
        },
    };
    tracing::info!(call_bytes = regions.region(RegionScope::Call).bytes(), "converted result");
    serde_json::to_value(doc).map_err(|e| CliError::Output(e.to_string()))
}
