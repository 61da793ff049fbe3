use serde::Deserialize;

use rbridge_api::relational::RelationalValue;
use rbridge_engine::Bridge;
use rbridge_engine::region::CallRegions;

use super::error::CliError;
use super::read_call;

/// Call file for `rbridge args`.
#[derive(Debug, Deserialize)]
pub struct ArgsCall {
    pub args: Vec<RelationalValue>,
}

pub fn run(bridge: &Bridge, file: &str) -> Result<serde_json::Value, CliError> {
    let call: ArgsCall = read_call(file)?;
    let regions = CallRegions::new();
    let ctx = bridge.context(&regions);
    let values = rbridge_engine::convert_arguments(&call.args, &ctx)?;
    tracing::info!(args = values.len(), "converted arguments");
    serde_json::to_value(values).map_err(|e| CliError::Output(e.to_string()))
}
