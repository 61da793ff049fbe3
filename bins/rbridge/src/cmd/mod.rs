pub mod args;
pub mod error;
pub mod result;

use std::io::Read;

use serde::de::DeserializeOwned;

use rbridge_engine::Bridge;
use rbridge_engine::config::BridgeConfig;

use error::CliError;

pub fn load_bridge(path: Option<&str>) -> Result<Bridge, CliError> {
    let config = match path {
        Some(path) => {
            tracing::info!(config = %path, "loading configuration");
            BridgeConfig::load(path)?
        }
        None => BridgeConfig::default(),
    };
    Ok(Bridge::from_config(&config)?)
}

/// Read and parse a JSON call file; `-` reads stdin.
pub fn read_call<T: DeserializeOwned>(path: &str) -> Result<T, CliError> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::Input(format!("cannot read stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| CliError::Input(format!("cannot read {path}: {e}")))?
    };
    serde_json::from_str(&content).map_err(|e| CliError::Input(format!("bad call file {path}: {e}")))
}

pub fn render(doc: &serde_json::Value, pretty: bool) -> Result<String, CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(doc)
    } else {
        serde_json::to_string(doc)
    };
    text.map_err(|e| CliError::Output(e.to_string()))
}
