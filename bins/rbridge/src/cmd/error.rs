use rbridge_engine::ConversionError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    Output(String),

    #[error("{0}")]
    Conversion(#[from] ConversionError),
}
