use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Model not trained yet")]
    ModelNotReady,

    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}
