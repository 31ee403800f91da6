use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Serialization Error: {0}")]
    Serde(#[from] rmp_serde::encode::Error),

    #[error("Deserialization Error: {0}")]
    DeSerde(#[from] rmp_serde::decode::Error),

    #[error("Malformed array payload: {0}")]
    Array(String),
}
