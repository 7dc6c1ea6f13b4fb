use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("payload serialization failed: {0}")]
    Serialization(String),

    #[error("certificate error: {0}")]
    Certificate(String),
}
