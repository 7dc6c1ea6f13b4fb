use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        match e {
            heed::Error::Encoding(err) | heed::Error::Decoding(err) => {
                LmdbError::Serialization(err.to_string())
            }
            other => LmdbError::Heed(other.to_string()),
        }
    }
}

impl From<LmdbError> for chainops_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => chainops_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => chainops_store::StoreError::Serialization(msg),
            LmdbError::Heed(msg) => chainops_store::StoreError::Backend(msg),
        }
    }
}
