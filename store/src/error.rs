use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate row: {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Rows that should agree with each other do not.
    #[error("mirror is inconsistent: {0}")]
    Corruption(String),
}

impl StoreError {
    pub fn not_found(table: &str, key: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{table} {key}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
