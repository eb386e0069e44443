use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown column type '{column_type}' for column {column}")]
    UnknownType { column: String, column_type: String },

    #[error("Duplicate table name in catalog: {0}")]
    DuplicateTable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
