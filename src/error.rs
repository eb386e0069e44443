use thiserror::Error;

use crate::catalog::CatalogError;
use crate::file::{FileError, TableId};
use crate::record::RecordError;

/// Errors surfaced by the heap file, buffer pool and catalog layers
#[derive(Debug, Error)]
pub enum DbError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Buffer pool exhausted: no page among {capacity} resident pages could be evicted")]
    BufferPoolExhausted { capacity: usize },

    #[error("Unknown table id: {0}")]
    UnknownTable(TableId),

    #[error("No such table: {0}")]
    NoSuchTable(String),
}

impl DbError {
    /// Full page on insert, or a delete whose tuple is not at its recorded slot
    pub fn is_slot_state(&self) -> bool {
        matches!(self, DbError::Record(e) if e.is_slot_state())
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, DbError::Record(RecordError::SchemaMismatch(_)))
    }

    /// Page bytes that could not be read or parsed: truncated block or bad field
    pub fn is_decode(&self) -> bool {
        match self {
            DbError::Record(e) => e.is_decode(),
            DbError::File(FileError::ShortRead { .. }) => true,
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
