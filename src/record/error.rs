use crate::file::PageId;
use thiserror::Error;

use super::record::SlotId;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid slot: page={0}, slot_id={1}")]
    InvalidSlot(PageId, SlotId),

    #[error("Page full: page={0}")]
    PageFull(PageId),

    #[error("Tuple is not on page {page_id} (recorded location: {location})")]
    NotOnPage { page_id: PageId, location: String },

    #[error("Slot already empty: page={0}, slot_id={1}")]
    SlotEmpty(PageId, SlotId),

    #[error("Tuple has no record location")]
    NotPlaced,

    #[error("Invalid page layout: {0}")]
    InvalidLayout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

impl RecordError {
    /// Insert into a full page or delete of a tuple not present at its location
    pub fn is_slot_state(&self) -> bool {
        matches!(
            self,
            RecordError::PageFull(_)
                | RecordError::NotOnPage { .. }
                | RecordError::SlotEmpty(..)
                | RecordError::NotPlaced
        )
    }

    /// Bytes that could not be parsed against the declared schema
    pub fn is_decode(&self) -> bool {
        matches!(self, RecordError::Deserialization(_))
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
