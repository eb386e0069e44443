use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Short read at page {page_no}: expected {expected} bytes, got {actual}")]
    ShortRead {
        page_no: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Page out of range: page_no={page_no}, page_count={page_count}")]
    PageOutOfRange { page_no: usize, page_count: usize },

    #[error("Corrupt file {path}: length {len} is not a multiple of page size {page_size}")]
    Corrupted {
        path: String,
        len: u64,
        page_size: usize,
    },

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type FileResult<T> = Result<T, FileError>;
