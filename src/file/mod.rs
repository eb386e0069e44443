mod error;
mod paged_file;

pub use error::{FileError, FileResult};
pub use paged_file::PagedFile;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages held by the buffer pool
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Table identifier
pub type TableId = u32;

/// Page number within a table's file
pub type PageNo = usize;

/// Identity of a single page: the owning table plus the page's position in its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    table_id: TableId,
    page_no: PageNo,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: PageNo) -> Self {
        Self { table_id, page_no }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn page_no(&self) -> PageNo {
        self.page_no
    }

    /// Byte offset of this page inside its file
    pub fn byte_offset(&self, page_size: usize) -> u64 {
        (self.page_no as u64) * (page_size as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_no)
    }
}

/// Storage settings threaded into heap files and the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Size of every page in bytes
    pub page_size: usize,
    /// Maximum number of resident pages in the buffer pool
    pub pool_pages: usize,
}

impl StorageConfig {
    pub fn new(page_size: usize, pool_pages: usize) -> Self {
        Self {
            page_size,
            pool_pages,
        }
    }

    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Reject settings no page or pool can be built from
    pub fn validate(&self) -> FileResult<()> {
        if self.page_size == 0 {
            return Err(FileError::InvalidConfig(
                "page_size must be positive".to_string(),
            ));
        }
        if self.pool_pages == 0 {
            return Err(FileError::InvalidConfig(
                "pool_pages must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PAGE_SIZE, DEFAULT_POOL_PAGES)
    }
}
