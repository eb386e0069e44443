pub mod buffer;
pub mod catalog;
pub mod error;
pub mod file;
pub mod heap;
pub mod record;
pub mod transaction;

pub use buffer::{BufferPool, FifoReplacer, LruReplacer, PageRef, Replacer};
pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use error::{DbError, DbResult};
pub use file::{
    DEFAULT_POOL_PAGES, FileError, FileResult, PAGE_SIZE, PageId, PageNo, PagedFile,
    StorageConfig, TableId,
};
pub use heap::{DbFile, HeapFile, HeapFileEncoder, HeapFileIter};
pub use record::{
    ColumnDef, DataType, HeapPage, PageLayout, RecordError, RecordId, RecordResult, SlotId, Tuple,
    TupleSchema, Value,
};
pub use transaction::{Permissions, TransactionId};
