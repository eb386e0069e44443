mod encoder;
mod heap_file;
#[cfg(test)]
mod tests;

pub use encoder::HeapFileEncoder;
pub use heap_file::{HeapFile, HeapFileIter};

use std::sync::Arc;

use crate::buffer::{BufferPool, PageRef};
use crate::error::DbResult;
use crate::file::{PageId, TableId};
use crate::record::{HeapPage, Tuple, TupleSchema};
use crate::transaction::TransactionId;

/// Page-addressable storage for one table, as seen by the buffer pool
///
/// `HeapFile` is the only production implementation. The pool reads pages
/// through `read_page` on a miss and writes them back through `write_page`.
/// Tuple mutations pull pages through the pool and report which pages they touched.
pub trait DbFile: Send + Sync {
    /// Table identifier shared by every page of this file
    fn id(&self) -> TableId;

    fn schema(&self) -> &Arc<TupleSchema>;

    /// Number of whole pages currently stored
    fn page_count(&self) -> DbResult<usize>;

    /// Read and decode one page; short reads and decode failures are fatal
    fn read_page(&self, page_id: PageId) -> DbResult<HeapPage>;

    /// Encode and write one page at its offset, extending the file if needed
    fn write_page(&self, page: &HeapPage) -> DbResult<()>;

    /// Insert `tuple`, returning the single page it landed on
    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> DbResult<Vec<PageRef>>;

    /// Delete `tuple` from its recorded page, returning that page
    fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> DbResult<Vec<PageRef>>;

    /// Push written pages to stable storage
    fn sync(&self) -> DbResult<()> {
        Ok(())
    }
}
