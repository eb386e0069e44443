use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

use super::DbFile;
use crate::buffer::{BufferPool, PageRef};
use crate::error::DbResult;
use crate::file::{PageId, PageNo, PagedFile, TableId};
use crate::record::{HeapPage, PageLayout, RecordError, Tuple, TupleSchema};
use crate::transaction::{Permissions, TransactionId};

/// A table stored as an unordered sequence of slotted pages in one file
pub struct HeapFile {
    id: TableId,
    schema: Arc<TupleSchema>,
    layout: PageLayout,
    file: PagedFile,
    /// Serializes inserts so two appends cannot claim the same new page
    insert_lock: Mutex<()>,
}

impl HeapFile {
    /// Open (or create) a heap file whose table id is derived from its path
    pub fn open<P: AsRef<Path>>(
        path: P,
        schema: Arc<TupleSchema>,
        page_size: usize,
    ) -> DbResult<Self> {
        let file = PagedFile::open(path, page_size)?;
        let id = table_id_for_path(file.path());
        Self::from_parts(id, file, schema)
    }

    /// Open (or create) a heap file with an explicit table id
    pub fn open_with_id<P: AsRef<Path>>(
        id: TableId,
        path: P,
        schema: Arc<TupleSchema>,
        page_size: usize,
    ) -> DbResult<Self> {
        let file = PagedFile::open(path, page_size)?;
        Self::from_parts(id, file, schema)
    }

    fn from_parts(id: TableId, file: PagedFile, schema: Arc<TupleSchema>) -> DbResult<Self> {
        let layout = PageLayout::new(file.page_size(), schema.record_size())?;
        Ok(Self {
            id,
            schema,
            layout,
            file,
            insert_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn page_size(&self) -> usize {
        self.file.page_size()
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Stream every tuple, page 0 upward and slot order within a page
    pub fn iter<'a>(&'a self, pool: &'a BufferPool, tid: TransactionId) -> HeapFileIter<'a> {
        HeapFileIter::new(self, pool, tid)
    }

    fn page_id(&self, page_no: PageNo) -> PageId {
        PageId::new(self.id, page_no)
    }
}

impl DbFile for HeapFile {
    fn id(&self) -> TableId {
        self.id
    }

    fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    fn page_count(&self) -> DbResult<usize> {
        Ok(self.file.page_count()?)
    }

    fn read_page(&self, page_id: PageId) -> DbResult<HeapPage> {
        let mut buffer = vec![0u8; self.file.page_size()];
        self.file.read_page(page_id.page_no(), &mut buffer)?;
        Ok(HeapPage::decode(
            page_id,
            Arc::clone(&self.schema),
            &buffer,
        )?)
    }

    fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let data = page.encode()?;
        self.file.write_page(page.id().page_no(), &data)?;
        Ok(())
    }

    fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> DbResult<Vec<PageRef>> {
        if !self.schema.is_compatible(tuple.schema()) {
            return Err(RecordError::SchemaMismatch(format!(
                "table {} holds ({}), tuple has ({})",
                self.id,
                self.schema,
                tuple.schema()
            ))
            .into());
        }

        let _guard = self.insert_lock.lock();

        let page_count = self.page_count()?;
        for page_no in 0..page_count {
            let placed = pool.update_page(tid, self.page_id(page_no), |page| {
                if page.free_slot_count() == 0 {
                    return Ok(false);
                }
                page.insert_tuple(tuple)?;
                Ok(true)
            })?;
            if let Some(page) = placed {
                return Ok(vec![page]);
            }
        }

        // Every page is full: establish a fresh page on disk, then go through the pool
        self.file
            .write_page(page_count, &HeapPage::empty_page_data(self.file.page_size()))?;

        let placed = pool.update_page(tid, self.page_id(page_count), |page| {
            page.insert_tuple(tuple)?;
            Ok(true)
        })?;
        Ok(placed.into_iter().collect())
    }

    fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> DbResult<Vec<PageRef>> {
        let rid = tuple.record_id().ok_or(RecordError::NotPlaced)?;
        if rid.page_id.table_id() != self.id {
            return Err(RecordError::NotOnPage {
                page_id: self.page_id(rid.page_id.page_no()),
                location: rid.to_string(),
            }
            .into());
        }

        let changed = pool.update_page(tid, rid.page_id, |page| {
            page.delete_tuple(tuple)?;
            Ok(true)
        })?;
        Ok(changed.into_iter().collect())
    }

    fn sync(&self) -> DbResult<()> {
        Ok(self.file.sync()?)
    }
}

/// Stable identifier for a table file, derived from its canonical path
fn table_id_for_path(path: &Path) -> TableId {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let hasher = ahash::RandomState::with_seeds(0x5eed, 0x7ab1e, 0xf11e, 0x1d);
    hasher.hash_one(canonical) as TableId
}

/// Streaming scan over a heap file (yields tuples one-by-one)
///
/// Pages are fetched lazily through the buffer pool; the page count is taken
/// when the scan starts, so pages appended mid-scan are not visited.
pub struct HeapFileIter<'a> {
    file: &'a HeapFile,
    pool: &'a BufferPool,
    tid: TransactionId,
    page_no: PageNo,
    page_count: Option<usize>,
    current: std::vec::IntoIter<Tuple>,
    done: bool,
}

impl<'a> HeapFileIter<'a> {
    fn new(file: &'a HeapFile, pool: &'a BufferPool, tid: TransactionId) -> Self {
        Self {
            file,
            pool,
            tid,
            page_no: 0,
            page_count: None,
            current: Vec::new().into_iter(),
            done: false,
        }
    }

    /// Restart the scan from page 0
    pub fn rewind(&mut self) {
        self.page_no = 0;
        self.page_count = None;
        self.current = Vec::new().into_iter();
        self.done = false;
    }

    fn load_next_page(&mut self, page_count: usize) -> DbResult<bool> {
        if self.page_no >= page_count {
            return Ok(false);
        }

        let page_id = self.file.page_id(self.page_no);
        let page = self
            .pool
            .get_page(self.tid, page_id, Permissions::ReadOnly)?;
        let tuples: Vec<Tuple> = page.read().iter().cloned().collect();

        self.current = tuples.into_iter();
        self.page_no += 1;
        Ok(true)
    }
}

impl Iterator for HeapFileIter<'_> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(tuple) = self.current.next() {
                return Some(Ok(tuple));
            }

            let page_count = match self.page_count {
                Some(count) => count,
                None => match self.file.page_count() {
                    Ok(count) => {
                        self.page_count = Some(count);
                        count
                    }
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                },
            };

            match self.load_next_page(page_count) {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
