use ahash::{AHashMap, AHashSet};
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use std::sync::Arc;

use super::replacer::{LruReplacer, Replacer};
use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::file::{PageId, TableId};
use crate::record::{HeapPage, RecordError, Tuple};
use crate::transaction::{Permissions, TransactionId};

/// A resident page, shared between the pool and its callers
pub type PageRef = Arc<RwLock<HeapPage>>;

/// Page table plus eviction bookkeeping, guarded by one mutex
struct PoolState {
    pages: AHashMap<PageId, PageRef>,
    replacer: Box<dyn Replacer>,
    /// Pages whose disk read is in flight
    loading: AHashSet<PageId>,
}

/// Bounded cache of heap pages keyed by page id
///
/// At most `capacity` pages are resident. A miss on a full pool evicts one page
/// first, writing it back if dirty. Callers must release a page's latch before
/// calling back into the pool.
pub struct BufferPool {
    catalog: Arc<Catalog>,
    capacity: usize,
    state: Mutex<PoolState>,
    loaded: Condvar,
}

impl BufferPool {
    /// Create a pool holding at most `num_pages` pages with LRU eviction
    pub fn new(catalog: Arc<Catalog>, num_pages: usize) -> Self {
        Self::with_replacer(catalog, num_pages, Box::new(LruReplacer::new()))
    }

    pub fn with_replacer(
        catalog: Arc<Catalog>,
        num_pages: usize,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        Self {
            catalog,
            capacity: num_pages,
            state: Mutex::new(PoolState {
                pages: AHashMap::with_capacity(num_pages),
                replacer,
                loading: AHashSet::new(),
            }),
            loaded: Condvar::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Fetch a page, loading it from its table's file on a miss
    ///
    /// `perm` is accepted for the locking protocol but not enforced.
    pub fn get_page(
        &self,
        _tid: TransactionId,
        page_id: PageId,
        _perm: Permissions,
    ) -> DbResult<PageRef> {
        let (_state, page) = self.fetch(page_id)?;
        Ok(page)
    }

    /// Fetch a page and run `f` on it under its write latch
    ///
    /// `f` returns whether it changed the page; a changed page is marked dirty for
    /// `tid` before the pool lock is released, so it can never be evicted with the
    /// change unwritten. Returns the page when it was changed.
    pub fn update_page<F>(
        &self,
        tid: TransactionId,
        page_id: PageId,
        f: F,
    ) -> DbResult<Option<PageRef>>
    where
        F: FnOnce(&mut HeapPage) -> DbResult<bool>,
    {
        let (_state, page) = self.fetch(page_id)?;

        let mut guard = page.write();
        if !f(&mut guard)? {
            return Ok(None);
        }
        guard.mark_dirty(true, tid);
        drop(guard);

        Ok(Some(page))
    }

    /// Resolve `page_id` to its resident copy, returning it with the pool lock still held
    ///
    /// The disk read on a miss runs without the pool lock. The page id is marked as
    /// loading meanwhile, and other misses on it wait for that load instead of
    /// reading a second copy.
    fn fetch(&self, page_id: PageId) -> DbResult<(MutexGuard<'_, PoolState>, PageRef)> {
        let mut state = self.state.lock();

        loop {
            if let Some(page) = state.pages.get(&page_id).cloned() {
                state.replacer.record_access(page_id);
                return Ok((state, page));
            }
            if !state.loading.contains(&page_id) {
                break;
            }
            self.loaded.wait(&mut state);
        }

        let file = self.catalog.database_file(page_id.table_id())?;
        state.loading.insert(page_id);
        let read = MutexGuard::unlocked(&mut state, || file.read_page(page_id));
        state.loading.remove(&page_id);
        self.loaded.notify_all();

        let page = Arc::new(RwLock::new(read?));
        if state.pages.len() >= self.capacity {
            self.evict_page(&mut state)?;
        }
        state.pages.insert(page_id, Arc::clone(&page));
        state.replacer.record_access(page_id);
        Ok((state, page))
    }

    /// Lock release hook; no page locks are taken yet
    pub fn release_page(&self, _tid: TransactionId, _page_id: PageId) {}

    /// Always false until page locking exists
    pub fn holds_lock(&self, _tid: TransactionId, _page_id: PageId) -> bool {
        false
    }

    /// Commit/abort hook; no transactional state is kept yet
    pub fn transaction_complete(&self, _tid: TransactionId, _commit: bool) -> DbResult<()> {
        Ok(())
    }

    /// Insert `tuple` into `table_id`, marking the touched page dirty and keeping it resident
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> DbResult<()> {
        let file = self.catalog.database_file(table_id)?;
        let pages = file.insert_tuple(self, tid, tuple)?;
        self.adopt_dirty(tid, pages)
    }

    /// Delete `tuple` from the table its record id points into
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &mut Tuple) -> DbResult<()> {
        let rid = tuple.record_id().ok_or(RecordError::NotPlaced)?;
        let file = self.catalog.database_file(rid.page_id.table_id())?;
        let pages = file.delete_tuple(self, tid, tuple)?;
        self.adopt_dirty(tid, pages)
    }

    /// Re-mark pages a file reported as changed
    ///
    /// Only the resident copy is touched. A reported page that is no longer
    /// resident was written back when it was evicted.
    fn adopt_dirty(&self, tid: TransactionId, pages: Vec<PageRef>) -> DbResult<()> {
        let mut state = self.state.lock();
        for page in pages {
            let page_id = page.read().id();
            let resident = state
                .pages
                .get(&page_id)
                .is_some_and(|cached| Arc::ptr_eq(cached, &page));
            if resident {
                page.write().mark_dirty(true, tid);
                state.replacer.record_access(page_id);
            }
        }
        Ok(())
    }

    /// Write one resident page back if dirty; absent pages are a no-op
    pub fn flush_page(&self, page_id: PageId) -> DbResult<()> {
        let state = self.state.lock();
        self.write_back(&state, page_id)
    }

    /// Write back every dirty resident page, then sync the files written to
    pub fn flush_all_pages(&self) -> DbResult<()> {
        let state = self.state.lock();

        let mut dirty: Vec<PageId> = state
            .pages
            .iter()
            .filter(|(_, page)| page.read().is_dirty().is_some())
            .map(|(page_id, _)| *page_id)
            .collect();
        dirty.sort();

        let mut tables: Vec<TableId> = Vec::new();
        for page_id in dirty {
            self.write_back(&state, page_id)?;
            if !tables.contains(&page_id.table_id()) {
                tables.push(page_id.table_id());
            }
        }

        for table_id in tables {
            self.catalog.database_file(table_id)?.sync()?;
        }
        Ok(())
    }

    /// Write back the resident pages last dirtied by `tid`
    pub fn flush_pages(&self, tid: TransactionId) -> DbResult<()> {
        let state = self.state.lock();

        let mut owned: Vec<PageId> = state
            .pages
            .iter()
            .filter(|(_, page)| page.read().is_dirty() == Some(tid))
            .map(|(page_id, _)| *page_id)
            .collect();
        owned.sort();

        for page_id in owned {
            self.write_back(&state, page_id)?;
        }
        Ok(())
    }

    /// Drop a page from the pool without writing it back
    pub fn discard_page(&self, page_id: PageId) {
        let mut state = self.state.lock();
        state.pages.remove(&page_id);
        state.replacer.remove(page_id);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn resident_count(&self) -> usize {
        self.state.lock().pages.len()
    }

    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.state.lock().pages.contains_key(&page_id)
    }

    pub fn dirty_page_count(&self) -> usize {
        self.state
            .lock()
            .pages
            .values()
            .filter(|page| page.read().is_dirty().is_some())
            .count()
    }

    fn write_back(&self, state: &PoolState, page_id: PageId) -> DbResult<()> {
        let Some(page) = state.pages.get(&page_id) else {
            return Ok(());
        };

        let mut page = page.write();
        if let Some(tid) = page.is_dirty() {
            let file = self.catalog.database_file(page_id.table_id())?;
            file.write_page(&page)?;
            page.mark_dirty(false, tid);
        }
        Ok(())
    }

    /// Remove one page, trying victims in replacer order
    ///
    /// A dirty victim whose write-back fails stays resident and the next
    /// candidate is tried.
    fn evict_page(&self, state: &mut PoolState) -> DbResult<()> {
        for victim in state.replacer.candidates() {
            match self.write_back(state, victim) {
                Ok(()) => {
                    state.pages.remove(&victim);
                    state.replacer.remove(victim);
                    return Ok(());
                }
                Err(err) => {
                    eprintln!("warning: cannot evict page {}: {}", victim, err);
                }
            }
        }

        Err(DbError::BufferPoolExhausted {
            capacity: self.capacity,
        })
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        if let Err(err) = self.flush_all_pages() {
            eprintln!("warning: buffer pool flush on drop failed: {}", err);
        }
    }
}
