use std::path::Path;
use std::sync::Arc;

use crate::error::DbResult;
use crate::file::{PageId, PagedFile};
use crate::record::{HeapPage, Tuple, TupleSchema, Value};

/// Bulk writer that packs rows straight into heap pages, bypassing the buffer pool
pub struct HeapFileEncoder {
    schema: Arc<TupleSchema>,
    page_size: usize,
}

impl HeapFileEncoder {
    pub fn new(schema: Arc<TupleSchema>, page_size: usize) -> Self {
        Self { schema, page_size }
    }

    /// Write `rows` into a fresh heap file at `path`, replacing any existing content
    ///
    /// Pages are filled in order, lowest slot first. Returns the number of pages written;
    /// no rows means an empty file.
    pub fn convert<P, I>(&self, rows: I, path: P) -> DbResult<usize>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = Vec<Value>>,
    {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path).map_err(crate::file::FileError::from)?;
        }
        let file = PagedFile::open(path, self.page_size)?;

        let mut page_no = 0;
        let mut page = self.blank_page(page_no)?;
        let mut pending = false;

        for values in rows {
            let mut tuple = Tuple::new(Arc::clone(&self.schema), values)?;
            if page.is_full() {
                file.write_page(page_no, &page.encode()?)?;
                page_no += 1;
                page = self.blank_page(page_no)?;
            }
            page.insert_tuple(&mut tuple)?;
            pending = true;
        }

        if pending {
            file.write_page(page_no, &page.encode()?)?;
            page_no += 1;
        }
        file.sync()?;

        Ok(page_no)
    }

    fn blank_page(&self, page_no: usize) -> DbResult<HeapPage> {
        Ok(HeapPage::new_empty(
            PageId::new(0, page_no),
            Arc::clone(&self.schema),
            self.page_size,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DataType;
    use tempfile::tempdir;

    fn int_pair_schema() -> Arc<TupleSchema> {
        Arc::new(TupleSchema::from_types(&[DataType::Int, DataType::Int]))
    }

    #[test]
    fn test_convert_packs_full_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pairs.dat");
        let encoder = HeapFileEncoder::new(int_pair_schema(), 4096);

        let rows = (0..505).map(|i| vec![Value::Int(i), Value::Int(i * 2)]);
        let pages = encoder.convert(rows, &path).unwrap();

        assert_eq!(pages, 2);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2 * 4096);

        let file = PagedFile::open(&path, 4096).unwrap();
        let mut buf = vec![0u8; 4096];
        file.read_page(1, &mut buf).unwrap();
        let second = HeapPage::decode(PageId::new(0, 1), int_pair_schema(), &buf).unwrap();
        let tuples: Vec<_> = second.iter().collect();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].values(), &[Value::Int(504), Value::Int(1008)]);
    }

    #[test]
    fn test_convert_no_rows_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.dat");
        let encoder = HeapFileEncoder::new(int_pair_schema(), 4096);

        let pages = encoder.convert(Vec::<Vec<Value>>::new(), &path).unwrap();

        assert_eq!(pages, 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_convert_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("again.dat");
        let encoder = HeapFileEncoder::new(int_pair_schema(), 4096);

        encoder
            .convert((0..600).map(|i| vec![Value::Int(i), Value::Int(i)]), &path)
            .unwrap();
        let pages = encoder
            .convert(vec![vec![Value::Int(1), Value::Int(2)]], &path)
            .unwrap();

        assert_eq!(pages, 1);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    }

    #[test]
    fn test_convert_rejects_wrong_arity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.dat");
        let encoder = HeapFileEncoder::new(int_pair_schema(), 4096);

        let err = encoder
            .convert(vec![vec![Value::Int(1)]], &path)
            .unwrap_err();
        assert!(err.is_schema_mismatch());
    }
}
