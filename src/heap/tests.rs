use std::path::Path;
use std::sync::Arc;

use tempfile::{TempDir, tempdir};

use super::*;
use crate::buffer::BufferPool;
use crate::catalog::Catalog;
use crate::file::PageId;
use crate::record::{DataType, Tuple, TupleSchema, Value};
use crate::transaction::{Permissions, TransactionId};

const TABLE: u32 = 42;
const SLOTS_PER_PAGE: usize = 504;

fn int_pair_schema() -> Arc<TupleSchema> {
    Arc::new(TupleSchema::from_types(&[DataType::Int, DataType::Int]))
}

fn pair(schema: &Arc<TupleSchema>, a: i32, b: i32) -> Tuple {
    Tuple::new(Arc::clone(schema), vec![Value::Int(a), Value::Int(b)]).unwrap()
}

struct Fixture {
    pool: BufferPool,
    file: Arc<HeapFile>,
    _dir: TempDir,
}

fn fixture_at(dir: TempDir, path: &Path, pool_pages: usize) -> Fixture {
    let file = Arc::new(HeapFile::open_with_id(TABLE, path, int_pair_schema(), 4096).unwrap());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(file.clone(), "pairs", "f0");
    Fixture {
        pool: BufferPool::new(catalog, pool_pages),
        file,
        _dir: dir,
    }
}

fn empty_fixture(pool_pages: usize) -> Fixture {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pairs.dat");
    fixture_at(dir, &path, pool_pages)
}

/// Heap file with `full_pages` completely packed pages
fn packed_fixture(full_pages: usize, pool_pages: usize) -> Fixture {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pairs.dat");
    let rows = (0..(full_pages * SLOTS_PER_PAGE) as i32).map(|i| vec![Value::Int(i), Value::Int(-i)]);
    HeapFileEncoder::new(int_pair_schema(), 4096)
        .convert(rows, &path)
        .unwrap();
    fixture_at(dir, &path, pool_pages)
}

fn scan_values(fx: &Fixture) -> Vec<i32> {
    fx.file
        .iter(&fx.pool, TransactionId::new())
        .map(|t| match t.unwrap().get(0) {
            Some(Value::Int(v)) => *v,
            other => panic!("unexpected value {:?}", other),
        })
        .collect()
}

#[test]
fn test_insert_into_empty_file_allocates_page() {
    let fx = empty_fixture(10);
    let schema = int_pair_schema();
    let tid = TransactionId::new();

    let mut tuple = pair(&schema, 1, 2);
    fx.pool.insert_tuple(tid, TABLE, &mut tuple).unwrap();

    assert_eq!(fx.file.page_count().unwrap(), 1);
    let rid = tuple.record_id().unwrap();
    assert_eq!(rid.page_id, PageId::new(TABLE, 0));
    assert_eq!(rid.slot_id, 0);
}

#[test]
fn test_505th_insert_goes_to_second_page() {
    let fx = empty_fixture(10);
    let schema = int_pair_schema();
    let tid = TransactionId::new();

    for i in 0..SLOTS_PER_PAGE as i32 {
        let mut tuple = pair(&schema, i, i);
        fx.pool.insert_tuple(tid, TABLE, &mut tuple).unwrap();
        assert_eq!(tuple.record_id().unwrap().page_id.page_no(), 0);
    }
    assert_eq!(fx.file.page_count().unwrap(), 1);

    let mut overflow = pair(&schema, 504, 504);
    fx.pool.insert_tuple(tid, TABLE, &mut overflow).unwrap();

    assert_eq!(fx.file.page_count().unwrap(), 2);
    let rid = overflow.record_id().unwrap();
    assert_eq!(rid.page_id.page_no(), 1);
    assert_eq!(rid.slot_id, 0);
}

#[test]
fn test_insert_uses_first_page_with_room() {
    let fx = packed_fixture(4, 10);
    let schema = int_pair_schema();
    let tid = TransactionId::new();

    // Free one slot on page 2 so pages read [full, full, room, full]
    let mut victim = fx
        .file
        .iter(&fx.pool, tid)
        .map(|t| t.unwrap())
        .find(|t| t.record_id().unwrap().page_id.page_no() == 2)
        .unwrap();
    let freed = victim.record_id().unwrap();
    fx.pool.delete_tuple(tid, &mut victim).unwrap();

    let mut tuple = pair(&schema, 9999, 9999);
    fx.pool.insert_tuple(tid, TABLE, &mut tuple).unwrap();

    assert_eq!(tuple.record_id(), Some(freed));
    assert_eq!(fx.file.page_count().unwrap(), 4);
}

#[test]
fn test_insert_into_full_file_appends_page() {
    let fx = packed_fixture(3, 10);
    let schema = int_pair_schema();

    let mut tuple = pair(&schema, 7, 7);
    fx.pool
        .insert_tuple(TransactionId::new(), TABLE, &mut tuple)
        .unwrap();

    assert_eq!(fx.file.page_count().unwrap(), 4);
    assert_eq!(tuple.record_id().unwrap().page_id.page_no(), 3);
}

#[test]
fn test_scan_order_and_rewind() {
    let fx = packed_fixture(2, 10);
    let schema = int_pair_schema();
    let tid = TransactionId::new();

    let mut extra = pair(&schema, 5000, 0);
    fx.pool.insert_tuple(tid, TABLE, &mut extra).unwrap();

    let values = scan_values(&fx);
    let mut expected: Vec<i32> = (0..2 * SLOTS_PER_PAGE as i32).collect();
    expected.push(5000);
    assert_eq!(values, expected);

    let mut iter = fx.file.iter(&fx.pool, tid);
    let first = iter.next().unwrap().unwrap();
    iter.next().unwrap().unwrap();
    iter.rewind();
    assert_eq!(iter.next().unwrap().unwrap(), first);
}

#[test]
fn test_scan_empty_file() {
    let fx = empty_fixture(4);
    assert!(scan_values(&fx).is_empty());
}

#[test]
fn test_scan_smaller_pool_than_file() {
    let fx = packed_fixture(5, 2);

    assert_eq!(scan_values(&fx).len(), 5 * SLOTS_PER_PAGE);
    assert!(fx.pool.resident_count() <= 2);
}

#[test]
fn test_delete_twice_is_slot_error() {
    let fx = empty_fixture(4);
    let schema = int_pair_schema();
    let tid = TransactionId::new();

    let mut tuple = pair(&schema, 1, 1);
    fx.pool.insert_tuple(tid, TABLE, &mut tuple).unwrap();
    let mut stale_copy = tuple.clone();

    fx.pool.delete_tuple(tid, &mut tuple).unwrap();
    assert_eq!(tuple.record_id(), None);

    let err = fx.pool.delete_tuple(tid, &mut tuple).unwrap_err();
    assert!(err.is_slot_state());

    let err = fx.pool.delete_tuple(tid, &mut stale_copy).unwrap_err();
    assert!(err.is_slot_state());
}

#[test]
fn test_insert_schema_mismatch() {
    let fx = empty_fixture(4);
    let other = Arc::new(TupleSchema::from_types(&[DataType::Int]));
    let mut tuple = Tuple::new(other, vec![Value::Int(1)]).unwrap();

    let err = fx
        .pool
        .insert_tuple(TransactionId::new(), TABLE, &mut tuple)
        .unwrap_err();

    assert!(err.is_schema_mismatch());
    assert_eq!(fx.file.page_count().unwrap(), 0);
}

#[test]
fn test_read_page_past_end_fails() {
    let fx = packed_fixture(1, 4);

    assert!(fx.file.read_page(PageId::new(TABLE, 1)).is_err());
    assert!(
        fx.pool
            .get_page(TransactionId::new(), PageId::new(TABLE, 3), Permissions::ReadOnly)
            .is_err()
    );
}

#[test]
fn test_write_then_read_page() {
    let fx = empty_fixture(4);
    let schema = int_pair_schema();
    let pid = PageId::new(TABLE, 0);

    let mut page = crate::record::HeapPage::new_empty(pid, schema.clone(), 4096).unwrap();
    page.insert_tuple(&mut pair(&schema, 3, 4)).unwrap();
    fx.file.write_page(&page).unwrap();

    let read = fx.file.read_page(pid).unwrap();
    assert_eq!(read, page);
    assert_eq!(read.encode().unwrap(), page.encode().unwrap());
}

#[test]
fn test_inserts_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pairs.dat");
    let schema = int_pair_schema();

    {
        let fx = fixture_at(tempdir().unwrap(), &path, 4);
        let tid = TransactionId::new();
        for i in 0..600 {
            fx.pool
                .insert_tuple(tid, TABLE, &mut pair(&schema, i, i))
                .unwrap();
        }
        fx.pool.flush_all_pages().unwrap();
    }

    let fx = fixture_at(dir, &path, 4);
    assert_eq!(fx.file.page_count().unwrap(), 2);
    assert_eq!(scan_values(&fx), (0..600).collect::<Vec<_>>());
}

#[test]
fn test_path_derived_ids_are_stable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stable.dat");

    let a = HeapFile::open(&path, int_pair_schema(), 4096).unwrap();
    let b = HeapFile::open(&path, int_pair_schema(), 4096).unwrap();
    let c = HeapFile::open(dir.path().join("other.dat"), int_pair_schema(), 4096).unwrap();

    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
}

#[test]
fn test_concurrent_delete_and_insert_with_small_pool() {
    let fx = packed_fixture(4, 2);
    let schema = int_pair_schema();
    let originals: Vec<Tuple> = fx
        .file
        .iter(&fx.pool, TransactionId::new())
        .map(|t| t.unwrap())
        .collect();

    std::thread::scope(|scope| {
        let pool = &fx.pool;
        let originals = &originals;
        scope.spawn(move || {
            let tid = TransactionId::new();
            for tuple in originals.iter().step_by(2) {
                pool.delete_tuple(tid, &mut tuple.clone()).unwrap();
            }
        });

        let schema = &schema;
        scope.spawn(move || {
            let tid = TransactionId::new();
            for i in 0..500 {
                pool.insert_tuple(tid, TABLE, &mut pair(schema, 100_000 + i, i))
                    .unwrap();
            }
        });
    });
    fx.pool.flush_all_pages().unwrap();

    let catalog = Arc::new(Catalog::new());
    catalog.add_table(fx.file.clone(), "pairs", "f0");
    let pool = BufferPool::new(catalog, 2);
    let mut found: Vec<i32> = fx
        .file
        .iter(&pool, TransactionId::new())
        .map(|t| match t.unwrap().get(0) {
            Some(Value::Int(v)) => *v,
            other => panic!("unexpected value {:?}", other),
        })
        .collect();
    found.sort();

    let mut expected: Vec<i32> = (0..4 * SLOTS_PER_PAGE as i32)
        .filter(|v| v % 2 == 1)
        .chain(100_000..100_500)
        .collect();
    expected.sort();
    assert_eq!(found, expected);
}
