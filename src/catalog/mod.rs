mod error;

pub use error::{CatalogError, CatalogResult};

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::file::{StorageConfig, TableId};
use crate::heap::{DbFile, HeapFile};
use crate::record::{ColumnDef, DataType, TupleSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String, // "INT" or "STRING(n)"
}

impl ColumnMetadata {
    pub fn to_column_def(&self) -> CatalogResult<ColumnDef> {
        let data_type: DataType =
            self.column_type
                .parse()
                .map_err(|_| CatalogError::UnknownType {
                    column: self.name.clone(),
                    column_type: self.column_type.clone(),
                })?;
        Ok(ColumnDef::new(self.name.clone(), data_type))
    }
}

/// One entry of a JSON catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    /// Heap file path, relative to the catalog file's directory
    pub file: String,
    #[serde(default)]
    pub primary_key: String,
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn schema(&self) -> CatalogResult<TupleSchema> {
        let columns = self
            .columns
            .iter()
            .map(ColumnMetadata::to_column_def)
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(TupleSchema::new(columns))
    }
}

struct TableEntry {
    name: String,
    primary_key: String,
    file: Arc<dyn DbFile>,
}

#[derive(Default)]
struct CatalogInner {
    tables: AHashMap<TableId, TableEntry>,
    names: AHashMap<String, TableId>,
}

/// Registry resolving table ids and names to their backing files and schemas
#[derive(Default)]
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` under `name`; an existing entry with the same name or id is replaced
    pub fn add_table(&self, file: Arc<dyn DbFile>, name: &str, primary_key: &str) {
        let mut inner = self.inner.write();
        let id = file.id();

        if let Some(old_id) = inner.names.remove(name) {
            inner.tables.remove(&old_id);
        }
        if let Some(old) = inner.tables.remove(&id) {
            inner.names.remove(&old.name);
        }

        inner.names.insert(name.to_string(), id);
        inner.tables.insert(
            id,
            TableEntry {
                name: name.to_string(),
                primary_key: primary_key.to_string(),
                file,
            },
        );
    }

    pub fn table_id(&self, name: &str) -> DbResult<TableId> {
        self.inner
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| DbError::NoSuchTable(name.to_string()))
    }

    pub fn database_file(&self, table_id: TableId) -> DbResult<Arc<dyn DbFile>> {
        self.with_entry(table_id, |entry| Arc::clone(&entry.file))
    }

    pub fn tuple_schema(&self, table_id: TableId) -> DbResult<Arc<TupleSchema>> {
        self.with_entry(table_id, |entry| Arc::clone(entry.file.schema()))
    }

    pub fn table_name(&self, table_id: TableId) -> DbResult<String> {
        self.with_entry(table_id, |entry| entry.name.clone())
    }

    pub fn primary_key(&self, table_id: TableId) -> DbResult<String> {
        self.with_entry(table_id, |entry| entry.primary_key.clone())
    }

    /// Registered table ids in ascending order
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.inner.read().tables.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.tables.clear();
        inner.names.clear();
    }

    /// Load every table listed in a JSON catalog file, returning their ids in file order
    pub fn load_schema<P: AsRef<Path>>(
        &self,
        path: P,
        config: &StorageConfig,
    ) -> DbResult<Vec<TableId>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(CatalogError::from)?;
        let tables: Vec<TableMetadata> =
            serde_json::from_str(&content).map_err(CatalogError::from)?;

        let mut seen = Vec::with_capacity(tables.len());
        for table in &tables {
            if seen.contains(&table.name.as_str()) {
                return Err(CatalogError::DuplicateTable(table.name.clone()).into());
            }
            seen.push(table.name.as_str());
        }

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut ids = Vec::with_capacity(tables.len());
        for table in &tables {
            let schema = Arc::new(table.schema()?);
            let heap_file = HeapFile::open(base_dir.join(&table.file), schema, config.page_size)?;
            let id = heap_file.id();
            self.add_table(Arc::new(heap_file), &table.name, &table.primary_key);
            ids.push(id);
        }
        Ok(ids)
    }

    fn with_entry<T>(&self, table_id: TableId, f: impl FnOnce(&TableEntry) -> T) -> DbResult<T> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(f)
            .ok_or(DbError::UnknownTable(table_id))
    }
}
