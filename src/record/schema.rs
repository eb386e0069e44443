use std::fmt;

use super::error::{RecordError, RecordResult};
use super::value::{DataType, Value};

/// Column definition: a field name and its type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Get the size of this column in bytes
    pub fn size(&self) -> usize {
        self.data_type.size()
    }
}

/// Ordered row layout shared by every tuple on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleSchema {
    columns: Vec<ColumnDef>,
    record_size: usize,
}

impl TupleSchema {
    /// Create a new tuple schema
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        let record_size = columns
            .iter()
            .fold(0usize, |total, c| total.saturating_add(c.size()));
        Self {
            columns,
            record_size,
        }
    }

    /// Schema with generated column names `f0, f1, ...`
    pub fn from_types(types: &[DataType]) -> Self {
        Self::new(
            types
                .iter()
                .enumerate()
                .map(|(i, dt)| ColumnDef::new(format!("f{}", i), *dt))
                .collect(),
        )
    }

    /// Get all columns
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Get column count
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a specific column
    pub fn column(&self, idx: usize) -> Option<&ColumnDef> {
        self.columns.get(idx)
    }

    /// Find column index by name
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column types in order
    pub fn types(&self) -> impl Iterator<Item = &DataType> + '_ {
        self.columns.iter().map(|c| &c.data_type)
    }

    /// Get total record size in bytes
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Get the byte offset of a column within a record
    pub fn column_offset(&self, col_idx: usize) -> usize {
        self.columns[..col_idx]
            .iter()
            .fold(0usize, |total, c| total.saturating_add(c.size()))
    }

    /// Two schemas are compatible when their type sequences match; names are ignored
    pub fn is_compatible(&self, other: &TupleSchema) -> bool {
        self.columns.len() == other.columns.len() && self.types().eq(other.types())
    }

    /// Validate values against this schema
    pub fn validate_values(&self, values: &[Value]) -> RecordResult<()> {
        if values.len() != self.columns.len() {
            return Err(RecordError::SchemaMismatch(format!(
                "Expected {} columns, got {}",
                self.columns.len(),
                values.len()
            )));
        }

        for (value, col) in values.iter().zip(&self.columns) {
            value.check(&col.data_type)?;
        }

        Ok(())
    }
}

impl fmt::Display for TupleSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{}({})", c.data_type, c.name))
            .collect();
        write!(f, "{}", fields.join(", "))
    }
}
