use std::fmt;
use std::sync::Arc;

use super::error::{RecordError, RecordResult};
use super::schema::TupleSchema;
use super::value::Value;
use crate::file::PageId;

/// Slot identifier within a page
pub type SlotId = usize;

/// Physical location of a tuple (page + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot_id)
    }
}

/// A row of typed values, optionally placed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    schema: Arc<TupleSchema>,
    values: Vec<Value>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create an unplaced tuple, checking the values against `schema`
    pub fn new(schema: Arc<TupleSchema>, values: Vec<Value>) -> RecordResult<Self> {
        schema.validate_values(&values)?;
        Ok(Self {
            schema,
            values,
            record_id: None,
        })
    }

    pub fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    /// Get all values
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get a value by index
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Replace a value, keeping the tuple valid for its schema
    pub fn set(&mut self, idx: usize, value: Value) -> RecordResult<()> {
        let column = self.schema.column(idx).ok_or_else(|| {
            RecordError::InvalidRecord(format!(
                "Column index {} out of range for {} columns",
                idx,
                self.schema.column_count()
            ))
        })?;
        value.check(&column.data_type)?;
        self.values[idx] = value;
        Ok(())
    }

    /// Current location, `None` while unplaced
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Append this tuple's fields, in schema order, to `out`
    pub fn serialize_into(&self, out: &mut Vec<u8>) -> RecordResult<()> {
        for (value, col) in self.values.iter().zip(self.schema.columns()) {
            value.serialize_into(&col.data_type, out)?;
        }
        Ok(())
    }

    /// Parse one tuple from exactly `schema.record_size()` bytes
    pub fn deserialize(data: &[u8], schema: &Arc<TupleSchema>) -> RecordResult<Self> {
        if data.len() != schema.record_size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes, got {}",
                schema.record_size(),
                data.len()
            )));
        }

        let mut offset = 0;
        let mut values = Vec::with_capacity(schema.column_count());
        for col in schema.columns() {
            let col_size = col.size();
            values.push(Value::deserialize(
                &data[offset..offset + col_size],
                &col.data_type,
            )?);
            offset += col_size;
        }

        Ok(Self {
            schema: Arc::clone(schema),
            values,
            record_id: None,
        })
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", fields.join("\t"))
    }
}
