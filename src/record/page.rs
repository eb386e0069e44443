use std::sync::Arc;

use super::error::{RecordError, RecordResult};
use super::record::{RecordId, SlotId, Tuple};
use super::schema::TupleSchema;
use crate::file::PageId;
use crate::transaction::TransactionId;

/// Slot arithmetic for one page size and tuple width
///
/// A page is `[header][slot 0]..[slot n-1][zero padding]`, where header bit `i`
/// (LSB first within each byte) marks slot `i` as occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: usize,
    tuple_size: usize,
    num_slots: usize,
    header_size: usize,
}

impl PageLayout {
    /// Calculate maximum number of slots for a given tuple size
    ///
    /// Each slot costs `tuple_size * 8` bits of data plus one header bit. A tuple
    /// too wide to count in bits gets zero slots.
    pub fn calculate_slot_count(page_size: usize, tuple_size: usize) -> usize {
        let slot_bits = tuple_size.saturating_mul(8).saturating_add(1);
        page_size.saturating_mul(8) / slot_bits
    }

    pub fn new(page_size: usize, tuple_size: usize) -> RecordResult<Self> {
        if tuple_size == 0 {
            return Err(RecordError::InvalidLayout(
                "Tuple size must be positive".to_string(),
            ));
        }

        let num_slots = Self::calculate_slot_count(page_size, tuple_size);
        if num_slots == 0 {
            return Err(RecordError::InvalidLayout(format!(
                "Tuple size {} is too large for page size {}",
                tuple_size, page_size
            )));
        }

        let header_size = num_slots.div_ceil(8);
        let used = num_slots
            .checked_mul(tuple_size)
            .and_then(|body| body.checked_add(header_size));
        if used.is_none_or(|used| used > page_size) {
            return Err(RecordError::InvalidLayout(format!(
                "{} slots of {} bytes overflow a {}-byte page",
                num_slots, tuple_size, page_size
            )));
        }

        Ok(Self {
            page_size,
            tuple_size,
            num_slots,
            header_size,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Trailing zero bytes after the last slot
    pub fn padding(&self) -> usize {
        self.page_size - self.header_size - self.num_slots * self.tuple_size
    }

    fn slot_offset(&self, slot_id: SlotId) -> usize {
        self.header_size + slot_id * self.tuple_size
    }
}

/// One page of a heap file: an occupancy bitmap plus fixed-width tuple slots
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: PageId,
    schema: Arc<TupleSchema>,
    layout: PageLayout,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    before_image: Vec<u8>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// A zero-filled block, which decodes to a page with every slot free
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// An empty page of `page_size` bytes for `schema`
    pub fn new_empty(
        pid: PageId,
        schema: Arc<TupleSchema>,
        page_size: usize,
    ) -> RecordResult<Self> {
        Self::decode(pid, schema, &Self::empty_page_data(page_size))
    }

    /// Parse a page from its on-disk block; the block length is the page size
    ///
    /// Every occupied slot must parse, otherwise the whole page is rejected.
    pub fn decode(pid: PageId, schema: Arc<TupleSchema>, data: &[u8]) -> RecordResult<Self> {
        let layout = PageLayout::new(data.len(), schema.record_size())?;
        let header = data[..layout.header_size].to_vec();

        let mut tuples = Vec::with_capacity(layout.num_slots);
        for slot_id in 0..layout.num_slots {
            if !bit_is_set(&header, slot_id) {
                tuples.push(None);
                continue;
            }

            let start = layout.slot_offset(slot_id);
            let bytes = &data[start..start + layout.tuple_size];
            let mut tuple = Tuple::deserialize(bytes, &schema).map_err(|e| {
                RecordError::Deserialization(format!("page {} slot {}: {}", pid, slot_id, e))
            })?;
            tuple.set_record_id(Some(RecordId::new(pid, slot_id)));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            pid,
            schema,
            layout,
            header,
            tuples,
            before_image: data.to_vec(),
            dirtied_by: None,
        })
    }

    /// Serialize to exactly `page_size` bytes; `decode(encode(p)) == p`
    pub fn encode(&self) -> RecordResult<Vec<u8>> {
        let mut data = Vec::with_capacity(self.layout.page_size);
        data.extend_from_slice(&self.header);

        for (slot_id, slot) in self.tuples.iter().enumerate() {
            match slot {
                Some(tuple) if self.is_slot_used(slot_id) => tuple.serialize_into(&mut data)?,
                _ => data.resize(data.len() + self.layout.tuple_size, 0),
            }
        }

        data.resize(self.layout.page_size, 0);
        Ok(data)
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn schema(&self) -> &Arc<TupleSchema> {
        &self.schema
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Get the number of slots in this page
    pub fn slot_count(&self) -> usize {
        self.layout.num_slots
    }

    /// Check if a slot is used; slots past the end are never used
    pub fn is_slot_used(&self, slot_id: SlotId) -> bool {
        slot_id < self.layout.num_slots && bit_is_set(&self.header, slot_id)
    }

    /// Count of clear header bits among the first `num_slots` bits
    pub fn free_slot_count(&self) -> usize {
        (0..self.layout.num_slots)
            .filter(|&slot_id| !bit_is_set(&self.header, slot_id))
            .count()
    }

    /// Find the lowest free slot, returns None if page is full
    pub fn find_free_slot(&self) -> Option<SlotId> {
        (0..self.layout.num_slots).find(|&slot_id| !bit_is_set(&self.header, slot_id))
    }

    pub fn is_full(&self) -> bool {
        self.find_free_slot().is_none()
    }

    /// The tuple stored at `slot_id`, if the slot is occupied
    pub fn tuple(&self, slot_id: SlotId) -> Option<&Tuple> {
        if !self.is_slot_used(slot_id) {
            return None;
        }
        self.tuples[slot_id].as_ref()
    }

    /// Place `tuple` in the lowest free slot and record its new location on it
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> RecordResult<RecordId> {
        if !self.schema.is_compatible(tuple.schema()) {
            return Err(RecordError::SchemaMismatch(format!(
                "page {} holds ({}), tuple has ({})",
                self.pid,
                self.schema,
                tuple.schema()
            )));
        }

        let slot_id = self
            .find_free_slot()
            .ok_or(RecordError::PageFull(self.pid))?;
        let rid = RecordId::new(self.pid, slot_id);

        set_bit(&mut self.header, slot_id, true);
        tuple.set_record_id(Some(rid));
        self.tuples[slot_id] = Some(tuple.clone());

        Ok(rid)
    }

    /// Free the slot named by `tuple`'s location and mark the tuple unplaced
    pub fn delete_tuple(&mut self, tuple: &mut Tuple) -> RecordResult<()> {
        let rid = tuple.record_id().ok_or(RecordError::NotPlaced)?;
        if rid.page_id != self.pid {
            return Err(RecordError::NotOnPage {
                page_id: self.pid,
                location: rid.to_string(),
            });
        }
        if rid.slot_id >= self.layout.num_slots {
            return Err(RecordError::InvalidSlot(self.pid, rid.slot_id));
        }
        if !bit_is_set(&self.header, rid.slot_id) {
            return Err(RecordError::SlotEmpty(self.pid, rid.slot_id));
        }

        set_bit(&mut self.header, rid.slot_id, false);
        self.tuples[rid.slot_id] = None;
        tuple.set_record_id(None);

        Ok(())
    }

    /// Set or clear the dirty flag, remembering who wrote the page last
    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtied_by = if dirty { Some(tid) } else { None };
    }

    /// The last writer if the page is dirty, `None` if clean
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    /// The page as it was when last loaded or snapshotted
    pub fn before_image(&self) -> RecordResult<HeapPage> {
        HeapPage::decode(self.pid, Arc::clone(&self.schema), &self.before_image)
    }

    /// Snapshot the current contents as the new before image
    pub fn set_before_image(&mut self) -> RecordResult<()> {
        self.before_image = self.encode()?;
        Ok(())
    }

    /// Occupied slots' tuples in slot order, derived fresh on each call
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> + '_ {
        self.tuples
            .iter()
            .enumerate()
            .filter(|(slot_id, _)| self.is_slot_used(*slot_id))
            .filter_map(|(_, slot)| slot.as_ref())
    }
}

impl PartialEq for HeapPage {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
            && self.header == other.header
            && self.schema.is_compatible(&other.schema)
            && self.iter().eq(other.iter())
    }
}

fn bit_is_set(bitmap: &[u8], idx: usize) -> bool {
    bitmap
        .get(idx / 8)
        .is_some_and(|byte| byte & (1 << (idx % 8)) != 0)
}

fn set_bit(bitmap: &mut [u8], idx: usize, value: bool) {
    if value {
        bitmap[idx / 8] |= 1 << (idx % 8);
    } else {
        bitmap[idx / 8] &= !(1 << (idx % 8));
    }
}
