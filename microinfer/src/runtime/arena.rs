//! Storage planning and the single backing allocation of an executor.
//!
//! Every storage slot gets a fixed offset in one buffer sized at load time.
//! Nothing is allocated or freed while the graph runs.
use std::collections::HashMap;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::graph::{storage_key, GraphDescription, StorageKey};

/// Slot offsets are aligned to this many bytes.
pub const ARENA_ALIGN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: usize,
    pub size: usize,
}

/// Byte layout of all buffers of a graph.
#[derive(Debug, Clone, Default)]
pub struct StoragePlan {
    slots: Vec<Slot>,
    /// Storage id as written in the description, per slot.
    storage_ids: Vec<Option<usize>>,
    buffer_slot: Vec<usize>,
    buffer_size: Vec<usize>,
    total: usize,
}

impl StoragePlan {
    /// One slot per distinct storage id, sized to the largest buffer that
    /// uses it. Buffers without a storage id get a private slot.
    pub fn plan(graph: &GraphDescription) -> Result<Self> {
        let mut plan = StoragePlan::default();
        let mut slot_of: HashMap<StorageKey, usize> = HashMap::new();
        for buffer in &graph.buffers {
            let size = buffer.byte_size();
            let key = storage_key(graph, buffer.id);
            let slot = *slot_of.entry(key).or_insert_with(|| {
                plan.slots.push(Slot { offset: 0, size: 0 });
                plan.storage_ids.push(buffer.storage_id);
                plan.slots.len() - 1
            });
            plan.slots[slot].size = plan.slots[slot].size.max(size);
            plan.buffer_slot.push(slot);
            plan.buffer_size.push(size);
        }

        let mut cursor = 0usize;
        for slot in &mut plan.slots {
            slot.offset = align_up(cursor).ok_or_else(|| overflow(cursor))?;
            cursor = slot
                .offset
                .checked_add(slot.size)
                .ok_or_else(|| overflow(slot.offset))?;
        }
        plan.total = align_up(cursor).ok_or_else(|| overflow(cursor))?;
        Ok(plan)
    }

    pub fn total_bytes(&self) -> usize {
        self.total
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn storage_id(&self, slot: usize) -> Option<usize> {
        self.storage_ids[slot]
    }

    pub fn slot_of(&self, buffer: usize) -> usize {
        self.buffer_slot[buffer]
    }

    /// Byte range holding `buffer` inside the arena.
    pub fn range(&self, buffer: usize) -> Range<usize> {
        let start = self.slots[self.buffer_slot[buffer]].offset;
        start..start + self.buffer_size[buffer]
    }

    pub fn slot_range(&self, slot: usize) -> Range<usize> {
        let slot = self.slots[slot];
        slot.offset..slot.offset + slot.size
    }
}

fn align_up(value: usize) -> Option<usize> {
    value
        .checked_add(ARENA_ALIGN - 1)
        .map(|v| v & !(ARENA_ALIGN - 1))
}

fn overflow(at: usize) -> Error {
    Error::Allocation {
        requested: at,
        reason: "storage plan overflows usize".to_string(),
    }
}

/// The backing buffer. Stored as 64-bit words so every slot offset is at
/// least 8-byte aligned in memory.
#[derive(Debug, Default)]
pub struct Arena {
    words: Vec<u64>,
    len: usize,
}

impl Arena {
    /// Reserve `bytes` of zeroed memory in one fallible allocation.
    pub fn allocate(bytes: usize, limit: Option<usize>) -> Result<Self> {
        if let Some(limit) = limit {
            if bytes > limit {
                return Err(Error::Allocation {
                    requested: bytes,
                    reason: format!("exceeds arena limit of {} bytes", limit),
                });
            }
        }
        let words_needed = bytes / 8 + usize::from(bytes % 8 != 0);
        let mut words = Vec::new();
        words
            .try_reserve_exact(words_needed)
            .map_err(|err| Error::Allocation {
                requested: bytes,
                reason: err.to_string(),
            })?;
        words.resize(words_needed, 0);
        Ok(Self { words, len: bytes })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.len]
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[..len]
    }

    /// Split the arena around `output` so inputs can be read while the
    /// output is written.
    pub fn split_output(&mut self, output: Range<usize>) -> (SplitArena<'_>, &mut [u8]) {
        let (head, rest) = self.bytes_mut().split_at_mut(output.start);
        let (out, tail) = rest.split_at_mut(output.end - output.start);
        (
            SplitArena {
                head: &*head,
                tail: &*tail,
                out_start: output.start,
                out_end: output.end,
            },
            out,
        )
    }
}

/// Read-only remainder of the arena after the output slot is split off.
#[derive(Debug, Clone, Copy)]
pub struct SplitArena<'a> {
    head: &'a [u8],
    tail: &'a [u8],
    out_start: usize,
    out_end: usize,
}

impl<'a> SplitArena<'a> {
    /// Bytes at `range`, which must not overlap the output slot.
    pub fn get(&self, range: Range<usize>) -> &'a [u8] {
        debug_assert!(
            range.end <= self.out_start || range.start >= self.out_end,
            "input range {:?} overlaps output {}..{}",
            range,
            self.out_start,
            self.out_end
        );
        let (head, tail) = (self.head, self.tail);
        if range.end <= self.out_start {
            &head[range]
        } else {
            &tail[range.start - self.out_end..range.end - self.out_end]
        }
    }
}
