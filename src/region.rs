//! Unlocked allocator core: block table, first-fit search, compaction
//!
//! `Region` owns the block table, which is the single source of truth for
//! occupancy. The free-space view is derived from the table on demand:
//! - First-fit allocation walks the derived free spans in ascending order
//! - Compaction packs live blocks to the front, preserving handles and data
//! - Reads and writes are bounds-checked against the addressed block only
//!
//! `Region` does no locking; [`crate::manager::MemoryManager`] provides the
//! exclusive-lock discipline on top.

use crate::block::{Block, BlockHandle, BlockInfo, Span};
use crate::error::{MemBankError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker for a free cell in the occupancy rendering
pub const FREE_MARK: char = '-';

/// Marker for an occupied cell whose payload byte has no graphic form
pub const OCCUPIED_MARK: char = 'X';

/// Fixed-size linear memory region with a first-fit block allocator
///
/// Blocks are tracked in a `BTreeMap` keyed by handle, so iteration order is
/// deterministic. Handles start at 1 and are never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Total number of cells, fixed at construction
    capacity: usize,

    /// Live blocks keyed by their opaque handle
    blocks: BTreeMap<BlockHandle, Block>,

    /// Next handle value, incremented on every successful allocation
    next_handle: u64,
}

impl Region {
    /// Create an empty region of `capacity` cells
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MemBankError::InvalidArgument(
                "region capacity must be positive".to_string(),
            ));
        }

        Ok(Region {
            capacity,
            blocks: BTreeMap::new(),
            next_handle: 1,
        })
    }

    /// Total number of cells managed
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live blocks in the table
    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of cells covered by live blocks
    pub fn used_cells(&self) -> usize {
        self.blocks.values().map(|b| b.size).sum()
    }

    /// Number of free cells (not necessarily contiguous)
    pub fn free_cells(&self) -> usize {
        self.capacity - self.used_cells()
    }

    /// Live spans ordered by start offset
    fn live_spans(&self) -> Vec<Span> {
        let mut spans: Vec<Span> = self.blocks.values().map(Block::span).collect();
        spans.sort_unstable_by_key(|s| s.start);
        spans
    }

    /// Free spans ordered by start offset
    ///
    /// The gaps between consecutive live spans, plus the leading and trailing
    /// runs. An empty region yields one span covering everything.
    pub fn free_spans(&self) -> Vec<Span> {
        let mut free = Vec::new();
        let mut cursor = 0;

        for span in self.live_spans() {
            if span.start > cursor {
                free.push(Span::new(cursor, span.start - cursor));
            }
            cursor = span.end();
        }

        if cursor < self.capacity {
            free.push(Span::new(cursor, self.capacity - cursor));
        }

        free
    }

    /// Length of the largest contiguous free run
    pub fn largest_free_run(&self) -> usize {
        self.free_spans().iter().map(|s| s.len).max().unwrap_or(0)
    }

    /// Allocate a contiguous block of `size` cells
    ///
    /// First-fit: the lowest-offset free run that can hold `size` cells wins.
    /// The new block's payload is zero-filled.
    pub fn allocate(&mut self, size: usize) -> Result<BlockHandle> {
        if size == 0 || size > self.capacity {
            return Err(MemBankError::InvalidArgument(format!(
                "allocation size must be between 1 and {}, got {}",
                self.capacity, size
            )));
        }

        // free_spans is ascending by start, so the first fit is the lowest offset
        let start = match self.free_spans().into_iter().find(|s| s.len >= size) {
            Some(span) => span.start,
            None => {
                tracing::warn!(
                    "No contiguous run of {} free cells ({} free in {} runs)",
                    size,
                    self.free_cells(),
                    self.free_spans().len()
                );
                return Err(MemBankError::OutOfMemory { requested: size });
            }
        };

        let handle = BlockHandle::new(self.next_handle);
        self.next_handle += 1;
        self.blocks.insert(handle, Block::new(start, size));

        Ok(handle)
    }

    /// Remove a block from the table, freeing its cells
    ///
    /// Never-allocated and already-freed handles fail the same way. Freed
    /// runs are not merged; compaction is the only defragmentation pass.
    pub fn release(&mut self, handle: BlockHandle) -> Result<()> {
        match self.blocks.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(MemBankError::UnknownHandle(handle)),
        }
    }

    /// Pack all live blocks to the front of the region
    ///
    /// Blocks are relocated in ascending order of their current start offset.
    /// Handles, sizes and payloads are unchanged; only `start` moves. After
    /// compaction the free space is a single trailing run.
    pub fn compact(&mut self) {
        let mut entries: Vec<(BlockHandle, Block)> =
            std::mem::take(&mut self.blocks).into_iter().collect();
        entries.sort_unstable_by_key(|(_, block)| block.start);

        let mut cursor = 0;
        for (_, block) in entries.iter_mut() {
            block.start = cursor;
            cursor += block.size;
        }

        self.blocks = entries.into_iter().collect();
    }

    /// Overwrite `data.len()` bytes of a block's payload starting at `offset`
    ///
    /// Cells outside the written range keep their contents. An empty `data`
    /// is a no-op, but the offset must still address a cell of the block.
    pub fn write_at(&mut self, handle: BlockHandle, offset: usize, data: &[u8]) -> Result<()> {
        let block = self
            .blocks
            .get_mut(&handle)
            .ok_or(MemBankError::UnknownHandle(handle))?;

        if offset >= block.size {
            return Err(MemBankError::OutOfBounds {
                offset,
                end: offset.saturating_add(data.len()),
                size: block.size,
            });
        }

        let available = block.size - offset;
        if data.len() > available {
            return Err(MemBankError::CapacityExceeded {
                offset,
                requested: data.len(),
                available,
            });
        }

        block.data[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy `length` bytes out of a block's payload starting at `offset`
    ///
    /// The range must lie within the block itself; being in-bounds for the
    /// whole region is not enough.
    pub fn read_at(&self, handle: BlockHandle, offset: usize, length: usize) -> Result<Vec<u8>> {
        let block = self
            .blocks
            .get(&handle)
            .ok_or(MemBankError::UnknownHandle(handle))?;

        if length == 0 {
            return Err(MemBankError::InvalidArgument(
                "read length must be positive".to_string(),
            ));
        }

        if offset >= block.size || length > block.size - offset {
            return Err(MemBankError::OutOfBounds {
                offset,
                end: offset.saturating_add(length),
                size: block.size,
            });
        }

        Ok(block.data[offset..offset + length].to_vec())
    }

    /// Render the whole region, one character per cell
    ///
    /// Free cells render as [`FREE_MARK`]. Occupied cells render as their
    /// payload byte when it is graphic ASCII, else as [`OCCUPIED_MARK`]
    /// (zero-filled fresh allocations therefore render as `X`).
    pub fn occupancy(&self) -> String {
        let mut cells = vec![FREE_MARK; self.capacity];

        for block in self.blocks.values() {
            for (i, &byte) in block.data.iter().enumerate() {
                cells[block.start + i] = if byte.is_ascii_graphic() {
                    byte as char
                } else {
                    OCCUPIED_MARK
                };
            }
        }

        cells.into_iter().collect()
    }

    /// Fragmentation of the free space
    ///
    /// 0.0 when the free space is a single run (or there is none); approaches
    /// 1.0 as every free cell becomes its own run.
    pub fn fragmentation_score(&self) -> f64 {
        let spans = self.free_spans();
        if spans.is_empty() {
            return 0.0;
        }

        let free_cells: usize = spans.iter().map(|s| s.len).sum();
        (spans.len() as f64 - 1.0) / (free_cells as f64).max(1.0)
    }

    /// Describe every live block, ordered by handle
    pub fn block_infos(&self) -> Vec<BlockInfo> {
        self.blocks
            .iter()
            .map(|(&handle, block)| BlockInfo {
                handle,
                start: block.start,
                size: block.size,
            })
            .collect()
    }

    /// Point-in-time statistics for the region
    pub fn stats(&self) -> RegionStats {
        let spans = self.free_spans();
        let free_cells: usize = spans.iter().map(|s| s.len).sum();

        RegionStats {
            capacity: self.capacity,
            live_blocks: self.blocks.len(),
            used_cells: self.capacity - free_cells,
            free_cells,
            free_runs: spans.len(),
            largest_free_run: spans.iter().map(|s| s.len).max().unwrap_or(0),
            fragmentation: self.fragmentation_score(),
        }
    }
}

/// Statistics about region usage and fragmentation
#[derive(Debug, Clone, Serialize)]
pub struct RegionStats {
    pub capacity: usize,
    pub live_blocks: usize,
    pub used_cells: usize,
    pub free_cells: usize,
    pub free_runs: usize,
    pub largest_free_run: usize,
    pub fragmentation: f64,
}
