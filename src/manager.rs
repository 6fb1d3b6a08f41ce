//! Shared memory manager: the lock discipline over the region core
//!
//! One exclusive lock guards the entire region state (occupancy, block table,
//! handle counter). Every public operation acquires it for its full duration,
//! so operations are fully serialized; there is no partial concurrency
//! between operations on different blocks.

use crate::block::{BlockHandle, BlockInfo};
use crate::error::Result;
use crate::region::{Region, RegionStats};
use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, info};

/// Shared front door over a [`Region`]
///
/// Construct once and hand out by reference or `Arc`; all operations take
/// `&self` and serialize on the internal lock. Failed operations leave the
/// region untouched.
///
/// # Examples
///
/// ```
/// use membank_rs::MemoryManager;
///
/// # fn main() -> membank_rs::Result<()> {
/// let manager = MemoryManager::new(5)?;
/// let block = manager.alloc(3)?;
/// manager.write(block, 0, b"abc")?;
/// assert_eq!(manager.read(block, 0, 3)?, b"abc");
/// assert_eq!(manager.snapshot(), "abc--");
/// # Ok(())
/// # }
/// ```
pub struct MemoryManager {
    /// Region capacity, immutable after construction (readable without the lock)
    capacity: usize,

    /// The whole mutable state, behind one exclusive lock
    state: Mutex<Region>,
}

impl MemoryManager {
    /// Create a manager over a fresh region of `capacity` cells
    ///
    /// Fails with `InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let region = Region::new(capacity)?;
        info!("Created memory manager with {} cells", capacity);

        Ok(MemoryManager {
            capacity,
            state: Mutex::new(region),
        })
    }

    /// Total number of cells managed
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocate a contiguous block of `size` cells and return its handle
    ///
    /// First-fit over the free runs, ascending by offset. Fails with
    /// `InvalidArgument` for a zero or oversized request and `OutOfMemory`
    /// when no run is large enough; the allocator never compacts on its own.
    pub fn alloc(&self, size: usize) -> Result<BlockHandle> {
        let handle = self.state.lock().allocate(size)?;
        debug!("Allocated block {} ({} cells)", handle, size);
        Ok(handle)
    }

    /// Free a previously allocated block
    ///
    /// Fails with `UnknownHandle` for handles that were never allocated or
    /// were already freed.
    pub fn free(&self, handle: BlockHandle) -> Result<()> {
        self.state.lock().release(handle)?;
        debug!("Freed block {}", handle);
        Ok(())
    }

    /// Relocate all live blocks to the front of the region
    ///
    /// Handles and payloads are preserved; afterwards the free space is one
    /// trailing contiguous run.
    pub fn defragment(&self) {
        let mut region = self.state.lock();
        region.compact();
        debug!(
            "Defragmented region, largest free run is now {}",
            region.largest_free_run()
        );
    }

    /// Overwrite part of a block's payload
    pub fn write(&self, handle: BlockHandle, offset: usize, data: &[u8]) -> Result<()> {
        self.state.lock().write_at(handle, offset, data)?;
        debug!(
            "Wrote {} bytes to block {} at offset {}",
            data.len(),
            handle,
            offset
        );
        Ok(())
    }

    /// Copy `length` bytes out of a block's payload
    pub fn read(&self, handle: BlockHandle, offset: usize, length: usize) -> Result<Vec<u8>> {
        let data = self.state.lock().read_at(handle, offset, length)?;
        debug!(
            "Read {} bytes from block {} at offset {}",
            data.len(),
            handle,
            offset
        );
        Ok(data)
    }

    /// Render the whole region, one character per cell
    pub fn snapshot(&self) -> String {
        self.state.lock().occupancy()
    }

    /// Point-in-time statistics for the region
    pub fn stats(&self) -> RegionStats {
        self.state.lock().stats()
    }

    /// Describe every live block, ordered by handle
    pub fn blocks(&self) -> Vec<BlockInfo> {
        self.state.lock().block_infos()
    }
}

impl fmt::Display for MemoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snapshot())
    }
}
