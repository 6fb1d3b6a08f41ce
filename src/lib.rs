//! Membank: a fixed-size linear memory region under explicit allocation control
//!
//! `membank-rs` simulates a contiguous memory region managed by a first-fit
//! allocator with manual defragmentation. It models allocator mechanics
//! without touching real hardware memory:
//!
//! - **First-fit allocation**: the lowest-offset free run that fits wins
//! - **Opaque handles**: monotonically increasing, stable across relocation,
//!   never reused after free
//! - **Manual compaction**: live blocks pack to the front on request,
//!   payloads and handles preserved; the allocator never compacts implicitly
//! - **Bounds-checked access**: reads and writes are validated against the
//!   addressed block, not just the region
//! - **Derived occupancy**: the block table is the single source of truth;
//!   the free-space view and the rendering are computed from it
//! - **Whole-region locking**: one exclusive lock serializes every operation
//!
//! ## Quick Start
//!
//! ```
//! use membank_rs::{MemBankError, MemoryManager};
//!
//! # fn main() -> membank_rs::Result<()> {
//! // Five one-cell blocks fill the region
//! let manager = MemoryManager::new(5)?;
//! let blocks: Vec<_> = (0..5).map(|_| manager.alloc(1)).collect::<Result<_, _>>()?;
//! assert_eq!(manager.snapshot(), "XXXXX");
//!
//! // Freeing two of them leaves holes too small for a two-cell request
//! manager.free(blocks[1])?;
//! manager.free(blocks[3])?;
//! assert_eq!(manager.snapshot(), "X-X-X");
//! assert!(matches!(manager.alloc(2), Err(MemBankError::OutOfMemory { .. })));
//!
//! // Compaction packs the survivors; the request now fits
//! manager.defragment();
//! assert_eq!(manager.snapshot(), "XXX--");
//! let wide = manager.alloc(2)?;
//! manager.write(wide, 0, b"ok")?;
//! assert_eq!(manager.snapshot(), "XXXok");
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod error;
pub mod manager;
pub mod region;

// Re-export commonly used types
pub use block::{BlockHandle, BlockInfo, Span};
pub use error::{MemBankError, Result};
pub use manager::MemoryManager;
pub use region::{Region, RegionStats, FREE_MARK, OCCUPIED_MARK};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
