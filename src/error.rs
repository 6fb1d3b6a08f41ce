use crate::block::BlockHandle;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemBankError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Out of memory: no contiguous run of {requested} free cells (defragmenting may reclaim space)")]
    OutOfMemory { requested: usize },

    #[error("Unknown block handle: {0}")]
    UnknownHandle(BlockHandle),

    #[error("Range [{offset}, {end}) is out of bounds for a block of {size} cells")]
    OutOfBounds {
        offset: usize,
        end: usize,
        size: usize,
    },

    #[error("Data exceeds block capacity: {requested} bytes, but only {available} cells left at offset {offset}")]
    CapacityExceeded {
        offset: usize,
        requested: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, MemBankError>;
