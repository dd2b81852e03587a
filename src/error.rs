//! # Arena Error Types

use std::io;

use thiserror::Error;

/// Errors surfaced by the arena allocator.
#[derive(Error, Debug)]
pub enum ArenaError {
  /// The host refused to map the backing region.
  #[error("backing store exhausted: could not reserve {size} bytes")]
  BackingStoreExhausted {
    /// Size of the region that was requested.
    size: usize,
    /// OS error reported by the mapping call.
    #[source]
    source: io::Error,
  },

  /// No block in the chain is large enough for the request.
  #[error("out of memory: no free block can hold {requested} bytes")]
  OutOfMemory {
    /// Size the caller asked for, before alignment.
    requested: usize,
  },

  /// The pointer does not designate a block of this arena.
  #[error("invalid pointer {address:#x}: not a block of this arena")]
  InvalidPointer {
    /// Address that was passed in.
    address: usize,
  },

  /// The block behind the pointer is already free.
  #[error("double free of block at offset {offset}")]
  DoubleFree {
    /// Header offset of the block.
    offset: usize,
  },

  /// Rejected configuration.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
