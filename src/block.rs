use std::mem;

use crate::align;

/// Bytes charged in front of every payload: a size word, a flag word and a
/// link word, rounded up to the arena alignment.
pub const HEADER_SIZE: usize = align!(3 * mem::size_of::<usize>());

/// Descriptor of one span of the arena.
///
/// Offsets are relative to the start of the region. The payload starts
/// `HEADER_SIZE` bytes after `offset`, and `next` holds the offset of the
/// following block, or `None` for the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub offset: usize,
  pub size: usize,
  pub is_free: bool,
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    offset: usize,
    size: usize,
    is_free: bool,
    next: Option<usize>,
  ) -> Self {
    Self {
      offset,
      size,
      is_free,
      next,
    }
  }

  #[inline]
  pub const fn payload_offset(&self) -> usize {
    self.offset + HEADER_SIZE
  }

  /// Offset one past the last payload byte, where the next header begins.
  #[inline]
  pub const fn end(&self) -> usize {
    self.payload_offset() + self.size
  }

  /// Header plus payload.
  #[inline]
  pub const fn span(&self) -> usize {
    HEADER_SIZE + self.size
  }
}
