use crate::block::Block;

/// Snapshot of how an arena is carved up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
  pub capacity: usize,
  pub blocks: usize,
  pub free_blocks: usize,
  pub allocated_blocks: usize,
  /// Payload bytes in free blocks, headers excluded.
  pub free_bytes: usize,
  /// Payload bytes in allocated blocks, headers excluded.
  pub allocated_bytes: usize,
  pub largest_free: usize,
}

impl ArenaStats {
  pub fn collect(
    capacity: usize,
    blocks: impl Iterator<Item = Block>,
  ) -> Self {
    let mut stats = Self {
      capacity,
      ..Self::default()
    };

    for block in blocks {
      stats.blocks += 1;

      if block.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.allocated_blocks += 1;
        stats.allocated_bytes += block.size;
      }
    }

    stats
  }

  /// Bytes spent on block headers.
  pub fn overhead(&self) -> usize {
    self
      .capacity
      .saturating_sub(self.free_bytes)
      .saturating_sub(self.allocated_bytes)
  }
}
