use crate::{
  align::ALIGNMENT,
  block::HEADER_SIZE,
  error::{ArenaError, ArenaResult},
};

/// Default region size: 1 MiB.
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Settings fixed when an arena is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
  /// Total bytes reserved from the OS, headers included.
  pub capacity: usize,
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
    }
  }
}

impl ArenaConfig {
  pub fn with_capacity(
    mut self,
    capacity: usize,
  ) -> Self {
    self.capacity = capacity;
    self
  }

  /// Smallest region that still fits one header and one alignment unit.
  pub const fn min_capacity() -> usize {
    HEADER_SIZE + ALIGNMENT
  }

  pub fn validate(&self) -> ArenaResult<()> {
    if self.capacity < Self::min_capacity() {
      return Err(ArenaError::InvalidConfig(format!(
        "capacity {} is below the minimum of {} bytes",
        self.capacity,
        Self::min_capacity()
      )));
    }

    if self.capacity % ALIGNMENT != 0 {
      return Err(ArenaError::InvalidConfig(format!(
        "capacity {} is not a multiple of {ALIGNMENT}",
        self.capacity
      )));
    }

    Ok(())
  }
}
