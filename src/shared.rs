use std::ptr::NonNull;

use parking_lot::Mutex;

use crate::{arena::Arena, config::ArenaConfig, error::ArenaResult, stats::ArenaStats};

/// An [`Arena`] behind a mutex, for callers that drive it from several threads.
///
/// Every call takes the lock for its whole duration, so operations are
/// serialized exactly as they would be on a single thread.
pub struct SharedArena {
  inner: Mutex<Arena>,
}

impl SharedArena {
  pub fn new(config: ArenaConfig) -> ArenaResult<Self> {
    Ok(Self::from(Arena::new(config)?))
  }

  pub fn allocate(
    &self,
    size: usize,
  ) -> ArenaResult<NonNull<u8>> {
    self.inner.lock().allocate(size)
  }

  pub fn release(
    &self,
    ptr: Option<NonNull<u8>>,
  ) -> ArenaResult<()> {
    self.inner.lock().release(ptr)
  }

  pub fn stats(&self) -> ArenaStats {
    self.inner.lock().stats()
  }

  /// Runs `f` with the lock held.
  pub fn with_arena<R>(
    &self,
    f: impl FnOnce(&mut Arena) -> R,
  ) -> R {
    f(&mut *self.inner.lock())
  }

  pub fn into_inner(self) -> Arena {
    self.inner.into_inner()
  }
}

impl From<Arena> for SharedArena {
  fn from(arena: Arena) -> Self {
    Self {
      inner: Mutex::new(arena),
    }
  }
}
