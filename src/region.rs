use std::{
  io,
  ptr::{self, NonNull},
  slice,
};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};
use tracing::{info, warn};

use crate::error::{ArenaError, ArenaResult};

/// One contiguous read/write mapping obtained from the OS.
///
/// The mapping is private and anonymous, so its pages start zeroed and are
/// handed back with `munmap` when the region is dropped.
pub struct Region {
  base: NonNull<u8>,
  size: usize,
}

// SAFETY: the region exclusively owns its mapping; no other handle to it
// exists, so moving it to another thread moves the only owner.
unsafe impl Send for Region {}

impl Region {
  pub fn reserve(size: usize) -> ArenaResult<Self> {
    let address = unsafe {
      mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      return Err(ArenaError::BackingStoreExhausted {
        size,
        source: io::Error::last_os_error(),
      });
    }

    let Some(base) = NonNull::new(address.cast::<u8>()) else {
      return Err(ArenaError::BackingStoreExhausted {
        size,
        source: io::Error::other("mmap returned a null mapping"),
      });
    };

    info!(base = ?base, size, "arena region reserved");

    Ok(Self { base, size })
  }

  #[inline]
  pub fn size(&self) -> usize {
    self.size
  }

  #[inline]
  pub fn addr(&self) -> usize {
    self.base.as_ptr().addr()
  }

  /// Pointer to the byte at `offset`. `offset` may equal the region size.
  pub fn ptr_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset <= self.size, "offset {offset} past the end of the region");
    unsafe { self.base.add(offset) }
  }

  /// Offset of `ptr` from the region base, if it points inside the region.
  pub fn offset_of(
    &self,
    ptr: NonNull<u8>,
  ) -> Option<usize> {
    ptr
      .as_ptr()
      .addr()
      .checked_sub(self.addr())
      .filter(|offset| *offset <= self.size)
  }

  pub fn contains(
    &self,
    ptr: NonNull<u8>,
  ) -> bool {
    self.offset_of(ptr).is_some_and(|offset| offset < self.size)
  }

  pub fn slice(
    &self,
    offset: usize,
    len: usize,
  ) -> &[u8] {
    self.check_range(offset, len);
    unsafe { slice::from_raw_parts(self.base.as_ptr().add(offset), len) }
  }

  pub fn slice_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> &mut [u8] {
    self.check_range(offset, len);
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr().add(offset), len) }
  }

  fn check_range(
    &self,
    offset: usize,
    len: usize,
  ) {
    let in_bounds = offset.checked_add(len).is_some_and(|end| end <= self.size);
    assert!(in_bounds, "range {offset}+{len} outside a region of {} bytes", self.size);
  }
}

impl Drop for Region {
  fn drop(&mut self) {
    let result = unsafe { munmap(self.base.as_ptr().cast::<c_void>(), self.size) };

    if result != 0 {
      warn!(
        base = ?self.base,
        size = self.size,
        error = %io::Error::last_os_error(),
        "failed to unmap arena region"
      );
    }
  }
}
