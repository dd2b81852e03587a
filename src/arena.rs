use std::{collections::HashMap, fmt, ptr::NonNull};

use tracing::{debug, trace, warn};

use crate::{
  align::{ALIGNMENT, checked_align},
  block::{Block, HEADER_SIZE},
  config::ArenaConfig,
  error::{ArenaError, ArenaResult},
  region::Region,
  stats::ArenaStats,
};

/// A first-fit heap carved out of a single fixed-size region.
///
/// The region is reserved from the OS on the first allocation (or an explicit
/// [`Arena::initialize`]) and is never grown. Blocks tile it without gaps:
/// each one costs [`HEADER_SIZE`] bytes plus its payload, and the chain keeps
/// free and allocated blocks in address order.
///
/// Block descriptors live in a side table keyed by header offset, so a
/// payload pointer maps back to its block by subtracting the header size.
pub struct Arena {
  config: ArenaConfig,
  region: Option<Region>,
  blocks: HashMap<usize, Block>,
  head: Option<usize>,
}

impl Arena {
  /// Creates an arena. Nothing is reserved until the first allocation.
  pub fn new(config: ArenaConfig) -> ArenaResult<Self> {
    config.validate()?;

    Ok(Self {
      config,
      region: None,
      blocks: HashMap::new(),
      head: None,
    })
  }

  /// Creates an arena and reserves its region right away.
  pub fn reserve(config: ArenaConfig) -> ArenaResult<Self> {
    let mut arena = Self::new(config)?;
    arena.initialize()?;
    Ok(arena)
  }

  /// Reserves the region and lays a single free block over all of it.
  ///
  /// Does nothing when the region already exists.
  pub fn initialize(&mut self) -> ArenaResult<()> {
    if self.region.is_some() {
      return Ok(());
    }

    let region = Region::reserve(self.config.capacity)?;
    let first = Block::new(0, region.size() - HEADER_SIZE, true, None);

    debug!(size = first.size, "initial free block");

    self.blocks.insert(first.offset, first);
    self.head = Some(first.offset);
    self.region = Some(region);

    Ok(())
  }

  #[inline]
  pub fn is_initialized(&self) -> bool {
    self.region.is_some()
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.config.capacity
  }

  /// Hands out a payload of at least `size` bytes, rounded up to the alignment.
  ///
  /// Returns [`ArenaError::OutOfMemory`] when no block fits; the chain is left
  /// untouched in that case and a later call may succeed after a release.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> ArenaResult<NonNull<u8>> {
    self.initialize()?;

    let aligned = match checked_align(size) {
      Some(aligned) if aligned <= self.capacity() => aligned,
      _ => return Err(self.out_of_memory(size)),
    };

    let Some(offset) = self.find_free_block(aligned) else {
      return Err(self.out_of_memory(size));
    };

    if self.blocks[&offset].size >= aligned + HEADER_SIZE + ALIGNMENT {
      self.split_block(offset, aligned);
    } else {
      debug!(offset, size = self.blocks[&offset].size, "no split, handing out whole block");
    }

    let block = self.block_mut(offset);
    block.is_free = false;
    let block = *block;

    let ptr = self.payload_ptr(&block);
    debug!(offset, user = ?ptr, size = block.size, "allocation done");
    trace!("\n{self}");

    Ok(ptr)
  }

  /// Returns a block to the free pool and merges neighbouring free blocks.
  ///
  /// `None` is accepted and ignored. Pointers that do not designate an
  /// allocated block of this arena are rejected without touching the chain.
  pub fn release(
    &mut self,
    ptr: Option<NonNull<u8>>,
  ) -> ArenaResult<()> {
    let Some(ptr) = ptr else {
      return Ok(());
    };

    let offset = self.find_block(ptr)?;
    let block = self.block_mut(offset);

    if block.is_free {
      warn!(offset, "rejected release of a free block");
      return Err(ArenaError::DoubleFree { offset });
    }

    block.is_free = true;
    debug!(user = ?ptr, offset, size = block.size, "block released");

    self.coalesce();
    trace!("\n{self}");

    Ok(())
  }

  /// Allocated payload behind `ptr` as a byte slice.
  pub fn payload(
    &self,
    ptr: NonNull<u8>,
  ) -> ArenaResult<&[u8]> {
    let block = self.allocated_block(ptr)?;

    match &self.region {
      Some(region) => Ok(region.slice(block.payload_offset(), block.size)),
      None => Err(invalid_pointer(ptr)),
    }
  }

  /// Allocated payload behind `ptr` as a mutable byte slice.
  pub fn payload_mut(
    &mut self,
    ptr: NonNull<u8>,
  ) -> ArenaResult<&mut [u8]> {
    let block = self.allocated_block(ptr)?;

    match &mut self.region {
      Some(region) => Ok(region.slice_mut(block.payload_offset(), block.size)),
      None => Err(invalid_pointer(ptr)),
    }
  }

  /// Whether `ptr` points inside this arena's region.
  pub fn contains(
    &self,
    ptr: NonNull<u8>,
  ) -> bool {
    self.region.as_ref().is_some_and(|region| region.contains(ptr))
  }

  /// Walks the chain in address order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks {
      arena: self,
      cursor: self.head,
    }
  }

  pub fn stats(&self) -> ArenaStats {
    ArenaStats::collect(self.capacity(), self.blocks())
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<usize> {
    for block in self.blocks() {
      let accepted = block.is_free && block.size >= size;

      trace!(
        offset = block.offset,
        free = block.is_free,
        size = block.size,
        accepted,
        "checking block"
      );

      if accepted {
        return Some(block.offset);
      }
    }

    None
  }

  /// Carves `size` bytes off the front of the block at `offset`; the rest
  /// becomes a new free block linked right after it.
  fn split_block(
    &mut self,
    offset: usize,
    size: usize,
  ) {
    let block = self.block_mut(offset);
    let remainder = Block::new(
      offset + HEADER_SIZE + size,
      block.size - size - HEADER_SIZE,
      true,
      block.next,
    );

    block.size = size;
    block.next = Some(remainder.offset);

    debug!(
      offset,
      new_offset = remainder.offset,
      size,
      new_size = remainder.size,
      "split block"
    );

    self.blocks.insert(remainder.offset, remainder);
  }

  fn coalesce(&mut self) {
    let mut cursor = self.head;

    while let Some(offset) = cursor {
      let current = self.blocks[&offset];

      let Some(next_offset) = current.next else {
        break;
      };

      let next = self.blocks[&next_offset];

      if current.is_free && next.is_free {
        debug!(offset, next_offset, "coalesce");

        self.blocks.remove(&next_offset);
        let block = self.block_mut(offset);
        block.size += next.span();
        block.next = next.next;
      } else {
        cursor = Some(next_offset);
      }
    }
  }

  /// Maps a payload pointer back to the header offset of a known block.
  fn find_block(
    &self,
    ptr: NonNull<u8>,
  ) -> ArenaResult<usize> {
    let offset = self
      .region
      .as_ref()
      .and_then(|region| region.offset_of(ptr))
      .and_then(|payload| payload.checked_sub(HEADER_SIZE))
      .filter(|offset| self.blocks.contains_key(offset));

    offset.ok_or_else(|| {
      warn!(address = ?ptr, "rejected pointer outside the block chain");
      invalid_pointer(ptr)
    })
  }

  fn allocated_block(
    &self,
    ptr: NonNull<u8>,
  ) -> ArenaResult<Block> {
    let block = self.blocks[&self.find_block(ptr)?];

    if block.is_free {
      return Err(invalid_pointer(ptr));
    }

    Ok(block)
  }

  fn block_mut(
    &mut self,
    offset: usize,
  ) -> &mut Block {
    self
      .blocks
      .get_mut(&offset)
      .unwrap_or_else(|| panic!("block chain links to unknown offset {offset}"))
  }

  fn payload_ptr(
    &self,
    block: &Block,
  ) -> NonNull<u8> {
    match &self.region {
      Some(region) => region.ptr_at(block.payload_offset()),
      None => unreachable!("blocks exist only once the region is reserved"),
    }
  }

  fn out_of_memory(
    &self,
    requested: usize,
  ) -> ArenaError {
    warn!(requested, capacity = self.capacity(), "allocation failed: out of memory");
    ArenaError::OutOfMemory { requested }
  }
}

fn invalid_pointer(ptr: NonNull<u8>) -> ArenaError {
  ArenaError::InvalidPointer {
    address: ptr.as_ptr().addr(),
  }
}

/// Iterator over the block chain, see [`Arena::blocks`].
pub struct Blocks<'a> {
  arena: &'a Arena,
  cursor: Option<usize>,
}

impl Iterator for Blocks<'_> {
  type Item = Block;

  fn next(&mut self) -> Option<Self::Item> {
    let block = *self.arena.blocks.get(&self.cursor?)?;
    self.cursor = block.next;
    Some(block)
  }
}

/// Block list journal, one line per block.
impl fmt::Display for Arena {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let Some(region) = &self.region else {
      return writeln!(f, "[BLOCK LIST] arena not reserved");
    };

    writeln!(f, "[BLOCK LIST]")?;

    for (i, block) in self.blocks().enumerate() {
      let next = match block.next {
        Some(next) => format!("{:#x}", region.addr() + next),
        None => String::from("none"),
      };

      writeln!(
        f,
        "Block {i} | header={:#x} | user={:#x} | size={} | free={} | next={next}",
        region.addr() + block.offset,
        region.addr() + block.payload_offset(),
        block.size,
        u8::from(block.is_free),
      )?;
    }

    Ok(())
  }
}

impl fmt::Debug for Arena {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Arena")
      .field("capacity", &self.capacity())
      .field("initialized", &self.is_initialized())
      .field("blocks", &self.blocks().collect::<Vec<_>>())
      .finish()
  }
}
