use std::ptr::NonNull;

use arenalloc::{Arena, ArenaConfig, ArenaError, Block, HEADER_SIZE, align};
use rand::{Rng, SeedableRng, rngs::StdRng};

const CAPACITY: usize = 64 * 1024;

fn arena(capacity: usize) -> Arena {
  Arena::new(ArenaConfig::default().with_capacity(capacity)).unwrap()
}

/// Checks tiling, conservation, alignment and the no-adjacent-free rule.
fn assert_consistent(
  arena: &Arena,
  after_release: bool,
) {
  let blocks: Vec<Block> = arena.blocks().collect();
  let mut expected_offset = 0;
  let mut total = 0;

  for (i, block) in blocks.iter().enumerate() {
    assert_eq!(block.offset, expected_offset, "gap or overlap before block {i}");
    assert_eq!(block.size % 8, 0, "unaligned block {i}");

    match blocks.get(i + 1) {
      Some(next) => {
        assert_eq!(block.next, Some(next.offset));
        if after_release {
          assert!(!(block.is_free && next.is_free), "adjacent free blocks at {i}");
        }
      }
      None => assert_eq!(block.next, None),
    }

    expected_offset = block.end();
    total += block.span();
  }

  assert_eq!(expected_offset, arena.capacity());
  assert_eq!(total, arena.capacity());
}

fn assert_single_free_block(arena: &Arena) {
  let blocks: Vec<Block> = arena.blocks().collect();

  assert_eq!(blocks, vec![Block::new(0, arena.capacity() - HEADER_SIZE, true, None)]);
}

#[test]
fn test_first_fit_split_scenario() {
  let mut arena = arena(CAPACITY);

  let a = arena.allocate(100).unwrap();
  let b = arena.allocate(200).unwrap();
  let c = arena.allocate(50).unwrap();

  let blocks: Vec<Block> = arena.blocks().collect();
  assert_eq!(blocks.len(), 4);

  assert_eq!(blocks[0].offset, 0);
  assert_eq!(blocks[0].size, 104);
  assert!(!blocks[0].is_free);

  assert_eq!(blocks[1].offset, blocks[0].end());
  assert_eq!(blocks[1].size, 200);
  assert!(!blocks[1].is_free);

  assert_eq!(blocks[2].offset, blocks[1].end());
  assert_eq!(blocks[2].size, 56);
  assert!(!blocks[2].is_free);

  assert!(blocks[3].is_free);
  assert_eq!(blocks[3].span(), CAPACITY - 104 - 200 - 56 - 3 * HEADER_SIZE);

  assert_eq!(b.as_ptr().addr() - a.as_ptr().addr(), 104 + HEADER_SIZE);
  assert_eq!(c.as_ptr().addr() - b.as_ptr().addr(), 200 + HEADER_SIZE);

  arena.release(Some(b)).unwrap();
  assert_consistent(&arena, true);
  arena.release(Some(a)).unwrap();
  assert_consistent(&arena, true);
  arena.release(Some(c)).unwrap();

  assert_single_free_block(&arena);
}

#[test]
fn test_out_of_memory_leaves_chain_unchanged() {
  let mut arena = arena(CAPACITY);
  let held = arena.allocate(512).unwrap();
  let before: Vec<Block> = arena.blocks().collect();

  let result = arena.allocate(CAPACITY - HEADER_SIZE + 1);

  assert!(matches!(result, Err(ArenaError::OutOfMemory { .. })));
  assert_eq!(arena.blocks().collect::<Vec<_>>(), before);

  // Recoverable: state is valid and later requests still succeed.
  arena.release(Some(held)).unwrap();
  assert!(arena.allocate(CAPACITY - HEADER_SIZE).is_ok());
}

#[test]
fn test_round_trip_returns_to_single_block() {
  let mut rng = StdRng::seed_from_u64(0x5eed);
  let mut arena = arena(CAPACITY);

  for _ in 0..500 {
    let size = rng.gen_range(0..=CAPACITY - HEADER_SIZE);
    let ptr = arena.allocate(size).unwrap();

    assert!(arena.payload(ptr).unwrap().len() >= size);

    arena.release(Some(ptr)).unwrap();
    assert_single_free_block(&arena);
  }
}

#[test]
fn test_random_interleaving_keeps_invariants() {
  let mut rng = StdRng::seed_from_u64(42);
  let mut arena = arena(CAPACITY);
  let mut live: Vec<(NonNull<u8>, usize, u8)> = Vec::new();

  for step in 0..5_000u32 {
    let allocate = live.is_empty() || rng.gen_bool(0.55);

    if allocate {
      let size = rng.gen_range(0..2048);
      match arena.allocate(size) {
        Ok(ptr) => {
          let tag = (step % 251) as u8;
          let payload = arena.payload_mut(ptr).unwrap();
          assert!(payload.len() >= size);
          assert!(payload.len() < align!(size) + HEADER_SIZE + 8);
          payload.fill(tag);
          live.push((ptr, size, tag));
          assert_consistent(&arena, false);
        }
        Err(ArenaError::OutOfMemory { requested }) => {
          assert_eq!(requested, size);
          let largest = arena.stats().largest_free;
          assert!(largest < align!(size));
        }
        Err(err) => panic!("unexpected error: {err}"),
      }
    } else {
      let index = rng.gen_range(0..live.len());
      let (ptr, _, tag) = live.swap_remove(index);

      assert!(arena.payload(ptr).unwrap().iter().all(|byte| *byte == tag));

      arena.release(Some(ptr)).unwrap();
      assert_consistent(&arena, true);
    }

    // No overlap: every live payload still holds its own tag.
    if step % 97 == 0 {
      for (ptr, _, tag) in &live {
        assert!(arena.payload(*ptr).unwrap().iter().all(|byte| byte == tag));
      }
    }
  }

  for (ptr, _, _) in live.drain(..) {
    arena.release(Some(ptr)).unwrap();
  }

  assert_single_free_block(&arena);
}

#[test]
fn test_allocated_ranges_are_disjoint_and_in_bounds() {
  let mut rng = StdRng::seed_from_u64(7);
  let mut arena = arena(CAPACITY);
  let mut live = Vec::new();

  while let Ok(ptr) = arena.allocate(rng.gen_range(1..700)) {
    live.push(ptr);
  }

  // The first allocation of a fresh arena sits right after the first header.
  let base = live[0].as_ptr().addr() - HEADER_SIZE;
  let mut ranges: Vec<(usize, usize)> = live
    .iter()
    .map(|ptr| {
      assert!(arena.contains(*ptr));
      let start = ptr.as_ptr().addr();
      (start, start + arena.payload(*ptr).unwrap().len())
    })
    .collect();
  ranges.sort_unstable();

  for pair in ranges.windows(2) {
    assert!(pair[0].1 <= pair[1].0);
  }
  assert_eq!(ranges[0].0, base + HEADER_SIZE);
  assert!(ranges[ranges.len() - 1].1 <= base + CAPACITY);
}

#[test]
fn test_three_way_merge_in_one_release() {
  let mut arena = arena(4096);

  let a = arena.allocate(64).unwrap();
  let b = arena.allocate(64).unwrap();
  let c = arena.allocate(64).unwrap();
  let _guard = arena.allocate(64).unwrap();

  arena.release(Some(a)).unwrap();
  arena.release(Some(c)).unwrap();
  assert_eq!(arena.stats().free_blocks, 3);

  arena.release(Some(b)).unwrap();

  let first = arena.blocks().next().unwrap();
  assert!(first.is_free);
  assert_eq!(first.size, 3 * 64 + 2 * HEADER_SIZE);
  assert_consistent(&arena, true);
}
