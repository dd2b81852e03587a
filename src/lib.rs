//! # arenalloc - A Fixed-Region Free-List Allocator
//!
//! This crate provides a **first-fit free-list allocator** that carves
//! sub-allocations out of one contiguous region reserved from the OS with
//! `mmap(2)`.
//!
//! ## Overview
//!
//! The region is reserved once and never grows. It is tiled by a chain of
//! blocks, free and allocated alike, kept in address order:
//!
//! ```text
//!   Arena Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                           ARENA (1 MiB)                              │
//!   │                                                                      │
//!   │   ┌────┬────────┬────┬──────────────┬────┬──────┬────┬───────────┐   │
//!   │   │ H  │   A    │ H  │   B (free)   │ H  │  C   │ H  │   free    │   │
//!   │   └────┴────────┴────┴──────────────┴────┴──────┴────┴───────────┘   │
//!   │   ▲               ▲                   ▲           ▲                  │
//!   │   │               │                   │           │                  │
//!   │   head ─────────► next ─────────────► next ─────► next ──► none      │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   H = block header (HEADER_SIZE bytes), then the payload.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   arenalloc
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - Block descriptor and header geometry
//!   ├── region     - The mmap'd backing region
//!   ├── arena      - Arena: allocate, release, split, coalesce
//!   ├── config     - ArenaConfig
//!   ├── error      - ArenaError
//!   ├── stats      - ArenaStats snapshot
//!   └── shared     - SharedArena, a mutex-guarded Arena
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use arenalloc::{Arena, ArenaConfig};
//!
//! let mut arena = Arena::new(ArenaConfig::default()).unwrap();
//!
//! let ptr = arena.allocate(100).unwrap();
//! arena.payload_mut(ptr).unwrap()[0] = 42;
//! assert_eq!(arena.payload(ptr).unwrap().len(), 104);
//!
//! arena.release(Some(ptr)).unwrap();
//! assert_eq!(arena.stats().blocks, 1);
//! ```
//!
//! ## How It Works
//!
//! An allocation rounds the request up to 8 bytes and takes the first free
//! block that is large enough. When the leftover can hold a header plus one
//! alignment unit, the block is split:
//!
//! ```text
//!   Split on allocate(100):
//!
//!   before  ┌────┬──────────────────────────────────────────────┐
//!           │ H  │               free (N)                       │
//!           └────┴──────────────────────────────────────────────┘
//!
//!   after   ┌────┬──────────┬────┬──────────────────────────────┐
//!           │ H  │ A (104)  │ H  │   free (N - 104 - H)         │
//!           └────┴──────────┴────┴──────────────────────────────┘
//!                ▲
//!                └── Pointer returned to user
//! ```
//!
//! Releasing a block marks it free and then merges every run of adjacent
//! free blocks in a single pass over the chain, so two free blocks are never
//! left side by side.
//!
//! Block descriptors are kept in a table keyed by header offset rather than
//! written into the region; a payload pointer finds its block by subtracting
//! the header size. Pointers that do not map to an allocated block are
//! rejected with an error instead of corrupting the chain.
//!
//! ## Limitations
//!
//! - **Single-threaded core**: wrap the arena in [`SharedArena`] to share it
//! - **Fixed size**: exhaustion is reported, the region never grows
//! - **Unix-only**: requires `libc` and `mmap`

pub mod align;
mod arena;
mod block;
mod config;
mod error;
mod region;
mod shared;
mod stats;

pub use arena::{Arena, Blocks};
pub use block::{Block, HEADER_SIZE};
pub use config::{ArenaConfig, DEFAULT_CAPACITY};
pub use error::{ArenaError, ArenaResult};
pub use shared::SharedArena;
pub use stats::ArenaStats;
