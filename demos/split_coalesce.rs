use std::{process, ptr::NonNull};

use arenalloc::{Arena, ArenaConfig, ArenaError};
use clap::{ArgAction, Parser};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "split_coalesce")]
#[command(about = "Allocates three blocks and frees them middle, first, last")]
struct Args {
  /// Raise the log level (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

impl Args {
  fn log_level(&self) -> Level {
    match self.verbose {
      0 => Level::WARN,
      1 => Level::INFO,
      2 => Level::DEBUG,
      _ => Level::TRACE,
    }
  }
}

fn allocate(
  arena: &mut Arena,
  label: &str,
  size: usize,
) -> NonNull<u8> {
  match arena.allocate(size) {
    Ok(ptr) => {
      println!("[MALLOC] {label} = {size} bytes at {ptr:?}");
      println!("{arena}");
      ptr
    }
    Err(err @ ArenaError::BackingStoreExhausted { .. }) => {
      eprintln!("{err}");
      process::exit(1);
    }
    Err(err) => {
      eprintln!("[MALLOC FAIL] {label}: {err}");
      process::exit(2);
    }
  }
}

fn release(
  arena: &mut Arena,
  label: &str,
  ptr: NonNull<u8>,
) {
  if let Err(err) = arena.release(Some(ptr)) {
    eprintln!("[FREE FAIL] {label}: {err}");
    process::exit(2);
  }

  println!("[FREE] {label} at {ptr:?}");
  println!("{arena}");
}

fn main() {
  let args = Args::parse();

  let subscriber = FmtSubscriber::builder().with_max_level(args.log_level()).finish();
  if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
    eprintln!("Failed to set tracing subscriber: {e}");
    process::exit(1);
  }

  let mut arena = match Arena::new(ArenaConfig::default()) {
    Ok(arena) => arena,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  // Three allocations split the single initial block from the front.
  let a = allocate(&mut arena, "a", 100);
  let b = allocate(&mut arena, "b", 200);
  let c = allocate(&mut arena, "c", 50);

  // Middle first: b sits between two allocated blocks and cannot merge.
  release(&mut arena, "b", b);
  // a merges forward into b.
  release(&mut arena, "a", a);
  // c joins both its neighbours, leaving one block over the whole arena.
  release(&mut arena, "c", c);

  let stats = arena.stats();
  println!(
    "blocks={} free={} largest_free={} capacity={}",
    stats.blocks, stats.free_blocks, stats.largest_free, stats.capacity
  );
}
