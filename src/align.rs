/// Byte boundary every payload size is rounded up to.
pub const ALIGNMENT: usize = 8;

/// Rounds the given size up to the arena [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use arenalloc::align;
///
/// assert_eq!(align!(0), 0);
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(100), 104);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::ALIGNMENT)
  };
}

/// Rounds the given size up to an arbitrary power-of-two boundary.
///
/// ```rust
/// use arenalloc::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Overflow-checked form of [`align!`], used on caller supplied sizes.
pub const fn checked_align(size: usize) -> Option<usize> {
  match size.checked_add(ALIGNMENT - 1) {
    Some(padded) => Some(padded & !(ALIGNMENT - 1)),
    None => None,
  }
}
