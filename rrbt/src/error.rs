use thiserror::Error;

/// Bounds violation raised by [`crate::Rrbt`] addressing operations.
///
/// Per the contract of the sequence API, an out-of-range index or range is a
/// programmer error, not a recoverable condition: callers are expected to
/// keep `i` within `[0, len())` (or `[0, len()]` for slice endpoints)
/// themselves. [`crate::Rrbt::get`] and [`crate::Rrbt::slice`] panic using
/// this type's `Display` rather than returning a `Result`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("index {index} out of range for sequence of length {len}")]
    OutOfRange { index: u64, len: u64 },

    #[error("slice range [{start}, {end}) out of range for sequence of length {len}")]
    SliceOutOfRange { start: u64, end: u64, len: u64 },
}
