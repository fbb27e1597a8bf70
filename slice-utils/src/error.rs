use thiserror::Error;

/// Bounds violation produced while validating arguments to a slice helper.
///
/// Every public function in this crate panics (rather than returning a
/// `Result`) on an out-of-range index. The error type exists so the panic
/// message is built in one place.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("index {index} out of range for slice of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("range [{start}, {end}) out of range for slice of length {len}")]
    RangeOutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("range start {start} greater than range end {end}")]
    StartAfterEnd { start: usize, end: usize },
}
