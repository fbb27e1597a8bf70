use thiserror::Error;

/// Raised when descent exceeds the configured maximum hash depth.
///
/// A well-behaved [`crate::Hasher`] spreads keys across the full 64-bit
/// space at every rehash; this only fires when a caller-supplied hasher
/// keeps producing structured collisions (or deliberately forces them, as a
/// malicious/degenerate input would). It is a caller contract violation,
/// not a normal outcome, so [`crate::Hamt::put`] panics with it rather than
/// returning a `Result`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("hash descent exceeded max depth ({depth}); the hasher is producing too many structured collisions")]
    BadHasher { depth: u32 },
}
