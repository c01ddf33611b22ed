//! Unified error type for the Avalon crates.

use avalon_room::{EntropyError, RoomError};

/// Top-level error that wraps the per-crate errors.
///
/// `#[from]` lets `?` lift a sub-crate error without a manual `map_err`.
#[derive(Debug, thiserror::Error)]
pub enum AvalonError {
    /// A lobby or round request was refused.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The randomness source failed outside a pool operation.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}
