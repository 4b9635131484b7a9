//! Allocator error types.

use std::error::Error;
use std::fmt;

/// Errors produced by the typed allocator adapters.
///
/// The raw engines report exhaustion as `None`/`false` at the call site;
/// the typed adapters promote that to a structured error so callers can
/// log how far over budget a request was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// No free region large enough for the request exists.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Total capacity of the backing buffer in bytes.
        capacity: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => write!(
                f,
                "allocation failed: requested {requested} bytes, buffer capacity {capacity} bytes"
            ),
        }
    }
}

impl Error for AllocError {}
