//! Monotonic bump allocator with chained blocks.
//!
//! An [`Arena`] hands out byte regions by advancing a cursor through a
//! chain of blocks. Individual regions cannot be freed — callers that
//! need per-allocation frees use [`crate::Tlsf`] instead. [`Arena::reset`]
//! rewinds every cursor in one step while keeping the chain, so the next
//! round of allocations reuses the same backing memory without
//! reallocation.

use std::fmt;

use crate::config::AllocConfig;

/// A single arena block: backing bytes plus a bump cursor.
struct Block {
    data: Vec<u8>,
    cursor: usize,
}

impl Block {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            cursor: 0,
        }
    }

    /// Bump-allocate `len` bytes, returning the old cursor position.
    fn bump(&mut self, len: usize) -> Option<usize> {
        let new_cursor = self.cursor.checked_add(len)?;
        if new_cursor > self.data.len() {
            return None;
        }
        let offset = self.cursor;
        self.cursor = new_cursor;
        Some(offset)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }
}

/// Location of an arena allocation: block index plus byte offset.
///
/// Stable across [`Arena::reset`] in the sense that re-running the same
/// allocation sequence yields the same refs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct ArenaRef {
    /// Index of the block within the chain.
    pub block: u32,
    /// Byte offset within the block.
    pub offset: u32,
}

/// Bump allocator over a chain of byte blocks.
///
/// Two modes:
///
/// - **Growable** ([`Arena::new`]): when the current block is exhausted a
///   new block of `max(block_size, n)` bytes is chained in.
/// - **Fixed** ([`Arena::with_buffer`]): one caller-supplied buffer;
///   allocation fails once it is exhausted.
///
/// Not thread-safe; one arena per worker or external synchronisation.
pub struct Arena {
    blocks: Vec<Block>,
    /// Index of the block currently being filled.
    current: usize,
    block_size: usize,
    /// Fixed-buffer mode: never chain new blocks.
    fixed: bool,
}

impl Arena {
    /// Create a growable arena with the default block size.
    pub fn new() -> Self {
        Self::with_config(&AllocConfig::default())
    }

    /// Create a growable arena chaining blocks of `config.block_size`.
    pub fn with_config(config: &AllocConfig) -> Self {
        assert!(config.block_size > 0, "block size must be non-zero");
        Self {
            blocks: vec![Block::new(config.block_size)],
            current: 0,
            block_size: config.block_size,
            fixed: false,
        }
    }

    /// Create a fixed arena over one caller-supplied buffer.
    ///
    /// Allocation returns `None` once the buffer is exhausted; the arena
    /// never acquires more memory.
    pub fn with_buffer(buffer: Vec<u8>) -> Self {
        let block_size = buffer.len();
        Self {
            blocks: vec![Block {
                data: buffer,
                cursor: 0,
            }],
            current: 0,
            block_size,
            fixed: true,
        }
    }

    /// Allocate `len` bytes.
    ///
    /// Returns `None` only when no new block can be acquired: always a
    /// possibility in fixed mode, never in growable mode (short of
    /// address-space exhaustion, which panics in `Vec` like any other
    /// Rust allocation).
    pub fn allocate(&mut self, len: usize) -> Option<ArenaRef> {
        // Current block, then any later blocks kept alive by reset().
        while self.current < self.blocks.len() {
            if let Some(offset) = self.blocks[self.current].bump(len) {
                return Some(ArenaRef {
                    block: self.current as u32,
                    offset: offset as u32,
                });
            }
            if self.current + 1 >= self.blocks.len() {
                break;
            }
            self.current += 1;
        }

        if self.fixed {
            return None;
        }

        let mut block = Block::new(self.block_size.max(len));
        let offset = block
            .bump(len)
            .expect("fresh block is at least len bytes");
        self.blocks.push(block);
        self.current = self.blocks.len() - 1;
        Some(ArenaRef {
            block: self.current as u32,
            offset: offset as u32,
        })
    }

    /// Rewind every block's cursor without releasing memory.
    ///
    /// All previous refs become logically invalid; re-running the same
    /// allocation sequence returns the same refs over the same bytes.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.cursor = 0;
        }
        self.current = 0;
    }

    /// Bytes at `r`, shared.
    ///
    /// # Panics
    ///
    /// Panics if the ref does not denote `len` bytes inside its block.
    pub fn slice(&self, r: ArenaRef, len: usize) -> &[u8] {
        let start = r.offset as usize;
        &self.blocks[r.block as usize].data[start..start + len]
    }

    /// Bytes at `r`, mutable.
    ///
    /// # Panics
    ///
    /// Panics if the ref does not denote `len` bytes inside its block.
    pub fn slice_mut(&mut self, r: ArenaRef, len: usize) -> &mut [u8] {
        let start = r.offset as usize;
        &mut self.blocks[r.block as usize].data[start..start + len]
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Bytes currently allocated across all blocks.
    pub fn total_used(&self) -> usize {
        self.blocks.iter().map(|b| b.cursor).sum()
    }

    /// Total backing memory across all blocks.
    pub fn memory_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.data.len()).sum()
    }

    /// Free bytes remaining in the block currently being filled.
    pub fn remaining_in_current(&self) -> usize {
        self.blocks[self.current].remaining()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.blocks.len())
            .field("used", &self.total_used())
            .field("fixed", &self.fixed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_allocations_advance_cursor() {
        let mut arena = Arena::new();
        let a = arena.allocate(100).unwrap();
        let b = arena.allocate(50).unwrap();
        assert_eq!(a, ArenaRef { block: 0, offset: 0 });
        assert_eq!(b, ArenaRef { block: 0, offset: 100 });
        assert_eq!(arena.total_used(), 150);
    }

    #[test]
    fn overflow_chains_a_new_block() {
        let config = AllocConfig {
            block_size: 128,
            ..AllocConfig::default()
        };
        let mut arena = Arena::with_config(&config);
        arena.allocate(100).unwrap();
        let b = arena.allocate(100).unwrap();
        assert_eq!(b.block, 1, "second allocation spills into a new block");
        assert_eq!(arena.block_count(), 2);
    }

    #[test]
    fn oversized_request_gets_dedicated_block() {
        let config = AllocConfig {
            block_size: 64,
            ..AllocConfig::default()
        };
        let mut arena = Arena::with_config(&config);
        let r = arena.allocate(1000).unwrap();
        assert_eq!(arena.slice(r, 1000).len(), 1000);
    }

    #[test]
    fn fixed_mode_fails_when_exhausted() {
        let mut arena = Arena::with_buffer(vec![0; 64]);
        assert!(arena.allocate(40).is_some());
        assert!(arena.allocate(40).is_none(), "no growth in fixed mode");
        assert!(arena.allocate(24).is_some(), "exact remainder still fits");
    }

    #[test]
    fn reset_reuses_the_same_addresses() {
        let config = AllocConfig {
            block_size: 64,
            ..AllocConfig::default()
        };
        let mut arena = Arena::with_config(&config);
        let first = arena.allocate(48).unwrap();
        arena.allocate(48).unwrap(); // spills into block 1

        arena.reset();
        assert_eq!(arena.total_used(), 0);
        assert_eq!(arena.block_count(), 2, "reset keeps the chain");
        let again = arena.allocate(48).unwrap();
        assert_eq!(again, first, "address-reuse after reset");
    }

    #[test]
    fn slices_read_back_written_bytes() {
        let mut arena = Arena::new();
        let r = arena.allocate(8).unwrap();
        arena.slice_mut(r, 8).copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(arena.slice(r, 8), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn zero_length_allocation_is_a_position() {
        let mut arena = Arena::new();
        let a = arena.allocate(0).unwrap();
        let b = arena.allocate(16).unwrap();
        assert_eq!(a.offset, b.offset, "empty allocation does not advance");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Replaying an allocation sequence after reset() yields the
            /// identical refs (address-reuse property, generalised).
            #[test]
            fn reset_replay_is_identical(
                sizes in proptest::collection::vec(0usize..200, 1..30),
            ) {
                let config = AllocConfig { block_size: 128, ..AllocConfig::default() };
                let mut arena = Arena::with_config(&config);
                let first: Vec<ArenaRef> =
                    sizes.iter().map(|&s| arena.allocate(s).unwrap()).collect();
                arena.reset();
                let second: Vec<ArenaRef> =
                    sizes.iter().map(|&s| arena.allocate(s).unwrap()).collect();
                prop_assert_eq!(first, second);
            }

            /// used/memory accounting stays consistent under churn.
            #[test]
            fn accounting_is_consistent(
                sizes in proptest::collection::vec(1usize..300, 1..40),
            ) {
                let mut arena = Arena::new();
                for &s in &sizes {
                    arena.allocate(s).unwrap();
                }
                let total: usize = sizes.iter().sum();
                prop_assert_eq!(arena.total_used(), total);
                prop_assert!(arena.memory_bytes() >= arena.total_used());
            }
        }
    }
}
