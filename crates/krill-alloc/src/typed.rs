//! Typed adapters over the raw allocator engines.
//!
//! The engines speak bytes and offsets; containers and pools speak
//! elements. [`TlsfPool`] and [`ArenaPool`] bridge the two with the
//! standard allocator contract — typed `allocate(n)` / `deallocate`,
//! equality by backing-engine identity — expressed over offset handles.
//! Several pools may share one engine through `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::arena::{Arena, ArenaRef};
use crate::error::AllocError;
use crate::tlsf::Tlsf;

/// A typed region handed out by a pool: `len` elements of `T` starting at
/// a byte offset inside the backing engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct TypedBlock<T> {
    offset: u32,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedBlock<T> {
    /// Byte offset of the region within the backing engine.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Number of `T` elements the region holds.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the region holds zero elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the region in bytes.
    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }
}

/// Typed allocation interface over a shared [`Tlsf`] engine.
///
/// Two pools compare equal exactly when they share a backing engine,
/// regardless of element type.
pub struct TlsfPool<T> {
    engine: Rc<RefCell<Tlsf>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TlsfPool<T> {
    /// Create a pool over a shared engine.
    pub fn new(engine: Rc<RefCell<Tlsf>>) -> Self {
        Self {
            engine,
            _marker: PhantomData,
        }
    }

    /// The shared backing engine.
    pub fn engine(&self) -> &Rc<RefCell<Tlsf>> {
        &self.engine
    }

    /// Allocate space for `n` elements of `T`.
    ///
    /// A zero-element request succeeds without touching the engine.
    pub fn allocate(&self, n: usize) -> Result<TypedBlock<T>, AllocError> {
        if n == 0 {
            return Ok(TypedBlock {
                offset: u32::MAX,
                len: 0,
                _marker: PhantomData,
            });
        }
        let bytes = n * std::mem::size_of::<T>();
        let mut engine = self.engine.borrow_mut();
        let capacity = engine.capacity();
        match engine.allocate(bytes as u32) {
            Some(offset) => Ok(TypedBlock {
                offset,
                len: n,
                _marker: PhantomData,
            }),
            None => Err(AllocError::CapacityExceeded {
                requested: bytes,
                capacity,
            }),
        }
    }

    /// Return a block to the engine.
    ///
    /// Empty blocks free trivially; otherwise reports whether the engine
    /// accepted the offset.
    pub fn deallocate(&self, block: TypedBlock<T>) -> bool {
        if block.is_empty() {
            return true;
        }
        self.engine.borrow_mut().deallocate(block.offset)
    }

    /// Run `f` over the block's bytes, shared.
    pub fn with_bytes<R>(&self, block: &TypedBlock<T>, f: impl FnOnce(&[u8]) -> R) -> R {
        let engine = self.engine.borrow();
        f(engine.slice(block.offset, block.byte_len() as u32))
    }

    /// Run `f` over the block's bytes, mutable.
    pub fn with_bytes_mut<R>(&self, block: &TypedBlock<T>, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut engine = self.engine.borrow_mut();
        f(engine.slice_mut(block.offset, block.byte_len() as u32))
    }
}

impl<T> Clone for TlsfPool<T> {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.engine))
    }
}

impl<T, U> PartialEq<TlsfPool<U>> for TlsfPool<T> {
    fn eq(&self, other: &TlsfPool<U>) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine)
    }
}

/// Typed allocation interface over a shared [`Arena`].
///
/// Deallocation is a deliberate no-op: arena memory is reclaimed in bulk
/// via [`Arena::reset`]. Equality is by backing-engine identity.
pub struct ArenaPool<T> {
    engine: Rc<RefCell<Arena>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaPool<T> {
    /// Create a pool over a shared arena.
    pub fn new(engine: Rc<RefCell<Arena>>) -> Self {
        Self {
            engine,
            _marker: PhantomData,
        }
    }

    /// The shared backing arena.
    pub fn engine(&self) -> &Rc<RefCell<Arena>> {
        &self.engine
    }

    /// Allocate space for `n` elements of `T`.
    pub fn allocate(&self, n: usize) -> Result<(ArenaRef, usize), AllocError> {
        let bytes = n * std::mem::size_of::<T>();
        let mut engine = self.engine.borrow_mut();
        let capacity = engine.memory_bytes();
        match engine.allocate(bytes) {
            Some(r) => Ok((r, n)),
            None => Err(AllocError::CapacityExceeded {
                requested: bytes,
                capacity,
            }),
        }
    }

    /// Accept a region back without reclaiming it.
    ///
    /// Present so arena-backed callers satisfy the same shape as
    /// [`TlsfPool`]; reclamation happens only through [`Arena::reset`].
    pub fn deallocate(&self, _region: ArenaRef) {}
}

impl<T> Clone for ArenaPool<T> {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.engine))
    }
}

impl<T, U> PartialEq<ArenaPool<U>> for ArenaPool<T> {
    fn eq(&self, other: &ArenaPool<U>) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine)
    }
}
