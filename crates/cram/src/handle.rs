//! Type-erased element handles.
//!
//! A [`Handle`] is the proxy for exactly one element in the arena. It
//! records *where* the element lives — byte offsets, never raw pointers,
//! so nothing here dangles when the buffer moves — and *how* to destroy,
//! clone, and widen it, as function pointers monomorphized for the
//! concrete type at the append site. This is the whole type-erasure
//! mechanism: no trait-object elements, no runtime type identification,
//! one small operation table per concrete type resolved at compile time.
//!
//! Relocation is deliberately absent from the table. Every Rust type
//! relocates by bitwise copy, so the store moves bytes through the arena
//! and re-anchors the offsets here.

#![allow(unsafe_code)]

use std::mem;

use crate::arena::{align_up, Arena};
use crate::widen::Widen;

/// Sentinel source offset marking a handle whose element was destroyed.
///
/// Destroyed handles only exist transiently inside removal operations;
/// every op below asserts liveness in debug builds so a double-destroy or
/// use-after-destroy is caught where it happens.
const DEAD: usize = usize::MAX;

/// Type-erased proxy managing exactly one element.
pub(crate) struct Handle<B: ?Sized> {
    /// Offset of the reserved block, including leading alignment padding.
    block: usize,
    /// Offset of the element itself; [`DEAD`] once destroyed.
    src: usize,
    /// Element size in bytes.
    size: usize,
    /// Element alignment in bytes.
    align: usize,
    /// Runs the destructor in place.
    drop_fn: unsafe fn(*mut u8),
    /// Clone-constructs the element at a destination address.
    clone_fn: unsafe fn(*const u8, *mut u8),
    /// Widens an element pointer to the capability type.
    widen_fn: fn(*mut u8) -> *mut B,
}

impl<B: ?Sized> Handle<B> {
    /// Mint a handle for a `T` just placed at `src` within its `block`.
    pub(crate) fn new<T>(block: usize, src: usize) -> Self
    where
        T: Clone,
        B: Widen<T>,
    {
        debug_assert!(src == align_up(block, mem::align_of::<T>()));
        Self {
            block,
            src,
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            drop_fn: drop_erased::<T>,
            clone_fn: clone_erased::<T>,
            widen_fn: widen_erased::<B, T>,
        }
    }

    /// Offset of the block start (source minus leading padding).
    pub(crate) fn block(&self) -> usize {
        self.block
    }

    /// Offset of the element itself.
    pub(crate) fn src(&self) -> usize {
        debug_assert_ne!(self.src, DEAD, "handle used after destroy");
        self.src
    }

    /// Element size in bytes.
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Element alignment in bytes.
    pub(crate) fn align(&self) -> usize {
        self.align
    }

    /// One past the element's last byte.
    pub(crate) fn end(&self) -> usize {
        self.src() + self.size
    }

    /// Re-anchor the handle after its bytes moved (or its block grew to
    /// absorb a closed gap).
    pub(crate) fn relocate_to(&mut self, block: usize, src: usize) {
        debug_assert_ne!(self.src, DEAD, "handle relocated after destroy");
        debug_assert!(block <= src);
        self.block = block;
        self.src = src;
    }

    /// Run the element's destructor in place and mark the handle dead.
    pub(crate) fn destroy(&mut self, arena: &mut Arena) {
        debug_assert_ne!(self.src, DEAD, "element destroyed twice");
        let ptr = arena.ptr_at_mut(self.src);
        // Mark dead first: if the destructor panics, later debug checks
        // still see a dead handle rather than a half-destroyed element.
        self.src = DEAD;
        unsafe { (self.drop_fn)(ptr) };
    }

    /// Clone-construct an independent copy at `src`/`block` in `dst_arena`
    /// and mint its handle. The source element is not mutated.
    pub(crate) fn clone_into(
        &self,
        arena: &Arena,
        dst_arena: &mut Arena,
        block: usize,
        src: usize,
    ) -> Handle<B> {
        let from = arena.ptr_at(self.src());
        let to = dst_arena.ptr_at_mut(src);
        unsafe { (self.clone_fn)(from, to) };
        Handle {
            block,
            src,
            size: self.size,
            align: self.align,
            drop_fn: self.drop_fn,
            clone_fn: self.clone_fn,
            widen_fn: self.widen_fn,
        }
    }

    /// Borrow the element through the capability type.
    pub(crate) fn value<'a>(&self, arena: &'a Arena) -> &'a B {
        let ptr = arena.ptr_at(self.src()).cast_mut();
        unsafe { &*(self.widen_fn)(ptr) }
    }

    /// Mutably borrow the element through the capability type.
    pub(crate) fn value_mut<'a>(&self, arena: &'a mut Arena) -> &'a mut B {
        let ptr = arena.ptr_at_mut(self.src());
        unsafe { &mut *(self.widen_fn)(ptr) }
    }

    /// Widened raw pointer to the element, for the iterators.
    ///
    /// # Safety
    ///
    /// `base` must be the base address of the arena this handle lives in,
    /// and the element must stay untouched for as long as the pointer is
    /// dereferenced.
    pub(crate) unsafe fn value_ptr(&self, base: *mut u8) -> *mut B {
        (self.widen_fn)(unsafe { base.add(self.src()) })
    }
}

unsafe fn drop_erased<T>(ptr: *mut u8) {
    unsafe { ptr.cast::<T>().drop_in_place() };
}

unsafe fn clone_erased<T: Clone>(src: *const u8, dst: *mut u8) {
    let value = unsafe { &*src.cast::<T>() }.clone();
    unsafe { dst.cast::<T>().write(value) };
}

fn widen_erased<B: ?Sized + Widen<T>, T>(ptr: *mut u8) -> *mut B {
    B::widen(ptr.cast::<T>())
}
