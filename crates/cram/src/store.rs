//! The compacting store.
//!
//! [`PackedStore`] is the state machine coordinating the three leaf parts:
//! the [`Arena`] byte buffer, the ordered [`Handle`] sequence (whose order
//! *is* the logical collection order), and the [`SectionList`] of deferred-
//! compaction bookmarks. Appends pack new elements against the cursor,
//! growing and repacking the buffer when it runs out. Range removals
//! destroy the victims and slide later elements left into the freed span;
//! when a slide would clobber bytes that have not been copied yet, the pass
//! stalls and a section records the hole so a later removal can absorb it.
//!
//! Every method here is safe code over offsets; the raw memory work lives
//! in `arena` and behind the erased operations in `handle`.

use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::mem;

use crate::arena::{align_up, Arena};
use crate::error::StoreError;
use crate::handle::Handle;
use crate::section::SectionList;
use crate::widen::Widen;

/// Contiguous, compacting storage for heterogeneous values viewed through
/// the capability type `B`.
///
/// Elements of any concrete type coupled to `B` (see
/// [`capability!`](crate::capability) and [`Widen`]) are packed into one
/// resizable buffer in append order. Removing a range relocates the
/// survivors to close the gap — eagerly when that is safe, lazily via
/// recorded sections when it is not — so the buffer converges back to
/// fully packed as removals accumulate.
///
/// Every fallible operation has a [`StoreError`]-returning form; only
/// `Clone` panics on allocation failure. [`PolyVec`](crate::PolyVec)
/// wraps this type in the usual panicking collection conveniences.
///
/// Any mutating call may relocate every element, which is why element
/// access goes through `&self`/`&mut self` borrows rather than stable
/// pointers; the borrow checker enforces the invalidation contract.
pub struct PackedStore<B: ?Sized> {
    arena: Arena,
    handles: Vec<Handle<B>>,
    sections: SectionList,
}

// An element only enters the store through `push<T>` where `T: Widen`-couples
// to `B`, and the `Widen` contract requires `T` to uphold every auto trait
// `B` carries. Sending or sharing the store therefore sends or shares only
// values whose concrete types are themselves `Send`/`Sync`.
#[allow(unsafe_code)]
unsafe impl<B: ?Sized + Send> Send for PackedStore<B> {}
#[allow(unsafe_code)]
unsafe impl<B: ?Sized + Sync> Sync for PackedStore<B> {}

impl<B: ?Sized> PackedStore<B> {
    /// Ceiling on element alignment, and the alignment of every buffer.
    ///
    /// Types with stricter alignment are rejected at compile time by
    /// [`push`](Self::push).
    pub const MAX_ALIGN: usize = Arena::MAX_ALIGN;

    /// An empty store. Allocates nothing.
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            handles: Vec::new(),
            sections: SectionList::new(),
        }
    }

    /// An empty store with a buffer of `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Result<Self, StoreError> {
        Ok(Self {
            arena: Arena::with_capacity(bytes)?,
            handles: Vec::new(),
            sections: SectionList::new(),
        })
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the store holds no elements.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Bytes of buffer in use, holes included: the offset one past the
    /// last element.
    pub fn used_bytes(&self) -> usize {
        self.arena.cursor()
    }

    /// Number of deferred-compaction bookmarks currently recorded.
    ///
    /// Zero means the buffer is fully packed. Non-zero after a removal
    /// means some survivors were left in place; later removals, pops, and
    /// growth absorb the recorded holes.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Borrow element `index` through the capability type.
    pub fn get(&self, index: usize) -> Option<&B> {
        self.handles.get(index).map(|h| h.value(&self.arena))
    }

    /// Mutably borrow element `index` through the capability type.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut B> {
        match self.handles.get(index) {
            Some(h) => Some(h.value_mut(&mut self.arena)),
            None => None,
        }
    }

    /// Append `value`, growing the buffer if needed, and return a
    /// reference to its new home.
    ///
    /// Growth is all-or-nothing: the new buffer is allocated and every
    /// element repacked into it before the old buffer is released, so on
    /// [`StoreError::AllocationFailed`] the store is untouched.
    pub fn push<T>(&mut self, value: T) -> Result<&mut T, StoreError>
    where
        T: Clone,
        B: Widen<T>,
    {
        const {
            assert!(
                mem::align_of::<T>() <= Arena::MAX_ALIGN,
                "element alignment exceeds PackedStore::MAX_ALIGN",
            );
        }

        let mut block = self.arena.cursor();
        let mut src = align_up(block, mem::align_of::<T>());
        let mut required = mem::size_of::<T>() + (src - block);

        if self.arena.available() < required {
            // (capacity + required) * 2, checked: arithmetic overflow is an
            // unsatisfiable buffer request like any other.
            let new_cap = self
                .arena
                .capacity()
                .checked_add(required)
                .and_then(|c| c.checked_mul(2))
                .ok_or(StoreError::AllocationFailed { bytes: usize::MAX })?;
            self.grow_and_repack(new_cap)?;

            block = self.arena.cursor();
            src = align_up(block, mem::align_of::<T>());
            required = mem::size_of::<T>() + (src - block);
            debug_assert!(self.arena.available() >= required);
        }

        self.handles.push(Handle::new::<T>(block, src));
        self.arena.set_cursor(src + mem::size_of::<T>());
        Ok(self.arena.write(src, value))
    }

    /// Allocate a buffer of `new_cap` bytes and repack every element into
    /// it, in order. The retired buffer is released only after the last
    /// copy, and a fresh buffer is always packed, so all sections go.
    fn grow_and_repack(&mut self, new_cap: usize) -> Result<(), StoreError> {
        let retired = self.arena.grow(new_cap)?;
        self.sections.clear();

        let mut cursor = 0;
        for h in &mut self.handles {
            let block = cursor;
            let src = align_up(block, h.align());
            self.arena.copy_from_retired(&retired, h.src(), src, h.size());
            h.relocate_to(block, src);
            cursor = src + h.size();
        }
        self.arena.set_cursor(cursor);
        Ok(())
    }

    /// Ensure at least `additional` bytes of tail headroom.
    ///
    /// Satisfied requests that require growth go through the same
    /// grow-and-repack path as [`push`](Self::push), which also heals all
    /// recorded fragmentation.
    pub fn reserve(&mut self, additional: usize) -> Result<(), StoreError> {
        if self.arena.available() >= additional {
            return Ok(());
        }
        let new_cap = self
            .arena
            .cursor()
            .checked_add(additional)
            .ok_or(StoreError::AllocationFailed { bytes: usize::MAX })?;
        self.grow_and_repack(new_cap)
    }

    /// Destroy elements in the half-open logical range `[i, j)` and
    /// compact the survivors into the freed span.
    ///
    /// An empty range is a no-op. Compaction walks the survivors after the
    /// range in order, sliding each left to the next aligned offset while
    /// the slide cannot clobber unread bytes; the first survivor that
    /// would overlap its own destination stalls the pass and leaves a
    /// section recording the hole. Holes recorded by earlier passes are
    /// absorbed along the way.
    ///
    /// If an element's `Drop` panics, the panic propagates; the store
    /// stays valid but the not-yet-destroyed elements of the range and the
    /// freed span leak.
    pub fn remove_range(&mut self, i: usize, j: usize) -> Result<(), StoreError> {
        if i > j || j > self.handles.len() {
            return Err(StoreError::InvalidRange {
                start: i,
                end: j,
                len: self.handles.len(),
            });
        }
        if i == j {
            return Ok(());
        }

        // Freed span start: the first victim's block, extended left over
        // the hole of a section ending exactly there.
        let mut freed_start = self.handles[i].block();
        if let Some(slack) = self.sections.take_at(i) {
            freed_start -= slack;
        }

        // Sections strictly inside the range anchor removed handles; a
        // section at exactly `j` records the hole between the last victim
        // and the first survivor, which the freed span now reaches.
        self.sections.drop_inner(i, j);
        self.sections.take_at(j);
        self.sections.shift_down(j, j - i);

        // Detach before destroying so a panicking destructor cannot leave
        // a handle for a dead element in the sequence.
        for mut victim in self.handles.drain(i..j) {
            victim.destroy(&mut self.arena);
        }

        self.compact(i, freed_start);
        Ok(())
    }

    /// Slide handles `[from, len)` left into free space starting at `dst`.
    ///
    /// Relocation is in-place within the buffer, so a handle may only move
    /// when its destination range ends at or before its current offset;
    /// otherwise the copy would overwrite bytes it has not read yet. A
    /// destination equal to the current offset re-anchors the block
    /// without copying, absorbing a sub-alignment gap into the block's
    /// leading padding.
    fn compact(&mut self, from: usize, mut dst: usize) {
        let mut k = from;
        while k < self.handles.len() {
            // The hole a section records here is contiguous with the gap.
            self.sections.take_at(k);

            let h = &self.handles[k];
            let (block, src, size) = (h.block(), h.src(), h.size());
            if dst == block {
                // Gap fully consumed: everything from here on is packed
                // against its predecessor, modulo holes later sections
                // still record. The cursor is already `end(last)`.
                return;
            }
            let aligned = align_up(dst, h.align());
            if aligned == src {
                self.handles[k].relocate_to(dst, src);
            } else if aligned + size <= src {
                self.arena.copy_within(src, aligned, size);
                self.handles[k].relocate_to(dst, aligned);
            } else {
                // Overlap: stop here and bookmark the hole.
                self.sections.record(k, block - dst);
                return;
            }
            dst = self.handles[k].end();
            k += 1;
        }
        self.arena.set_cursor(dst);
    }

    /// Destroy the last element, if any, reclaiming its space and any hole
    /// recorded immediately before it.
    ///
    /// The tail is always safely contiguous, so no compaction is needed.
    /// Returns whether an element was removed.
    pub fn pop(&mut self) -> bool {
        let Some(mut last) = self.handles.pop() else {
            return false;
        };
        let mut start = last.block();
        if let Some(slack) = self.sections.take_at(self.handles.len()) {
            start -= slack;
        }
        self.arena.set_cursor(start);
        last.destroy(&mut self.arena);
        true
    }

    /// Destroy all elements in order. The buffer is retained.
    pub fn clear(&mut self) {
        self.sections.clear();
        self.arena.set_cursor(0);
        for mut h in self.handles.drain(..) {
            h.destroy(&mut self.arena);
        }
    }

    /// Deep-copy the store: a fresh buffer sized to this store's used
    /// extent, with every element cloned at freshly packed offsets.
    ///
    /// The result is always fully packed, regardless of how fragmented
    /// this store is.
    pub fn try_clone(&self) -> Result<Self, StoreError> {
        let mut clone = Self {
            arena: Arena::with_capacity(self.arena.cursor())?,
            handles: Vec::with_capacity(self.handles.len()),
            sections: SectionList::new(),
        };
        for h in &self.handles {
            let block = clone.arena.cursor();
            let src = align_up(block, h.align());
            let copied = h.clone_into(&self.arena, &mut clone.arena, block, src);
            clone.handles.push(copied);
            clone.arena.set_cursor(src + h.size());
        }
        Ok(clone)
    }

    /// The handle sequence, for the iterators.
    pub(crate) fn handles(&self) -> &[Handle<B>] {
        &self.handles
    }

    /// Buffer base address, for the iterators.
    pub(crate) fn base_ptr(&self) -> *mut u8 {
        self.arena.base_ptr()
    }
}

impl<B: ?Sized> Default for PackedStore<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized> Clone for PackedStore<B> {
    /// Deep copy, panicking on allocation failure.
    ///
    /// [`try_clone`](Self::try_clone) is the fallible form.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(store) => store,
            Err(err) => alloc_failure(&err),
        }
    }
}

/// Route an unsatisfiable buffer request through the global allocation
/// failure hook, the way `Vec` and friends do.
pub(crate) fn alloc_failure(err: &StoreError) -> ! {
    let bytes = match err {
        StoreError::AllocationFailed { bytes } => *bytes,
        // The panicking conveniences only wrap allocation paths.
        _ => unreachable!("non-allocation error on an allocation path"),
    };
    let layout = Layout::from_size_align(bytes, Arena::MAX_ALIGN)
        .unwrap_or_else(|_| Layout::new::<u8>());
    handle_alloc_error(layout)
}

impl<B: ?Sized> fmt::Debug for PackedStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedStore")
            .field("len", &self.handles.len())
            .field("used_bytes", &self.arena.cursor())
            .field("capacity", &self.arena.capacity())
            .field("sections", &self.sections.len())
            .finish()
    }
}

impl<B: ?Sized> Drop for PackedStore<B> {
    fn drop(&mut self) {
        for h in &mut self.handles {
            h.destroy(&mut self.arena);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Blob {
        fn tag(&self) -> u64;
    }
    crate::capability!(Blob);

    #[derive(Clone)]
    struct Tiny(u8);
    impl Blob for Tiny {
        fn tag(&self) -> u64 {
            u64::from(self.0)
        }
    }

    #[derive(Clone)]
    struct Wide([u64; 4]);
    impl Blob for Wide {
        fn tag(&self) -> u64 {
            self.0[0]
        }
    }

    #[derive(Clone)]
    struct Pair([u64; 2]);
    impl Blob for Pair {
        fn tag(&self) -> u64 {
            self.0[0]
        }
    }

    /// Structural invariants every public operation must preserve.
    fn assert_invariants<B: ?Sized>(store: &PackedStore<B>) {
        let mut prev_end = 0;
        let mut slack_seen = 0;
        for (k, h) in store.handles.iter().enumerate() {
            assert!(h.block() >= prev_end, "blocks overlap at handle {k}");
            assert_eq!(h.src() % h.align(), 0, "misaligned element {k}");
            assert_eq!(
                h.src(),
                align_up(h.block(), h.align()),
                "block/src mismatch at handle {k}",
            );
            // Any gap between consecutive blocks must be section slack.
            if h.block() > prev_end {
                slack_seen += h.block() - prev_end;
            }
            prev_end = h.end();
        }
        assert_eq!(
            slack_seen,
            store.sections.total_slack(),
            "free bytes below the cursor not accounted for by sections",
        );
        if store.handles.is_empty() {
            assert_eq!(store.used_bytes(), 0);
            assert_eq!(store.section_count(), 0);
        } else {
            assert_eq!(store.used_bytes(), prev_end, "cursor is not end(last)");
        }
        assert!(store.used_bytes() <= store.capacity());
    }

    fn tags(store: &PackedStore<dyn Blob>) -> Vec<u64> {
        (0..store.len()).map(|i| store.get(i).unwrap().tag()).collect()
    }

    #[test]
    fn push_packs_and_aligns() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.push(Tiny(3)).unwrap();

        assert_eq!(tags(&store), [1, 2, 3]);
        assert_eq!(store.len(), 3);
        // Tiny at 0, Wide padded to 8, Tiny packed right after.
        assert_eq!(store.used_bytes(), 41);
        assert_invariants(&store);
    }

    #[test]
    fn push_grows_through_many_reallocations() {
        let mut store: PackedStore<u64> = PackedStore::new();
        for v in 0..1000 {
            store.push(v).unwrap();
        }
        assert_eq!(store.len(), 1000);
        for i in 0..1000 {
            assert_eq!(*store.get(i).unwrap(), i as u64);
        }
        assert_invariants(&store);
    }

    #[test]
    fn growth_heals_fragmentation() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);

        // Force a growth; the repack packs everything and drops sections.
        let mut v = 3;
        while store.section_count() > 0 {
            store.push(Wide([v, 0, 0, 0])).unwrap();
            v += 1;
        }
        assert_eq!(tags(&store)[0], 2);
        assert_invariants(&store);
    }

    #[test]
    fn remove_range_compacts_same_size_elements_eagerly() {
        let mut store: PackedStore<u64> = PackedStore::new();
        for v in 0..6u64 {
            store.push(v).unwrap();
        }
        store.remove_range(1, 3).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.section_count(), 0);
        assert_eq!(store.used_bytes(), 32);
        let values: Vec<u64> = (0..4).map(|i| *store.get(i).unwrap()).collect();
        assert_eq!(values, [0, 3, 4, 5]);
        assert_invariants(&store);
    }

    #[test]
    fn removing_a_small_head_before_a_wide_element_stalls() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();

        // Wide cannot slide into one freed byte without self-overlap.
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);
        assert_eq!(tags(&store), [2]);
        assert_invariants(&store);
    }

    #[test]
    fn stalled_hole_is_absorbed_by_the_next_removal() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.push(Tiny(3)).unwrap();
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);

        // Removing the wide element merges the bookmarked hole into the
        // freed span; the trailing Tiny compacts all the way down.
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 0);
        assert_eq!(tags(&store), [3]);
        assert_eq!(store.used_bytes(), 1);
        assert_invariants(&store);
    }

    #[test]
    fn compaction_cascades_through_a_later_section() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Tiny(2)).unwrap();
        store.push(Pair([3, 0])).unwrap();
        store.push(Wide([4, 0, 0, 0])).unwrap();
        store.push(Tiny(5)).unwrap();

        // Freeing the Pair leaves a hole the Wide cannot slide into.
        store.remove_range(2, 3).unwrap();
        assert_eq!(store.section_count(), 1);
        assert_invariants(&store);

        // Removing the head Tiny relocates the second Tiny, after which
        // the walk absorbs the bookmarked hole and stalls on the Wide
        // again, re-recording the larger combined hole.
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);
        assert_eq!(tags(&store), [2, 4, 5]);
        assert_invariants(&store);

        // Two more head removals drain the hole entirely.
        store.remove_range(0, 1).unwrap();
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 0);
        assert_eq!(tags(&store), [5]);
        assert_eq!(store.used_bytes(), 1);
        assert_invariants(&store);
    }

    #[test]
    fn erasing_the_tail_reclaims_space_without_compaction() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.push(Wide([3, 0, 0, 0])).unwrap();
        store.remove_range(1, 3).unwrap();
        assert_eq!(tags(&store), [1]);
        assert_eq!(store.used_bytes(), 1);
        assert_invariants(&store);
    }

    #[test]
    fn remove_range_rejects_bad_ranges_and_allows_empty_ones() {
        let mut store: PackedStore<u64> = PackedStore::new();
        store.push(7).unwrap();
        assert_eq!(
            store.remove_range(0, 2),
            Err(StoreError::InvalidRange {
                start: 0,
                end: 2,
                len: 1,
            }),
        );
        assert_eq!(
            store.remove_range(1, 0),
            Err(StoreError::InvalidRange {
                start: 1,
                end: 0,
                len: 1,
            }),
        );
        store.remove_range(1, 1).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pop_reclaims_the_tail_and_its_bookmarked_hole() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);

        // The popped Wide carries the stalled hole before it back out.
        assert!(store.pop());
        assert_eq!(store.len(), 0);
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(store.section_count(), 0);
        assert!(!store.pop());
        assert_invariants(&store);
    }

    #[test]
    fn sub_alignment_gaps_are_absorbed_into_block_padding() {
        #[derive(Clone)]
        #[repr(align(16))]
        struct Spaced(u64);
        impl Blob for Spaced {
            fn tag(&self) -> u64 {
                self.0
            }
        }

        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Tiny(2)).unwrap();
        store.push(Spaced(3)).unwrap();
        store.push(Tiny(4)).unwrap();

        // One freed byte is smaller than Spaced's alignment: Spaced stays
        // at its offset and its block grows to cover the gap, with no
        // section recorded.
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 0);
        assert_eq!(tags(&store), [2, 3, 4]);
        assert_invariants(&store);
    }

    #[test]
    fn clear_destroys_everything_and_keeps_the_buffer() {
        let mut store: PackedStore<u64> = PackedStore::new();
        for v in 0..8u64 {
            store.push(v).unwrap();
        }
        let cap = store.capacity();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(store.capacity(), cap);
        store.push(9).unwrap();
        assert_eq!(*store.get(0).unwrap(), 9);
    }

    #[test]
    fn try_clone_is_packed_and_independent() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.push(Tiny(3)).unwrap();
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);

        let clone = store.try_clone().unwrap();
        assert_eq!(clone.section_count(), 0);
        assert_eq!(tags(&clone), tags(&store));
        assert!(clone.used_bytes() < store.used_bytes());
        assert_invariants(&clone);

        // Mutating the original cannot reach the clone.
        store.clear();
        assert_eq!(tags(&clone), [2, 3]);
    }

    #[test]
    fn reserve_guarantees_headroom_and_repacks() {
        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        store.push(Tiny(1)).unwrap();
        store.push(Wide([2, 0, 0, 0])).unwrap();
        store.remove_range(0, 1).unwrap();
        assert_eq!(store.section_count(), 1);

        store.reserve(1024).unwrap();
        assert!(store.capacity() - store.used_bytes() >= 1024);
        assert_eq!(store.section_count(), 0);
        assert_eq!(tags(&store), [2]);
        assert_invariants(&store);
    }

    #[test]
    fn moved_from_store_is_empty_and_bufferless() {
        let mut store: PackedStore<u64> = PackedStore::new();
        store.push(1).unwrap();
        let taken = mem::take(&mut store);
        assert_eq!(taken.len(), 1);
        assert_eq!(store.len(), 0);
        assert_eq!(store.capacity(), 0);
    }

    #[test]
    fn zero_sized_elements_occupy_no_bytes() {
        #[derive(Clone)]
        struct Nothing;
        impl Blob for Nothing {
            fn tag(&self) -> u64 {
                0
            }
        }

        let mut store: PackedStore<dyn Blob> = PackedStore::new();
        for _ in 0..100 {
            store.push(Nothing).unwrap();
        }
        assert_eq!(store.len(), 100);
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(store.capacity(), 0);
        store.remove_range(10, 90).unwrap();
        assert_eq!(store.len(), 20);
        assert_invariants(&store);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Push(u64),
            Remove(usize, usize),
            Pop,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => any::<u64>().prop_map(Op::Push),
                2 => (0usize..12, 0usize..12).prop_map(|(a, b)| Op::Remove(a.min(b), a.max(b))),
                1 => Just(Op::Pop),
            ]
        }

        proptest! {
            #[test]
            fn store_matches_a_vec_model(
                ops in proptest::collection::vec(op_strategy(), 1..60),
            ) {
                let mut store: PackedStore<u64> = PackedStore::new();
                let mut model: Vec<u64> = Vec::new();
                for op in ops {
                    match op {
                        Op::Push(v) => {
                            store.push(v).unwrap();
                            model.push(v);
                        }
                        Op::Remove(i, j) => {
                            let j = j.min(model.len());
                            let i = i.min(j);
                            store.remove_range(i, j).unwrap();
                            model.drain(i..j);
                        }
                        Op::Pop => {
                            prop_assert_eq!(store.pop(), model.pop().is_some());
                        }
                    }
                    assert_invariants(&store);
                }
                prop_assert_eq!(store.len(), model.len());
                for (i, expected) in model.iter().enumerate() {
                    prop_assert_eq!(store.get(i).unwrap(), expected);
                }
            }

            #[test]
            fn mixed_sizes_stay_ordered_and_aligned(
                ops in proptest::collection::vec(op_strategy(), 1..60),
            ) {
                let mut store: PackedStore<dyn Blob> = PackedStore::new();
                let mut model: Vec<u64> = Vec::new();
                for op in ops {
                    match op {
                        Op::Push(v) => {
                            // Alternate widths off the value itself.
                            if v % 2 == 0 {
                                store.push(Tiny(v as u8)).unwrap();
                                model.push(u64::from(v as u8));
                            } else {
                                store.push(Wide([v, 0, 0, 0])).unwrap();
                                model.push(v);
                            }
                        }
                        Op::Remove(i, j) => {
                            let j = j.min(model.len());
                            let i = i.min(j);
                            store.remove_range(i, j).unwrap();
                            model.drain(i..j);
                        }
                        Op::Pop => {
                            prop_assert_eq!(store.pop(), model.pop().is_some());
                        }
                    }
                    assert_invariants(&store);
                }
                let seen: Vec<u64> = tags(&store);
                prop_assert_eq!(seen, model);
            }
        }
    }
}
