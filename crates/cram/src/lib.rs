//! Contiguous, compacting storage for heterogeneous values.
//!
//! A [`PolyVec<B>`] stores differently-sized values that share one
//! capability trait back to back in a single resizable buffer, instead of
//! scattering them behind per-element boxes. Iteration walks memory in
//! order, per-element overhead is one small handle, and the trade is that
//! removing elements means sliding the survivors left.
//!
//! # Architecture
//!
//! ```text
//! PolyVec<B>          ordered-collection facade (safe)
//! └── PackedStore<B>  the compacting state machine (safe)
//!     ├── Handle<B>   per-element offsets + erased drop/clone/widen ops
//!     ├── SectionList deferred-compaction bookmarks (pure index math)
//!     └── Arena       the byte buffer; all raw memory work lives here
//! ```
//!
//! Removal compacts lazily: survivors slide left only while the slide
//! cannot overwrite bytes it has not yet copied. Where it would, the pass
//! stops and a *section* bookmarks the hole; later removals, pops, and
//! growth absorb bookmarked holes, so the buffer converges back to fully
//! packed instead of shifting the whole tail on every erase.
//!
//! # Declaring a capability
//!
//! Stored types couple to the capability trait-object type through
//! [`Widen`]; the [`capability!`] macro generates those impls:
//!
//! ```rust
//! use cram::{capability, PolyVec};
//!
//! trait Sensor {
//!     fn read(&self) -> f32;
//! }
//! capability!(Sensor);
//!
//! #[derive(Clone)]
//! struct Thermometer(f32);
//! impl Sensor for Thermometer {
//!     fn read(&self) -> f32 {
//!         self.0
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Barometer {
//!     pascals: f32,
//!     offset: f32,
//! }
//! impl Sensor for Barometer {
//!     fn read(&self) -> f32 {
//!         self.pascals + self.offset
//!     }
//! }
//!
//! let mut sensors: PolyVec<dyn Sensor> = PolyVec::new();
//! sensors.push(Thermometer(21.5));
//! sensors.push(Barometer { pascals: 101_325.0, offset: -25.0 });
//! let total: f32 = sensors.iter().map(Sensor::read).sum();
//! assert!(total > 101_000.0);
//! ```
//!
//! A sized `B` also works: `PolyVec<u64>` is a homogeneous vector over the
//! same arena machinery.
//!
//! # Unsafe policy
//!
//! The crate denies `unsafe_code` and re-allows it in exactly the modules
//! that are the documented unsafe boundary: `arena` (buffer ownership and
//! raw copies), `handle` (the erased per-type operations), `iter` (one
//! pointer deref per step), and the `Widen` machinery in `widen`.
//! Everything else — including the whole compaction algorithm — is safe
//! code over byte offsets.
//!
//! # Limits
//!
//! Element types must be `Clone` (deep copies of the collection
//! copy-construct every element) and at most 16-byte aligned
//! ([`PackedStore::MAX_ALIGN`]; checked at compile time). The collection
//! is single-owner and unsynchronized; `Send`/`Sync` follow `B`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod arena;
mod error;
mod handle;
mod iter;
mod section;
mod store;
mod vec;
mod widen;

pub use error::StoreError;
pub use iter::{Iter, IterMut};
pub use store::PackedStore;
pub use vec::PolyVec;
pub use widen::Widen;
