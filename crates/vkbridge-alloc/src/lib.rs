//! Unmanaged memory for values that cross into native code.
//!
//! Every buffer handed to a native entry point is allocated through a
//! [`RawAllocator`] and owned by exactly one [`Release`]. The release is
//! move-only, so "free exactly once" is enforced by the type system for
//! everything this workspace allocates. Misuse that slips past it (raw
//! frees of stale addresses, allocator contract violations) is caught in
//! development by wrapping the allocator in a [`TrackingAllocator`].
//!
//! ```text
//! marshal fn (#[track_caller])
//! └── allocate_block(alloc, size, CallSite)
//!     └── RawAllocator::allocate_at
//!         └── TrackingAllocator (optional) → AllocationTracker (Mutex<IndexMap>)
//!             └── SystemAllocator (libc malloc/free)
//! ```
//!
//! `unsafe` is confined to this crate, `vkbridge-marshal`, and
//! `vkbridge-dispatch`; `vkbridge-core` and the facade forbid it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod allocator;
pub mod global;
pub mod release;
pub mod tracker;
pub mod tracking;

pub use allocator::{allocate_block, RawAllocator, SystemAllocator, MIN_BLOCK_ALIGN};
pub use global::default_allocator;
#[cfg(feature = "track-allocations")]
pub use global::{dump_leaks, global_tracker, leak_check};
pub use release::Release;
pub use tracker::{AllocationRecord, AllocationTracker, Leak, LeakReport};
pub use tracking::{LeakCheck, TrackingAllocator};
