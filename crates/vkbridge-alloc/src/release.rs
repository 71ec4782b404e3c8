//! Release actions: the single sanctioned way to free an unmanaged block.
//!
//! A [`Release`] owns every block produced by one conversion. It is
//! move-only: [`Release::release`] consumes it, so a second release of the
//! same value does not compile. Dropping an unreleased `Release` frees its
//! blocks too, attributed to the site that created it.

use std::fmt;
use std::ptr::NonNull;

use smallvec::SmallVec;
use vkbridge_core::CallSite;

use crate::allocator::RawAllocator;

/// Owner of zero or more unmanaged blocks.
///
/// Composite releases (an array of strings, a struct array with nested
/// pointers) hold the outer array block and every sub-block; they are
/// freed in reverse order of registration, so sub-blocks go before the
/// array that points at them.
pub struct Release<'a> {
    blocks: SmallVec<[(&'a dyn RawAllocator, NonNull<u8>); 2]>,
    created_at: CallSite,
}

// SAFETY: a Release exclusively owns its blocks, and the allocator
// reference is `Sync` by the `RawAllocator` bound. Moving it to another
// thread moves that exclusive ownership with it.
unsafe impl Send for Release<'_> {}

impl<'a> Release<'a> {
    /// A release that owns nothing. Returned by empty conversions.
    #[track_caller]
    pub fn none() -> Self {
        Self::new(CallSite::caller())
    }

    /// An empty composite release attributed to `site`.
    pub fn new(site: CallSite) -> Self {
        Self {
            blocks: SmallVec::new(),
            created_at: site,
        }
    }

    /// A release owning one block.
    pub fn single(alloc: &'a dyn RawAllocator, block: NonNull<u8>, site: CallSite) -> Self {
        let mut release = Self::new(site);
        release.push(alloc, block);
        release
    }

    /// Take ownership of another block allocated by `alloc`.
    pub fn push(&mut self, alloc: &'a dyn RawAllocator, block: NonNull<u8>) {
        self.blocks.push((alloc, block));
    }

    /// Take ownership of every block held by `other`.
    ///
    /// `other`'s blocks are freed before any block already held here.
    pub fn append(&mut self, mut other: Release<'a>) {
        self.blocks.extend(other.blocks.drain(..));
    }

    /// Number of blocks owned.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether this release owns nothing.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Where this release was created.
    pub fn created_at(&self) -> CallSite {
        self.created_at
    }

    /// Free every owned block exactly once.
    #[track_caller]
    pub fn release(mut self) {
        self.free_all(CallSite::caller());
    }

    /// Hand the blocks to native code for good; nothing is freed.
    ///
    /// A tracker will report them as leaks unless native code frees them
    /// through the same allocator.
    pub fn leak(mut self) {
        self.blocks.clear();
    }

    fn free_all(&mut self, site: CallSite) {
        while let Some((alloc, block)) = self.blocks.pop() {
            // SAFETY: every block was registered by the allocator that made
            // it and this release is its only owner; popping guarantees it
            // is freed at most once.
            unsafe { alloc.free_at(block.as_ptr(), site) };
        }
    }
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let site = self.created_at;
        self.free_all(site);
    }
}

impl fmt::Debug for Release<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Release")
            .field("blocks", &self.blocks.iter().map(|(_, b)| *b).collect::<Vec<_>>())
            .field("created_at", &self.created_at)
            .finish()
    }
}
