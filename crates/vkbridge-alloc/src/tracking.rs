//! Allocator wrapper that feeds an [`AllocationTracker`].

use std::sync::Arc;

use vkbridge_core::CallSite;

use crate::allocator::RawAllocator;
use crate::tracker::{AllocationTracker, LeakReport};

/// Wraps any allocator and records every allocate/free in a tracker.
///
/// Double frees panic before the inner allocator is touched, so the
/// corrupting free never happens.
#[derive(Debug)]
pub struct TrackingAllocator<A> {
    inner: A,
    tracker: Arc<AllocationTracker>,
}

impl<A: RawAllocator> TrackingAllocator<A> {
    /// Wrap `inner`, reporting into `tracker`.
    pub fn new(inner: A, tracker: Arc<AllocationTracker>) -> Self {
        Self { inner, tracker }
    }

    /// The tracker this allocator reports into.
    pub fn tracker(&self) -> &Arc<AllocationTracker> {
        &self.tracker
    }

    /// The wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: RawAllocator> RawAllocator for TrackingAllocator<A> {
    #[track_caller]
    fn allocate(&self, size: usize) -> *mut u8 {
        self.allocate_at(size, CallSite::caller())
    }

    #[track_caller]
    unsafe fn free(&self, ptr: *mut u8) {
        // SAFETY: forwarded caller contract.
        unsafe { self.free_at(ptr, CallSite::caller()) }
    }

    fn allocate_at(&self, size: usize, site: CallSite) -> *mut u8 {
        let ptr = self.inner.allocate_at(size, site);
        if ptr.is_null() && size == 0 {
            return ptr;
        }
        self.tracker.on_allocate(ptr as usize, site);
        ptr
    }

    unsafe fn free_at(&self, ptr: *mut u8, site: CallSite) {
        if ptr.is_null() {
            return;
        }
        self.tracker.on_free(ptr as usize, site);
        // SAFETY: the tracker has just confirmed this is not a repeat free;
        // the rest of the contract is the caller's.
        unsafe { self.inner.free_at(ptr, site) }
    }
}

/// Explicit teardown for a tracking scope.
///
/// Dumps the tracker's leaks when dropped. Keep one alive for the life of
/// the process (or test) whose allocations should be checked.
#[must_use = "a LeakCheck reports when it is dropped"]
#[derive(Debug)]
pub struct LeakCheck {
    tracker: Option<Arc<AllocationTracker>>,
}

impl LeakCheck {
    /// Report `tracker`'s leaks when this guard drops.
    pub fn new(tracker: Arc<AllocationTracker>) -> Self {
        Self {
            tracker: Some(tracker),
        }
    }

    /// Report now and consume the guard.
    pub fn finish(mut self) -> LeakReport {
        self.tracker
            .take()
            .map(|t| t.dump_leaks())
            .unwrap_or_default()
    }
}

impl Drop for LeakCheck {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.dump_leaks();
        }
    }
}
