//! Allocators for observing conversions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use vkbridge_alloc::{RawAllocator, SystemAllocator};

/// Records the size of every allocation and counts frees.
///
/// Backed by [`SystemAllocator`], so the memory is real and can be read
/// and written by the code under test. With a budget, allocations past it
/// return null, which lets a test watch what a failed conversion frees.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    sizes: Mutex<Vec<usize>>,
    frees: AtomicUsize,
    budget: Option<usize>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `budget` allocations, then return null.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    /// Number of non-null blocks handed out.
    pub fn allocations(&self) -> usize {
        self.lock().len()
    }

    /// Number of non-null blocks freed.
    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Requested sizes, in allocation order.
    pub fn sizes(&self) -> Vec<usize> {
        self.lock().clone()
    }

    /// Blocks allocated and not yet freed.
    pub fn live(&self) -> usize {
        self.allocations() - self.frees()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<usize>> {
        self.sizes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RawAllocator for CountingAllocator {
    fn allocate(&self, size: usize) -> *mut u8 {
        let mut sizes = self.lock();
        if self.budget.is_some_and(|budget| sizes.len() >= budget) {
            return std::ptr::null_mut();
        }
        let ptr = SystemAllocator.allocate(size);
        if !ptr.is_null() {
            sizes.push(size);
        }
        ptr
    }

    unsafe fn free(&self, ptr: *mut u8) {
        if !ptr.is_null() {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
        // SAFETY: forwarded caller contract.
        unsafe { SystemAllocator.free(ptr) }
    }
}

/// Succeeds for the first `budget` allocations, then returns null.
///
/// Drives the out-of-memory path, which panics.
#[derive(Debug)]
pub struct FailingAllocator {
    remaining: AtomicUsize,
}

impl FailingAllocator {
    /// Allow `budget` successful allocations.
    pub fn new(budget: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(budget),
        }
    }

    /// An allocator that never succeeds.
    pub fn exhausted() -> Self {
        Self::new(0)
    }
}

impl RawAllocator for FailingAllocator {
    fn allocate(&self, size: usize) -> *mut u8 {
        let granted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if granted {
            SystemAllocator.allocate(size)
        } else {
            std::ptr::null_mut()
        }
    }

    unsafe fn free(&self, ptr: *mut u8) {
        // SAFETY: forwarded caller contract.
        unsafe { SystemAllocator.free(ptr) }
    }
}
