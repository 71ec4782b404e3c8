//! The unmanaged allocator contract and its libc-backed implementation.

use std::ptr::NonNull;
use std::sync::Arc;

use vkbridge_core::CallSite;

/// Alignment every [`RawAllocator`] block must meet. Element types with a
/// stricter alignment are rejected when a conversion is compiled.
pub const MIN_BLOCK_ALIGN: usize = 2 * std::mem::size_of::<usize>();

/// Process-wide `allocate`/`free` primitive for native-bound memory.
///
/// Contract:
/// - `allocate(0)` is permitted and may return null; callers treat that
///   as "no buffer", not a failure.
/// - `allocate(n)` returning null for `n > 0` means the process is out of
///   unmanaged memory. There is no recovery path in this layer.
/// - `free` on an address this allocator did not hand out, or one already
///   freed, is undefined. [`TrackingAllocator`](crate::TrackingAllocator)
///   exists to catch that during development.
///
/// Implementations must be callable from any number of threads at once.
pub trait RawAllocator: Send + Sync {
    /// Allocate `size` bytes aligned to at least [`MIN_BLOCK_ALIGN`].
    fn allocate(&self, size: usize) -> *mut u8;

    /// Free a block returned by [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block obtained from this allocator.
    unsafe fn free(&self, ptr: *mut u8);

    /// Allocate on behalf of `site`.
    ///
    /// Tracking wrappers override this to attribute the block; plain
    /// allocators ignore the site.
    fn allocate_at(&self, size: usize, site: CallSite) -> *mut u8 {
        let _ = site;
        self.allocate(size)
    }

    /// Free on behalf of `site`.
    ///
    /// # Safety
    ///
    /// Same contract as [`free`](Self::free).
    unsafe fn free_at(&self, ptr: *mut u8, site: CallSite) {
        let _ = site;
        // SAFETY: forwarded caller contract.
        unsafe { self.free(ptr) }
    }
}

impl<A: RawAllocator + ?Sized> RawAllocator for Arc<A> {
    fn allocate(&self, size: usize) -> *mut u8 {
        (**self).allocate(size)
    }

    unsafe fn free(&self, ptr: *mut u8) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).free(ptr) }
    }

    fn allocate_at(&self, size: usize, site: CallSite) -> *mut u8 {
        (**self).allocate_at(size, site)
    }

    unsafe fn free_at(&self, ptr: *mut u8, site: CallSite) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).free_at(ptr, site) }
    }
}

/// The C runtime heap (`malloc`/`free`).
///
/// `malloc` returns memory aligned for any fundamental type, which covers
/// every element type the marshaling crates write.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl RawAllocator for SystemAllocator {
    fn allocate(&self, size: usize) -> *mut u8 {
        if size == 0 {
            return std::ptr::null_mut();
        }
        // SAFETY: malloc has no preconditions; a null return is reported
        // to the caller unchanged.
        unsafe { libc::malloc(size).cast::<u8>() }
    }

    unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        // SAFETY: caller guarantees `ptr` came from `malloc` above and is live.
        unsafe { libc::free(ptr.cast::<libc::c_void>()) }
    }
}

/// Allocate a block for a conversion, enforcing the fatal-failure policy.
///
/// Returns `None` for `size == 0` without touching the allocator. A null
/// result for a non-zero size panics: continuing would hand native code a
/// null buffer it was promised was filled.
pub fn allocate_block(
    alloc: &dyn RawAllocator,
    size: usize,
    site: CallSite,
) -> Option<NonNull<u8>> {
    if size == 0 {
        return None;
    }
    match NonNull::new(alloc.allocate_at(size, site)) {
        Some(block) => Some(block),
        None => panic!("vkbridge: unmanaged allocation of {size} bytes failed at {site}"),
    }
}
