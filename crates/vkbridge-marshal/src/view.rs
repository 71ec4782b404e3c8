//! Owned conversion results and non-owning native views.

use std::ffi::c_char;
use std::fmt;
use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};

use vkbridge_alloc::{allocate_block, RawAllocator, Release, MIN_BLOCK_ALIGN};
use vkbridge_core::{CallSite, Word};

/// Non-owning `(address, count)` view of contiguous native elements.
///
/// Carries no lifetime: whoever created it must keep the backing block
/// alive while the view is in use.
pub struct NativeSlice<T> {
    ptr: *const T,
    len: usize,
}

impl<T> Clone for NativeSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NativeSlice<T> {}

impl<T> fmt::Debug for NativeSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSlice")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

impl<T> NativeSlice<T> {
    /// View `len` elements starting at `ptr`.
    pub fn new(ptr: *const T, len: usize) -> Self {
        Self { ptr, len }
    }

    /// The empty view (null, 0).
    pub fn empty() -> Self {
        Self::new(ptr::null(), 0)
    }

    /// Start address.
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view has no elements or no buffer.
    pub fn is_empty(&self) -> bool {
        self.len == 0 || self.ptr.is_null()
    }

    /// Copy the viewed elements into a `Vec`.
    ///
    /// # Safety
    ///
    /// Unless the view is empty, `ptr` must point to `len` readable,
    /// initialised elements of `T`.
    pub unsafe fn to_vec(&self) -> Vec<T>
    where
        T: Copy,
    {
        if self.is_empty() {
            return Vec::new();
        }
        // SAFETY: forwarded caller contract; unaligned reads tolerate
        // buffers packed by native code.
        (0..self.len)
            .map(|i| unsafe { self.ptr.add(i).read_unaligned() })
            .collect()
    }
}

/// A native array produced by a conversion, with the release that owns it.
pub struct NativeArray<'a, T> {
    ptr: *mut T,
    len: usize,
    release: Release<'a>,
}

// SAFETY: the array buffer is exclusively owned through `release`.
unsafe impl<T: Send> Send for NativeArray<'_, T> {}

impl<T> fmt::Debug for NativeArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeArray")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("blocks", &self.release.len())
            .finish()
    }
}

impl<'a, T> NativeArray<'a, T> {
    /// The `(null, 0, no-op)` result of an empty conversion.
    pub(crate) fn empty(site: CallSite) -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            release: Release::new(site),
        }
    }

    /// Assemble from parts. `ptr` must be null or initialised for `len`
    /// elements and owned (directly or indirectly) by `release`.
    pub(crate) fn from_parts(ptr: *mut T, len: usize, release: Release<'a>) -> Self {
        Self { ptr, len, release }
    }

    /// Start address, null for an empty array.
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Mutable start address, for output parameters.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Start address as a call argument.
    pub fn as_word(&self) -> Word {
        self.ptr as Word
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no buffer.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null()
    }

    /// A non-owning view of the buffer.
    pub fn view(&self) -> NativeSlice<T> {
        NativeSlice::new(self.ptr, if self.ptr.is_null() { 0 } else { self.len })
    }

    /// Borrow the elements.
    pub fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() {
            return &[];
        }
        // SAFETY: every constructor initialises all `len` elements and the
        // buffer stays alive for as long as `self` holds its release.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Copy the elements out, e.g. after native code filled an output buffer.
    pub fn read_back(&self) -> Vec<T>
    where
        T: Copy,
    {
        self.as_slice().to_vec()
    }

    /// Number of unmanaged blocks behind this array (outer buffer plus any
    /// nested sub-allocations).
    pub fn block_count(&self) -> usize {
        self.release.len()
    }

    /// Free the array and everything it owns.
    #[track_caller]
    pub fn release(self) {
        self.release.release();
    }

    /// Split into `(address, count, release)`.
    pub fn into_parts(self) -> (*mut T, usize, Release<'a>) {
        (self.ptr, self.len, self.release)
    }

    /// Move ownership into a composite release and return the address.
    ///
    /// Used inside [`convert_with_release`](crate::convert_with_release)
    /// mappings to embed this array in an outer native struct.
    pub fn attach_to(self, owner: &mut Release<'a>) -> *mut T {
        owner.append(self.release);
        self.ptr
    }
}

/// A zero-terminated native string with the release that owns it.
pub struct NativeString<'a> {
    ptr: *const c_char,
    release: Release<'a>,
}

// SAFETY: the string block is exclusively owned through `release`.
unsafe impl Send for NativeString<'_> {}

impl fmt::Debug for NativeString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeString").field("ptr", &self.ptr).finish()
    }
}

impl<'a> NativeString<'a> {
    pub(crate) fn from_parts(ptr: *const c_char, release: Release<'a>) -> Self {
        Self { ptr, release }
    }

    /// Address of the first byte, or null for an absent string.
    pub fn as_ptr(&self) -> *const c_char {
        self.ptr
    }

    /// Address as a call argument.
    pub fn as_word(&self) -> Word {
        self.ptr as Word
    }

    /// Whether the string was marshaled as null.
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Free the string block.
    #[track_caller]
    pub fn release(self) {
        self.release.release();
    }

    /// Split into `(address, release)`.
    pub fn into_parts(self) -> (*const c_char, Release<'a>) {
        (self.ptr, self.release)
    }

    /// Move ownership into a composite release and return the address.
    pub fn attach_to(self, owner: &mut Release<'a>) -> *const c_char {
        owner.append(self.release);
        self.ptr
    }
}

/// Allocate room for `len` elements of `T`.
///
/// `None` when the byte size is zero. Panics if the size overflows or the
/// allocator breaks its alignment contract. An element type aligned beyond
/// [`MIN_BLOCK_ALIGN`] does not compile.
pub(crate) fn allocate_array<T>(
    alloc: &dyn RawAllocator,
    len: usize,
    site: CallSite,
) -> Option<NonNull<T>> {
    const {
        assert!(
            align_of::<T>() <= MIN_BLOCK_ALIGN,
            "element alignment exceeds what native allocators guarantee"
        )
    };
    let bytes = match size_of::<T>().checked_mul(len) {
        Some(bytes) => bytes,
        None => panic!("vkbridge: native array of {len} elements overflows usize at {site}"),
    };
    let block = allocate_block(alloc, bytes, site)?;
    if block.as_ptr() as usize % align_of::<T>() != 0 {
        panic!(
            "vkbridge: allocator returned {:p}, misaligned for {}-byte alignment",
            block.as_ptr(),
            align_of::<T>()
        );
    }
    Some(block.cast::<T>())
}
