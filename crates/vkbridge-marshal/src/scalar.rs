//! Single plain-data values passed by pointer.

use bytemuck::Pod;
use vkbridge_alloc::RawAllocator;
use vkbridge_core::CallSite;

use crate::sequence::encode_slice;
use crate::view::NativeArray;

/// Copy one value into native memory, for `const T*` parameters that
/// point at a single struct.
#[track_caller]
pub fn value_to_native<'a, T: Pod>(alloc: &'a dyn RawAllocator, value: &T) -> NativeArray<'a, T> {
    encode_slice(alloc, std::slice::from_ref(value), CallSite::caller())
}

/// Read one value back from native memory. Null yields `None`.
///
/// # Safety
///
/// Unless null, `ptr` must point to a readable `T`; it need not be aligned.
pub unsafe fn native_to_value<T: Pod>(ptr: *const T) -> Option<T> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: forwarded caller contract.
    Some(unsafe { ptr.read_unaligned() })
}
