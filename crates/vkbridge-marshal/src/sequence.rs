//! Sequence marshaling: string arrays, plain-data arrays, output buffers.

use std::ffi::c_char;
use std::ptr;

use bytemuck::Pod;
use vkbridge_alloc::{RawAllocator, Release};
use vkbridge_core::CallSite;

use crate::string::{encode_string, native_to_string, EmptyString};
use crate::view::{allocate_array, NativeArray, NativeSlice};

/// Marshal a list of strings into a native `const char* const*` array.
///
/// Each string is marshaled independently with the null-for-empty policy
/// of [`string_to_native`](crate::string_to_native), so empty entries are
/// null slots. The returned release frees every string block and then the
/// pointer array. An empty list yields `(null, 0)` and allocates nothing.
#[track_caller]
pub fn string_array_to_native<'a, S: AsRef<str>>(
    alloc: &'a dyn RawAllocator,
    strings: &[S],
) -> NativeArray<'a, *const c_char> {
    let site = CallSite::caller();
    let Some(array) = allocate_array::<*const c_char>(alloc, strings.len(), site) else {
        return NativeArray::empty(site);
    };
    let mut release = Release::single(alloc, array.cast(), site);
    for (i, s) in strings.iter().enumerate() {
        let element = encode_string(alloc, s.as_ref(), EmptyString::Null, site);
        let address = element.attach_to(&mut release);
        // SAFETY: `array` has room for `strings.len()` pointers.
        unsafe { array.as_ptr().add(i).write(address) };
    }
    NativeArray::from_parts(array.as_ptr(), strings.len(), release)
}

/// Decode `count` native string pointers.
///
/// A null array yields an empty list; null slots decode to `""`.
///
/// # Safety
///
/// Unless null, `array` must point to `count` readable pointers, each null
/// or pointing at a zero-terminated string.
pub unsafe fn native_array_to_strings(array: *const *const c_char, count: usize) -> Vec<String> {
    // SAFETY: forwarded caller contract.
    let slots = unsafe { NativeSlice::new(array, count).to_vec() };
    slots
        .into_iter()
        // SAFETY: each slot is null or a terminated string per the contract.
        .map(|p| unsafe { native_to_string(p) })
        .collect()
}

/// Bulk-copy plain data into a tightly packed native array.
///
/// Element width is `size_of::<T>()`. An empty slice yields `(null, 0)`.
/// `T` may be aligned to at most [`MIN_BLOCK_ALIGN`](vkbridge_alloc::MIN_BLOCK_ALIGN);
/// a stricter type is a compile error.
#[track_caller]
pub fn slice_to_native<'a, T: Pod>(alloc: &'a dyn RawAllocator, values: &[T]) -> NativeArray<'a, T> {
    encode_slice(alloc, values, CallSite::caller())
}

pub(crate) fn encode_slice<'a, T: Pod>(
    alloc: &'a dyn RawAllocator,
    values: &[T],
    site: CallSite,
) -> NativeArray<'a, T> {
    let Some(array) = allocate_array::<T>(alloc, values.len(), site) else {
        return NativeArray::empty(site);
    };
    // SAFETY: `array` has room for `values.len()` elements and is a fresh
    // block, so it cannot overlap `values`.
    unsafe { ptr::copy_nonoverlapping(values.as_ptr(), array.as_ptr(), values.len()) };
    NativeArray::from_parts(
        array.as_ptr(),
        values.len(),
        Release::single(alloc, array.cast(), site),
    )
}

/// Copy `count` plain-data elements out of native memory.
///
/// # Safety
///
/// Unless null, `ptr` must point to `count` readable elements of `T`.
pub unsafe fn native_to_vec<T: Pod>(ptr: *const T, count: usize) -> Vec<T> {
    // SAFETY: forwarded caller contract.
    unsafe { NativeSlice::new(ptr, count).to_vec() }
}

/// A zeroed, caller-freed buffer of `count` elements for native code to
/// fill (the `T* pOut` half of a count/array query).
///
/// Read the result with [`NativeArray::read_back`]. `count == 0` yields
/// `(null, 0)`.
#[track_caller]
pub fn output_array<'a, T: Pod>(alloc: &'a dyn RawAllocator, count: usize) -> NativeArray<'a, T> {
    let site = CallSite::caller();
    let Some(array) = allocate_array::<T>(alloc, count, site) else {
        return NativeArray::empty(site);
    };
    // SAFETY: `array` has room for `count` elements; all-zero is a valid
    // `T` because `T: Pod`.
    unsafe { array.as_ptr().write_bytes(0, count) };
    NativeArray::from_parts(array.as_ptr(), count, Release::single(alloc, array.cast(), site))
}
