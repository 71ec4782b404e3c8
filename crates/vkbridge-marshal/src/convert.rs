//! Host record arrays to native struct arrays.
//!
//! Two modes. [`copy_to_native`] bit-copies records whose host layout is
//! already the native layout. [`convert_to_native`] and
//! [`convert_with_release`] map each record through a function first;
//! the latter lets the mapping marshal nested strings and arrays whose
//! blocks join the result's release.

use std::mem::size_of;
use std::ptr;

use bytemuck::Pod;
use vkbridge_alloc::{RawAllocator, Release};
use vkbridge_core::CallSite;

use crate::view::{allocate_array, NativeArray};

/// Identity mode: copy `records` into a native array of `D` bit for bit.
///
/// `D` is limited to [`MIN_BLOCK_ALIGN`](vkbridge_alloc::MIN_BLOCK_ALIGN)
/// alignment, checked at compile time like every array conversion here.
///
/// # Panics
///
/// Panics if `S` and `D` differ in size. A width mismatch is a programming
/// error, not a runtime condition.
#[track_caller]
pub fn copy_to_native<'a, S: Pod, D: Pod>(
    alloc: &'a dyn RawAllocator,
    records: &[S],
) -> NativeArray<'a, D> {
    let site = CallSite::caller();
    if size_of::<S>() != size_of::<D>() {
        panic!(
            "vkbridge: element width mismatch at {site}: host records are {} bytes, native {} bytes",
            size_of::<S>(),
            size_of::<D>()
        );
    }
    let Some(array) = allocate_array::<D>(alloc, records.len(), site) else {
        return NativeArray::empty(site);
    };
    // SAFETY: both types are `Pod` with equal size, so the byte copy yields
    // valid `D` values; the fresh block cannot overlap `records`.
    unsafe {
        ptr::copy_nonoverlapping(
            records.as_ptr().cast::<u8>(),
            array.as_ptr().cast::<u8>(),
            size_of::<S>() * records.len(),
        )
    };
    NativeArray::from_parts(
        array.as_ptr(),
        records.len(),
        Release::single(alloc, array.cast(), site),
    )
}

/// Transform mode: map each record to its native form and pack the results.
///
/// Records are mapped in order, and element `i` of the result is `map(&records[i])`.
#[track_caller]
pub fn convert_to_native<'a, S, D, F>(
    alloc: &'a dyn RawAllocator,
    records: &[S],
    mut map: F,
) -> NativeArray<'a, D>
where
    D: Copy,
    F: FnMut(&S) -> D,
{
    let site = CallSite::caller();
    build(alloc, records, site, |record, _| map(record))
}

/// Transform mode with nested ownership.
///
/// `map` receives the result's composite release; anything it marshals and
/// attaches there (see [`NativeString::attach_to`](crate::NativeString::attach_to))
/// is freed together with the outer array, sub-blocks first.
///
/// ```
/// use std::ffi::c_char;
/// use vkbridge_alloc::SystemAllocator;
/// use vkbridge_marshal::{convert_with_release, string_to_native};
///
/// #[derive(Clone, Copy)]
/// #[repr(C)]
/// struct Layer {
///     name: *const c_char,
///     version: u32,
/// }
///
/// let alloc = SystemAllocator;
/// let names = ["VK_LAYER_a", "VK_LAYER_b"];
/// let layers = convert_with_release(&alloc, &names, |name, owner| Layer {
///     name: string_to_native(&alloc, name).attach_to(owner),
///     version: 1,
/// });
/// assert_eq!(layers.len(), 2);
/// assert_eq!(layers.block_count(), 3);
/// layers.release();
/// ```
#[track_caller]
pub fn convert_with_release<'a, S, D, F>(
    alloc: &'a dyn RawAllocator,
    records: &[S],
    map: F,
) -> NativeArray<'a, D>
where
    D: Copy,
    F: FnMut(&S, &mut Release<'a>) -> D,
{
    build(alloc, records, CallSite::caller(), map)
}

fn build<'a, S, D, F>(
    alloc: &'a dyn RawAllocator,
    records: &[S],
    site: CallSite,
    mut map: F,
) -> NativeArray<'a, D>
where
    D: Copy,
    F: FnMut(&S, &mut Release<'a>) -> D,
{
    let Some(array) = allocate_array::<D>(alloc, records.len(), site) else {
        return NativeArray::empty(site);
    };
    // The outer block is registered first so it is freed last. If `map`
    // panics, the partially built release still frees what exists.
    let mut release = Release::single(alloc, array.cast(), site);
    for (i, record) in records.iter().enumerate() {
        let native = map(record, &mut release);
        // SAFETY: `array` has room for `records.len()` elements of `D`.
        unsafe { array.as_ptr().add(i).write(native) };
    }
    NativeArray::from_parts(array.as_ptr(), records.len(), release)
}
