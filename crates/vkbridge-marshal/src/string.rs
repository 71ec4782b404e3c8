//! Single-string marshaling.

use std::ffi::{c_char, CStr};
use std::ptr;

use vkbridge_alloc::{allocate_block, RawAllocator, Release};
use vkbridge_core::CallSite;

use crate::view::NativeString;

/// How an empty host string is represented natively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyString {
    /// A null pointer, read by most entry points as "absent".
    #[default]
    Null,
    /// A one-byte block holding only the terminator.
    Terminated,
}

/// Copy `s` into a fresh zero-terminated native buffer.
///
/// The empty string becomes a null pointer with a no-op release. Interior
/// NUL bytes are copied as-is, so native readers see the string cut short
/// at the first one.
#[track_caller]
pub fn string_to_native<'a>(alloc: &'a dyn RawAllocator, s: &str) -> NativeString<'a> {
    encode_string(alloc, s, EmptyString::Null, CallSite::caller())
}

/// [`string_to_native`] with an explicit policy for the empty string.
#[track_caller]
pub fn string_to_native_with<'a>(
    alloc: &'a dyn RawAllocator,
    s: &str,
    empty: EmptyString,
) -> NativeString<'a> {
    encode_string(alloc, s, empty, CallSite::caller())
}

pub(crate) fn encode_string<'a>(
    alloc: &'a dyn RawAllocator,
    s: &str,
    empty: EmptyString,
    site: CallSite,
) -> NativeString<'a> {
    if s.is_empty() && empty == EmptyString::Null {
        return NativeString::from_parts(ptr::null(), Release::new(site));
    }
    let bytes = s.as_bytes();
    let block = match allocate_block(alloc, bytes.len() + 1, site) {
        Some(block) => block,
        None => unreachable!("a terminated string is never zero bytes"),
    };
    // SAFETY: the block holds `len + 1` bytes and cannot overlap `s`.
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), block.as_ptr(), bytes.len());
        block.as_ptr().add(bytes.len()).write(0);
    }
    NativeString::from_parts(
        block.as_ptr().cast::<c_char>(),
        Release::single(alloc, block, site),
    )
}

/// Copy a zero-terminated native string into a `String`.
///
/// Null and strings whose first byte is zero decode to `""`. Bytes that are
/// not UTF-8 are replaced with U+FFFD.
///
/// # Safety
///
/// Unless null, `ptr` must point to a readable, zero-terminated buffer.
/// The scan has no bound other than the terminator.
pub unsafe fn native_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: forwarded caller contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

/// Decode a fixed-capacity native char array, such as a name field inside
/// a properties struct. Stops at the first zero byte or after `capacity`
/// bytes, whichever comes first.
///
/// # Safety
///
/// Unless null, `ptr` must point to `capacity` readable bytes.
pub unsafe fn native_to_string_bounded(ptr: *const c_char, capacity: usize) -> String {
    if ptr.is_null() || capacity == 0 {
        return String::new();
    }
    // SAFETY: forwarded caller contract.
    let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), capacity) };
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(capacity);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
