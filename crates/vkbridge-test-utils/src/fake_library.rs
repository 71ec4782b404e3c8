//! A fake native library.
//!
//! Every entry point takes machine words or pointers so it can be reached
//! through either invocation strategy. [`get_instance_proc_addr`] plays the
//! role of the native library's "get proc address" export.

use std::ffi::{c_char, CStr};
use std::mem;

use vkbridge_core::InstanceHandle;

/// The instance handle under which instance-level fakes resolve.
pub const FAKE_INSTANCE: InstanceHandle = InstanceHandle(0xF00D);

/// Result code written by [`fake_fill_u32`] when the output was truncated.
pub const INCOMPLETE: i32 = 5;

/// Values produced by [`fake_fill_u32`].
pub const FILL_VALUES: [u32; 4] = [10, 20, 30, 40];

/// Names [`get_instance_proc_addr`] resolves under a null instance.
pub const GLOBAL_SYMBOLS: &[&str] = &[
    "fake_noop",
    "fake_sum_words",
    "fake_sum_twelve",
    "fake_strlen",
    "fake_total_len",
    "fake_fill_u32",
    "fake_negative_result",
    "fake_sum_u32",
];

pub extern "C" fn fake_noop() {}

pub extern "C" fn fake_sum_words(a: usize, b: usize, c: usize) -> usize {
    a.wrapping_add(b).wrapping_add(c)
}

#[allow(clippy::too_many_arguments)]
pub extern "C" fn fake_sum_twelve(
    a0: usize,
    a1: usize,
    a2: usize,
    a3: usize,
    a4: usize,
    a5: usize,
    a6: usize,
    a7: usize,
    a8: usize,
    a9: usize,
    a10: usize,
    a11: usize,
) -> usize {
    // Weighted so swapped arguments change the result.
    [a0, a1, a2, a3, a4, a5, a6, a7, a8, a9, a10, a11]
        .iter()
        .enumerate()
        .fold(0usize, |acc, (i, v)| acc.wrapping_add((i + 1).wrapping_mul(*v)))
}

/// Length of a zero-terminated string; null is 0.
///
/// # Safety
///
/// `s` must be null or a valid zero-terminated string.
pub unsafe extern "C" fn fake_strlen(s: *const c_char) -> usize {
    if s.is_null() {
        return 0;
    }
    // SAFETY: caller contract.
    unsafe { CStr::from_ptr(s) }.to_bytes().len()
}

/// Sum of the lengths of `count` strings; null slots count as 0.
///
/// # Safety
///
/// `names` must be null or point to `count` string pointers, each null or
/// zero-terminated.
pub unsafe extern "C" fn fake_total_len(names: *const *const c_char, count: usize) -> usize {
    if names.is_null() {
        return 0;
    }
    (0..count)
        // SAFETY: caller contract.
        .map(|i| unsafe { fake_strlen(*names.add(i)) })
        .sum()
}

/// Two-call enumeration: with a null `out`, writes the available count;
/// otherwise fills up to `*count` values and returns [`INCOMPLETE`] when
/// truncated.
///
/// # Safety
///
/// `count` must be valid for reads and writes; `out`, unless null, must
/// have room for `*count` values.
pub unsafe extern "C" fn fake_fill_u32(count: *mut u32, out: *mut u32) -> i32 {
    let available = FILL_VALUES.len() as u32;
    if out.is_null() {
        // SAFETY: caller contract.
        unsafe { count.write(available) };
        return 0;
    }
    // SAFETY: caller contract.
    let capacity = unsafe { count.read() };
    let written = capacity.min(available);
    for i in 0..written as usize {
        // SAFETY: `i < *count`, within the caller's buffer.
        unsafe { out.add(i).write(FILL_VALUES[i]) };
    }
    // SAFETY: caller contract.
    unsafe { count.write(written) };
    if written < available {
        INCOMPLETE
    } else {
        0
    }
}

pub extern "C" fn fake_negative_result() -> i32 {
    -3
}

/// Sum of `count` packed `u32` values, widened to 64 bits.
///
/// # Safety
///
/// `values` must be null or point to `count` readable `u32`s.
pub unsafe extern "C" fn fake_sum_u32(values: *const u32, count: usize) -> u64 {
    if values.is_null() {
        return 0;
    }
    (0..count)
        // SAFETY: caller contract.
        .map(|i| u64::from(unsafe { values.add(i).read_unaligned() }))
        .sum()
}

/// Resolves only under [`FAKE_INSTANCE`]; returns the instance handle.
pub extern "C" fn fake_instance_id(instance: InstanceHandle) -> usize {
    instance.0
}

type VoidFn = unsafe extern "C" fn();

/// Fake "get proc address": global fakes resolve under any instance,
/// `fake_instance_id` only under [`FAKE_INSTANCE`], everything else is
/// absent.
///
/// # Safety
///
/// `name` must be null or a valid zero-terminated string.
pub unsafe extern "C" fn get_instance_proc_addr(
    instance: InstanceHandle,
    name: *const c_char,
) -> Option<VoidFn> {
    if name.is_null() {
        return None;
    }
    // SAFETY: caller contract.
    let name = unsafe { CStr::from_ptr(name) }.to_str().ok()?;
    // SAFETY: every cast is between `extern "C"` fn pointers of the same
    // size; callers restore the real signature before calling.
    let f: VoidFn = unsafe {
        match name {
            "fake_noop" => mem::transmute::<extern "C" fn(), VoidFn>(fake_noop),
            "fake_sum_words" => mem::transmute::<extern "C" fn(usize, usize, usize) -> usize, VoidFn>(
                fake_sum_words,
            ),
            "fake_sum_twelve" => mem::transmute::<
                extern "C" fn(
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                    usize,
                ) -> usize,
                VoidFn,
            >(fake_sum_twelve),
            "fake_strlen" => {
                mem::transmute::<unsafe extern "C" fn(*const c_char) -> usize, VoidFn>(fake_strlen)
            }
            "fake_total_len" => mem::transmute::<
                unsafe extern "C" fn(*const *const c_char, usize) -> usize,
                VoidFn,
            >(fake_total_len),
            "fake_fill_u32" => {
                mem::transmute::<unsafe extern "C" fn(*mut u32, *mut u32) -> i32, VoidFn>(
                    fake_fill_u32,
                )
            }
            "fake_negative_result" => {
                mem::transmute::<extern "C" fn() -> i32, VoidFn>(fake_negative_result)
            }
            "fake_sum_u32" => {
                mem::transmute::<unsafe extern "C" fn(*const u32, usize) -> u64, VoidFn>(
                    fake_sum_u32,
                )
            }
            "fake_instance_id" if instance == FAKE_INSTANCE => {
                mem::transmute::<extern "C" fn(InstanceHandle) -> usize, VoidFn>(fake_instance_id)
            }
            _ => return None,
        }
    };
    Some(f)
}
