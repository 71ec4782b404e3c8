//! Marshaling between Rust values and native buffers.
//!
//! Every conversion into native memory returns the native representation
//! together with the [`Release`](vkbridge_alloc::Release) that owns it;
//! conversions back out copy into fresh Rust values and never take
//! ownership of native memory.
//!
//! | Direction | Strings | Plain data | Arbitrary structs |
//! |-----------|---------|------------|-------------------|
//! | into native | [`string_to_native`], [`string_array_to_native`] | [`slice_to_native`], [`value_to_native`], [`output_array`] | [`copy_to_native`], [`convert_to_native`], [`convert_with_release`] |
//! | out of native | [`native_to_string`], [`native_array_to_strings`] | [`native_to_vec`], [`native_to_value`] | caller-specific |
//!
//! Empty inputs never allocate: they produce a null address, a zero count,
//! and a release that owns nothing.
//!
//! All public entry points that allocate are `#[track_caller]`, so an
//! allocation tracker attributes every block to the binding code that
//! asked for it rather than to this crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod convert;
pub mod scalar;
pub mod sequence;
pub mod string;
pub mod view;

pub use convert::{convert_to_native, convert_with_release, copy_to_native};
pub use scalar::{native_to_value, value_to_native};
pub use sequence::{
    native_array_to_strings, native_to_vec, output_array, slice_to_native,
    string_array_to_native,
};
pub use string::{
    native_to_string, native_to_string_bounded, string_to_native, string_to_native_with,
    EmptyString,
};
pub use view::{NativeArray, NativeSlice, NativeString};
