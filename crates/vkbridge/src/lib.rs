//! vkbridge: marshaling and dynamic dispatch for runtime-loaded C-ABI
//! libraries such as Vulkan.
//!
//! This is the facade crate that re-exports the public API of every
//! vkbridge sub-crate. Generated bindings normally depend on this crate
//! alone.
//!
//! # Quick start
//!
//! ```rust
//! use std::ffi::{c_char, CStr};
//! use vkbridge::prelude::*;
//!
//! // Stand-in for a library's "get instance proc address" export.
//! extern "C" fn count_names(names: *const *const c_char, count: usize) -> usize {
//!     (0..count)
//!         .filter(|&i| unsafe { !(*names.add(i)).is_null() })
//!         .count()
//! }
//! unsafe extern "C" fn get_proc(
//!     _instance: InstanceHandle,
//!     name: *const c_char,
//! ) -> Option<unsafe extern "C" fn()> {
//!     match unsafe { CStr::from_ptr(name) }.to_bytes() {
//!         b"countNames" => Some(unsafe {
//!             std::mem::transmute::<
//!                 extern "C" fn(*const *const c_char, usize) -> usize,
//!                 unsafe extern "C" fn(),
//!             >(count_names)
//!         }),
//!         _ => None,
//!     }
//! }
//!
//! let resolver = unsafe { Resolver::new(get_proc) };
//! let addr = resolver.require(InstanceHandle::NULL, "countNames").unwrap();
//! assert!(resolver.require(InstanceHandle::NULL, "vkMissing").is_err());
//!
//! let alloc = default_allocator();
//! let names = string_array_to_native(alloc, &["VK_KHR_surface", ""]);
//! let args = [names.as_word(), names.len()];
//! let result = unsafe { DefaultInvoker::default().invoke(addr, &args, ReturnKind::Word) }.unwrap();
//! assert_eq!(result.as_word(), 1);
//! names.release();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vkbridge-core` | Addresses, handles, raw values, call sites, error enums |
//! | [`alloc`] | `vkbridge-alloc` | Allocators, release actions, allocation tracking |
//! | [`marshal`] | `vkbridge-marshal` | String, scalar, sequence, and struct-array conversion |
//! | [`dispatch`] | `vkbridge-dispatch` | Library loading, symbol resolution, invocation |
//!
//! # Features
//!
//! - `track-allocations`: the default allocator records every block and
//!   `alloc::dump_leaks` reports what was never released.
//! - `raw-call`: [`dispatch::DefaultInvoker`] calls through libffi instead
//!   of compiled adapters.
//! - `debug-break`: run the post-call hook in release builds.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Addresses, handles, and error types (`vkbridge-core`).
pub use vkbridge_core as types;

/// Unmanaged allocation and release (`vkbridge-alloc`).
///
/// Every conversion allocates through a [`alloc::RawAllocator`] and hands
/// back an [`alloc::Release`] that frees the blocks exactly once.
pub use vkbridge_alloc as alloc;

/// Conversions between Rust values and native buffers (`vkbridge-marshal`).
pub use vkbridge_marshal as marshal;

/// Loading, resolution, and invocation (`vkbridge-dispatch`).
///
/// The build-time [`dispatch::DefaultInvoker`] is what generated bindings
/// should call through.
pub use vkbridge_dispatch as dispatch;

/// Common imports for binding code.
///
/// ```rust
/// use vkbridge::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use vkbridge_core::{CallSite, InstanceHandle, ProcAddr, RawValue, Word};

    // Errors
    pub use vkbridge_core::{CallError, LoadError, ResolveError};

    // Allocation
    pub use vkbridge_alloc::{default_allocator, RawAllocator, Release};

    // Marshaling
    pub use vkbridge_marshal::{
        convert_to_native, convert_with_release, copy_to_native, native_array_to_strings,
        native_to_string, native_to_value, native_to_vec, output_array, slice_to_native,
        string_array_to_native, string_to_native, value_to_native, NativeArray, NativeString,
    };

    // Dispatch
    pub use vkbridge_dispatch::{
        DefaultInvoker, Invoker, LoaderConfig, NativeLibrary, ProcCache, Resolver, ReturnKind,
    };
}
