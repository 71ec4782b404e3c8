//! Runtime symbol resolution and native invocation.
//!
//! The native library is opened at runtime ([`NativeLibrary`]) and only
//! its "get instance proc address" export is looked up directly. Every
//! other entry point is resolved by name through a [`Resolver`] (or the
//! memoising [`ProcCache`]) and called through an [`Invoker`].
//!
//! Two invocation strategies exist and one is chosen at build time:
//!
//! - [`BridgeInvoker`] (default): calls through compiled `extern "C"`
//!   adapters, one per arity and return width.
//! - `RawInvoker` (cargo feature `raw-call`): builds a libffi call
//!   interface per arity and return width, with no per-signature code.
//!
//! Both accept up to [`MAX_ARGS`] machine-word arguments and return the
//! raw integer result unconverted. Neither can pass floating-point or
//! variadic arguments: the argument list is `&[Word]`, so such
//! signatures cannot be expressed in the first place.
//!
//! After every successful call the optional [post-call hook](hook) runs
//! in debug builds or with the `debug-break` feature.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod hook;
pub mod invoke;
pub mod loader;
pub mod resolve;

pub use hook::{set_post_call_hook, CallRecord, PostCallHook};
pub use invoke::bridge::BridgeInvoker;
#[cfg(feature = "raw-call")]
pub use invoke::raw::RawInvoker;
pub use invoke::{call, DefaultInvoker, Invoker, ReturnKind, MAX_ARGS};
pub use loader::{LoaderConfig, NativeLibrary};
pub use resolve::{GetInstanceProcAddr, ProcCache, Resolver};
