//! Core types for the vkbridge marshaling layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: native
//! address and handle newtypes, call-site attribution for the allocation
//! tracker, and the recoverable error types surfaced to generated bindings.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod site;

pub use error::{CallError, LoadError, ResolveError};
pub use id::{InstanceHandle, ProcAddr, RawValue, Word};
pub use site::CallSite;
