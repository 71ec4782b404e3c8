//! Test utilities for vkbridge development.
//!
//! Provides allocators that observe or sabotage the marshaling layer
//! ([`CountingAllocator`], [`FailingAllocator`]) and a [`fake_library`]
//! of `extern "C"` entry points served through a fake
//! `get_instance_proc_addr`.

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod allocators;
pub mod fake_library;

pub use allocators::{CountingAllocator, FailingAllocator};
