//! The process-wide default allocator.
//!
//! Which allocator backs [`default_allocator`] is a build-time decision:
//! the plain C heap normally, or the C heap behind a global tracker when
//! the `track-allocations` feature is enabled.

use crate::allocator::RawAllocator;
#[cfg(not(feature = "track-allocations"))]
use crate::allocator::SystemAllocator;

#[cfg(feature = "track-allocations")]
use std::sync::{Arc, OnceLock};

#[cfg(feature = "track-allocations")]
use crate::{
    allocator::SystemAllocator,
    tracker::{AllocationTracker, LeakReport},
    tracking::{LeakCheck, TrackingAllocator},
};

/// The allocator generated bindings use when they are not handed one.
#[cfg(not(feature = "track-allocations"))]
pub fn default_allocator() -> &'static dyn RawAllocator {
    static SYSTEM: SystemAllocator = SystemAllocator;
    &SYSTEM
}

/// The allocator generated bindings use when they are not handed one.
#[cfg(feature = "track-allocations")]
pub fn default_allocator() -> &'static dyn RawAllocator {
    static TRACKING: OnceLock<TrackingAllocator<SystemAllocator>> = OnceLock::new();
    TRACKING.get_or_init(|| TrackingAllocator::new(SystemAllocator, Arc::clone(global_tracker())))
}

/// The tracker behind [`default_allocator`].
#[cfg(feature = "track-allocations")]
pub fn global_tracker() -> &'static Arc<AllocationTracker> {
    static TRACKER: OnceLock<Arc<AllocationTracker>> = OnceLock::new();
    TRACKER.get_or_init(|| Arc::new(AllocationTracker::new()))
}

/// Report blocks still held through [`default_allocator`].
///
/// Call once at shutdown. Prints only when something leaked.
#[cfg(feature = "track-allocations")]
pub fn dump_leaks() -> LeakReport {
    global_tracker().dump_leaks()
}

/// A guard that calls [`dump_leaks`] when it drops.
#[cfg(feature = "track-allocations")]
pub fn leak_check() -> LeakCheck {
    LeakCheck::new(Arc::clone(global_tracker()))
}
