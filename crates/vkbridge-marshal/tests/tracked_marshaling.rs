//! Marshaling under a tracking allocator: every block a conversion makes
//! is released exactly once, and releases are attributed to test code.

use std::sync::Arc;

use vkbridge_alloc::{AllocationRecord, AllocationTracker, SystemAllocator, TrackingAllocator};
use vkbridge_marshal::{
    convert_with_release, native_array_to_strings, native_to_string, output_array,
    slice_to_native, string_array_to_native, string_to_native, value_to_native,
};

fn tracking() -> TrackingAllocator<SystemAllocator> {
    TrackingAllocator::new(SystemAllocator, Arc::new(AllocationTracker::new()))
}

#[test]
fn mixed_conversions_leave_nothing_live() {
    let alloc = tracking();

    let app = string_to_native(&alloc, "triangle");
    let layers = string_array_to_native(&alloc, &["VK_LAYER_KHRONOS_validation"]);
    let queue_priorities = slice_to_native(&alloc, &[1.0f32, 0.5]);
    let api_version = value_to_native(&alloc, &((1u32 << 22) | (3 << 12)));
    let mut count = output_array::<u32>(&alloc, 1);
    unsafe { count.as_mut_ptr().write(7) };

    assert_eq!(alloc.tracker().live_count(), 6);
    assert_eq!(unsafe { native_to_string(app.as_ptr()) }, "triangle");
    assert_eq!(count.read_back(), vec![7]);

    app.release();
    layers.release();
    queue_priorities.release();
    api_version.release();
    count.release();

    assert!(alloc.tracker().leaks().is_empty());
}

#[test]
fn unreleased_result_is_reported_with_its_site() {
    let alloc = tracking();
    let kept = string_array_to_native(&alloc, &["a", "b"]);

    let report = alloc.tracker().leaks();
    assert_eq!(report.len(), 3);
    for leak in report.leaks() {
        assert!(leak.allocated_at.file().ends_with("tracked_marshaling.rs"));
    }

    let (ptr, len, release) = kept.into_parts();
    assert_eq!(unsafe { native_array_to_strings(ptr, len) }, vec!["a", "b"]);
    release.release();
    assert!(alloc.tracker().leaks().is_empty());
}

#[test]
fn freed_records_point_at_the_release_call() {
    let alloc = tracking();
    let s = string_to_native(&alloc, "x");
    let address = s.as_word();
    let release_line = line!() + 1;
    s.release();

    match alloc.tracker().record(address) {
        Some(AllocationRecord::Freed { freed_at, .. }) => {
            assert!(freed_at.file().ends_with("tracked_marshaling.rs"));
            assert_eq!(freed_at.line(), release_line);
        }
        other => panic!("expected a freed record, got {other:?}"),
    }
}

#[test]
fn dropped_result_is_freed_not_leaked() {
    let alloc = tracking();
    {
        let _names = string_array_to_native(&alloc, &["dropped", "too"]);
    }
    assert!(alloc.tracker().leaks().is_empty());
}

#[test]
fn nested_conversion_is_balanced() {
    #[derive(Clone, Copy)]
    #[repr(C)]
    struct Extension {
        name: *const std::ffi::c_char,
        spec_version: u32,
    }

    let alloc = tracking();
    let exts = ["VK_KHR_swapchain", "VK_KHR_maintenance1", ""];
    let native = convert_with_release(&alloc, &exts, |name, owner| Extension {
        name: string_to_native(&alloc, name).attach_to(owner),
        spec_version: 70,
    });
    assert_eq!(alloc.tracker().live_count(), 3);
    assert!(native.as_slice()[2].name.is_null());
    native.release();
    assert_eq!(alloc.tracker().live_count(), 0);
}
