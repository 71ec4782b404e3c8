//! The post-call hook sees every successful call. Kept in its own test
//! binary because the hook slot is process-wide.

use std::sync::atomic::{AtomicUsize, Ordering};

use vkbridge_core::InstanceHandle;
use vkbridge_dispatch::hook::hooks_enabled;
use vkbridge_dispatch::{set_post_call_hook, CallRecord, DefaultInvoker, Invoker, Resolver, ReturnKind};
use vkbridge_test_utils::fake_library;

static CALLS: AtomicUsize = AtomicUsize::new(0);
static LAST_RESULT: AtomicUsize = AtomicUsize::new(0);

fn record(call: &CallRecord) {
    CALLS.fetch_add(1, Ordering::SeqCst);
    LAST_RESULT.store(call.result.as_word(), Ordering::SeqCst);
}

#[test]
fn hook_runs_after_successful_calls_only() {
    let resolver = unsafe { Resolver::new(fake_library::get_instance_proc_addr) };
    let sum = resolver.require(InstanceHandle::NULL, "fake_sum_words").unwrap();

    assert!(set_post_call_hook(Some(record)).is_none());
    let invoker = DefaultInvoker::default();
    unsafe { invoker.invoke(sum, &[4, 5, 6], ReturnKind::Word) }.unwrap();
    // Refused calls never reach native code, so no hook either.
    let _ = unsafe { invoker.invoke(vkbridge_core::ProcAddr::NULL, &[], ReturnKind::Void) };

    if hooks_enabled() {
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(LAST_RESULT.load(Ordering::SeqCst), 15);
    } else {
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    assert!(set_post_call_hook(None).is_some());
    unsafe { invoker.invoke(sum, &[1, 1, 1], ReturnKind::Word) }.unwrap();
    assert!(CALLS.load(Ordering::SeqCst) <= 1);
}
