//! Marshal, resolve, and call the fake library through every strategy
//! compiled into this build.

use std::sync::Arc;

use proptest::prelude::*;
use vkbridge_alloc::{AllocationTracker, SystemAllocator, TrackingAllocator};
use vkbridge_core::{InstanceHandle, ResolveError};
use vkbridge_dispatch::{
    call, BridgeInvoker, DefaultInvoker, Invoker, ProcCache, Resolver, ReturnKind, MAX_ARGS,
};
use vkbridge_marshal::{output_array, slice_to_native, string_array_to_native, string_to_native};
use vkbridge_test_utils::fake_library::{self, FAKE_INSTANCE, FILL_VALUES, INCOMPLETE};

fn resolver() -> Resolver {
    unsafe { Resolver::new(fake_library::get_instance_proc_addr) }
}

fn strategies() -> Vec<Box<dyn Invoker>> {
    let mut all: Vec<Box<dyn Invoker>> = vec![Box::new(BridgeInvoker)];
    #[cfg(feature = "raw-call")]
    all.push(Box::new(vkbridge_dispatch::RawInvoker));
    all
}

fn tracked() -> TrackingAllocator<SystemAllocator> {
    TrackingAllocator::new(SystemAllocator, Arc::new(AllocationTracker::new()))
}

#[test]
fn string_argument() {
    let alloc = tracked();
    let strlen = resolver().require(InstanceHandle::NULL, "fake_strlen").unwrap();
    for invoker in strategies() {
        let name = string_to_native(&alloc, "VK_KHR_surface");
        let r = unsafe { invoker.invoke(strlen, &[name.as_word()], ReturnKind::Word) }.unwrap();
        assert_eq!(r.as_word(), 14, "{}", invoker.name());

        let empty = string_to_native(&alloc, "");
        let r = unsafe { invoker.invoke(strlen, &[empty.as_word()], ReturnKind::Word) }.unwrap();
        assert_eq!(r.as_word(), 0);

        name.release();
        empty.release();
    }
    assert!(alloc.tracker().leaks().is_empty());
}

#[test]
fn string_array_argument() {
    let alloc = tracked();
    let total_len = resolver().require(InstanceHandle::NULL, "fake_total_len").unwrap();
    let layers = string_array_to_native(&alloc, &["abc", "", "defgh"]);
    for invoker in strategies() {
        let r = unsafe {
            invoker.invoke(total_len, &[layers.as_word(), layers.len()], ReturnKind::Word)
        }
        .unwrap();
        assert_eq!(r.as_word(), 8);
    }
    layers.release();
    assert!(alloc.tracker().leaks().is_empty());
}

#[test]
fn primitive_array_argument() {
    let alloc = tracked();
    let sum = resolver().require(InstanceHandle::NULL, "fake_sum_u32").unwrap();
    let values = slice_to_native(&alloc, &[1u32, 2, 3, u32::MAX]);
    for invoker in strategies() {
        let r = unsafe { invoker.invoke(sum, &[values.as_word(), values.len()], ReturnKind::Int64) }
            .unwrap();
        assert_eq!(r.as_u64(), 6 + u64::from(u32::MAX));
    }
}

#[test]
fn output_parameters_follow_two_call_idiom() {
    let alloc = tracked();
    let fill = resolver().require(InstanceHandle::NULL, "fake_fill_u32").unwrap();
    for invoker in strategies() {
        let mut count = output_array::<u32>(&alloc, 1);
        let r = unsafe { invoker.invoke(fill, &[count.as_word(), 0], ReturnKind::Int32) }.unwrap();
        assert_eq!(r.as_i32(), 0);
        let available = count.read_back()[0] as usize;
        assert_eq!(available, FILL_VALUES.len());

        let mut out = output_array::<u32>(&alloc, available);
        let r = unsafe {
            invoker.invoke(fill, &[count.as_mut_ptr() as usize, out.as_mut_ptr() as usize], ReturnKind::Int32)
        }
        .unwrap();
        assert_eq!(r.as_i32(), 0);
        assert_eq!(out.read_back(), FILL_VALUES);

        // Too small a buffer reports truncation through the raw result.
        unsafe { count.as_mut_ptr().write(2) };
        let r = unsafe {
            invoker.invoke(fill, &[count.as_mut_ptr() as usize, out.as_mut_ptr() as usize], ReturnKind::Int32)
        }
        .unwrap();
        assert_eq!(r.as_i32(), INCOMPLETE);
        assert_eq!(count.read_back(), vec![2]);

        count.release();
        out.release();
    }
    assert!(alloc.tracker().leaks().is_empty());
}

#[test]
fn negative_result_is_returned_raw() {
    let addr = resolver().require(InstanceHandle::NULL, "fake_negative_result").unwrap();
    for invoker in strategies() {
        let r = unsafe { call(invoker.as_ref(), addr, &[], ReturnKind::Int32) }.unwrap();
        assert_eq!(r.as_i32(), -3);
        assert_eq!(r.as_u32(), 0xFFFF_FFFD);
    }
}

#[test]
fn every_arity_up_to_the_limit() {
    let addr = resolver().require(InstanceHandle::NULL, "fake_sum_twelve").unwrap();
    let args: Vec<usize> = (1..=MAX_ARGS).map(|i| i * 100).collect();
    let expected: usize = args.iter().enumerate().map(|(i, v)| (i + 1) * v).sum();
    for invoker in strategies() {
        let r = unsafe { invoker.invoke(addr, &args, ReturnKind::Word) }.unwrap();
        assert_eq!(r.as_word(), expected, "{}", invoker.name());
    }
}

#[test]
fn three_word_call() {
    let addr = resolver().require(InstanceHandle::NULL, "fake_sum_words").unwrap();
    let r = unsafe { DefaultInvoker::default().invoke(addr, &[1, 2, 3], ReturnKind::Word) }.unwrap();
    assert_eq!(r.as_word(), 6);
}

#[test]
fn void_call() {
    let addr = resolver().require(InstanceHandle::NULL, "fake_noop").unwrap();
    for invoker in strategies() {
        let r = unsafe { invoker.invoke(addr, &[], ReturnKind::Void) }.unwrap();
        assert_eq!(r.as_u64(), 0);
    }
}

#[test]
fn instance_level_symbol_through_cache() {
    let cache = ProcCache::new(resolver());
    assert_eq!(
        cache.require(InstanceHandle::NULL, "fake_instance_id"),
        Err(ResolveError::SymbolNotFound {
            name: "fake_instance_id".into()
        })
    );
    let addr = cache.require(FAKE_INSTANCE, "fake_instance_id").unwrap();
    let r = unsafe { BridgeInvoker.invoke(addr, &[FAKE_INSTANCE.0], ReturnKind::Word) }.unwrap();
    assert_eq!(r.as_word(), FAKE_INSTANCE.0);

    assert_eq!(cache.forget_instance(FAKE_INSTANCE), 1);
}

#[test]
fn missing_symbol_never_reaches_an_invoker() {
    let r = resolver();
    let addr = r.resolve(InstanceHandle::NULL, "vkCreateRayTracingPipelinesKHR");
    assert!(addr.is_null());
    let err = r.require(InstanceHandle::NULL, "vkCreateRayTracingPipelinesKHR").unwrap_err();
    assert!(err.to_string().contains("vkCreateRayTracingPipelinesKHR"));
    for invoker in strategies() {
        assert!(unsafe { invoker.invoke(addr, &[], ReturnKind::Int32) }.is_err());
    }
}

proptest! {
    #[test]
    fn unknown_names_resolve_to_null(name in "[A-Za-z_][A-Za-z0-9_]{0,48}") {
        prop_assume!(!fake_library::GLOBAL_SYMBOLS.contains(&name.as_str()));
        prop_assume!(name != "fake_instance_id");
        prop_assert!(resolver().resolve(InstanceHandle::NULL, &name).is_null());
        prop_assert!(resolver().resolve(FAKE_INSTANCE, &name).is_null());
    }

    #[test]
    fn word_arguments_arrive_unchanged(a in any::<usize>(), b in any::<usize>(), c in any::<usize>()) {
        let addr = resolver().resolve(InstanceHandle::NULL, "fake_sum_words");
        let expected = a.wrapping_add(b).wrapping_add(c);
        for invoker in strategies() {
            let r = unsafe { invoker.invoke(addr, &[a, b, c], ReturnKind::Word) }.unwrap();
            prop_assert_eq!(r.as_word(), expected);
        }
    }
}
