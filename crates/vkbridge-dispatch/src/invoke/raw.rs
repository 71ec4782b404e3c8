//! libffi-backed invocation: no per-signature compiled code.
//!
//! Every argument is described to libffi as a `usize`, which covers
//! integers and pointers up to word width. Floating-point register
//! arguments and variadic signatures are out of reach of this strategy.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;

use libffi::middle::{Arg, Cif, CodePtr, Type};
use smallvec::SmallVec;
use vkbridge_core::{ProcAddr, RawValue, Word};

use super::{Invoker, ReturnKind, MAX_ARGS};

thread_local! {
    static CIF_CACHE: RefCell<HashMap<(usize, ReturnKind), Rc<Cif>>> = RefCell::new(HashMap::new());
}

/// Cached CIF for the signature. The borrow ends before the caller runs
/// native code, so a callback may invoke through this strategy again.
fn cif_for(arity: usize, ret: ReturnKind) -> Rc<Cif> {
    CIF_CACHE.with(|cache| {
        let mut map = cache.borrow_mut();
        let cif = map
            .entry((arity, ret))
            .or_insert_with(|| Rc::new(Cif::new((0..arity).map(|_| Type::usize()), return_type(ret))));
        Rc::clone(cif)
    })
}

fn return_type(ret: ReturnKind) -> Type {
    match ret {
        ReturnKind::Void => Type::void(),
        ReturnKind::Int32 => Type::i32(),
        ReturnKind::Int64 => Type::i64(),
        ReturnKind::Word => Type::usize(),
    }
}

/// Calls through a libffi call interface cached per thread for each
/// `(arity, return kind)` pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawInvoker;

impl Invoker for RawInvoker {
    fn name(&self) -> &'static str {
        "raw"
    }

    unsafe fn call_native(&self, addr: ProcAddr, args: &[Word], ret: ReturnKind) -> RawValue {
        let ffi_args: SmallVec<[Arg; MAX_ARGS]> = args.iter().map(Arg::new).collect();
        let code = CodePtr(addr.as_word() as *mut c_void);
        let cif = cif_for(args.len(), ret);
        // SAFETY: the CIF describes `args.len()` word parameters and a
        // `ret` result; the caller guarantees the callee matches.
        unsafe {
            match ret {
                ReturnKind::Void => {
                    cif.call::<()>(code, &ffi_args);
                    RawValue::VOID
                }
                // libffi widens integer results narrower than `ffi_arg` to a
                // full `ffi_arg` slot; read it wide, then truncate.
                ReturnKind::Int32 => RawValue::from_i32(cif.call::<usize>(code, &ffi_args) as i32),
                ReturnKind::Int64 => RawValue(cif.call::<i64>(code, &ffi_args) as u64),
                ReturnKind::Word => RawValue(cif.call::<usize>(code, &ffi_args) as u64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn mul_add(a: usize, b: usize, c: usize) -> usize {
        a * b + c
    }

    extern "C" fn status() -> i32 {
        -13
    }

    #[test]
    fn word_arguments_in_order() {
        let r = unsafe { RawInvoker.invoke(ProcAddr(mul_add as usize), &[6, 7, 1], ReturnKind::Word) };
        assert_eq!(r.unwrap().as_word(), 43);
    }

    #[test]
    fn int32_result_is_raw() {
        let r = unsafe { RawInvoker.invoke(ProcAddr(status as usize), &[], ReturnKind::Int32) };
        assert_eq!(r.unwrap().as_i32(), -13);
    }

    extern "C" fn positive_status() -> i32 {
        i32::MAX
    }

    extern "C" fn plus_one(a: usize) -> usize {
        a + 1
    }

    extern "C" fn calls_back(a: usize) -> usize {
        let inner = unsafe { RawInvoker.invoke(ProcAddr(plus_one as usize), &[a], ReturnKind::Word) };
        let code = unsafe { RawInvoker.invoke(ProcAddr(status as usize), &[], ReturnKind::Int32) };
        match (inner, code) {
            (Ok(inner), Ok(code)) if code.as_i32() == -13 => inner.as_word() * 10,
            _ => 0,
        }
    }

    #[test]
    fn int32_results_are_read_from_a_full_slot() {
        let negative = unsafe { RawInvoker.invoke(ProcAddr(status as usize), &[], ReturnKind::Int32) };
        let positive =
            unsafe { RawInvoker.invoke(ProcAddr(positive_status as usize), &[], ReturnKind::Int32) };
        assert_eq!(negative.unwrap().as_i32(), -13);
        assert_eq!(positive.unwrap().as_i32(), i32::MAX);
        for _ in 0..64 {
            let r = unsafe { RawInvoker.invoke(ProcAddr(status as usize), &[], ReturnKind::Int32) };
            assert_eq!(r.unwrap(), RawValue::from_i32(-13));
        }
    }

    #[test]
    fn native_code_may_call_back_through_the_same_strategy() {
        let r = unsafe { RawInvoker.invoke(ProcAddr(calls_back as usize), &[4], ReturnKind::Word) };
        assert_eq!(r.unwrap().as_word(), 50);
    }

    #[test]
    fn cif_is_reused_per_signature() {
        for _ in 0..3 {
            let _ = unsafe { RawInvoker.invoke(ProcAddr(mul_add as usize), &[1, 1, 1], ReturnKind::Word) };
        }
        let cached = CIF_CACHE.with(|c| c.borrow().contains_key(&(3, ReturnKind::Word)));
        assert!(cached);
    }
}
