//! Compiled adapters: one typed `extern "C"` function pointer per arity
//! and return width.

use std::mem;

use vkbridge_core::{ProcAddr, RawValue, Word};

use super::{Invoker, ReturnKind, MAX_ARGS};

/// Calls through typed function pointers generated for every arity up to
/// [`MAX_ARGS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BridgeInvoker;

macro_rules! word {
    ($idx:tt) => {
        Word
    };
}

/// Reinterpret `addr` as a C function of `Word` parameters and call it.
macro_rules! call_arity {
    ($addr:expr, $args:expr, $ret:ty; $($idx:tt)*) => {{
        let f = mem::transmute::<usize, unsafe extern "C" fn($(word!($idx)),*) -> $ret>($addr);
        f($($args[$idx]),*)
    }};
}

macro_rules! dispatch_arity {
    ($addr:expr, $args:expr, $ret:ty) => {
        match $args.len() {
            0 => call_arity!($addr, $args, $ret;),
            1 => call_arity!($addr, $args, $ret; 0),
            2 => call_arity!($addr, $args, $ret; 0 1),
            3 => call_arity!($addr, $args, $ret; 0 1 2),
            4 => call_arity!($addr, $args, $ret; 0 1 2 3),
            5 => call_arity!($addr, $args, $ret; 0 1 2 3 4),
            6 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5),
            7 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5 6),
            8 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5 6 7),
            9 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5 6 7 8),
            10 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5 6 7 8 9),
            11 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5 6 7 8 9 10),
            12 => call_arity!($addr, $args, $ret; 0 1 2 3 4 5 6 7 8 9 10 11),
            n => unreachable!("arity {n} passed the {MAX_ARGS}-argument check"),
        }
    };
}

impl Invoker for BridgeInvoker {
    fn name(&self) -> &'static str {
        "bridge"
    }

    unsafe fn call_native(&self, addr: ProcAddr, args: &[Word], ret: ReturnKind) -> RawValue {
        let addr = addr.as_word();
        // SAFETY: the caller guarantees the entry point's real signature
        // matches `args.len()` word parameters returning `ret`, and that
        // the arity is within the generated range.
        unsafe {
            match ret {
                ReturnKind::Void => {
                    dispatch_arity!(addr, args, ());
                    RawValue::VOID
                }
                ReturnKind::Int32 => RawValue::from_i32(dispatch_arity!(addr, args, i32)),
                ReturnKind::Int64 => RawValue(dispatch_arity!(addr, args, i64) as u64),
                ReturnKind::Word => RawValue(dispatch_arity!(addr, args, usize) as u64),
            }
        }
    }
}
