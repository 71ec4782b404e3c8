//! The native call interface and its build-time default.

use vkbridge_core::{CallError, ProcAddr, RawValue, Word};

use crate::hook::{after_call, CallRecord};

pub mod bridge;
#[cfg(feature = "raw-call")]
pub mod raw;

/// Largest number of word arguments either strategy can pass.
pub const MAX_ARGS: usize = 12;

/// Width of the value a native entry point returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// No return value.
    Void,
    /// A 32-bit integer, such as a result code.
    Int32,
    /// A 64-bit integer, such as a non-dispatchable handle.
    Int64,
    /// A pointer-sized value.
    Word,
}

/// A strategy for calling a resolved entry point with the C convention.
///
/// Implementors provide [`call_native`](Invoker::call_native); callers use
/// [`invoke`](Invoker::invoke), which refuses calls that must not reach
/// native code and runs the post-call hook.
pub trait Invoker: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Largest supported arity.
    fn max_args(&self) -> usize {
        MAX_ARGS
    }

    /// Perform the call.
    ///
    /// # Safety
    ///
    /// `addr` is non-null and `args.len() <= self.max_args()`. The entry
    /// point must have a C signature taking exactly `args.len()` integer
    /// or pointer parameters and returning `ret`, and every pointer
    /// argument must be valid for what the callee does with it.
    unsafe fn call_native(&self, addr: ProcAddr, args: &[Word], ret: ReturnKind) -> RawValue;

    /// Validate and perform the call.
    ///
    /// A null `addr` or too many arguments is refused with an error before
    /// any native code runs.
    ///
    /// # Safety
    ///
    /// As for [`call_native`](Invoker::call_native), apart from the two
    /// conditions checked here.
    unsafe fn invoke(
        &self,
        addr: ProcAddr,
        args: &[Word],
        ret: ReturnKind,
    ) -> Result<RawValue, CallError> {
        if addr.is_null() {
            return Err(CallError::NullEntryPoint);
        }
        if args.len() > self.max_args() {
            return Err(CallError::TooManyArguments {
                given: args.len(),
                max: self.max_args(),
                strategy: self.name(),
            });
        }
        tracing::trace!(%addr, args = args.len(), ?ret, invoker = self.name(), "native call");
        // SAFETY: both checked preconditions hold; the rest is the caller's.
        let result = unsafe { self.call_native(addr, args, ret) };
        after_call(&CallRecord {
            addr,
            args: args.len(),
            result,
        });
        Ok(result)
    }
}

/// The strategy selected for this build.
#[cfg(feature = "raw-call")]
pub type DefaultInvoker = raw::RawInvoker;

/// The strategy selected for this build.
#[cfg(not(feature = "raw-call"))]
pub type DefaultInvoker = bridge::BridgeInvoker;

/// Shorthand for [`Invoker::invoke`].
///
/// # Safety
///
/// See [`Invoker::invoke`].
pub unsafe fn call<I: Invoker + ?Sized>(
    invoker: &I,
    addr: ProcAddr,
    args: &[Word],
    ret: ReturnKind,
) -> Result<RawValue, CallError> {
    // SAFETY: forwarded caller contract.
    unsafe { invoker.invoke(addr, args, ret) }
}
