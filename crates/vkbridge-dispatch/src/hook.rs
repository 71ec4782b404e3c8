//! Post-call debug-break hook.
//!
//! A single process-wide slot holding a plain function pointer. The slot
//! is read (and its lock dropped) after the native call returns, so the
//! lock is never held across native code and hooks never serialise calls.
//!
//! The hook only runs when `debug_assertions` is on or the crate is built
//! with the `debug-break` feature; otherwise installing one is allowed but
//! has no effect.

use std::sync::{PoisonError, RwLock};

use vkbridge_core::{ProcAddr, RawValue};

/// What the hook is told about a completed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallRecord {
    /// Entry point that was called.
    pub addr: ProcAddr,
    /// Number of arguments passed.
    pub args: usize,
    /// Raw result.
    pub result: RawValue,
}

/// Hook signature. Runs on the calling thread.
pub type PostCallHook = fn(&CallRecord);

static POST_CALL_HOOK: RwLock<Option<PostCallHook>> = RwLock::new(None);

/// Install `hook`, or clear the slot with `None`. Returns the previous hook.
pub fn set_post_call_hook(hook: Option<PostCallHook>) -> Option<PostCallHook> {
    let mut slot = POST_CALL_HOOK
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, hook)
}

/// Whether hooks run in this build.
pub const fn hooks_enabled() -> bool {
    cfg!(any(debug_assertions, feature = "debug-break"))
}

pub(crate) fn after_call(record: &CallRecord) {
    if !hooks_enabled() {
        return;
    }
    let hook = *POST_CALL_HOOK.read().unwrap_or_else(PoisonError::into_inner);
    if let Some(hook) = hook {
        hook(record);
    }
}
