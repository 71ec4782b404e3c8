//! Strongly-typed native addresses, handles, and raw call values.

use std::fmt;

/// A machine-word argument passed to a native entry point.
///
/// Scalars must already be in their native representation; pointers are
/// passed as their address.
pub type Word = usize;

/// Resolved entry-point address of a native function.
///
/// `ProcAddr::NULL` is the "unresolved" sentinel returned when a symbol is
/// not present for an instance. Nothing in this workspace calls through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ProcAddr(pub usize);

impl ProcAddr {
    /// The unresolved sentinel.
    pub const NULL: ProcAddr = ProcAddr(0);

    /// Returns `true` if this is the unresolved sentinel.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The address as a raw word.
    pub fn as_word(self) -> Word {
        self.0
    }
}

impl fmt::Display for ProcAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque handle to a native library instance (e.g. a `VkInstance`).
///
/// `InstanceHandle::NULL` is valid for resolution: it selects the
/// global-level entry points that exist before any instance is created.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InstanceHandle(pub usize);

impl InstanceHandle {
    /// The null instance.
    pub const NULL: InstanceHandle = InstanceHandle(0);

    /// Returns `true` for the null instance.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance@{:#x}", self.0)
    }
}

/// The raw, unconverted result of a native call.
///
/// Stored zero-extended from the width the callee returned. Interpreting
/// it (for example as a result-code enumeration) is left to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RawValue(pub u64);

impl RawValue {
    /// Result of a `void` call.
    pub const VOID: RawValue = RawValue(0);

    /// Build from a 32-bit return, keeping its bit pattern.
    pub fn from_i32(v: i32) -> Self {
        RawValue(v as u32 as u64)
    }

    /// Low 32 bits reinterpreted as a signed integer.
    pub fn as_i32(self) -> i32 {
        self.0 as u32 as i32
    }

    /// Low 32 bits.
    pub fn as_u32(self) -> u32 {
        self.0 as u32
    }

    /// All 64 bits.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Truncated to a machine word.
    pub fn as_word(self) -> Word {
        self.0 as Word
    }
}
