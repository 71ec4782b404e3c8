//! Recoverable error types.
//!
//! Only conditions a caller can reasonably act on are modelled here:
//! missing symbols, unusable call requests, and library load failures.
//! Broken memory invariants (allocation failure, double free) are not
//! errors; they panic at the point of detection.

use thiserror::Error;

/// Symbol resolution failure.
///
/// Optional extensions are expected to be absent on some instances, so
/// this is an ordinary value for the binding layer to inspect.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The loader returned the null sentinel for this name.
    #[error("symbol '{name}' is not present for this instance")]
    SymbolNotFound {
        /// The requested symbol.
        name: String,
    },
    /// The name cannot be passed to native code (it contains a NUL byte).
    #[error("symbol name '{name}' contains an interior NUL byte")]
    InvalidName {
        /// The rejected name, with NULs escaped.
        name: String,
    },
}

impl ResolveError {
    /// The symbol name the error refers to.
    pub fn symbol(&self) -> &str {
        match self {
            Self::SymbolNotFound { name } | Self::InvalidName { name } => name,
        }
    }
}

/// A call request that was refused before reaching native code.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CallError {
    /// The entry point is the unresolved sentinel.
    #[error("refusing to call through a null entry point")]
    NullEntryPoint,
    /// The invocation strategy has no adapter for this many arguments.
    #[error("{given} arguments exceed the {max}-argument limit of the {strategy} invoker")]
    TooManyArguments {
        /// Number of arguments supplied.
        given: usize,
        /// Largest supported arity.
        max: usize,
        /// Name of the strategy that refused the call.
        strategy: &'static str,
    },
}

/// Failure to open the native library or find its loader entry point.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoadError {
    /// None of the candidate library names could be opened.
    #[error("could not open any of [{}]: {reason}", .tried.join(", "))]
    LibraryNotFound {
        /// Every name that was tried, in order.
        tried: Vec<String>,
        /// The loader message for the last attempt.
        reason: String,
    },
    /// The library opened but does not export the entry symbol.
    #[error("library '{library}' does not export '{symbol}': {reason}")]
    EntryPointMissing {
        /// Library that was opened.
        library: String,
        /// The missing symbol.
        symbol: String,
        /// The loader message.
        reason: String,
    },
}
