//! Source locations used to attribute allocations.
//!
//! Public entry points of the marshaling crates are `#[track_caller]`, so
//! `CallSite::caller()` resolves to the first frame outside this layer:
//! the generated binding or application code that asked for the buffer.

use std::fmt;
use std::panic::Location;

/// Where an allocation or free was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallSite(&'static Location<'static>);

impl CallSite {
    /// The location of the caller, following `#[track_caller]` chains.
    #[track_caller]
    pub fn caller() -> Self {
        CallSite(Location::caller())
    }

    /// Wrap an already captured location.
    pub fn from_location(location: &'static Location<'static>) -> Self {
        CallSite(location)
    }

    /// Source file path.
    pub fn file(&self) -> &'static str {
        self.0.file()
    }

    /// 1-based line number.
    pub fn line(&self) -> u32 {
        self.0.line()
    }

    /// 1-based column number.
    pub fn column(&self) -> u32 {
        self.0.column()
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.0.file(), self.0.line(), self.0.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn attributed() -> CallSite {
        CallSite::caller()
    }

    #[test]
    fn track_caller_chain_reports_outer_frame() {
        let line = line!() + 1;
        let site = attributed();
        assert_eq!(site.line(), line);
        assert!(site.file().ends_with("site.rs"));
    }

    #[test]
    fn display_is_file_line_column() {
        let site = CallSite::caller();
        let text = site.to_string();
        assert!(text.contains("site.rs:"));
        assert_eq!(text.matches(':').count(), 2);
    }
}
