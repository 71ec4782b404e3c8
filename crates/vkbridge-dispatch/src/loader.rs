//! Opening the native library and finding its loader entry point.

use std::ffi::CString;
use std::fmt;

use libloading::Library;
use vkbridge_core::LoadError;

use crate::resolve::GetInstanceProcAddr;

/// Where to look for the native library and what to look up in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Library names or paths, tried in order.
    pub candidates: Vec<String>,
    /// Export that resolves every other entry point.
    pub entry_symbol: String,
}

impl LoaderConfig {
    /// The standard loader export.
    pub const DEFAULT_ENTRY_SYMBOL: &'static str = "vkGetInstanceProcAddr";

    /// Environment variable naming a library to try before the defaults.
    pub const LIBRARY_ENV: &'static str = "VKBRIDGE_LIBRARY";

    /// The platform's conventional loader names.
    pub fn platform_candidates() -> Vec<String> {
        #[cfg(target_os = "windows")]
        let names: &[&str] = &["vulkan-1.dll"];
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        let names: &[&str] = &["libvulkan.1.dylib", "libvulkan.dylib", "libMoltenVK.dylib"];
        #[cfg(target_os = "android")]
        let names: &[&str] = &["libvulkan.so"];
        #[cfg(not(any(
            target_os = "windows",
            target_os = "macos",
            target_os = "ios",
            target_os = "android"
        )))]
        let names: &[&str] = &["libvulkan.so.1", "libvulkan.so"];
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Defaults, with [`LIBRARY_ENV`](Self::LIBRARY_ENV) tried first when set.
    pub fn from_env() -> Self {
        Self::default().with_override(std::env::var(Self::LIBRARY_ENV).ok())
    }

    /// Try `library` before every other candidate.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.candidates.insert(0, library.into());
        self
    }

    /// Look up `symbol` instead of the default entry point.
    pub fn with_entry_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.entry_symbol = symbol.into();
        self
    }

    fn with_override(self, library: Option<String>) -> Self {
        match library {
            Some(library) if !library.trim().is_empty() => self.with_library(library),
            _ => self,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            candidates: Self::platform_candidates(),
            entry_symbol: Self::DEFAULT_ENTRY_SYMBOL.to_string(),
        }
    }
}

/// An opened native library and its loader entry point.
///
/// The library stays loaded for as long as this value (or a
/// [`Resolver`](crate::Resolver) built from it) is alive.
pub struct NativeLibrary {
    library: Library,
    name: String,
    get_proc: GetInstanceProcAddr,
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("name", &self.name)
            .field("library", &self.library)
            .finish()
    }
}

impl NativeLibrary {
    /// Open the first candidate that loads and look up the entry symbol
    /// in it.
    ///
    /// A candidate that opens but lacks the entry symbol is an error; the
    /// remaining candidates are not tried.
    pub fn load(config: &LoaderConfig) -> Result<Self, LoadError> {
        let mut last_reason = String::from("no candidate libraries configured");
        for name in &config.candidates {
            // SAFETY: opening a library runs its initialisers. The loader
            // libraries named here are designed to be dlopen'ed.
            match unsafe { Library::new(name) } {
                Ok(library) => return Self::bind(library, name, &config.entry_symbol),
                Err(e) => {
                    tracing::debug!(library = %name, error = %e, "native library not loadable");
                    last_reason = e.to_string();
                }
            }
        }
        Err(LoadError::LibraryNotFound {
            tried: config.candidates.clone(),
            reason: last_reason,
        })
    }

    fn bind(library: Library, name: &str, symbol: &str) -> Result<Self, LoadError> {
        let missing = |reason: String| LoadError::EntryPointMissing {
            library: name.to_string(),
            symbol: symbol.to_string(),
            reason,
        };
        let c_symbol = CString::new(symbol)
            .map_err(|_| missing("symbol name contains a NUL byte".to_string()))?;
        // SAFETY: the entry symbol is declared by the native API with the
        // `GetInstanceProcAddr` signature. The copied pointer stays valid
        // because `library` is stored alongside it.
        let get_proc = unsafe {
            library
                .get::<GetInstanceProcAddr>(c_symbol.as_bytes_with_nul())
                .map(|sym| *sym)
        }
        .map_err(|e| missing(e.to_string()))?;
        tracing::debug!(library = %name, symbol, "native library loaded");
        Ok(Self {
            library,
            name: name.to_string(),
            get_proc,
        })
    }

    /// The candidate name that was opened.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loader entry point.
    pub fn get_instance_proc_addr(&self) -> GetInstanceProcAddr {
        self.get_proc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_standard_entry_symbol() {
        let config = LoaderConfig::default();
        assert_eq!(config.entry_symbol, "vkGetInstanceProcAddr");
        assert!(!config.candidates.is_empty());
    }

    #[test]
    fn with_library_goes_first() {
        let config = LoaderConfig::default().with_library("/opt/icd/libvk_swiftshader.so");
        assert_eq!(config.candidates[0], "/opt/icd/libvk_swiftshader.so");
        assert_eq!(
            config.candidates.len(),
            LoaderConfig::platform_candidates().len() + 1
        );
    }

    #[test]
    fn blank_override_is_ignored() {
        let base = LoaderConfig::default();
        assert_eq!(base.clone().with_override(Some("  ".into())), base);
        assert_eq!(base.clone().with_override(None), base);
        let overridden = base.with_override(Some("custom.so".into()));
        assert_eq!(overridden.candidates[0], "custom.so");
    }

    #[test]
    fn missing_library_lists_every_candidate() {
        let config = LoaderConfig {
            candidates: vec!["libdefinitely_absent_a.so".into(), "libdefinitely_absent_b.so".into()],
            entry_symbol: LoaderConfig::DEFAULT_ENTRY_SYMBOL.into(),
        };
        match NativeLibrary::load(&config) {
            Err(LoadError::LibraryNotFound { tried, reason }) => {
                assert_eq!(tried, config.candidates);
                assert!(!reason.is_empty());
            }
            other => panic!("expected LibraryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_candidate_list_is_not_found() {
        let config = LoaderConfig {
            candidates: Vec::new(),
            entry_symbol: "x".into(),
        };
        assert!(matches!(
            NativeLibrary::load(&config),
            Err(LoadError::LibraryNotFound { .. })
        ));
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn library_without_entry_symbol_is_reported() {
        let config = LoaderConfig {
            candidates: vec!["libc.so.6".into()],
            entry_symbol: LoaderConfig::DEFAULT_ENTRY_SYMBOL.into(),
        };
        match NativeLibrary::load(&config) {
            Err(LoadError::EntryPointMissing { library, symbol, .. }) => {
                assert_eq!(library, "libc.so.6");
                assert_eq!(symbol, "vkGetInstanceProcAddr");
            }
            other => panic!("expected EntryPointMissing, got {other:?}"),
        }
    }
}
