//! Symbol resolution by name, scoped to a native instance.

use std::collections::HashMap;
use std::ffi::{c_char, CString};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vkbridge_core::{InstanceHandle, ProcAddr, ResolveError};

use crate::loader::NativeLibrary;

/// Signature of the native "get instance proc address" export.
pub type GetInstanceProcAddr =
    unsafe extern "C" fn(InstanceHandle, *const c_char) -> Option<unsafe extern "C" fn()>;

/// Resolves entry points through a [`GetInstanceProcAddr`] function.
#[derive(Clone)]
pub struct Resolver {
    get_proc: GetInstanceProcAddr,
    library: Option<Arc<NativeLibrary>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("get_proc", &(self.get_proc as usize as *const ()))
            .field("library", &self.library.as_ref().map(|l| l.name()))
            .finish()
    }
}

impl Resolver {
    /// Resolve through `get_proc`.
    ///
    /// # Safety
    ///
    /// `get_proc` must behave like the native export: accept any instance
    /// handle it issued (or null) and any zero-terminated name, and return
    /// either null or a callable entry point. Whatever code it lives in
    /// must stay loaded while this resolver is in use.
    pub unsafe fn new(get_proc: GetInstanceProcAddr) -> Self {
        Self {
            get_proc,
            library: None,
        }
    }

    /// Resolve through a loaded library, keeping it loaded.
    pub fn from_library(library: &Arc<NativeLibrary>) -> Self {
        Self {
            get_proc: library.get_instance_proc_addr(),
            library: Some(Arc::clone(library)),
        }
    }

    /// Address of `name` for `instance`, or [`ProcAddr::NULL`] when the
    /// symbol is not present.
    ///
    /// A name containing a NUL byte cannot be asked for and also yields
    /// the null sentinel.
    pub fn resolve(&self, instance: InstanceHandle, name: &str) -> ProcAddr {
        let Ok(c_name) = CString::new(name) else {
            return ProcAddr::NULL;
        };
        // SAFETY: `get_proc` honours the contract accepted in `new` (or the
        // loaded library's), and `c_name` is zero-terminated.
        let found = unsafe { (self.get_proc)(instance, c_name.as_ptr()) };
        found.map_or(ProcAddr::NULL, |f| ProcAddr(f as usize))
    }

    /// Like [`resolve`](Self::resolve) but turns absence into a named error.
    pub fn require(&self, instance: InstanceHandle, name: &str) -> Result<ProcAddr, ResolveError> {
        if name.contains('\0') {
            return Err(ResolveError::InvalidName {
                name: name.escape_default().to_string(),
            });
        }
        let addr = self.resolve(instance, name);
        if addr.is_null() {
            tracing::debug!(symbol = name, %instance, "symbol not present");
            return Err(ResolveError::SymbolNotFound {
                name: name.to_string(),
            });
        }
        Ok(addr)
    }
}

/// Memoises resolutions per `(instance, name)`.
///
/// Misses are cached too, so an absent extension is asked for once. The
/// lock covers map access only; resolution itself runs unlocked, so two
/// threads may race to resolve the same name and store the same answer.
#[derive(Debug)]
pub struct ProcCache {
    resolver: Resolver,
    entries: Mutex<HashMap<InstanceHandle, HashMap<String, ProcAddr>>>,
}

impl ProcCache {
    /// An empty cache over `resolver`.
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Cached address of `name`, resolving on first use.
    pub fn get_or_resolve(&self, instance: InstanceHandle, name: &str) -> ProcAddr {
        if let Some(&addr) = self.lock().get(&instance).and_then(|names| names.get(name)) {
            return addr;
        }
        let addr = self.resolver.resolve(instance, name);
        self.lock()
            .entry(instance)
            .or_default()
            .insert(name.to_string(), addr);
        addr
    }

    /// Cached form of [`Resolver::require`].
    pub fn require(&self, instance: InstanceHandle, name: &str) -> Result<ProcAddr, ResolveError> {
        if name.contains('\0') {
            return self.resolver.require(instance, name);
        }
        let addr = self.get_or_resolve(instance, name);
        if addr.is_null() {
            tracing::debug!(symbol = name, %instance, "symbol not present");
            return Err(ResolveError::SymbolNotFound {
                name: name.to_string(),
            });
        }
        Ok(addr)
    }

    /// Drop every entry for `instance`, e.g. after it was destroyed.
    /// Returns how many were removed.
    pub fn forget_instance(&self, instance: InstanceHandle) -> usize {
        self.lock().remove(&instance).map_or(0, |names| names.len())
    }

    /// Number of cached entries, hits and misses alike.
    pub fn len(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().values().all(HashMap::is_empty)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<InstanceHandle, HashMap<String, ProcAddr>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    extern "C" fn present() {}

    static LOOKUPS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn counting_get_proc(
        instance: InstanceHandle,
        name: *const c_char,
    ) -> Option<unsafe extern "C" fn()> {
        LOOKUPS.fetch_add(1, Ordering::SeqCst);
        let name = unsafe { CStr::from_ptr(name) }.to_bytes();
        match (instance.0, name) {
            (_, b"vkCreateInstance") => Some(present as unsafe extern "C" fn()),
            (7, b"vkDestroyInstance") => Some(present as unsafe extern "C" fn()),
            _ => None,
        }
    }

    fn resolver() -> Resolver {
        unsafe { Resolver::new(counting_get_proc) }
    }

    #[test]
    fn known_symbol_resolves() {
        let addr = resolver().resolve(InstanceHandle::NULL, "vkCreateInstance");
        assert_eq!(addr, ProcAddr(present as usize));
    }

    #[test]
    fn unknown_symbol_is_null_sentinel() {
        let r = resolver();
        assert!(r.resolve(InstanceHandle::NULL, "vkNotAThing").is_null());
        assert_eq!(
            r.require(InstanceHandle::NULL, "vkNotAThing"),
            Err(ResolveError::SymbolNotFound {
                name: "vkNotAThing".into()
            })
        );
    }

    #[test]
    fn instance_scoped_symbol() {
        let r = resolver();
        assert!(r.resolve(InstanceHandle::NULL, "vkDestroyInstance").is_null());
        assert!(!r.resolve(InstanceHandle(7), "vkDestroyInstance").is_null());
    }

    #[test]
    fn interior_nul_never_reaches_native() {
        let r = resolver();
        assert!(r.resolve(InstanceHandle::NULL, "vkCreate\0Instance").is_null());
        let err = r.require(InstanceHandle::NULL, "vk\0x").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidName { .. }));
        assert_eq!(err.symbol(), "vk\\u{0}x");
    }

    #[test]
    fn cache_resolves_once_per_key() {
        let cache = ProcCache::new(resolver());
        let before = LOOKUPS.load(Ordering::SeqCst);
        let first = cache.get_or_resolve(InstanceHandle(7), "vkDestroyInstance");
        let miss = cache.get_or_resolve(InstanceHandle(7), "vkGetDeviceQueue2");
        for _ in 0..5 {
            assert_eq!(cache.get_or_resolve(InstanceHandle(7), "vkDestroyInstance"), first);
            assert!(cache.get_or_resolve(InstanceHandle(7), "vkGetDeviceQueue2").is_null());
        }
        assert!(miss.is_null());
        assert_eq!(cache.len(), 2);
        // Other tests share the counter, so only a lower bound on ours.
        assert!(LOOKUPS.load(Ordering::SeqCst) - before >= 2);
    }

    static SOLO_LOOKUPS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn solo_get_proc(
        _instance: InstanceHandle,
        _name: *const c_char,
    ) -> Option<unsafe extern "C" fn()> {
        SOLO_LOOKUPS.fetch_add(1, Ordering::SeqCst);
        Some(present as unsafe extern "C" fn())
    }

    #[test]
    fn hits_never_reach_native() {
        let cache = ProcCache::new(unsafe { Resolver::new(solo_get_proc) });
        cache.get_or_resolve(InstanceHandle(3), "vkQueueSubmit");
        cache.get_or_resolve(InstanceHandle(4), "vkQueueSubmit");
        for _ in 0..10 {
            cache.get_or_resolve(InstanceHandle(3), "vkQueueSubmit");
            cache.get_or_resolve(InstanceHandle(4), "vkQueueSubmit");
        }
        assert_eq!(SOLO_LOOKUPS.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.forget_instance(InstanceHandle(3)), 1);
        assert_eq!(cache.forget_instance(InstanceHandle(3)), 0);
        assert!(!cache.is_empty());
    }

    #[test]
    fn forget_instance_drops_only_its_entries() {
        let cache = ProcCache::new(resolver());
        cache.get_or_resolve(InstanceHandle(7), "vkDestroyInstance");
        cache.get_or_resolve(InstanceHandle(7), "vkCreateInstance");
        cache.get_or_resolve(InstanceHandle::NULL, "vkCreateInstance");
        assert_eq!(cache.forget_instance(InstanceHandle(7)), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.require(InstanceHandle::NULL, "vkCreateInstance").is_ok());
    }
}
