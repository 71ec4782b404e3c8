//! Debug allocation tracking: double-free detection and leak reports.
//!
//! The tracker keeps one record per block address. Records are inserted on
//! allocate, flipped to `Freed` on free, and never removed, so a stale
//! address freed again is still recognised as a double free. Addresses the
//! allocator reuses are simply overwritten with a fresh `Live` record.
//!
//! The map is the only shared mutable state in the marshaling layer. Its
//! lock is held for the map access alone, never across a native call and
//! never while panicking.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use vkbridge_core::CallSite;

/// State of one tracked address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationRecord {
    /// Allocated and not yet freed.
    Live {
        /// Where the block was requested.
        allocated_at: CallSite,
    },
    /// Freed; kept so a second free is detectable.
    Freed {
        /// Where the block was requested, if the tracker saw it.
        allocated_at: Option<CallSite>,
        /// Where it was first freed.
        freed_at: CallSite,
    },
}

impl AllocationRecord {
    /// Whether the block is still allocated.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }
}

/// A block still allocated at report time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Leak {
    /// Block address.
    pub address: usize,
    /// Where the block was requested.
    pub allocated_at: CallSite,
}

/// Every block still allocated, in allocation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeakReport {
    leaks: Vec<Leak>,
}

impl LeakReport {
    /// Whether nothing leaked.
    pub fn is_empty(&self) -> bool {
        self.leaks.is_empty()
    }

    /// Number of leaked blocks.
    pub fn len(&self) -> usize {
        self.leaks.len()
    }

    /// The leaked blocks.
    pub fn leaks(&self) -> &[Leak] {
        &self.leaks
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unmanaged block(s) leaked", self.leaks.len())?;
        for leak in &self.leaks {
            write!(f, "\n  {:#x} allocated at {}", leak.address, leak.allocated_at)?;
        }
        Ok(())
    }
}

/// Shared address → record map guarded by a mutex.
///
/// Construct one per tracking scope and hand it to a
/// [`TrackingAllocator`](crate::TrackingAllocator) behind an `Arc`.
#[derive(Debug, Default)]
pub struct AllocationTracker {
    records: Mutex<IndexMap<usize, AllocationRecord>>,
}

impl AllocationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh block.
    ///
    /// # Panics
    ///
    /// Panics if `address` is null: the allocator broke its contract and
    /// there is no block to track.
    pub fn on_allocate(&self, address: usize, site: CallSite) {
        if address == 0 {
            panic!("vkbridge: null block reached the allocation tracker at {site}");
        }
        self.lock()
            .insert(address, AllocationRecord::Live { allocated_at: site });
        tracing::trace!(address, %site, "unmanaged block allocated");
    }

    /// Record a free.
    ///
    /// A null address is ignored, matching `free(NULL)`. An address the
    /// tracker never saw is recorded as freed and logged; it may come from
    /// an allocator the tracker was not wrapping.
    ///
    /// # Panics
    ///
    /// Panics on a double free, naming where the block was allocated,
    /// where it was first freed, and `site`.
    pub fn on_free(&self, address: usize, site: CallSite) {
        if address == 0 {
            return;
        }
        let previous = {
            let mut records = self.lock();
            let previous = records.get(&address).copied();
            match previous {
                Some(AllocationRecord::Freed { .. }) => {}
                Some(AllocationRecord::Live { allocated_at }) => {
                    records.insert(
                        address,
                        AllocationRecord::Freed {
                            allocated_at: Some(allocated_at),
                            freed_at: site,
                        },
                    );
                }
                None => {
                    records.insert(
                        address,
                        AllocationRecord::Freed {
                            allocated_at: None,
                            freed_at: site,
                        },
                    );
                }
            }
            previous
        };

        match previous {
            Some(AllocationRecord::Freed {
                allocated_at,
                freed_at,
            }) => {
                let origin = allocated_at
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "<untracked>".to_string());
                panic!(
                    "vkbridge: double free of {address:#x} at {site} \
                     (allocated at {origin}, first freed at {freed_at})"
                );
            }
            Some(AllocationRecord::Live { .. }) => {
                tracing::trace!(address, %site, "unmanaged block freed");
            }
            None => {
                tracing::warn!(address, %site, "freeing a block the tracker never saw");
            }
        }
    }

    /// The record for `address`, if one exists.
    pub fn record(&self, address: usize) -> Option<AllocationRecord> {
        self.lock().get(&address).copied()
    }

    /// Number of blocks currently live.
    pub fn live_count(&self) -> usize {
        self.lock().values().filter(|r| r.is_live()).count()
    }

    /// Snapshot every live block without printing anything.
    pub fn leaks(&self) -> LeakReport {
        let leaks = self
            .lock()
            .iter()
            .filter_map(|(&address, record)| match *record {
                AllocationRecord::Live { allocated_at } => Some(Leak {
                    address,
                    allocated_at,
                }),
                AllocationRecord::Freed { .. } => None,
            })
            .collect();
        LeakReport { leaks }
    }

    /// Report leaks at shutdown.
    ///
    /// Emits one `warn` event per leak and a stderr summary, and only when
    /// something leaked. The report is advisory; it never fails the process.
    pub fn dump_leaks(&self) -> LeakReport {
        let report = self.leaks();
        if !report.is_empty() {
            for leak in report.leaks() {
                tracing::warn!(
                    address = leak.address,
                    site = %leak.allocated_at,
                    "unmanaged block leaked"
                );
            }
            eprintln!("vkbridge: {report}");
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<usize, AllocationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
