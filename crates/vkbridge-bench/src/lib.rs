//! Benchmark workloads for the vkbridge marshaling and dispatch layer.
//!
//! Deterministic inputs shaped like what instance and device creation
//! pass across the boundary:
//!
//! - [`extension_names`]: `n` extension-style names of realistic length
//! - [`queue_priorities`]: `n` priorities in `(0, 1]`
//! - [`QueueRequest`]: a host-side record for transform-mode conversion
//! - [`default_invoke_id`]: bench id naming the build's invoker

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

/// `n` distinct extension names, 12 to 40 bytes long.
pub fn extension_names(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let pad = "x".repeat(i % 24);
            format!("VK_EXT_bench_{i}_{pad}")
        })
        .collect()
}

/// `n` queue priorities spread over `(0, 1]`.
pub fn queue_priorities(n: usize) -> Vec<f32> {
    (1..=n).map(|i| i as f32 / n as f32).collect()
}

/// Host-side queue request, converted to a native create-info in benches.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueRequest {
    /// Queue family index.
    pub family: u32,
    /// Debug label marshaled as a nested string.
    pub label: String,
    /// Number of queues wanted.
    pub count: u32,
}

/// `n` queue requests cycling over four families.
pub fn queue_requests(n: usize) -> Vec<QueueRequest> {
    (0..n)
        .map(|i| QueueRequest {
            family: (i % 4) as u32,
            label: format!("queue-{i}"),
            count: 1 + (i % 3) as u32,
        })
        .collect()
}

/// Benchmark id for a call through the build's default invoker, e.g.
/// `invoke_default_bridge_3`.
pub fn default_invoke_id(arity: usize) -> String {
    use vkbridge_dispatch::Invoker;
    format!("invoke_default_{}_{arity}", vkbridge_dispatch::DefaultInvoker::default().name())
}

/// Instance handle used by dispatch benches.
pub const BENCH_INSTANCE: vkbridge_core::InstanceHandle = vkbridge_core::InstanceHandle(0xBE7C);
