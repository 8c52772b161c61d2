//! Distribution pass tracing support.
//!
//! When the `tracing` feature is enabled, this module provides structured
//! tracing events for distribution passes.

#[cfg(feature = "tracing")]
pub(crate) mod internal {
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Stable identifier for one distribution pass.
    ///
    /// Correlates all events emitted for a single pass. Monotonically
    /// increasing, starting at 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PassId(pub u64);

    static NEXT_PASS_ID: AtomicU64 = AtomicU64::new(1);

    /// Generate the next unique pass ID.
    pub fn next_pass_id() -> PassId {
        PassId(NEXT_PASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Log the creation of a distribution pass.
    pub fn log_pass_created(pass_id: PassId, count: usize, strategy: &str) {
        tracing::debug!(pass_id = pass_id.0, count, strategy, "pass_created");
    }

    /// Log one worker finishing its share of a pass.
    pub fn log_worker_drained(pass_id: PassId, claimed: usize) {
        tracing::debug!(pass_id = pass_id.0, claimed, "worker_drained");
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) mod internal {
    /// Stub type when tracing is disabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PassId(pub u64);

    /// Stub function when tracing is disabled.
    pub fn next_pass_id() -> PassId {
        PassId(0)
    }

    pub fn log_pass_created(_pass_id: PassId, _count: usize, _strategy: &str) {}

    pub fn log_worker_drained(_pass_id: PassId, _claimed: usize) {}
}
