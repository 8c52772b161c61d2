//! Distribution strategy configuration.
//!
//! The strategy backing an [`IndexDistributor`](crate::IndexDistributor) is
//! chosen per instance. A process-wide default is resolved once by the
//! embedding runtime (typically from its flag parsing) via
//! [`set_default_config`] and picked up by distributors constructed without
//! an explicit configuration.

use parking_lot::RwLock;

/// Default number of children per internal claim-tree node.
///
/// Tunable. Eight-way nodes spread concurrently descending workers while
/// keeping the rounding applied by `get_count` moderate.
pub const DEFAULT_FAN_OUT: usize = 8;

/// Default number of indices claimed sequentially within one claim-tree leaf.
///
/// Tunable. Leaves must be large enough to amortize the per-leaf cursor's
/// fetch-add across many claims, and small enough to bound the load imbalance
/// of a partially drained leaf near the end of a pass.
pub const DEFAULT_LEAF_COUNT: usize = 32;

/// Index distribution strategy backing an `IndexDistributor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionStrategy {
    /// A single shared claim cursor. Correct under any worker count, but the
    /// cursor becomes a contention point at high core counts.
    Sequential,
    /// A hierarchical claim tree that spreads concurrent claims across
    /// independent sub-ranges. Preferred at high worker counts.
    #[default]
    ClaimTree,
}

/// Configuration for index distribution.
///
/// `fan_out` and `leaf_count` only apply to [`DistributionStrategy::ClaimTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributorConfig {
    /// The strategy to construct distributors with.
    pub strategy: DistributionStrategy,
    /// Children per internal claim-tree node. Minimum 2.
    pub fan_out: usize,
    /// Indices per claim-tree leaf. Minimum 1.
    pub leaf_count: usize,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DistributorConfig {
    /// Create a configuration with the default strategy and tree shape.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strategy: DistributionStrategy::ClaimTree,
            fan_out: DEFAULT_FAN_OUT,
            leaf_count: DEFAULT_LEAF_COUNT,
        }
    }

    /// Create a configuration with the given strategy and the default tree
    /// shape.
    #[must_use]
    pub const fn with_strategy(strategy: DistributionStrategy) -> Self {
        Self {
            strategy,
            fan_out: DEFAULT_FAN_OUT,
            leaf_count: DEFAULT_LEAF_COUNT,
        }
    }

    /// Set the claim-tree fan-out. Values below 2 are clamped to 2.
    pub const fn set_fan_out(&mut self, fan_out: usize) {
        self.fan_out = if fan_out < 2 { 2 } else { fan_out };
    }

    /// Set the claim-tree leaf size. Values below 1 are clamped to 1.
    pub const fn set_leaf_count(&mut self, leaf_count: usize) {
        self.leaf_count = if leaf_count < 1 { 1 } else { leaf_count };
    }
}

static DEFAULT_CONFIG: RwLock<DistributorConfig> = RwLock::new(DistributorConfig::new());

/// Get the process-wide default distribution configuration.
#[must_use]
pub fn default_config() -> DistributorConfig {
    *DEFAULT_CONFIG.read()
}

/// Replace the process-wide default distribution configuration.
///
/// Intended to be called once at startup by the embedding runtime, before any
/// distributor is constructed. Distributors created afterwards with
/// [`IndexDistributor::new`](crate::IndexDistributor::new) pick up the new
/// default; already constructed instances are unaffected.
pub fn set_default_config(config: DistributorConfig) {
    *DEFAULT_CONFIG.write() = config;
}
