//! Distributor facade over the claiming strategies.

use crate::claim_tree::{ClaimTree, TreePosition};
use crate::config::{self, DistributionStrategy, DistributorConfig};
use crate::sequential::Sequential;
use crate::trace::internal as trace;

/// The strategy instance owned by a distributor.
///
/// A closed set dispatched by match, so the facade stays strategy-agnostic
/// without type erasure.
enum Backend {
    Sequential(Sequential),
    ClaimTree(ClaimTree),
}

impl Backend {
    const fn name(&self) -> &'static str {
        match self {
            Self::Sequential(_) => "sequential",
            Self::ClaimTree(_) => "claim_tree",
        }
    }
}

/// Distributes the indices `[0, count)` across concurrent worker threads.
///
/// One distributor covers exactly one pass over one fixed count. The phase
/// driver constructs an instance, hands it by shared reference to its worker
/// threads, and every worker calls [`do_indices`](Self::do_indices) with the
/// phase's per-index work function. Together the calls deliver every index
/// exactly once; the distributor decides only which thread gets which index,
/// never what is done with it.
///
/// With the claim-tree strategy the count must come from
/// [`get_count`](Self::get_count), which rounds a requested count up to one
/// the tree can tile cleanly. Callers should size any index-keyed storage
/// with the adjusted count, since the distributor enumerates all of it.
pub struct IndexDistributor {
    backend: Backend,
    count: usize,
    pass_id: trace::PassId,
}

impl IndexDistributor {
    /// Create a distributor over `[0, count)` using the process-wide default
    /// configuration.
    ///
    /// # Panics
    ///
    /// Panics if the default strategy is the claim tree and `count` was not
    /// obtained from [`get_count`](Self::get_count).
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self::with_config(count, &config::default_config())
    }

    /// Create a distributor over `[0, count)` with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configured strategy is the claim tree and `count` was
    /// not obtained from [`get_count_with`](Self::get_count_with) for the
    /// same configuration, or if the configured tree shape is invalid
    /// (`fan_out < 2` or `leaf_count < 1`).
    #[must_use]
    pub fn with_config(count: usize, config: &DistributorConfig) -> Self {
        let backend = match config.strategy {
            DistributionStrategy::Sequential => Backend::Sequential(Sequential::new(count)),
            DistributionStrategy::ClaimTree => {
                Backend::ClaimTree(ClaimTree::new(count, config.fan_out, config.leaf_count))
            }
        };
        let pass_id = trace::next_pass_id();
        trace::log_pass_created(pass_id, count, backend.name());
        Self {
            backend,
            count,
            pass_id,
        }
    }

    /// Adjust `max_count` up to the smallest count the process-wide default
    /// strategy can enumerate.
    ///
    /// Side-effect free; usable before construction to pre-size index-keyed
    /// storage. The returned count must be used both for that storage and for
    /// constructing the distributor. Monotonic (`get_count(x) >= x`) and
    /// idempotent (already-adjusted counts are fixed points).
    ///
    /// # Panics
    ///
    /// Panics if the adjusted count would overflow `usize`.
    #[must_use]
    pub fn get_count(max_count: usize) -> usize {
        Self::get_count_with(max_count, &config::default_config())
    }

    /// Adjust `max_count` up to the smallest count the configured strategy
    /// can enumerate.
    ///
    /// The sequential strategy has no structural requirement and returns
    /// `max_count` unchanged; the claim tree rounds up to a complete tiling.
    ///
    /// # Panics
    ///
    /// Panics if the configured tree shape is invalid (`fan_out < 2` or
    /// `leaf_count < 1`) or the adjusted count would overflow `usize`.
    #[must_use]
    pub fn get_count_with(max_count: usize, config: &DistributorConfig) -> usize {
        match config.strategy {
            DistributionStrategy::Sequential => max_count,
            DistributionStrategy::ClaimTree => {
                ClaimTree::round_up(max_count, config.fan_out, config.leaf_count)
            }
        }
    }

    /// The number of indices this distributor enumerates.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Drain indices on the calling worker thread.
    ///
    /// Repeatedly claims from the owned strategy and invokes `function` once
    /// per claimed index, in whatever order the strategy yields, until the
    /// shared range is exhausted. May be called concurrently from any number
    /// of worker threads against the same instance; each call drains its
    /// share of the range and returns once no unclaimed indices remain. An
    /// empty range returns immediately without invoking `function`.
    pub fn do_indices<F>(&self, mut function: F)
    where
        F: FnMut(usize),
    {
        let mut claimed = 0_usize;
        match &self.backend {
            Backend::Sequential(sequential) => {
                while let Some(index) = sequential.claim_next() {
                    function(index);
                    claimed += 1;
                }
            }
            Backend::ClaimTree(tree) => {
                let mut position = TreePosition::new();
                while let Some(index) = tree.claim_next(&mut position) {
                    function(index);
                    claimed += 1;
                }
            }
        }
        trace::log_worker_drained(self.pass_id, claimed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(distributor: &IndexDistributor) -> Vec<usize> {
        let mut seen = Vec::new();
        distributor.do_indices(|index| seen.push(index));
        seen.sort_unstable();
        seen
    }

    #[test]
    fn test_distributor_is_shareable_across_threads() {
        const fn assert_sync<T: Sync + Send>() {}
        assert_sync::<IndexDistributor>();
    }

    #[test]
    fn test_sequential_backend_drains_in_order() {
        let config = DistributorConfig::with_strategy(DistributionStrategy::Sequential);
        let distributor = IndexDistributor::with_config(5, &config);

        assert_eq!(distributor.count(), 5);
        assert_eq!(drain(&distributor), vec![0, 1, 2, 3, 4]);
        // The pass is spent; a second drain sees nothing.
        assert_eq!(drain(&distributor), Vec::<usize>::new());
    }

    #[test]
    fn test_claim_tree_backend_drains_adjusted_count() {
        let mut config = DistributorConfig::with_strategy(DistributionStrategy::ClaimTree);
        config.set_fan_out(2);
        config.set_leaf_count(4);

        let count = IndexDistributor::get_count_with(10, &config);
        let distributor = IndexDistributor::with_config(count, &config);

        assert_eq!(drain(&distributor), (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_range_invokes_nothing() {
        for strategy in [DistributionStrategy::Sequential, DistributionStrategy::ClaimTree] {
            let config = DistributorConfig::with_strategy(strategy);
            let distributor = IndexDistributor::with_config(0, &config);
            assert_eq!(drain(&distributor), Vec::<usize>::new());
        }
    }

    #[test]
    #[should_panic(expected = "obtained from get_count")]
    fn test_claim_tree_rejects_unadjusted_count() {
        let mut config = DistributorConfig::with_strategy(DistributionStrategy::ClaimTree);
        config.set_fan_out(2);
        config.set_leaf_count(4);
        let _ = IndexDistributor::with_config(10, &config);
    }
}
