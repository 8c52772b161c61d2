//! Sequential claiming over a single shared cursor.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

/// The sequential distribution strategy.
///
/// One atomic cursor shared by every worker. Claiming is a single fetch-add,
/// which makes the strategy correct under any worker count and scheduling,
/// at the cost of funneling all workers through one cache line.
pub(crate) struct Sequential {
    /// Next unclaimed index. At or past `count` the range is drained.
    cursor: CachePadded<AtomicUsize>,
    count: usize,
}

impl Sequential {
    pub(crate) const fn new(count: usize) -> Self {
        Self {
            cursor: CachePadded::new(AtomicUsize::new(0)),
            count,
        }
    }

    /// Claim the next unclaimed index, or `None` once the range is drained.
    ///
    /// The fetch-add hands out pre-increment values, so no two callers can
    /// observe the same one. Relaxed suffices: the claimed integer carries no
    /// data, and uniqueness comes from the read-modify-write itself.
    pub(crate) fn claim_next(&self) -> Option<usize> {
        // Keeps repeated calls on a drained range from growing the cursor.
        if self.cursor.load(Ordering::Relaxed) >= self.count {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        (index < self.count).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::Sequential;

    #[test]
    fn test_claims_every_index_once() {
        let sequential = Sequential::new(5);

        for expected in 0..5 {
            assert_eq!(sequential.claim_next(), Some(expected));
        }
        assert_eq!(sequential.claim_next(), None);
        assert_eq!(sequential.claim_next(), None);
    }

    #[test]
    fn test_empty_range_is_immediately_drained() {
        let sequential = Sequential::new(0);
        assert_eq!(sequential.claim_next(), None);
    }
}
