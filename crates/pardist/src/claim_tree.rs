//! Hierarchical claiming over a tree of sub-ranges.
//!
//! The claim tree spreads concurrent claims across independent leaves instead
//! of one shared cursor. Workers descend from the root claiming successively
//! finer sub-ranges, then claim sequentially inside one leaf until it drains,
//! and only then ascend to search for a fresh leaf.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

/// An internal tree node covering a sub-range of `fan_out` child sub-ranges.
struct TreeNode {
    /// Rotates which child a descending worker probes first, spreading
    /// concurrent workers across sibling sub-ranges.
    rotate: AtomicUsize,
    /// Number of children whose sub-range is fully claimed. The node's own
    /// sub-range is drained exactly when this reaches the fan-out, and each
    /// child reports exactly once, so the counter never double counts.
    drained_children: AtomicUsize,
}

impl TreeNode {
    const fn new() -> Self {
        Self {
            rotate: AtomicUsize::new(0),
            drained_children: AtomicUsize::new(0),
        }
    }
}

/// A leaf covering `leaf_count` consecutive indices.
struct TreeLeaf {
    /// Next unclaimed offset within the leaf's sub-range.
    cursor: AtomicUsize,
    /// One-shot marker that this leaf's drain has been reported upward.
    drained: AtomicBool,
}

impl TreeLeaf {
    const fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
            drained: AtomicBool::new(false),
        }
    }
}

/// A worker's cached position in the tree.
///
/// Transient per-worker state: it remembers the leaf of the previous
/// successful claim so the next claim is usually a single fetch-add. Never
/// shared between workers; cold-start searches begin at the root.
#[derive(Default)]
pub(crate) struct TreePosition {
    leaf: Option<usize>,
}

impl TreePosition {
    pub(crate) const fn new() -> Self {
        Self { leaf: None }
    }
}

/// The claim-tree distribution strategy.
///
/// The index range `[0, count)` is tiled by a complete tree: `count` is
/// `leaf_count * fan_out^depth`, every internal node has exactly `fan_out`
/// equal children, and every index belongs to exactly one leaf. Counts that
/// do not tile this way are rejected at construction; callers obtain valid
/// counts from [`round_up`](ClaimTree::round_up).
///
/// # Invariants
///
/// - A leaf is drained exactly when its cursor has reached `leaf_count`.
/// - A leaf's drain is reported upward exactly once (the `drained` swap).
/// - An internal node's `drained_children` reaches `fan_out` only after all
///   of its children are individually drained.
pub(crate) struct ClaimTree {
    fan_out: usize,
    leaf_count: usize,
    /// Internal node levels, root level first. `levels[l]` holds
    /// `fan_out^l` nodes; empty for single-leaf trees.
    levels: Vec<Box<[CachePadded<TreeNode>]>>,
    /// `fan_out^levels.len()` leaves, or none when `count == 0`.
    leaves: Box<[CachePadded<TreeLeaf>]>,
}

impl ClaimTree {
    /// Build a claim tree over `[0, count)`.
    ///
    /// # Panics
    ///
    /// Panics if `fan_out < 2`, `leaf_count < 1`, or `count` was not obtained
    /// from [`round_up`](ClaimTree::round_up) for the same tree shape. An
    /// untiled count would silently corrupt the claim invariants, so it is a
    /// construction-time contract violation rather than a runtime error.
    pub(crate) fn new(count: usize, fan_out: usize, leaf_count: usize) -> Self {
        assert!(fan_out >= 2, "claim tree fan-out must be at least 2");
        assert!(leaf_count >= 1, "claim tree leaf size must be at least 1");
        assert_eq!(
            count,
            Self::round_up(count, fan_out, leaf_count),
            "claim tree count must be obtained from get_count"
        );

        if count == 0 {
            return Self {
                fan_out,
                leaf_count,
                levels: Vec::new(),
                leaves: Box::new([]),
            };
        }

        let leaf_total = count / leaf_count;
        let mut depth: u32 = 0;
        let mut width = 1;
        while width < leaf_total {
            width *= fan_out;
            depth += 1;
        }

        let levels = (0..depth)
            .map(|level| {
                (0..fan_out.pow(level))
                    .map(|_| CachePadded::new(TreeNode::new()))
                    .collect()
            })
            .collect();
        let leaves = (0..leaf_total)
            .map(|_| CachePadded::new(TreeLeaf::new()))
            .collect();

        Self {
            fan_out,
            leaf_count,
            levels,
            leaves,
        }
    }

    /// Round `max_count` up to the smallest count that tiles into a complete
    /// tree of the given shape: `leaf_count * fan_out^depth` for the smallest
    /// sufficient depth. Zero stays zero. Already-conforming counts are fixed
    /// points, which makes the rounding idempotent.
    ///
    /// # Panics
    ///
    /// Panics if `fan_out < 2` or `leaf_count < 1`, or if the rounded count
    /// would overflow `usize`.
    pub(crate) fn round_up(max_count: usize, fan_out: usize, leaf_count: usize) -> usize {
        assert!(fan_out >= 2, "claim tree fan-out must be at least 2");
        assert!(leaf_count >= 1, "claim tree leaf size must be at least 1");
        if max_count == 0 {
            return 0;
        }
        let mut count = leaf_count;
        while count < max_count {
            count = count
                .checked_mul(fan_out)
                .expect("claim tree count overflows usize");
        }
        count
    }

    /// Claim the next unclaimed index, or `None` once the whole range is
    /// drained.
    ///
    /// The hot path is one fetch-add on the cached leaf's cursor. On local
    /// exhaustion the worker ascends from its leaf, skipping sub-ranges whose
    /// drain markers are set, and descends into a fresh leaf; the drain
    /// markers bound the search to O(log count) amortized. `None` is returned
    /// only after a root descent has observed every leaf drained, so no
    /// unclaimed index is ever abandoned.
    pub(crate) fn claim_next(&self, position: &mut TreePosition) -> Option<usize> {
        if self.leaves.is_empty() {
            return None;
        }
        loop {
            let leaf = match position.leaf {
                Some(leaf) => leaf,
                None => self.descend(0, 0)?,
            };
            if let Some(index) = self.claim_in_leaf(leaf) {
                position.leaf = Some(leaf);
                return Some(index);
            }
            // The leaf drained under us. Search for a fresh one; claims can
            // race, in which case the loop searches again.
            match self.search_from(leaf) {
                Some(next) => position.leaf = Some(next),
                None => {
                    position.leaf = None;
                    return None;
                }
            }
        }
    }

    /// Claim within a leaf's sequential cursor.
    ///
    /// The fetch-add hands out pre-increment offsets, so each offset in
    /// `[0, leaf_count)` goes to exactly one caller. Relaxed suffices: the
    /// claimed integer carries no data.
    fn claim_in_leaf(&self, leaf: usize) -> Option<usize> {
        let claim = self.leaves[leaf].cursor.fetch_add(1, Ordering::Relaxed);
        if claim < self.leaf_count {
            return Some(leaf * self.leaf_count + claim);
        }
        self.report_leaf_drained(leaf);
        None
    }

    /// Search the subtree rooted at `node` on `level` for a leaf with
    /// unclaimed indices; `level == depth` addresses a leaf directly. Fully
    /// claimed leaves encountered along the way are reported drained, so a
    /// failed root descent doubles as proof that the whole range is drained.
    fn descend(&self, level: usize, node: usize) -> Option<usize> {
        if level == self.levels.len() {
            return self.probe_leaf(node);
        }
        let start = self.levels[level][node].rotate.fetch_add(1, Ordering::Relaxed);
        for probe in 0..self.fan_out {
            let child = node * self.fan_out + (start.wrapping_add(probe) % self.fan_out);
            if level + 1 < self.levels.len() && self.is_drained(level + 1, child) {
                continue;
            }
            if let Some(leaf) = self.descend(level + 1, child) {
                return Some(leaf);
            }
        }
        None
    }

    /// Check a leaf without claiming. Reports the drain if the cursor has
    /// already passed the end.
    fn probe_leaf(&self, leaf: usize) -> Option<usize> {
        if self.leaves[leaf].cursor.load(Ordering::Relaxed) < self.leaf_count {
            return Some(leaf);
        }
        self.report_leaf_drained(leaf);
        None
    }

    /// Ascend from a drained leaf to the nearest ancestor sub-range that may
    /// still hold unclaimed indices, and descend into it. Returns `None` only
    /// once the root sub-range is drained.
    fn search_from(&self, leaf: usize) -> Option<usize> {
        let depth = self.levels.len();
        if depth == 0 {
            return None;
        }
        let mut node = leaf / self.fan_out;
        for level in (0..depth).rev() {
            if !self.is_drained(level, node) {
                if let Some(found) = self.descend(level, node) {
                    return Some(found);
                }
            }
            node /= self.fan_out;
        }
        None
    }

    /// Mark a fully claimed leaf as drained, exactly once, and cascade into
    /// every ancestor whose children have now all drained.
    ///
    /// Any worker that observes the drained cursor may report; the swap keeps
    /// the upward report exactly-once. AcqRel pairs with the Acquire loads in
    /// [`Self::is_drained`] so a set marker is never observed ahead of the
    /// child drains it summarizes.
    fn report_leaf_drained(&self, leaf: usize) {
        if self.leaves[leaf].drained.swap(true, Ordering::AcqRel) {
            return;
        }
        let depth = self.levels.len();
        if depth == 0 {
            return;
        }
        let mut node = leaf / self.fan_out;
        for level in (0..depth).rev() {
            let drained = self.levels[level][node]
                .drained_children
                .fetch_add(1, Ordering::AcqRel)
                + 1;
            if drained < self.fan_out {
                break;
            }
            node /= self.fan_out;
        }
    }

    fn is_drained(&self, level: usize, node: usize) -> bool {
        self.levels[level][node]
            .drained_children
            .load(Ordering::Acquire)
            == self.fan_out
    }
}

#[cfg(test)]
mod tests {
    use super::{ClaimTree, TreePosition};

    #[test]
    fn test_round_up_tiles_complete_trees() {
        assert_eq!(ClaimTree::round_up(0, 2, 4), 0);
        assert_eq!(ClaimTree::round_up(1, 2, 4), 4);
        assert_eq!(ClaimTree::round_up(4, 2, 4), 4);
        assert_eq!(ClaimTree::round_up(5, 2, 4), 8);
        assert_eq!(ClaimTree::round_up(10, 2, 4), 16);
        assert_eq!(ClaimTree::round_up(16, 2, 4), 16);
        assert_eq!(ClaimTree::round_up(17, 2, 4), 32);

        assert_eq!(ClaimTree::round_up(1, 8, 32), 32);
        assert_eq!(ClaimTree::round_up(33, 8, 32), 256);
        assert_eq!(ClaimTree::round_up(257, 8, 32), 2048);
    }

    #[test]
    fn test_single_worker_drains_every_index_once() {
        let tree = ClaimTree::new(16, 2, 4);
        let mut position = TreePosition::new();

        let mut seen = Vec::new();
        while let Some(index) = tree.claim_next(&mut position) {
            seen.push(index);
        }

        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
        assert_eq!(tree.claim_next(&mut position), None);
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = ClaimTree::new(4, 2, 4);
        let mut position = TreePosition::new();

        let mut seen = Vec::new();
        while let Some(index) = tree.claim_next(&mut position) {
            seen.push(index);
        }

        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_tree_is_immediately_drained() {
        let tree = ClaimTree::new(0, 2, 4);
        let mut position = TreePosition::new();
        assert_eq!(tree.claim_next(&mut position), None);
    }

    #[test]
    fn test_drain_cascades_to_every_node() {
        let tree = ClaimTree::new(16, 2, 4);
        let mut position = TreePosition::new();
        while tree.claim_next(&mut position).is_some() {}

        for level in &tree.levels {
            for node in level.iter() {
                assert_eq!(
                    node.drained_children
                        .load(std::sync::atomic::Ordering::Relaxed),
                    2
                );
            }
        }
        for leaf in tree.leaves.iter() {
            assert!(leaf.drained.load(std::sync::atomic::Ordering::Relaxed));
        }
    }

    #[test]
    fn test_fresh_position_on_drained_tree() {
        let tree = ClaimTree::new(8, 2, 4);
        let mut position = TreePosition::new();
        while tree.claim_next(&mut position).is_some() {}

        let mut cold = TreePosition::new();
        assert_eq!(tree.claim_next(&mut cold), None);
    }

    #[test]
    #[should_panic(expected = "obtained from get_count")]
    fn test_rejects_untiled_count() {
        let _ = ClaimTree::new(10, 2, 4);
    }
}
