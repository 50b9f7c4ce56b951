use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};

use crate::core::tree::{TaxonomyTree, TreeError};
use crate::core::types::{Algorithm, ClassificationId};

/// Distinct ids in first-seen order with their hit counts
#[derive(Debug, Default)]
struct Tally {
    order: Vec<ClassificationId>,
    counts: FxHashMap<ClassificationId, usize>,
}

impl Tally {
    fn add(&mut self, id: ClassificationId) {
        let count = self.counts.entry(id).or_insert(0);
        if *count == 0 {
            self.order.push(id);
        }
        *count += 1;
    }

    fn clear(&mut self) {
        self.order.clear();
        self.counts.clear();
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn first(&self) -> Option<ClassificationId> {
        self.order.first().copied()
    }

    fn reduce(&self, algorithm: Algorithm, tree: &TaxonomyTree) -> Result<ClassificationId, TreeError> {
        match self.order.as_slice() {
            [] => Ok(0),
            [id] => Ok(*id),
            ids => match algorithm {
                Algorithm::FirstHit => Ok(ids[0]),
                Algorithm::Lca => tree.lca(ids.iter().copied()),
                Algorithm::Majority => {
                    let mut best = ids[0];
                    let mut best_count = self.counts[&best];
                    for &id in &ids[1..] {
                        let count = self.counts[&id];
                        if count > best_count {
                            best = id;
                            best_count = count;
                        }
                    }
                    Ok(best)
                }
            },
        }
    }
}

/// Per-resolver scratch: enabled and disabled hits of the current header
/// (or header group).
#[derive(Debug)]
pub(crate) struct Candidates {
    algorithm: Algorithm,
    disabled: Arc<FxHashSet<ClassificationId>>,
    hits: Tally,
    disabled_hits: Tally,
}

impl Candidates {
    pub(crate) fn new(algorithm: Algorithm, disabled: Arc<FxHashSet<ClassificationId>>) -> Self {
        Self {
            algorithm,
            disabled,
            hits: Tally::default(),
            disabled_hits: Tally::default(),
        }
    }

    pub(crate) fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn is_disabled(&self, id: ClassificationId) -> bool {
        self.disabled.contains(&id)
    }

    /// Record a hit, setting disabled ids aside
    pub(crate) fn offer(&mut self, id: ClassificationId) {
        if self.is_disabled(id) {
            self.disabled_hits.add(id);
        } else {
            self.hits.add(id);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.hits.clear();
        self.disabled_hits.clear();
    }

    /// No hits at all, enabled or disabled
    pub(crate) fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.disabled_hits.is_empty()
    }

    /// Under `FirstHit`, the first enabled hit ends resolution
    pub(crate) fn first_hit(&self) -> Option<ClassificationId> {
        if self.algorithm == Algorithm::FirstHit {
            self.hits.first()
        } else {
            None
        }
    }

    /// Reduce to one id: enabled hits if there are any, else disabled hits,
    /// else `0`
    pub(crate) fn reduce(&self, tree: &TaxonomyTree) -> Result<ClassificationId, TreeError> {
        if self.hits.is_empty() {
            self.disabled_hits.reduce(self.algorithm, tree)
        } else {
            self.hits.reduce(self.algorithm, tree)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::tests::make_test_tree;

    fn candidates(algorithm: Algorithm, disabled: &[ClassificationId]) -> Candidates {
        Candidates::new(algorithm, Arc::new(disabled.iter().copied().collect()))
    }

    #[test]
    fn test_nothing_reduces_to_zero() {
        let tree = make_test_tree();
        for algorithm in [Algorithm::FirstHit, Algorithm::Majority, Algorithm::Lca] {
            assert_eq!(candidates(algorithm, &[]).reduce(&tree).unwrap(), 0);
        }
    }

    #[test]
    fn test_single_distinct_hit() {
        let tree = make_test_tree();
        let mut c = candidates(Algorithm::Lca, &[]);
        c.offer(562);
        c.offer(562);
        assert_eq!(c.reduce(&tree).unwrap(), 562);
    }

    #[test]
    fn test_lca_of_hits() {
        let tree = make_test_tree();
        let mut c = candidates(Algorithm::Lca, &[]);
        c.offer(5);
        c.offer(17);
        assert_eq!(c.reduce(&tree).unwrap(), 2);
    }

    #[test]
    fn test_majority_first_seen_breaks_ties() {
        let tree = make_test_tree();
        let mut c = candidates(Algorithm::Majority, &[]);
        for id in [17, 562, 562, 17, 9606] {
            c.offer(id);
        }
        assert_eq!(c.reduce(&tree).unwrap(), 17);

        c.offer(9606);
        c.offer(9606);
        assert_eq!(c.reduce(&tree).unwrap(), 9606);
    }

    #[test]
    fn test_enabled_hits_win_over_disabled() {
        let tree = make_test_tree();
        let mut c = candidates(Algorithm::Majority, &[9606]);
        c.offer(9606);
        c.offer(9606);
        assert!(!c.is_empty());
        assert_eq!(c.first_hit(), None);
        assert_eq!(c.reduce(&tree).unwrap(), 9606);

        c.offer(562);
        assert_eq!(c.reduce(&tree).unwrap(), 562);
    }

    #[test]
    fn test_disabled_hits_are_reduced_by_the_same_rule() {
        let tree = make_test_tree();
        let mut c = candidates(Algorithm::Lca, &[5, 17]);
        c.offer(5);
        c.offer(17);
        assert_eq!(c.reduce(&tree).unwrap(), 2);
    }

    #[test]
    fn test_first_hit() {
        let mut c = candidates(Algorithm::FirstHit, &[5]);
        c.offer(5);
        assert_eq!(c.first_hit(), None);
        c.offer(17);
        c.offer(562);
        assert_eq!(c.first_hit(), Some(17));

        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn test_lca_unknown_id_surfaces() {
        let tree = make_test_tree();
        let mut c = candidates(Algorithm::Lca, &[]);
        c.offer(562);
        c.offer(424242);
        assert_eq!(c.reduce(&tree), Err(TreeError::UnknownId(424242)));
    }
}
