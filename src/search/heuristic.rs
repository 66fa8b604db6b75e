//! Node-ordering heuristics for the search engine (C9).

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{NodeIndex, Owner, SearchTree};

/// Assigns a priority to a freshly discovered search node. Lower costs are explored first.
pub trait Heuristic<Loc, ALoc, Act>: Send + Sync
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    /// Compute the exploration priority of `node` within `tree`.
    fn compute_cost(&self, tree: &SearchTree<Loc, ALoc, Act>, node: NodeIndex) -> i64;
}

/// Explores nodes in the order they were discovered (breadth-first).
#[derive(Default)]
pub struct BfsHeuristic {
    counter: AtomicI64,
}

impl<Loc, ALoc, Act> Heuristic<Loc, ALoc, Act> for BfsHeuristic
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    fn compute_cost(&self, _tree: &SearchTree<Loc, ALoc, Act>, _node: NodeIndex) -> i64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

/// Explores the most recently discovered node first (depth-first).
#[derive(Default)]
pub struct DfsHeuristic {
    counter: AtomicI64,
}

impl<Loc, ALoc, Act> Heuristic<Loc, ALoc, Act> for DfsHeuristic
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    fn compute_cost(&self, _tree: &SearchTree<Loc, ALoc, Act>, _node: NodeIndex) -> i64 {
        -self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

/// Prefers nodes reachable after less elapsed time, computed as the minimal sum of
/// incoming-edge region-index increments along any path from the root.
#[derive(Default)]
pub struct TimeHeuristic;

impl<Loc, ALoc, Act> Heuristic<Loc, ALoc, Act> for TimeHeuristic
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    fn compute_cost(&self, tree: &SearchTree<Loc, ALoc, Act>, node: NodeIndex) -> i64 {
        fn recurse<L: Clone + Ord + fmt::Display, A: Clone + Ord + fmt::Display, Ac: Clone + Ord>(
            tree: &SearchTree<L, A, Ac>,
            node: NodeIndex,
        ) -> i64 {
            if node == tree.root() {
                return 0;
            }
            let parents = tree.parents_of(node);
            if parents.is_empty() {
                return 0;
            }
            parents
                .iter()
                .map(|&parent| {
                    let min_increment = tree
                        .children_of(parent)
                        .into_iter()
                        .filter(|(_, child)| *child == node)
                        .map(|((increment, _), _)| increment as i64)
                        .min()
                        .unwrap_or(0);
                    recurse(tree, parent) + min_increment
                })
                .min()
                .unwrap_or(0)
        }
        recurse(tree, node)
    }
}

/// Prefers nodes reached via an environment action over ones reached only via controller
/// actions, to surface adversarial behavior earlier.
#[derive(Default)]
pub struct PreferEnvironmentActionHeuristic;

impl<Loc, ALoc, Act> Heuristic<Loc, ALoc, Act> for PreferEnvironmentActionHeuristic
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    fn compute_cost(&self, tree: &SearchTree<Loc, ALoc, Act>, node: NodeIndex) -> i64 {
        let any_environment_incoming = tree.parents_of(node).iter().any(|&parent| {
            tree.children_of(parent)
                .into_iter()
                .filter(|(_, child)| *child == node)
                .any(|((_, action), _)| tree.owner(&action) == Owner::Environment)
        });
        if any_environment_incoming {
            0
        } else {
            1
        }
    }
}

/// Prefers nodes carrying fewer canonical words, a cheap proxy for how constrained a node's
/// representative configurations are.
#[derive(Default)]
pub struct NumCanonicalWordsHeuristic;

impl<Loc, ALoc, Act> Heuristic<Loc, ALoc, Act> for NumCanonicalWordsHeuristic
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    fn compute_cost(&self, tree: &SearchTree<Loc, ALoc, Act>, node: NodeIndex) -> i64 {
        tree.word_count(node) as i64
    }
}

/// A weighted sum of other heuristics.
pub struct CompositeHeuristic<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    components: Vec<(i64, Box<dyn Heuristic<Loc, ALoc, Act>>)>,
}

impl<Loc, ALoc, Act> CompositeHeuristic<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    /// Build a composite heuristic from weighted components.
    pub fn new(components: Vec<(i64, Box<dyn Heuristic<Loc, ALoc, Act>>)>) -> Self {
        Self { components }
    }
}

impl<Loc, ALoc, Act> Heuristic<Loc, ALoc, Act> for CompositeHeuristic<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    fn compute_cost(&self, tree: &SearchTree<Loc, ALoc, Act>, node: NodeIndex) -> i64 {
        self.components
            .iter()
            .map(|(weight, heuristic)| weight * heuristic.compute_cost(tree, node))
            .sum()
    }
}
