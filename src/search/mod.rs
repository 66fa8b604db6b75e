//! The search engine (C8): a concurrent DAG over canonical words, incrementally labeled with
//! the winner of the underlying reachability game.

pub mod heuristic;
pub mod pool;
pub mod queue;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::ata::Ata;
use crate::canonical::{get_canonical_word, get_candidate, plant_projection, CanonicalWord};
use crate::clock::RegionIndex;
use crate::error::Error;
use crate::plant::{Configuration, TimedAutomaton};
use crate::successor::enumerate_successors;

use self::heuristic::{BfsHeuristic, Heuristic};
use self::pool::ThreadPool;
use self::queue::{ExplorationQueue, PriorityQueue};

/// An index into a [`SearchTree`]'s node arena.
pub type NodeIndex = usize;

/// The verdict a node has settled into, independent of the incremental labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeState {
    /// Not yet decided.
    Unknown = 0,
    /// A winning state for the controller (e.g. no reachable bad behavior from here).
    Good = 1,
    /// A state exhibiting the forbidden behavior.
    Bad = 2,
    /// A state with no outgoing transitions at all.
    Dead = 3,
}

impl From<u8> for NodeState {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Good,
            2 => Self::Bad,
            3 => Self::Dead,
            _ => Self::Unknown,
        }
    }
}

/// The reachability-game label assigned to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeLabel {
    /// Not yet labeled.
    Unlabeled = 0,
    /// The environment wins from this node.
    Bottom = 1,
    /// The controller wins from this node.
    Top = 2,
    /// Labeling was skipped because an ancestor already settled the outcome.
    Canceled = 3,
}

impl From<u8> for NodeLabel {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Bottom,
            2 => Self::Top,
            3 => Self::Canceled,
            _ => Self::Unlabeled,
        }
    }
}

/// Why a node received the label it did, for debugging and for the controller extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelReason {
    /// No label has been assigned yet.
    Unknown,
    /// The node exhibits the forbidden behavior directly.
    BadNode,
    /// The node has no outgoing transitions.
    DeadNode,
    /// Every canonical word's ATA component is in the sink location.
    NoAtaSuccessor,
    /// The node is dominated by an ancestor (disabled by default).
    MonotonicDomination,
    /// No environment action leads anywhere bad.
    NoBadEnvAction,
    /// A winning controller action exists strictly before any bad or undecided environment step.
    GoodControllerActionFirst,
    /// A bad environment action exists strictly before any winning or non-bad controller step.
    BadEnvActionFirst,
}

/// Whether an action belongs to the controller or to the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// An action the controller chooses.
    Controller,
    /// An action the environment chooses.
    Environment,
}

struct SearchNode<Loc, ALoc, Act> {
    words: Mutex<BTreeSet<CanonicalWord<Loc, ALoc>>>,
    state: AtomicU8,
    label: AtomicU8,
    label_reason: Mutex<LabelReason>,
    is_expanded: AtomicBool,
    parents: Mutex<Vec<NodeIndex>>,
    children: Mutex<BTreeMap<(RegionIndex, Act), NodeIndex>>,
}

impl<Loc, ALoc, Act: Ord> SearchNode<Loc, ALoc, Act> {
    fn new(words: BTreeSet<CanonicalWord<Loc, ALoc>>, parent: Option<NodeIndex>) -> Self {
        Self {
            words: Mutex::new(words),
            state: AtomicU8::new(NodeState::Unknown as u8),
            label: AtomicU8::new(NodeLabel::Unlabeled as u8),
            label_reason: Mutex::new(LabelReason::Unknown),
            is_expanded: AtomicBool::new(false),
            parents: Mutex::new(parent.into_iter().collect()),
            children: Mutex::new(BTreeMap::new()),
        }
    }
}

/// Accumulated exploration statistics, reported once the search completes.
#[derive(Debug, Clone, Default)]
pub struct ExplorationStats {
    /// Number of distinct DAG nodes created.
    pub nodes: u64,
    /// Number of edges (parent/child links) created.
    pub edges: u64,
    /// Wall-clock time spent exploring, in seconds.
    pub seconds: f64,
}

impl std::ops::AddAssign for ExplorationStats {
    fn add_assign(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.edges += other.edges;
        self.seconds += other.seconds;
    }
}

impl fmt::Display for ExplorationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} edges, {:.3}s",
            self.nodes, self.edges, self.seconds
        )
    }
}

/// The search DAG: an arena of [`SearchNode`]s rooted at the plant/ATA's joint initial
/// configuration, explored and incrementally labeled with the reachability game's winner.
pub struct SearchTree<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    nodes: Vec<SearchNode<Loc, ALoc, Act>>,
    word_to_node: HashMap<BTreeSet<CanonicalWord<Loc, ALoc>>, NodeIndex>,
    root: NodeIndex,
    plant: TimedAutomaton<Loc, Act>,
    ata: Ata<ALoc, Act>,
    controller_actions: BTreeSet<Act>,
    environment_actions: BTreeSet<Act>,
    k: u32,
    incremental_labeling: bool,
    heuristic: Box<dyn Heuristic<Loc, ALoc, Act>>,
    stats: Mutex<ExplorationStats>,
    expanded: std::sync::atomic::AtomicU64,
}

impl<Loc, ALoc, Act> SearchTree<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    /// Build a fresh search tree rooted at the plant's and ATA's initial configurations.
    ///
    /// `controller_actions` and `environment_actions` must be disjoint; every action in the
    /// plant's alphabet must belong to exactly one of them.
    pub fn new(
        plant: TimedAutomaton<Loc, Act>,
        ata: Ata<ALoc, Act>,
        controller_actions: BTreeSet<Act>,
        environment_actions: BTreeSet<Act>,
        k: u32,
        incremental_labeling: bool,
    ) -> Result<Self, Error> {
        if controller_actions.intersection(&environment_actions).next().is_some() {
            return Err(Error::InvalidTimedWord(
                "controller and environment action sets must be disjoint".to_string(),
            ));
        }
        let plant_config = plant.initial_configuration();
        let ata_config: BTreeSet<(ALoc, crate::clock::ClockValue)> = BTreeSet::from([(
            ata.initial_location().clone(),
            crate::clock::ClockValue::from_integer(0),
        )]);
        let root_word = get_canonical_word(&plant_config, &ata_config, k)?;
        let mut words = BTreeSet::new();
        words.insert(root_word);

        let mut tree = Self {
            nodes: vec![SearchNode::new(words.clone(), None)],
            word_to_node: HashMap::new(),
            root: 0,
            plant,
            ata,
            controller_actions,
            environment_actions,
            k,
            incremental_labeling,
            heuristic: Box::new(BfsHeuristic::default()),
            stats: Mutex::new(ExplorationStats::default()),
            expanded: std::sync::atomic::AtomicU64::new(0),
        };
        tree.word_to_node.insert(words, 0);
        tree.stats.lock().unwrap().nodes = 1;
        log::debug!(
            "search tree initialized: {} controller actions, {} environment actions, k = {}",
            tree.controller_actions.len(),
            tree.environment_actions.len(),
            tree.k
        );
        Ok(tree)
    }

    /// Install a non-default heuristic.
    pub fn with_heuristic(mut self, heuristic: Box<dyn Heuristic<Loc, ALoc, Act>>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// The root node's index.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// The label currently assigned to the root.
    pub fn root_label(&self) -> NodeLabel {
        self.label_of(self.root)
    }

    /// The label currently assigned to `node`.
    pub fn label_of(&self, node: NodeIndex) -> NodeLabel {
        NodeLabel::from(self.nodes[node].label.load(Ordering::SeqCst))
    }

    /// The state currently assigned to `node`.
    pub fn state_of(&self, node: NodeIndex) -> NodeState {
        NodeState::from(self.nodes[node].state.load(Ordering::SeqCst))
    }

    /// Why `node` received its current label.
    pub fn label_reason(&self, node: NodeIndex) -> LabelReason {
        *self.nodes[node].label_reason.lock().unwrap()
    }

    /// The parent nodes of `node`.
    pub fn parents_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.nodes[node].parents.lock().unwrap().clone()
    }

    /// The `(time_increment, action) -> child` edges out of `node`.
    pub fn children_of(&self, node: NodeIndex) -> Vec<((RegionIndex, Act), NodeIndex)> {
        self.nodes[node]
            .children
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// The canonical words currently associated with `node`.
    pub fn words_of(&self, node: NodeIndex) -> BTreeSet<CanonicalWord<Loc, ALoc>> {
        self.nodes[node].words.lock().unwrap().clone()
    }

    /// The number of canonical words associated with `node`.
    pub fn word_count(&self, node: NodeIndex) -> usize {
        self.nodes[node].words.lock().unwrap().len()
    }

    /// Whether `action` belongs to the controller or the environment.
    pub fn owner(&self, action: &Act) -> Owner {
        if self.controller_actions.contains(action) {
            Owner::Controller
        } else {
            Owner::Environment
        }
    }

    /// Accumulated exploration statistics.
    pub fn stats(&self) -> ExplorationStats {
        self.stats.lock().unwrap().clone()
    }

    fn is_bad_node(&self, node: NodeIndex) -> bool {
        let words = self.nodes[node].words.lock().unwrap();
        words.iter().any(|word| {
            let (location, clocks, _) = get_candidate(word);
            match location {
                Some(location) => self.plant.is_accepting(&Configuration { location, clocks }),
                None => false,
            }
        })
    }

    fn has_satisfiable_ata_configuration(&self, node: NodeIndex) -> bool {
        let sink = self.ata.sink_location();
        let words = self.nodes[node].words.lock().unwrap();
        words.iter().any(|word| {
            !word.iter().any(|partition| {
                partition.iter().any(|symbol| match symbol {
                    crate::canonical::AbRegionSymbol::Ata(a) => &a.location == sink,
                    crate::canonical::AbRegionSymbol::Plant(_) => false,
                })
            })
        })
    }

    fn try_label(&self, node: NodeIndex, new_label: NodeLabel, reason: LabelReason) -> bool {
        let result = self.nodes[node].label.compare_exchange(
            NodeLabel::Unlabeled as u8,
            new_label as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if result.is_ok() {
            *self.nodes[node].label_reason.lock().unwrap() = reason;
            log::trace!("node {} labeled {:?} ({:?})", node, new_label, reason);
            true
        } else {
            false
        }
    }

    fn label_propagate(&self, node: NodeIndex) {
        if self.label_of(node) != NodeLabel::Unlabeled {
            for parent in self.parents_of(node) {
                self.label_propagate(parent);
            }
            return;
        }
        let children = self.children_of(node);
        if children.is_empty() {
            return;
        }

        let mut first_good_controller_step: Option<RegionIndex> = None;
        let mut first_non_bad_controller_step: Option<RegionIndex> = None;
        let mut first_non_good_environment_step: Option<RegionIndex> = None;
        let mut first_bad_environment_step: Option<RegionIndex> = None;

        for ((increment, action), child) in &children {
            let child_label = self.label_of(*child);
            match self.owner(action) {
                Owner::Controller => {
                    if child_label == NodeLabel::Top {
                        first_good_controller_step =
                            Some(first_good_controller_step.map_or(*increment, |v| v.min(*increment)));
                    }
                    if child_label != NodeLabel::Bottom {
                        first_non_bad_controller_step = Some(
                            first_non_bad_controller_step.map_or(*increment, |v| v.min(*increment)),
                        );
                    }
                }
                Owner::Environment => {
                    if child_label != NodeLabel::Top {
                        first_non_good_environment_step = Some(
                            first_non_good_environment_step.map_or(*increment, |v| v.min(*increment)),
                        );
                    }
                    if child_label == NodeLabel::Bottom {
                        first_bad_environment_step =
                            Some(first_bad_environment_step.map_or(*increment, |v| v.min(*increment)));
                    }
                }
            }
        }

        fn opt_lt(a: Option<RegionIndex>, b: Option<RegionIndex>) -> bool {
            match (a, b) {
                (Some(x), Some(y)) => x < y,
                (Some(_), None) => true,
                (None, _) => false,
            }
        }
        let decision = if first_non_good_environment_step.is_none() && first_bad_environment_step.is_none()
        {
            Some((NodeLabel::Top, LabelReason::NoBadEnvAction))
        } else if opt_lt(first_good_controller_step, first_non_good_environment_step)
            && opt_lt(first_good_controller_step, first_bad_environment_step)
        {
            Some((NodeLabel::Top, LabelReason::GoodControllerActionFirst))
        } else if first_bad_environment_step.is_some()
            && opt_lt(first_bad_environment_step, first_good_controller_step)
            && opt_lt(first_bad_environment_step, first_non_bad_controller_step)
        {
            Some((NodeLabel::Bottom, LabelReason::BadEnvActionFirst))
        } else {
            None
        };

        if let Some((label, reason)) = decision {
            if self.try_label(node, label, reason) {
                for parent in self.parents_of(node) {
                    self.label_propagate(parent);
                }
            }
        }
    }

    fn get_or_create_child(
        &mut self,
        words: BTreeSet<CanonicalWord<Loc, ALoc>>,
        parent: NodeIndex,
    ) -> (NodeIndex, bool) {
        if let Some(&existing) = self.word_to_node.get(&words) {
            self.nodes[existing].parents.lock().unwrap().push(parent);
            return (existing, false);
        }
        let index = self.nodes.len();
        self.nodes.push(SearchNode::new(words.clone(), Some(parent)));
        self.word_to_node.insert(words, index);
        self.stats.lock().unwrap().nodes += 1;
        (index, true)
    }

    /// Expand a single node: classify it as bad/dead/vacuously-good, or compute its successor
    /// edges and create/merge the corresponding children.
    pub fn expand_node(&mut self, node: NodeIndex, queue: &mut dyn ExplorationQueue<NodeIndex, i64>) -> Result<(), Error> {
        if self.nodes[node].is_expanded.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if self.label_of(node) != NodeLabel::Unlabeled {
            return Ok(());
        }

        let expanded_so_far = self.expanded.fetch_add(1, Ordering::SeqCst) + 1;
        if expanded_so_far % 1000 == 0 {
            log::debug!("expanded {} nodes so far ({})", expanded_so_far, self.stats());
        }

        if self.is_bad_node(node) {
            self.nodes[node].state.store(NodeState::Bad as u8, Ordering::SeqCst);
            if self.incremental_labeling && self.try_label(node, NodeLabel::Bottom, LabelReason::BadNode) {
                self.label_propagate(node);
            } else {
                *self.nodes[node].label_reason.lock().unwrap() = LabelReason::BadNode;
            }
            return Ok(());
        }

        if !self.has_satisfiable_ata_configuration(node) {
            self.nodes[node].state.store(NodeState::Good as u8, Ordering::SeqCst);
            if self.incremental_labeling
                && self.try_label(node, NodeLabel::Top, LabelReason::NoAtaSuccessor)
            {
                self.label_propagate(node);
            }
            return Ok(());
        }

        let ancestors: Vec<_> = Vec::new(); // monotonic domination is disabled by default
        if crate::canonical::dominates_ancestor(&self.words_of(node), &ancestors) {
            self.nodes[node].state.store(NodeState::Good as u8, Ordering::SeqCst);
            if self.incremental_labeling
                && self.try_label(node, NodeLabel::Top, LabelReason::MonotonicDomination)
            {
                self.label_propagate(node);
            }
            return Ok(());
        }

        let words = self.words_of(node);
        let mut groups: BTreeMap<(Act, RegionIndex), BTreeSet<CanonicalWord<Loc, ALoc>>> = BTreeMap::new();
        for word in &words {
            for edge in enumerate_successors(&self.plant, &self.ata, word, self.k)? {
                groups
                    .entry((edge.action.clone(), edge.time_increment))
                    .or_default()
                    .insert(edge.word);
            }
        }

        if groups.is_empty() {
            self.nodes[node].state.store(NodeState::Dead as u8, Ordering::SeqCst);
            if self.incremental_labeling && self.try_label(node, NodeLabel::Top, LabelReason::DeadNode) {
                self.label_propagate(node);
            }
            return Ok(());
        }

        for ((action, increment), child_words) in groups {
            let (child, is_new) = self.get_or_create_child(child_words, node);
            self.nodes[node]
                .children
                .lock()
                .unwrap()
                .insert((increment, action), child);
            self.stats.lock().unwrap().edges += 1;
            if is_new {
                let priority = -self.heuristic.compute_cost(self, child);
                queue.push_scored(child, priority);
            }
        }

        Ok(())
    }

    /// Pop one job from `queue` and expand it. Returns `false` once the queue is drained.
    pub fn step(&mut self, queue: &mut dyn ExplorationQueue<NodeIndex, i64>) -> Result<bool, Error> {
        match queue.pop() {
            Some(node) => {
                self.expand_node(node, queue)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the search to completion, single-threaded.
    pub fn build_tree_single_threaded(&mut self) -> Result<(), Error> {
        log::info!("starting single-threaded search exploration");
        let start = Instant::now();
        let mut queue: PriorityQueue<NodeIndex, i64> = PriorityQueue::default();
        let root_priority = -self.heuristic.compute_cost(self, self.root);
        queue.push_scored(self.root, root_priority);
        while self.step(&mut queue)? {}
        self.stats.lock().unwrap().seconds += start.elapsed().as_secs_f64();
        log::info!(
            "single-threaded search finished: root label = {:?} ({})",
            self.root_label(),
            self.stats()
        );
        Ok(())
    }
}

impl<Loc, ALoc, Act> SearchTree<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    ALoc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    Act: Clone + Ord + fmt::Display + Send + Sync + 'static,
{
    /// Run the search to completion using a bounded worker pool.
    ///
    /// The arena is protected by a coarse lock here (each job takes `self` under a mutex) since
    /// [`SearchTree`]'s fields are not individually lock-free across the whole structure; the
    /// per-node `AtomicU8`/`Mutex` fields still allow lock-free reads of labels from other
    /// threads (e.g. a concurrently running controller extraction pass).
    pub fn build_tree(self, num_threads: usize) -> Result<Self, Error> {
        log::info!("starting search exploration with {} worker threads", num_threads);
        let start = Instant::now();
        let pool = std::sync::Arc::new(ThreadPool::new(num_threads));
        pool.start()?;

        let tree = std::sync::Arc::new(Mutex::new(self));
        {
            let guard = tree.lock().unwrap();
            let root = guard.root;
            let priority = -guard.heuristic.compute_cost(&guard, root);
            drop(guard);
            schedule(std::sync::Arc::clone(&tree), std::sync::Arc::clone(&pool), root, priority);
        }
        pool.finish();

        let mut tree = std::sync::Arc::try_unwrap(tree)
            .map_err(|_| Error::InvalidTimedWord("search tree still referenced".to_string()))?
            .into_inner()
            .unwrap();
        tree.stats.lock().unwrap().seconds += start.elapsed().as_secs_f64();
        log::info!(
            "search finished: root label = {:?} ({})",
            tree.root_label(),
            tree.stats()
        );
        Ok(tree)
    }
}

fn schedule<Loc, ALoc, Act>(
    tree: std::sync::Arc<Mutex<SearchTree<Loc, ALoc, Act>>>,
    pool: std::sync::Arc<ThreadPool>,
    node: NodeIndex,
    priority: i64,
) where
    Loc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    ALoc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    Act: Clone + Ord + fmt::Display + Send + Sync + 'static,
{
    let pool_for_job = std::sync::Arc::clone(&pool);
    let _ = pool.add_job(priority, move || {
        let new_children = {
            let mut guard = tree.lock().unwrap();
            let mut collector = CollectingQueue::default();
            let _ = guard.expand_node(node, &mut collector);
            collector.items
        };
        for (child, child_priority) in new_children {
            schedule(std::sync::Arc::clone(&tree), std::sync::Arc::clone(&pool_for_job), child, child_priority);
        }
    });
}

#[derive(Default)]
struct CollectingQueue {
    items: Vec<(NodeIndex, i64)>,
}

impl ExplorationQueue<NodeIndex, i64> for CollectingQueue {
    fn push_scored(&mut self, item: NodeIndex, score: i64) {
        self.items.push((item, score));
    }
    fn push(&mut self, item: NodeIndex) {
        self.items.push((item, 0));
    }
    fn pop(&mut self) -> Option<NodeIndex> {
        self.items.pop().map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ata::AtaFormula;
    use crate::clock::{ClockConstraint, ComparisonOp};
    use std::collections::BTreeSet as Set;

    fn bad_reachable_plant() -> TimedAutomaton<String, String> {
        let locations: Set<String> = ["s0", "bad"].iter().map(|s| s.to_string()).collect();
        let clocks: Set<String> = ["x"].iter().map(|s| s.to_string()).collect();
        let alphabet: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let transitions = vec![TimedAutomaton::make_transition(
            "s0".to_string(),
            "a".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            Set::new(),
            "bad".to_string(),
        )];
        TimedAutomaton::new(
            locations,
            clocks,
            alphabet,
            "s0".to_string(),
            Set::from(["bad".to_string()]),
            transitions,
        )
        .unwrap()
    }

    fn always_true_ata() -> Ata<String, String> {
        let alphabet: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        Ata::new(
            alphabet,
            "l0".to_string(),
            Set::new(),
            "sink".to_string(),
            vec![("l0".to_string(), "a".to_string(), AtaFormula::True)],
        )
    }

    #[test]
    fn environment_action_to_bad_location_loses_for_controller() {
        let plant = bad_reachable_plant();
        let ata = always_true_ata();
        let environment: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let mut tree =
            SearchTree::new(plant, ata, Set::new(), environment, 1, true).unwrap();
        tree.build_tree_single_threaded().unwrap();
        // "a" is an environment action and leads straight to the bad location with no
        // controller action able to preempt it: the root must be labeled Bottom.
        assert_eq!(tree.root_label(), NodeLabel::Bottom);
    }

    #[test]
    fn controller_owned_bad_action_can_simply_be_avoided() {
        let plant = bad_reachable_plant();
        let ata = always_true_ata();
        let controller: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let mut tree =
            SearchTree::new(plant, ata, controller, Set::new(), 1, true).unwrap();
        tree.build_tree_single_threaded().unwrap();
        // Since "a" is controller-owned, the controller simply never has to choose it: no
        // environment action forces the bad location, so the root is labeled Top.
        assert_eq!(tree.root_label(), NodeLabel::Top);
    }

    #[test]
    fn label_propagate_leaves_node_unlabeled_on_exact_tie() {
        let plant = bad_reachable_plant();
        let ata = always_true_ata();
        let controller: Set<String> = ["c"].iter().map(|s| s.to_string()).collect();
        let environment: Set<String> = ["e"].iter().map(|s| s.to_string()).collect();
        let mut tree = SearchTree::new(plant, ata, controller, environment, 1, true).unwrap();

        let root = tree.root();
        let words = tree.words_of(root);

        let top_child = tree.nodes.len();
        tree.nodes.push(SearchNode::new(words.clone(), Some(root)));
        tree.nodes[top_child].label.store(NodeLabel::Top as u8, Ordering::SeqCst);

        let bottom_child = tree.nodes.len();
        tree.nodes.push(SearchNode::new(words, Some(root)));
        tree.nodes[bottom_child].label.store(NodeLabel::Bottom as u8, Ordering::SeqCst);

        {
            let mut children = tree.nodes[root].children.lock().unwrap();
            children.insert((5, "c".to_string()), top_child);
            children.insert((5, "e".to_string()), bottom_child);
        }

        tree.label_propagate(root);

        // A controller action reaching a Top child and an environment action reaching a
        // Bottom child at the same region increment is an exact tie: the strict inequality
        // the labeling rules require must leave the node unlabeled rather than resolve it
        // to Bottom.
        assert_eq!(tree.label_of(root), NodeLabel::Unlabeled);
    }
}
