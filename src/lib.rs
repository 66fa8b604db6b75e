//! Synthesis of finite, time-deterministic controllers against MTL specifications of forbidden
//! behavior, framed as a real-time two-player zero-sum reachability game between a controller
//! and an adversarial environment over a timed plant.
//!
//! The pipeline: a plant [`plant::TimedAutomaton`] and an [`mtl::MtlFormula`] of forbidden
//! behavior are translated ([`translator::translate`]) into an alternating timed automaton
//! ([`ata::Ata`]); [`search::SearchTree`] explores the product game over canonical AB-words
//! ([`canonical`], [`successor`]), labeling each node with the reachability game's winner; and
//! [`controller::create_controller`] extracts a winning strategy as a timed automaton, when one
//! exists.

pub mod ata;
pub mod canonical;
pub mod clock;
pub mod controller;
pub mod error;
pub mod format;
pub mod mtl;
pub mod options;
pub mod plant;
pub mod search;
pub mod successor;
pub mod translator;
pub mod visualize;

use std::fmt;

use crate::ata::Ata;
use crate::controller::ControllerLocation;
use crate::error::Error;
use crate::mtl::MtlFormula;
use crate::options::{HeuristicKind, SynthesisOptions};
use crate::plant::TimedAutomaton;
use crate::search::heuristic::{
    BfsHeuristic, CompositeHeuristic, DfsHeuristic, Heuristic, NumCanonicalWordsHeuristic,
    PreferEnvironmentActionHeuristic, TimeHeuristic,
};
use crate::search::{ExplorationStats, SearchTree};

/// The outcome of a synthesis run.
pub enum Status<Loc, ALoc, Act>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    /// A controller enforcing the specification exists.
    Realizable {
        /// The extracted controller.
        controller: TimedAutomaton<ControllerLocation<Loc, ALoc>, Act>,
        /// Statistics accumulated while exploring the search DAG.
        stats: ExplorationStats,
    },
    /// No such controller exists: the environment can always force the forbidden behavior.
    Unrealizable {
        /// Statistics accumulated while exploring the search DAG.
        stats: ExplorationStats,
    },
}

fn build_heuristic<Loc, ALoc, Act>(kind: HeuristicKind) -> Box<dyn Heuristic<Loc, ALoc, Act>>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display + Send + Sync + 'static,
{
    match kind {
        HeuristicKind::Bfs => Box::new(BfsHeuristic::default()),
        HeuristicKind::Dfs => Box::new(DfsHeuristic::default()),
        HeuristicKind::Time => Box::new(TimeHeuristic),
        HeuristicKind::PreferEnvironment => Box::new(PreferEnvironmentActionHeuristic),
        HeuristicKind::FewestWords => Box::new(NumCanonicalWordsHeuristic),
        HeuristicKind::Composite => Box::new(CompositeHeuristic::new(vec![
            (1, Box::new(TimeHeuristic)),
            (1, Box::new(BfsHeuristic::default())),
        ])),
    }
}

/// Synthesize a controller for `plant` against the MTL specification `formula` of forbidden
/// behavior, translating `formula` into an ATA before exploring the search DAG.
///
/// This is the common entry point for text-format plants and specifications, where both use
/// `String` locations/clocks/actions; for a plant with a richer location type, or an
/// already-translated ATA, use [`synthesize_with`] directly.
pub fn synthesize(
    plant: TimedAutomaton<String, String>,
    formula: &MtlFormula<String>,
    options: &SynthesisOptions,
) -> Result<Status<String, String, String>, Error> {
    log::info!(
        "synthesizing controller: {} locations, {} actions",
        plant.locations().len(),
        plant.alphabet().len()
    );
    let ata = crate::translator::translate(formula, plant.alphabet())?;
    synthesize_with(plant, ata, options)
}

/// Build and fully explore the search DAG for `plant` against `ata`, without extracting a
/// controller. Exposed separately from [`synthesize_with`] so that callers who want to inspect
/// or render the raw search tree (e.g. the CLI's `--visualize-search-tree`) can do so before the
/// controller-extraction pass consumes it.
///
/// Returns the tree together with the region-abstraction constant `k` that was used, which the
/// controller extractor also needs.
pub fn explore_with<Loc, ALoc, Act>(
    plant: TimedAutomaton<Loc, Act>,
    ata: Ata<ALoc, Act>,
    options: &SynthesisOptions,
) -> Result<(SearchTree<Loc, ALoc, Act>, u32), Error>
where
    Loc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    ALoc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    Act: Clone + Ord + fmt::Display + Send + Sync + 'static,
{
    let environment_actions: std::collections::BTreeSet<Act> = plant
        .alphabet()
        .iter()
        .filter(|action| !options.controller_actions.contains(&action.to_string()))
        .cloned()
        .collect();
    let controller_actions: std::collections::BTreeSet<Act> = plant
        .alphabet()
        .iter()
        .filter(|action| options.controller_actions.contains(&action.to_string()))
        .cloned()
        .collect();

    let k = options.k.unwrap_or_else(|| plant.largest_constant());

    let tree = SearchTree::new(
        plant,
        ata,
        controller_actions,
        environment_actions,
        k,
        options.incremental_labeling,
    )?
    .with_heuristic(build_heuristic(options.heuristic));

    let tree = if options.single_threaded {
        let mut tree = tree;
        tree.build_tree_single_threaded()?;
        tree
    } else {
        let threads = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        tree.build_tree(threads)?
    };

    log::info!("search completed: {}", tree.stats());
    Ok((tree, k))
}

/// Synthesize a controller for `plant` against an already-translated ATA `ata`.
///
/// `options.k` is used as the region-abstraction constant if given, otherwise it is derived from
/// the plant's own largest guard constant. Callers translating their own specification should
/// make sure it covers the formula's largest constant too, e.g. via [`mtl::MtlFormula::largest_constant`].
pub fn synthesize_with<Loc, ALoc, Act>(
    plant: TimedAutomaton<Loc, Act>,
    ata: Ata<ALoc, Act>,
    options: &SynthesisOptions,
) -> Result<Status<Loc, ALoc, Act>, Error>
where
    Loc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    ALoc: Clone + Ord + fmt::Display + Send + Sync + 'static,
    Act: Clone + Ord + fmt::Display + Send + Sync + 'static,
{
    let (tree, k) = explore_with(plant, ata, options)?;
    match tree.root_label() {
        crate::search::NodeLabel::Top => {
            let controller = crate::controller::create_controller(&tree, k)?;
            Ok(Status::Realizable { controller, stats: tree.stats() })
        }
        _ => Ok(Status::Unrealizable { stats: tree.stats() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockConstraint, ComparisonOp};
    use std::collections::BTreeSet;

    fn single_action_plant() -> TimedAutomaton<String, String> {
        let locations: BTreeSet<String> = ["s0", "bad"].iter().map(|s| s.to_string()).collect();
        let clocks: BTreeSet<String> = ["x"].iter().map(|s| s.to_string()).collect();
        let alphabet: BTreeSet<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let transitions = vec![TimedAutomaton::make_transition(
            "s0".to_string(),
            "a".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            BTreeSet::new(),
            "bad".to_string(),
        )];
        TimedAutomaton::new(
            locations,
            clocks,
            alphabet,
            "s0".to_string(),
            BTreeSet::from(["bad".to_string()]),
            transitions,
        )
        .unwrap()
    }

    #[test]
    fn environment_owned_bad_action_is_unrealizable() {
        let plant = single_action_plant();
        let formula = MtlFormula::finally(crate::mtl::Interval::unbounded(), MtlFormula::Atom("a".to_string()));
        let mut options = SynthesisOptions::default();
        options.single_threaded = true;
        let status = synthesize(plant, &formula, &options).unwrap();
        assert!(matches!(status, Status::Unrealizable { .. }));
    }

    #[test]
    fn controller_owned_bad_action_is_realizable() {
        let plant = single_action_plant();
        let formula = MtlFormula::finally(crate::mtl::Interval::unbounded(), MtlFormula::Atom("a".to_string()));
        let mut options = SynthesisOptions::default();
        options.single_threaded = true;
        options.controller_actions.insert("a".to_string());
        let status = synthesize(plant, &formula, &options).unwrap();
        assert!(matches!(status, Status::Realizable { .. }));
    }
}
