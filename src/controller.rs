//! The controller-extraction pass (C10): turns the labeled search DAG into a concrete,
//! finite timed automaton implementing a winning controller strategy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::canonical::{get_nth_time_successor, CanonicalWord};
use crate::clock::{constraints_from_region, BoundType, ClockConstraint, RegionIndex};
use crate::error::Error;
use crate::plant::TimedAutomaton;
use crate::search::{NodeIndex, NodeLabel, SearchTree};

/// A controller location: the set of canonical words carried by the search node it was
/// extracted from. Distinct nodes with the same word set collapse to the same location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ControllerLocation<Loc, ALoc>(pub BTreeSet<CanonicalWord<Loc, ALoc>>);

impl<Loc, ALoc> fmt::Display for ControllerLocation<Loc, ALoc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q[{} words]", self.0.len())
    }
}

fn split_into_runs(mut values: Vec<RegionIndex>) -> Vec<Vec<RegionIndex>> {
    values.sort_unstable();
    values.dedup();
    let mut runs: Vec<Vec<RegionIndex>> = Vec::new();
    for v in values {
        match runs.last_mut() {
            Some(run) if *run.last().unwrap() + 1 == v => run.push(v),
            _ => runs.push(vec![v]),
        }
    }
    runs
}

fn constraints_from_word<Loc, ALoc>(
    word: &CanonicalWord<Loc, ALoc>,
    max_region_index: RegionIndex,
    bound_type: BoundType,
) -> BTreeMap<String, Vec<ClockConstraint>> {
    let mut out: BTreeMap<String, Vec<ClockConstraint>> = BTreeMap::new();
    for partition in word {
        for symbol in partition {
            if let crate::canonical::AbRegionSymbol::Plant(p) = symbol {
                out.entry(p.clock.clone())
                    .or_default()
                    .extend(constraints_from_region(p.region_index, max_region_index, bound_type));
            }
        }
    }
    out
}

fn guard_for_run<Loc: Clone + Ord, ALoc: Clone + Ord>(
    representative_word: &CanonicalWord<Loc, ALoc>,
    run: &[RegionIndex],
    k: u32,
) -> Result<Vec<(String, ClockConstraint)>, Error> {
    let max_region_index = 2 * k + 1;
    let mut out = Vec::new();
    if run.len() == 1 {
        let successor = get_nth_time_successor(representative_word, run[0], k)?;
        for (clock, constraints) in constraints_from_word(&successor, max_region_index, BoundType::Both) {
            out.extend(constraints.into_iter().map(|c| (clock.clone(), c)));
        }
    } else {
        let first = *run.first().unwrap();
        let last = *run.last().unwrap();
        let lower_word = get_nth_time_successor(representative_word, first, k)?;
        for (clock, constraints) in constraints_from_word(&lower_word, max_region_index, BoundType::Lower) {
            out.extend(constraints.into_iter().map(|c| (clock.clone(), c)));
        }
        let upper_word = get_nth_time_successor(representative_word, last, k)?;
        for (clock, constraints) in constraints_from_word(&upper_word, max_region_index, BoundType::Upper) {
            out.extend(constraints.into_iter().map(|c| (clock.clone(), c)));
        }
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn add_node_to_controller<Loc, ALoc, Act>(
    tree: &SearchTree<Loc, ALoc, Act>,
    node: NodeIndex,
    k: u32,
    visited: &mut BTreeSet<NodeIndex>,
    locations: &mut BTreeSet<ControllerLocation<Loc, ALoc>>,
    clocks: &mut BTreeSet<String>,
    alphabet: &mut BTreeSet<Act>,
    transitions: &mut Vec<crate::plant::Transition<ControllerLocation<Loc, ALoc>, Act>>,
) -> Result<(), Error>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    if !visited.insert(node) {
        return Ok(());
    }
    if tree.label_of(node) != NodeLabel::Top {
        return Err(Error::InvalidTimedWord(
            "controller extraction only walks nodes won by the controller".to_string(),
        ));
    }

    let words = tree.words_of(node);
    let location = ControllerLocation(words.clone());
    locations.insert(location.clone());

    let representative_word = match words.iter().next() {
        Some(w) => w.clone(),
        None => return Ok(()),
    };

    let mut increments_by_action: BTreeMap<Act, Vec<RegionIndex>> = BTreeMap::new();
    let mut child_of: BTreeMap<(Act, RegionIndex), NodeIndex> = BTreeMap::new();
    for ((increment, action), child) in tree.children_of(node) {
        if tree.label_of(child) == NodeLabel::Top {
            increments_by_action.entry(action.clone()).or_default().push(increment);
            child_of.insert((action, increment), child);
        }
    }

    for (action, increments) in increments_by_action {
        alphabet.insert(action.clone());
        for run in split_into_runs(increments) {
            let guard = guard_for_run(&representative_word, &run, k)?;
            for (clock, _) in &guard {
                clocks.insert(clock.clone());
            }
            let representative_child = *child_of.get(&(action.clone(), run[0])).unwrap();
            let target_words = tree.words_of(representative_child);
            let target_location = ControllerLocation(target_words);
            locations.insert(target_location.clone());

            transitions.push(TimedAutomaton::make_transition(
                location.clone(),
                action.clone(),
                guard,
                BTreeSet::new(),
                target_location,
            ));

            add_node_to_controller(
                tree,
                representative_child,
                k,
                visited,
                locations,
                clocks,
                alphabet,
                transitions,
            )?;
        }
    }

    Ok(())
}

/// Extract a controller timed automaton from a search tree whose root is labeled
/// [`NodeLabel::Top`]. Each location is the set of canonical words carried by the search node
/// it was extracted from, so that DAG sharing in the search tree is preserved in the output.
pub fn create_controller<Loc, ALoc, Act>(
    tree: &SearchTree<Loc, ALoc, Act>,
    k: u32,
) -> Result<TimedAutomaton<ControllerLocation<Loc, ALoc>, Act>, Error>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    if tree.root_label() != NodeLabel::Top {
        return Err(Error::InvalidTimedWord(
            "specification is not realizable: no controller exists".to_string(),
        ));
    }

    let root_location = ControllerLocation(tree.words_of(tree.root()));
    let mut locations = BTreeSet::new();
    locations.insert(root_location.clone());
    let mut clocks = BTreeSet::new();
    let mut alphabet = BTreeSet::new();
    let mut transitions = Vec::new();
    let mut visited = BTreeSet::new();

    add_node_to_controller(
        tree,
        tree.root(),
        k,
        &mut visited,
        &mut locations,
        &mut clocks,
        &mut alphabet,
        &mut transitions,
    )?;

    log::info!(
        "extracted controller with {} locations and {} transitions",
        locations.len(),
        transitions.len()
    );

    TimedAutomaton::new(locations, clocks, alphabet, root_location, BTreeSet::new(), transitions)
}

/// Rename every location of a controller to a fresh `q{n}` identifier, for serializing it
/// through [`crate::format::write_plant`], which only speaks `TimedAutomaton<String, String>`.
/// Locations are numbered in their [`ControllerLocation`]'s `Ord` order, so the numbering is
/// deterministic given the same controller.
pub fn stringify_controller<Loc, ALoc, Act>(
    controller: &TimedAutomaton<ControllerLocation<Loc, ALoc>, Act>,
) -> Result<TimedAutomaton<String, String>, Error>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    let names: BTreeMap<&ControllerLocation<Loc, ALoc>, String> = controller
        .locations()
        .iter()
        .enumerate()
        .map(|(i, location)| (location, format!("q{}", i)))
        .collect();

    let locations: BTreeSet<String> = names.values().cloned().collect();
    let clocks: BTreeSet<String> = controller.clocks().clone();
    let alphabet: BTreeSet<String> = controller.alphabet().iter().map(|a| a.to_string()).collect();
    let initial_location = names[controller.initial_location()].clone();
    let final_locations: BTreeSet<String> = controller
        .final_locations()
        .iter()
        .map(|l| names[l].clone())
        .collect();
    let transitions = controller
        .transitions()
        .iter()
        .map(|t| {
            TimedAutomaton::make_transition(
                names[t.source()].clone(),
                t.action().to_string(),
                t.guard().to_vec(),
                t.resets().clone(),
                names[t.target()].clone(),
            )
        })
        .collect();

    TimedAutomaton::new(locations, clocks, alphabet, initial_location, final_locations, transitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ata::{Ata, AtaFormula};
    use crate::clock::ComparisonOp;
    use crate::plant::TimedAutomaton as Ta;
    use std::collections::BTreeSet as Set;

    fn never_triggering_ata() -> Ata<String, String> {
        let alphabet: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        Ata::new(
            alphabet,
            "l0".to_string(),
            Set::new(),
            "sink".to_string(),
            vec![("l0".to_string(), "a".to_string(), AtaFormula::False)],
        )
    }

    fn trivial_plant() -> Ta<String, String> {
        let locations: Set<String> = ["s0"].iter().map(|s| s.to_string()).collect();
        let alphabet: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let transitions = vec![Ta::make_transition(
            "s0".to_string(),
            "a".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            Set::new(),
            "s0".to_string(),
        )];
        Ta::new(
            locations,
            Set::from(["x".to_string()]),
            alphabet,
            "s0".to_string(),
            Set::new(),
            transitions,
        )
        .unwrap()
    }

    #[test]
    fn refuses_extraction_from_unrealizable_root() {
        let plant = trivial_plant();
        let ata = never_triggering_ata();
        let controller: Set<String> = Set::new();
        let environment: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let tree = crate::search::SearchTree::new(plant, ata, controller, environment, 1, true).unwrap();
        // root has not been expanded/labeled yet: still Unlabeled, not Top.
        let err = create_controller(&tree, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidTimedWord(_)));
    }
}
