//! The successor generator (C7): advances a canonical word by one discrete action, combining
//! the plant's concrete transition relation with the ATA's alternating symbol step.

use std::collections::BTreeSet;
use std::fmt;

use crate::ata::{Ata, State};
use crate::canonical::{get_candidate, get_canonical_word, get_time_successors, CanonicalWord};
use crate::error::Error;
use crate::plant::{Configuration, TimedAutomaton};

fn cartesian_product<ALoc: Clone + Ord>(
    alternatives: &[Vec<BTreeSet<State<ALoc>>>],
) -> Vec<BTreeSet<State<ALoc>>> {
    let mut acc = vec![BTreeSet::new()];
    for alts in alternatives {
        let mut next = Vec::with_capacity(acc.len() * alts.len().max(1));
        for partial in &acc {
            for model in alts {
                let mut combined = partial.clone();
                combined.extend(model.iter().cloned());
                next.push(combined);
            }
        }
        acc = next;
    }
    acc
}

/// Compute every canonical word reachable from `word` by taking `symbol`, combining every
/// enabled plant transition with every alternating-automaton minimal model.
///
/// Returns an empty set (not an error) if `symbol` is not enabled from `word`'s candidate
/// configuration, either because the plant has no matching transition or because some current
/// ATA state has no transition on `symbol`.
pub fn get_next_canonical_words<Loc, ALoc, Act>(
    plant: &TimedAutomaton<Loc, Act>,
    ata: &Ata<ALoc, Act>,
    word: &CanonicalWord<Loc, ALoc>,
    symbol: &Act,
    k: u32,
) -> Result<BTreeSet<CanonicalWord<Loc, ALoc>>, Error>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    let (plant_location, clocks, ata_config) = get_candidate(word);
    let location = match plant_location {
        Some(l) => l,
        None => return Ok(BTreeSet::new()),
    };
    let configuration = Configuration { location, clocks };

    let plant_successors = plant.make_symbol_step(&configuration, symbol);
    if plant_successors.is_empty() {
        return Ok(BTreeSet::new());
    }

    let alternatives = ata.symbol_step_alternatives(&ata_config, symbol);
    if alternatives.iter().any(|alts| alts.is_empty()) {
        return Ok(BTreeSet::new());
    }
    let ata_combinations = cartesian_product(&alternatives);

    let mut out = BTreeSet::new();
    for plant_successor in &plant_successors {
        for ata_successor in &ata_combinations {
            out.insert(get_canonical_word(plant_successor, ata_successor, k)?);
        }
    }
    Ok(out)
}

/// One outgoing edge of the successor relation: the number of time-successor steps taken
/// before `symbol` was read, the symbol itself, and the resulting word.
#[derive(Debug, Clone)]
pub struct SuccessorEdge<Loc, ALoc, Act> {
    /// How many region-successor steps were taken from `word` before this edge's action.
    pub time_increment: u32,
    /// The action labeling this edge.
    pub action: Act,
    /// The resulting canonical word.
    pub word: CanonicalWord<Loc, ALoc>,
}

/// Enumerate every successor edge of `word`: for each time-successor in its orbit (including
/// zero elapsed time) and every action in the plant's alphabet, every canonical word reachable
/// by taking that action.
pub fn enumerate_successors<Loc, ALoc, Act>(
    plant: &TimedAutomaton<Loc, Act>,
    ata: &Ata<ALoc, Act>,
    word: &CanonicalWord<Loc, ALoc>,
    k: u32,
) -> Result<Vec<SuccessorEdge<Loc, ALoc, Act>>, Error>
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord,
{
    let time_successors = get_time_successors(word, k)?;
    let mut edges = Vec::new();
    for (increment, successor_word) in &time_successors {
        for action in plant.alphabet() {
            for next_word in get_next_canonical_words(plant, ata, successor_word, action, k)? {
                edges.push(SuccessorEdge {
                    time_increment: *increment,
                    action: action.clone(),
                    word: next_word,
                });
            }
        }
    }
    Ok(edges)
}
