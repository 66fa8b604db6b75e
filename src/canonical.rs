//! Canonical AB-words: the region-abstracted representation of a joint plant/ATA
//! configuration that the search engine operates over (C6).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::clock::{region_index, ClockValue, RegionIndex};
use crate::error::Error;
use crate::plant::Configuration;

/// A plant clock's region-abstracted value, tagged with the location it was observed in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlantRegionState<Loc> {
    /// The plant's current location.
    pub location: Loc,
    /// The clock this entry describes.
    pub clock: String,
    /// The clock's region index.
    pub region_index: RegionIndex,
}

/// An ATA state's region-abstracted value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtaRegionState<ALoc> {
    /// The ATA location this entry describes.
    pub location: ALoc,
    /// The (single, implicit) ATA clock's region index.
    pub region_index: RegionIndex,
}

/// A single symbol of a canonical word: either a plant clock or an ATA state, both
/// region-abstracted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AbRegionSymbol<Loc, ALoc> {
    /// A plant clock entry.
    Plant(PlantRegionState<Loc>),
    /// An ATA state entry.
    Ata(AtaRegionState<ALoc>),
}

impl<Loc, ALoc> AbRegionSymbol<Loc, ALoc> {
    /// The region index carried by this symbol, regardless of which variant it is.
    pub fn region_index(&self) -> RegionIndex {
        match self {
            Self::Plant(p) => p.region_index,
            Self::Ata(a) => a.region_index,
        }
    }
}

impl<Loc: Clone, ALoc: Clone> AbRegionSymbol<Loc, ALoc> {
    fn with_region_index(&self, index: RegionIndex) -> Self {
        match self {
            Self::Plant(p) => Self::Plant(PlantRegionState {
                location: p.location.clone(),
                clock: p.clock.clone(),
                region_index: index,
            }),
            Self::Ata(a) => Self::Ata(AtaRegionState {
                location: a.location.clone(),
                region_index: index,
            }),
        }
    }
}

impl<Loc: fmt::Display, ALoc: fmt::Display> fmt::Display for AbRegionSymbol<Loc, ALoc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plant(p) => write!(f, "({}, {}, {})", p.location, p.clock, p.region_index),
            Self::Ata(a) => write!(f, "({}, {})", a.location, a.region_index),
        }
    }
}

/// A canonical AB-word: an ordered sequence of non-empty "partitions", each a set of
/// region-abstracted symbols that share the same fractional clock value.
pub type CanonicalWord<Loc, ALoc> = Vec<BTreeSet<AbRegionSymbol<Loc, ALoc>>>;

fn fractional_part(v: ClockValue) -> ClockValue {
    v - v.floor()
}

/// Compute the canonical word of a joint plant configuration and ATA configuration.
pub fn get_canonical_word<Loc: Clone + Ord, ALoc: Clone + Ord>(
    plant: &Configuration<Loc>,
    ata_configuration: &BTreeSet<(ALoc, ClockValue)>,
    k: u32,
) -> Result<CanonicalWord<Loc, ALoc>, Error> {
    let mut entries: Vec<(ClockValue, AbRegionSymbol<Loc, ALoc>)> = Vec::new();
    for (clock, value) in &plant.clocks {
        entries.push((
            fractional_part(*value),
            AbRegionSymbol::Plant(PlantRegionState {
                location: plant.location.clone(),
                clock: clock.clone(),
                region_index: region_index(*value, k),
            }),
        ));
    }
    for (location, value) in ata_configuration {
        entries.push((
            fractional_part(*value),
            AbRegionSymbol::Ata(AtaRegionState {
                location: location.clone(),
                region_index: region_index(*value, k),
            }),
        ));
    }

    let mut fracs: Vec<ClockValue> = entries.iter().map(|(f, _)| *f).collect();
    fracs.sort();
    fracs.dedup();

    let word: CanonicalWord<Loc, ALoc> = fracs
        .into_iter()
        .map(|f| entries.iter().filter(|(ff, _)| *ff == f).map(|(_, s)| s.clone()).collect())
        .collect();

    is_valid_canonical_word(&word)?;
    Ok(word)
}

/// Validate the structural invariants of a canonical word: non-empty, every partition
/// non-empty and single-parity, and at most one even (integral) partition, which if present
/// must be the first.
pub fn is_valid_canonical_word<Loc, ALoc>(word: &CanonicalWord<Loc, ALoc>) -> Result<(), Error> {
    if word.is_empty() {
        return Err(Error::InvalidCanonicalWord("word has no partitions".to_string()));
    }
    for (i, partition) in word.iter().enumerate() {
        if partition.is_empty() {
            return Err(Error::InvalidCanonicalWord(format!("partition {} is empty", i)));
        }
        let mut indices = partition.iter().map(|s| s.region_index());
        let first = indices.next().unwrap();
        let parity = first % 2;
        if indices.any(|idx| idx % 2 != parity) {
            return Err(Error::InvalidCanonicalWord(format!(
                "partition {} mixes integral and fractional region indices",
                i
            )));
        }
        if i > 0 && parity == 0 {
            return Err(Error::InvalidCanonicalWord(
                "only the first partition may hold integral region indices".to_string(),
            ));
        }
    }
    Ok(())
}

/// Reconstruct a representative concrete configuration from a canonical word: a plant
/// location and clock valuation, and an ATA configuration.
#[allow(clippy::type_complexity)]
pub fn get_candidate<Loc: Clone + Ord, ALoc: Clone + Ord>(
    word: &CanonicalWord<Loc, ALoc>,
) -> (Option<Loc>, BTreeMap<String, ClockValue>, BTreeSet<(ALoc, ClockValue)>) {
    let time_delta = ClockValue::new(1, word.len() as i64 + 1);
    let mut plant_location = None;
    let mut clocks = BTreeMap::new();
    let mut ata = BTreeSet::new();
    for (i, partition) in word.iter().enumerate() {
        for symbol in partition {
            let idx = symbol.region_index();
            let fractional = if idx % 2 == 0 {
                ClockValue::from_integer(0)
            } else {
                time_delta * ClockValue::from_integer(i as i64 + 1)
            };
            let integral = ClockValue::from_integer((idx / 2) as i64);
            let value = integral + fractional;
            match symbol {
                AbRegionSymbol::Plant(p) => {
                    plant_location = Some(p.location.clone());
                    clocks.insert(p.clock.clone(), value);
                }
                AbRegionSymbol::Ata(a) => {
                    ata.insert((a.location.clone(), value));
                }
            }
        }
    }
    (plant_location, clocks, ata)
}

fn increment_partition<Loc: Clone + Ord, ALoc: Clone + Ord>(
    partition: &BTreeSet<AbRegionSymbol<Loc, ALoc>>,
    max_region_index: RegionIndex,
) -> (BTreeSet<AbRegionSymbol<Loc, ALoc>>, BTreeSet<AbRegionSymbol<Loc, ALoc>>) {
    let mut rest = BTreeSet::new();
    let mut overflow = BTreeSet::new();
    for symbol in partition {
        let idx = symbol.region_index();
        let next = if idx >= max_region_index { max_region_index } else { idx + 1 };
        let updated = symbol.with_region_index(next);
        if next == max_region_index {
            overflow.insert(updated);
        } else {
            rest.insert(updated);
        }
    }
    (rest, overflow)
}

/// Compute the canonical word's unique time-successor: the word obtained by letting time
/// elapse until the next region boundary is crossed, for a clock domain bounded by `k`.
///
/// Follows the original region-successor construction precisely: the last (innermost)
/// non-saturated partition is incremented, its overflow and any incremented first partition
/// are folded into the saturated partition, and the untouched middle partitions are
/// reinserted in their original order.
pub fn get_time_successor<Loc: Clone + Ord, ALoc: Clone + Ord>(
    word: &CanonicalWord<Loc, ALoc>,
    k: u32,
) -> Result<CanonicalWord<Loc, ALoc>, Error> {
    if word.is_empty() {
        return Ok(word.clone());
    }
    let max_region_index = 2 * k + 1;
    let n = word.len();
    let last = &word[n - 1];
    let last_is_saturated = last.iter().all(|s| s.region_index() == max_region_index);

    let (mut new_maxed_partition, last_nonmaxed_idx) = if last_is_saturated {
        (last.clone(), if n >= 2 { Some(n - 2) } else { None })
    } else {
        (BTreeSet::new(), Some(n - 1))
    };

    let last_nonmaxed_idx = match last_nonmaxed_idx {
        Some(idx) => idx,
        None => return Ok(word.clone()),
    };

    let mut res: CanonicalWord<Loc, ALoc> = Vec::with_capacity(n + 1);

    let (incremented_rest, overflow) = increment_partition(&word[last_nonmaxed_idx], max_region_index);
    new_maxed_partition.extend(overflow);
    if !incremented_rest.is_empty() {
        res.push(incremented_rest);
    }

    if last_nonmaxed_idx > 0 {
        let first = &word[0];
        let first_is_integral = first.iter().all(|s| s.region_index() % 2 == 0);
        if first_is_integral {
            let (first_rest, first_overflow) = increment_partition(first, max_region_index);
            new_maxed_partition.extend(first_overflow);
            if !first_rest.is_empty() {
                res.push(first_rest);
            }
        } else {
            res.push(first.clone());
        }
        for i in 1..last_nonmaxed_idx {
            res.push(word[i].clone());
        }
    }

    if !new_maxed_partition.is_empty() {
        res.push(new_maxed_partition);
    }

    is_valid_canonical_word(&res)?;
    Ok(res)
}

/// Apply [`get_time_successor`] `n` times.
pub fn get_nth_time_successor<Loc: Clone + Ord, ALoc: Clone + Ord>(
    word: &CanonicalWord<Loc, ALoc>,
    n: u32,
    k: u32,
) -> Result<CanonicalWord<Loc, ALoc>, Error> {
    let mut cur = word.clone();
    for _ in 0..n {
        cur = get_time_successor(&cur, k)?;
    }
    Ok(cur)
}

/// Enumerate every distinct time-successor of `word`, starting from `word` itself (at
/// increment 0) and continuing until a fixed point is reached (all further clocks saturated).
pub fn get_time_successors<Loc: Clone + Ord, ALoc: Clone + Ord>(
    word: &CanonicalWord<Loc, ALoc>,
    k: u32,
) -> Result<Vec<(u32, CanonicalWord<Loc, ALoc>)>, Error> {
    let mut out = vec![(0, word.clone())];
    loop {
        let (last_increment, last_word) = out.last().unwrap().clone();
        let next = get_time_successor(&last_word, k)?;
        if next == last_word {
            break;
        }
        out.push((last_increment + 1, next));
    }
    Ok(out)
}

/// Project a canonical word onto its plant-only component, dropping ATA states. Used by the
/// search engine to group DAG nodes whose plant-region abstraction coincides.
pub fn plant_projection<Loc: Clone + Ord, ALoc: Ord>(
    word: &CanonicalWord<Loc, ALoc>,
) -> Vec<BTreeSet<PlantRegionState<Loc>>> {
    word.iter()
        .filter_map(|partition| {
            let projected: BTreeSet<PlantRegionState<Loc>> = partition
                .iter()
                .filter_map(|s| match s {
                    AbRegionSymbol::Plant(p) => Some(p.clone()),
                    AbRegionSymbol::Ata(_) => None,
                })
                .collect();
            if projected.is_empty() {
                None
            } else {
                Some(projected)
            }
        })
        .collect()
}

/// Whether `w1` monotonically dominates `w2`: every partition of `w1` embeds, in order, as a
/// subset of some partition of `w2`. Used only by [`is_monotonically_dominated_set`], which is
/// disabled by default (see the search engine's `dominates_ancestor`).
pub fn is_monotonically_dominated<Loc: Ord, ALoc: Ord>(
    w1: &CanonicalWord<Loc, ALoc>,
    w2: &CanonicalWord<Loc, ALoc>,
) -> bool {
    if w1.len() > w2.len() {
        return false;
    }
    let mut j = 0;
    for p1 in w1 {
        let mut found = false;
        while j < w2.len() {
            let candidate_matches = p1.is_subset(&w2[j]);
            j += 1;
            if candidate_matches {
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
    }
    true
}

/// Whether word-set `s1` monotonically dominates word-set `s2`: every word in `s2` has some
/// dominating word in `s1`.
pub fn is_monotonically_dominated_set<Loc: Ord + Clone, ALoc: Ord + Clone>(
    s1: &BTreeSet<CanonicalWord<Loc, ALoc>>,
    s2: &BTreeSet<CanonicalWord<Loc, ALoc>>,
) -> bool {
    s2.iter()
        .all(|w2| s1.iter().any(|w1| is_monotonically_dominated(w1, w2)))
}

/// Whether the current node's word-set is dominated by one of its ancestors. Disabled by
/// default: the original implementation stubs this to always return `false`, and this crate
/// keeps the hook for experimentation without relying on it for correctness.
pub fn dominates_ancestor<Loc, ALoc>(
    _current: &BTreeSet<CanonicalWord<Loc, ALoc>>,
    _ancestors: &[BTreeSet<CanonicalWord<Loc, ALoc>>],
) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant_config(location: &str, clocks: &[(&str, i64, i64)]) -> Configuration<String> {
        Configuration {
            location: location.to_string(),
            clocks: clocks
                .iter()
                .map(|(name, num, den)| (name.to_string(), ClockValue::new(*num, *den)))
                .collect(),
        }
    }

    #[test]
    fn canonical_word_partitions_by_fractional_part() {
        let config = plant_config("s0", &[("x", 1, 1), ("y", 3, 2)]);
        let word = get_canonical_word::<String, String>(&config, &BTreeSet::new(), 3).unwrap();
        assert_eq!(word.len(), 2);
        assert_eq!(word[0].len(), 1); // x = 1 (integral)
        assert_eq!(word[1].len(), 1); // y = 1.5 (fractional)
    }

    #[test]
    fn invalid_word_rejected() {
        let mixed: CanonicalWord<String, String> = vec![BTreeSet::from([
            AbRegionSymbol::Plant(PlantRegionState {
                location: "s0".to_string(),
                clock: "x".to_string(),
                region_index: 2,
            }),
            AbRegionSymbol::Plant(PlantRegionState {
                location: "s0".to_string(),
                clock: "y".to_string(),
                region_index: 3,
            }),
        ])];
        assert!(is_valid_canonical_word(&mixed).is_err());
    }

    #[test]
    fn time_successor_is_idempotent_at_fixed_point() {
        let config = plant_config("s0", &[("x", 7, 1)]); // saturated for K=3
        let word = get_canonical_word::<String, String>(&config, &BTreeSet::new(), 3).unwrap();
        let successor = get_time_successor(&word, 3).unwrap();
        assert_eq!(successor, word);
    }

    #[test]
    fn time_successor_preserves_middle_partition_order_across_region_boundary() {
        // P0 = x (integral, 2.0), P1 = y (0.2), P2 = z (1.4), P3 = u (2.6, last, non-saturated
        // for K=3). Crossing the region boundary increments P3 (and folds P0's carry), leaving
        // P1 and P2 untouched in the middle; they must keep their original ascending order.
        let config = plant_config("s0", &[("x", 2, 1), ("y", 1, 5), ("z", 7, 5), ("u", 13, 5)]);
        let word = get_canonical_word::<String, String>(&config, &BTreeSet::new(), 3).unwrap();
        assert_eq!(word.len(), 4);
        let successor = get_time_successor(&word, 3).unwrap();

        let position_of = |clock: &str| {
            successor
                .iter()
                .position(|partition| {
                    partition
                        .iter()
                        .any(|s| matches!(s, AbRegionSymbol::Plant(p) if p.clock == clock))
                })
                .unwrap()
        };
        assert!(position_of("y") < position_of("z"));
    }

    #[test]
    fn time_successor_advances_fractional_region() {
        let config = plant_config("s0", &[("x", 1, 2)]); // 0.5, region 1 for K=3
        let word = get_canonical_word::<String, String>(&config, &BTreeSet::new(), 3).unwrap();
        let successor = get_time_successor(&word, 3).unwrap();
        // next region after (0,1) is the integer point 1, i.e. region index 2
        let indices: Vec<RegionIndex> = successor
            .iter()
            .flat_map(|p| p.iter().map(|s| s.region_index()))
            .collect();
        assert_eq!(indices, vec![2]);
    }

    #[test]
    fn candidate_round_trips_integral_region() {
        let config = plant_config("s0", &[("x", 2, 1)]);
        let word = get_canonical_word::<String, String>(&config, &BTreeSet::new(), 3).unwrap();
        let (location, clocks, _) = get_candidate(&word);
        assert_eq!(location, Some("s0".to_string()));
        assert_eq!(clocks["x"], ClockValue::from_integer(2));
    }

    #[test]
    fn monotonic_domination_disabled_by_default() {
        let s1: BTreeSet<CanonicalWord<String, String>> = BTreeSet::new();
        let s2: BTreeSet<CanonicalWord<String, String>> = BTreeSet::new();
        assert!(!dominates_ancestor(&s1, &[s2]));
    }

    #[test]
    fn plant_projection_drops_ata_states() {
        let word: CanonicalWord<String, String> = vec![BTreeSet::from([
            AbRegionSymbol::Plant(PlantRegionState {
                location: "s0".to_string(),
                clock: "x".to_string(),
                region_index: 0,
            }),
            AbRegionSymbol::Ata(AtaRegionState {
                location: "l0".to_string(),
                region_index: 0,
            }),
        ])];
        let projected = plant_projection(&word);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].len(), 1);
    }
}
