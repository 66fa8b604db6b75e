//! The timed plant under control: timed automata and the abstract `Plant` trait (C2).

use std::collections::{BTreeMap, BTreeSet};

use crate::clock::{ClockConstraint, ClockValue};
use crate::error::Error;

/// A single outgoing edge of a [`TimedAutomaton`].
#[derive(Debug, Clone)]
pub struct Transition<Loc, Act> {
    source: Loc,
    action: Act,
    guard: Vec<(String, ClockConstraint)>,
    resets: BTreeSet<String>,
    target: Loc,
}

impl<Loc, Act> Transition<Loc, Act> {
    /// The constraints that must hold for this transition to be enabled.
    pub fn guard(&self) -> &[(String, ClockConstraint)] {
        &self.guard
    }

    /// The clocks reset to zero when this transition is taken.
    pub fn resets(&self) -> &BTreeSet<String> {
        &self.resets
    }

    /// The action labeling this transition.
    pub fn action(&self) -> &Act {
        &self.action
    }

    /// The source location.
    pub fn source(&self) -> &Loc {
        &self.source
    }

    /// The target location.
    pub fn target(&self) -> &Loc {
        &self.target
    }
}

/// A concrete plant configuration: a location plus a valuation of every declared clock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Configuration<Loc> {
    /// The current location.
    pub location: Loc,
    /// The current value of every declared clock, keyed by clock name.
    pub clocks: BTreeMap<String, ClockValue>,
}

/// A timed automaton: locations, clocks, an action alphabet, and guarded, resetting
/// transitions between locations.
///
/// Construction validates referential integrity (every transition's source/target/clocks/
/// action must have been declared) and returns a structured [`Error`] rather than panicking,
/// mirroring how this crate's text-format loader reports malformed input.
#[derive(Debug, Clone)]
pub struct TimedAutomaton<Loc, Act> {
    locations: BTreeSet<Loc>,
    clocks: BTreeSet<String>,
    alphabet: BTreeSet<Act>,
    initial_location: Loc,
    final_locations: BTreeSet<Loc>,
    transitions: Vec<Transition<Loc, Act>>,
}

impl<Loc: Clone + Ord + std::fmt::Display, Act: Clone + Ord + std::fmt::Display>
    TimedAutomaton<Loc, Act>
{
    /// Construct a new timed automaton, validating every transition against the declared
    /// locations, clocks and alphabet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        locations: BTreeSet<Loc>,
        clocks: BTreeSet<String>,
        alphabet: BTreeSet<Act>,
        initial_location: Loc,
        final_locations: BTreeSet<Loc>,
        transitions: Vec<Transition<Loc, Act>>,
    ) -> Result<Self, Error> {
        if !locations.contains(&initial_location) {
            return Err(Error::UnknownLocation(initial_location.to_string()));
        }
        for final_location in &final_locations {
            if !locations.contains(final_location) {
                return Err(Error::UnknownLocation(final_location.to_string()));
            }
        }
        for t in &transitions {
            if !locations.contains(&t.source) {
                return Err(Error::UnknownLocation(t.source.to_string()));
            }
            if !locations.contains(&t.target) {
                return Err(Error::UnknownLocation(t.target.to_string()));
            }
            if !alphabet.contains(&t.action) {
                return Err(Error::UnknownAction(t.action.to_string()));
            }
            for (clock, _) in &t.guard {
                if !clocks.contains(clock) {
                    return Err(Error::UnknownClock(clock.clone()));
                }
            }
            for clock in &t.resets {
                if !clocks.contains(clock) {
                    return Err(Error::UnknownClock(clock.clone()));
                }
            }
        }
        log::debug!(
            "built timed automaton with {} locations, {} clocks, {} actions, {} transitions",
            locations.len(),
            clocks.len(),
            alphabet.len(),
            transitions.len()
        );
        Ok(Self {
            locations,
            clocks,
            alphabet,
            initial_location,
            final_locations,
            transitions,
        })
    }

    /// Construct a validated transition. Exposed so callers (the text-format parser) can
    /// build a `Vec<Transition<_, _>>` before calling [`TimedAutomaton::new`].
    pub fn make_transition(
        source: Loc,
        action: Act,
        guard: Vec<(String, ClockConstraint)>,
        resets: BTreeSet<String>,
        target: Loc,
    ) -> Transition<Loc, Act> {
        Transition {
            source,
            action,
            guard,
            resets,
            target,
        }
    }

    /// All declared locations.
    pub fn locations(&self) -> &BTreeSet<Loc> {
        &self.locations
    }

    /// All declared clocks.
    pub fn clocks(&self) -> &BTreeSet<String> {
        &self.clocks
    }

    /// The action alphabet.
    pub fn alphabet(&self) -> &BTreeSet<Act> {
        &self.alphabet
    }

    /// The initial location.
    pub fn initial_location(&self) -> &Loc {
        &self.initial_location
    }

    /// The accepting ("bad"/final) locations — reaching one of these means the plant has
    /// exhibited the behavior the controller must avoid.
    pub fn final_locations(&self) -> &BTreeSet<Loc> {
        &self.final_locations
    }

    /// All transitions.
    pub fn transitions(&self) -> &[Transition<Loc, Act>] {
        &self.transitions
    }

    /// The transitions enabled out of `location` on `action`.
    pub fn enabled_transitions(&self, location: &Loc, action: &Act) -> Vec<&Transition<Loc, Act>> {
        self.transitions
            .iter()
            .filter(|t| &t.source == location && &t.action == action)
            .collect()
    }

    /// The largest integer constant appearing in any guard, i.e. the `K` for the region
    /// abstraction over this automaton's clocks.
    pub fn largest_constant(&self) -> u32 {
        self.transitions
            .iter()
            .flat_map(|t| t.guard.iter())
            .map(|(_, c)| c.value().max(0) as u32)
            .max()
            .unwrap_or(0)
    }

    /// The initial configuration: the initial location with every clock at zero.
    pub fn initial_configuration(&self) -> Configuration<Loc> {
        Configuration {
            location: self.initial_location.clone(),
            clocks: self
                .clocks
                .iter()
                .map(|c| (c.clone(), ClockValue::from_integer(0)))
                .collect(),
        }
    }

    /// Whether `configuration` is in a final ("bad") location.
    pub fn is_accepting(&self, configuration: &Configuration<Loc>) -> bool {
        self.final_locations.contains(&configuration.location)
    }

    /// Advance `configuration` by `delta` time units on every clock.
    pub fn advance(&self, configuration: &Configuration<Loc>, delta: ClockValue) -> Configuration<Loc> {
        let mut clocks = configuration.clocks.clone();
        for v in clocks.values_mut() {
            *v += delta;
        }
        Configuration {
            location: configuration.location.clone(),
            clocks,
        }
    }

    /// Take the discrete `action` transition out of `configuration`, if any is enabled.
    /// Returns every `(target configuration)` reachable (multiple, if several transitions
    /// with the same action and satisfied guard exist), resetting clocks per the taken edge.
    pub fn make_symbol_step(&self, configuration: &Configuration<Loc>, action: &Act) -> Vec<Configuration<Loc>> {
        self.enabled_transitions(&configuration.location, action)
            .into_iter()
            .filter(|t| {
                t.guard
                    .iter()
                    .all(|(clock, constraint)| {
                        configuration
                            .clocks
                            .get(clock)
                            .map(|v| constraint.is_satisfied(*v))
                            .unwrap_or(false)
                    })
            })
            .map(|t| {
                let mut clocks = configuration.clocks.clone();
                for clock in &t.resets {
                    clocks.insert(clock.clone(), ClockValue::from_integer(0));
                }
                Configuration {
                    location: t.target.clone(),
                    clocks,
                }
            })
            .collect()
    }
}

/// A composite location: the pair of locations the two factor automata of a [`product`] are in.
/// A dedicated newtype rather than a bare tuple, since a blanket `Display` impl for `(L1, L2)`
/// would violate the orphan rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pair<L1, L2>(pub L1, pub L2);

impl<L1: std::fmt::Display, L2: std::fmt::Display> std::fmt::Display for Pair<L1, L2> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Compose two timed automata into their product, synchronizing on the given set of shared
/// actions and interleaving every other action. Clock and location sets are disjoint-unioned,
/// with locations renamed to `Pair(left, right)`.
pub fn product<L1, L2, Act>(
    a: &TimedAutomaton<L1, Act>,
    b: &TimedAutomaton<L2, Act>,
    synchronized_actions: &BTreeSet<Act>,
) -> Result<TimedAutomaton<Pair<L1, L2>, Act>, Error>
where
    L1: Clone + Ord + std::fmt::Display,
    L2: Clone + Ord + std::fmt::Display,
    Act: Clone + Ord + std::fmt::Display,
{
    let locations: BTreeSet<Pair<L1, L2>> = a
        .locations()
        .iter()
        .flat_map(|l1| b.locations().iter().map(move |l2| Pair(l1.clone(), l2.clone())))
        .collect();
    let clocks: BTreeSet<String> = a.clocks().union(b.clocks()).cloned().collect();
    let alphabet: BTreeSet<Act> = a.alphabet().union(b.alphabet()).cloned().collect();
    let initial_location = Pair(a.initial_location().clone(), b.initial_location().clone());
    let final_locations: BTreeSet<Pair<L1, L2>> = locations
        .iter()
        .filter(|Pair(l1, l2)| a.final_locations().contains(l1) || b.final_locations().contains(l2))
        .cloned()
        .collect();

    let mut transitions = Vec::new();
    for Pair(l1, l2) in &locations {
        for action in &alphabet {
            let synced = synchronized_actions.contains(action);
            let a_enabled = a.enabled_transitions(l1, action);
            let b_enabled = b.enabled_transitions(l2, action);
            if synced {
                for ta in &a_enabled {
                    for tb in &b_enabled {
                        transitions.push(TimedAutomaton::make_transition(
                            Pair(l1.clone(), l2.clone()),
                            action.clone(),
                            ta.guard()
                                .iter()
                                .chain(tb.guard())
                                .cloned()
                                .collect(),
                            ta.resets().union(tb.resets()).cloned().collect(),
                            Pair(ta.target().clone(), tb.target().clone()),
                        ));
                    }
                }
            } else {
                for ta in &a_enabled {
                    transitions.push(TimedAutomaton::make_transition(
                        Pair(l1.clone(), l2.clone()),
                        action.clone(),
                        ta.guard().to_vec(),
                        ta.resets().clone(),
                        Pair(ta.target().clone(), l2.clone()),
                    ));
                }
                for tb in &b_enabled {
                    transitions.push(TimedAutomaton::make_transition(
                        Pair(l1.clone(), l2.clone()),
                        action.clone(),
                        tb.guard().to_vec(),
                        tb.resets().clone(),
                        Pair(l1.clone(), tb.target().clone()),
                    ));
                }
            }
        }
    }

    log::debug!(
        "composed product automaton with {} locations and {} transitions from {} synchronized actions",
        locations.len(),
        transitions.len(),
        synchronized_actions.len()
    );

    TimedAutomaton::new(
        locations,
        clocks,
        alphabet,
        initial_location,
        final_locations,
        transitions,
    )
}
