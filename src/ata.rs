//! Alternating Timed Automata formulas and runs (C4).

use std::collections::BTreeSet;
use std::fmt;

use crate::clock::{ClockConstraint, ClockValue};
use crate::error::Error;

/// A location paired with the clock value it is evaluated at, as produced while
/// computing minimal models of an ATA formula.
pub type State<Loc> = (Loc, ClockValue);

/// An ATA transition-guard formula over locations of type `Loc`.
///
/// Modeled as a tagged enum with boxed recursive operands rather than the
/// virtual-dispatch class hierarchy of the original implementation, since a
/// closed sum type is the idiomatic Rust shape for a fixed AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtaFormula<Loc> {
    /// Always satisfied.
    True,
    /// Never satisfied.
    False,
    /// Satisfied by any configuration containing `(location, current clock value)`.
    Location(Loc),
    /// Satisfied iff the current clock value satisfies the constraint.
    Clock(ClockConstraint),
    /// Conjunction: both operands must be satisfied, by (possibly different) minimal models
    /// that are unioned together.
    Conjunction(Box<AtaFormula<Loc>>, Box<AtaFormula<Loc>>),
    /// Disjunction: either operand's minimal models suffice.
    Disjunction(Box<AtaFormula<Loc>>, Box<AtaFormula<Loc>>),
    /// Evaluate the subformula with the clock reset to zero.
    ResetClock(Box<AtaFormula<Loc>>),
}

impl<Loc: Clone + Ord> AtaFormula<Loc> {
    /// Whether this formula is satisfied by a single-clock-value configuration, where
    /// `clock_value` is the current clock value and `locations` is the set of locations
    /// currently "present" (used when checking [`State`] membership for `Location`).
    pub fn is_satisfied(&self, locations: &BTreeSet<Loc>, clock_value: ClockValue) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Location(l) => locations.contains(l),
            Self::Clock(c) => c.is_satisfied(clock_value),
            Self::Conjunction(l, r) => {
                l.is_satisfied(locations, clock_value) && r.is_satisfied(locations, clock_value)
            }
            Self::Disjunction(l, r) => {
                l.is_satisfied(locations, clock_value) || r.is_satisfied(locations, clock_value)
            }
            Self::ResetClock(f) => f.is_satisfied(locations, ClockValue::from_integer(0)),
        }
    }

    /// The minimal sets of `State<Loc>` that satisfy this formula at the given clock value:
    /// the disjunction of conjunctions forming the formula's DNF over atomic `Location`/`Clock`
    /// constraints, each inner set being one alternative "minimal model".
    pub fn minimal_models(&self, clock_value: ClockValue) -> Vec<BTreeSet<State<Loc>>> {
        match self {
            Self::True => vec![BTreeSet::new()],
            Self::False => vec![],
            Self::Location(l) => {
                let mut s = BTreeSet::new();
                s.insert((l.clone(), clock_value));
                vec![s]
            }
            Self::Clock(c) => {
                if c.is_satisfied(clock_value) {
                    vec![BTreeSet::new()]
                } else {
                    vec![]
                }
            }
            Self::Conjunction(l, r) => {
                let left = l.minimal_models(clock_value);
                let right = r.minimal_models(clock_value);
                let mut out = Vec::with_capacity(left.len() * right.len());
                for a in &left {
                    for b in &right {
                        let mut combined = a.clone();
                        combined.extend(b.iter().cloned());
                        out.push(combined);
                    }
                }
                out
            }
            Self::Disjunction(l, r) => {
                let mut out = l.minimal_models(clock_value);
                out.extend(r.minimal_models(clock_value));
                out
            }
            Self::ResetClock(f) => f.minimal_models(ClockValue::from_integer(0)),
        }
    }
}

impl<Loc: fmt::Display> fmt::Display for AtaFormula<Loc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Location(l) => write!(f, "{}", l),
            Self::Clock(c) => write!(f, "x {}", c),
            Self::Conjunction(l, r) => write!(f, "({} && {})", l, r),
            Self::Disjunction(l, r) => write!(f, "({} || {})", l, r),
            Self::ResetClock(phi) => write!(f, "{}.reset()", phi),
        }
    }
}

/// An alternating timed automaton with a single clock, over locations of type `Loc` and
/// an alphabet of symbols `Sym`.
#[derive(Debug, Clone)]
pub struct Ata<Loc, Sym> {
    alphabet: BTreeSet<Sym>,
    initial_location: Loc,
    accepting_locations: BTreeSet<Loc>,
    sink_location: Loc,
    transitions: Vec<(Loc, Sym, AtaFormula<Loc>)>,
}

impl<Loc: Clone + Ord, Sym: Clone + Ord> Ata<Loc, Sym> {
    /// Construct a new ATA from its components.
    pub fn new(
        alphabet: BTreeSet<Sym>,
        initial_location: Loc,
        accepting_locations: BTreeSet<Loc>,
        sink_location: Loc,
        transitions: Vec<(Loc, Sym, AtaFormula<Loc>)>,
    ) -> Self {
        Self {
            alphabet,
            initial_location,
            accepting_locations,
            sink_location,
            transitions,
        }
    }

    /// The automaton's alphabet.
    pub fn alphabet(&self) -> &BTreeSet<Sym> {
        &self.alphabet
    }

    /// The reserved initial location (named `l0` in the translation).
    pub fn initial_location(&self) -> &Loc {
        &self.initial_location
    }

    /// The locations whose presence in a final configuration is acceptable.
    pub fn accepting_locations(&self) -> &BTreeSet<Loc> {
        &self.accepting_locations
    }

    /// The reserved sink location, used by the translator for vacuously-false transitions.
    pub fn sink_location(&self) -> &Loc {
        &self.sink_location
    }

    /// Find the transition formula for `(location, symbol)`, if declared.
    pub fn transition(&self, location: &Loc, symbol: &Sym) -> Option<&AtaFormula<Loc>> {
        self.transitions
            .iter()
            .find(|(l, s, _)| l == location && s == symbol)
            .map(|(_, _, f)| f)
    }

    /// All declared transitions.
    pub fn transitions(&self) -> &[(Loc, Sym, AtaFormula<Loc>)] {
        &self.transitions
    }

    /// Apply a single symbol step: for each `(location, clock_value)` in the current
    /// configuration, look up its transition for `symbol` and take the union of a chosen
    /// minimal model (one alternative per source state; callers enumerate all combinations).
    ///
    /// Returns the per-state minimal-model alternatives; `crate::canonical` and `crate::successor`
    /// combine these across all current states to form the full successor configurations.
    pub fn symbol_step_alternatives(
        &self,
        configuration: &BTreeSet<State<Loc>>,
        symbol: &Sym,
    ) -> Vec<Vec<BTreeSet<State<Loc>>>> {
        configuration
            .iter()
            .map(|(location, clock_value)| {
                match self.transition(location, symbol) {
                    Some(formula) => formula.minimal_models(*clock_value),
                    None => vec![], // no transition: this symbol is not accepted from here
                }
            })
            .collect()
    }

    /// Whether a configuration is accepting: empty, or containing only accepting locations.
    pub fn is_accepting_configuration(&self, configuration: &BTreeSet<State<Loc>>) -> bool {
        configuration
            .iter()
            .all(|(l, _)| self.accepting_locations.contains(l))
    }

    /// Step the automaton's initial configuration through a concrete run, validating the run's
    /// structural invariants along the way: time deltas must be non-negative, no two symbol
    /// events may occur back to back without an intervening time step, and time may not elapse
    /// once the run has become empty (exhausted).
    ///
    /// Each symbol event follows the first minimal model offered to every state in the current
    /// configuration; this is a single witness run, not the full branching structure (callers
    /// wanting every alternative should use [`Self::symbol_step_alternatives`] directly, as the
    /// search engine does).
    pub fn run(&self, events: &[RunEvent<Sym>]) -> Result<BTreeSet<State<Loc>>, Error> {
        let mut configuration: BTreeSet<State<Loc>> =
            BTreeSet::from([(self.initial_location.clone(), ClockValue::from_integer(0))]);
        let mut last_was_symbol = false;
        for event in events {
            match event {
                RunEvent::Time(delta) => {
                    if *delta < ClockValue::from_integer(0) {
                        return Err(Error::InvalidTimedWord(
                            "time delta must not be negative".to_string(),
                        ));
                    }
                    if configuration.is_empty() {
                        return Err(Error::AtaTransitionViolation(
                            "time step taken on an exhausted run".to_string(),
                        ));
                    }
                    configuration = configuration.into_iter().map(|(l, v)| (l, v + *delta)).collect();
                    last_was_symbol = false;
                }
                RunEvent::Symbol(symbol) => {
                    if last_was_symbol {
                        return Err(Error::AtaTransitionViolation(
                            "two consecutive symbol steps without an intervening time step"
                                .to_string(),
                        ));
                    }
                    let alternatives = self.symbol_step_alternatives(&configuration, symbol);
                    configuration = if alternatives.iter().any(|alts| alts.is_empty()) {
                        BTreeSet::new()
                    } else {
                        alternatives.into_iter().filter_map(|alts| alts.into_iter().next()).flatten().collect()
                    };
                    last_was_symbol = true;
                }
            }
        }
        Ok(configuration)
    }
}

/// A single event in a concrete run through an [`Ata`]: either a non-negative elapse of time,
/// or a read symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent<Sym> {
    /// Let `ClockValue` time units elapse.
    Time(ClockValue),
    /// Read a symbol.
    Symbol(Sym),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ComparisonOp, ClockConstraint};

    #[test]
    fn true_formula_has_empty_model() {
        let phi: AtaFormula<String> = AtaFormula::True;
        let models = phi.minimal_models(ClockValue::from_integer(0));
        assert_eq!(models, vec![BTreeSet::new()]);
    }

    #[test]
    fn false_formula_has_no_model() {
        let phi: AtaFormula<String> = AtaFormula::False;
        assert!(phi.minimal_models(ClockValue::from_integer(0)).is_empty());
    }

    #[test]
    fn disjunction_offers_both_alternatives() {
        let phi = AtaFormula::Disjunction(
            Box::new(AtaFormula::Location("p".to_string())),
            Box::new(AtaFormula::Location("q".to_string())),
        );
        let models = phi.minimal_models(ClockValue::from_integer(0));
        assert_eq!(models.len(), 2);
    }

    #[test]
    fn conjunction_unions_models() {
        let phi = AtaFormula::Conjunction(
            Box::new(AtaFormula::Location("p".to_string())),
            Box::new(AtaFormula::Location("q".to_string())),
        );
        let models = phi.minimal_models(ClockValue::from_integer(0));
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].len(), 2);
    }

    #[test]
    fn reset_clock_evaluates_at_zero() {
        let phi = AtaFormula::ResetClock(Box::new(AtaFormula::Clock(ClockConstraint::new(
            ComparisonOp::Eq,
            0,
        ))));
        let models = phi.minimal_models(ClockValue::from_integer(5));
        assert_eq!(models, vec![BTreeSet::new()]);
    }

    fn always_true_ata() -> Ata<String, String> {
        let alphabet: BTreeSet<String> = ["a"].iter().map(|s| s.to_string()).collect();
        Ata::new(
            alphabet,
            "l0".to_string(),
            BTreeSet::new(),
            "sink".to_string(),
            vec![("l0".to_string(), "a".to_string(), AtaFormula::ResetClock(Box::new(AtaFormula::Location("l0".to_string()))))],
        )
    }

    #[test]
    fn run_rejects_two_consecutive_symbol_steps() {
        let ata = always_true_ata();
        let events = vec![RunEvent::Symbol("a".to_string()), RunEvent::Symbol("a".to_string())];
        let err = ata.run(&events).unwrap_err();
        assert!(matches!(err, Error::AtaTransitionViolation(_)));
    }

    #[test]
    fn run_rejects_time_step_on_exhausted_run() {
        let never_triggering = Ata::new(
            ["a"].iter().map(|s| s.to_string()).collect::<BTreeSet<String>>(),
            "l0".to_string(),
            BTreeSet::new(),
            "sink".to_string(),
            vec![("l0".to_string(), "a".to_string(), AtaFormula::False)],
        );
        let events = vec![RunEvent::Symbol("a".to_string()), RunEvent::Time(ClockValue::from_integer(1))];
        let err = never_triggering.run(&events).unwrap_err();
        assert!(matches!(err, Error::AtaTransitionViolation(_)));
    }

    #[test]
    fn run_accepts_alternating_time_and_symbol_steps() {
        let ata = always_true_ata();
        let events = vec![
            RunEvent::Time(ClockValue::from_integer(1)),
            RunEvent::Symbol("a".to_string()),
            RunEvent::Time(ClockValue::from_integer(2)),
        ];
        assert!(ata.run(&events).is_ok());
    }

    #[test]
    fn run_rejects_negative_time_delta() {
        let ata = always_true_ata();
        let events = vec![RunEvent::Time(ClockValue::new(-1, 1))];
        let err = ata.run(&events).unwrap_err();
        assert!(matches!(err, Error::InvalidTimedWord(_)));
    }
}
