//! Translation of MTL formulas into alternating timed automata (C5), following
//! Ouaknine & Worrell's construction.

use std::collections::BTreeSet;
use std::ops::Bound;

use crate::ata::{Ata, AtaFormula};
use crate::clock::{ClockConstraint, ComparisonOp};
use crate::error::Error;
use crate::mtl::{Interval, MtlFormula};

/// The reserved initial location of every translated ATA.
pub const INITIAL_LOCATION: &str = "l0";
/// The reserved sink location of every translated ATA.
pub const SINK_LOCATION: &str = "sink";

/// A location of the translated ATA: either the reserved initial/sink locations, or a
/// until/dual-until subformula of the source MTL formula (rendered via `Display`).
pub type AtaLocation = String;

fn create_contains(interval: &Interval) -> AtaFormula<AtaLocation> {
    let lower = match interval.lower() {
        Bound::Included(v) => AtaFormula::Clock(ClockConstraint::new(
            ComparisonOp::GreaterEq,
            v.to_integer(),
        )),
        Bound::Excluded(v) => {
            AtaFormula::Clock(ClockConstraint::new(ComparisonOp::Greater, v.to_integer()))
        }
        Bound::Unbounded => AtaFormula::True,
    };
    let upper = match interval.upper() {
        Bound::Included(v) => {
            AtaFormula::Clock(ClockConstraint::new(ComparisonOp::LessEq, v.to_integer()))
        }
        Bound::Excluded(v) => {
            AtaFormula::Clock(ClockConstraint::new(ComparisonOp::Less, v.to_integer()))
        }
        Bound::Unbounded => AtaFormula::True,
    };
    AtaFormula::Conjunction(Box::new(lower), Box::new(upper))
}

fn create_negated_contains(interval: &Interval) -> AtaFormula<AtaLocation> {
    let lower = match interval.lower() {
        Bound::Included(v) => {
            AtaFormula::Clock(ClockConstraint::new(ComparisonOp::Less, v.to_integer()))
        }
        Bound::Excluded(v) => AtaFormula::Clock(ClockConstraint::new(
            ComparisonOp::LessEq,
            v.to_integer(),
        )),
        Bound::Unbounded => AtaFormula::False,
    };
    let upper = match interval.upper() {
        Bound::Included(v) => {
            AtaFormula::Clock(ClockConstraint::new(ComparisonOp::Greater, v.to_integer()))
        }
        Bound::Excluded(v) => AtaFormula::Clock(ClockConstraint::new(
            ComparisonOp::GreaterEq,
            v.to_integer(),
        )),
        Bound::Unbounded => AtaFormula::False,
    };
    AtaFormula::Disjunction(Box::new(lower), Box::new(upper))
}

/// Render an until/dual-until subformula into the name of the ATA location it becomes.
fn location_name(formula: &MtlFormula<String>) -> AtaLocation {
    format!("{}", formula)
}

/// `init(psi, a)`: the ATA formula a fresh run enters when reading symbol `a` while trying
/// to satisfy `psi` from "now". `first` is true only for the outermost call (directly from
/// `l0`), which does not reset the clock, since `l0`'s own transition is the reset point.
fn init(formula: &MtlFormula<String>, symbol: &str, first: bool) -> Result<AtaFormula<AtaLocation>, Error> {
    match formula {
        MtlFormula::True => Ok(AtaFormula::True),
        MtlFormula::False => Ok(AtaFormula::False),
        MtlFormula::Atom(a) => {
            if a == symbol {
                Ok(AtaFormula::True)
            } else {
                Ok(AtaFormula::False)
            }
        }
        MtlFormula::Neg(inner) => match inner.as_ref() {
            MtlFormula::Atom(a) => {
                if a == symbol {
                    Ok(AtaFormula::False)
                } else {
                    Ok(AtaFormula::True)
                }
            }
            MtlFormula::True => Ok(AtaFormula::False),
            MtlFormula::False => Ok(AtaFormula::True),
            _ => Err(Error::InvalidTimedWord(
                "negation is only allowed directly above an atom in positive normal form"
                    .to_string(),
            )),
        },
        MtlFormula::And(l, r) => Ok(AtaFormula::Conjunction(
            Box::new(init(l, symbol, false)?),
            Box::new(init(r, symbol, false)?),
        )),
        MtlFormula::Or(l, r) => Ok(AtaFormula::Disjunction(
            Box::new(init(l, symbol, false)?),
            Box::new(init(r, symbol, false)?),
        )),
        MtlFormula::Until(..) | MtlFormula::DualUntil(..) => {
            let loc = AtaFormula::Location(location_name(formula));
            if first {
                Ok(loc)
            } else {
                Ok(AtaFormula::ResetClock(Box::new(loc)))
            }
        }
    }
}

/// Translate an MTL formula (over `String` atoms) into an alternating timed automaton.
///
/// `alphabet` defaults to the formula's own alphabet when empty. Returns
/// [`Error::ReservedName`] if the alphabet contains the reserved names `l0` or `sink`.
pub fn translate(
    formula: &MtlFormula<String>,
    alphabet: &BTreeSet<String>,
) -> Result<Ata<AtaLocation, String>, Error> {
    let pnf = formula.to_positive_normal_form();
    let alphabet = if alphabet.is_empty() {
        pnf.get_alphabet()
    } else {
        alphabet.clone()
    };
    for reserved in [INITIAL_LOCATION, SINK_LOCATION] {
        if alphabet.iter().any(|s| s == reserved) {
            return Err(Error::ReservedName(reserved.to_string()));
        }
    }

    let untils = pnf.untils();
    let dual_untils = pnf.dual_untils();

    let accepting_locations: BTreeSet<AtaLocation> =
        dual_untils.iter().map(|f| location_name(f)).collect();

    let mut transitions = Vec::new();

    for symbol in &alphabet {
        transitions.push((
            INITIAL_LOCATION.to_string(),
            symbol.clone(),
            init(&pnf, symbol, true)?,
        ));

        for until in &untils {
            let (lhs, interval, rhs) = match until {
                MtlFormula::Until(l, i, r) => (l, i, r),
                _ => unreachable!(),
            };
            let loc = location_name(until);
            let formula = AtaFormula::Disjunction(
                Box::new(AtaFormula::Conjunction(
                    Box::new(init(rhs, symbol, false)?),
                    Box::new(create_contains(interval)),
                )),
                Box::new(AtaFormula::Conjunction(
                    Box::new(init(lhs, symbol, false)?),
                    Box::new(AtaFormula::Location(loc.clone())),
                )),
            );
            transitions.push((loc, symbol.clone(), formula));
        }

        for dual_until in &dual_untils {
            let (lhs, interval, rhs) = match dual_until {
                MtlFormula::DualUntil(l, i, r) => (l, i, r),
                _ => unreachable!(),
            };
            let loc = location_name(dual_until);
            let formula = AtaFormula::Conjunction(
                Box::new(AtaFormula::Disjunction(
                    Box::new(init(rhs, symbol, false)?),
                    Box::new(create_negated_contains(interval)),
                )),
                Box::new(AtaFormula::Disjunction(
                    Box::new(init(lhs, symbol, false)?),
                    Box::new(AtaFormula::Location(loc.clone())),
                )),
            );
            transitions.push((loc, symbol.clone(), formula));
        }
    }

    Ok(Ata::new(
        alphabet,
        INITIAL_LOCATION.to_string(),
        accepting_locations,
        SINK_LOCATION.to_string(),
        transitions,
    ))
}
