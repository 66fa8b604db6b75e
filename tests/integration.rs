//! End-to-end controller-synthesis scenarios, exercised through the public `tacos` API:
//! build a plant and an MTL specification, run [`synthesize`], and check the resulting
//! realizability verdict (and, where realizable, a property of the extracted controller).

use std::collections::BTreeSet;
use std::io::Write;

use tacos::clock::{ClockConstraint, ComparisonOp};
use tacos::format;
use tacos::mtl::{Interval, MtlFormula};
use tacos::options::SynthesisOptions;
use tacos::plant::{product, TimedAutomaton};
use tacos::{synthesize, synthesize_with, Status};

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Synthesize a controller for `plant` against `formula` and assert whether the result is
/// realizable.
fn verify_realizability(
    plant: TimedAutomaton<String, String>,
    formula: &MtlFormula<String>,
    controller_actions: &[&str],
    k: u32,
    expect_realizable: bool,
) -> Status<String, String, String> {
    let options = SynthesisOptions {
        controller_actions: set(controller_actions),
        k: Some(k),
        single_threaded: true,
        ..SynthesisOptions::default()
    };
    let status = synthesize(plant, formula, &options).unwrap();
    assert_eq!(matches!(status, Status::Realizable { .. }), expect_realizable);
    status
}

/// Scenario 4: `l0 --e--> l0`, `l0 --c--> l1 --c--> l1`, specification `F c`.
/// With `c` controller-owned and `e` environment-owned and `K = 0`, the controller can always
/// just take `c` immediately: the root must be realizable.
#[test]
fn monotonic_counter_example_is_realizable() {
    let locations = set(&["l0", "l1"]);
    let clocks = set(&["x"]);
    let alphabet = set(&["c", "e"]);
    let transitions = vec![
        TimedAutomaton::make_transition(
            "l0".to_string(),
            "e".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            BTreeSet::new(),
            "l0".to_string(),
        ),
        TimedAutomaton::make_transition(
            "l0".to_string(),
            "c".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            BTreeSet::new(),
            "l1".to_string(),
        ),
        TimedAutomaton::make_transition(
            "l1".to_string(),
            "c".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            BTreeSet::new(),
            "l1".to_string(),
        ),
    ];
    let plant = TimedAutomaton::new(locations, clocks, alphabet, "l0".to_string(), BTreeSet::new(), transitions).unwrap();

    let formula = MtlFormula::finally(Interval::unbounded(), MtlFormula::Atom("c".to_string()));
    verify_realizability(plant, &formula, &["c"], 0, true);
}

/// Scenario 5 ("bad subtree pruning"): `l0 --a/reset x--> l0` (controller, harmless self-loop)
/// alongside `l0 --b--> bad` (environment, unconditionally enabled, `bad` accepting).
///
/// However many times the controller loops on `a`, the environment can always take `b` and
/// force the plant straight into `bad`: the root must be unrealizable, regardless of how the
/// controller's own branch of the search tree plays out — the case the node labeling's
/// `BadEnvActionFirst` rule exists to prune.
#[test]
fn bad_subtree_pruning_is_unrealizable() {
    let locations = set(&["l0", "bad"]);
    let clocks = set(&["x"]);
    let alphabet = set(&["a", "b"]);
    let transitions = vec![
        TimedAutomaton::make_transition(
            "l0".to_string(),
            "a".to_string(),
            vec![],
            BTreeSet::from(["x".to_string()]),
            "l0".to_string(),
        ),
        TimedAutomaton::make_transition(
            "l0".to_string(),
            "b".to_string(),
            vec![],
            BTreeSet::new(),
            "bad".to_string(),
        ),
    ];
    let plant = TimedAutomaton::new(
        locations,
        clocks,
        alphabet,
        "l0".to_string(),
        BTreeSet::from(["bad".to_string()]),
        transitions,
    )
    .unwrap();

    let formula = MtlFormula::finally(Interval::unbounded(), MtlFormula::Atom("b".to_string()));
    verify_realizability(plant, &formula, &["a"], 1, false);
}

/// Scenario 3 ("crossing game"), reduced to its first arm: a gate (`start_close` /
/// `finish_close` / `start_open` / `finish_open`, controller-owned, clock `c`) composed with a
/// train (`get_near` / `enter` / `leave` / `travel`, environment-owned, clock `t`) via
/// [`product`], with `distance = 2` (the train cannot `get_near` until `t > 2`). The forbidden
/// behavior is the train entering before the gate has finished closing: `not(finish_close) U
/// enter`.
///
/// The controller can always fire `start_close` immediately and `finish_close` as soon as
/// `c == 1`, which completes well before the train's `t > 2` guard on `get_near` can even be
/// satisfied (and `enter` requires a further `get_near` first) — so the race is always won by
/// the gate, regardless of region abstraction. The root must be realizable; this exercises the
/// real guard/interval structure of the product instead of a vacuous reduction.
#[test]
fn crossing_style_game_is_realizable() {
    let gate_locations = set(&["g_open", "g_closing", "g_closed", "g_opening"]);
    let gate_clocks = set(&["c"]);
    let gate_alphabet = set(&["start_close", "finish_close", "start_open", "finish_open"]);
    let gate_transitions = vec![
        TimedAutomaton::make_transition(
            "g_open".to_string(),
            "start_close".to_string(),
            vec![],
            BTreeSet::from(["c".to_string()]),
            "g_closing".to_string(),
        ),
        TimedAutomaton::make_transition(
            "g_closing".to_string(),
            "finish_close".to_string(),
            vec![("c".to_string(), ClockConstraint::new(ComparisonOp::Eq, 1))],
            BTreeSet::new(),
            "g_closed".to_string(),
        ),
        TimedAutomaton::make_transition(
            "g_closed".to_string(),
            "start_open".to_string(),
            vec![("c".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 1))],
            BTreeSet::from(["c".to_string()]),
            "g_opening".to_string(),
        ),
        TimedAutomaton::make_transition(
            "g_opening".to_string(),
            "finish_open".to_string(),
            vec![("c".to_string(), ClockConstraint::new(ComparisonOp::Eq, 1))],
            BTreeSet::new(),
            "g_open".to_string(),
        ),
    ];
    let gate = TimedAutomaton::new(
        gate_locations,
        gate_clocks,
        gate_alphabet,
        "g_open".to_string(),
        BTreeSet::new(),
        gate_transitions,
    )
    .unwrap();

    let train_locations = set(&["t_far", "t_near", "t_in", "t_behind", "t_far_behind"]);
    let train_clocks = set(&["t"]);
    let train_alphabet = set(&["get_near", "enter", "leave", "travel"]);
    let train_transitions = vec![
        TimedAutomaton::make_transition(
            "t_far".to_string(),
            "get_near".to_string(),
            vec![("t".to_string(), ClockConstraint::new(ComparisonOp::Greater, 2))],
            BTreeSet::from(["t".to_string()]),
            "t_near".to_string(),
        ),
        TimedAutomaton::make_transition(
            "t_near".to_string(),
            "enter".to_string(),
            vec![("t".to_string(), ClockConstraint::new(ComparisonOp::LessEq, 1))],
            BTreeSet::from(["t".to_string()]),
            "t_in".to_string(),
        ),
        TimedAutomaton::make_transition(
            "t_in".to_string(),
            "leave".to_string(),
            vec![("t".to_string(), ClockConstraint::new(ComparisonOp::Eq, 1))],
            BTreeSet::from(["t".to_string()]),
            "t_behind".to_string(),
        ),
        TimedAutomaton::make_transition(
            "t_behind".to_string(),
            "travel".to_string(),
            vec![("t".to_string(), ClockConstraint::new(ComparisonOp::Eq, 2))],
            BTreeSet::new(),
            "t_far_behind".to_string(),
        ),
    ];
    let train = TimedAutomaton::new(
        train_locations,
        train_clocks,
        train_alphabet,
        "t_far".to_string(),
        BTreeSet::new(),
        train_transitions,
    )
    .unwrap();

    let plant = product(&gate, &train, &BTreeSet::new()).unwrap();
    let formula = MtlFormula::Until(
        Box::new(MtlFormula::Neg(Box::new(MtlFormula::Atom("finish_close".to_string())))),
        Interval::unbounded(),
        Box::new(MtlFormula::Atom("enter".to_string())),
    );

    let controller_actions =
        set(&["start_close", "finish_close", "start_open", "finish_open"]);
    let options = SynthesisOptions {
        controller_actions,
        k: Some(2),
        single_threaded: true,
        ..SynthesisOptions::default()
    };
    let ata = tacos::translator::translate(&formula, plant.alphabet()).unwrap();
    let status = synthesize_with(plant, ata, &options).unwrap();
    assert!(matches!(status, Status::Realizable { .. }));
}

/// A finite household-like game: `start(move)`/`end(move)` bracket a single controller action,
/// and the specification `F moving` is trivially satisfiable once the controller ever issues
/// `start_move`. Mirrors the shape of the household scenario in the design notes, reduced to a
/// single action pair.
#[test]
fn finite_household_like_game_is_realizable() {
    let locations = set(&["idle", "moving"]);
    let clocks = set(&["t"]);
    let alphabet = set(&["start_move", "end_move"]);
    let transitions = vec![
        TimedAutomaton::make_transition(
            "idle".to_string(),
            "start_move".to_string(),
            vec![],
            BTreeSet::from(["t".to_string()]),
            "moving".to_string(),
        ),
        TimedAutomaton::make_transition(
            "moving".to_string(),
            "end_move".to_string(),
            vec![("t".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 1))],
            BTreeSet::new(),
            "idle".to_string(),
        ),
    ];
    let plant = TimedAutomaton::new(
        locations,
        clocks,
        alphabet,
        "idle".to_string(),
        BTreeSet::new(),
        transitions,
    )
    .unwrap();

    let formula = MtlFormula::finally(Interval::unbounded(), MtlFormula::Atom("start_move".to_string()));
    verify_realizability(plant, &formula, &["start_move", "end_move"], 1, true);
}

/// A plant written to disk in the text format and read back must parse to the same automaton,
/// the same round-trip the CLI relies on for `--output`/`--visualize-*`.
#[test]
fn plant_round_trips_through_a_file() {
    let locations = set(&["s0", "s1"]);
    let clocks = set(&["x"]);
    let alphabet = set(&["a"]);
    let transitions = vec![TimedAutomaton::make_transition(
        "s0".to_string(),
        "a".to_string(),
        vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 2))],
        BTreeSet::from(["x".to_string()]),
        "s1".to_string(),
    )];
    let plant = TimedAutomaton::new(
        locations,
        clocks,
        alphabet,
        "s0".to_string(),
        BTreeSet::from(["s1".to_string()]),
        transitions,
    )
    .unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(format::write_plant(&plant).as_bytes()).unwrap();
    let contents = std::fs::read_to_string(file.path()).unwrap();
    let reparsed = format::parse_plant(&contents).unwrap();

    assert_eq!(reparsed.locations(), plant.locations());
    assert_eq!(reparsed.final_locations(), plant.final_locations());
    assert_eq!(reparsed.transitions().len(), plant.transitions().len());
}
