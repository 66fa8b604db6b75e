//! Graphviz (`dot`) rendering of the search DAG and the extracted controller.
//!
//! Neither the search arena nor the controller automaton is itself a `petgraph` graph, so both
//! are projected into a small `petgraph::graph::DiGraph` purely for rendering, the way
//! `krukah-robopoker`'s `mccfr::tree::Tree` wraps a `DiGraph<Node, Edge>` around its own game
//! tree rather than making the tree itself generic over petgraph's API.

use std::collections::HashMap;
use std::fmt;

use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;

use crate::controller::ControllerLocation;
use crate::plant::TimedAutomaton;
use crate::search::{NodeIndex, NodeLabel, SearchTree};

/// Render the search DAG to Graphviz `dot` source.
///
/// Each node is labeled with its index, label (`?`/`BOT`/`TOP`/`CANCEL`) and word-set size;
/// `hide_labels` omits the label suffix, for diagrams that should show only the DAG's shape.
pub fn render_search_tree<Loc, ALoc, Act>(tree: &SearchTree<Loc, ALoc, Act>, hide_labels: bool) -> String
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    let mut graph: DiGraph<String, String> = DiGraph::new();
    let mut indices: HashMap<NodeIndex, petgraph::graph::NodeIndex> = HashMap::new();

    let mut frontier = vec![tree.root()];
    let mut visited = std::collections::HashSet::new();
    while let Some(node) = frontier.pop() {
        if !visited.insert(node) {
            continue;
        }
        let label = if hide_labels {
            format!("n{}", node)
        } else {
            format!(
                "n{} [{}] ({} words)",
                node,
                label_text(tree.label_of(node)),
                tree.word_count(node)
            )
        };
        indices.insert(node, graph.add_node(label));
        for ((_, _), child) in tree.children_of(node) {
            frontier.push(child);
        }
    }

    for node in indices.keys().copied().collect::<Vec<_>>() {
        for ((increment, action), child) in tree.children_of(node) {
            if let (Some(&from), Some(&to)) = (indices.get(&node), indices.get(&child)) {
                graph.add_edge(from, to, format!("{}+{}", action, increment));
            }
        }
    }

    format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
        .replace("digraph", "digraph search_tree")
        + &render_edge_labels(&graph)
}

/// Render the extracted controller automaton to Graphviz `dot` source.
pub fn render_controller<Loc, ALoc, Act>(controller: &TimedAutomaton<ControllerLocation<Loc, ALoc>, Act>) -> String
where
    Loc: Clone + Ord + fmt::Display,
    ALoc: Clone + Ord + fmt::Display,
    Act: Clone + Ord + fmt::Display,
{
    let mut graph: DiGraph<String, String> = DiGraph::new();
    let mut indices = HashMap::new();
    for (i, location) in controller.locations().iter().enumerate() {
        indices.insert(location.clone(), graph.add_node(format!("q{}: {}", i, location)));
    }
    for transition in controller.transitions() {
        if let (Some(&from), Some(&to)) = (indices.get(transition.source()), indices.get(transition.target())) {
            let guard = transition
                .guard()
                .iter()
                .map(|(clock, c)| format!("{} {}", clock, c))
                .collect::<Vec<_>>()
                .join(", ");
            graph.add_edge(from, to, format!("{} [{}]", transition.action(), guard));
        }
    }
    format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
        .replace("digraph", "digraph controller")
        + &render_edge_labels(&graph)
}

fn label_text(label: NodeLabel) -> &'static str {
    match label {
        NodeLabel::Unlabeled => "?",
        NodeLabel::Bottom => "BOT",
        NodeLabel::Top => "TOP",
        NodeLabel::Canceled => "CANCEL",
    }
}

/// `Dot` with `EdgeNoLabel` omits edge labels entirely; append them as a trailing comment block
/// instead, since our edge weights carry operationally relevant detail (action + guard) that a
/// reviewer reading the rendered file will want even when the default edge-label layout is
/// visually too cluttered for dense DAGs.
fn render_edge_labels<N>(graph: &DiGraph<N, String>) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();
    let _ = writeln!(out, "\n// edges:");
    for edge in graph.edge_indices() {
        if let Some((from, to)) = graph.edge_endpoints(edge) {
            let _ = writeln!(out, "//   {:?} -> {:?} : {}", from, to, graph[edge]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ata::{Ata, AtaFormula};
    use crate::clock::{ClockConstraint, ComparisonOp};
    use std::collections::BTreeSet as Set;

    fn trivial_plant() -> TimedAutomaton<String, String> {
        let locations: Set<String> = ["s0", "s1"].iter().map(|s| s.to_string()).collect();
        let clocks: Set<String> = ["x"].iter().map(|s| s.to_string()).collect();
        let alphabet: Set<String> = ["a"].iter().map(|s| s.to_string()).collect();
        let transitions = vec![TimedAutomaton::make_transition(
            "s0".to_string(),
            "a".to_string(),
            vec![("x".to_string(), ClockConstraint::new(ComparisonOp::GreaterEq, 0))],
            Set::new(),
            "s1".to_string(),
        )];
        TimedAutomaton::new(locations, clocks, alphabet, "s0".to_string(), Set::from(["s1".to_string()]), transitions)
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
    fn renders_a_nonempty_dot_document() {
        let plant = trivial_plant();
        let ata = always_true_ata();
        let mut tree = SearchTree::new(plant, ata, Set::new(), ["a".to_string()].into_iter().collect(), 1, false).unwrap();
        tree.build_tree_single_threaded().unwrap();
        let dot = render_search_tree(&tree, false);
        assert!(dot.contains("digraph search_tree"));
        assert!(dot.contains("n0"));
    }
}
