//! Options for the synthesis procedure (§6).

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// The trace level / verbosity for the logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLevel {
    /// Turn logging off.
    Off,
    /// Only print errors.
    Error,
    /// Print errors and warnings.
    Warn,
    /// Print errors, warnings and useful information.
    Info,
    /// Print errors, warnings, useful and debug information.
    Debug,
    /// Print all information, including very verbose output.
    Trace,
}

impl Default for TraceLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl From<TraceLevel> for log::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Error => Self::Error,
            TraceLevel::Warn => Self::Warn,
            TraceLevel::Info => Self::Info,
            TraceLevel::Debug => Self::Debug,
            TraceLevel::Trace => Self::Trace,
        }
    }
}

/// The heuristic used to prioritize node expansion in the search engine (C9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeuristicKind {
    /// Prefer the node discovered earliest (breadth-first).
    Bfs,
    /// Prefer the node discovered latest (depth-first).
    Dfs,
    /// Prefer the node closest in elapsed time to the root.
    Time,
    /// Prefer nodes reached via an environment action, to surface adversarial behavior earlier.
    PreferEnvironment,
    /// Prefer nodes carrying fewer canonical words.
    FewestWords,
    /// A weighted combination of [`HeuristicKind::Time`] and [`HeuristicKind::Bfs`].
    Composite,
}

impl Default for HeuristicKind {
    fn default() -> Self {
        Self::Bfs
    }
}

/// Options controlling the synthesis procedure, independent of where the plant and
/// specification come from or where the result is written to.
///
/// These options can be used directly with [`crate::synthesize_with`] when calling this crate
/// as a library, without going through [`CliOptions`] at all.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Actions the controller owns; every other plant action belongs to the environment.
    pub controller_actions: BTreeSet<String>,
    /// The maximal constant `K` for the region abstraction. `None` derives it from
    /// `max(plant.largest_constant(), specification.largest_constant())`.
    pub k: Option<u32>,
    /// Run the search single-threaded instead of using the worker pool.
    pub single_threaded: bool,
    /// Label nodes incrementally as the search proceeds, rather than only once it completes.
    pub incremental_labeling: bool,
    /// Omit per-node labels when rendering the search tree or controller.
    pub hide_controller_labels: bool,
    /// The node-expansion heuristic to use.
    pub heuristic: HeuristicKind,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            controller_actions: BTreeSet::new(),
            k: None,
            single_threaded: false,
            incremental_labeling: true,
            hide_controller_labels: false,
            heuristic: HeuristicKind::default(),
        }
    }
}

/// Command-line options (plant-TA variant, §6).
///
/// This struct should mainly be used with [`clap`] and not instantiated manually. For using this
/// crate as a library, use [`SynthesisOptions`] directly with [`crate::synthesize_with`] instead;
/// this struct only adds the file-path and diagnostics fields that make sense for a CLI.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Synthesize a timed controller against an MTL specification")]
pub struct CliOptions {
    /// Path to the plant's text-format timed automaton (or product-automaton) description.
    #[arg(long)]
    pub plant: PathBuf,
    /// Path to the text-format MTL specification of forbidden behavior.
    #[arg(long)]
    pub specification: PathBuf,
    /// Marks an action as controller-owned; repeatable. Every remaining plant action is
    /// environment-owned.
    #[arg(long = "controller-action")]
    pub controller_action: Vec<String>,
    /// The maximal constant `K`. Derived from the plant and specification if omitted.
    #[arg(short = 'k', long)]
    pub k: Option<u32>,
    /// Run the search single-threaded instead of using the worker pool.
    #[arg(long)]
    pub single_threaded: bool,
    /// Enable debug-level logging.
    #[arg(long)]
    pub debug: bool,
    /// Write a Graphviz rendering of the raw search DAG to this path.
    #[arg(long)]
    pub visualize_search_tree: Option<PathBuf>,
    /// Write a Graphviz rendering of the extracted controller to this path.
    #[arg(long)]
    pub visualize_controller: Option<PathBuf>,
    /// Omit per-node winner labels from both renderings.
    #[arg(long)]
    pub hide_controller_labels: bool,
    /// Write the extracted controller in text format to this path, instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// The node-expansion heuristic to use.
    #[arg(long, value_enum, default_value_t = HeuristicKind::default())]
    pub heuristic: HeuristicKind,
}

impl CliOptions {
    /// The logging verbosity implied by `--debug`.
    pub fn trace_level(&self) -> TraceLevel {
        if self.debug {
            TraceLevel::Debug
        } else {
            TraceLevel::Info
        }
    }
}

impl From<&CliOptions> for SynthesisOptions {
    fn from(options: &CliOptions) -> Self {
        Self {
            controller_actions: options.controller_action.iter().cloned().collect(),
            k: options.k,
            single_threaded: options.single_threaded,
            incremental_labeling: true,
            hide_controller_labels: options.hide_controller_labels,
            heuristic: options.heuristic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_level_follows_debug_flag() {
        let options = CliOptions {
            plant: PathBuf::from("plant.txt"),
            specification: PathBuf::from("spec.txt"),
            controller_action: vec![],
            k: None,
            single_threaded: false,
            debug: true,
            visualize_search_tree: None,
            visualize_controller: None,
            hide_controller_labels: false,
            output: None,
            heuristic: HeuristicKind::Bfs,
        };
        assert_eq!(options.trace_level(), TraceLevel::Debug);
    }

    #[test]
    fn synthesis_options_flatten_controller_actions() {
        let options = CliOptions {
            plant: PathBuf::from("plant.txt"),
            specification: PathBuf::from("spec.txt"),
            controller_action: vec!["a".to_string(), "b".to_string()],
            k: Some(3),
            single_threaded: true,
            debug: false,
            visualize_search_tree: None,
            visualize_controller: None,
            hide_controller_labels: true,
            output: None,
            heuristic: HeuristicKind::Time,
        };
        let synth = SynthesisOptions::from(&options);
        assert_eq!(synth.controller_actions.len(), 2);
        assert_eq!(synth.k, Some(3));
        assert!(synth.single_threaded);
        assert!(synth.hide_controller_labels);
        assert_eq!(synth.heuristic, HeuristicKind::Time);
    }
}
