//! tacos binary crate.

use std::fs;
use std::io::{self, Write};

use clap::Parser;

use tacos::controller::{create_controller, stringify_controller};
use tacos::options::{CliOptions, SynthesisOptions, TraceLevel};
use tacos::search::NodeLabel;
use tacos::{explore_with, format, translator, visualize};

fn main() {
    if let Err(error) = tacos_main() {
        // discard result as we cannot further propagate a write error
        let _ = write!(io::stderr(), "Error: {}", error);
        std::process::exit(1);
    }
}

/// Initialize the logging framework with the given trace level.
///
/// # Errors
///
/// Returns an error if the logging framework has already been initialized.
fn initialize_logging(level: TraceLevel) -> io::Result<()> {
    env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

/// Main function: parses the options, reads the plant and specification, runs the synthesis
/// procedure and writes the resulting controller (or renderings of the search tree) to disk.
fn tacos_main() -> Result<(), Box<dyn std::error::Error>> {
    let options = CliOptions::parse();
    initialize_logging(options.trace_level())?;

    let plant_source = fs::read_to_string(&options.plant)?;
    let plant = format::parse_plant(&plant_source)?;

    let specification_source = fs::read_to_string(&options.specification)?;
    let specification = format::parse_specification(&specification_source)?;
    format::validate_specification_alphabet(&specification, plant.alphabet())?;

    let synthesis_options = SynthesisOptions::from(&options);
    let ata = translator::translate(&specification, plant.alphabet())?;
    let (tree, k) = explore_with(plant, ata, &synthesis_options)?;

    if let Some(path) = &options.visualize_search_tree {
        fs::write(path, visualize::render_search_tree(&tree, options.hide_controller_labels))?;
    }

    match tree.root_label() {
        NodeLabel::Top => {
            log::info!("realizable ({})", tree.stats());
            writeln!(io::stdout(), "REALIZABLE")?;
            let controller = create_controller(&tree, k)?;
            if let Some(path) = &options.visualize_controller {
                fs::write(path, visualize::render_controller(&controller))?;
            }
            let text = format::write_plant(&stringify_controller(&controller)?);
            match &options.output {
                Some(path) => fs::write(path, text)?,
                None => writeln!(io::stdout(), "{}", text)?,
            }
        }
        _ => {
            log::info!("unrealizable ({})", tree.stats());
            writeln!(io::stdout(), "UNREALIZABLE")?;
        }
    }

    Ok(())
}
