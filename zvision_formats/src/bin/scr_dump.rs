use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use zvision_formats::{ScrFile, ValueSlot, flags};

/// Parse a ZVision `.scr` script and list its puzzles and controls.
#[derive(Parser)]
struct Args {
    /// Path to the `.scr` file to inspect
    path: PathBuf,

    /// Print the parsed file as JSON instead of the summary table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let bytes =
        fs::read(&args.path).with_context(|| format!("reading {}", args.path.display()))?;
    let file = ScrFile::from_bytes(&bytes);

    if args.json {
        let json = serde_json::to_string_pretty(&file).context("serializing script to JSON")?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "{}: {} puzzles, {} controls, {} diagnostics",
        args.path.display(),
        file.puzzles.len(),
        file.controls.len(),
        file.diagnostics.len()
    );

    for puzzle in &file.puzzles {
        let flag_names = flags::names(puzzle.flags).join("|");
        println!(
            "puzzle {:>6}  {} criteria  {} results  {}",
            puzzle.key,
            puzzle.criteria.len(),
            puzzle.results.len(),
            flag_names
        );
        for (index, conjunction) in puzzle.criteria.iter().enumerate() {
            let clauses: Vec<String> = conjunction
                .iter()
                .map(|entry| {
                    let argument = match entry.argument {
                        ValueSlot::Literal(value) => value.to_string(),
                        ValueSlot::Key(key) => format!("[{key}]"),
                    };
                    format!("[{}] {} {}", entry.key, entry.operator.symbol(), argument)
                })
                .collect();
            let joiner = if index == 0 { "if  " } else { "or  " };
            println!("    {joiner}{}", clauses.join(" and "));
        }
        for action in &puzzle.results {
            println!("    -> {}", action.keyword());
        }
    }

    for control in &file.controls {
        println!(
            "control {:>5}  {:<12} {} properties",
            control.key,
            control.kind.name(),
            control.properties.len()
        );
    }

    for diagnostic in &file.diagnostics {
        println!("line {:>5}: {}", diagnostic.line, diagnostic.message);
    }

    Ok(())
}
