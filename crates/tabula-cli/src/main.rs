//! Tabula CLI - formula evaluation tool

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabula::prelude::*;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about = "Spreadsheet formula evaluation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula that does not read any cells
    Eval {
        /// Formula text, with or without the leading '='
        formula: String,
    },

    /// Print the parsed formula as a tree
    Tree {
        /// Formula text, with or without the leading '='
        formula: String,
    },

    /// Load a document, apply edits and print cell values
    Calc {
        /// JSON document: an array of {"ref": "A1", "text": "..."} entries
        input: PathBuf,

        /// Cells to print (default: every stored cell)
        #[arg(short, long = "cell")]
        cells: Vec<CellReference>,

        /// Edits applied after loading, as REF=TEXT (e.g. "A1==B1*2")
        #[arg(short = 's', long = "set")]
        edits: Vec<String>,
    },

    /// Load a document and write it back in canonical order
    Export {
        /// JSON document to load
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval { formula } => eval(&formula),
        Commands::Tree { formula } => tree(&formula),
        Commands::Calc {
            input,
            cells,
            edits,
        } => calc(&input, &cells, &edits),
        Commands::Export { input, output } => export(&input, output.as_deref()),
    }
}

fn parse(formula: &str) -> Result<tabula::Expression> {
    let parsed = if formula.trim_start().starts_with('=') {
        tabula::parse_formula(formula)
    } else {
        tabula::parse_expression(formula)
    };
    parsed.with_context(|| format!("Failed to parse '{}'", formula))
}

fn eval(formula: &str) -> Result<()> {
    let mut manager = DataManager::new();
    let value = manager
        .evaluate_formula(formula)
        .with_context(|| format!("Failed to evaluate '{}'", formula))?;
    println!("{}", value.to_text());
    Ok(())
}

fn tree(formula: &str) -> Result<()> {
    let expression = parse(formula)?;
    print!("{}", expression.pretty_tree());
    println!("={}", expression);
    Ok(())
}

fn load(input: &Path) -> Result<DataManager> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let contents: Vec<CellContent> = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a valid document", input.display()))?;

    let mut manager = DataManager::new();
    let report = manager.load(contents.into_iter().map(|c| (c.reference, c.text)));
    for (cell, err) in &report.rejected {
        eprintln!("Warning: {}: {}", cell, err);
    }
    Ok(manager)
}

fn calc(input: &Path, cells: &[CellReference], edits: &[String]) -> Result<()> {
    let mut manager = load(input)?;

    for edit in edits {
        let (cell, text) = edit
            .split_once('=')
            .ok_or_else(|| anyhow!("Edit '{}' is not of the form REF=TEXT", edit))?;
        let cell: CellReference = cell
            .trim()
            .parse()
            .with_context(|| format!("Invalid cell in edit '{}'", edit))?;
        let summary = manager
            .set_cell_content(cell, text)
            .with_context(|| format!("Failed to set {}", cell))?;
        eprintln!(
            "Set {}: {} recalculated, {} changed",
            cell,
            summary.recalculated,
            summary.changed.len()
        );
    }

    let targets: Vec<CellReference> = if cells.is_empty() {
        manager.cells().collect()
    } else {
        cells.to_vec()
    };

    let mut stdout = io::stdout().lock();
    for cell in targets {
        let value = manager.display_value(cell);
        writeln!(stdout, "{}\t{}", cell, value).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn export(input: &Path, output: Option<&Path>) -> Result<()> {
    let manager = load(input)?;
    let json = serde_json::to_string_pretty(&manager.export()).context("Failed to serialize")?;

    if let Some(output_path) = output {
        std::fs::write(output_path, json + "\n")
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!("Wrote {} cells to '{}'", manager.cell_count(), output_path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}
