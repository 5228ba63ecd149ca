//! slidedeck - export slide deck pages
//!
//! `--info` prints a JSON summary of the deck.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use slidedeck::{Deck, Target, ViewMode, serialize, serialize_document};

#[derive(Parser)]
#[command(name = "slidedeck")]
#[command(version, about = "Export slide deck pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    slidedeck talk.xhtml                     Print the deck as authored
    slidedeck talk.xhtml -p intro -f latex   Typeset the page keyed 'intro'
    slidedeck talk.xhtml -l '#3?view=grid'   Export the page a location names
    slidedeck -i talk.xhtml                  Show a JSON summary")]
struct Cli {
    /// Deck file (XHTML)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output rendering: markup, highlight or latex
    #[arg(short, long, default_value = "markup", value_parser = parse_target)]
    format: Target,

    /// Export only this page (ordinal or keyword)
    #[arg(short, long)]
    page: Option<String>,

    /// Start the deck at a location string and export the page it selects
    #[arg(short, long, conflicts_with = "page")]
    location: Option<String>,

    /// Print a JSON summary instead of exporting
    #[arg(short, long)]
    info: bool,

    /// Print diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_target(s: &str) -> Result<Target, String> {
    Target::parse(s).ok_or_else(|| format!("unknown format '{s}' (markup, highlight, latex)"))
}

#[derive(Serialize)]
struct PageInfo {
    ordinal: usize,
    keywords: Vec<String>,
    description: Option<String>,
}

#[derive(Serialize)]
struct DeckInfo {
    file: String,
    pages: Vec<PageInfo>,
    overlays: Vec<String>,
    view: ViewMode,
    location: String,
    warnings: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut deck = Deck::open_path(&cli.input).map_err(|e| e.to_string())?;

    if let Some(location) = &cli.location {
        deck.start(location).map_err(|e| e.to_string())?;
    }

    let result = if cli.info {
        show_info(&cli.input, &deck)
    } else {
        export(cli, &deck)
    };

    if cli.verbose {
        for entry in deck.diagnostics.entries() {
            eprintln!("{entry}");
        }
    }
    result
}

fn show_info(path: &str, deck: &Deck) -> Result<(), String> {
    let pages = deck
        .registry
        .pages()
        .iter()
        .enumerate()
        .map(|(ordinal, &page)| PageInfo {
            ordinal,
            keywords: deck.keywords_of(ordinal),
            description: deck.describe(page),
        })
        .collect();
    let info = DeckInfo {
        file: path.to_string(),
        pages,
        overlays: deck.overlays.ids().map(String::from).collect(),
        view: deck.state.view,
        location: deck.location().to_string(),
        warnings: deck.diagnostics.warnings().map(|d| d.to_string()).collect(),
    };
    let json = serde_json::to_string_pretty(&info).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn export(cli: &Cli, deck: &Deck) -> Result<(), String> {
    let output = if let Some(token) = &cli.page {
        let n = deck
            .registry
            .find_by_keyword_or_ordinal(token)
            .ok_or_else(|| format!("no such page: {token}"))?;
        let page = deck.registry.page(n).ok_or_else(|| format!("no such page: {token}"))?;
        serialize(&deck.doc, &deck.provenance, page, cli.format)
    } else if cli.location.is_some() {
        let page = deck.current_page().ok_or("deck has no pages")?;
        serialize(&deck.doc, &deck.provenance, page, cli.format)
    } else {
        serialize_document(&deck.doc, &deck.provenance, cli.format)
    };
    println!("{output}");
    Ok(())
}
