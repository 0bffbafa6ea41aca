//! edict command-line front end.
//!
//! Three subcommands map 1:1 onto the engine entry points: `run`
//! (evaluate), `verify` (replay), and `lint` (static analysis). Input is
//! a file path or stdin; output is JSON on stdout. Exit codes: 0 for
//! success/valid, 1 for errors, 2 for an invalid result.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use edict_core::{DocStatus, Document};

const EXIT_ERROR: i32 = 1;
const EXIT_INVALID: i32 = 2;

/// Declarative rules VM for self-describing JSON documents.
#[derive(Parser)]
#[command(name = "edict", version, about = "Declarative rules VM for JSON documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a document and print the transformed result
    Run {
        /// Input document (omit or use "-" for stdin)
        file: Option<PathBuf>,
        /// Effective date (YYYY-MM-DD, date-time, or RFC 3339; defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Replay a completed document against its base and report issues
    Verify {
        /// The completed document to verify
        #[arg(long)]
        completed: PathBuf,
        /// The original base document
        #[arg(long)]
        base: PathBuf,
        /// Replay iteration cap
        #[arg(long, default_value_t = edict_eval::DEFAULT_VERIFY_ITERATIONS)]
        max_iterations: usize,
    },

    /// Statically analyze a document without executing it
    Lint {
        /// Input document (omit or use "-" for stdin)
        file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, date } => cmd_run(file.as_deref(), date.as_deref()),
        Commands::Verify {
            completed,
            base,
            max_iterations,
        } => cmd_verify(&completed, &base, max_iterations),
        Commands::Lint { file } => cmd_lint(file.as_deref()),
    }
}

fn cmd_run(file: Option<&Path>, date: Option<&str>) {
    let instant = match date {
        Some(text) => match edict_core::value::parse_date_str(text) {
            Some(parsed) => parsed,
            None => {
                eprintln!("error: invalid date '{}'", text);
                process::exit(EXIT_ERROR);
            }
        },
        None => now(),
    };

    let doc = read_document(file);
    match edict_eval::evaluate(&doc, instant) {
        Ok(result) => {
            print_json(&result);
            if result.status == Some(DocStatus::Invalid) {
                process::exit(EXIT_INVALID);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

fn cmd_verify(completed_path: &Path, base_path: &Path, max_iterations: usize) {
    let completed = read_document(Some(completed_path));
    let base = read_document(Some(base_path));

    let report = edict_eval::verify_with_cap(&completed, &base, max_iterations);
    print_json(&report);

    if report.error.is_some() {
        process::exit(EXIT_ERROR);
    }
    if !report.valid {
        process::exit(EXIT_INVALID);
    }
}

fn cmd_lint(file: Option<&Path>) {
    let doc = read_document(file);
    let report = edict_analyze::analyze(&doc);
    print_json(&report);

    if !report.valid {
        process::exit(EXIT_INVALID);
    }
}

/// Read and parse a document from a path, or stdin when the path is
/// absent or "-".
fn read_document(path: Option<&Path>) -> Document {
    let text = match path {
        Some(p) if p.as_os_str() != "-" => match fs::read_to_string(p) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("error: reading {}: {}", p.display(), e);
                process::exit(EXIT_ERROR);
            }
        },
        _ => {
            let mut buffer = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
                eprintln!("error: reading stdin: {}", e);
                process::exit(EXIT_ERROR);
            }
            buffer
        }
    };

    match Document::from_json(&text) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("error: parsing document: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("error: serializing result: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
