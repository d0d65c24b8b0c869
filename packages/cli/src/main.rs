//! `redline`: command-line tools for annotated chapter documents.
//!
//! Offline subcommands work on JSON and text files:
//!
//! - **`validate`**: check a tree against the schema invariants as-is.
//! - **`sanitize`**: repair a tree and print the canonical form.
//! - **`project`**: print the plain text a tree stands for.
//! - **`lift`**: build a tree from plain text.
//! - **`render`**: print a tree or a stored chapter record for humans.
//! - **`classify`**: print the version type of a plain text.
//!
//! **`fetch`** reads a chapter from a running `redline-server`.
//!
//! All file arguments accept `-` for stdin.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use redline::{
    classify, lift, project, render, sanitize, sanitize_with_report, validate_document, Document,
};
use redline_api::{ChapterRecord, ChapterView};
use serde_json::Value;

/// redline: annotated chapter document CLI
///
/// Validate, repair and inspect chapter trees.
#[derive(Parser)]
#[command(name = "redline", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a document tree against the schema without repairing it.
    ///
    /// Exits 0 if the tree is valid as stored, 1 otherwise. On failure the
    /// repairs `sanitize` would apply are listed.
    Validate {
        /// Path to a JSON file, or `-` for stdin.
        file: PathBuf,
    },

    /// Repair a document tree and print it as canonical JSON.
    Sanitize {
        /// Path to a JSON file, or `-` for stdin.
        file: PathBuf,

        /// List every repair on stderr.
        #[arg(long)]
        report: bool,
    },

    /// Print the plain-text projection of a document tree.
    ///
    /// Deleted entities are left out.
    Project {
        /// Path to a JSON file, or `-` for stdin.
        file: PathBuf,
    },

    /// Build a document tree from plain text and print it as JSON.
    Lift {
        /// Path to a text file, or `-` for stdin.
        file: PathBuf,
    },

    /// Render a document tree or a stored chapter record as text.
    ///
    /// A JSON object with a `chapter_versions` field is treated as a chapter
    /// record; anything else as a document tree.
    Render {
        /// Path to a JSON file, or `-` for stdin.
        file: PathBuf,

        /// For chapter records: also render the current version's tree.
        #[arg(long)]
        tree: bool,
    },

    /// Print the version type (`regular`, `technical`, `heading_only`) of a
    /// plain text.
    Classify {
        /// Path to a text file, or `-` for stdin.
        file: PathBuf,

        /// Chapter title; some titles mark a chapter as technical.
        #[arg(short = 't', long, default_value = "")]
        title: String,
    },

    /// Fetch a chapter from a running server.
    ///
    /// Examples:
    ///   redline fetch -r 42 -c intro
    ///   redline fetch -r 42 -c intro --render --server http://127.0.0.1:8080
    Fetch {
        /// Base URL of the server.
        #[arg(long, env = "REDLINE_SERVER", default_value = "http://127.0.0.1:3000")]
        server: String,

        #[arg(short = 'r', long, value_name = "REPORT_ID")]
        report: String,

        #[arg(short = 'c', long, value_name = "CHAPTER_ID")]
        chapter: String,

        /// Print the rendered chapter instead of JSON.
        #[arg(long)]
        render: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { file } => {
            let raw = read_json(&file);
            let strict = serde_json::from_value::<Document>(raw.clone())
                .map_err(|e| e.to_string())
                .and_then(|doc| validate_document(&doc).map_err(|e| e.to_string()));
            match strict {
                Ok(()) => println!("valid"),
                Err(e) => {
                    eprintln!("error: {e}");
                    let (_, repairs) = sanitize_with_report(&raw);
                    if !repairs.is_empty() {
                        eprintln!("sanitize would apply {} repair(s):", repairs.len());
                        for r in &repairs {
                            eprintln!("  {r:?}");
                        }
                    }
                    process::exit(1);
                }
            }
        }

        Command::Sanitize { file, report } => {
            let raw = read_json(&file);
            let (doc, repairs) = sanitize_with_report(&raw);
            if report {
                for r in &repairs {
                    eprintln!("{r:?}");
                }
            }
            print_json(&doc);
        }

        Command::Project { file } => {
            let doc = sanitize(&read_json(&file));
            println!("{}", project(&doc));
        }

        Command::Lift { file } => {
            print_json(&lift(&read_input(&file)));
        }

        Command::Render { file, tree } => {
            let raw = read_json(&file);
            if raw.get("chapter_versions").is_some() {
                let record: ChapterRecord = serde_json::from_value(raw)
                    .unwrap_or_else(|e| fatal(&format!("not a chapter record: {e}")));
                print_record(&record, tree);
            } else {
                print!("{}", render::render_document(&sanitize(&raw)));
            }
        }

        Command::Classify { file, title } => {
            let text = read_input(&file);
            println!("{}", classify(text.trim_end_matches('\n'), &title));
        }

        Command::Fetch {
            server,
            report,
            chapter,
            render,
        } => {
            let url = format!(
                "{}/v1/reports/{report}/chapters/{chapter}",
                server.trim_end_matches('/')
            );
            let response = reqwest::blocking::get(&url)
                .unwrap_or_else(|e| fatal(&format!("request to {url} failed: {e}")));
            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                fatal(&format!("server returned {status}: {body}"));
            }
            let view: ChapterView = response
                .json()
                .unwrap_or_else(|e| fatal(&format!("unexpected response body: {e}")));
            if render {
                print_record(&view.record, true);
            } else {
                print_json(&view);
            }
        }
    }
}

fn print_record(record: &ChapterRecord, tree: bool) {
    let chapter = record.to_chapter();
    print!("{}", render::render_chapter(&chapter));
    if tree {
        println!();
        print!("{}", render::render_document(&chapter.current().document));
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fatal(&format!("failed to encode output: {e}")),
    }
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {e}")));
        buf
    } else {
        fs::read_to_string(path)
            .unwrap_or_else(|e| fatal(&format!("failed to read {}: {e}", path.display())))
    }
}

/// Read and parse a JSON input. Any JSON value is accepted; the sanitizer
/// decides what to make of it.
fn read_json(path: &PathBuf) -> Value {
    let text = read_input(path);
    serde_json::from_str(&text).unwrap_or_else(|e| fatal(&format!("input is not JSON: {e}")))
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("redline: {msg}");
    process::exit(2);
}
