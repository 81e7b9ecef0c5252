use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use wit_dbi_compiler::{compile_wit, generate_outputs};

mod checks;

#[derive(Parser)]
#[command(name = "witdbi")]
#[command(about = "Compile WIT dbi records into the manifest and generated C metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the dbi manifest and generated C artifacts from a WIT file
    Generate {
        /// Input WIT file containing dbi records
        #[arg(long)]
        wit: PathBuf,

        /// Output CSV manifest path
        #[arg(long)]
        manifest: PathBuf,

        /// Output generated C header path
        #[arg(long)]
        header: PathBuf,

        /// Output generated C source path
        #[arg(long)]
        source: PathBuf,
    },

    /// Print the parsed record set and resolved entries as JSON
    Dump {
        /// Input WIT file
        #[arg(short, long)]
        wit: PathBuf,
    },

    /// Validate a dbi manifest file
    CheckManifest {
        /// Manifest CSV path
        manifest: PathBuf,
    },

    /// Cross-check manifest status against runner code, docs, and the
    /// generated header
    CheckStatus {
        /// Manifest CSV path
        manifest: PathBuf,

        /// Generated header containing the WIT_DBI_* constants
        header: PathBuf,

        /// Repository root holding src/runner and docs
        repo_root: PathBuf,
    },
}

fn main() -> ExitCode {
    match Cli::parse().command {
        Commands::Generate {
            wit,
            manifest,
            header,
            source,
        } => {
            let text = match fs::read_to_string(&wit) {
                Ok(text) => text,
                Err(_) => {
                    eprintln!("wit-schema: FAIL: file not found: {}", wit.display());
                    return ExitCode::FAILURE;
                }
            };
            match generate_outputs(&text, &manifest, &header, &source) {
                Ok(summary) => {
                    if summary.skipped > 0 {
                        eprintln!(
                            "wit-schema: note: {} malformed field line(s) skipped",
                            summary.skipped
                        );
                    }
                    println!(
                        "wit-schema: PASS (entries={} wit={} manifest={} header={})",
                        summary.entries,
                        wit.display(),
                        manifest.display(),
                        header.display()
                    );
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("wit-schema: FAIL: {}", err);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Dump { wit } => {
            let text = match fs::read_to_string(&wit) {
                Ok(text) => text,
                Err(_) => {
                    eprintln!("wit-schema: FAIL: file not found: {}", wit.display());
                    return ExitCode::FAILURE;
                }
            };
            match compile_wit(&text).map(|c| serde_json::to_string_pretty(&c)) {
                Ok(Ok(json)) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Ok(Err(err)) => {
                    eprintln!("wit-schema: FAIL: {}", err);
                    ExitCode::FAILURE
                }
                Err(err) => {
                    eprintln!("wit-schema: FAIL: {}", err);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::CheckManifest { manifest } => match checks::check_manifest(&manifest) {
            Ok(summary) => {
                println!("dbi-manifest: PASS {}", summary);
                ExitCode::SUCCESS
            }
            Err(msg) => {
                eprintln!("dbi-manifest: FAIL: {}", msg);
                ExitCode::FAILURE
            }
        },

        Commands::CheckStatus {
            manifest,
            header,
            repo_root,
        } => match checks::check_status(&manifest, &header, &repo_root) {
            Ok(summary) => {
                println!("runner-dbi-status: PASS {}", summary);
                ExitCode::SUCCESS
            }
            Err(msg) => {
                eprintln!("runner-dbi-status: FAIL: {}", msg);
                ExitCode::FAILURE
            }
        },
    }
}
