//! # educert CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use educert_cli::commitment::{run_commit, run_prove, run_verify, CommitArgs, ProveArgs, VerifyArgs};
use educert_cli::keys::{run_keygen, run_sign, KeygenArgs, SignArgs};

/// EduCert credential tooling.
///
/// Generates P-256 keys, signs commitments, and builds and checks
/// selective-disclosure proofs offline.
#[derive(Parser, Debug)]
#[command(name = "educert", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a P-256 key pair.
    Keygen(KeygenArgs),

    /// Sign a commitment hash with a private key.
    Sign(SignArgs),

    /// Compute the Merkle commitment over an attribute file.
    Commit(CommitArgs),

    /// Build a selective-disclosure proof.
    Prove(ProveArgs),

    /// Verify a selective-disclosure proof against a commitment.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Sign(args) => run_sign(args),
        Commands::Commit(args) => run_commit(args),
        Commands::Prove(args) => run_prove(args),
        Commands::Verify(args) => run_verify(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
