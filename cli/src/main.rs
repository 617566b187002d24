// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # BTM Offline Signer
//!
//! Entry point for the `btm-signer` binary. Parses CLI arguments,
//! initializes logging and runs one command:
//!
//! - `build`   — build, price and sign a transaction from a JSON request
//! - `decode`  — parse raw transaction hex and recompute its id
//! - `version` — print build version information

mod cli;
mod logging;
mod request;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use btm_offline::config::FEE_ASSET_ID;

use cli::{Commands, SignerCli};
use request::{BuildReport, BuildRequest};

fn main() -> Result<()> {
    let cli = SignerCli::parse();

    match cli.command {
        Commands::Build(args) => {
            logging::init_logging("btm_signer=info,btm_offline=info", cli.log_format.into());
            run_build(args)
        }
        Commands::Decode(args) => {
            logging::init_logging("btm_signer=info,btm_offline=warn", cli.log_format.into());
            let report = request::decode(&args.hex)?;
            print_json(&report)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn run_build(args: cli::BuildArgs) -> Result<()> {
    let schedule = request::load_fee_schedule(args.fee_schedule.as_deref())?;
    let request = BuildRequest::from_file(&args.request)?;

    tracing::info!(
        request = %args.request.display(),
        inputs = request.inputs.len(),
        outputs = request.outputs.len(),
        "building transaction"
    );

    let tx = request.build(&schedule)?;

    tracing::info!(
        tx_id = %tx.tx_id(),
        fee = tx.fee(),
        size = tx.size(),
        "transaction signed"
    );

    if args.full {
        print_json(&tx)
    } else {
        print_json(&BuildReport::from(&tx))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("btm-signer {}", env!("CARGO_PKG_VERSION"));
    println!("fee asset  {}", FEE_ASSET_ID);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
