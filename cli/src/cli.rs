//! # CLI Interface
//!
//! Defines the command-line argument structure for `btm-signer` using
//! `clap` derive. Supports three subcommands: `build`, `decode`, and
//! `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Offline transaction signer.
///
/// Builds, prices and signs a transaction from a JSON request without
/// contacting a node, or decodes raw transaction hex.
#[derive(Parser, Debug)]
#[command(
    name = "btm-signer",
    about = "Offline BTM transaction builder and signer",
    version,
    propagate_version = true
)]
pub struct SignerCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log output format. Logs go to stderr; results go to stdout.
    #[arg(long, global = true, env = "BTM_SIGNER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormatArg,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and sign a transaction from a JSON request file.
    Build(BuildArgs),
    /// Decode raw transaction hex and print it as JSON.
    Decode(DecodeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Path to the build request (JSON).
    #[arg(long, short = 'r', env = "BTM_SIGNER_REQUEST")]
    pub request: PathBuf,

    /// Path to a fee schedule override (JSON). Missing fields keep their
    /// mainnet defaults.
    #[arg(long, env = "BTM_SIGNER_FEE_SCHEDULE")]
    pub fee_schedule: Option<PathBuf>,

    /// Print the full transaction (inputs and witnesses included) instead
    /// of the summary.
    #[arg(long)]
    pub full: bool,
}

/// Arguments for the `decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded raw transaction.
    pub hex: String,
}

/// Log format accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        SignerCli::command().debug_assert();
    }

    #[test]
    fn parses_build_with_overrides() {
        let cli = SignerCli::try_parse_from([
            "btm-signer",
            "--log-format",
            "json",
            "build",
            "--request",
            "req.json",
            "--fee-schedule",
            "fees.json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormatArg::Json);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.request, PathBuf::from("req.json"));
                assert_eq!(args.fee_schedule, Some(PathBuf::from("fees.json")));
                assert!(!args.full);
            }
            other => panic!("expected build, got {:?}", other),
        }
    }

    #[test]
    fn decode_takes_positional_hex() {
        let cli = SignerCli::try_parse_from(["btm-signer", "decode", "0701000000"]).unwrap();
        match cli.command {
            Commands::Decode(args) => assert_eq!(args.hex, "0701000000"),
            other => panic!("expected decode, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(
            SignerCli::try_parse_from(["btm-signer", "--log-format", "xml", "version"]).is_err()
        );
    }
}
