//! Command-line arguments and their fallbacks.

use clap::Parser;
use marketflow::config::{DEFAULT_CONFIG_PATH, DEFAULT_DESCRIPTION_PATH};
use marketflow::description::amount::parse_amount;
use std::path::PathBuf;
use tracing::{info, warn};

/// Provisions a prediction market step by step from a market description.
#[derive(Debug, Parser)]
#[command(name = "marketflow", version, about)]
pub struct Cli {
    /// Path to the ledger configuration file
    #[arg(short = 'f', long = "config")]
    pub config: Option<String>,

    /// Path to the market description file
    #[arg(short = 'm', long = "market")]
    pub market: Option<String>,

    /// Amount of collateral base units to wrap before the run (e.g. 1e18)
    #[arg(short = 'w', long = "wrap", allow_hyphen_values = true)]
    pub wrap: Option<String>,

    /// Also resolve a provisioned market whose winning outcome is recorded
    #[arg(short = 'r', long)]
    pub resolve: bool,

    /// Run against the local sandbox ledger kept in this state file
    #[arg(long, value_name = "STATE_FILE")]
    pub sandbox: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments after fallbacks were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Ledger configuration file.
    pub config_path: PathBuf,
    /// Market description file.
    pub market_path: PathBuf,
    /// Collateral to wrap, if any.
    pub wrap_amount: Option<u128>,
    /// Sandbox ledger state file, if the sandbox was asked for.
    pub sandbox_path: Option<PathBuf>,
    /// Whether recorded outcomes are resolved.
    pub resolve: bool,
}

impl Cli {
    /// Applies defaults. Malformed values fall back with a warning.
    pub fn invocation(&self) -> Invocation {
        if self.config.is_none() && self.market.is_none() && self.wrap.is_none() {
            warn!("Running with default parameters");
        }
        Invocation {
            config_path: path_or_default(
                "-f",
                "configuration file",
                self.config.as_deref(),
                DEFAULT_CONFIG_PATH,
            ),
            market_path: path_or_default(
                "-m",
                "market file",
                self.market.as_deref(),
                DEFAULT_DESCRIPTION_PATH,
            ),
            wrap_amount: self.wrap.as_deref().and_then(wrap_amount),
            sandbox_path: self.sandbox.clone(),
            resolve: self.resolve,
        }
    }
}

fn path_or_default(flag: &str, what: &str, value: Option<&str>, default: &str) -> PathBuf {
    match value.map(str::trim) {
        Some(path) if !path.is_empty() => {
            info!("Using {what}: {path}");
            PathBuf::from(path)
        }
        Some(_) => {
            warn!("Invalid {flag} parameter, using default {what} {default}");
            PathBuf::from(default)
        }
        None => PathBuf::from(default),
    }
}

fn wrap_amount(value: &str) -> Option<u128> {
    match parse_amount(value) {
        Ok(0) | Err(_) => {
            warn!(value, "Invalid -w parameter, skipping tokens wrapping step");
            None
        }
        Ok(amount) => {
            info!("Asked to wrap {amount} tokens");
            Some(amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn invocation(args: &[&str]) -> Invocation {
        let argv = std::iter::once("marketflow").chain(args.iter().copied());
        Cli::parse_from(argv).invocation()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            invocation(&[]),
            Invocation {
                config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
                market_path: PathBuf::from(DEFAULT_DESCRIPTION_PATH),
                wrap_amount: None,
                sandbox_path: None,
                resolve: false,
            }
        );
    }

    #[test]
    fn test_explicit_values() {
        let inv = invocation(&["-f", "conf/prod.json", "-m", "markets/rain.json", "-w", "1e18"]);
        assert_eq!(inv.config_path, PathBuf::from("conf/prod.json"));
        assert_eq!(inv.market_path, PathBuf::from("markets/rain.json"));
        assert_eq!(inv.wrap_amount, Some(1_000_000_000_000_000_000));
    }

    #[test]
    fn test_blank_paths_fall_back() {
        let inv = invocation(&["-f", " ", "-m", ""]);
        assert_eq!(inv.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(inv.market_path, PathBuf::from(DEFAULT_DESCRIPTION_PATH));
    }

    #[test]
    fn test_invalid_wrap_is_skipped() {
        assert_eq!(invocation(&["-w", "lots"]).wrap_amount, None);
        assert_eq!(invocation(&["-w", "-5"]).wrap_amount, None);
        assert_eq!(invocation(&["-w", "0"]).wrap_amount, None);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["marketflow", "--yes", "-v"]);
        assert!(cli.yes);
        assert!(cli.verbose);
        assert!(!cli.resolve);
    }

    #[test]
    fn test_sandbox_and_resolve() {
        let inv = invocation(&["--sandbox", "conf/sandbox.json", "-r"]);
        assert_eq!(inv.sandbox_path, Some(PathBuf::from("conf/sandbox.json")));
        assert!(inv.resolve);
    }
}
