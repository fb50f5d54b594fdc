//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the API server with its flow configuration.

use crate::cli::actions::{Action, server::Args};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(4173);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let frontend_url = matches
        .get_one::<String>("frontend-url")
        .cloned()
        .unwrap_or_else(|| "http://localhost:5173".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_url,
        otp_ttl_seconds: matches.get_one::<i64>("otp-ttl").copied().unwrap_or(60),
        binding_grace_seconds: matches
            .get_one::<i64>("binding-grace")
            .copied()
            .unwrap_or(300),
        token_ttl_seconds: matches.get_one::<i64>("token-ttl").copied().unwrap_or(900),
    }))
}
