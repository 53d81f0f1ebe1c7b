//! `sms-smoke` binary: sends the request and prints `Status Code:` and
//! `Response:` lines. A transport failure exits non-zero.

mod cli;

use std::io;

use clap::Parser;
use sms_smoke::{Client, SmokeConfig, SmokeError};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SmokeError> {
    // Logs go to stderr; stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SMS_SMOKE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = SmokeConfig::from(cli::Cli::parse());
    let client = Client::new();
    let stdout = io::stdout();
    sms_smoke::run(&client, &config, &mut stdout.lock()).await
}
