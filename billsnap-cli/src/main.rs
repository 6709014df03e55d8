//! BillSnap license gate.
//!
//! Usage:
//!   billsnap status
//!   billsnap activate BILLSNAP-XXXX-XXXX-XXXX-XXXX
//!   billsnap activate --online <KEY>
//!
//! Exits non-zero while the application is locked.

use std::process::ExitCode;

use anyhow::Result;
use billsnap_cli::{run, Args, Gate};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut stdout = std::io::stdout().lock();
    match run(args, &mut stdout).await? {
        Gate::Open => Ok(ExitCode::SUCCESS),
        Gate::Locked => Ok(ExitCode::FAILURE),
    }
}
