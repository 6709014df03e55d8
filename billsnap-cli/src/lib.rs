//! Command-line host for the BillSnap license gate.
//!
//! Builds one [`LicenseManager`] over a file store and drives it from
//! subcommands. The process exit status plays the role of the gate: success
//! means the application may be shown, failure means it stays locked.

use anyhow::{Context, Result};
use billsnap_license::{
    FileStore, LicenseConfig, LicenseError, LicenseManager, LicenseStatus, RemoteValidator,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_VALIDATION_URL, STORAGE_KEY, TRIAL_LIMIT,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Data directory name under the platform data dir.
pub const APP_NAME: &str = "billsnap";

#[derive(Parser, Debug)]
#[command(name = "billsnap")]
#[command(about = "BillSnap license gate")]
pub struct Args {
    /// Directory holding the license record (defaults to the platform data dir)
    #[arg(long, env = "BILLSNAP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Invoices allowed before a license is required (0 disables the trial)
    #[arg(long, env = "BILLSNAP_TRIAL_LIMIT", default_value_t = TRIAL_LIMIT)]
    pub trial_limit: u32,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the gate status
    Status,
    /// Show details of the activated license as JSON
    Info,
    /// Check a key's format without activating it
    Validate {
        key: String,
    },
    /// Activate a license key
    Activate {
        key: String,

        /// Validate against the remote licensing endpoint instead of offline
        #[arg(long)]
        online: bool,

        /// Remote validation endpoint
        #[arg(long, env = "BILLSNAP_VALIDATION_URL", default_value = DEFAULT_VALIDATION_URL)]
        validation_url: String,

        /// Instance name sent to the endpoint (defaults to the hostname)
        #[arg(long, env = "BILLSNAP_INSTANCE_NAME")]
        instance_name: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// Count one invoice against the trial if the gate is open
    RecordInvoice,
    /// Remove the activated license
    Deactivate,
    /// Print a key that passes offline validation
    SampleKey,
}

/// Whether the application may be shown after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Locked,
}

impl Args {
    /// Maps arguments onto the library configuration.
    #[must_use]
    pub fn config(&self) -> LicenseConfig {
        let mut config = LicenseConfig {
            trial_limit: self.trial_limit,
            ..LicenseConfig::default()
        };
        if let Command::Activate {
            validation_url,
            instance_name,
            timeout,
            ..
        } = &self.command
        {
            config.validation_url = validation_url.clone();
            config.instance_name = instance_name.clone();
            config.request_timeout_secs = *timeout;
        }
        config
    }

    /// Opens the file store in `--data-dir` or the platform data dir.
    pub fn open_store(&self) -> Result<FileStore> {
        match &self.data_dir {
            Some(dir) => Ok(FileStore::new(dir, STORAGE_KEY)),
            None => FileStore::in_data_dir(APP_NAME, STORAGE_KEY)
                .context("Failed to locate license storage"),
        }
    }
}

/// Runs one command, writing user-facing output to `out`.
pub async fn run(args: Args, out: &mut impl Write) -> Result<Gate> {
    let config = args.config();
    let store = args.open_store()?;
    let mut manager =
        LicenseManager::new(config, store).context("Failed to load license state")?;

    let sample_key = manager.generate_sample_key();
    info!("Sample license key: {}", sample_key);
    info!(status = ?manager.status(), "License status");

    match args.command {
        Command::Status => {
            let status = manager.status();
            write_status(out, &status)?;
            Ok(gate_for(&status))
        }
        Command::Info => {
            let info = serde_json::to_string_pretty(&manager.license_info())?;
            writeln!(out, "{info}")?;
            Ok(gate_for(&manager.status()))
        }
        Command::Validate { key } => {
            if manager.validate_key(&key) {
                writeln!(out, "valid")?;
                Ok(Gate::Open)
            } else {
                writeln!(out, "invalid")?;
                Ok(Gate::Locked)
            }
        }
        Command::Activate { key, online, .. } => {
            let result = if online {
                let validator = RemoteValidator::new(manager.config())?;
                manager.activate_license_online(&validator, &key).await
            } else {
                manager.activate_license(&key)
            };
            writeln!(out, "{}", result.message)?;
            Ok(if result.success { Gate::Open } else { Gate::Locked })
        }
        Command::RecordInvoice => match manager.record_invoice() {
            Ok(Some(remaining)) => {
                writeln!(out, "Invoice recorded. {remaining} trial invoices remaining.")?;
                Ok(Gate::Open)
            }
            Ok(None) => {
                writeln!(out, "Invoice recorded.")?;
                Ok(Gate::Open)
            }
            Err(e @ LicenseError::TrialExhausted { .. }) => {
                writeln!(out, "{}", e.user_message())?;
                Ok(Gate::Locked)
            }
            Err(e) => Err(e).context("Failed to record invoice"),
        },
        Command::Deactivate => {
            manager.deactivate().context("Failed to deactivate license")?;
            writeln!(out, "License deactivated.")?;
            write_status(out, &manager.status())?;
            Ok(gate_for(&manager.status()))
        }
        Command::SampleKey => {
            writeln!(out, "{sample_key}")?;
            Ok(Gate::Open)
        }
    }
}

fn gate_for(status: &LicenseStatus) -> Gate {
    if status.can_create {
        Gate::Open
    } else {
        Gate::Locked
    }
}

fn write_status(out: &mut impl Write, status: &LicenseStatus) -> Result<()> {
    if status.is_licensed {
        writeln!(out, "Licensed")?;
    } else {
        let remaining = status.remaining.unwrap_or(0);
        writeln!(
            out,
            "Trial: {remaining}/{} invoices remaining",
            status.trial_limit
        )?;
    }
    writeln!(out, "Invoices created: {}", status.invoices_created)?;
    Ok(())
}
