//! sa-key-rotator CLI.
//!
//! `rotate` reconciles the keys of one service account and exits;
//! `server` accepts rotation requests over HTTP until stopped.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use sa_key_rotator::{
    logging, CancellationToken, Endpoints, RotationConfig, RotationReport, Rotator,
    DEFAULT_EXPIRY_DAYS, DEFAULT_LABEL, DEFAULT_RENEWAL_WINDOW_DAYS,
};
use sa_key_rotator_server::{port_from_env, serve, shutdown_signal};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Rotate user-managed service account keys and publish the new ones to a
/// storage bucket.
#[derive(Parser, Debug)]
#[command(name = "sa-key-rotator", version, about = "Service account key rotator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rotate the keys of a single service account
    Rotate(RotateArgs),

    /// Serve rotation requests over HTTP (port from PORT, default 8080)
    Server,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
struct RotateArgs {
    /// Label identifying the keys this tool manages
    #[arg(long, default_value = DEFAULT_LABEL)]
    name: String,

    /// Email of the service account
    #[arg(long)]
    service_account: String,

    /// Bucket receiving the new credentials
    #[arg(long)]
    bucket: String,

    /// Number of days a key is valid for
    #[arg(long, default_value_t = DEFAULT_EXPIRY_DAYS)]
    days: i64,

    /// Span of days at the end of a key's validity in which it is rotated
    #[arg(long, default_value_t = DEFAULT_RENEWAL_WINDOW_DAYS)]
    window: i64,

    /// Upload a new key even when the current one is still fresh
    #[arg(long)]
    force_create: bool,

    /// Delete every key carrying the label, expired or not
    #[arg(long)]
    force_delete: bool,
}

impl RotateArgs {
    fn into_config(self) -> RotationConfig {
        RotationConfig::new(self.service_account, self.bucket)
            .label(self.name)
            .expiry_days(self.days)
            .renewal_window_days(self.window)
            .force_create(self.force_create)
            .force_delete(self.force_delete)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn cmd_rotate(args: RotateArgs) -> Result<()> {
    let cfg = args.into_config();
    cfg.validate()?;

    let rotator = Rotator::google(&Endpoints::from_env()).context("error creating the rotator")?;

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
    };
    let outcome = rotator.rotate(&cfg, &cancel).await;
    watcher.abort();

    let report = outcome.context("error rotating keys")?;
    print_report(&cfg, &report);
    Ok(())
}

async fn cmd_server() -> Result<()> {
    let port = port_from_env()?;
    let rotator = Rotator::google(&Endpoints::from_env()).context("error creating the rotator")?;
    serve(rotator, port).await?;
    tracing::info!("server stopped");
    Ok(())
}

fn print_report(cfg: &RotationConfig, report: &RotationReport) {
    if let Some(uploaded) = &report.uploaded {
        println!(
            "uploaded key {} (valid until {}), credentials at gs://{}/{}",
            uploaded.key_id,
            uploaded.valid_before.format("%Y-%m-%d"),
            cfg.bucket,
            uploaded.object_name
        );
    }
    for name in &report.deleted {
        println!("deleted key {name}");
    }
    for name in &report.failed_deletions {
        println!("failed to delete key {name}");
    }
    if report.is_noop() {
        println!("nothing to do for {}", cfg.identity_email);
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Rotate(args) => cmd_rotate(args).await,
        Commands::Server => cmd_server().await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
