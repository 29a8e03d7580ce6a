//! `packhost`: upload one resource pack with the configured provider.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use packhost_hosting::{ProviderRegistry, ProviderResolver};
use packhost_upload::{Settings, StandaloneHost, UploadEvent, UploadManager};

/// Upload a generated resource pack and print its public URL.
#[derive(Parser, Debug)]
#[command(name = "packhost", version, about)]
struct Cli {
    /// Pack archive to upload.
    artifact: PathBuf,

    /// Settings file.
    #[arg(short, long, default_value = "packhost.json")]
    config: PathBuf,

    /// Mark a host integration as active (repeatable).
    #[arg(long = "integration", value_name = "NAME")]
    integrations: Vec<String>,

    /// Seconds to wait for the upload to finish.
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Upload even if `upload.enabled` is false in the settings file.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,packhost=debug")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if cli.force {
        settings.upload.enabled = true;
    }
    if !settings.upload.enabled {
        tracing::warn!("uploads are disabled, set upload.enabled or pass --force");
        return Ok(());
    }
    if !cli.artifact.is_file() {
        bail!("artifact not found: {}", cli.artifact.display());
    }

    let host = cli
        .integrations
        .iter()
        .fold(StandaloneHost::new(), |host, name| host.with_integration(name.as_str()));
    let host = Arc::new(host);

    let resolver = ProviderResolver::new(ProviderRegistry::new());
    let manager = UploadManager::new(settings, &resolver, host)
        .context("hosting provider could not be set up")?;
    let mut events = manager
        .take_events()
        .context("upload event stream already taken")?;

    manager.upload(&cli.artifact);

    let outcome = tokio::time::timeout(Duration::from_secs(cli.timeout), async {
        while let Some(event) = events.recv().await {
            match event {
                UploadEvent::Uploading => continue,
                UploadEvent::Uploaded { url, delay_ms } => return Some((url, delay_ms)),
                UploadEvent::NotUploaded => return None,
            }
        }
        None
    })
    .await
    .context("upload timed out")?;

    let Some((url, delay_ms)) = outcome else {
        bail!(
            "{}",
            UploadEvent::NotUploaded.render(&manager.settings().messages)
        );
    };

    tracing::debug!(url = %url, delay_ms, "upload finished");
    println!("{url}");
    if manager.settings().send.wants_sender() {
        // The sender is registered by the worker right after "uploaded".
        for _ in 0..100 {
            if manager.sender().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
    if let Some(sender) = manager.sender() {
        if let Some(offer) = sender.offer() {
            tracing::info!(
                variant = ?sender.variant(),
                hash = offer.hash.as_deref().unwrap_or("-"),
                mandatory = offer.mandatory,
                "pack offer ready"
            );
        }
        if let Some(message) = sender.join_message() {
            println!("{message}");
        }
    }
    Ok(())
}
