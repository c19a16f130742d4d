use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use channel_archiver::config::Config;
use channel_archiver::discord::DiscordClient;
use channel_archiver::fetcher::HttpFetcher;
use channel_archiver::package::package_archive;
use channel_archiver::progress::LogProgress;
use channel_archiver::storage::LocalFs;
use channel_archiver::{archive_channel, Archiver};

/// Archive the full history of one or more channels.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Channel ids to archive, processed one after another.
    #[arg(required = true)]
    channels: Vec<String>,

    /// User on whose behalf the archive is made; checked against AUTHORIZED_USERS.
    #[arg(long)]
    requested_by: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let args = Args::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if let Some(user_id) = args.requested_by.as_deref() {
        if !config.is_authorized(user_id) {
            anyhow::bail!("You are not authorized to use this bot.");
        }
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;

    let discord = DiscordClient::new(&config).context("Failed to build Discord client")?;
    let fetcher = HttpFetcher::new(config.http_timeout).context("Failed to build HTTP client")?;
    let archiver = Archiver::new(&fetcher, &discord, &LocalFs);

    for channel_id in &args.channels {
        info!(channel_id = %channel_id, "Now processing channel");

        let root = config.output_dir.join(format!(
            "archive-{channel_id}-{}",
            chrono::Utc::now().timestamp_millis()
        ));
        let progress = LogProgress {
            channel_id: channel_id.clone(),
        };

        let archive = archive_channel(
            &discord.channel(channel_id),
            &archiver,
            root,
            Some(&progress),
        )
        .await
        .with_context(|| format!("Failed to archive channel {channel_id}"))?;

        if config.package_zip {
            let zip_path: PathBuf = config.output_dir.join(format!(
                "output-{}.zip",
                chrono::Utc::now().timestamp_millis()
            ));
            package_archive(&archive.path, &zip_path)
                .await
                .with_context(|| format!("Failed to package channel {channel_id}"))?;
            info!(channel_id = %channel_id, zip = %zip_path.display(), "Channel done");
        } else {
            info!(channel_id = %channel_id, path = %archive.path.display(), "Channel done");
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,channel_archiver=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
