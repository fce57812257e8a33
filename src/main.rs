//! Reposter - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use reposter::{
    browser::{Browser, BrowserDeps},
    cli::Args,
    config::{validate_browsers, validate_config, Config},
    download::{DownloadManager, HttpFetcher},
    error::{exit_codes, Error, Result},
    feed::RedditClient,
    output::{
        print_banner, print_browser_stats, print_config_summary, print_error, print_info,
        print_success, print_warning,
    },
    shutdown::install_signal_handler,
    stats::StatsRecorder,
    store::{KeyValueStore, MemoryStore},
    transport::TelegramTransport,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Storage(_) => ExitCode::from(exit_codes::STORAGE_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let report_only = args.report;
    let write_config = args.write_config;
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            config_path.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    if write_config {
        validate_browsers(&config.browsers)?;
        config.save(&config_path)?;
        print_success(&format!("Configuration written to {}", config_path.display()));
        return Ok(());
    }

    // Open the store
    let store = Arc::new(match &config.storage.snapshot_path {
        Some(path) => MemoryStore::open(path).await?,
        None => MemoryStore::new(),
    });

    if report_only {
        validate_browsers(&config.browsers)?;
        print_report(&config, store).await?;
        return Ok(());
    }

    // Validate configuration
    validate_config(&config)?;

    let snapshot = config
        .storage
        .snapshot_path
        .as_ref()
        .map(|p| p.display().to_string());
    print_config_summary(&config.browsers, snapshot.as_deref());

    // Collaborators shared by every browser
    let feed = Arc::new(RedditClient::new(
        &config.reddit.user_agent,
        &config.reddit.api_base,
    )?);
    let downloader = DownloadManager::new(Arc::new(HttpFetcher::new(&config.reddit.user_agent)?));
    let transport = Arc::new(TelegramTransport::new(
        &config.telegram.bot_token,
        &config.telegram.api_base,
    )?);

    let token = install_signal_handler();

    // Start one browser per entry
    let mut browsers = Vec::with_capacity(config.browsers.len());
    for entry in &config.browsers {
        let deps = BrowserDeps::new(
            feed.clone(),
            transport.clone(),
            store.clone(),
            downloader.clone(),
        );

        match Browser::start(entry.browser_config(), deps).await {
            Ok(browser) => {
                print_info(&format!("Browsing r/{} for {}", entry.feed, entry.channel));
                browsers.push((entry, browser));
            }
            Err(e) => print_error(&format!("Failed to start r/{}: {}", entry.feed, e)),
        }
    }

    if browsers.is_empty() {
        transport.shutdown().await;
        return Err(Error::Config("No browser could be started".into()));
    }

    print_success("Running. Press Ctrl+C to stop.");
    token.cancelled().await;

    // Stop browsers before the transport so no upload is queued after it closes
    for (_, browser) in &browsers {
        browser.stop().await;
    }
    transport.shutdown().await;

    for (entry, browser) in &browsers {
        match browser.stats().await {
            Ok(stats) => print_browser_stats(&entry.feed, &entry.channel, &stats),
            Err(e) => print_warning(&format!("Statistics for r/{} unavailable: {}", entry.feed, e)),
        }
    }

    store.flush().await?;

    Ok(())
}

/// Print the stored statistics of every configured browser.
async fn print_report(config: &Config, store: Arc<MemoryStore>) -> Result<()> {
    let store: Arc<dyn KeyValueStore> = store;

    for entry in &config.browsers {
        let prefix = entry.browser_config().key_prefix();
        let stats = StatsRecorder::new(store.clone(), &prefix).snapshot().await?;
        print_browser_stats(&entry.feed, &entry.channel, &stats);
    }

    Ok(())
}
