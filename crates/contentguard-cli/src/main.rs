//! ContentGuard CLI
//!
//! Loads a YAML service configuration, runs content through the staged
//! filter, and prints the decision as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use contentguard_core::{ContentType, FilterLevel, ModerationContext};
use contentguard_filter::{ContentFilterService, ServiceConfig};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    contentguard_telemetry::describe_metrics();

    match cli.command {
        Commands::Check {
            config,
            content_type,
            level,
            api_key,
            timeout,
            fail_on_block,
            content,
        } => {
            let blocked = check(
                &config,
                content_type,
                level,
                api_key,
                Duration::from_secs(timeout),
                &content,
            )
            .await?;
            if blocked && fail_on_block {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { config } => {
            validate(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Returns true if the content was blocked
async fn check(
    config_path: &Path,
    content_type: ContentType,
    level: Option<FilterLevel>,
    api_key: Option<String>,
    timeout: Duration,
    content: &str,
) -> Result<bool> {
    let mut config = load_config(config_path)?;
    if let Some(level) = level {
        config.level = level;
    }
    if let Some(api_key) = api_key {
        config.provider.api_key = api_key;
    }
    // Single-shot run; nothing to monitor
    config.monitor.enabled = false;

    let content = if content == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read content from stdin")?;
        buf
    } else {
        content.to_string()
    };

    let service = ContentFilterService::from_config(config)?;
    let ctx = ModerationContext::with_timeout(timeout);

    let outcome = service.filter(&ctx, &content, content_type).await;
    service.shutdown();
    let result = outcome.context("Content could not be analyzed")?;

    debug!(metrics = ?service.metrics(), "Filter finished");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(!result.is_clean)
}

fn validate(config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)?;
    let monitor_enabled = config.monitor.enabled;
    config.monitor.enabled = false;

    let provider = config.provider.provider_type;
    let level = config.level;
    let words = config.sensitive_words.len();
    let patterns = config.patterns.len();

    // Builds the provider and compiles every pattern without any network traffic
    let service = ContentFilterService::from_config(config)?;
    service.shutdown();

    info!("Configuration is valid");
    println!(
        "{}: provider={}, level={}, sensitive_words={}, patterns={}, monitor={}",
        config_path.display(),
        provider,
        level,
        words,
        patterns,
        if monitor_enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<ServiceConfig> {
    let config = ServiceConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

const LOG_TARGETS: [&str; 6] = [
    "contentguard",
    "contentguard_core",
    "contentguard_cache",
    "contentguard_telemetry",
    "contentguard_providers",
    "contentguard_filter",
];

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directives = |level: &str| {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    };

    let filter = if verbose {
        EnvFilter::new(directives("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info")))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
