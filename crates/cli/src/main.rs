mod browser_commands;
mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    linkrelay_browser::{BrowserError, BrowserResolver},
    linkrelay_config::{BrowserConfig, RelayConfig},
    linkrelay_links::{BrowserFallback, LinkPipeline, LinkResolver, RedirectResolver, normalize},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "linkrelay", about = "Linkrelay: relay operator links to a Telegram channel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to ./linkrelay.toml, then the user config dir).
    #[arg(long, global = true, env = "LINKRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Load and validate the configuration, then print a redacted summary.
    CheckConfig,
    /// Resolve one URL the way the bot would and print the result.
    Resolve { url: String },
    /// Look for a Chrome/Chromium executable.
    DetectBrowser,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// File values (explicit path or discovery) with the environment on top.
fn load(cli: &Cli) -> anyhow::Result<RelayConfig> {
    let config = match &cli.config {
        Some(path) => linkrelay_config::load_config(path)?,
        None => linkrelay_config::discover_and_load(),
    };
    Ok(linkrelay_config::apply_env_overrides(config))
}

/// Probe once at startup. `None` means links are resolved over HTTP only.
fn probe_browser(config: &BrowserConfig) -> Option<Arc<dyn BrowserFallback>> {
    match BrowserResolver::probe(config) {
        Ok(resolver) => {
            info!(path = %resolver.executable().display(), "browser tier enabled");
            Some(Arc::new(resolver) as Arc<dyn BrowserFallback>)
        },
        Err(BrowserError::Disabled) => {
            info!("browser tier disabled in config");
            None
        },
        Err(e) => {
            warn!(error = %e, "browser tier unavailable, resolving over HTTP only");
            None
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "linkrelay starting");

    let config = load(&cli)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::CheckConfig => config_commands::check(cli.config.as_deref(), &config),
        Commands::Resolve { url } => resolve(&config, &url).await,
        Commands::DetectBrowser => browser_commands::detect(&config.browser),
    }
}

async fn run(config: RelayConfig) -> anyhow::Result<()> {
    if let Err(e) = linkrelay_config::validate(&config) {
        error!(error = %e, "configuration incomplete");
        return Err(e.into());
    }

    let browser = probe_browser(&config.browser);
    let resolver = RedirectResolver::new(&config.resolver, browser.clone())?;
    let pipeline = Arc::new(LinkPipeline::new(Arc::new(resolver)));

    let cancel = CancellationToken::new();
    let polling =
        linkrelay_telegram::start_polling(&config.telegram, pipeline, browser, cancel.clone())
            .await?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("interrupt received, shutting down");
        },
        () = cancel.cancelled() => info!("stop requested, shutting down"),
    }

    cancel.cancel();
    polling.await?;
    info!("linkrelay stopped");
    Ok(())
}

async fn resolve(config: &RelayConfig, url: &str) -> anyhow::Result<()> {
    let browser = probe_browser(&config.browser);
    let resolver = RedirectResolver::new(&config.resolver, browser)?;
    let resolution = resolver.resolve(url).await;

    println!("final_url:  {}", resolution.final_url);
    println!("method:     {}", resolution.method);
    println!("normalized: {}", normalize(&resolution.final_url));
    Ok(())
}
