//! Mixpeek Signals - contextual content signals for ad tech.
//!
//! Subcommands:
//! - `serve` - HTTP connector (analysis, OpenRTB, GAM, Prebid, products)
//! - `analyze` - analyze text, a URL or an HTML file once
//! - `map-product` - map a product to an IAB Ad Product category
//! - `health` - check the remote API

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use directories::ProjectDirs;
use mixpeek_app::commands::{self, AnalyzeInput, OutputFormat};
use mixpeek_app::{AppConfig, RemoteOptions};
use mixpeek_client::product::MapOptions;
use mixpeek_client::{ProductMapper, SignalEngine};
use mixpeek_core::product::mapper::MappingMode;
use mixpeek_core::{ContentInput, ProductInput};
use mixpeek_server::{AppState, Server};
use serde::Serialize;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Mixpeek Signals - contextual content signals for ad tech
#[derive(Parser, Debug)]
#[command(name = "mixpeek-signals", version, about)]
struct Args {
    /// JSON config file (analyzer, cache, server, products sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    remote: RemoteArgs,

    #[command(subcommand)]
    command: Command,
}

/// Remote API settings. Without an API key everything runs locally.
#[derive(ClapArgs, Debug)]
struct RemoteArgs {
    /// Mixpeek API key
    #[arg(long, global = true, env = "MIXPEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Collection that receives analyzed documents
    #[arg(long, global = true, env = "MIXPEEK_COLLECTION_ID")]
    collection_id: Option<String>,

    /// Namespace sent as X-Namespace-Id
    #[arg(long, global = true, env = "MIXPEEK_NAMESPACE")]
    namespace: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "MIXPEEK_ENDPOINT")]
    endpoint: Option<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Use the low-latency ad-serving preset (250 ms, one retry)
    #[arg(long, global = true)]
    realtime: bool,
}

impl RemoteArgs {
    fn options(&self) -> RemoteOptions {
        RemoteOptions {
            api_key: self.api_key.clone(),
            collection_id: self.collection_id.clone(),
            namespace: self.namespace.clone(),
            endpoint: self.endpoint.clone(),
            timeout_ms: self.timeout_ms,
            realtime: self.realtime,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP connector
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Analyze content once and print the result as JSON
    Analyze {
        /// Plain text
        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Page URL
        #[arg(long)]
        url: Option<String>,

        /// HTML file to extract content from
        #[arg(long)]
        html_file: Option<PathBuf>,

        /// Extra keywords, comma separated
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Output shape
        #[arg(long, value_enum, default_value_t = OutputFormat::Signals)]
        format: OutputFormat,
    },

    /// Map a product to an IAB Ad Product category
    MapProduct {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Merchant category, e.g. "Electronics > Phones"
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        /// Mapping mode (deterministic, semantic, hybrid)
        #[arg(long)]
        mode: Option<MappingMode>,

        /// Minimum confidence for a match
        #[arg(long)]
        min_confidence: Option<f32>,
    },

    /// Check the remote API
    Health,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "mixpeek", "mixpeek-signals").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation for the server.
///
/// One-shot commands log to stderr so stdout stays valid JSON.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    // Targets match by prefix, so this covers every mixpeek_* crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mixpeek={},warn", log_level)));

    if matches!(args.command, Command::Serve { .. }) {
        if let Some(log_dir) = logs_dir() {
            if std::fs::create_dir_all(&log_dir).is_ok() {
                // Rotates daily, keeps five files
                let file_appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .max_log_files(5)
                    .filename_prefix("mixpeek-signals")
                    .filename_suffix("log")
                    .build(&log_dir)
                    .ok();

                if let Some(appender) = file_appender {
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt::layer().with_writer(std::io::stdout))
                        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                        .init();

                    tracing::info!("Logging to {:?}", log_dir);
                    return Some(guard);
                }
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    None
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn serve(
    config: AppConfig,
    remote: RemoteOptions,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = host {
        server_config = server_config.with_host(host);
    }
    if let Some(port) = port {
        server_config = server_config.with_port(port);
    }

    let state = AppState::from_config(
        remote.client_config(),
        config.engine(),
        config.products.clone(),
    )
    .context("failed to build signal engine")?;
    tracing::info!(
        remote_enabled = state.engine.remote_enabled(),
        product_mode = state.products.mode().as_str(),
        "Signal engine ready"
    );

    let server = Server::with_state(server_config, state)?;
    server
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
            }
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep guard alive for the duration of the program
    let _log_guard = init_logging(&args);

    tracing::debug!("Args: {:?}", args);

    let config = AppConfig::load_or_default(args.config.as_deref())?;
    let remote = args.remote.options();

    match args.command {
        Command::Serve { host, port } => serve(config, remote, host, port).await?,

        Command::Analyze {
            text,
            title,
            description,
            url,
            html_file,
            keywords,
            format,
        } => {
            let html = match html_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let input = AnalyzeInput {
                content: ContentInput {
                    url: non_empty(url),
                    title: non_empty(title),
                    text: non_empty(text),
                    description: non_empty(description),
                    keywords,
                    ..ContentInput::default()
                },
                html,
            };
            if input.html.is_none() && input.content.is_empty() {
                anyhow::bail!("nothing to analyze: pass --text, --title, --url or --html-file");
            }

            let engine = SignalEngine::from_optional(remote.client_config(), config.engine())?;
            print_json(&commands::analyze(&engine, &input, format).await)?;
        }

        Command::MapProduct {
            title,
            description,
            category,
            brand,
            mode,
            min_confidence,
        } => {
            let product = ProductInput {
                title: non_empty(title),
                description: non_empty(description),
                category: non_empty(category),
                brand: non_empty(brand),
                ..ProductInput::default()
            };
            let options = MapOptions {
                mode,
                min_confidence,
                include_secondary: None,
            };

            let engine = SignalEngine::from_optional(remote.client_config(), config.engine())?;
            let mapper = ProductMapper::new(
                config.products.clone(),
                engine.client().cloned(),
                &config.cache,
            )?;
            print_json(&commands::map_product(&mapper, &product, &options).await?)?;
        }

        Command::Health => {
            let engine = SignalEngine::from_optional(remote.client_config(), config.engine())?;
            print_json(&commands::health(&engine).await)?;
        }
    }

    Ok(())
}
