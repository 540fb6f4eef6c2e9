//! CLI entry point for the train tracker.
//!
//! `serve` keeps a live snapshot of the feed and exposes it over HTTP for the
//! map renderer. `snapshot` runs a single refresh cycle against a URL or a
//! captured `.pb` file and prints the result.

use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use train_tracker::api::{self, AppState};
use train_tracker::config::{
    Config, DEFAULT_CLIENT_NAME, DEFAULT_FEED_URL, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MIN_REQUEST_INTERVAL_SECS, DEFAULT_MOVING_SPEED_THRESHOLD,
    DEFAULT_REFRESH_INTERVAL_SECS, MapCenter,
};
use train_tracker::fetch::{BasicClient, FeedClient, FeedHeaders, FileFeed, HttpFeed};
use train_tracker::output::{print_list, print_pretty, write_json};
use train_tracker::query::query;
use train_tracker::scheduler::{CycleOutcome, Scheduler, Trigger};
use train_tracker::snapshot::SnapshotStore;

#[derive(Parser)]
#[command(name = "train_tracker")]
#[command(about = "Live GTFS-RT train positions for a map and list view", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FeedArgs {
    /// GTFS-RT vehicle positions endpoint
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// Whole-request timeout for one feed fetch
    #[arg(long, env = "FETCH_TIMEOUT_SECONDS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    fetch_timeout_seconds: u64,

    /// Speed (m/s) above which a train counts as moving
    #[arg(long, env = "MOVING_SPEED_THRESHOLD", default_value_t = DEFAULT_MOVING_SPEED_THRESHOLD)]
    moving_speed_threshold: f64,

    /// Client identifier sent to the feed provider
    #[arg(long, env = "CLIENT_NAME", default_value = DEFAULT_CLIENT_NAME)]
    client_name: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed and serve the current snapshot over HTTP
    Serve {
        #[command(flatten)]
        feed: FeedArgs,

        /// Seconds between scheduled refreshes
        #[arg(short = 'r', long, env = "REFRESH_INTERVAL_SECONDS", default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
        refresh_interval_seconds: u64,

        /// Minimum seconds between two feed requests (0 disables)
        #[arg(long, env = "MIN_REQUEST_INTERVAL_SECONDS", default_value_t = DEFAULT_MIN_REQUEST_INTERVAL_SECS)]
        min_request_interval_seconds: u64,

        /// Initial map latitude handed to the renderer
        #[arg(long, env = "MAP_CENTER_LAT", default_value_t = MapCenter::default().lat)]
        map_center_lat: f64,

        /// Initial map longitude handed to the renderer
        #[arg(long, env = "MAP_CENTER_LON", default_value_t = MapCenter::default().lon)]
        map_center_lon: f64,

        /// Address for the HTTP server
        #[arg(short, long, env = "BIND_ADDR", default_value = "127.0.0.1:8050")]
        bind: SocketAddr,
    },
    /// Run one refresh cycle and print the resulting vehicles
    Snapshot {
        /// Path to a captured feed file or URL to fetch (defaults to --feed-url)
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        #[command(flatten)]
        feed: FeedArgs,

        /// Only list the train with exactly this id
        #[arg(long)]
        id: Option<String>,

        /// Print JSON to stdout instead of a log listing
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl FeedArgs {
    fn into_config(self) -> Config {
        Config {
            feed_url: self.feed_url,
            fetch_timeout_seconds: self.fetch_timeout_seconds,
            moving_speed_threshold: self.moving_speed_threshold,
            client_name: self.client_name,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/train_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("train_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            feed,
            refresh_interval_seconds,
            min_request_interval_seconds,
            map_center_lat,
            map_center_lon,
            bind,
        } => {
            let config = Config {
                refresh_interval_seconds,
                min_request_interval_seconds,
                map_center: MapCenter {
                    lat: map_center_lat,
                    lon: map_center_lon,
                },
                ..feed.into_config()
            };
            serve(config, bind).await?;
        }
        Commands::Snapshot {
            source,
            feed,
            id,
            json,
        } => {
            let mut config = feed.into_config();
            if let Some(source) = source {
                config.feed_url = source;
            }
            snapshot(config, id.as_deref(), json).await?;
        }
    }

    Ok(())
}

/// Builds the feed client for `config.feed_url`: HTTP for URLs, otherwise a
/// local file.
fn feed_client(config: &Config) -> Result<Arc<dyn FeedClient>> {
    if config.feed_url.starts_with("http") {
        let basic = BasicClient::new(config.fetch_timeout())
            .context("Failed to build HTTP client")?;
        let client = FeedHeaders::new(basic, &config.client_name)
            .context("Client name is not a valid header value")?;
        Ok(Arc::new(HttpFeed::new(client, config.feed_url.clone())))
    } else {
        Ok(Arc::new(FileFeed::new(&config.feed_url)))
    }
}

/// Runs the refresh loop and HTTP server until Ctrl-C.
#[tracing::instrument(skip(config), fields(feed_url = %config.feed_url))]
async fn serve(config: Config, bind: SocketAddr) -> Result<()> {
    config.validate()?;

    let store = Arc::new(SnapshotStore::new());
    let scheduler = Scheduler::new(feed_client(&config)?, Arc::clone(&store), &config);
    let (refresh, refresh_task) = scheduler.spawn();

    let state = AppState {
        store,
        refresh,
        map_center: config.map_center,
        refresh_interval_seconds: config.refresh_interval_seconds,
    };

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    api::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
        info!("Shutdown requested");
    })
    .await
    .context("HTTP server failed")?;

    refresh_task.abort();
    info!("Stopped");
    Ok(())
}

/// Runs one cycle and prints what a renderer would receive.
#[tracing::instrument(skip(config), fields(source = %config.feed_url))]
async fn snapshot(config: Config, id: Option<&str>, json: bool) -> Result<()> {
    config.validate()?;

    let store = Arc::new(SnapshotStore::new());
    let scheduler = Scheduler::new(feed_client(&config)?, Arc::clone(&store), &config);

    match scheduler.run_cycle(Trigger::Manual).await {
        CycleOutcome::Committed { records, stats } => {
            info!(
                records,
                entities = stats.total_entities,
                dropped = stats.dropped_without_position,
                speed_pct = stats.speed_pct(),
                bearing_pct = stats.bearing_pct(),
                "Feed processed"
            );
        }
        CycleOutcome::Failed(err) => bail!("Refresh failed: {err}"),
        CycleOutcome::Coalesced => bail!("Refresh did not run"),
    }

    let result = query(&store.current(), id);
    if json {
        write_json(std::io::stdout().lock(), &result)?;
    } else {
        print_pretty(&result);
        print_list(&result);
    }
    Ok(())
}
