mod dispatch_commands;
mod middleware_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    switchyard_middleware::{PipelineManager, bundled::EventLogMiddleware, register_bundled},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "switchyard", about = "Switchyard: middleware pipeline for chat events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of switchyard.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "SWITCHYARD_CONFIG")]
    config: Option<PathBuf>,
    /// Custom data directory (overrides default ~/.switchyard/).
    #[arg(long, global = true, env = "SWITCHYARD_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered middleware with effective order and state.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Persist an order/enabled override for one middleware.
    Set {
        /// Middleware name.
        name: String,
        /// New order (defaults to the current effective order).
        #[arg(long, allow_negative_numbers = true)]
        order: Option<i32>,
        /// Disable the middleware instead of enabling it.
        #[arg(long)]
        disable: bool,
    },
    /// Drop every persisted override.
    Reset,
    /// Push one event through a freshly loaded pipeline.
    Dispatch {
        /// Channel to dispatch on: incoming or outgoing.
        #[arg(long, default_value = "incoming")]
        channel: String,
        /// Event record as JSON, e.g. '{"type":"text","platform":"web","text":"hi"}'.
        #[arg(long)]
        event: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load config, open the customization store and register the bundled
/// middleware. The pipeline is not loaded yet.
fn build_manager(cli: &Cli) -> anyhow::Result<PipelineManager> {
    if let Some(ref dir) = cli.data_dir {
        switchyard_config::set_data_dir(dir.clone());
    }
    let config = match cli.config {
        Some(ref path) => switchyard_config::load_config(path)?,
        None => switchyard_config::discover_and_load(),
    };

    let manager = PipelineManager::from_config(config)?;
    let log_path = EventLogMiddleware::default_path(&manager.host_context().data_dir);
    let registered = register_bundled(&manager, log_path);
    debug!(registered, "bundled middleware registered");
    Ok(manager)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "switchyard starting");

    let manager = build_manager(&cli)?;

    match cli.command {
        Commands::List { json } => middleware_commands::list(&manager, json),
        Commands::Set {
            name,
            order,
            disable,
        } => middleware_commands::set(&manager, &name, order, !disable),
        Commands::Reset => middleware_commands::reset(&manager),
        Commands::Dispatch { channel, event } => {
            dispatch_commands::dispatch(&manager, &channel, &event).await
        },
    }
}
