mod config_commands;
mod discover_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    plinth_config::Settings,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "plinth", about = "Plinth plugin discovery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover plugins and report which module specs are enabled.
    Discover(discover_commands::DiscoverArgs),
    /// Print the configuration built from the settings.
    Config(config_commands::ConfigArgs),
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `--json` output stays parseable.
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

/// Settings from `path` when given, otherwise from the standard locations.
fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Ok(plinth_config::load_settings(path)?),
        None => Ok(plinth_config::discover_settings()),
    }
}

/// Shared `--settings` option.
#[derive(clap::Args)]
struct SettingsArg {
    /// Settings file (plinth.toml, .yaml, .yml or .json). Defaults to the
    /// first one found in ./ or ~/.config/plinth/.
    #[arg(long, short = 's', env = "PLINTH_SETTINGS")]
    settings: Option<PathBuf>,
}

impl SettingsArg {
    fn load(&self) -> anyhow::Result<Settings> {
        load_settings(self.settings.as_deref())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "plinth starting");

    match cli.command {
        Commands::Discover(args) => discover_commands::handle_discover(args).await,
        Commands::Config(args) => config_commands::handle_config(args),
    }
}
