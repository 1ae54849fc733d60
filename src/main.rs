use asset_grid::config::{AppConfig, Args};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("asset_grid=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_args(&args)?;
    info!(
        project = %config.project_root.display(),
        scope = %config.scope,
        prefs = %config.prefs_path.display(),
        "starting"
    );

    asset_grid::run_gui(config).map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}
