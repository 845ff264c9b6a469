//! TerraBot View
//!
//! Usage: `terrabot-view [cad|sim|--config <path>]`

use anyhow::{bail, Result};
use terrabot_view::{launch_viewer, ViewerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn config_from_args(args: &[String]) -> Result<ViewerConfig> {
    match args.first().map(String::as_str) {
        None => Ok(ViewerConfig::load_or_default()?),
        Some("cad") => Ok(ViewerConfig::for_cad_viewer()),
        Some("sim") => Ok(ViewerConfig::for_simulator()),
        Some("--config") => match args.get(1) {
            Some(path) => Ok(ViewerConfig::load(path)?),
            None => bail!("--config needs a path"),
        },
        Some(other) => bail!("unknown argument {other:?}; expected cad, sim or --config <path>"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("TerraBot View v{}", terrabot_view::VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = config_from_args(&args)?;
    tracing::info!("Showing {:?}", config.viewport.layout);

    launch_viewer(config)
}
