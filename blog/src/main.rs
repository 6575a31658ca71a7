use std::path::PathBuf;

use anyhow::Context;
use backoffice_core::logging::setup_logging;
use blog::commands::default_registry;
use blog::config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = default_registry();
    let matches = registry.build_cli().get_matches();

    let config = matches.get_one::<PathBuf>("config");
    let settings = load_settings(config.map(PathBuf::as_path)).context("loading settings")?;
    setup_logging(&settings);

    registry.execute(&matches, &settings).await?;
    Ok(())
}
