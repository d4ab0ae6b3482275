//! Init command implementation

use anyhow::{bail, Result};
use tracing::info;

use motikoc::Config;

use super::{Options, Session};

/// Write a default configuration and create the database.
/// By default the config goes to ~/.motikoc/config.toml; use --config for another path.
pub fn init_command(options: &Options, force: bool) -> Result<()> {
    let config_path = options
        .config
        .clone()
        .unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = Config::default();
    config.database.path = options.db.clone();
    config.save_to_file(&config_path)?;
    println!("Created: {}", config_path.display());

    let session = Session::open(&Options {
        config: Some(config_path),
        db: options.db.clone(),
    })?;
    let db_path = session.store.pool().path().display().to_string();
    info!(path = %db_path, "Initialized database");
    println!("Database: {db_path}");

    Ok(())
}
