//! cli::commands::config
//!
//! Show, and optionally save, the effective configuration.

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::config::Config;
use crate::ui::output;

/// Run the config command.
pub fn config(ctx: &Context, write: bool) -> Result<()> {
    let config = &ctx.config;

    let source = config
        .loaded_from()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());
    let lines = [
        format!("config file: {}", source),
        format!("data_dir: {}", config.data_dir().display()),
        format!("store_file: {}", config.store_file().display()),
        format!("author: {}", config.author()),
        format!("relay.addr: {}", config.relay_addr()?),
    ];
    output::print(lines.join("\n"), ctx.verbosity);

    if write {
        let path = match config.loaded_from() {
            Some(path) => path.to_path_buf(),
            None => Config::default_config_path()?,
        };
        Config::write(&path, &config.file)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        output::print(format!("Wrote {}", path.display()), ctx.verbosity);
    }

    Ok(())
}
