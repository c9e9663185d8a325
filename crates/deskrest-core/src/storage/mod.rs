mod config;
pub mod database;
pub mod snapshot;

pub use config::{AlertsConfig, Config, TimerConfig};
pub use database::Database;
pub use snapshot::TimerSnapshot;

use std::path::PathBuf;

/// Returns `~/.config/deskrest[-dev]/` based on DESKREST_ENV.
///
/// Set DESKREST_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DESKREST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("deskrest-dev")
    } else {
        base_dir.join("deskrest")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
