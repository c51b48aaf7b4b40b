// src/infra/paths.rs - XDG-compliant path management
//
// All paths respect the KARMABOT_HOME environment variable for isolation.
// When KARMABOT_HOME is set, config and data live under that directory.
// When unset, config uses ~/.karmabot/ and data uses XDG_DATA_HOME/karmabot.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the KARMABOT_HOME override, if set.
fn karmabot_home() -> Option<PathBuf> {
    std::env::var_os("KARMABOT_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when no home can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $KARMABOT_HOME/ or ~/.karmabot/
pub fn config_dir() -> PathBuf {
    if let Some(home) = karmabot_home() {
        return home;
    }
    dirs_home().join(".karmabot")
}

/// Data directory: $KARMABOT_HOME/data/ or ~/.local/share/karmabot/
pub fn data_dir() -> PathBuf {
    if let Some(home) = karmabot_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "karmabot") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Default karma ledger location
pub fn ledger_path() -> PathBuf {
    data_dir().join("karma.db")
}

/// Default directory snapshot location
pub fn directory_snapshot_path() -> PathBuf {
    data_dir().join("directory.json")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure the directories we write into exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    for dir in [config_dir(), data_dir()] {
        tokio::fs::create_dir_all(&dir).await?;
    }
    Ok(())
}
