// src/infra/config.rs - Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::{KarmaError, KarmaResult};
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub karma: KarmaConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KarmaConfig {
    /// Ledger database file. Defaults to `<data_dir>/karma.db`.
    pub db_path: Option<String>,
    /// Accept `nick++` in channel chatter that does not address the bot.
    pub unaddressed: bool,
    /// Accept `nick--` as well as `nick++`.
    pub allow_negative: bool,
    /// Shown in every successful vote reply.
    pub url: String,
    /// Append a JSON line per applied vote to this file.
    pub notify_path: Option<String>,
}

impl Default for KarmaConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            unaddressed: true,
            allow_negative: true,
            url: "https://badges.fedoraproject.org/badge/macaron-cookie-i".into(),
            notify_path: None,
        }
    }
}

impl KarmaConfig {
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::ledger_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Pin the release partition (e.g. "f40") instead of asking `url`.
    pub current: Option<String>,
    pub url: String,
    pub cache_ttl_secs: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            current: None,
            url: "https://pdc.fedoraproject.org/rest_api/v1/releases/\
                  ?active=true&name=Fedora&release_type=ga&fields=version&ordering=version"
                .into(),
            cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// JSON snapshot of account records. Defaults to `<data_dir>/directory.json`.
    pub path: Option<String>,
    pub refresh_interval_secs: u64,
    pub refresh_on_startup: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            refresh_interval_secs: 3600,
            refresh_on_startup: true,
        }
    }
}

impl DirectoryConfig {
    pub fn path(&self) -> PathBuf {
        self.path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::directory_snapshot_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Our own nick; lines starting with `<nick>:` or `<nick>,` are addressed to us.
    pub nick: String,
    /// A line starting with any of these characters is a command, e.g. `.karma dummy`.
    pub prefix_chars: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nick: "zodbot".into(),
            prefix_chars: ".".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the bot misbehave silently.
    pub fn validate(&self) -> KarmaResult<()> {
        if self.bot.nick.trim().is_empty() || self.bot.nick.contains(char::is_whitespace) {
            return Err(KarmaError::Config(format!(
                "bot.nick must be a single word, got {:?}",
                self.bot.nick
            )));
        }
        if self.directory.refresh_interval_secs == 0 {
            return Err(KarmaError::Config(
                "directory.refresh_interval_secs must be positive".into(),
            ));
        }
        if let Some(ref current) = self.release.current {
            if current.trim().is_empty() {
                return Err(KarmaError::Config("release.current is empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert!(c.karma.unaddressed);
        assert!(c.karma.allow_negative);
        assert!(c.karma.db_path.is_none());
        assert!(c.release.current.is_none());
        assert_eq!(c.release.cache_ttl_secs, 3600);
        assert_eq!(c.directory.refresh_interval_secs, 3600);
        assert_eq!(c.bot.nick, "zodbot");
        assert_eq!(c.bot.prefix_chars, ".");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.karma.allow_negative);
        assert_eq!(
            config.karma.url,
            "https://badges.fedoraproject.org/badge/macaron-cookie-i"
        );
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[karma]
db_path = "/var/tmp/supybot-karma.db"
unaddressed = false
allow_negative = false
url = "https://example.org/karma"
notify_path = "/var/log/karmabot/notices.jsonl"

[release]
current = "f40"
url = "https://releases.example.org/"
cache_ttl_secs = 60

[directory]
path = "/srv/karmabot/users.json"
refresh_interval_secs = 600
refresh_on_startup = false

[bot]
nick = "kbot"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.karma.db_path(),
            PathBuf::from("/var/tmp/supybot-karma.db")
        );
        assert!(!config.karma.unaddressed);
        assert!(!config.karma.allow_negative);
        assert_eq!(
            config.karma.notify_path.as_deref(),
            Some("/var/log/karmabot/notices.jsonl")
        );
        assert_eq!(config.release.current.as_deref(), Some("f40"));
        assert_eq!(config.release.cache_ttl_secs, 60);
        assert_eq!(
            config.directory.path(),
            PathBuf::from("/srv/karmabot/users.json")
        );
        assert!(!config.directory.refresh_on_startup);
        assert_eq!(config.bot.nick, "kbot");
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[karma]\nallow_negative = false\n").unwrap();
        assert!(!config.karma.allow_negative);
        assert!(config.karma.unaddressed);
    }

    #[test]
    fn test_default_db_path_is_data_dir() {
        let c = KarmaConfig::default();
        assert_eq!(c.db_path(), paths::ledger_path());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut config = Config::default();
        config.release.current = Some("f41".into());
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.release.current.as_deref(), Some("f41"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[bot]\nnick = \"zod bot\"\n").unwrap();
        assert!(matches!(config.validate(), Err(KarmaError::Config(_))));

        let config: Config =
            toml::from_str("[directory]\nrefresh_interval_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[release]\ncurrent = \"\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "[release]\ncurrent = \"f40\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.release.current.as_deref(), Some("f40"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
