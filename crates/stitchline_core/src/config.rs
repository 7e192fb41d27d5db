//! Configuration: an optional TOML file overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::{DatabaseConfig, default_namespace};
use crate::error::{ConfigError, CoreError, Result};
use crate::model::ChatId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StitchlineConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied through the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub application_id: Option<u64>,
    /// Marker for text commands besides `/`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Guild channels the bot listens in. Direct messages are always handled.
    #[serde(default)]
    pub allowed_channels: Vec<u64>,
}

fn default_prefix() -> String {
    "!".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            application_id: None,
            prefix: default_prefix(),
            allowed_channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Chat identity that is always registered as the cutter
    #[serde(default)]
    pub cutter_chat_id: Option<i64>,
    /// Evict conversations idle for this long. Unset keeps them forever.
    #[serde(default)]
    pub session_ttl_secs: Option<u64>,
}

impl WorkflowConfig {
    pub fn privileged_chat(&self) -> Option<ChatId> {
        self.cutter_chat_id.map(ChatId)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        self.session_ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write daily rolling log files into this directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub json: bool,
}

impl StitchlineConfig {
    /// Apply environment overrides using `lookup` as the variable source.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("DISCORD_TOKEN").or_else(|| get("TOKEN")) {
            self.discord.token = Some(token);
        }
        if let Some(id) = get("DISCORD_APPLICATION_ID") {
            self.discord.application_id = Some(parse_env("DISCORD_APPLICATION_ID", &id)?);
        }
        if let Some(prefix) = get("DISCORD_PREFIX") {
            self.discord.prefix = prefix;
        }
        if let Some(channels) = get("DISCORD_ALLOWED_CHANNELS") {
            self.discord.allowed_channels = channels
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(|c| parse_env("DISCORD_ALLOWED_CHANNELS", c))
                .collect::<Result<_>>()?;
        }

        let url = get("DB_URL").or_else(|| {
            get("DB_HOST").map(|host| {
                let port = get("DB_PORT").unwrap_or_else(|| "8000".to_string());
                format!("ws://{host}:{port}")
            })
        });
        if let Some(url) = url {
            self.database = DatabaseConfig::Remote {
                url,
                username: None,
                password: None,
                namespace: default_namespace(),
                database: default_namespace(),
            };
        } else if let Some(path) = get("DB_PATH") {
            self.database = DatabaseConfig::Embedded { path };
        }
        if let DatabaseConfig::Remote {
            username,
            password,
            namespace,
            database,
            ..
        } = &mut self.database
        {
            if let Some(user) = get("DB_USER") {
                *username = Some(user);
            }
            if let Some(secret) = get("DB_PASSWORD") {
                *password = Some(secret);
            }
            if let Some(ns) = get("DB_NAMESPACE") {
                *namespace = ns;
            }
            if let Some(name) = get("DB_NAME") {
                *database = name;
            }
        }

        if let Some(id) = get("CUTTER_CHAT_ID") {
            self.workflow.cutter_chat_id = Some(parse_env("CUTTER_CHAT_ID", &id)?);
        }
        if let Some(ttl) = get("SESSION_TTL_SECS") {
            self.workflow.session_ttl_secs = Some(parse_env("SESSION_TTL_SECS", &ttl)?);
        }
        Ok(())
    }

    /// Environment overrides from the process environment
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::ConfigurationError {
            config_path: "environment".to_string(),
            field: key.to_string(),
            expected: format!("a valid {}", std::any::type_name::<T>()),
            cause: ConfigError::InvalidValue(raw.to_string()),
        })
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<StitchlineConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "content".to_string(),
        expected: "valid TOML configuration".to_string(),
        cause: ConfigError::TomlParse(e.to_string()),
    })
}

/// Save configuration to a TOML file
pub async fn save_config(config: &StitchlineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("stitchline.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("stitchline").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".stitchline").join("config.toml"));
    }

    paths
}

/// Load configuration from standard locations, falling back to defaults
pub async fn load_config_from_standard_locations() -> Result<StitchlineConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::info!("Loading config from {}", path.display());
            return load_config(&path).await;
        }
    }
    Ok(StitchlineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_embedded_and_unprivileged() {
        let config = StitchlineConfig::default();
        assert_eq!(
            config.database,
            DatabaseConfig::Embedded {
                path: "./stitchline.db".into()
            }
        );
        assert_eq!(config.workflow.privileged_chat(), None);
        assert_eq!(config.workflow.session_ttl(), None);
        assert_eq!(config.discord.prefix, "!");
    }

    #[test]
    fn environment_builds_remote_database() {
        let mut config = StitchlineConfig::default();
        config
            .apply_env(env(&[
                ("TOKEN", "abc"),
                ("DB_HOST", "db.local"),
                ("DB_USER", "root"),
                ("DB_PASSWORD", "secret"),
                ("DB_NAME", "factory"),
                ("CUTTER_CHAT_ID", "42"),
                ("SESSION_TTL_SECS", "3600"),
                ("DISCORD_ALLOWED_CHANNELS", "1, 2"),
            ]))
            .unwrap();

        assert_eq!(config.discord.token.as_deref(), Some("abc"));
        assert_eq!(config.discord.allowed_channels, vec![1, 2]);
        assert_eq!(
            config.database,
            DatabaseConfig::Remote {
                url: "ws://db.local:8000".into(),
                username: Some("root".into()),
                password: Some("secret".into()),
                namespace: "stitchline".into(),
                database: "factory".into(),
            }
        );
        assert_eq!(config.workflow.privileged_chat(), Some(ChatId(42)));
        assert_eq!(config.workflow.session_ttl(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn bad_numbers_are_configuration_errors() {
        let mut config = StitchlineConfig::default();
        let err = config
            .apply_env(env(&[("CUTTER_CHAT_ID", "boss")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConfigurationError { ref field, .. } if field == "CUTTER_CHAT_ID"
        ));
    }

    #[tokio::test]
    async fn toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stitchline.toml");

        let mut config = StitchlineConfig::default();
        config.database = DatabaseConfig::Memory;
        config.workflow.cutter_chat_id = Some(7);
        save_config(&config, &path).await.unwrap();

        let loaded = load_config(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stitchline.toml");
        tokio::fs::write(&path, "[workflow]\ncutter_chat_id = 99\n")
            .await
            .unwrap();
        let loaded = load_config(&path).await.unwrap();
        assert_eq!(loaded.workflow.cutter_chat_id, Some(99));
        assert_eq!(loaded.database, DatabaseConfig::default());
    }
}
