// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Configuration of spec §6: figment-layered defaults → TOML file → `VOXJOB_`
//! environment variables, grounded on the teacher's `figment`-based `load`.

use std::collections::HashSet;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::Level;
use voxjob_core::RecognizerKind;

/// Log level for filtering messages.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Log file format options.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration for console and file output.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub console_enable: bool,
    #[serde(default)]
    pub file_enable: bool,
    #[serde(default)]
    pub console_level: LogLevel,
    #[serde(default)]
    pub file_level: LogLevel,
    #[serde(default = "default_log_file_path")]
    pub file_path: String,
    #[serde(default)]
    pub file_format: LogFormat,
}

fn default_log_file_path() -> String {
    "./voxjob.log".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enable: true,
            file_enable: false,
            console_level: LogLevel::default(),
            file_level: LogLevel::Info,
            file_path: default_log_file_path(),
            file_format: LogFormat::default(),
        }
    }
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:*".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:*".to_string(),
    ]
}

/// CORS configuration for cross-origin requests, per spec §6's "permitted
/// CORS origins". Supports wildcards: `"http://localhost:*"` matches any
/// port on localhost; `"*"` allows every origin.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct CorsConfig {
    #[serde(default = "default_cors_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_cors_allowed_origins() }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_max_body_size() -> usize {
    500 * 1024 * 1024
}

/// HTTP server configuration, per spec §6.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    /// Maximum request body size in bytes for `/upload` (default: 500MB,
    /// spec §6's per-file upload ceiling).
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: default_address(), max_body_size: default_max_body_size(), cors: CorsConfig::default() }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".wav", ".mp3", ".m4a", ".flac", ".ogg", ".mp4", ".mkv"].into_iter().map(String::from).collect()
}

const fn default_max_files_per_upload() -> usize {
    10
}

/// Upload admission control of spec §6: extension allow-list and per-file/
/// per-request ceilings, enforced at the HTTP boundary (spec §5's
/// "backpressure" clause).
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct UploadConfig {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    #[serde(default = "default_max_files_per_upload")]
    pub max_files_per_request: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { allowed_extensions: default_allowed_extensions(), max_files_per_request: default_max_files_per_upload() }
    }
}

fn default_database_url() -> String {
    "sqlite://voxjob.sqlite3?mode=rwc".to_string()
}

/// Persistence configuration, per spec §6.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: default_database_url() }
    }
}

fn default_storage_root() -> String {
    "./storage".to_string()
}

/// Filesystem layout root, per spec §6's `storage/{uploads,results,temp}`.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: default_storage_root() }
    }
}

const fn default_max_concurrent_jobs() -> usize {
    3
}

/// Worker pool sizing, per spec §5's default-3 bounded concurrent-job limit.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct JobsConfig {
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { max_concurrent: default_max_concurrent_jobs() }
    }
}

/// The subprocess container collaborator for `fast_conformer`, per spec
/// §4.1/§9 ("invoked via argv, never a shell string").
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FastConformerConfig {
    pub container_id: String,
    #[serde(default = "default_nemo_script_path")]
    pub script_path: String,
}

fn default_nemo_script_path() -> String {
    "/workspace/run_nemo.py".to_string()
}

/// Feature-flags the recognizer backend fleet, per spec §4.1: "external
/// providers are feature-flagged at configuration level; disabled kinds
/// must refuse construction with `BackendDisabled`". No surprise defaults
/// (spec §6) — every in-process kind is enabled, every kind requiring
/// external credentials/containers is disabled until configured.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct BackendsConfig {
    #[serde(default = "default_enabled_backends")]
    pub enabled: Vec<RecognizerKind>,
    #[serde(default)]
    pub fast_conformer: Option<FastConformerConfig>,
}

fn default_enabled_backends() -> Vec<RecognizerKind> {
    RecognizerKind::ALL.iter().copied().filter(|k| !k.is_subprocess()).collect()
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self { enabled: default_enabled_backends(), fast_conformer: None }
    }
}

impl BackendsConfig {
    /// Converts the wire/config shape into `voxjob_recognizers`'s runtime
    /// form, consumed once at startup to build the registry.
    #[must_use]
    pub fn to_runtime(&self) -> voxjob_recognizers::BackendsConfig {
        voxjob_recognizers::BackendsConfig {
            enabled: self.enabled.iter().copied().collect::<HashSet<_>>(),
            fast_conformer: self.fast_conformer.as_ref().map(|c| voxjob_recognizers::FastConformerConfig {
                container_id: c.container_id.clone(),
                script_path: c.script_path.clone(),
            }),
        }
    }
}

/// Root configuration for the VoxJob server.
#[derive(Deserialize, Serialize, Default, Debug, Clone, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
}

#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub file_missing: Option<String>,
}

/// Loads the application configuration from defaults, a TOML file, and
/// `VOXJOB_`-prefixed environment variables (`__` splits nested keys, e.g.
/// `VOXJOB_SERVER__ADDRESS`).
///
/// # Errors
///
/// Returns an error if the configuration file contains invalid TOML, or an
/// environment variable or file value fails to parse into its field type.
pub fn load(config_path: &str) -> Result<ConfigLoadResult, Box<figment::Error>> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    let mut file_missing = None;
    if std::path::Path::new(config_path).exists() {
        figment = figment.merge(Toml::file(config_path));
    } else {
        file_missing = Some(config_path.to_string());
    }

    let config: Config = figment.merge(Env::prefixed("VOXJOB_").split("__")).extract().map_err(Box::new)?;
    Ok(ConfigLoadResult { config, file_missing })
}

/// Generates the default configuration as a pretty-printed TOML string.
///
/// # Errors
///
/// Returns an error if the default configuration cannot be serialized, which
/// would indicate a programming error rather than a runtime condition.
pub fn generate_default() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backends_excludes_subprocess_kinds() {
        let config = BackendsConfig::default();
        assert!(!config.enabled.contains(&RecognizerKind::FastConformer));
        assert!(config.enabled.contains(&RecognizerKind::OriginWhisper));
    }

    #[test]
    fn generate_default_round_trips_as_toml() {
        let toml_str = generate_default().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.jobs.max_concurrent, 3);
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_missing() {
        let result = load("/nonexistent/voxjob.toml").unwrap();
        assert!(result.file_missing.is_some());
        assert_eq!(result.config.server.address, "127.0.0.1:8080");
    }
}
