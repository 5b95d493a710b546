//! Configuration management for procsnap.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel, OutputFormat};
use anyhow::Context;
use procsnap::source::{DEFAULT_IO_BUFFER_KB, DEFAULT_PROC_ROOT};
use procsnap::CollectMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

// Default configuration constants
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Sources
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "io-buffer-kb")]
    pub io_buffer_kb: Option<usize>,

    // Collection
    #[serde(alias = "timeout-ms")]
    pub timeout_ms: Option<u64>,
    pub parallel: Option<bool>,
    pub parallelism: Option<usize>,

    // Sampling
    #[serde(alias = "refresh-interval-secs", alias = "refresh_interval")]
    pub refresh_interval_secs: Option<u64>,
    pub count: Option<usize>,

    // Output
    #[serde(alias = "output-format")]
    pub output_format: Option<OutputFormat>,

    // Logging
    #[serde(alias = "loglevel")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            io_buffer_kb: Some(DEFAULT_IO_BUFFER_KB),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            parallel: Some(false),
            parallelism: None,
            refresh_interval_secs: Some(DEFAULT_REFRESH_INTERVAL_SECS),
            count: Some(1),
            output_format: Some(OutputFormat::Json),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn io_buffer_kb(&self) -> usize {
        self.io_buffer_kb.unwrap_or(DEFAULT_IO_BUFFER_KB)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn collect_mode(&self) -> CollectMode {
        if self.parallel.unwrap_or(false) {
            CollectMode::Parallel
        } else {
            CollectMode::Sequential
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }

    pub fn count(&self) -> usize {
        self.count.unwrap_or(1)
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or(OutputFormat::Json)
    }

    /// Effective log level; unknown strings fall back to `info`.
    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(parse_log_level)
            .unwrap_or(LevelFilter::INFO)
    }
}

fn parse_log_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}

fn log_level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Off => "off",
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.proc_root().as_os_str().is_empty() {
        return Err("proc_root must not be empty".into());
    }

    if cfg.timeout_ms == Some(0) {
        return Err("timeout_ms must be greater than 0".into());
    }

    if cfg.io_buffer_kb == Some(0) {
        return Err("io_buffer_kb must be greater than 0".into());
    }

    let count = cfg.count();
    if count == 0 {
        return Err("count must be at least 1".into());
    }
    if count > 1 && cfg.refresh_interval_secs == Some(0) {
        return Err("refresh_interval_secs must be greater than 0 when count > 1".into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if parse_log_level(level).is_none() {
            return Err(format!(
                "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                level
            )
            .into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(kb) = args.io_buffer_kb {
        config.io_buffer_kb = Some(kb);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = Some(timeout_ms);
    }

    if args.parallel {
        config.parallel = Some(true);
    }
    if args.sequential {
        config.parallel = Some(false);
    }
    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }

    if let Some(count) = args.count {
        config.count = Some(count);
    }
    if let Some(interval) = args.interval {
        config.refresh_interval_secs = Some(interval);
    }
    if let Some(format) = args.output {
        config.output_format = Some(format);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(log_level_name(level).to_string());
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            // Try default locations
            let defaults = [
                "/etc/procsnap/procsnap.yaml",
                "/etc/procsnap/procsnap.yml",
                "/etc/procsnap/procsnap.json",
                "/etc/procsnap/procsnap.toml",
                "./procsnap.yaml",
                "./procsnap.yml",
                "./procsnap.json",
                "./procsnap.toml",
            ];

            match defaults.iter().map(Path::new).find(|p| p.exists()) {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_effective_config(&config).is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.collect_mode(), CollectMode::Sequential);
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.log_level_filter(), LevelFilter::INFO);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            timeout_ms: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            count: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            count: Some(3),
            refresh_interval_secs: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_load_yaml_json_toml() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("procsnap.yaml");
        fs::write(&yaml, "timeout_ms: 1500\nparallel: true\noutput_format: table\n").unwrap();
        let config = load_config(Some(&yaml)).unwrap();
        assert_eq!(config.timeout_ms, Some(1500));
        assert_eq!(config.collect_mode(), CollectMode::Parallel);
        assert_eq!(config.output_format(), OutputFormat::Table);

        let json = dir.path().join("procsnap.json");
        fs::write(&json, r#"{"proc_root": "/host/proc", "count": 3}"#).unwrap();
        let config = load_config(Some(&json)).unwrap();
        assert_eq!(config.proc_root(), PathBuf::from("/host/proc"));
        assert_eq!(config.count(), 3);

        let toml_path = dir.path().join("procsnap.toml");
        fs::write(&toml_path, "io_buffer_kb = 8\nlog_level = \"debug\"\n").unwrap();
        let config = load_config(Some(&toml_path)).unwrap();
        assert_eq!(config.io_buffer_kb(), 8);
        assert_eq!(config.log_level_filter(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("procsnap.yaml");
        fs::write(&yaml, "timeout_ms: 1500\nparallel: true\ncount: 2\n").unwrap();

        let args = Args::try_parse_from([
            "procsnap",
            "-c",
            yaml.to_str().unwrap(),
            "--timeout-ms",
            "250",
            "--sequential",
            "--log-level",
            "warn",
        ])
        .unwrap();

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.timeout_ms, Some(250));
        assert_eq!(config.collect_mode(), CollectMode::Sequential);
        assert_eq!(config.count(), 2);
        assert_eq!(config.log_level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn test_render_config_formats() {
        let config = Config::default();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let rendered = render_config(&config, format).unwrap();
            assert!(rendered.contains("timeout_ms"));
        }
    }
}
