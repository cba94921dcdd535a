// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use facture_catalog::{CatalogSource, DEFAULT_CATALOG_SOURCE};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "facture";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_INITIAL_ROWS: usize = 1;
const MAX_INITIAL_ROWS: usize = 500;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub invoice: InvoiceConfig,
    #[serde(default)]
    pub print: PrintConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            catalog: CatalogConfig::default(),
            invoice: InvoiceConfig::default(),
            print: PrintConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub source: Option<String>,
    pub timeout: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceConfig {
    pub initial_rows: Option<usize>,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            initial_rows: Some(DEFAULT_INITIAL_ROWS),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrintConfig {
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("FACTURE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set FACTURE_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [catalog], [invoice], [print], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(source) = &self.catalog.source {
            CatalogSource::parse(source)
                .with_context(|| format!("catalog.source in {}", path.display()))?;
        }

        if let Some(timeout) = &self.catalog.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "catalog.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(rows) = self.invoice.initial_rows
            && rows > MAX_INITIAL_ROWS
        {
            bail!(
                "invoice.initial_rows in {} must be at most {}, got {}",
                path.display(),
                MAX_INITIAL_ROWS,
                rows
            );
        }

        if let Some(dir) = &self.print.output_dir
            && dir.trim().is_empty()
        {
            bail!(
                "print.output_dir in {} must not be empty; remove it to disable export",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {:?}",
                path.display(),
                LOG_LEVELS.join(", "),
                level
            );
        }

        Ok(())
    }

    /// The configured source, then `FACTURE_CATALOG`, then `products.json`.
    pub fn catalog_source(&self) -> Result<CatalogSource> {
        let raw = match &self.catalog.source {
            Some(source) => source.clone(),
            None => env::var("FACTURE_CATALOG")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATALOG_SOURCE.to_owned()),
        };
        CatalogSource::parse(&raw)
    }

    pub fn catalog_timeout(&self) -> Result<Duration> {
        parse_duration(self.catalog.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn initial_rows(&self) -> usize {
        self.invoice.initial_rows.unwrap_or(DEFAULT_INITIAL_ROWS)
    }

    pub fn print_output_dir(&self) -> Option<PathBuf> {
        self.print.output_dir.as_deref().map(PathBuf::from)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => {
                let data_root = dirs::data_dir().ok_or_else(|| {
                    anyhow!("cannot resolve data directory; set [log].file in the config")
                })?;
                Ok(data_root.join(APP_NAME).join("facture.log"))
            }
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# facture config\n# Place this file at: {}\n\nversion = 1\n\n[catalog]\n# http(s):// URL, file:// URL, or a filesystem path.\n# Falls back to FACTURE_CATALOG, then ./{}\n# source = \"https://shop.example/products.json\"\ntimeout = \"{}\"\n\n[invoice]\ninitial_rows = {}\n\n[print]\n# Optional. Each print preview is also written here as a text file.\n# output_dir = \"/absolute/path/to/invoices\"\n\n[log]\n# RUST_LOG overrides this.\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/facture/facture.log)\n# file = \"/absolute/path/to/facture.log\"\n",
            path.display(),
            DEFAULT_CATALOG_SOURCE,
            DEFAULT_TIMEOUT,
            DEFAULT_INITIAL_ROWS,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use facture_catalog::CatalogSource;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.initial_rows(), 1);
        assert_eq!(config.catalog_timeout()?, Duration::from_secs(5));
        assert_eq!(config.print_output_dir(), None);
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[catalog]\nsource = \"products.json\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[catalog], [invoice], [print], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[catalog]\nsource = \"https://shop.example/products.json\"\ntimeout = \"750ms\"\n[invoice]\ninitial_rows = 3\n[print]\noutput_dir = \"/srv/invoices\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/facture-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert!(matches!(config.catalog_source()?, CatalogSource::Http(_)));
        assert_eq!(config.catalog_timeout()?, Duration::from_millis(750));
        assert_eq!(config.initial_rows(), 3);
        assert_eq!(config.print_output_dir(), Some(PathBuf::from("/srv/invoices")));
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/facture-test.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("FACTURE_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("FACTURE_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("FACTURE_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("facture/config.toml"));
        Ok(())
    }

    #[test]
    fn catalog_source_prefers_config_over_env() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[catalog]\nsource = \"/explicit/products.json\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("FACTURE_CATALOG", "/from/env.json");
        }
        let config = Config::load(&path)?;
        let source = config.catalog_source();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("FACTURE_CATALOG");
        }
        assert_eq!(
            source?,
            CatalogSource::File(PathBuf::from("/explicit/products.json"))
        );
        Ok(())
    }

    #[test]
    fn catalog_source_uses_env_when_config_is_silent() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("FACTURE_CATALOG", "http://localhost:8080/products.json");
        }
        let config = Config::load(&path)?;
        let source = config.catalog_source();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("FACTURE_CATALOG");
        }
        assert!(matches!(source?, CatalogSource::Http(_)));
        Ok(())
    }

    #[test]
    fn catalog_source_defaults_to_products_json() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("FACTURE_CATALOG");
        }
        let config = Config::default();
        assert_eq!(
            config.catalog_source()?,
            CatalogSource::File(PathBuf::from("products.json"))
        );
        Ok(())
    }

    #[test]
    fn catalog_source_rejects_unsupported_scheme() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[catalog]\nsource = \"ftp://example.com/p.json\"\n")?;
        let error = Config::load(&path).expect_err("ftp source should fail validation");
        assert!(format!("{error:#}").contains("unsupported catalog scheme"));
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn timeout_rejects_invalid_duration() {
        let error = parse_duration("oops").expect_err("invalid duration should fail");
        let message = error.to_string();
        assert!(
            message.contains("invalid duration") || message.contains("invalid timeout duration"),
            "unexpected message: {message}"
        );
    }

    #[test]
    fn timeout_rejects_minutes_that_overflow() -> Result<()> {
        let error = parse_duration(&format!("{}m", u64::MAX)).expect_err("overflow should fail");
        assert!(error.to_string().contains("too large"));

        let (_temp, path) =
            write_config(&format!("version = 1\n[catalog]\ntimeout = \"{}m\"\n", u64::MAX))?;
        let error = Config::load(&path).expect_err("overflowing timeout should fail");
        assert!(error.to_string().contains("too large"));
        Ok(())
    }

    #[test]
    fn timeout_rejects_non_positive_values_in_config() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[catalog]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn invoice_and_log_values_are_validated() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[invoice]\ninitial_rows = 100000\n")?;
        let error = Config::load(&path).expect_err("too many rows should fail");
        assert!(error.to_string().contains("at most"));

        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"loud\"\n")?;
        let error = Config::load(&path).expect_err("unknown level should fail");
        assert!(error.to_string().contains("must be one of"));

        let (_temp, path) = write_config("version = 1\n[print]\noutput_dir = \" \"\n")?;
        let error = Config::load(&path).expect_err("blank output dir should fail");
        assert!(error.to_string().contains("must not be empty"));
        Ok(())
    }

    #[test]
    fn example_config_includes_required_sections() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[catalog]"));
        assert!(example.contains("[invoice]"));
        assert!(example.contains("[print]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.initial_rows(), 1);
        Ok(())
    }
}
