// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use facture_app::{CatalogEntry, Decimal};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CATALOG_SOURCE: &str = "products.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogLoadError {
    #[error("cannot reach catalog {location} ({reason})")]
    Unreachable { location: String, reason: String },
    #[error("catalog {location} returned HTTP {status}{detail}")]
    Status {
        location: String,
        status: u16,
        detail: String,
    },
    #[error("cannot read catalog file {location} ({reason})")]
    Unreadable { location: String, reason: String },
    #[error("catalog {location} is malformed: {reason}")]
    Malformed { location: String, reason: String },
}

impl CatalogLoadError {
    pub fn location(&self) -> &str {
        match self {
            Self::Unreachable { location, .. }
            | Self::Status { location, .. }
            | Self::Unreadable { location, .. }
            | Self::Malformed { location, .. } => location,
        }
    }
}

/// Where the product catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Http(Url),
    File(PathBuf),
}

impl CatalogSource {
    /// `http(s)://` and `file://` URLs are honored; anything else is a path.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("catalog source must not be empty -- set [catalog].source or pass --catalog");
        }

        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Http(url)),
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|()| {
                    anyhow::anyhow!("catalog source {trimmed:?} is not a local file URL")
                })?;
                Ok(Self::File(path))
            }
            Ok(url) if url.scheme().len() > 1 => bail!(
                "unsupported catalog scheme {:?} in {trimmed:?}; use http(s)://, file:// or a filesystem path",
                url.scheme()
            ),
            _ => Ok(Self::File(PathBuf::from(trimmed))),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    timeout: Duration,
    http: HttpClient,
}

impl Loader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { timeout, http })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn load(&self, source: &CatalogSource) -> Result<Vec<CatalogEntry>, CatalogLoadError> {
        let result = match source {
            CatalogSource::Http(url) => self.fetch(url),
            CatalogSource::File(path) => read_file(path),
        };

        match &result {
            Ok(entries) => {
                tracing::info!(source = %source, products = entries.len(), "catalog loaded");
            }
            Err(error) => {
                tracing::warn!(source = %source, %error, "catalog load failed");
            }
        }
        result
    }

    fn fetch(&self, url: &Url) -> Result<Vec<CatalogEntry>, CatalogLoadError> {
        let location = url.to_string();
        tracing::debug!(
            %location,
            timeout_ms = self.timeout.as_millis() as u64,
            "fetching catalog"
        );

        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|error| CatalogLoadError::Unreachable {
                location: location.clone(),
                reason: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(&location, status, &body));
        }

        let body = response.text().map_err(|error| CatalogLoadError::Unreachable {
            location: location.clone(),
            reason: format!("read body: {error}"),
        })?;
        parse_catalog(&body).map_err(|reason| CatalogLoadError::Malformed { location, reason })
    }
}

fn read_file(path: &Path) -> Result<Vec<CatalogEntry>, CatalogLoadError> {
    let location = path.display().to_string();
    let body = fs::read_to_string(path).map_err(|error| CatalogLoadError::Unreadable {
        location: location.clone(),
        reason: error.to_string(),
    })?;
    parse_catalog(&body).map_err(|reason| CatalogLoadError::Malformed { location, reason })
}

fn status_error(location: &str, status: StatusCode, body: &str) -> CatalogLoadError {
    let trimmed = body.trim();
    let detail = if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(trimmed)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        format!(": {message}")
    } else if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        format!(": {trimmed}")
    } else {
        String::new()
    };

    CatalogLoadError::Status {
        location: location.to_owned(),
        status: status.as_u16(),
        detail,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "description")]
    desc: Option<String>,
    price: Option<RawPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(serde_json::Number),
    Text(String),
}

/// serde_json renders large and tiny floats with an exponent; `f64`'s
/// `Display` never does, and still prints the shortest round-trip digits.
fn number_to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(whole) = number.as_u64() {
        return Decimal::parse(&whole.to_string());
    }
    if let Some(whole) = number.as_i64() {
        return Decimal::parse(&whole.to_string());
    }
    number
        .as_f64()
        .filter(|value| value.is_finite())
        .and_then(|value| Decimal::parse(&value.to_string()))
}

/// Parses a JSON array of `{"desc": ..., "price": ...}` objects.
///
/// `description` is accepted in place of `desc`. Prices may be numbers or
/// strings; in strings every character other than digits, `.` and `-` is
/// dropped first, so a currency symbol next to the number is tolerated.
pub fn parse_catalog(body: &str) -> Result<Vec<CatalogEntry>, String> {
    let raw: Vec<RawEntry> = serde_json::from_str(body)
        .map_err(|error| format!("expected a JSON array of products: {error}"))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let description = entry
                .desc
                .filter(|desc| !desc.trim().is_empty())
                .ok_or_else(|| format!("product {index} has no description"))?;
            let price = match entry.price {
                Some(RawPrice::Number(number)) => number_to_decimal(&number),
                Some(RawPrice::Text(text)) => {
                    let cleaned = text
                        .chars()
                        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
                        .collect::<String>();
                    Decimal::parse(&cleaned)
                }
                None => None,
            }
            .ok_or_else(|| format!("product {index} ({description:?}) has no usable price"))?;
            if price.is_negative() {
                return Err(format!(
                    "product {index} ({description:?}) has a negative price"
                ));
            }
            Ok(CatalogEntry::new(description, price))
        })
        .collect()
}

/// Built-in products for `--demo`.
pub fn demo_entries() -> Vec<CatalogEntry> {
    [
        ("Câble HDMI 2m", 1290),
        ("Clavier sans fil", 3450),
        ("Écran 24 pouces", 15900),
        ("Installation sur site (heure)", 6000),
        ("Souris optique", 1599),
        ("Support mural", 4999),
        ("Widget A", 999),
    ]
    .into_iter()
    .map(|(description, cents)| CatalogEntry::new(description, Decimal::from_cents(cents)))
    .collect()
}
