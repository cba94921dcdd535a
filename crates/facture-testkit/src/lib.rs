// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use facture_app::{CatalogEntry, Decimal, InvoiceSession};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use time::{Date, Month};
use tiny_http::{Header, Response, Server};

const PRODUCT_NOUNS: [&str; 16] = [
    "Widget", "Gadget", "Bracket", "Hinge", "Cable", "Adapter", "Bolt", "Washer", "Gasket",
    "Valve", "Switch", "Socket", "Filter", "Clamp", "Spring", "Panel",
];
const PRODUCT_GRADES: [&str; 8] = [
    "Standard", "Premium", "Mini", "XL", "Pro", "Eco", "Heavy", "Lite",
];

pub const SAMPLE_CATALOG_JSON: &str = r#"[
  {"desc": "Widget A", "price": 9.99},
  {"desc": "Gadget B", "price": 25},
  {"desc": "Cable 2m", "price": "4.50"},
  {"desc": "Widget A", "price": 0.01}
]"#;

pub fn sample_catalog_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Widget A", Decimal::from_cents(999)),
        CatalogEntry::new("Gadget B", Decimal::from_cents(2500)),
        CatalogEntry::new("Cable 2m", Decimal::from_cents(450)),
        CatalogEntry::new("Widget A", Decimal::from_cents(1)),
    ]
}

pub fn fixture_date() -> Date {
    Date::from_calendar_date(2026, Month::February, 19).expect("valid fixture date")
}

/// Session on the fixture date with `rows` blank rows and the sample catalog loaded.
pub fn session_with_sample_catalog(rows: usize) -> InvoiceSession {
    let mut session = InvoiceSession::with_initial_rows(fixture_date(), rows);
    session.on_catalog_loaded(sample_catalog_entries());
    session
}

pub fn write_catalog_file(dir: &Path, body: &str) -> Result<PathBuf> {
    let path = dir.join("products.json");
    std::fs::write(&path, body).with_context(|| format!("write catalog {}", path.display()))?;
    Ok(path)
}

pub fn temp_catalog_file(body: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = write_catalog_file(dir.path(), body)?;
    Ok((dir, path))
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for catalogs and line-item inputs.
#[derive(Debug, Clone)]
pub struct CatalogFaker {
    rng: DeterministicRng,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn entry(&mut self) -> CatalogEntry {
        let noun = self.pick(&PRODUCT_NOUNS);
        let grade = self.pick(&PRODUCT_GRADES);
        let cents = self.int_n(50_000) as i64;
        CatalogEntry::new(format!("{noun} {grade}"), Decimal::from_cents(cents))
    }

    pub fn catalog(&mut self, size: usize) -> Vec<CatalogEntry> {
        (0..size).map(|_| self.entry()).collect()
    }

    /// A quantity as a user might type it: whole, fractional, or occasionally junk.
    pub fn quantity_text(&mut self) -> String {
        match self.int_n(6) {
            0 => format!("{}.{}", self.int_n(10), self.int_n(10)),
            1 => "abc".to_owned(),
            2 => String::new(),
            _ => (1 + self.int_n(20)).to_string(),
        }
    }

    pub fn price_text(&mut self) -> String {
        match self.int_n(5) {
            0 => format!("{}.{:03}", self.int_n(100), self.int_n(1000)),
            1 => "-3".to_owned(),
            _ => format!("{}.{:02}", self.int_n(500), self.int_n(100)),
        }
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

/// What the mock server saw for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
}

/// One-shot HTTP server answering a single catalog request.
pub struct MockCatalogServer {
    base_url: String,
    handle: JoinHandle<()>,
    requests: Receiver<RecordedRequest>,
}

impl MockCatalogServer {
    pub fn respond(status: u16, content_type: &str, body: &str) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let (tx, requests) = mpsc::channel();
        let content_type = content_type.to_owned();
        let body = body.to_owned();

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let _ = tx.send(RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_owned(),
            });
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", content_type.as_bytes())
                        .expect("valid content type header"),
                );
            request.respond(response).expect("response should succeed");
        });

        Ok(Self {
            base_url,
            handle,
            requests,
        })
    }

    pub fn json(body: &str) -> Result<Self> {
        Self::respond(200, "application/json", body)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Waits for the server thread and returns the request it answered.
    pub fn finish(self) -> Result<RecordedRequest> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?;
        self.requests
            .recv()
            .context("mock server never saw a request")
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CatalogFaker, SAMPLE_CATALOG_JSON, fixture_date, sample_catalog_entries,
        session_with_sample_catalog,
    };
    use facture_app::Decimal;

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut first = CatalogFaker::new(7);
        let mut second = CatalogFaker::new(7);
        assert_eq!(first.catalog(10), second.catalog(10));
    }

    #[test]
    fn faker_entries_are_valid_catalog_entries() {
        let mut faker = CatalogFaker::new(3);
        for entry in faker.catalog(50) {
            assert!(!entry.description.trim().is_empty());
            assert!(!entry.price.is_negative());
        }
    }

    #[test]
    fn faker_input_text_mixes_valid_and_junk_values() {
        let mut faker = CatalogFaker::new(11);
        let quantities = (0..60).map(|_| faker.quantity_text()).collect::<Vec<_>>();
        assert!(quantities.iter().any(|text| Decimal::parse(text).is_none()));
        assert!(quantities.iter().any(|text| Decimal::parse(text).is_some()));
    }

    #[test]
    fn sample_json_lists_same_products_as_entries() {
        for entry in sample_catalog_entries() {
            assert!(SAMPLE_CATALOG_JSON.contains(&entry.description));
        }
    }

    #[test]
    fn sample_session_has_rows_and_catalog() {
        let session = session_with_sample_catalog(2);
        assert_eq!(session.rows.len(), 2);
        assert_eq!(session.catalog.len(), 4);
        assert_eq!(session.issue_date, fixture_date());
    }
}
