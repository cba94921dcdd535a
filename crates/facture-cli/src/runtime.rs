// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use facture_catalog::{CatalogSource, Loader};
use facture_tui::{CatalogLoadEvent, InternalEvent};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use time::OffsetDateTime;
use time::macros::format_description;

/// Where the session's catalog comes from.
#[derive(Debug, Clone)]
pub enum CatalogFeed {
    Remote { loader: Loader, source: CatalogSource },
    Demo,
}

pub struct CatalogRuntime {
    feed: CatalogFeed,
    print_dir: Option<PathBuf>,
}

impl CatalogRuntime {
    pub fn new(feed: CatalogFeed, print_dir: Option<PathBuf>) -> Self {
        Self { feed, print_dir }
    }
}

impl facture_tui::InvoiceRuntime for CatalogRuntime {
    fn spawn_catalog_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let (loader, source) = match &self.feed {
            CatalogFeed::Demo => {
                let entries = facture_catalog::demo_entries();
                tracing::info!(products = entries.len(), "using demo catalog");
                let _ = tx.send(InternalEvent::Catalog(CatalogLoadEvent::Loaded(entries)));
                return Ok(());
            }
            CatalogFeed::Remote { loader, source } => (loader.clone(), source.clone()),
        };

        thread::Builder::new()
            .name("catalog-load".to_owned())
            .spawn(move || {
                let event = match loader.load(&source) {
                    Ok(entries) => CatalogLoadEvent::Loaded(entries),
                    Err(error) => CatalogLoadEvent::Failed(error.to_string()),
                };
                let _ = tx.send(InternalEvent::Catalog(event));
            })
            .context("spawn catalog loader thread")?;
        Ok(())
    }

    fn export_print(&mut self, text: &str) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.print_dir else {
            return Ok(None);
        };

        fs::create_dir_all(dir)
            .with_context(|| format!("create print directory {}", dir.display()))?;
        let stamp = OffsetDateTime::now_utc()
            .format(format_description!(
                "[year][month][day]-[hour][minute][second]"
            ))
            .context("format export timestamp")?;

        let mut path = dir.join(format!("invoice-{stamp}.txt"));
        let mut attempt = 1;
        while path.exists() {
            attempt += 1;
            path = dir.join(format!("invoice-{stamp}-{attempt}.txt"));
        }

        fs::write(&path, text).with_context(|| format!("write invoice {}", path.display()))?;
        tracing::info!(path = %path.display(), "invoice exported");
        Ok(Some(path))
    }
}
