// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;

use crate::model::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    Pending,
    Ready,
    Failed(String),
}

/// Known products, in source order. Loaded once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    status: CatalogStatus,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            status: CatalogStatus::Pending,
        }
    }
}

impl Catalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            status: CatalogStatus::Ready,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    pub fn load_succeeded(&mut self, entries: Vec<CatalogEntry>) {
        self.entries = entries;
        self.status = CatalogStatus::Ready;
    }

    /// A failed load leaves the catalog empty for the rest of the session.
    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.entries.clear();
        self.status = CatalogStatus::Failed(message.into());
    }

    /// Exact match; the first entry wins when descriptions repeat.
    pub fn find_by_description(&self, description: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|entry| entry.description == description)
    }

    /// Distinct entries in catalog order, first occurrence of each description.
    pub fn options(&self) -> Vec<&CatalogEntry> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| seen.insert(entry.description.as_str()))
            .collect()
    }

    /// Case-insensitive substring filter over [`Catalog::options`].
    pub fn matching(&self, query: &str) -> Vec<&CatalogEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.options();
        }
        self.options()
            .into_iter()
            .filter(|entry| entry.description.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogStatus};
    use crate::{CatalogEntry, Decimal};

    fn entry(description: &str, cents: i64) -> CatalogEntry {
        CatalogEntry::new(description, Decimal::from_cents(cents))
    }

    fn sample() -> Catalog {
        Catalog::from_entries(vec![
            entry("Widget A", 999),
            entry("Gadget B", 1500),
            entry("Widget A", 1),
            entry("Cable 2m", 450),
        ])
    }

    #[test]
    fn default_catalog_is_pending_and_empty() {
        let catalog = Catalog::default();
        assert_eq!(catalog.status(), &CatalogStatus::Pending);
        assert!(catalog.is_empty());
    }

    #[test]
    fn find_by_description_prefers_first_occurrence() {
        let catalog = sample();
        let found = catalog
            .find_by_description("Widget A")
            .expect("widget should exist");
        assert_eq!(found.price, Decimal::from_cents(999));
        assert!(catalog.find_by_description("widget a").is_none());
        assert!(catalog.find_by_description("Widget").is_none());
    }

    #[test]
    fn options_drop_duplicate_descriptions_and_keep_order() {
        let catalog = sample();
        let names = catalog
            .options()
            .into_iter()
            .map(|entry| entry.description.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Widget A", "Gadget B", "Cable 2m"]);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let catalog = sample();
        let names = catalog
            .matching("  GET ")
            .into_iter()
            .map(|entry| entry.description.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Widget A", "Gadget B"]);
        assert_eq!(catalog.matching("").len(), 3);
        assert!(catalog.matching("zzz").is_empty());
    }

    #[test]
    fn failed_load_clears_entries() {
        let mut catalog = sample();
        catalog.load_failed("HTTP 404");
        assert!(catalog.is_empty());
        assert_eq!(catalog.status(), &CatalogStatus::Failed("HTTP 404".to_owned()));
    }
}
