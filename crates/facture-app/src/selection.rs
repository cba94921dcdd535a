// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::amount::Decimal;
use crate::catalog::Catalog;

/// Outcome of resolving a chosen description against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub description: String,
    pub unit_price: Option<Decimal>,
}

impl Resolution {
    pub fn matched_catalog(&self) -> bool {
        self.unit_price.is_some()
    }
}

/// One entry of the option list handed to a selection widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOption {
    Existing { description: String, price: Decimal },
    Create { description: String },
}

impl SelectionOption {
    pub fn description(&self) -> &str {
        match self {
            Self::Existing { description, .. } | Self::Create { description } => description,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectionResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, description: &str) -> Resolution {
        let unit_price = self
            .catalog
            .find_by_description(description)
            .map(|entry| entry.price);
        Resolution {
            description: description.to_owned(),
            unit_price,
        }
    }

    /// Options for the current query: matching catalog entries, then a
    /// "create" option for new free text.
    pub fn options(&self, query: &str) -> Vec<SelectionOption> {
        let mut options = self
            .catalog
            .matching(query)
            .into_iter()
            .map(|entry| SelectionOption::Existing {
                description: entry.description.clone(),
                price: entry.price,
            })
            .collect::<Vec<_>>();

        if let Some(description) = creatable_description(query)
            && self.catalog.find_by_description(&description).is_none()
        {
            options.push(SelectionOption::Create { description });
        }
        options
    }
}

/// Trimmed free text, or `None` when it is blank and cannot become a new product.
pub fn creatable_description(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
