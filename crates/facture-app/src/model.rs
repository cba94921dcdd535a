// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::amount::{Cents, Decimal};
use crate::ids::RowId;

pub const DEFAULT_QUANTITY: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub description: String,
    pub price: Decimal,
}

impl CatalogEntry {
    pub fn new(description: impl Into<String>, price: Decimal) -> Self {
        Self {
            description: description.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowVisibility {
    Visible,
    Hidden,
}

/// Where the text in a row's price field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Empty,
    Prefilled,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Description,
    Quantity,
    UnitPrice,
}

impl RowField {
    pub const ALL: [Self; 3] = [Self::Description, Self::Quantity, Self::UnitPrice];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Quantity => "qty",
            Self::UnitPrice => "unit price",
        }
    }
}

/// One invoice line item.
///
/// Quantity and price hold the text as typed; they are parsed when totals
/// are computed, with anything non-numeric counting as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: RowId,
    pub ordinal: usize,
    pub description: Option<String>,
    pub quantity_input: String,
    pub price_input: String,
    pub price_source: PriceSource,
    pub subtotal: Cents,
    pub visibility: RowVisibility,
}

impl Row {
    pub fn new(id: RowId, ordinal: usize) -> Self {
        Self {
            id,
            ordinal,
            description: None,
            quantity_input: DEFAULT_QUANTITY.to_owned(),
            price_input: String::new(),
            price_source: PriceSource::Empty,
            subtotal: Cents::ZERO,
            visibility: RowVisibility::Visible,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == RowVisibility::Visible
    }

    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|description| !description.trim().is_empty())
    }

    pub fn quantity(&self) -> Decimal {
        Decimal::parse_or_zero(&self.quantity_input)
    }

    /// `None` while the price field is blank.
    pub fn unit_price(&self) -> Option<Decimal> {
        if self.price_input.trim().is_empty() {
            None
        } else {
            Some(Decimal::parse_or_zero(&self.price_input))
        }
    }

    pub fn field_text(&self, field: RowField) -> &str {
        match field {
            RowField::Description => self.description.as_deref().unwrap_or(""),
            RowField::Quantity => &self.quantity_input,
            RowField::UnitPrice => &self.price_input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PriceSource, Row, RowField, RowVisibility};
    use crate::{Cents, Decimal, RowId};

    #[test]
    fn new_row_uses_defaults() {
        let row = Row::new(RowId::new(7), 3);
        assert_eq!(row.ordinal, 3);
        assert_eq!(row.description, None);
        assert_eq!(row.quantity(), Decimal::ONE);
        assert_eq!(row.unit_price(), None);
        assert_eq!(row.price_source, PriceSource::Empty);
        assert_eq!(row.subtotal, Cents::ZERO);
        assert_eq!(row.visibility, RowVisibility::Visible);
    }

    #[test]
    fn whitespace_description_counts_as_empty() {
        let mut row = Row::new(RowId::new(1), 1);
        row.description = Some("   ".to_owned());
        assert!(!row.has_description());
        row.description = Some("Widget A".to_owned());
        assert!(row.has_description());
        assert_eq!(row.field_text(RowField::Description), "Widget A");
    }

    #[test]
    fn garbage_price_is_present_but_zero() {
        let mut row = Row::new(RowId::new(1), 1);
        row.price_input = "abc".to_owned();
        assert_eq!(row.unit_price(), Some(Decimal::ZERO));
    }
}
