// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::{Date, OffsetDateTime};

use crate::amount::Cents;
use crate::catalog::{Catalog, CatalogStatus};
use crate::ids::RowId;
use crate::model::{CatalogEntry, PriceSource, RowVisibility};
use crate::print::{prepare_for_print, render_print_text, restore_after_print};
use crate::rows::RowCollection;
use crate::selection::{SelectionResolver, creatable_description};
use crate::totals::refresh_subtotal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintState {
    Editing,
    Printing,
}

/// Everything one invoice editing session owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSession {
    pub catalog: Catalog,
    pub rows: RowCollection,
    pub issue_date: Date,
    pub print_state: PrintState,
    pub status_line: Option<String>,
    grand_total: Cents,
}

impl Default for InvoiceSession {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc().date())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceCommand {
    AddRow,
    DeleteRow(RowId),
    SelectDescription { row: RowId, text: String },
    ClearDescription(RowId),
    SetQuantity { row: RowId, text: String },
    SetUnitPrice { row: RowId, text: String },
    RestoreUnitPrice {
        row: RowId,
        text: String,
        source: PriceSource,
    },
    CatalogLoaded(Vec<CatalogEntry>),
    CatalogFailed(String),
    PrepareForPrint,
    RestoreAfterPrint,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceEvent {
    RowAdded { row: RowId, ordinal: usize },
    RowDeleted(RowId),
    DescriptionChanged { row: RowId, description: Option<String> },
    SelectionRejected(RowId),
    PricePrefilled { row: RowId, price: String },
    PriceCleared(RowId),
    SubtotalChanged { row: RowId, subtotal: Cents },
    GrandTotalChanged(Cents),
    RowsRenumbered,
    CatalogReady(usize),
    CatalogUnavailable(String),
    PrintPrepared { hidden: usize },
    PrintRestored,
    StatusUpdated(String),
    StatusCleared,
}

impl InvoiceSession {
    pub fn new(issue_date: Date) -> Self {
        Self {
            catalog: Catalog::default(),
            rows: RowCollection::default(),
            issue_date,
            print_state: PrintState::Editing,
            status_line: None,
            grand_total: Cents::ZERO,
        }
    }

    /// A session that starts with `count` blank rows.
    pub fn with_initial_rows(issue_date: Date, count: usize) -> Self {
        let mut session = Self::new(issue_date);
        for _ in 0..count {
            session.add_row();
        }
        session
    }

    pub fn grand_total(&self) -> Cents {
        self.grand_total
    }

    pub fn dispatch(&mut self, command: InvoiceCommand) -> Result<Vec<InvoiceEvent>> {
        let events = match command {
            InvoiceCommand::AddRow => self.add_row(),
            InvoiceCommand::DeleteRow(row) => self.delete_row(row)?,
            InvoiceCommand::SelectDescription { row, text } => {
                self.on_description_change(row, &text)?
            }
            InvoiceCommand::ClearDescription(row) => self.on_description_cleared(row)?,
            InvoiceCommand::SetQuantity { row, text } => self.on_quantity_change(row, &text)?,
            InvoiceCommand::SetUnitPrice { row, text } => self.on_unit_price_change(row, &text)?,
            InvoiceCommand::RestoreUnitPrice { row, text, source } => {
                self.restore_unit_price(row, &text, source)?
            }
            InvoiceCommand::CatalogLoaded(entries) => self.on_catalog_loaded(entries),
            InvoiceCommand::CatalogFailed(message) => self.on_catalog_failed(&message),
            InvoiceCommand::PrepareForPrint => self.prepare_for_print(),
            InvoiceCommand::RestoreAfterPrint => self.restore_after_print(),
            InvoiceCommand::SetStatus(message) => vec![self.set_status(&message)],
            InvoiceCommand::ClearStatus => vec![self.clear_status()],
        };
        Ok(events)
    }

    pub fn add_row(&mut self) -> Vec<InvoiceEvent> {
        let row = self.rows.add_row();
        let added = InvoiceEvent::RowAdded {
            row: row.id,
            ordinal: row.ordinal,
        };
        let mut events = vec![added];
        events.extend(self.recompute_grand_total());
        events
    }

    pub fn delete_row(&mut self, row: RowId) -> Result<Vec<InvoiceEvent>> {
        self.rows.delete_row(row)?;
        let mut events = vec![InvoiceEvent::RowDeleted(row), InvoiceEvent::RowsRenumbered];
        events.extend(self.recompute_grand_total());
        Ok(events)
    }

    /// A pick or free-text entry from the selection widget.
    ///
    /// Blank text is rejected. Choosing the description the row already has
    /// is not a change and keeps any manual price. Otherwise the catalog
    /// resolution replaces the price: prefilled on a match, cleared on a miss.
    pub fn on_description_change(&mut self, row: RowId, text: &str) -> Result<Vec<InvoiceEvent>> {
        let Some(description) = creatable_description(text) else {
            self.rows.get_mut(row)?;
            return Ok(vec![InvoiceEvent::SelectionRejected(row)]);
        };

        let resolution = SelectionResolver::new(&self.catalog).resolve(&description);
        let target = self.rows.get_mut(row)?;
        if target.description.as_deref() == Some(resolution.description.as_str()) {
            return Ok(Vec::new());
        }

        target.description = Some(resolution.description.clone());
        let mut events = vec![InvoiceEvent::DescriptionChanged {
            row,
            description: Some(resolution.description),
        }];
        match resolution.unit_price {
            Some(price) => {
                target.price_input = price.to_string();
                target.price_source = PriceSource::Prefilled;
                events.push(InvoiceEvent::PricePrefilled {
                    row,
                    price: target.price_input.clone(),
                });
            }
            None => {
                target.price_input.clear();
                target.price_source = PriceSource::Empty;
                events.push(InvoiceEvent::PriceCleared(row));
            }
        }

        let became_visible = target.visibility == RowVisibility::Hidden;
        target.visibility = RowVisibility::Visible;
        let subtotal = refresh_subtotal(target);
        events.push(InvoiceEvent::SubtotalChanged { row, subtotal });

        if became_visible {
            self.rows.renumber();
            events.push(InvoiceEvent::RowsRenumbered);
        }
        events.extend(self.recompute_grand_total());
        Ok(events)
    }

    /// The placeholder option: no product selected.
    pub fn on_description_cleared(&mut self, row: RowId) -> Result<Vec<InvoiceEvent>> {
        let target = self.rows.get_mut(row)?;
        if target.description.is_none() {
            return Ok(Vec::new());
        }

        target.description = None;
        target.price_input.clear();
        target.price_source = PriceSource::Empty;
        let subtotal = refresh_subtotal(target);

        let mut events = vec![
            InvoiceEvent::DescriptionChanged {
                row,
                description: None,
            },
            InvoiceEvent::PriceCleared(row),
            InvoiceEvent::SubtotalChanged { row, subtotal },
        ];
        events.extend(self.recompute_grand_total());
        Ok(events)
    }

    pub fn on_quantity_change(&mut self, row: RowId, text: &str) -> Result<Vec<InvoiceEvent>> {
        let target = self.rows.get_mut(row)?;
        target.quantity_input = text.to_owned();
        let subtotal = refresh_subtotal(target);

        let mut events = vec![InvoiceEvent::SubtotalChanged { row, subtotal }];
        events.extend(self.recompute_grand_total());
        Ok(events)
    }

    pub fn on_unit_price_change(&mut self, row: RowId, text: &str) -> Result<Vec<InvoiceEvent>> {
        let target = self.rows.get_mut(row)?;
        target.price_input = text.to_owned();
        target.price_source = if text.trim().is_empty() {
            PriceSource::Empty
        } else {
            PriceSource::Manual
        };
        let subtotal = refresh_subtotal(target);

        let mut events = vec![InvoiceEvent::SubtotalChanged { row, subtotal }];
        events.extend(self.recompute_grand_total());
        Ok(events)
    }

    /// Puts back a price captured earlier, along with where it came from.
    pub fn restore_unit_price(
        &mut self,
        row: RowId,
        text: &str,
        source: PriceSource,
    ) -> Result<Vec<InvoiceEvent>> {
        let target = self.rows.get_mut(row)?;
        target.price_input = text.to_owned();
        target.price_source = source;
        let subtotal = refresh_subtotal(target);

        let mut events = vec![InvoiceEvent::SubtotalChanged { row, subtotal }];
        events.extend(self.recompute_grand_total());
        Ok(events)
    }

    /// Only changes what the selection widget offers; entered rows stay as they are.
    pub fn on_catalog_loaded(&mut self, entries: Vec<CatalogEntry>) -> Vec<InvoiceEvent> {
        self.catalog.load_succeeded(entries);
        let count = self.catalog.len();
        vec![
            InvoiceEvent::CatalogReady(count),
            self.set_status(&format!("catalog loaded: {count} products")),
        ]
    }

    pub fn on_catalog_failed(&mut self, message: &str) -> Vec<InvoiceEvent> {
        self.catalog.load_failed(message);
        vec![
            InvoiceEvent::CatalogUnavailable(message.to_owned()),
            self.set_status(&format!(
                "catalog unavailable: {message}; type product names and prices by hand"
            )),
        ]
    }

    pub fn catalog_ready(&self) -> bool {
        *self.catalog.status() == CatalogStatus::Ready
    }

    pub fn prepare_for_print(&mut self) -> Vec<InvoiceEvent> {
        let hidden = prepare_for_print(&mut self.rows);
        self.print_state = PrintState::Printing;
        vec![
            InvoiceEvent::PrintPrepared { hidden },
            InvoiceEvent::RowsRenumbered,
        ]
    }

    pub fn restore_after_print(&mut self) -> Vec<InvoiceEvent> {
        restore_after_print(&mut self.rows);
        self.print_state = PrintState::Editing;
        vec![InvoiceEvent::PrintRestored, InvoiceEvent::RowsRenumbered]
    }

    pub fn print_text(&self) -> String {
        render_print_text(self.issue_date, &self.rows)
    }

    fn recompute_grand_total(&mut self) -> Option<InvoiceEvent> {
        let total = self.rows.grand_total();
        if total == self.grand_total {
            return None;
        }
        self.grand_total = total;
        Some(InvoiceEvent::GrandTotalChanged(total))
    }

    pub fn set_status(&mut self, message: &str) -> InvoiceEvent {
        self.status_line = Some(message.to_owned());
        InvoiceEvent::StatusUpdated(message.to_owned())
    }

    pub fn clear_status(&mut self) -> InvoiceEvent {
        self.status_line = None;
        InvoiceEvent::StatusCleared
    }
}
