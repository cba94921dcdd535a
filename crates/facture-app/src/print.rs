// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::model::{RowField, RowVisibility};
use crate::rows::RowCollection;

const MIN_DESCRIPTION_WIDTH: usize = 11;

/// Hides rows without a description and renumbers the rest. Returns how many
/// rows were hidden. Row data and the live total are untouched.
pub fn prepare_for_print(rows: &mut RowCollection) -> usize {
    let mut hidden = 0;
    for row in rows.rows_mut() {
        if !row.has_description() {
            row.visibility = RowVisibility::Hidden;
            hidden += 1;
        }
    }
    rows.renumber();
    hidden
}

pub fn restore_after_print(rows: &mut RowCollection) {
    for row in rows.rows_mut() {
        row.visibility = RowVisibility::Visible;
    }
    rows.renumber();
}

pub fn format_issue_date(date: Date) -> String {
    date.format(&time::macros::format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Plain-text invoice over the visible rows.
pub fn render_print_text(issue_date: Date, rows: &RowCollection) -> String {
    let width = rows
        .visible()
        .map(|row| row.field_text(RowField::Description).chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_DESCRIPTION_WIDTH);

    let mut out = String::new();
    out.push_str(&format!("INVOICE  {}\n\n", format_issue_date(issue_date)));
    out.push_str(&format!(
        "{:>3}  {:<width$}  {:>8}  {:>12}  {:>12}\n",
        "#",
        RowField::Description.label(),
        RowField::Quantity.label(),
        RowField::UnitPrice.label(),
        "subtotal"
    ));
    out.push_str(&format!("{}\n", "-".repeat(width + 45)));

    let mut printed = 0;
    for row in rows.visible() {
        printed += 1;
        out.push_str(&format!(
            "{:>3}  {:<width$}  {:>8}  {:>12}  {:>12}\n",
            row.ordinal,
            row.field_text(RowField::Description),
            row.quantity_input.trim(),
            row.price_input.trim(),
            row.subtotal.to_string(),
        ));
    }
    if printed == 0 {
        out.push_str("(no line items)\n");
    }

    out.push_str(&format!("{}\n", "-".repeat(width + 45)));
    out.push_str(&format!(
        "{:>w$}  {:>12}\n",
        "TOTAL",
        rows.grand_total().to_string(),
        w = width + 31
    ));
    out
}
