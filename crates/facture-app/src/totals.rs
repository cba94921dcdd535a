// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::amount::{Cents, Decimal};
use crate::model::Row;

/// `quantity * unit_price` rounded half-up to cents. A missing price counts as zero.
pub fn compute_subtotal(quantity: Decimal, unit_price: Option<Decimal>) -> Cents {
    let quantity = quantity.clamp_non_negative();
    let price = unit_price.unwrap_or(Decimal::ZERO).clamp_non_negative();
    quantity
        .checked_mul(price)
        .map(Decimal::round_to_cents)
        .unwrap_or(Cents::new(i64::MAX))
}

/// Sum of the subtotals as displayed, so the total always matches the column.
pub fn compute_grand_total<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Cents {
    rows.into_iter().map(|row| row.subtotal).sum()
}

pub fn refresh_subtotal(row: &mut Row) -> Cents {
    row.subtotal = compute_subtotal(row.quantity(), row.unit_price());
    row.subtotal
}
