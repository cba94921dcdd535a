// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};

use crate::amount::Cents;
use crate::ids::RowId;
use crate::model::Row;
use crate::totals::{compute_grand_total, refresh_subtotal};

/// Invoice rows in display order.
///
/// Visible rows are numbered 1..N with no gaps. Hidden rows keep whatever
/// ordinal they had when they were hidden and are skipped by [`RowCollection::renumber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCollection {
    rows: Vec<Row>,
    next_id: u64,
}

impl Default for RowCollection {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl RowCollection {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| row.is_visible())
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn get_mut(&mut self, id: RowId) -> Result<&mut Row> {
        self.rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| anyhow!("row {id} not found -- it may have been deleted"))
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn add_row(&mut self) -> &Row {
        let id = RowId::new(self.next_id);
        self.next_id += 1;

        let mut row = Row::new(id, self.visible_count() + 1);
        refresh_subtotal(&mut row);
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    pub fn delete_row(&mut self, id: RowId) -> Result<Row> {
        let index = self
            .position(id)
            .ok_or_else(|| anyhow!("row {id} not found -- nothing to delete"))?;
        let removed = self.rows.remove(index);
        self.renumber();
        Ok(removed)
    }

    pub fn renumber(&mut self) {
        for (index, row) in self
            .rows
            .iter_mut()
            .filter(|row| row.is_visible())
            .enumerate()
        {
            row.ordinal = index + 1;
        }
    }

    pub fn grand_total(&self) -> Cents {
        compute_grand_total(&self.rows)
    }
}
