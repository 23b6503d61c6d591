use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::Backend;
use crate::native::NativeResultSet;
use crate::translation::ROW_NUMBER_ALIAS;
use crate::types::RowValues;

use super::field::{FieldDescriptor, decode};
use super::row::{DbRow, index_columns};

/// Forward and random access over one executed statement's result.
///
/// Field metadata is read once, when the cursor is built. On backends without multiple
/// active result sets, callers must finish with a cursor before running another statement
/// on the same connector.
#[derive(Debug)]
pub struct ResultCursor {
    backend: Backend,
    handle: Option<NativeResultSet>,
    fields: Vec<FieldDescriptor>,
    /// For each visible field: (native column index, slot in `column_names`).
    slots: Vec<(usize, usize)>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    position: usize,
}

impl ResultCursor {
    /// Wrap a native result. Statements without a result set produce an invalid cursor.
    #[must_use]
    pub fn new(backend: Backend, result: NativeResultSet) -> Self {
        let mut fields = Vec::new();
        let mut slots = Vec::new();
        let mut names: Vec<String> = Vec::new();

        let handle = if result.has_result_set() {
            for (native_idx, field) in result.fields.iter().flatten().enumerate() {
                // the pagination column is an artefact of rendering, not data
                if field.name == ROW_NUMBER_ALIAS {
                    continue;
                }
                let slot = match names.iter().position(|name| *name == field.name) {
                    Some(slot) => slot,
                    None => {
                        names.push(field.name.clone());
                        names.len() - 1
                    }
                };
                fields.push(field.clone());
                slots.push((native_idx, slot));
            }
            Some(result)
        } else {
            None
        };

        let column_index = Arc::new(index_columns(&names));
        Self {
            backend,
            handle,
            fields,
            slots,
            column_names: Arc::new(names),
            column_index,
            position: 0,
        }
    }

    /// Whether a result handle is present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of rows, or `None` without a result handle.
    #[must_use]
    pub fn row_count(&self) -> Option<usize> {
        self.handle.as_ref().map(|handle| handle.rows.len())
    }

    /// Move to an absolute zero-based row. Returns `false` without a handle or when the
    /// row is out of range.
    pub fn seek(&mut self, row: usize) -> bool {
        match &self.handle {
            Some(handle) if row < handle.rows.len() => {
                self.position = row;
                true
            }
            _ => false,
        }
    }

    /// Fetch the next row, `None` at end of data.
    pub fn next_row(&mut self) -> Option<DbRow> {
        let raw = self.handle.as_ref()?.rows.get(self.position)?;
        self.position += 1;

        let mut values: Vec<Option<RowValues>> = vec![None; self.column_names.len()];
        for (field, &(native_idx, slot)) in self.fields.iter().zip(&self.slots) {
            let cell = raw.get(native_idx).cloned().unwrap_or(RowValues::Null);
            let value = decode(field, cell);
            if !value.is_null() || values[slot].is_none() {
                values[slot] = Some(value);
            }
        }

        Some(DbRow::with_index(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            values
                .into_iter()
                .map(|value| value.unwrap_or(RowValues::Null))
                .collect(),
        ))
    }

    /// First column of the first row. Rewinds the cursor.
    pub fn value(&mut self) -> Option<RowValues> {
        if !self.seek(0) {
            return None;
        }
        self.next_row()
            .and_then(|row| row.values.into_iter().next())
    }

    /// Every value of one column, from the first row. Rewinds the cursor.
    pub fn column(&mut self, name: &str) -> Vec<RowValues> {
        if !self.seek(0) {
            return Vec::new();
        }
        let mut out = Vec::new();
        while let Some(row) = self.next_row() {
            if let Some(value) = row.get(name) {
                out.push(value.clone());
            }
        }
        out
    }
}

impl Iterator for ResultCursor {
    type Item = DbRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}
