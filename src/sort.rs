use crate::{
    FieldValue, Record, ValueKind,
    schema::{FieldDescriptor, Reflection},
    statics,
};
use std::cmp::Ordering;

/// Active sort column and direction. Action columns never become active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    column: Option<usize>,
    ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    pub fn is_sortable(column: usize) -> bool {
        column >= statics::COLUMN_NAME
    }

    /// Header click: same column flips direction, another column becomes
    /// active ascending. Returns false for clicks on action columns.
    pub fn toggle(&mut self, column: usize) -> bool {
        if !Self::is_sortable(column) {
            return false;
        }
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
        true
    }

    /// Drops the active column when it no longer exists.
    pub fn clamp_to(&mut self, column_count: usize) {
        if self.column.is_some_and(|c| c >= column_count) {
            *self = Self::default();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn glyph_for(&self, column: usize) -> &'static str {
        match self.column {
            Some(c) if c == column && self.ascending => statics::EN_GLYPH_SORT_ASC,
            Some(c) if c == column => statics::EN_GLYPH_SORT_DESC,
            _ => "",
        }
    }
}

/// Value a record is ordered by in `column`, or `None` when the column is not
/// orderable (action columns, opaque fields, unknown columns).
pub fn sort_key(
    reflection: &dyn Reflection,
    fields: &[FieldDescriptor],
    column: usize,
    record: &Record,
) -> Option<FieldValue> {
    if column == statics::COLUMN_NAME {
        return Some(FieldValue::String(record.name().to_string()));
    }
    let field = fields.get(column.checked_sub(statics::FIRST_FIELD_COLUMN)?)?;
    if field.kind == ValueKind::Opaque {
        return None;
    }
    Some(
        reflection
            .get_field(record, &field.name)
            .unwrap_or_else(|| FieldValue::default_for(field.kind)),
    )
}

/// Ascending comparison of two records in `column`.
pub fn compare(
    reflection: &dyn Reflection,
    fields: &[FieldDescriptor],
    column: usize,
    a: &Record,
    b: &Record,
) -> Option<Ordering> {
    let ka = sort_key(reflection, fields, column, a)?;
    let kb = sort_key(reflection, fields, column, b)?;
    Some(ka.sort_cmp(&kb).unwrap_or(Ordering::Equal))
}

/// Stable in-place sort by `state`. Equal keys keep their prior relative
/// order in either direction; unorderable columns leave the order untouched.
pub fn sort_records(
    reflection: &dyn Reflection,
    fields: &[FieldDescriptor],
    state: &SortState,
    records: &mut Vec<Record>,
) {
    let Some(column) = state.column() else {
        return;
    };
    if !SortState::is_sortable(column) {
        return;
    }
    let keys: Option<Vec<FieldValue>> = records
        .iter()
        .map(|r| sort_key(reflection, fields, column, r))
        .collect();
    let Some(keys) = keys else {
        return;
    };

    let mut keyed: Vec<(FieldValue, Record)> = keys.into_iter().zip(records.drain(..)).collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.sort_cmp(b).unwrap_or(Ordering::Equal);
        if state.ascending() { ord } else { ord.reverse() }
    });
    records.extend(keyed.into_iter().map(|(_, r)| r));
}
