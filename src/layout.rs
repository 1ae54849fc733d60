//! Per-type column widths, persisted through the preference store.

use crate::{
    error::LayoutError,
    prefs::PreferenceStore,
    schema::{FieldDescriptor, TypeDescriptor},
    statics,
};
use tracing::debug;

/// Widths for every column of one record type, fixed columns included.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    type_id: String,
    widths: Vec<f32>,
}

impl ColumnLayout {
    /// Restores the stored widths for `ty`, or generates defaults when none are
    /// stored or the stored ones do not fit `fields`.
    pub fn load_or_default(
        prefs: &dyn PreferenceStore,
        ty: &TypeDescriptor,
        fields: &[FieldDescriptor],
    ) -> Self {
        let expected = statics::FIRST_FIELD_COLUMN + fields.len();
        let stored = prefs.get(&prefs_key(ty));
        let widths = match stored.as_deref().map(|s| parse_widths(s, expected)) {
            Some(Ok(widths)) => widths,
            Some(Err(e)) => {
                debug!(type_id = %ty.qualified_id, error = %e, "discarding stored column widths");
                default_widths(fields)
            }
            None => default_widths(fields),
        };
        Self {
            type_id: ty.qualified_id.clone(),
            widths,
        }
    }

    pub fn save(&self, prefs: &mut dyn PreferenceStore) {
        prefs.set(&key_for_id(&self.type_id), &format_widths(&self.widths));
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn width(&self, column: usize) -> Option<f32> {
        self.widths.get(column).copied()
    }

    /// Sets a column width, never below the drag floor. Out-of-range columns
    /// are ignored.
    pub fn set_width(&mut self, column: usize, width: f32) {
        if let Some(slot) = self.widths.get_mut(column) {
            *slot = width.max(statics::COL_WIDTH_FLOOR);
        }
    }
}

pub fn prefs_key(ty: &TypeDescriptor) -> String {
    key_for_id(&ty.qualified_id)
}

fn key_for_id(type_id: &str) -> String {
    format!("{}{}", statics::PREFS_COLUMN_WIDTHS_PREFIX, type_id)
}

/// Action, action, name, then one width per field sized to its label.
pub fn default_widths(fields: &[FieldDescriptor]) -> Vec<f32> {
    let mut widths = vec![
        statics::COL_WIDTH_DUPLICATE,
        statics::COL_WIDTH_DELETE,
        statics::COL_WIDTH_NAME,
    ];
    widths.extend(fields.iter().map(|f| {
        (f.name.chars().count() as f32 * statics::COL_WIDTH_PER_LABEL_CHAR)
            .max(statics::COL_WIDTH_FIELD_MIN)
    }));
    widths
}

pub fn format_widths(widths: &[f32]) -> String {
    widths
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_widths(text: &str, expected: usize) -> Result<Vec<f32>, LayoutError> {
    let widths = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .ok()
                .filter(|w| w.is_finite() && *w > 0.0)
                .ok_or_else(|| LayoutError::Malformed(part.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if widths.len() != expected {
        return Err(LayoutError::CountMismatch {
            stored: widths.len(),
            expected,
        });
    }
    Ok(widths)
}

#[cfg(test)]
mod tests {
    use super::{ColumnLayout, default_widths, parse_widths, prefs_key};
    use crate::{
        ValueKind,
        error::LayoutError,
        prefs::{MemoryPreferences, PreferenceStore},
        schema::{Constraints, FieldDescriptor, TypeDescriptor},
    };
    use pretty_assertions::assert_eq;

    fn weapon() -> TypeDescriptor {
        TypeDescriptor {
            name: "Weapon".into(),
            qualified_id: "Game::Weapon".into(),
            module: "Game".into(),
            base: None,
            is_abstract: false,
        }
    }

    fn field(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.into(),
            kind: ValueKind::Integer,
            constraints: Constraints::default(),
            target: None,
        }
    }

    #[test]
    fn defaults_scale_with_label_length() {
        let widths = default_widths(&[field("hp"), field("averageDamagePerSecond")]);
        assert_eq!(widths, vec![35.0, 35.0, 150.0, 100.0, 220.0]);
    }

    #[test]
    fn widths_survive_a_new_session() {
        let fields = [field("damage"), field("speed")];
        let mut prefs = MemoryPreferences::new();

        let mut layout = ColumnLayout::load_or_default(&prefs, &weapon(), &fields);
        layout.set_width(3, 180.5);
        layout.set_width(4, 5.0);
        layout.save(&mut prefs);

        let restored = ColumnLayout::load_or_default(&prefs, &weapon(), &fields);
        assert_eq!(restored.widths(), &[35.0, 35.0, 150.0, 180.5, 20.0]);
    }

    #[test]
    fn changed_field_count_regenerates_defaults() {
        let mut prefs = MemoryPreferences::new();
        let mut layout = ColumnLayout::load_or_default(&prefs, &weapon(), &[field("damage")]);
        layout.set_width(3, 400.0);
        layout.save(&mut prefs);

        let fields = [field("damage"), field("speed")];
        let restored = ColumnLayout::load_or_default(&prefs, &weapon(), &fields);
        assert_eq!(restored.widths(), default_widths(&fields).as_slice());
    }

    #[test]
    fn malformed_widths_are_discarded() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(&prefs_key(&weapon()), "35,abc,150,100");
        let fields = [field("damage")];
        let restored = ColumnLayout::load_or_default(&prefs, &weapon(), &fields);
        assert_eq!(restored.widths(), default_widths(&fields).as_slice());

        assert_eq!(
            parse_widths("1,2", 3),
            Err(LayoutError::CountMismatch {
                stored: 2,
                expected: 3
            })
        );
        assert!(matches!(
            parse_widths("1,-2,3", 3),
            Err(LayoutError::Malformed(_))
        ));
        assert!(matches!(parse_widths("", 1), Err(LayoutError::Malformed(_))));
    }
}
