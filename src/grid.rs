//! Grid controller: column model, header hit testing, column resizing and
//! editor selection. Nothing here touches a rendering surface; the GUI feeds
//! pointer positions in and applies the resulting [`GridIntent`]s.

use crate::{
    AssetPath, AssetValue, FieldValue, Record, ValueKind,
    layout::ColumnLayout,
    schema::{ColorUsage, Constraints, FieldDescriptor, Reflection},
    sort::SortState,
    statics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Duplicate,
    Delete,
    Name,
    /// Index into the field descriptor list.
    Field(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub index: usize,
    pub role: ColumnRole,
    pub label: String,
    pub width: f32,
}

impl GridColumn {
    pub fn is_sortable(&self) -> bool {
        SortState::is_sortable(self.index)
    }

    /// Header text with the sort glyph appended on the active column.
    pub fn header_text(&self, sort: &SortState) -> String {
        format!("{}{}", self.label, sort.glyph_for(self.index))
    }
}

/// The fixed action and name columns followed by one column per field.
pub fn columns(fields: &[FieldDescriptor], layout: &ColumnLayout) -> Vec<GridColumn> {
    let fixed = [
        (ColumnRole::Duplicate, statics::EN_COL_DUPLICATE),
        (ColumnRole::Delete, statics::EN_COL_DELETE),
        (ColumnRole::Name, statics::EN_COL_NAME),
    ];
    let fixed = fixed
        .into_iter()
        .map(|(role, label)| (role, label.to_string()));
    let per_field = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (ColumnRole::Field(i), f.name.clone()));

    fixed
        .chain(per_field)
        .enumerate()
        .map(|(index, (role, label))| GridColumn {
            index,
            role,
            label,
            width: layout.width(index).unwrap_or(statics::COL_WIDTH_FIELD_MIN),
        })
        .collect()
}

/// Reads a cell for display. Values the reflection provider cannot produce
/// fall back to the raw document value.
pub fn cell_value(
    reflection: &dyn Reflection,
    record: &Record,
    field: &FieldDescriptor,
) -> FieldValue {
    reflection
        .get_field(record, &field.name)
        .unwrap_or_else(|| {
            FieldValue::Opaque(record.raw(&field.name).cloned().unwrap_or(AssetValue::Null))
        })
}

/// What the user asked the grid to do.
#[derive(Debug, Clone, PartialEq)]
pub enum GridIntent {
    StartResize {
        column: usize,
    },
    DragResize {
        column: usize,
        width: f32,
    },
    EndResize {
        column: usize,
    },
    ToggleSort(usize),
    /// Set a field and write the record right away.
    EditField {
        record: AssetPath,
        field: String,
        value: FieldValue,
    },
    /// Set a field in memory only; the record stays dirty until committed.
    StageField {
        record: AssetPath,
        field: String,
        value: FieldValue,
    },
    Commit(AssetPath),
    RequestDuplicate(AssetPath),
    RequestDelete(AssetPath),
}

/// Where a header-relative x coordinate lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderHit {
    /// Resize handle on the right edge of the column.
    Handle(usize),
    Cell(usize),
    Outside,
}

/// Handles span `[right - 4, right + 4)` around each column's right edge and
/// win over the cell underneath.
pub fn hit_test(widths: &[f32], x: f32) -> HeaderHit {
    let half = statics::RESIZE_HANDLE_HALF_WIDTH;
    let mut right = 0.0_f32;
    let mut edges = Vec::with_capacity(widths.len());
    for &w in widths {
        right += w;
        edges.push(right);
    }

    if let Some(column) = edges
        .iter()
        .position(|&edge| x >= edge - half && x < edge + half)
    {
        return HeaderHit::Handle(column);
    }

    let mut left = 0.0;
    for (column, &edge) in edges.iter().enumerate() {
        if x >= left && x < edge {
            return HeaderHit::Cell(column);
        }
        left = edge;
    }
    HeaderHit::Outside
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32 },
    Move { x: f32 },
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ResizeState {
    #[default]
    Idle,
    Resizing {
        column: usize,
        anchor_x: f32,
        anchor_width: f32,
    },
}

impl ResizeState {
    pub fn is_resizing(&self) -> bool {
        matches!(self, ResizeState::Resizing { .. })
    }

    pub fn active_column(&self) -> Option<usize> {
        match self {
            ResizeState::Resizing { column, .. } => Some(*column),
            ResizeState::Idle => None,
        }
    }

    /// Advances the header interaction by one pointer event. `widths` are the
    /// current column widths in display order.
    pub fn on_pointer(&mut self, event: PointerEvent, widths: &[f32]) -> Option<GridIntent> {
        match (*self, event) {
            (ResizeState::Idle, PointerEvent::Down { x }) => match hit_test(widths, x) {
                HeaderHit::Handle(column) => {
                    *self = ResizeState::Resizing {
                        column,
                        anchor_x: x,
                        anchor_width: widths[column],
                    };
                    Some(GridIntent::StartResize { column })
                }
                HeaderHit::Cell(column) => Some(GridIntent::ToggleSort(column)),
                HeaderHit::Outside => None,
            },
            (
                ResizeState::Resizing {
                    column,
                    anchor_x,
                    anchor_width,
                },
                PointerEvent::Move { x },
            ) => Some(GridIntent::DragResize {
                column,
                width: (anchor_width + (x - anchor_x)).max(statics::COL_WIDTH_FLOOR),
            }),
            (ResizeState::Resizing { column, .. }, PointerEvent::Up) => {
                *self = ResizeState::Idle;
                Some(GridIntent::EndResize { column })
            }
            // A second press while dragging, or stray moves/releases, change nothing.
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = ResizeState::Idle;
    }
}

/// Widget used to edit one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorKind {
    FloatSlider { min: f64, max: f64 },
    IntSlider { min: i64, max: i64 },
    FloatMin { min: f64 },
    IntMin { min: i64 },
    TextArea { lines: u32 },
    Color(ColorUsage),
    Default(ValueKind),
}

/// First matching rule wins.
pub fn select_editor(kind: ValueKind, constraints: &Constraints) -> EditorKind {
    match (kind, constraints) {
        (
            ValueKind::Float,
            Constraints {
                range: Some((min, max)),
                ..
            },
        ) => EditorKind::FloatSlider {
            min: *min,
            max: *max,
        },
        (
            ValueKind::Integer,
            Constraints {
                range: Some((min, max)),
                ..
            },
        ) => {
            let min = min.round() as i64;
            EditorKind::IntSlider {
                min,
                max: (max.round() as i64).max(min),
            }
        }
        (ValueKind::Float, Constraints { min: Some(min), .. }) => {
            EditorKind::FloatMin { min: *min }
        }
        (ValueKind::Integer, Constraints { min: Some(min), .. }) => EditorKind::IntMin {
            min: min.ceil() as i64,
        },
        (
            ValueKind::String,
            Constraints {
                multiline: Some(lines),
                ..
            },
        ) => EditorKind::TextArea { lines: *lines },
        (ValueKind::Color, c) => EditorKind::Color(c.color.unwrap_or_default()),
        (kind, _) => EditorKind::Default(kind),
    }
}

impl EditorKind {
    /// Bounds an edited value before it is written back.
    pub fn clamp(&self, value: FieldValue) -> FieldValue {
        match (self, value) {
            (EditorKind::FloatSlider { min, max }, FieldValue::Float(v)) => {
                FieldValue::Float(v.clamp(*min, *max))
            }
            (EditorKind::IntSlider { min, max }, FieldValue::Integer(v)) => {
                FieldValue::Integer(v.clamp(*min, *max))
            }
            (EditorKind::FloatMin { min }, FieldValue::Float(v)) => FieldValue::Float(v.max(*min)),
            (EditorKind::IntMin { min }, FieldValue::Integer(v)) => {
                FieldValue::Integer(v.max(*min))
            }
            (_, value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ColumnRole, EditorKind, GridIntent, HeaderHit, PointerEvent, ResizeState, cell_value,
        columns, hit_test, select_editor,
    };
    use crate::{
        AssetPath, AssetValue, FieldValue, Record, ValueKind,
        layout::ColumnLayout,
        prefs::MemoryPreferences,
        schema::{self, ColorUsage, Constraints, describe_fields},
        sort::SortState,
    };
    use pretty_assertions::assert_eq;

    const WIDTHS: [f32; 4] = [35.0, 35.0, 150.0, 100.0];

    #[test]
    fn hit_test_prefers_handles_over_cells() {
        assert_eq!(hit_test(&WIDTHS, 10.0), HeaderHit::Cell(0));
        assert_eq!(hit_test(&WIDTHS, 31.0), HeaderHit::Handle(0));
        // Left half of column 1's first pixels still belong to column 0's handle.
        assert_eq!(hit_test(&WIDTHS, 38.9), HeaderHit::Handle(0));
        assert_eq!(hit_test(&WIDTHS, 39.0), HeaderHit::Cell(1));
        assert_eq!(hit_test(&WIDTHS, 216.0), HeaderHit::Handle(2));
        assert_eq!(hit_test(&WIDTHS, 250.0), HeaderHit::Cell(3));
        assert_eq!(hit_test(&WIDTHS, 323.9), HeaderHit::Handle(3));
        assert_eq!(hit_test(&WIDTHS, 324.0), HeaderHit::Outside);
        assert_eq!(hit_test(&WIDTHS, -1.0), HeaderHit::Outside);
    }

    #[test]
    fn resize_machine_transitions() {
        let mut state = ResizeState::default();
        assert_eq!(
            state.on_pointer(PointerEvent::Move { x: 100.0 }, &WIDTHS),
            None
        );

        assert_eq!(
            state.on_pointer(PointerEvent::Down { x: 220.0 }, &WIDTHS),
            Some(GridIntent::StartResize { column: 2 })
        );
        assert_eq!(state.active_column(), Some(2));

        assert_eq!(
            state.on_pointer(PointerEvent::Move { x: 250.0 }, &WIDTHS),
            Some(GridIntent::DragResize {
                column: 2,
                width: 180.0
            })
        );
        // Dragging far left stops at the floor.
        assert_eq!(
            state.on_pointer(PointerEvent::Move { x: -500.0 }, &WIDTHS),
            Some(GridIntent::DragResize {
                column: 2,
                width: 20.0
            })
        );
        assert_eq!(
            state.on_pointer(PointerEvent::Down { x: 10.0 }, &WIDTHS),
            None
        );

        assert_eq!(
            state.on_pointer(PointerEvent::Up, &WIDTHS),
            Some(GridIntent::EndResize { column: 2 })
        );
        assert!(!state.is_resizing());
        assert_eq!(state.on_pointer(PointerEvent::Up, &WIDTHS), None);
    }

    #[test]
    fn click_off_handle_toggles_sort() {
        let mut state = ResizeState::default();
        assert_eq!(
            state.on_pointer(PointerEvent::Down { x: 100.0 }, &WIDTHS),
            Some(GridIntent::ToggleSort(2))
        );
        assert_eq!(state, ResizeState::Idle);
    }

    #[test]
    fn editor_priority_table() {
        let range = Constraints {
            range: Some((0.0, 10.0)),
            min: Some(5.0),
            multiline: Some(3),
            ..Constraints::default()
        };
        assert_eq!(
            select_editor(ValueKind::Float, &range),
            EditorKind::FloatSlider {
                min: 0.0,
                max: 10.0
            }
        );
        assert_eq!(
            select_editor(ValueKind::Integer, &range),
            EditorKind::IntSlider { min: 0, max: 10 }
        );
        assert_eq!(
            select_editor(ValueKind::String, &range),
            EditorKind::TextArea { lines: 3 }
        );

        let min_only = Constraints {
            min: Some(1.5),
            ..Constraints::default()
        };
        assert_eq!(
            select_editor(ValueKind::Float, &min_only),
            EditorKind::FloatMin { min: 1.5 }
        );
        assert_eq!(
            select_editor(ValueKind::Integer, &min_only),
            EditorKind::IntMin { min: 2 }
        );
        // Constraints that do not apply to the kind are ignored.
        assert_eq!(
            select_editor(ValueKind::Boolean, &range),
            EditorKind::Default(ValueKind::Boolean)
        );

        assert_eq!(
            select_editor(ValueKind::Color, &Constraints::default()),
            EditorKind::Color(ColorUsage {
                show_alpha: true,
                hdr: false
            })
        );
        assert_eq!(
            select_editor(ValueKind::Opaque, &Constraints::default()),
            EditorKind::Default(ValueKind::Opaque)
        );
    }

    #[test]
    fn editors_clamp_edits() {
        let slider = EditorKind::FloatSlider { min: 0.5, max: 2.0 };
        assert_eq!(slider.clamp(FieldValue::Float(9.0)), FieldValue::Float(2.0));
        let int_min = EditorKind::IntMin { min: 1 };
        assert_eq!(int_min.clamp(FieldValue::Integer(-3)), FieldValue::Integer(1));
        let int_slider = EditorKind::IntSlider { min: 0, max: 100 };
        assert_eq!(
            int_slider.clamp(FieldValue::Integer(150)),
            FieldValue::Integer(100)
        );
        // Mismatched values pass through untouched.
        assert_eq!(
            slider.clamp(FieldValue::Boolean(true)),
            FieldValue::Boolean(true)
        );
    }

    #[test]
    fn columns_follow_layout_and_fields() {
        let reg = schema::tests::registry();
        let ammo = Record::new("Ammo", AssetPath::new("Loot/Arrow.asset"));
        let fields = describe_fields(&reg, &ammo);
        let ty = reg.descriptor("Ammo").unwrap();
        let layout = ColumnLayout::load_or_default(&MemoryPreferences::new(), ty, &fields);

        let cols = columns(&fields, &layout);
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].role, ColumnRole::Duplicate);
        assert_eq!(cols[2].role, ColumnRole::Name);
        assert_eq!(cols[3].role, ColumnRole::Field(0));
        assert_eq!(cols[3].label, "count");
        assert_eq!(cols[3].width, 100.0);
        assert!(!cols[1].is_sortable());

        let mut sort = SortState::default();
        sort.toggle(3);
        sort.toggle(3);
        assert_eq!(cols[3].header_text(&sort), "count ▼");
        assert_eq!(cols[2].header_text(&sort), "Instance Name");
    }

    #[test]
    fn undeclared_cells_fall_back_to_raw_value() {
        let reg = schema::tests::registry();
        let rec = Record::new("Mystery", AssetPath::new("m.asset"))
            .with_field("speed", AssetValue::Bool(true));
        let fields = describe_fields(&reg, &Record::new("Weapon", AssetPath::new("w.asset")));
        let speed = fields.iter().find(|f| f.name == "speed").unwrap();
        assert_eq!(
            cell_value(&reg, &rec, speed),
            FieldValue::Opaque(AssetValue::Bool(true))
        );
    }
}
