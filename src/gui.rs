use crate::{
    AssetPath, AssetValue, FieldValue, Record, Rgba, Session, ValueKind,
    catalog::ModuleFilter,
    config::AppConfig,
    error::GridError,
    grid::{self, ColumnRole, EditorKind, GridColumn, GridIntent, PointerEvent},
    prefs::JsonPreferences,
    schema::{FieldDescriptor, TypeRegistry},
    statics,
    store::{ApproximateMeter, FsRecordStore, RecordStore},
};
use anyhow::Context;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};
use tracing::{debug, warn};

pub fn run_gui(config: AppConfig) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AssetGridApp::new(config)?))),
    )
}

/// A missing schema file is an empty project; a malformed one is an error.
fn load_registry(path: &Path) -> anyhow::Result<TypeRegistry> {
    if !path.exists() {
        warn!(path = %path.display(), "no schema file, starting with no types");
        return Ok(TypeRegistry::empty());
    }
    TypeRegistry::load(path).with_context(|| format!("loading schema {}", path.display()))
}

/// Session failures are already on the session's error line.
fn settle<T>(result: Result<T, GridError>) -> Option<T> {
    result.ok()
}

/// Header drag as seen on screen, before it is mapped to grid coordinates.
#[derive(Clone, Copy, Debug)]
enum HeaderDrag {
    Start { column: usize, screen_x: f32 },
    Move { screen_x: f32 },
    Stop,
}

/// Window state around one [`Session`]: input buffers and dialog plumbing.
struct AssetGridApp {
    config: AppConfig,
    session: Session,

    scope_input: String,
    type_search: String,
    instance_search: String,
    create_count_input: i64,

    /// Screen x and grid x where the current column drag began.
    drag_anchor: Option<(f32, f32)>,
    /// Text of opaque cells being edited, keyed by record path and field.
    opaque_buffers: HashMap<(AssetPath, String), String>,
    /// Records with staged edits not yet written.
    pending_commits: BTreeSet<AssetPath>,

    status: String,
    last_error: Option<String>,
}

impl AssetGridApp {
    fn new(config: AppConfig) -> anyhow::Result<Self> {
        let registry = load_registry(&config.schema_path)?;
        let prefs = JsonPreferences::open(&config.prefs_path)?;
        let store = FsRecordStore::new(&config.project_root);
        let mut session = Session::new(
            Box::new(store),
            registry,
            Box::new(prefs),
            Box::new(ApproximateMeter),
        )
        .with_scope(config.scope.clone());
        settle(session.refresh_catalog());

        Ok(Self {
            scope_input: config.scope.to_string(),
            type_search: String::new(),
            instance_search: String::new(),
            create_count_input: i64::from(session.create_count()),
            drag_anchor: None,
            opaque_buffers: HashMap::new(),
            pending_commits: BTreeSet::new(),
            status: String::new(),
            last_error: None,
            config,
            session,
        })
    }

    fn browse_scope(&mut self) {
        let start = self.session.scope().to_fs_path(&self.config.project_root);
        let Some(picked) = rfd::FileDialog::new()
            .set_title(statics::EN_DIALOG_PICK_FOLDER)
            .set_directory(start)
            .pick_folder()
        else {
            return;
        };
        match AssetPath::from_fs_path(&self.config.project_root, &picked) {
            Some(scope) => {
                self.scope_input = scope.to_string();
                self.last_error = None;
                settle(self.session.set_scope(scope));
            }
            None => {
                self.last_error = Some(format!(
                    "{} {} {}",
                    statics::EN_ERR_PREFIX,
                    picked.display(),
                    statics::EN_ERR_OUTSIDE_PROJECT
                ));
            }
        }
    }

    fn refresh(&mut self) {
        match load_registry(&self.config.schema_path) {
            Ok(registry) => {
                self.last_error = None;
                settle(self.session.replace_registry(registry));
                self.opaque_buffers.clear();
                self.status = format!("{} {}", statics::EN_STATUS_REFRESHED, self.session.scope());
            }
            Err(e) => {
                self.last_error = Some(format!("{} {e:#}", statics::EN_ERR_PREFIX));
            }
        }
    }

    fn create_new(&mut self) {
        let Some(ty) = self.session.selected_type().cloned() else {
            return;
        };
        let folder = self
            .session
            .default_create_folder()
            .to_fs_path(&self.config.project_root);
        let Some(picked) = rfd::FileDialog::new()
            .set_title(format!("{} {}", statics::EN_DIALOG_CREATE_PREFIX, ty.name))
            .set_directory(folder)
            .set_file_name(format!("{}.{}", ty.name, statics::ASSET_EXTENSION))
            .add_filter(&ty.name, &[statics::ASSET_EXTENSION])
            .save_file()
        else {
            return;
        };
        let Some(base) = AssetPath::from_fs_path(&self.config.project_root, &picked) else {
            self.last_error = Some(format!(
                "{} {} {}",
                statics::EN_ERR_PREFIX,
                picked.display(),
                statics::EN_ERR_OUTSIDE_PROJECT
            ));
            return;
        };
        self.last_error = None;
        settle(self.session.create_instances(&base));
    }

    fn render_assets_region(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new(statics::EN_REGION_ASSETS)
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(statics::EN_LABEL_PATH);
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.scope_input).desired_width(320.0),
                    );
                    if resp.lost_focus() && self.scope_input != self.session.scope().as_str() {
                        settle(self.session.set_scope(AssetPath::new(
                            self.scope_input.trim().trim_matches('/'),
                        )));
                    }
                    if ui.button(statics::EN_BTN_BROWSE).clicked() {
                        self.browse_scope();
                    }
                    if ui
                        .button(statics::EN_BTN_REFRESH)
                        .on_hover_text(statics::EN_HINT_REFRESH)
                        .clicked()
                    {
                        self.refresh();
                    }
                });

                let current = match self.session.module_filter() {
                    ModuleFilter::All => statics::EN_MODULES_ALL.to_string(),
                    ModuleFilter::Only(m) => m.clone(),
                };
                let modules = self.session.catalog().modules().to_vec();
                let mut chosen = None;
                egui::ComboBox::from_id_salt("module_filter")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        let all = *self.session.module_filter() == ModuleFilter::All;
                        if ui.selectable_label(all, statics::EN_MODULES_ALL).clicked() {
                            chosen = Some(ModuleFilter::All);
                        }
                        for m in modules {
                            let on = *self.session.module_filter() == ModuleFilter::Only(m.clone());
                            if ui.selectable_label(on, &m).clicked() {
                                chosen = Some(ModuleFilter::Only(m));
                            }
                        }
                    });
                if let Some(module) = chosen {
                    settle(self.session.set_module_filter(module));
                }
            });
    }

    fn render_stats_region(&mut self, ui: &mut egui::Ui) {
        let stats = self.session.stats();
        egui::CollapsingHeader::new(statics::EN_REGION_STATS)
            .default_open(true)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("{} {}", statics::EN_STAT_COUNT, stats.count));
                    ui.separator();
                    ui.label(format!(
                        "{} {:.1} KB",
                        statics::EN_STAT_TOTAL_MEMORY,
                        stats.total_kb()
                    ));
                    ui.separator();
                    ui.label(format!(
                        "{} {:.1} KB",
                        statics::EN_STAT_FILTERED_MEMORY,
                        stats.filtered_kb()
                    ));
                });
            });
    }

    fn render_selectors(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(statics::EN_LABEL_SEARCH_TYPES);
            if ui
                .add(egui::TextEdit::singleline(&mut self.type_search).desired_width(160.0))
                .changed()
            {
                settle(self.session.set_type_search(&self.type_search));
            }

            ui.label(statics::EN_LABEL_TYPE);
            let names: Vec<String> = self
                .session
                .catalog()
                .types()
                .iter()
                .map(|t| t.name.clone())
                .collect();
            let selected = self.session.selected_type().map(|t| t.name.clone());
            let mut chosen = None;
            egui::ComboBox::from_id_salt("type_selector")
                .selected_text(
                    selected
                        .clone()
                        .unwrap_or_else(|| statics::EN_NO_TYPES.to_string()),
                )
                .show_ui(ui, |ui| {
                    for name in names {
                        let on = selected.as_deref() == Some(name.as_str());
                        if ui.selectable_label(on, &name).clicked() && !on {
                            chosen = Some(name);
                        }
                    }
                });
            if let Some(name) = chosen {
                self.opaque_buffers.clear();
                settle(self.session.select_type(&name));
            }

            let mut include = self.session.filter().include_derived;
            if ui
                .checkbox(&mut include, statics::EN_LABEL_INCLUDE_DERIVED)
                .changed()
            {
                settle(self.session.set_include_derived(include));
            }
        });

        ui.horizontal(|ui| {
            ui.label(statics::EN_LABEL_SEARCH_INSTANCES);
            if ui
                .add(egui::TextEdit::singleline(&mut self.instance_search).desired_width(160.0))
                .changed()
            {
                settle(self.session.set_instance_search(&self.instance_search));
            }

            ui.separator();
            ui.label(statics::EN_LABEL_AMOUNT);
            if ui
                .add(
                    egui::DragValue::new(&mut self.create_count_input)
                        .range(1..=i64::from(statics::CREATE_COUNT_MAX)),
                )
                .changed()
            {
                self.session.set_create_count(self.create_count_input);
                self.create_count_input = i64::from(self.session.create_count());
            }
            let can_create = self.session.selected_type().is_some();
            if ui
                .add_enabled(can_create, egui::Button::new(statics::EN_BTN_ADD))
                .on_hover_text(statics::EN_HINT_ADD)
                .clicked()
            {
                self.create_new();
            }
        });
    }

    fn render_grid(&mut self, ui: &mut egui::Ui) {
        if self.session.selected_type().is_none() {
            ui.label(statics::EN_NO_TYPES);
            return;
        }
        let columns = self.session.columns();
        let fields = self.session.fields().to_vec();
        let row_h = row_height(ui.text_style_height(&egui::TextStyle::Body), &fields);
        let header_h = ui.text_style_height(&egui::TextStyle::Body) + 8.0;

        let mut intents: Vec<GridIntent> = Vec::new();
        let mut drags: Vec<HeaderDrag> = Vec::new();
        let mut parse_errors: Vec<String> = Vec::new();

        let session = &self.session;
        let buffers = &mut self.opaque_buffers;
        let records = session.objects().records();
        if records.is_empty() {
            ui.label(statics::EN_NO_RECORDS);
        }

        egui::ScrollArea::horizontal()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let mut table = TableBuilder::new(ui)
                    .striped(true)
                    .resizable(false)
                    .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
                for c in &columns {
                    table = table.column(Column::exact(c.width));
                }
                table
                    .header(header_h, |mut header| {
                        for c in &columns {
                            header.col(|ui| {
                                render_header_cell(ui, c, session, &mut intents, &mut drags);
                            });
                        }
                    })
                    .body(|body| {
                        body.rows(row_h, records.len(), |mut row| {
                            let record = &records[row.index()];
                            for c in &columns {
                                row.col(|ui| match c.role {
                                    ColumnRole::Duplicate => {
                                        if ui
                                            .small_button(statics::EN_BTN_DUPLICATE_ROW)
                                            .on_hover_text(statics::EN_HINT_DUPLICATE_ROW)
                                            .clicked()
                                        {
                                            intents.push(GridIntent::RequestDuplicate(
                                                record.path().clone(),
                                            ));
                                        }
                                    }
                                    ColumnRole::Delete => {
                                        if ui
                                            .small_button(statics::EN_BTN_DELETE_ROW)
                                            .on_hover_text(statics::EN_HINT_DELETE_ROW)
                                            .clicked()
                                        {
                                            intents.push(GridIntent::RequestDelete(
                                                record.path().clone(),
                                            ));
                                        }
                                    }
                                    ColumnRole::Name => {
                                        ui.label(record.name())
                                            .on_hover_text(record.path().as_str());
                                    }
                                    ColumnRole::Field(i) => {
                                        let Some(field) = fields.get(i) else {
                                            return;
                                        };
                                        ui.push_id((record.path().as_str(), &field.name), |ui| {
                                            render_cell(
                                                ui,
                                                session,
                                                record,
                                                field,
                                                buffers,
                                                &mut intents,
                                                &mut parse_errors,
                                            );
                                        });
                                    }
                                });
                            }
                        });
                    });
            });

        self.apply_header_drags(&drags);
        for intent in intents {
            if let GridIntent::StageField { record, .. } = &intent {
                self.pending_commits.insert(record.clone());
            }
            settle(self.session.apply(intent));
        }
        if let Some(e) = parse_errors.pop() {
            self.last_error = Some(format!("{} {e}", statics::EN_ERR_PREFIX));
        }
    }

    /// Writes staged edits once the pointer is released and no widget holds
    /// focus, so a slider drag or a typing burst costs one save per record.
    fn commit_when_idle(&mut self, ctx: &egui::Context) {
        if self.pending_commits.is_empty() {
            return;
        }
        let busy = ctx.input(|i| i.pointer.any_down()) || ctx.memory(|m| m.focused().is_some());
        if busy {
            return;
        }
        for path in std::mem::take(&mut self.pending_commits) {
            settle(self.session.apply(GridIntent::Commit(path)));
        }
    }

    /// Maps screen-space drags onto grid x coordinates and feeds them to the
    /// session's resize machine.
    fn apply_header_drags(&mut self, drags: &[HeaderDrag]) {
        for drag in drags {
            match *drag {
                HeaderDrag::Start { column, screen_x } => {
                    let widths = self
                        .session
                        .layout()
                        .map(|l| l.widths().to_vec())
                        .unwrap_or_default();
                    let edge: f32 = widths.iter().take(column + 1).sum();
                    self.drag_anchor = Some((screen_x, edge));
                    settle(self.session.header_pointer(PointerEvent::Down { x: edge }));
                }
                HeaderDrag::Move { screen_x } => {
                    if let Some((start, edge)) = self.drag_anchor {
                        settle(self.session.header_pointer(PointerEvent::Move {
                            x: edge + (screen_x - start),
                        }));
                    }
                }
                HeaderDrag::Stop => {
                    self.drag_anchor = None;
                    settle(self.session.header_pointer(PointerEvent::Up));
                }
            }
        }
    }
}

fn render_header_cell(
    ui: &mut egui::Ui,
    column: &GridColumn,
    session: &Session,
    intents: &mut Vec<GridIntent>,
    drags: &mut Vec<HeaderDrag>,
) {
    let text = column.header_text(session.sort_state());
    if column.is_sortable() {
        if ui
            .add(egui::Button::new(egui::RichText::new(text).strong()).frame(false))
            .clicked()
        {
            intents.push(GridIntent::ToggleSort(column.index));
        }
    } else {
        ui.strong(text);
    }

    let cell = ui.max_rect();
    let half = statics::RESIZE_HANDLE_HALF_WIDTH;
    let handle = egui::Rect::from_x_y_ranges(
        (cell.right() - half)..=(cell.right() + half),
        cell.y_range(),
    );
    let resp = ui.interact(
        handle,
        ui.id().with(("resize_handle", column.index)),
        egui::Sense::drag(),
    );
    if resp.hovered() || resp.dragged() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
    }
    if resp.drag_started()
        && let Some(p) = resp.interact_pointer_pos()
    {
        drags.push(HeaderDrag::Start {
            column: column.index,
            screen_x: p.x,
        });
    }
    if resp.dragged()
        && let Some(p) = resp.interact_pointer_pos()
    {
        drags.push(HeaderDrag::Move { screen_x: p.x });
    }
    if resp.drag_stopped() {
        drags.push(HeaderDrag::Stop);
    }
}

fn render_cell(
    ui: &mut egui::Ui,
    session: &Session,
    record: &Record,
    field: &FieldDescriptor,
    buffers: &mut HashMap<(AssetPath, String), String>,
    intents: &mut Vec<GridIntent>,
    parse_errors: &mut Vec<String>,
) {
    let current = grid::cell_value(session.registry(), record, field);
    let editor = session.editor_for(field);
    // Toggles and pickers write at once; everything else is staged until idle.
    let one_shot = matches!(
        current,
        FieldValue::Boolean(_) | FieldValue::Reference(_) | FieldValue::Opaque(_)
    );

    let changed = match (editor, current) {
        (EditorKind::FloatSlider { min, max }, FieldValue::Float(mut v)) => ui
            .add(egui::Slider::new(&mut v, min..=max))
            .changed()
            .then_some(FieldValue::Float(v)),
        (EditorKind::IntSlider { min, max }, FieldValue::Integer(mut v)) => ui
            .add(egui::Slider::new(&mut v, min..=max))
            .changed()
            .then_some(FieldValue::Integer(v)),
        (EditorKind::FloatMin { min }, FieldValue::Float(mut v)) => ui
            .add(
                egui::DragValue::new(&mut v)
                    .speed(0.1)
                    .range(min..=f64::MAX),
            )
            .changed()
            .then_some(FieldValue::Float(v)),
        (EditorKind::IntMin { min }, FieldValue::Integer(mut v)) => ui
            .add(egui::DragValue::new(&mut v).range(min..=i64::MAX))
            .changed()
            .then_some(FieldValue::Integer(v)),
        (EditorKind::TextArea { lines }, FieldValue::String(mut s)) => ui
            .add(
                egui::TextEdit::multiline(&mut s)
                    .desired_rows(lines as usize)
                    .desired_width(f32::INFINITY),
            )
            .changed()
            .then_some(FieldValue::String(s)),
        (EditorKind::Color(usage), FieldValue::Color(c)) => {
            render_color(ui, c, usage.show_alpha, usage.hdr).map(FieldValue::Color)
        }
        (_, FieldValue::Integer(mut v)) => ui
            .add(egui::DragValue::new(&mut v))
            .changed()
            .then_some(FieldValue::Integer(v)),
        (_, FieldValue::Boolean(mut b)) => ui
            .checkbox(&mut b, "")
            .changed()
            .then_some(FieldValue::Boolean(b)),
        (_, FieldValue::Float(mut v)) => ui
            .add(egui::DragValue::new(&mut v).speed(0.1))
            .changed()
            .then_some(FieldValue::Float(v)),
        (_, FieldValue::String(mut s)) => ui
            .add(egui::TextEdit::singleline(&mut s).desired_width(f32::INFINITY))
            .changed()
            .then_some(FieldValue::String(s)),
        (_, FieldValue::Color(c)) => render_color(ui, c, true, false).map(FieldValue::Color),
        (_, FieldValue::Reference(target)) => {
            render_reference(ui, session, field, target.as_ref()).map(FieldValue::Reference)
        }
        (_, FieldValue::Opaque(value)) => {
            let key = (record.path().clone(), field.name.clone());
            let buf = buffers
                .entry(key.clone())
                .or_insert_with(|| value.to_json5_compact());
            let resp = ui.add(egui::TextEdit::singleline(&mut *buf).desired_width(f32::INFINITY));
            if resp.lost_focus() {
                let parsed = AssetValue::parse_json5(buf);
                buffers.remove(&key);
                match parsed {
                    Ok(v) if v != value => Some(FieldValue::Opaque(v)),
                    Ok(_) => None,
                    Err(e) => {
                        parse_errors.push(format!("{}: {e:#}", field.name));
                        None
                    }
                }
            } else {
                if !resp.has_focus() {
                    *buf = value.to_json5_compact();
                }
                None
            }
        }
    };

    if let Some(value) = changed {
        let (record, field) = (record.path().clone(), field.name.clone());
        intents.push(if one_shot {
            GridIntent::EditField {
                record,
                field,
                value,
            }
        } else {
            GridIntent::StageField {
                record,
                field,
                value,
            }
        });
    }
}

fn render_color(ui: &mut egui::Ui, c: Rgba, show_alpha: bool, hdr: bool) -> Option<Rgba> {
    let mut out = c;
    let changed = if hdr {
        // The picker clamps to [0, 1]; HDR channels are edited as numbers.
        let shown = if show_alpha { 4 } else { 3 };
        let mut any = false;
        for ch in [&mut out.r, &mut out.g, &mut out.b, &mut out.a]
            .into_iter()
            .take(shown)
        {
            any |= ui
                .add(egui::DragValue::new(ch).speed(0.01).range(0.0..=f32::MAX))
                .changed();
        }
        any
    } else {
        let mut rgba = egui::Rgba::from_rgba_unmultiplied(c.r, c.g, c.b, c.a);
        let alpha = if show_alpha {
            egui::color_picker::Alpha::OnlyBlend
        } else {
            egui::color_picker::Alpha::Opaque
        };
        let changed = egui::color_picker::color_edit_button_rgba(ui, &mut rgba, alpha).changed();
        let [r, g, b, a] = rgba.to_rgba_unmultiplied();
        out.r = r;
        out.g = g;
        out.b = b;
        if show_alpha {
            out.a = a;
        }
        changed
    };
    changed.then_some(out)
}

/// Reference picker. Candidates are only gathered while the popup is open.
fn render_reference(
    ui: &mut egui::Ui,
    session: &Session,
    field: &FieldDescriptor,
    current: Option<&AssetPath>,
) -> Option<Option<AssetPath>> {
    let mut chosen = None;
    egui::ComboBox::from_id_salt("ref")
        .selected_text(reference_label(current))
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            if ui.selectable_label(current.is_none(), statics::EN_REF_NONE).clicked() {
                chosen = Some(None);
            }
            for path in reference_candidates(session, field) {
                let on = current == Some(&path);
                if ui
                    .selectable_label(on, path.file_stem())
                    .on_hover_text(path.as_str())
                    .clicked()
                {
                    chosen = Some(Some(path));
                }
            }
        });
    chosen.filter(|c| c.as_ref() != current)
}

fn reference_label(current: Option<&AssetPath>) -> String {
    current
        .map(|p| p.file_stem().to_string())
        .unwrap_or_else(|| statics::EN_REF_NONE.to_string())
}

fn reference_candidates(session: &Session, field: &FieldDescriptor) -> Vec<AssetPath> {
    match session.store().find_records(&AssetPath::default(), None) {
        Ok(refs) => refs
            .into_iter()
            .filter(|r| {
                field
                    .target
                    .as_deref()
                    .is_none_or(|t| session.registry().is_assignable(t, &r.type_name))
            })
            .map(|r| r.path)
            .collect(),
        Err(e) => {
            debug!(field = %field.name, error = %e, "reference candidates unavailable");
            Vec::new()
        }
    }
}

/// Tallest cell decides the row: multi-line text areas grow it.
fn row_height(body_text_height: f32, fields: &[FieldDescriptor]) -> f32 {
    let single = body_text_height + 8.0;
    fields
        .iter()
        .filter(|f| f.kind == ValueKind::String)
        .filter_map(|f| f.constraints.multiline)
        .map(|lines| lines as f32 * statics::TEXT_AREA_LINE_HEIGHT + 8.0)
        .fold(single, f32::max)
}

impl eframe::App for AssetGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let error = self
            .last_error
            .clone()
            .or_else(|| self.session.last_error().map(str::to_string));
        if let Some(err) = error {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                            self.session.clear_error();
                        }
                    });
                });
            });
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.render_assets_region(ui);
            self.render_stats_region(ui);
            ui.separator();
            self.render_selectors(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("bottom_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.config.project_root.display().to_string());
                let status = if self.session.status().is_empty() {
                    self.status.as_str()
                } else {
                    self.session.status()
                };
                if !status.is_empty() {
                    ui.separator();
                    ui.label(status);
                }
                let dirty = self
                    .session
                    .objects()
                    .records()
                    .iter()
                    .filter(|r| r.is_dirty())
                    .count();
                if dirty > 0 {
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("{dirty} {}", statics::EN_BADGE_UNSAVED),
                    );
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_grid(ui);
        });
        self.commit_when_idle(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::{reference_label, row_height};
    use crate::{
        AssetPath, ValueKind,
        schema::{Constraints, FieldDescriptor},
    };

    fn field(kind: ValueKind, multiline: Option<u32>) -> FieldDescriptor {
        FieldDescriptor {
            name: "f".into(),
            kind,
            constraints: Constraints {
                multiline,
                ..Constraints::default()
            },
            target: None,
        }
    }

    #[test]
    fn multiline_text_grows_rows() {
        assert_eq!(row_height(14.0, &[]), 22.0);
        assert_eq!(
            row_height(14.0, &[field(ValueKind::String, Some(3))]),
            3.0 * 14.0 + 8.0
        );
        // Only string fields use text areas.
        assert_eq!(row_height(14.0, &[field(ValueKind::Integer, Some(5))]), 22.0);
    }

    #[test]
    fn reference_labels_use_file_stem() {
        assert_eq!(reference_label(None), "None");
        assert_eq!(
            reference_label(Some(&AssetPath::new("Loot/Arrow.asset"))),
            "Arrow"
        );
    }
}
