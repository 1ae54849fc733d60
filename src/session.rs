//! One editing session: everything a window needs between frames.
//!
//! The GUI only reads state and calls the operations below; every mutation of
//! the working set, the column layout or storage goes through here.

use crate::{
    AssetPath, FieldValue,
    catalog::{ModuleFilter, TypeCatalog},
    error::{GridError, PathError},
    grid::{self, EditorKind, GridColumn, GridIntent, PointerEvent, ResizeState},
    layout::ColumnLayout,
    namer,
    object_set::{LoadQuery, ObjectSet, SearchFilter},
    prefs::PreferenceStore,
    schema::{FieldDescriptor, Reflection, TypeDescriptor, TypeRegistry, describe_fields},
    sort::SortState,
    statics,
    store::{MemoryMeter, RecordStore},
};
use tracing::{debug, info, warn};

/// Figures shown in the stats region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Records in the filtered working set.
    pub count: usize,
    pub total_memory: u64,
    pub filtered_memory: u64,
}

impl Stats {
    pub fn total_kb(&self) -> f64 {
        self.total_memory as f64 / 1024.0
    }

    pub fn filtered_kb(&self) -> f64 {
        self.filtered_memory as f64 / 1024.0
    }
}

pub struct Session {
    store: Box<dyn RecordStore>,
    registry: TypeRegistry,
    prefs: Box<dyn PreferenceStore>,
    meter: Box<dyn MemoryMeter>,

    scope: AssetPath,
    module_filter: ModuleFilter,
    filter: SearchFilter,
    catalog: TypeCatalog,
    selected: Option<TypeDescriptor>,

    objects: ObjectSet,
    fields: Vec<FieldDescriptor>,
    layout: Option<ColumnLayout>,
    sort: SortState,
    resize: ResizeState,

    create_count: u32,
    status: String,
    last_error: Option<String>,
}

impl Session {
    /// Builds an idle session; call [`Session::refresh_catalog`] to populate it.
    pub fn new(
        store: Box<dyn RecordStore>,
        registry: TypeRegistry,
        prefs: Box<dyn PreferenceStore>,
        meter: Box<dyn MemoryMeter>,
    ) -> Self {
        Self {
            store,
            registry,
            prefs,
            meter,
            scope: AssetPath::default(),
            module_filter: ModuleFilter::All,
            filter: SearchFilter::default(),
            catalog: TypeCatalog::default(),
            selected: None,
            objects: ObjectSet::new(),
            fields: Vec::new(),
            layout: None,
            sort: SortState::default(),
            resize: ResizeState::Idle,
            create_count: 1,
            status: String::new(),
            last_error: None,
        }
    }

    pub fn with_scope(mut self, scope: AssetPath) -> Self {
        self.scope = scope;
        self
    }

    // --- read access ---

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn scope(&self) -> &AssetPath {
        &self.scope
    }

    pub fn module_filter(&self) -> &ModuleFilter {
        &self.module_filter
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn selected_type(&self) -> Option<&TypeDescriptor> {
        self.selected.as_ref()
    }

    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn layout(&self) -> Option<&ColumnLayout> {
        self.layout.as_ref()
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn resize_state(&self) -> &ResizeState {
        &self.resize
    }

    pub fn create_count(&self) -> u32 {
        self.create_count
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn stats(&self) -> Stats {
        Stats {
            count: self.objects.len(),
            total_memory: self.objects.total_memory_all(),
            filtered_memory: self.objects.total_memory_filtered(),
        }
    }

    /// Columns of the current grid, empty when no type is selected.
    pub fn columns(&self) -> Vec<GridColumn> {
        match &self.layout {
            Some(layout) => grid::columns(&self.fields, layout),
            None => Vec::new(),
        }
    }

    pub fn editor_for(&self, field: &FieldDescriptor) -> EditorKind {
        grid::select_editor(field.kind, &field.constraints)
    }

    /// Folder the create dialog starts in: next to the first listed record,
    /// otherwise the scope itself.
    pub fn default_create_folder(&self) -> AssetPath {
        self.objects
            .records()
            .first()
            .map(|r| AssetPath::new(r.path().parent()))
            .unwrap_or_else(|| self.scope.clone())
    }

    // --- catalog ---

    /// Swaps in a freshly loaded schema and rebuilds everything derived from it.
    pub fn replace_registry(&mut self, registry: TypeRegistry) -> Result<(), GridError> {
        self.registry = registry;
        self.fields.clear();
        self.layout = None;
        self.refresh_catalog()
    }

    /// Rediscovers types and modules under the scope, keeps the selection when
    /// it is still listed (otherwise falls back to the first type), then
    /// reloads the working set.
    pub fn refresh_catalog(&mut self) -> Result<(), GridError> {
        let result = self.refresh_catalog_inner();
        self.track(result)
    }

    fn refresh_catalog_inner(&mut self) -> Result<(), GridError> {
        self.catalog = TypeCatalog::discover(
            &self.registry,
            self.store.as_ref(),
            &self.scope,
            &self.module_filter,
            &self.filter.type_search,
        )?;
        let kept = self
            .selected
            .as_ref()
            .and_then(|t| self.catalog.position(&t.name));
        let next = self.catalog.get(kept.unwrap_or(0)).cloned();
        self.change_selection(next);
        self.reload_objects_inner()
    }

    pub fn set_scope(&mut self, scope: AssetPath) -> Result<(), GridError> {
        if scope == self.scope {
            return Ok(());
        }
        self.scope = scope;
        self.refresh_catalog()
    }

    pub fn set_module_filter(&mut self, module: ModuleFilter) -> Result<(), GridError> {
        if module == self.module_filter {
            return Ok(());
        }
        self.module_filter = module;
        self.refresh_catalog()
    }

    pub fn set_type_search(&mut self, text: &str) -> Result<(), GridError> {
        if text == self.filter.type_search {
            return Ok(());
        }
        self.filter.type_search = text.to_string();
        self.refresh_catalog()
    }

    pub fn select_type(&mut self, name: &str) -> Result<(), GridError> {
        let found = self
            .catalog
            .position(name)
            .and_then(|i| self.catalog.get(i))
            .cloned();
        let result = match found {
            Some(ty) => {
                self.change_selection(Some(ty));
                self.reload_objects_inner()
            }
            None => Err(GridError::UnknownType(name.to_string())),
        };
        self.track(result)
    }

    fn change_selection(&mut self, next: Option<TypeDescriptor>) {
        let same = next.as_ref().map(|t| &t.qualified_id)
            == self.selected.as_ref().map(|t| &t.qualified_id);
        if same {
            return;
        }
        debug!(
            from = ?self.selected.as_ref().map(|t| &t.name),
            to = ?next.as_ref().map(|t| &t.name),
            "type selection changed"
        );
        self.selected = next;
        self.objects.clear();
        self.fields.clear();
        self.layout = None;
        self.sort.reset();
        self.resize.cancel();
    }

    // --- working set ---

    pub fn set_instance_search(&mut self, text: &str) -> Result<(), GridError> {
        if text == self.filter.instance_search {
            return Ok(());
        }
        self.filter.instance_search = text.to_string();
        self.reload_objects()
    }

    pub fn set_include_derived(&mut self, include: bool) -> Result<(), GridError> {
        if include == self.filter.include_derived {
            return Ok(());
        }
        self.filter.include_derived = include;
        self.reload_objects()
    }

    pub fn reload_objects(&mut self) -> Result<(), GridError> {
        let result = self.reload_objects_inner();
        self.track(result)
    }

    fn reload_objects_inner(&mut self) -> Result<(), GridError> {
        let Some(ty) = self.selected.clone() else {
            self.objects.clear();
            self.fields.clear();
            self.layout = None;
            return Ok(());
        };

        self.objects.reload(
            self.store.as_ref(),
            &self.registry,
            self.meter.as_ref(),
            LoadQuery {
                scope: &self.scope,
                type_name: &ty.name,
                filter: &self.filter,
            },
            &self.fields,
            &self.sort,
        )?;

        // Prefer a record of exactly the selected type so the column set does
        // not depend on which subtype happens to sort first.
        let sample = self
            .objects
            .records()
            .iter()
            .find(|r| r.type_name() == ty.name)
            .or_else(|| self.objects.representative());
        let fields = match sample {
            Some(sample) => describe_fields(&self.registry, sample),
            // A working set emptied by filtering keeps the current columns.
            None => self.fields.clone(),
        };

        if fields != self.fields {
            self.fields = fields;
            self.layout = None;
            self.sort.clamp_to(statics::FIRST_FIELD_COLUMN + self.fields.len());
            self.objects.resort(&self.registry, &self.fields, &self.sort);
        }

        if self
            .layout
            .as_ref()
            .is_none_or(|l| l.type_id() != ty.qualified_id)
        {
            self.layout = Some(ColumnLayout::load_or_default(
                self.prefs.as_ref(),
                &ty,
                &self.fields,
            ));
        }
        Ok(())
    }

    // --- grid ---

    /// Feeds a header pointer event through the resize machine and applies
    /// whatever it produces.
    pub fn header_pointer(&mut self, event: PointerEvent) -> Result<(), GridError> {
        let widths = self
            .layout
            .as_ref()
            .map(|l| l.widths().to_vec())
            .unwrap_or_default();
        match self.resize.on_pointer(event, &widths) {
            Some(intent) => self.apply(intent),
            None => Ok(()),
        }
    }

    pub fn apply(&mut self, intent: GridIntent) -> Result<(), GridError> {
        let result = self.apply_inner(intent);
        self.track(result)
    }

    fn apply_inner(&mut self, intent: GridIntent) -> Result<(), GridError> {
        match intent {
            GridIntent::StartResize { column } => {
                debug!(column, "column resize started");
                Ok(())
            }
            GridIntent::DragResize { column, width } => {
                if let Some(layout) = self.layout.as_mut() {
                    layout.set_width(column, width);
                }
                Ok(())
            }
            GridIntent::EndResize { column } => {
                // Without fields the layout holds only the fixed columns and
                // would overwrite the type's stored widths.
                if let Some(layout) = &self.layout
                    && !self.fields.is_empty()
                {
                    layout.save(self.prefs.as_mut());
                    debug!(type_id = layout.type_id(), column, "column widths saved");
                }
                Ok(())
            }
            GridIntent::ToggleSort(column) => {
                if column < statics::FIRST_FIELD_COLUMN + self.fields.len()
                    && self.sort.toggle(column)
                {
                    self.objects
                        .resort(&self.registry, &self.fields, &self.sort);
                }
                Ok(())
            }
            GridIntent::EditField {
                record,
                field,
                value,
            } => {
                self.stage_field(&record, &field, value)?;
                self.commit(&record)
            }
            GridIntent::StageField {
                record,
                field,
                value,
            } => self.stage_field(&record, &field, value),
            GridIntent::Commit(record) => self.commit(&record),
            GridIntent::RequestDuplicate(path) => self.duplicate(&path),
            GridIntent::RequestDelete(path) => self.delete(&path),
        }
    }

    fn stage_field(
        &mut self,
        path: &AssetPath,
        field: &str,
        value: FieldValue,
    ) -> Result<(), GridError> {
        let ty = self.selected.as_ref().ok_or(GridError::NoTypeSelected)?;
        let descriptor = self
            .fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| GridError::UnknownField {
                type_name: ty.name.clone(),
                field: field.to_string(),
            })?;
        let value = grid::select_editor(descriptor.kind, &descriptor.constraints).clamp(value);

        let record = self
            .objects
            .record_mut(path)
            .ok_or_else(|| GridError::UnknownRecord(path.clone()))?;
        self.registry.set_field(record, field, value)?;
        record.mark_dirty();
        Ok(())
    }

    /// Writes a dirty record. Clean or vanished records are left alone.
    fn commit(&mut self, path: &AssetPath) -> Result<(), GridError> {
        let Some(record) = self.objects.record_mut(path) else {
            debug!(%path, "nothing to commit");
            return Ok(());
        };
        if !record.is_dirty() {
            return Ok(());
        }
        // On failure the record stays dirty and the edit stays in memory.
        self.store.save(record)?;
        record.mark_clean();
        Ok(())
    }

    fn duplicate(&mut self, path: &AssetPath) -> Result<(), GridError> {
        let source = self
            .objects
            .record(path)
            .cloned()
            .ok_or_else(|| GridError::UnknownRecord(path.clone()))?;
        let store = self.store.as_ref();
        let target = namer::unique_path(path, |p| store.exists(p))?;
        self.store.duplicate_at(&source, &target)?;
        self.status = format!("{} {}", statics::EN_STATUS_DUPLICATED, target);
        self.reload_objects_inner()
    }

    fn delete(&mut self, path: &AssetPath) -> Result<(), GridError> {
        self.store.delete(path)?;
        self.status = format!("{} {}", statics::EN_STATUS_DELETED, path);
        self.reload_objects_inner()
    }

    // --- creation ---

    /// Sets how many records the next create makes, kept within `1..=1000`.
    pub fn set_create_count(&mut self, count: i64) {
        self.create_count = count.clamp(1, i64::from(statics::CREATE_COUNT_MAX)) as u32;
    }

    /// Creates `create_count` new records of the selected type. The first one
    /// takes `base` when it is free; the rest (or all, when `base` is taken)
    /// get host-style numbered names next to it.
    pub fn create_instances(&mut self, base: &AssetPath) -> Result<Vec<AssetPath>, GridError> {
        let result = self.create_instances_inner(base);
        self.track(result)
    }

    fn create_instances_inner(&mut self, base: &AssetPath) -> Result<Vec<AssetPath>, GridError> {
        let ty = self.selected.clone().ok_or(GridError::NoTypeSelected)?;
        if base.file_stem().is_empty() {
            return Err(PathError::InvalidPath(base.clone()).into());
        }
        let wanted_ext = format!(".{}", statics::ASSET_EXTENSION);
        let base = if base.extension() == wanted_ext {
            base.clone()
        } else {
            base.with_file_name(&format!("{}{}", base.file_name(), wanted_ext))
        };

        let mut created = Vec::with_capacity(self.create_count as usize);
        for _ in 0..self.create_count {
            let path = self.store.unique_available_path(&base);
            if let Err(e) = self.store.create(&ty, &path) {
                // Whatever was created so far still shows up.
                self.reload_objects_inner()?;
                return Err(e.into());
            }
            created.push(path);
        }
        info!(type_name = %ty.name, count = created.len(), base = %base, "created assets");
        self.status = format!(
            "{} {} {}",
            statics::EN_STATUS_CREATED,
            created.len(),
            ty.name
        );
        self.reload_objects_inner()?;
        Ok(created)
    }

    fn track<T>(&mut self, result: Result<T, GridError>) -> Result<T, GridError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, "session operation failed");
                self.last_error = Some(e.to_string());
            }
        }
        result
    }
}
