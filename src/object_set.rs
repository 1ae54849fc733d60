//! The working set: records of the selected type, measured, filtered by name
//! and sorted.

use crate::{
    AssetPath, Record,
    error::StoreError,
    schema::{FieldDescriptor, TypeRegistry},
    sort::{self, SortState},
    store::{MemoryMeter, RecordStore},
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Type-name and instance-name filters plus the derived-types switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub type_search: String,
    pub instance_search: String,
    pub include_derived: bool,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            type_search: String::new(),
            instance_search: String::new(),
            include_derived: true,
        }
    }
}

/// Case-insensitive substring match on the needle as typed; an empty needle
/// matches all.
pub fn matches_filter(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// What to load: the selected type below a scope.
#[derive(Debug, Clone, Copy)]
pub struct LoadQuery<'a> {
    pub scope: &'a AssetPath,
    pub type_name: &'a str,
    pub filter: &'a SearchFilter,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSet {
    /// Identities of the unfiltered load, in discovery order.
    loaded: Vec<AssetPath>,
    memory: HashMap<AssetPath, u64>,
    /// Filtered and sorted records.
    records: Vec<Record>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the set from storage. On a store failure the previous contents
    /// are kept untouched.
    pub fn reload(
        &mut self,
        store: &dyn RecordStore,
        registry: &TypeRegistry,
        meter: &dyn MemoryMeter,
        query: LoadQuery<'_>,
        fields: &[FieldDescriptor],
        sort_state: &SortState,
    ) -> Result<(), StoreError> {
        let refs = store.find_records(query.scope, None)?;

        let mut loaded = Vec::new();
        let mut memory = HashMap::new();
        let mut records = Vec::new();
        for r in refs {
            let wanted = if query.filter.include_derived {
                registry.is_assignable(query.type_name, &r.type_name)
            } else {
                r.type_name == query.type_name
            };
            if !wanted {
                continue;
            }

            // A record with edits the store has not accepted yet stays as-is.
            let record = match self.record(&r.path).filter(|rec| rec.is_dirty()) {
                Some(pending) => pending.clone(),
                None => match store.load(&r.path) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(path = %r.path, error = %e, "skipping asset that failed to load");
                        continue;
                    }
                },
            };

            memory.insert(record.path().clone(), meter.size_of(&record));
            loaded.push(record.path().clone());
            if matches_filter(record.name(), &query.filter.instance_search) {
                records.push(record);
            }
        }

        sort::sort_records(registry, fields, sort_state, &mut records);

        info!(
            type_name = query.type_name,
            scope = %query.scope,
            loaded = loaded.len(),
            visible = records.len(),
            "working set reloaded"
        );
        self.loaded = loaded;
        self.memory = memory;
        self.records = records;
        Ok(())
    }

    pub fn resort(
        &mut self,
        registry: &TypeRegistry,
        fields: &[FieldDescriptor],
        sort_state: &SortState,
    ) {
        sort::sort_records(registry, fields, sort_state, &mut self.records);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, path: &AssetPath) -> Option<&Record> {
        self.records.iter().find(|r| r.path() == path)
    }

    pub fn record_mut(&mut self, path: &AssetPath) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.path() == path)
    }

    /// Record columns are derived from.
    pub fn representative(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loaded(&self) -> &[AssetPath] {
        &self.loaded
    }

    pub fn memory_of(&self, path: &AssetPath) -> u64 {
        self.memory.get(path).copied().unwrap_or(0)
    }

    pub fn total_memory_all(&self) -> u64 {
        self.memory.values().sum()
    }

    pub fn total_memory_filtered(&self) -> u64 {
        self.records.iter().map(|r| self.memory_of(r.path())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadQuery, ObjectSet, SearchFilter, matches_filter};
    use crate::{
        AssetNumber, AssetPath, AssetValue, Record,
        schema::{self, Reflection},
        sort::SortState,
        store::{MemoryMeter, MemoryStore},
    };
    use pretty_assertions::assert_eq;

    /// Size = 100 * number of characters in the display name.
    struct NameLengthMeter;

    impl MemoryMeter for NameLengthMeter {
        fn size_of(&self, record: &Record) -> u64 {
            record.name().len() as u64 * 100
        }
    }

    fn rec(ty: &str, path: &str) -> Record {
        Record::new(ty, AssetPath::new(path))
    }

    fn store() -> MemoryStore {
        let mut s = MemoryStore::new();
        s.insert(rec("Weapon", "Weapons/Axe.asset"));
        s.insert(rec("Weapon", "Weapons/Bow.asset"));
        s.insert(rec("Weapon", "Weapons/Axe2.asset"));
        s.insert(rec("Bow", "Weapons/Ranged/Longbow.asset"));
        s.insert(rec("Ammo", "Loot/Arrow.asset"));
        s
    }

    fn load(set: &mut ObjectSet, store: &MemoryStore, scope: &str, filter: &SearchFilter) {
        let reg = schema::tests::registry();
        set.reload(
            store,
            &reg,
            &NameLengthMeter,
            LoadQuery {
                scope: &AssetPath::new(scope),
                type_name: "Weapon",
                filter,
            },
            &[],
            &SortState::default(),
        )
        .unwrap();
    }

    fn names(set: &ObjectSet) -> Vec<&str> {
        set.records().iter().map(Record::name).collect()
    }

    #[test]
    fn include_derived_controls_subtypes() {
        let store = store();
        let mut set = ObjectSet::new();

        load(&mut set, &store, "", &SearchFilter::default());
        assert_eq!(set.all_count(), 4);
        assert!(names(&set).contains(&"Longbow"));

        let exact = SearchFilter {
            include_derived: false,
            ..SearchFilter::default()
        };
        load(&mut set, &store, "", &exact);
        assert_eq!(set.all_count(), 3);
        assert!(!names(&set).contains(&"Longbow"));
    }

    #[test]
    fn instance_filter_and_memory_totals() {
        let store = store();
        let mut set = ObjectSet::new();
        let filter = SearchFilter {
            instance_search: "ax".into(),
            include_derived: false,
            ..SearchFilter::default()
        };
        load(&mut set, &store, "Weapons", &filter);

        assert_eq!(names(&set), vec!["Axe", "Axe2"]);
        assert_eq!(set.total_memory_filtered(), 300 + 400);
        assert_eq!(set.total_memory_all(), 300 + 300 + 400);
        for r in set.records() {
            assert!(set.loaded().contains(r.path()));
        }
    }

    #[test]
    fn scope_limits_discovery() {
        let store = store();
        let mut set = ObjectSet::new();
        load(&mut set, &store, "Weapons/Ranged", &SearchFilter::default());
        assert_eq!(names(&set), vec!["Longbow"]);
        load(&mut set, &store, "Loot", &SearchFilter::default());
        assert!(set.is_empty());
    }

    #[test]
    fn dirty_records_survive_reload() {
        let store = store();
        let reg = schema::tests::registry();
        let mut set = ObjectSet::new();
        load(&mut set, &store, "Weapons", &SearchFilter::default());

        let axe = AssetPath::new("Weapons/Axe.asset");
        let record = set.record_mut(&axe).unwrap();
        reg.set_field(record, "damage", crate::FieldValue::Integer(99))
            .unwrap();
        record.mark_dirty();

        load(&mut set, &store, "Weapons", &SearchFilter::default());
        assert_eq!(
            set.record(&axe).unwrap().raw("damage"),
            Some(&AssetValue::Number(AssetNumber::I64(99)))
        );
    }

    #[test]
    fn filter_matching_is_case_insensitive() {
        assert!(matches_filter("Axe2", "AX"));
        assert!(matches_filter("Bow", ""));
        assert!(!matches_filter("Bow", "ax"));
    }

    #[test]
    fn filter_whitespace_is_significant() {
        assert!(!matches_filter("Bow", "  "));
        assert!(!matches_filter("Axe", " ax"));
        assert!(matches_filter("Battle Axe", " ax"));
    }
}
