use crate::{
    AssetPath,
    error::StoreError,
    object_set::matches_filter,
    schema::{TypeDescriptor, TypeRegistry},
    store::RecordStore,
};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Restricts the type list to one source module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModuleFilter {
    #[default]
    All,
    Only(String),
}

impl ModuleFilter {
    fn admits(&self, module: &str) -> bool {
        match self {
            ModuleFilter::All => true,
            ModuleFilter::Only(m) => m == module,
        }
    }
}

/// Selectable record types under a scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeCatalog {
    modules: Vec<String>,
    types: Vec<TypeDescriptor>,
}

impl TypeCatalog {
    /// Non-abstract types with at least one record of that type or a subtype
    /// under `scope`, narrowed by module and name, sorted by name. The module
    /// list is computed before either narrowing.
    pub fn discover(
        registry: &TypeRegistry,
        store: &dyn RecordStore,
        scope: &AssetPath,
        module: &ModuleFilter,
        name_filter: &str,
    ) -> Result<Self, StoreError> {
        let present: HashSet<String> = store
            .find_records(scope, None)?
            .into_iter()
            .map(|r| r.type_name)
            .collect();

        let candidates: Vec<&TypeDescriptor> = registry
            .descriptors()
            .filter(|t| {
                !t.is_abstract
                    && present
                        .iter()
                        .any(|actual| registry.is_assignable(&t.name, actual))
            })
            .collect();

        let modules: Vec<String> = candidates
            .iter()
            .map(|t| t.module.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut types: Vec<TypeDescriptor> = candidates
            .into_iter()
            .filter(|t| module.admits(&t.module))
            .filter(|t| matches_filter(&t.name, name_filter))
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            scope = %scope,
            modules = modules.len(),
            types = types.len(),
            "type catalog refreshed"
        );
        Ok(Self { modules, types })
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn get(&self, index: usize) -> Option<&TypeDescriptor> {
        self.types.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

pub fn discover_types(
    registry: &TypeRegistry,
    store: &dyn RecordStore,
    scope: &AssetPath,
    module: &ModuleFilter,
    name_filter: &str,
) -> Result<Vec<TypeDescriptor>, StoreError> {
    TypeCatalog::discover(registry, store, scope, module, name_filter).map(|c| c.types)
}

pub fn available_modules(
    registry: &TypeRegistry,
    store: &dyn RecordStore,
    scope: &AssetPath,
) -> Result<Vec<String>, StoreError> {
    TypeCatalog::discover(registry, store, scope, &ModuleFilter::All, "").map(|c| c.modules)
}

#[cfg(test)]
mod tests {
    use super::{ModuleFilter, TypeCatalog, available_modules, discover_types};
    use crate::{AssetPath, Record, schema, store::MemoryStore};
    use pretty_assertions::assert_eq;

    fn store() -> MemoryStore {
        let mut s = MemoryStore::new();
        for (ty, path) in [
            ("Weapon", "Weapons/Axe.asset"),
            ("Bow", "Weapons/Ranged/Longbow.asset"),
            ("Ammo", "Loot/Arrow.asset"),
            ("Item", "Misc/Abstract.asset"),
            ("Unknown", "Misc/Stray.asset"),
        ] {
            s.insert(Record::new(ty, AssetPath::new(path)));
        }
        s
    }

    fn names(c: &TypeCatalog) -> Vec<&str> {
        c.types().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn lists_concrete_types_with_instances_sorted() {
        let reg = schema::tests::registry();
        let c = TypeCatalog::discover(&reg, &store(), &AssetPath::new(""), &ModuleFilter::All, "")
            .unwrap();
        assert_eq!(names(&c), vec!["Ammo", "Bow", "Weapon"]);
        assert_eq!(c.modules(), &["Game".to_string(), "Loot".to_string()]);
    }

    #[test]
    fn scope_module_and_name_filters_narrow() {
        let reg = schema::tests::registry();
        let s = store();

        let scoped =
            TypeCatalog::discover(&reg, &s, &AssetPath::new("Weapons"), &ModuleFilter::All, "")
                .unwrap();
        assert_eq!(names(&scoped), vec!["Bow", "Weapon"]);

        let loot = TypeCatalog::discover(
            &reg,
            &s,
            &AssetPath::new(""),
            &ModuleFilter::Only("Loot".into()),
            "",
        )
        .unwrap();
        assert_eq!(names(&loot), vec!["Ammo"]);
        // Module list is independent of the module filter.
        assert_eq!(loot.modules().len(), 2);

        let searched =
            TypeCatalog::discover(&reg, &s, &AssetPath::new(""), &ModuleFilter::All, "WEAP")
                .unwrap();
        assert_eq!(names(&searched), vec!["Weapon"]);
        assert_eq!(searched.position("Weapon"), Some(0));
    }

    #[test]
    fn base_type_is_listed_when_only_subtypes_exist() {
        let reg = schema::tests::registry();
        let mut s = MemoryStore::new();
        s.insert(Record::new("Bow", AssetPath::new("Weapons/Longbow.asset")));
        let c = TypeCatalog::discover(&reg, &s, &AssetPath::new(""), &ModuleFilter::All, "")
            .unwrap();
        assert_eq!(names(&c), vec!["Bow", "Weapon"]);
    }

    #[test]
    fn free_functions_agree_with_catalog() {
        let reg = schema::tests::registry();
        let s = store();
        let root = AssetPath::new("");
        let types = discover_types(&reg, &s, &root, &ModuleFilter::All, "b").unwrap();
        assert_eq!(
            types.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["Bow"]
        );
        assert_eq!(
            available_modules(&reg, &s, &AssetPath::new("Loot")).unwrap(),
            vec!["Loot".to_string()]
        );
    }
}
