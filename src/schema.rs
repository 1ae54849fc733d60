//! Record types and their fields, as declared in the project's schema file.
//!
//! The [`TypeRegistry`] is built once per refresh and is the reflection provider
//! for every record: all field access goes through it by field name.

use crate::{
    FieldValue, Record, ValueKind,
    error::{GridError, SchemaError},
    statics,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Identifies a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    /// `<module>::<name>`; stable across sessions, used as a preference key.
    pub qualified_id: String,
    pub module: String,
    pub base: Option<String>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorUsage {
    pub show_alpha: bool,
    pub hdr: bool,
}

impl Default for ColorUsage {
    fn default() -> Self {
        Self {
            show_alpha: true,
            hdr: false,
        }
    }
}

/// Optional editing hints attached to a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub range: Option<(f64, f64)>,
    pub min: Option<f64>,
    /// Minimum number of visible lines for a multi-line text field.
    pub multiline: Option<u32>,
    pub color: Option<ColorUsage>,
}

/// One editable field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ValueKind,
    pub constraints: Constraints,
    /// Referenced record type, for reference fields that declare one.
    pub target: Option<String>,
}

/// A visible field as reported by the reflection provider, before its kind has
/// been classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedField {
    pub name: String,
    pub kind_label: String,
    pub target: Option<String>,
}

/// Named-path access to record fields.
pub trait Reflection {
    /// Visible fields of the record's type, in natural enumeration order.
    fn fields_of(&self, record: &Record) -> Vec<ReflectedField>;
    fn get_field(&self, record: &Record, name: &str) -> Option<FieldValue>;
    fn set_field(&self, record: &mut Record, name: &str, value: FieldValue)
    -> Result<(), GridError>;
    fn constraints_of(&self, type_name: &str, field: &str) -> Option<Constraints>;
}

/// Derives the column schema for `sample`. Deterministic for a given record
/// type; fields whose kind cannot be classified come back as `Opaque`.
pub fn describe_fields(reflection: &dyn Reflection, sample: &Record) -> Vec<FieldDescriptor> {
    reflection
        .fields_of(sample)
        .into_iter()
        .map(|field| {
            let kind = ValueKind::classify(&field.kind_label).unwrap_or_else(|| {
                debug!(
                    type_name = sample.type_name(),
                    field = %field.name,
                    kind = %field.kind_label,
                    "unclassified field kind, using opaque editor"
                );
                ValueKind::Opaque
            });
            let constraints = reflection
                .constraints_of(sample.type_name(), &field.name)
                .unwrap_or_default();
            FieldDescriptor {
                name: field.name,
                kind,
                constraints,
                target: field.target,
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    types: IndexMap<String, TypeDecl>,
}

#[derive(Debug, Deserialize)]
struct TypeDecl {
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    fields: IndexMap<String, FieldDecl>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldDecl {
    kind: String,
    #[serde(default)]
    range: Option<[f64; 2]>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    multiline: Option<u32>,
    #[serde(default)]
    color: Option<ColorDecl>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    hidden: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ColorDecl {
    #[serde(default = "default_true")]
    alpha: bool,
    #[serde(default)]
    hdr: bool,
}

fn default_true() -> bool {
    true
}

impl FieldDecl {
    fn constraints(&self) -> Constraints {
        Constraints {
            range: self.range.map(|[lo, hi]| (lo.min(hi), lo.max(hi))),
            min: self.min,
            multiline: self.multiline.map(|lines| lines.max(1)),
            color: self.color.map(|c| ColorUsage {
                show_alpha: c.alpha,
                hdr: c.hdr,
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct TypeEntry {
    descriptor: TypeDescriptor,
    own_fields: IndexMap<String, FieldDecl>,
}

/// Every declared record type, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeEntry>,
}

impl TypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json5(&text, &path.display().to_string())
    }

    pub fn from_json5(text: &str, origin: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = json5::from_str(text).map_err(|e| SchemaError::Parse {
            path: origin.to_string(),
            details: e.to_string(),
        })?;

        let mut types = IndexMap::with_capacity(file.types.len());
        for (name, decl) in file.types {
            let module = decl
                .module
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| statics::DEFAULT_MODULE.to_string());
            let descriptor = TypeDescriptor {
                qualified_id: format!("{module}::{name}"),
                name: name.clone(),
                module,
                base: decl.base,
                is_abstract: decl.is_abstract,
            };
            types.insert(
                name,
                TypeEntry {
                    descriptor,
                    own_fields: decl.fields,
                },
            );
        }

        let registry = Self { types };
        registry.validate()?;
        debug!(types = registry.types.len(), origin, "schema loaded");
        Ok(registry)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (name, entry) in &self.types {
            if let Some(base) = &entry.descriptor.base
                && !self.types.contains_key(base)
            {
                return Err(SchemaError::UnknownBase {
                    type_name: name.clone(),
                    base: base.clone(),
                });
            }
            let mut seen = 0usize;
            let mut cursor = entry.descriptor.base.as_deref();
            while let Some(current) = cursor {
                seen += 1;
                if current == name || seen > self.types.len() {
                    return Err(SchemaError::Cycle(name.clone()));
                }
                cursor = self
                    .types
                    .get(current)
                    .and_then(|e| e.descriptor.base.as_deref());
            }
        }
        Ok(())
    }

    pub fn descriptor(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name).map(|e| &e.descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values().map(|e| &e.descriptor)
    }

    /// True when `actual` is `ancestor` or derives from it.
    pub fn is_assignable(&self, ancestor: &str, actual: &str) -> bool {
        self.lineage(actual).iter().any(|t| *t == ancestor)
    }

    /// `name` followed by its base types, nearest first. Unknown names yield an
    /// empty lineage.
    fn lineage<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut cursor = self.types.get_key_value(name).map(|(k, _)| k.as_str());
        while let Some(current) = cursor {
            if out.contains(&current) {
                break;
            }
            out.push(current);
            cursor = self
                .types
                .get(current)
                .and_then(|e| e.descriptor.base.as_deref());
        }
        out
    }

    fn declared_field(&self, type_name: &str, field: &str) -> Option<&FieldDecl> {
        self.lineage(type_name)
            .into_iter()
            .rev()
            .find_map(|t| self.types.get(t).and_then(|e| e.own_fields.get(field)))
    }

    fn declared_kind(&self, type_name: &str, field: &str) -> Option<ValueKind> {
        self.declared_field(type_name, field)
            .map(|d| ValueKind::classify(&d.kind).unwrap_or(ValueKind::Opaque))
    }
}

impl Reflection for TypeRegistry {
    fn fields_of(&self, record: &Record) -> Vec<ReflectedField> {
        let mut out: Vec<ReflectedField> = Vec::new();
        for type_name in self.lineage(record.type_name()).into_iter().rev() {
            let Some(entry) = self.types.get(type_name) else {
                continue;
            };
            for (name, decl) in &entry.own_fields {
                if decl.hidden || out.iter().any(|f| &f.name == name) {
                    continue;
                }
                out.push(ReflectedField {
                    name: name.clone(),
                    kind_label: decl.kind.clone(),
                    target: decl.target.clone(),
                });
            }
        }
        out
    }

    fn get_field(&self, record: &Record, name: &str) -> Option<FieldValue> {
        let kind = self.declared_kind(record.type_name(), name)?;
        Some(FieldValue::from_asset(kind, record.raw(name)))
    }

    fn set_field(
        &self,
        record: &mut Record,
        name: &str,
        value: FieldValue,
    ) -> Result<(), GridError> {
        if self.declared_kind(record.type_name(), name).is_none() {
            return Err(GridError::UnknownField {
                type_name: record.type_name().to_string(),
                field: name.to_string(),
            });
        }
        record.set_raw(name, value.to_asset());
        Ok(())
    }

    fn constraints_of(&self, type_name: &str, field: &str) -> Option<Constraints> {
        self.declared_field(type_name, field)
            .map(FieldDecl::constraints)
            .filter(|c| *c != Constraints::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ColorUsage, Reflection, SchemaError, TypeRegistry, describe_fields};
    use crate::{AssetPath, AssetValue, FieldValue, Record, ValueKind};
    use pretty_assertions::assert_eq;

    pub(crate) const SCHEMA: &str = r#"{
        types: {
            Item: {
                module: "Game",
                abstract: true,
                fields: {
                    weight: { kind: "float", min: 0 },
                    notes: { kind: "string", multiline: 3 },
                    internalId: { kind: "int", hidden: true },
                },
            },
            Weapon: {
                module: "Game",
                base: "Item",
                fields: {
                    damage: { kind: "int", range: [0, 100] },
                    speed: { kind: "float", range: [2, 0.5] },
                    tint: { kind: "color", color: { alpha: false, hdr: true } },
                    glow: { kind: "color" },
                    twoHanded: { kind: "bool" },
                    ammo: { kind: "ref", target: "Ammo" },
                    offset: { kind: "Vector3" },
                },
            },
            Bow: { module: "Game", base: "Weapon", fields: { range: { kind: "float" } } },
            Ammo: { module: "Loot", fields: { count: { kind: "int", min: 1 } } },
        },
    }"#;

    pub(crate) fn registry() -> TypeRegistry {
        TypeRegistry::from_json5(SCHEMA, "test").unwrap()
    }

    fn names(reg: &TypeRegistry, rec: &Record) -> Vec<String> {
        describe_fields(reg, rec).into_iter().map(|f| f.name).collect()
    }

    #[test]
    fn fields_enumerate_base_first_and_skip_hidden() {
        let reg = registry();
        let bow = Record::new("Bow", AssetPath::new("b.asset"));
        assert_eq!(
            names(&reg, &bow),
            vec![
                "weight", "notes", "damage", "speed", "tint", "glow", "twoHanded", "ammo",
                "offset", "range"
            ]
        );
    }

    #[test]
    fn describe_fields_is_deterministic_across_records_of_a_type() {
        let reg = registry();
        let a = Record::new("Weapon", AssetPath::new("W/Axe.asset"))
            .with_field("damage", AssetValue::String("not a number".into()));
        let b = Record::new("Weapon", AssetPath::new("W/Bow.asset"));
        assert_eq!(describe_fields(&reg, &a), describe_fields(&reg, &b));
    }

    #[test]
    fn unclassified_kind_becomes_opaque_and_constraints_attach() {
        let reg = registry();
        let rec = Record::new("Weapon", AssetPath::new("W/Axe.asset"));
        let fields = describe_fields(&reg, &rec);
        let by_name = |n: &str| fields.iter().find(|f| f.name == n).unwrap().clone();

        assert_eq!(by_name("offset").kind, ValueKind::Opaque);
        assert_eq!(by_name("damage").constraints.range, Some((0.0, 100.0)));
        // Reversed bounds are normalized.
        assert_eq!(by_name("speed").constraints.range, Some((0.5, 2.0)));
        assert_eq!(by_name("notes").constraints.multiline, Some(3));
        assert_eq!(
            by_name("tint").constraints.color,
            Some(ColorUsage {
                show_alpha: false,
                hdr: true
            })
        );
        assert_eq!(by_name("glow").constraints.color, None);
        assert_eq!(by_name("ammo").target.as_deref(), Some("Ammo"));
    }

    #[test]
    fn unknown_type_has_no_columns() {
        let reg = registry();
        let rec = Record::new("Mystery", AssetPath::new("m.asset"));
        assert!(describe_fields(&reg, &rec).is_empty());
    }

    #[test]
    fn get_and_set_go_through_declared_kinds() {
        let reg = registry();
        let mut rec = Record::new("Weapon", AssetPath::new("W/Axe.asset"));
        assert_eq!(reg.get_field(&rec, "damage"), Some(FieldValue::Integer(0)));
        reg.set_field(&mut rec, "damage", FieldValue::Integer(42))
            .unwrap();
        assert_eq!(reg.get_field(&rec, "damage"), Some(FieldValue::Integer(42)));
        assert!(reg.get_field(&rec, "nope").is_none());
        assert!(
            reg.set_field(&mut rec, "nope", FieldValue::Boolean(true))
                .is_err()
        );
    }

    #[test]
    fn assignability_follows_base_chain() {
        let reg = registry();
        assert!(reg.is_assignable("Item", "Bow"));
        assert!(reg.is_assignable("Weapon", "Weapon"));
        assert!(!reg.is_assignable("Bow", "Weapon"));
        assert!(!reg.is_assignable("Item", "Ammo"));
        assert_eq!(reg.descriptor("Ammo").unwrap().qualified_id, "Loot::Ammo");
    }

    #[test]
    fn bad_schemas_are_rejected() {
        let unknown = r#"{ types: { A: { base: "Nope" } } }"#;
        assert!(matches!(
            TypeRegistry::from_json5(unknown, "t"),
            Err(SchemaError::UnknownBase { .. })
        ));
        let cycle = r#"{ types: { A: { base: "B" }, B: { base: "A" } } }"#;
        assert!(matches!(
            TypeRegistry::from_json5(cycle, "t"),
            Err(SchemaError::Cycle(_))
        ));
        assert!(matches!(
            TypeRegistry::from_json5("{ types: ", "t"),
            Err(SchemaError::Parse { .. })
        ));
    }
}
