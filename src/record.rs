use crate::{AssetPath, AssetValue, error::StoreError, statics};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetEncoding {
    #[default]
    Plain,
    Gzip,
}

/// One persisted asset. Field values are kept as raw document values; the
/// reflection provider gives them their declared types.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    path: AssetPath,
    type_name: String,
    fields: IndexMap<String, AssetValue>,
    encoding: AssetEncoding,
    dirty: bool,
}

impl Record {
    pub fn new(type_name: impl Into<String>, path: AssetPath) -> Self {
        Self {
            path,
            type_name: type_name.into(),
            fields: IndexMap::new(),
            encoding: AssetEncoding::Plain,
            dirty: false,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: AssetValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Display name: the file stem of the storage location.
    pub fn name(&self) -> &str {
        self.path.file_stem()
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn raw(&self, field: &str) -> Option<&AssetValue> {
        self.fields.get(field)
    }

    pub fn set_raw(&mut self, field: &str, value: AssetValue) {
        match self.fields.get_mut(field) {
            Some(slot) => *slot = value,
            None => {
                self.fields.insert(field.to_string(), value);
            }
        }
    }

    pub fn encoding(&self) -> AssetEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: AssetEncoding) {
        self.encoding = encoding;
    }

    /// True while the record holds edits the store has not accepted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Value copy of this record under a new identity.
    pub fn relocated(&self, path: AssetPath) -> Record {
        Record {
            path,
            dirty: false,
            ..self.clone()
        }
    }

    pub fn from_document(path: AssetPath, doc: AssetValue) -> Result<Record, StoreError> {
        let AssetValue::Object(mut map) = doc else {
            return Err(StoreError::Parse {
                details: format!("expected an object, found {}", doc.type_name()),
                path,
            });
        };
        let type_name = match map.shift_remove(statics::ASSET_TYPE_KEY) {
            Some(AssetValue::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(StoreError::MissingType(path)),
        };
        Ok(Record {
            path,
            type_name,
            fields: map,
            encoding: AssetEncoding::Plain,
            dirty: false,
        })
    }

    pub fn to_document(&self) -> AssetValue {
        let mut map = IndexMap::with_capacity(self.fields.len() + 1);
        map.insert(
            statics::ASSET_TYPE_KEY.to_string(),
            AssetValue::String(self.type_name.clone()),
        );
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        AssetValue::Object(map)
    }

    pub fn approximate_size(&self) -> u64 {
        let own = std::mem::size_of::<Record>() as u64;
        own + self.path.as_str().len() as u64
            + self.type_name.capacity() as u64
            + self
                .fields
                .iter()
                .map(|(k, v)| k.capacity() as u64 + v.approximate_size())
                .sum::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::{AssetPath, AssetValue, error::StoreError};

    #[test]
    fn document_round_trip_keeps_type_first() {
        let doc = AssetValue::parse_json5(r#"{ damage: 10, "$type": "Weapon" }"#).unwrap();
        let rec = Record::from_document(AssetPath::new("Weapons/Axe.asset"), doc).unwrap();
        assert_eq!(rec.type_name(), "Weapon");
        assert_eq!(rec.name(), "Axe");
        assert!(rec.raw("$type").is_none());

        let out = rec.to_document();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["$type".to_string(), "damage".to_string()]);
    }

    #[test]
    fn missing_type_is_an_error() {
        let doc = AssetValue::parse_json5("{ damage: 10 }").unwrap();
        let err = Record::from_document(AssetPath::new("x.asset"), doc).unwrap_err();
        assert!(matches!(err, StoreError::MissingType(_)));
    }

    #[test]
    fn relocated_copy_has_new_identity_and_same_values() {
        let mut rec = Record::new("Weapon", AssetPath::new("W/Axe.asset"))
            .with_field("damage", AssetValue::Bool(true));
        rec.mark_dirty();
        let copy = rec.relocated(AssetPath::new("W/Axe1.asset"));
        assert_eq!(copy.name(), "Axe1");
        assert_eq!(copy.raw("damage"), rec.raw("damage"));
        assert!(!copy.is_dirty());
    }
}
