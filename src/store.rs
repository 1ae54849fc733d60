//! Durable record storage and memory measurement, the two host capabilities the
//! grid consumes. [`FsRecordStore`] binds them to a project directory of
//! JSON5 `.asset` files; [`MemoryStore`] keeps everything in memory.

use crate::{
    AssetPath, AssetValue, Record,
    error::StoreError,
    record::AssetEncoding,
    schema::TypeDescriptor,
    statics,
};
use flate2::{Compression, GzBuilder, read::GzDecoder};
use std::{
    collections::BTreeMap,
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// A discovered record: where it lives and its runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub path: AssetPath,
    pub type_name: String,
}

pub trait RecordStore {
    /// Every record under `scope`, optionally restricted to one exact type.
    fn find_records(
        &self,
        scope: &AssetPath,
        type_filter: Option<&str>,
    ) -> Result<Vec<RecordRef>, StoreError>;
    fn load(&self, path: &AssetPath) -> Result<Record, StoreError>;
    fn create(&mut self, ty: &TypeDescriptor, path: &AssetPath) -> Result<Record, StoreError>;
    fn save(&mut self, record: &Record) -> Result<(), StoreError>;
    fn duplicate_at(&mut self, record: &Record, path: &AssetPath) -> Result<Record, StoreError>;
    fn delete(&mut self, path: &AssetPath) -> Result<(), StoreError>;
    fn exists(&self, path: &AssetPath) -> bool;

    fn path_of(&self, record: &Record) -> AssetPath {
        record.path().clone()
    }

    /// Host-style free path: `base` itself when free, otherwise `"<stem> <n><ext>"`.
    fn unique_available_path(&self, base: &AssetPath) -> AssetPath {
        if !self.exists(base) {
            return base.clone();
        }
        let stem = base.file_stem();
        let (prefix, start) = match stem.rsplit_once(' ') {
            Some((prefix, n)) if !prefix.is_empty() => match n.parse::<u64>() {
                Ok(n) => (prefix, n),
                Err(_) => (stem, 0),
            },
            _ => (stem, 0),
        };
        let ext = base.extension();
        let mut index = start;
        loop {
            index += 1;
            let candidate = base.with_file_name(&format!("{prefix} {index}{ext}"));
            if !self.exists(&candidate) {
                return candidate;
            }
        }
    }
}

/// Best-effort byte size of a record. Failures report zero.
pub trait MemoryMeter {
    fn size_of(&self, record: &Record) -> u64;
}

/// Estimates the in-memory footprint from the record's document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeter;

impl MemoryMeter for ApproximateMeter {
    fn size_of(&self, record: &Record) -> u64 {
        record.approximate_size()
    }
}

/// Project directory of `.asset` files (plain or gzip-compressed JSON5).
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_document(&self, path: &AssetPath) -> Result<(AssetValue, AssetEncoding), StoreError> {
        let full = path.to_fs_path(&self.root);
        if !full.is_file() {
            return Err(StoreError::NotFound(path.clone()));
        }
        let bytes = fs::read(&full)?;
        let encoding = detect_encoding(&bytes);
        let text_bytes = match encoding {
            AssetEncoding::Plain => bytes,
            AssetEncoding::Gzip => {
                let mut decoder = GzDecoder::new(&bytes[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                out
            }
        };
        let text = std::str::from_utf8(&text_bytes).map_err(|e| StoreError::Parse {
            path: path.clone(),
            details: e.to_string(),
        })?;
        let doc = AssetValue::parse_json5(text).map_err(|e| StoreError::Parse {
            path: path.clone(),
            details: format!("{e:#}"),
        })?;
        Ok((doc, encoding))
    }

    fn write(&self, record: &Record) -> Result<(), StoreError> {
        let full = record.path().to_fs_path(&self.root);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = encode_document(&record.to_document(), record.encoding())?;
        fs::write(&full, bytes)?;
        Ok(())
    }

    fn collect_assets(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StoreError> {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .collect();
        entries.sort();
        for path in entries {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }
            if path.is_dir() {
                self.collect_assets(&path, out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(statics::ASSET_EXTENSION)
            {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl RecordStore for FsRecordStore {
    fn find_records(
        &self,
        scope: &AssetPath,
        type_filter: Option<&str>,
    ) -> Result<Vec<RecordRef>, StoreError> {
        let dir = scope.to_fs_path(&self.root);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        self.collect_assets(&dir, &mut files)?;

        let mut out = Vec::with_capacity(files.len());
        for file in files {
            let Some(path) = AssetPath::from_fs_path(&self.root, &file) else {
                continue;
            };
            let type_name = match self.read_document(&path) {
                Ok((doc, _)) => match doc.get(statics::ASSET_TYPE_KEY).and_then(AssetValue::as_str)
                {
                    Some(t) => t.trim().to_string(),
                    None => {
                        debug!(%path, "skipping asset without a type");
                        continue;
                    }
                },
                Err(e) => {
                    debug!(%path, error = %e, "skipping unreadable asset");
                    continue;
                }
            };
            if type_filter.is_some_and(|t| t != type_name) {
                continue;
            }
            out.push(RecordRef { path, type_name });
        }
        Ok(out)
    }

    fn load(&self, path: &AssetPath) -> Result<Record, StoreError> {
        let (doc, encoding) = self.read_document(path)?;
        let mut record = Record::from_document(path.clone(), doc)?;
        record.set_encoding(encoding);
        Ok(record)
    }

    fn create(&mut self, ty: &TypeDescriptor, path: &AssetPath) -> Result<Record, StoreError> {
        if self.exists(path) {
            return Err(StoreError::AlreadyExists(path.clone()));
        }
        let record = Record::new(ty.name.clone(), path.clone());
        self.write(&record)?;
        info!(%path, type_name = %ty.name, "created asset");
        Ok(record)
    }

    fn save(&mut self, record: &Record) -> Result<(), StoreError> {
        self.write(record)?;
        debug!(path = %record.path(), "saved asset");
        Ok(())
    }

    fn duplicate_at(&mut self, record: &Record, path: &AssetPath) -> Result<Record, StoreError> {
        if self.exists(path) {
            return Err(StoreError::AlreadyExists(path.clone()));
        }
        let copy = record.relocated(path.clone());
        self.write(&copy)?;
        info!(from = %record.path(), to = %path, "duplicated asset");
        Ok(copy)
    }

    fn delete(&mut self, path: &AssetPath) -> Result<(), StoreError> {
        let full = path.to_fs_path(&self.root);
        if !full.is_file() {
            return Err(StoreError::NotFound(path.clone()));
        }
        fs::remove_file(&full)?;
        info!(%path, "deleted asset");
        Ok(())
    }

    fn exists(&self, path: &AssetPath) -> bool {
        !path.is_empty() && path.to_fs_path(&self.root).exists()
    }
}

fn detect_encoding(bytes: &[u8]) -> AssetEncoding {
    // Gzip magic: 1F 8B
    if bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B {
        AssetEncoding::Gzip
    } else {
        AssetEncoding::Plain
    }
}

fn encode_document(doc: &AssetValue, encoding: AssetEncoding) -> Result<Vec<u8>, StoreError> {
    let text = doc.to_json5_pretty();
    match encoding {
        AssetEncoding::Plain => Ok(text.into_bytes()),
        AssetEncoding::Gzip => {
            let mut encoder = GzBuilder::new()
                .mtime(0)
                .write(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes())?;
            Ok(encoder.finish()?)
        }
    }
}

/// Records held in memory, keyed by path. Used for headless sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<AssetPath, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.path().clone(), record);
    }

    pub fn get(&self, path: &AssetPath) -> Option<&Record> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn find_records(
        &self,
        scope: &AssetPath,
        type_filter: Option<&str>,
    ) -> Result<Vec<RecordRef>, StoreError> {
        Ok(self
            .records
            .values()
            .filter(|r| r.path().is_within(scope))
            .filter(|r| type_filter.is_none_or(|t| t == r.type_name()))
            .map(|r| RecordRef {
                path: r.path().clone(),
                type_name: r.type_name().to_string(),
            })
            .collect())
    }

    fn load(&self, path: &AssetPath) -> Result<Record, StoreError> {
        self.records
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }

    fn create(&mut self, ty: &TypeDescriptor, path: &AssetPath) -> Result<Record, StoreError> {
        if self.exists(path) {
            return Err(StoreError::AlreadyExists(path.clone()));
        }
        let record = Record::new(ty.name.clone(), path.clone());
        self.insert(record.clone());
        Ok(record)
    }

    fn save(&mut self, record: &Record) -> Result<(), StoreError> {
        let mut stored = record.clone();
        stored.mark_clean();
        self.insert(stored);
        Ok(())
    }

    fn duplicate_at(&mut self, record: &Record, path: &AssetPath) -> Result<Record, StoreError> {
        if self.exists(path) {
            return Err(StoreError::AlreadyExists(path.clone()));
        }
        let copy = record.relocated(path.clone());
        self.insert(copy.clone());
        Ok(copy)
    }

    fn delete(&mut self, path: &AssetPath) -> Result<(), StoreError> {
        self.records
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.clone()))
    }

    fn exists(&self, path: &AssetPath) -> bool {
        self.records.contains_key(path)
    }
}
