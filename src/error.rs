use std::io;

use thiserror::Error;

use crate::AssetPath;

/// Schema problems. Unclassifiable field kinds never surface as this error;
/// they degrade to the opaque editor instead.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("reading schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("parsing schema {path}: {details}")]
    Parse { path: String, details: String },
    #[error("type '{type_name}' names unknown base type '{base}'")]
    UnknownBase { type_name: String, base: String },
    #[error("type '{0}' inherits from itself")]
    Cycle(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("cannot derive a new path from '{0}'")]
    InvalidPath(AssetPath),
}

/// Failures of the record store. The working set is left as-is when one occurs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("asset '{path}' is not valid: {details}")]
    Parse { path: AssetPath, details: String },
    #[error("asset '{0}' does not exist")]
    NotFound(AssetPath),
    #[error("asset '{0}' already exists")]
    AlreadyExists(AssetPath),
    #[error("asset '{0}' has no \"$type\" entry")]
    MissingType(AssetPath),
}

/// Persisted column widths that cannot be reused. Always recovered by
/// regenerating defaults.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("stored widths are malformed: {0:?}")]
    Malformed(String),
    #[error("stored {stored} widths, expected {expected}")]
    CountMismatch { stored: usize, expected: usize },
}

/// Everything a session operation can report back to the surface.
#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no record type is selected")]
    NoTypeSelected,
    #[error("type '{0}' is not in the catalog")]
    UnknownType(String),
    #[error("record '{0}' is not in the working set")]
    UnknownRecord(AssetPath),
    #[error("'{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },
}
