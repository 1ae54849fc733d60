use crate::{AssetPath, error::PathError};

const COPY_SUFFIX: &str = "_Copy";

/// Proposes a free path for a duplicate of `original`.
///
/// `Axe3.asset` continues the trailing number (`Axe4`, `Axe5`, ...), while
/// `Shield.asset` becomes `Shield_Copy1`, `Shield_Copy2`, ... The first candidate
/// for which `exists` is false wins. Nothing is written.
pub fn unique_path(
    original: &AssetPath,
    exists: impl Fn(&AssetPath) -> bool,
) -> Result<AssetPath, PathError> {
    let stem = original.file_stem();
    if stem.is_empty() {
        return Err(PathError::InvalidPath(original.clone()));
    }
    let ext = original.extension();

    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    let (prefix, suffix, mut index) = match digits_start {
        // A digit run too long for u64 restarts the count.
        Some(i) => (&stem[..i], "", stem[i..].parse::<u64>().unwrap_or(0)),
        None => (stem, COPY_SUFFIX, 0),
    };

    loop {
        index = index.saturating_add(1);
        let candidate = original.with_file_name(&format!("{prefix}{suffix}{index}{ext}"));
        if !exists(&candidate) {
            return Ok(candidate);
        }
        if index == u64::MAX {
            return Err(PathError::InvalidPath(original.clone()));
        }
    }
}
