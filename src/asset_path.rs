use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A storage location relative to the project root, always `/`-separated.
/// Also serves as the identity of a record for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut s = path.as_ref().replace('\\', "/");
        while let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        }
        while s.contains("//") {
            s = s.replace("//", "/");
        }
        Self(s)
    }

    /// Builds an asset path from a file-system path below `root`.
    /// Returns `None` when `full` is not inside `root`.
    pub fn from_fs_path(root: &Path, full: &Path) -> Option<Self> {
        let rel = full.strip_prefix(root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(Self::new(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Directory part; empty for a path at the project root.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// File name without its last extension. A leading dot is part of the stem.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    /// Last extension including the dot (".asset"), or empty.
    pub fn extension(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[idx..],
            _ => "",
        }
    }

    pub fn with_file_name(&self, name: &str) -> Self {
        let parent = self.parent();
        if parent.is_empty() {
            Self::new(name)
        } else {
            Self::new(format!("{parent}/{name}"))
        }
    }

    pub fn join(&self, child: &str) -> Self {
        if self.0.is_empty() {
            Self::new(child)
        } else {
            Self::new(format!("{}/{}", self.0.trim_end_matches('/'), child))
        }
    }

    /// True when this path lies in the subtree `scope`. An empty scope contains everything.
    pub fn is_within(&self, scope: &AssetPath) -> bool {
        let scope = scope.0.trim_end_matches('/');
        if scope.is_empty() {
            return true;
        }
        self.0 == scope
            || self
                .0
                .strip_prefix(scope)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetPath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::AssetPath;
    use std::path::Path;

    #[test]
    fn splits_parent_stem_and_extension() {
        let p = AssetPath::new("Weapons/Melee/Axe3.asset");
        assert_eq!(p.parent(), "Weapons/Melee");
        assert_eq!(p.file_name(), "Axe3.asset");
        assert_eq!(p.file_stem(), "Axe3");
        assert_eq!(p.extension(), ".asset");

        let root = AssetPath::new("Shield");
        assert_eq!(root.parent(), "");
        assert_eq!(root.extension(), "");
        assert_eq!(root.file_stem(), "Shield");
    }

    #[test]
    fn normalizes_separators() {
        assert_eq!(
            AssetPath::new(".\\Weapons\\Axe.asset").as_str(),
            "Weapons/Axe.asset"
        );
        assert_eq!(AssetPath::new("a//b.asset").as_str(), "a/b.asset");
    }

    #[test]
    fn scope_containment_is_per_segment() {
        let p = AssetPath::new("Weapons/Axe.asset");
        assert!(p.is_within(&AssetPath::new("")));
        assert!(p.is_within(&AssetPath::new("Weapons")));
        assert!(p.is_within(&AssetPath::new("Weapons/")));
        assert!(!p.is_within(&AssetPath::new("Weap")));
        assert!(!p.is_within(&AssetPath::new("Armor")));
    }

    #[test]
    fn fs_round_trip() {
        let root = Path::new("/project");
        let p = AssetPath::new("Weapons/Axe.asset");
        let full = p.to_fs_path(root);
        assert_eq!(AssetPath::from_fs_path(root, &full), Some(p));
        assert_eq!(AssetPath::from_fs_path(root, Path::new("/elsewhere/x")), None);
    }
}
