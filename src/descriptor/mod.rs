use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Name of the descriptor file living inside each synced source directory.
pub const DESCRIPTOR_FILE: &str = ".sync";

/// The `.sync` file: destination plus ignore rules for one source directory.
///
/// `target` is used verbatim (after tilde expansion) and takes precedence
/// over `name`, which is joined against the configured storage root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_exts: Vec<String>,
}

impl SyncDescriptor {
    /// Resolve the destination directory, or fail with `InvalidDescriptor`
    /// when neither `target` nor `name` + storage root yields one.
    pub fn resolve_target(&self, storage_root: Option<&Path>) -> Result<PathBuf, SyncError> {
        if let Some(target) = self.target.as_deref().filter(|t| !t.is_empty()) {
            return Ok(PathBuf::from(shellexpand::tilde(target).into_owned()));
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return match storage_root {
                Some(root) => Ok(root.join(name)),
                None => Err(SyncError::InvalidDescriptor(format!(
                    "descriptor names storage entry \"{}\" but no storage root is configured",
                    name
                ))),
            };
        }
        Err(SyncError::InvalidDescriptor(
            "missing target or name".to_string(),
        ))
    }
}

/// Parse a descriptor file.
pub fn load(path: &Path) -> Result<SyncDescriptor, SyncError> {
    let contents = fs::read_to_string(path).map_err(SyncError::io("read", path))?;
    serde_json::from_str(&contents)
        .map_err(|e| SyncError::InvalidDescriptor(format!("{}: {}", path.display(), e)))
}

/// Accepts either a source directory or the path of its `.sync` file and
/// returns `(source_dir, descriptor_path)`.
pub fn locate(path: &Path) -> Result<(PathBuf, PathBuf), SyncError> {
    if path.is_dir() {
        return Ok((path.to_path_buf(), path.join(DESCRIPTOR_FILE)));
    }
    if path.file_name().map_or(false, |n| n == DESCRIPTOR_FILE) {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok((dir, path.to_path_buf()));
    }
    Err(SyncError::InvalidDescriptor(format!(
        "{} is neither a directory nor a {} file",
        path.display(),
        DESCRIPTOR_FILE
    )))
}

/// Bootstrap a fresh `.sync` in `dir`. Without an explicit name or target
/// the directory's basename becomes the storage entry name.
pub fn init(
    dir: &Path,
    name: Option<&str>,
    target: Option<&str>,
    force: bool,
) -> Result<PathBuf, SyncError> {
    let meta = fs::metadata(dir).map_err(SyncError::io("stat", dir))?;
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory(dir.to_path_buf()));
    }

    let path = dir.join(DESCRIPTOR_FILE);
    if path.exists() && !force {
        return Err(SyncError::DescriptorExists(path));
    }

    let name = match (name, target) {
        (Some(n), _) => Some(n.to_string()),
        (None, Some(_)) => None,
        (None, None) => Some(basename_of(dir)?),
    };
    let descriptor = SyncDescriptor {
        name,
        target: target.map(String::from),
        ignore_exts: Vec::new(),
    };

    let json = serde_json::to_string_pretty(&descriptor)
        .map_err(|e| SyncError::InvalidDescriptor(e.to_string()))?;
    fs::write(&path, json + "\n").map_err(SyncError::io("write", &path))?;
    Ok(path)
}

fn basename_of(dir: &Path) -> Result<String, SyncError> {
    let resolved = fs::canonicalize(dir).map_err(SyncError::io("resolve", dir))?;
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SyncError::InvalidDescriptor(format!(
                "cannot derive a name from {}; pass --name or --target",
                dir.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_all_recognized_keys() {
        let desc: SyncDescriptor = serde_json::from_str(
            r#"{ "name": "notes", "target": "/backup/notes", "ignoreExts": ["log", "tmp"] }"#,
        )
        .unwrap();
        assert_eq!(desc.name.as_deref(), Some("notes"));
        assert_eq!(desc.target.as_deref(), Some("/backup/notes"));
        assert_eq!(desc.ignore_exts, vec!["log", "tmp"]);
    }

    #[test]
    fn missing_ignore_exts_means_ignore_nothing() {
        let desc: SyncDescriptor = serde_json::from_str(r#"{ "name": "notes" }"#).unwrap();
        assert!(desc.ignore_exts.is_empty());
    }

    #[test]
    fn target_takes_precedence_over_name() {
        let desc: SyncDescriptor =
            serde_json::from_str(r#"{ "name": "notes", "target": "/backup/notes" }"#).unwrap();
        let resolved = desc.resolve_target(Some(Path::new("/storage"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/backup/notes"));
    }

    #[test]
    fn name_joins_against_storage_root() {
        let desc: SyncDescriptor = serde_json::from_str(r#"{ "name": "notes" }"#).unwrap();
        let resolved = desc.resolve_target(Some(Path::new("/storage"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/storage/notes"));
    }

    #[test]
    fn name_without_storage_root_is_invalid() {
        let desc: SyncDescriptor = serde_json::from_str(r#"{ "name": "notes" }"#).unwrap();
        let err = desc.resolve_target(None).unwrap_err();
        assert!(matches!(err, SyncError::InvalidDescriptor(_)));
    }

    #[test]
    fn empty_descriptor_is_unresolvable() {
        let desc = SyncDescriptor::default();
        let err = desc.resolve_target(Some(Path::new("/storage"))).unwrap_err();
        assert!(matches!(err, SyncError::InvalidDescriptor(_)));
    }

    #[test]
    fn locate_accepts_directory_or_descriptor_path() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();

        let (src, desc_path) = locate(&dir).unwrap();
        assert_eq!(src, dir);
        assert_eq!(desc_path, dir.join(DESCRIPTOR_FILE));

        let (src, desc_path2) = locate(&dir.join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(src, dir);
        assert_eq!(desc_path2, desc_path);
    }

    #[test]
    fn locate_rejects_other_files() {
        let tmp = TempDir::new().unwrap();
        let other = tmp.path().join("notes.txt");
        std::fs::write(&other, "x").unwrap();
        assert!(matches!(
            locate(&other),
            Err(SyncError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn init_writes_basename_descriptor() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("project");
        std::fs::create_dir(&dir).unwrap();

        let path = init(&dir, None, None, false).unwrap();
        let desc = load(&path).unwrap();
        assert_eq!(desc.name.as_deref(), Some("project"));
        assert!(desc.target.is_none());
    }

    #[test]
    fn init_refuses_to_overwrite_unless_forced() {
        let tmp = TempDir::new().unwrap();
        init(tmp.path(), Some("one"), None, false).unwrap();

        let err = init(tmp.path(), Some("two"), None, false).unwrap_err();
        assert!(matches!(err, SyncError::DescriptorExists(_)));

        let path = init(tmp.path(), Some("two"), None, true).unwrap();
        assert_eq!(load(&path).unwrap().name.as_deref(), Some("two"));
    }

    #[test]
    fn init_rejects_a_file_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            init(&file, None, None, false),
            Err(SyncError::NotADirectory(_))
        ));
    }

    #[test]
    fn unparseable_descriptor_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DESCRIPTOR_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(SyncError::InvalidDescriptor(_))));
    }
}
