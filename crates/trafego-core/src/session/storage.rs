//! Key/value backends for the persisted session.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::paths;

/// Durable key/value capability used by [`SessionStore`](super::SessionStore).
///
/// `set_all` and `remove_all` apply to every given key in one step so the
/// token and profile never end up half-written.
pub trait SessionStorage {
    /// Reads one value.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read or parsed.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes every entry in one step.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    /// Removes every key in one step. Missing keys are not an error.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn remove_all(&mut self, keys: &[&str]) -> Result<()>;
}

/// In-process storage; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.values.remove(*key);
        }
        Ok(())
    }
}

/// Single JSON document on disk (default `$TRAFEGO_HOME/session.json`).
///
/// Writes go through a temp file and a rename, with 0600 permissions on unix.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the default session path.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    /// Reads the current document, treating an unreadable one as empty so a
    /// corrupt file can always be overwritten or cleared.
    fn read_document_lenient(&self) -> BTreeMap<String, String> {
        self.read_document().unwrap_or_default()
    }

    fn write_document(&self, document: &BTreeMap<String, String>) -> Result<()> {
        if document.is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove session file {}", self.path.display())
                })?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(document).context("Failed to serialize session")?;
        let tmp_path = self.path.with_extension("json.tmp");

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let mut document = self.read_document_lenient();
        for (key, value) in entries {
            document.insert((*key).to_string(), (*value).to_string());
        }
        self.write_document(&document)
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        let mut document = self.read_document_lenient();
        for key in keys {
            document.remove(*key);
        }
        self.write_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_memory_storage_set_and_remove() {
        let mut storage = MemoryStorage::new();
        storage.set_all(&[("token", "abc"), ("user", "{}")]).unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));

        storage.remove_all(&["token", "user"]).unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        storage.remove_all(&["token", "user"]).unwrap();
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut storage = FileStorage::new(&path);
        storage.set_all(&[("token", "abc"), ("user", "{}")]).unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("user").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_remove_all_deletes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut storage = FileStorage::new(&path);
        storage.set_all(&[("token", "abc")]).unwrap();
        assert!(path.exists());

        storage.remove_all(&["token", "user"]).unwrap();
        assert!(!path.exists());
        storage.remove_all(&["token", "user"]).unwrap();
    }

    #[test]
    fn test_file_storage_corrupt_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let mut storage = FileStorage::new(&path);
        assert!(storage.get("token").is_err());

        storage.remove_all(&["token", "user"]).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut storage = FileStorage::new(&path);
        storage.set_all(&[("token", "abc")]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
