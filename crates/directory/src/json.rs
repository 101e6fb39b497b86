//! Directory backend persisted to a single JSON document.
//!
//! Every `save` and `group_save` rewrites the document before returning, so a
//! run that is killed part way leaves exactly the writes that completed. A
//! write that cannot be persisted is not applied in memory either.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DirectoryError;
use crate::memory::{DirectoryState, MemoryDirectory};
use crate::record::{GroupHandle, UserHandle};
use crate::traits::DirectoryStore;

#[derive(Debug)]
pub struct JsonDirectory {
    path: PathBuf,
    inner: MemoryDirectory,
}

impl JsonDirectory {
    /// Open an existing directory document.
    pub fn open(path: &Path) -> Result<Self, DirectoryError> {
        let content = fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let state: DirectoryState = serde_json::from_str(&content)?;
        Ok(JsonDirectory {
            path: path.to_path_buf(),
            inner: MemoryDirectory::from_state(state),
        })
    }

    /// Open a directory document, starting empty if the file does not exist yet.
    pub fn open_or_create(path: &Path) -> Result<Self, DirectoryError> {
        if path.exists() {
            return JsonDirectory::open(path);
        }
        let dir = JsonDirectory {
            path: path.to_path_buf(),
            inner: MemoryDirectory::new(),
        };
        dir.flush()?;
        Ok(dir)
    }

    pub fn state(&self) -> &DirectoryState {
        self.inner.state()
    }

    /// Create an empty group and persist it. Returns `false` if it already existed.
    pub fn add_group(&mut self, name: &str) -> Result<bool, DirectoryError> {
        let mut next = self.inner.clone();
        if !next.add_group(name) {
            return Ok(false);
        }
        self.commit(next)?;
        Ok(true)
    }

    /// Persist `next` and only then make it the in-memory state.
    fn commit(&mut self, next: MemoryDirectory) -> Result<(), DirectoryError> {
        self.write(next.state())?;
        self.inner = next;
        Ok(())
    }

    fn flush(&self) -> Result<(), DirectoryError> {
        self.write(self.inner.state())
    }

    /// Write the document via a sibling temp file and rename.
    fn write(&self, state: &DirectoryState) -> Result<(), DirectoryError> {
        let body = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| DirectoryError::Io {
            path: self.path.display().to_string(),
            source,
        };
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), "directory flushed");
        Ok(())
    }
}

impl DirectoryStore for JsonDirectory {
    fn user_exists(&self, username: &str) -> Result<bool, DirectoryError> {
        self.inner.user_exists(username)
    }

    fn user(&self, username: &str) -> Result<UserHandle, DirectoryError> {
        self.inner.user(username)
    }

    fn create_user(&mut self, username: &str) -> Result<UserHandle, DirectoryError> {
        self.inner.create_user(username)
    }

    fn save(&mut self, user: &UserHandle) -> Result<(), DirectoryError> {
        let mut next = self.inner.clone();
        next.save(user)?;
        self.commit(next)
    }

    fn group_exists(&self, name: &str) -> Result<bool, DirectoryError> {
        self.inner.group_exists(name)
    }

    fn group(&self, name: &str) -> Result<GroupHandle, DirectoryError> {
        self.inner.group(name)
    }

    fn group_save(&mut self, group: &GroupHandle) -> Result<(), DirectoryError> {
        let mut next = self.inner.clone();
        next.group_save(group)?;
        self.commit(next)
    }

    fn derive_username(&self, org: &str, first_name: &str, last_name: &str) -> String {
        self.inner.derive_username(org, first_name, last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saves_are_visible_after_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("directory.json");
        {
            let mut dir = JsonDirectory::open_or_create(&path).unwrap();
            dir.add_group("teachers").unwrap();
            let user = dir.create_user("abc_jdoe").unwrap();
            dir.save(&user).unwrap();
            let mut group = dir.group("teachers").unwrap();
            dir.group_add_member(&mut group, &user).unwrap();
            dir.group_save(&group).unwrap();
        }
        let reopened = JsonDirectory::open(&path).unwrap();
        assert!(reopened.user_exists("abc_jdoe").unwrap());
        assert!(reopened.group("teachers").unwrap().has_member("abc_jdoe"));
    }

    #[test]
    fn unsaved_group_mutation_is_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("directory.json");
        let mut dir = JsonDirectory::open_or_create(&path).unwrap();
        dir.add_group("mentors").unwrap();
        let user = dir.create_user("jdoe").unwrap();
        dir.save(&user).unwrap();
        let mut group = dir.group("mentors").unwrap();
        dir.group_add_member(&mut group, &user).unwrap();
        drop(dir);

        let reopened = JsonDirectory::open(&path).unwrap();
        assert!(reopened.group("mentors").unwrap().members.is_empty());
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("state");
        fs::create_dir(&parent).unwrap();
        let path = parent.join("directory.json");
        let mut dir = JsonDirectory::open_or_create(&path).unwrap();
        dir.add_group("teachers").unwrap();
        fs::remove_dir_all(&parent).unwrap();

        let user = dir.create_user("abc_jdoe").unwrap();
        assert!(matches!(dir.save(&user), Err(DirectoryError::Io { .. })));
        assert!(!dir.user_exists("abc_jdoe").unwrap());

        let mut group = dir.group("teachers").unwrap();
        group.members.insert("abc_jdoe".into());
        assert!(dir.group_save(&group).is_err());
        assert!(dir.group("teachers").unwrap().members.is_empty());

        assert!(dir.add_group("mentors").is_err());
        assert!(!dir.group_exists("mentors").unwrap());
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = JsonDirectory::open(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DirectoryError::Io { .. }));
    }

    #[test]
    fn open_garbage_is_serialization_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("directory.json");
        fs::write(&path, "not json").unwrap();
        let err = JsonDirectory::open(&path).unwrap_err();
        assert!(matches!(err, DirectoryError::Serialization(_)));
    }
}
