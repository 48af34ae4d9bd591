//! The capability the applicator uses to read and mutate files. Kept
//! narrow and passed explicitly rather than reached for through a global.

use std::path::{Component, Path, PathBuf};

use crate::error::PatchError;

/// Everything the applicator needs from a file-system-like backend.
pub trait Store {
    fn exists(&self, path: &Path) -> Result<bool, PatchError>;
    fn read(&self, path: &Path) -> Result<Vec<u8>, PatchError>;
    /// Creates parent directories as needed; overwrites an existing file.
    fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchError>;
    /// No-op if `path` does not exist.
    fn remove(&mut self, path: &Path) -> Result<(), PatchError>;
    /// Overwrites `dest` if it already exists.
    fn move_path(&mut self, source: &Path, dest: &Path) -> Result<(), PatchError>;
    /// POSIX mode bits (low 12 bits); `None` where the backend has no
    /// concept of file permissions.
    fn get_permissions(&self, path: &Path) -> Result<Option<u32>, PatchError>;
    fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchError>;
}

/// A `Store` backed directly by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl Store for FsStore {
    fn exists(&self, path: &Path) -> Result<bool, PatchError> {
        Ok(path.exists())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PatchError> {
        std::fs::read(path)
            .map_err(|e| PatchError::io(format!("reading {}: {e}", path.display())))
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PatchError::io(format!("creating {}: {e}", parent.display())))?;
            }
        }
        std::fs::write(path, contents)
            .map_err(|e| PatchError::io(format!("writing {}: {e}", path.display())))
    }

    fn remove(&mut self, path: &Path) -> Result<(), PatchError> {
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_file(path)
            .map_err(|e| PatchError::io(format!("removing {}: {e}", path.display())))
    }

    fn move_path(&mut self, source: &Path, dest: &Path) -> Result<(), PatchError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PatchError::io(format!("creating {}: {e}", parent.display())))?;
            }
        }
        std::fs::rename(source, dest)
            .map_err(|e| PatchError::io(format!("moving {} to {}: {e}", source.display(), dest.display())))
    }

    #[cfg(unix)]
    fn get_permissions(&self, path: &Path) -> Result<Option<u32>, PatchError> {
        use std::os::unix::fs::PermissionsExt;
        let meta = std::fs::metadata(path)
            .map_err(|e| PatchError::io(format!("reading permissions of {}: {e}", path.display())))?;
        Ok(Some(meta.permissions().mode() & 0o7777))
    }

    #[cfg(not(unix))]
    fn get_permissions(&self, _path: &Path) -> Result<Option<u32>, PatchError> {
        Ok(None)
    }

    #[cfg(unix)]
    fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| PatchError::io(format!("setting permissions of {}: {e}", path.display())))
    }

    #[cfg(not(unix))]
    fn set_permissions(&mut self, _path: &Path, _mode: u32) -> Result<(), PatchError> {
        Ok(())
    }
}

/// Wraps any `Store`, confining every path to a fixed root directory.
pub struct SandboxStore<S> {
    inner: S,
    root: PathBuf,
}

impl<S: Store> SandboxStore<S> {
    pub fn new(inner: S, root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            root: root.into(),
        }
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, PatchError> {
        if path.is_absolute() {
            return Err(PatchError::io(format!(
                "path {} is outside the sandbox",
                path.display()
            )));
        }
        let joined = self.root.join(path);
        let normalized = normalize_lexically(&joined);
        if !normalized.starts_with(&self.root) {
            return Err(PatchError::io(format!(
                "path {} is outside the sandbox",
                path.display()
            )));
        }
        if let Ok(canon) = normalized.canonicalize() {
            if let Ok(canon_root) = self.root.canonicalize() {
                if !canon.starts_with(&canon_root) {
                    return Err(PatchError::io(format!(
                        "path {} is outside the sandbox",
                        path.display()
                    )));
                }
            }
        }
        Ok(normalized)
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl<S: Store> Store for SandboxStore<S> {
    fn exists(&self, path: &Path) -> Result<bool, PatchError> {
        self.inner.exists(&self.resolve(path)?)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PatchError> {
        self.inner.read(&self.resolve(path)?)
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchError> {
        let resolved = self.resolve(path)?;
        self.inner.write(&resolved, contents)
    }

    fn remove(&mut self, path: &Path) -> Result<(), PatchError> {
        let resolved = self.resolve(path)?;
        self.inner.remove(&resolved)
    }

    fn move_path(&mut self, source: &Path, dest: &Path) -> Result<(), PatchError> {
        let source = self.resolve(source)?;
        let dest = self.resolve(dest)?;
        self.inner.move_path(&source, &dest)
    }

    fn get_permissions(&self, path: &Path) -> Result<Option<u32>, PatchError> {
        self.inner.get_permissions(&self.resolve(path)?)
    }

    fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchError> {
        let resolved = self.resolve(path)?;
        self.inner.set_permissions(&resolved, mode)
    }
}
