//! The five per-operation apply algorithms.

use crate::config::ApplyConfig;
use crate::error::PatchError;
use crate::model::{Directive, Line, Operation};
use crate::store::Store;

use super::buffer::Buffer;
use super::matcher::apply_hunk;

pub fn apply_directive(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<(), PatchError> {
    match directive.op {
        Operation::Add => apply_add(directive, store),
        Operation::Delete => apply_delete(directive, store, config),
        Operation::Modify => apply_modify(directive, store, config),
        Operation::Rename => apply_rename(directive, store, config),
        Operation::Copy => apply_copy(directive, store, config),
    }
}

fn buffer_from_additions(directive: &Directive) -> Buffer {
    let mut lines = Vec::new();
    let mut has_trailing_newline = true;
    for hunk in &directive.hunks {
        for line in &hunk.lines {
            match line {
                Line::Addition(s) => lines.push(s.clone()),
                Line::NoNewlineMarker => has_trailing_newline = false,
                _ => {}
            }
        }
    }
    Buffer {
        lines,
        has_trailing_newline,
    }
}

fn apply_add(directive: &Directive, store: &mut dyn Store) -> Result<(), PatchError> {
    let new_path = directive
        .new_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Add directive is missing a new path"))?;
    if store.exists(new_path)? {
        return Err(PatchError::io(format!(
            "Add target already exists: {}",
            new_path.display()
        )));
    }

    let buffer = buffer_from_additions(directive);
    store.write(new_path, buffer.encode().as_bytes())?;

    if let Some(mode_change) = directive.metadata.mode_change {
        if let Some(mode) = mode_change.new_mode {
            store.set_permissions(new_path, mode)?;
        }
    }
    Ok(())
}

fn apply_delete(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<(), PatchError> {
    let old_path = directive
        .old_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Delete directive is missing an old path"))?;
    if !store.exists(old_path)? {
        return Err(PatchError::io(format!(
            "Delete target does not exist: {}",
            old_path.display()
        )));
    }

    let mut buffer = Buffer::load(&store.read(old_path)?)?;
    for hunk in &directive.hunks {
        apply_hunk(&mut buffer, hunk, config)?;
    }
    if !buffer.lines.is_empty() {
        return Err(PatchError::validation(format!(
            "Delete directive did not remove all content from {}",
            old_path.display()
        )));
    }
    store.remove(old_path)
}

fn apply_modify(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<(), PatchError> {
    let path = directive
        .old_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Modify directive is missing a path"))?;
    if !store.exists(path)? {
        return Err(PatchError::io(format!(
            "Modify target does not exist: {}",
            path.display()
        )));
    }

    let mut buffer = Buffer::load(&store.read(path)?)?;
    for hunk in &directive.hunks {
        apply_hunk(&mut buffer, hunk, config)?;
    }
    store.write(path, buffer.encode().as_bytes())?;

    if let Some(mode_change) = directive.metadata.mode_change {
        if let Some(mode) = mode_change.new_mode {
            store.set_permissions(path, mode)?;
        }
    }
    Ok(())
}

fn apply_rename(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<(), PatchError> {
    let old_path = directive
        .old_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Rename directive is missing an old path"))?;
    let new_path = directive
        .new_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Rename directive is missing a new path"))?;
    if !store.exists(old_path)? {
        return Err(PatchError::io(format!(
            "Rename source does not exist: {}",
            old_path.display()
        )));
    }

    let captured_permissions = store.get_permissions(old_path)?;

    if directive.hunks.is_empty() {
        store.move_path(old_path, new_path)?;
    } else {
        let mut buffer = Buffer::load(&store.read(old_path)?)?;
        for hunk in &directive.hunks {
            apply_hunk(&mut buffer, hunk, config)?;
        }
        store.write(new_path, buffer.encode().as_bytes())?;
        store.remove(old_path)?;
    }

    apply_inherited_mode(directive, store, new_path, captured_permissions)
}

fn apply_copy(
    directive: &Directive,
    store: &mut dyn Store,
    config: &ApplyConfig,
) -> Result<(), PatchError> {
    let old_path = directive
        .old_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Copy directive is missing an old path"))?;
    let new_path = directive
        .new_path
        .as_ref()
        .ok_or_else(|| PatchError::io("Copy directive is missing a new path"))?;
    if !store.exists(old_path)? {
        return Err(PatchError::io(format!(
            "Copy source does not exist: {}",
            old_path.display()
        )));
    }
    if store.exists(new_path)? {
        return Err(PatchError::io(format!(
            "Copy target already exists: {}",
            new_path.display()
        )));
    }

    let captured_permissions = store.get_permissions(old_path)?;

    let mut buffer = Buffer::load(&store.read(old_path)?)?;
    for hunk in &directive.hunks {
        apply_hunk(&mut buffer, hunk, config)?;
    }
    store.write(new_path, buffer.encode().as_bytes())?;

    apply_inherited_mode(directive, store, new_path, captured_permissions)
}

fn apply_inherited_mode(
    directive: &Directive,
    store: &mut dyn Store,
    path: &std::path::Path,
    captured_permissions: Option<u32>,
) -> Result<(), PatchError> {
    if let Some(mode) = directive.metadata.mode_change.and_then(|m| m.new_mode) {
        store.set_permissions(path, mode)?;
    } else if let Some(mode) = captured_permissions {
        store.set_permissions(path, mode)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Directive, Hunk, HunkHeader, LineRange};
    use crate::store::Store;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct MemStore {
        files: HashMap<PathBuf, Vec<u8>>,
        modes: HashMap<PathBuf, u32>,
    }

    impl Store for MemStore {
        fn exists(&self, path: &Path) -> Result<bool, PatchError> {
            Ok(self.files.contains_key(path))
        }
        fn read(&self, path: &Path) -> Result<Vec<u8>, PatchError> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| PatchError::io("not found"))
        }
        fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchError> {
            self.files.insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }
        fn remove(&mut self, path: &Path) -> Result<(), PatchError> {
            self.files.remove(path);
            Ok(())
        }
        fn move_path(&mut self, source: &Path, dest: &Path) -> Result<(), PatchError> {
            if let Some(bytes) = self.files.remove(source) {
                self.files.insert(dest.to_path_buf(), bytes);
            }
            if let Some(mode) = self.modes.remove(source) {
                self.modes.insert(dest.to_path_buf(), mode);
            }
            Ok(())
        }
        fn get_permissions(&self, path: &Path) -> Result<Option<u32>, PatchError> {
            Ok(self.modes.get(path).copied())
        }
        fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchError> {
            self.modes.insert(path.to_path_buf(), mode);
            Ok(())
        }
    }

    #[test]
    fn add_writes_joined_additions() {
        let mut store = MemStore::default();
        let mut directive = Directive::new(Operation::Add);
        directive.new_path = Some(PathBuf::from("greet.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Addition("Hello".into()));
        hunk.lines.push(Line::Addition("World".into()));
        directive.hunks.push(hunk);

        apply_directive(&directive, &mut store, &ApplyConfig::default()).unwrap();
        assert_eq!(
            store.files.get(Path::new("greet.txt")).unwrap(),
            b"Hello\nWorld\n"
        );
    }

    #[test]
    fn delete_removes_file_when_buffer_emptied() {
        let mut store = MemStore::default();
        store
            .files
            .insert(PathBuf::from("obsolete.txt"), b"Goodbye\nWorld\n".to_vec());

        let mut directive = Directive::new(Operation::Delete);
        directive.old_path = Some(PathBuf::from("obsolete.txt"));
        let mut hunk = Hunk::new(HunkHeader {
            old_range: Some(LineRange { start: 1, len: 2 }),
            new_range: None,
            section: None,
        });
        hunk.lines.push(Line::Deletion("Goodbye".into()));
        hunk.lines.push(Line::Deletion("World".into()));
        directive.hunks.push(hunk);

        apply_directive(&directive, &mut store, &ApplyConfig::default()).unwrap();
        assert!(!store.files.contains_key(Path::new("obsolete.txt")));
    }

    #[test]
    fn rename_with_edit_inherits_permissions() {
        let mut store = MemStore::default();
        store.files.insert(PathBuf::from("foo.txt"), b"foo\n".to_vec());
        store.modes.insert(PathBuf::from("foo.txt"), 0o755);

        let mut directive = Directive::new(Operation::Rename);
        directive.old_path = Some(PathBuf::from("foo.txt"));
        directive.new_path = Some(PathBuf::from("bar.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Deletion("foo".into()));
        hunk.lines.push(Line::Addition("bar".into()));
        directive.hunks.push(hunk);

        apply_directive(&directive, &mut store, &ApplyConfig::default()).unwrap();

        assert!(!store.files.contains_key(Path::new("foo.txt")));
        assert_eq!(store.files.get(Path::new("bar.txt")).unwrap(), b"bar\n");
        assert_eq!(store.modes.get(Path::new("bar.txt")).copied(), Some(0o755));
    }
}
