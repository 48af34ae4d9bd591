//! The applicator: mutates a `Store` according to a validated `Plan`.

pub mod buffer;
pub mod matcher;
pub mod ops;

use crate::config::ApplyConfig;
use crate::error::PatchError;
use crate::model::Plan;
use crate::store::Store;

pub use buffer::Buffer;
pub use matcher::apply_hunk;

/// Applies every directive in `plan`, in order, against `store`.
///
/// Callers are expected to have already run [`crate::validate::validate`];
/// this function does not re-check cross-directive invariants, only the
/// per-operation preconditions it needs to mutate the store safely.
pub fn apply_plan(plan: &Plan, store: &mut dyn Store, config: &ApplyConfig) -> Result<(), PatchError> {
    for directive in &plan.directives {
        ops::apply_directive(directive, store, config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Directive, Hunk, HunkHeader, Line, Operation};
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
    fn applies_directives_in_order() {
        let mut store = MemStore::default();
        store
            .files
            .insert(PathBuf::from("a.txt"), b"one\ntwo\n".to_vec());

        let mut plan = Plan::new();

        let mut modify = Directive::new(Operation::Modify);
        modify.old_path = Some(PathBuf::from("a.txt"));
        modify.new_path = Some(PathBuf::from("a.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Context("one".into()));
        hunk.lines.push(Line::Deletion("two".into()));
        hunk.lines.push(Line::Addition("TWO".into()));
        modify.hunks.push(hunk);
        plan.directives.push(modify);

        let mut add = Directive::new(Operation::Add);
        add.new_path = Some(PathBuf::from("b.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Addition("new file".into()));
        add.hunks.push(hunk);
        plan.directives.push(add);

        apply_plan(&plan, &mut store, &ApplyConfig::default()).unwrap();

        assert_eq!(store.files.get(Path::new("a.txt")).unwrap(), b"one\nTWO\n");
        assert_eq!(store.files.get(Path::new("b.txt")).unwrap(), b"new file\n");
    }
}
