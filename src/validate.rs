//! Semantic validation of a parsed `Plan`, run before any store I/O.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::error::PatchError;
use crate::model::{Directive, Hunk, Line, Operation, Plan};

/// Validates every directive in `plan`. Returns the first failure found;
/// never mutates the plan.
pub fn validate(plan: &Plan) -> Result<(), PatchError> {
    let mut seen_old_paths: HashSet<PathBuf> = HashSet::new();
    let mut new_path_owners: HashMap<PathBuf, Operation> = HashMap::new();

    for directive in &plan.directives {
        validate_paths(directive, &mut seen_old_paths, &mut new_path_owners)?;
        validate_hunk_count(directive)?;
        for hunk in &directive.hunks {
            validate_hunk_shape(directive.op, hunk)?;
        }
        validate_metadata(directive)?;
    }
    Ok(())
}

fn validate_paths(
    directive: &Directive,
    seen_old_paths: &mut HashSet<PathBuf>,
    new_path_owners: &mut HashMap<PathBuf, Operation>,
) -> Result<(), PatchError> {
    match directive.op {
        Operation::Add => {
            if directive.old_path.is_some() {
                return Err(PatchError::validation("Add directive must not have an old path"));
            }
            let new = directive
                .new_path
                .clone()
                .ok_or_else(|| PatchError::validation("Add directive requires a new path"))?;
            if new_path_owners.contains_key(&new) {
                return Err(PatchError::validation(format!(
                    "duplicate new path: {}",
                    new.display()
                )));
            }
            new_path_owners.insert(new, Operation::Add);
        }
        Operation::Delete => {
            let old = directive
                .old_path
                .clone()
                .ok_or_else(|| PatchError::validation("Delete directive requires an old path"))?;
            if directive.new_path.is_some() {
                return Err(PatchError::validation("Delete directive must not have a new path"));
            }
            if !seen_old_paths.insert(old.clone()) {
                return Err(PatchError::validation(format!(
                    "duplicate old path: {}",
                    old.display()
                )));
            }
        }
        Operation::Modify => {
            let old = directive
                .old_path
                .clone()
                .ok_or_else(|| PatchError::validation("Modify directive requires an old path"))?;
            let new = directive
                .new_path
                .clone()
                .ok_or_else(|| PatchError::validation("Modify directive requires a new path"))?;
            if old != new {
                return Err(PatchError::validation(
                    "Modify directive's old and new path must match",
                ));
            }
            if !seen_old_paths.insert(old.clone()) {
                return Err(PatchError::validation(format!(
                    "duplicate modification of path: {}",
                    old.display()
                )));
            }
            match new_path_owners.get(&old) {
                Some(Operation::Add) | Some(Operation::Rename) | Some(Operation::Copy) => {
                    new_path_owners.insert(old, Operation::Modify);
                }
                Some(Operation::Modify) => {
                    return Err(PatchError::validation(format!(
                        "path modified more than once: {}",
                        old.display()
                    )));
                }
                _ => {}
            }
        }
        Operation::Rename => {
            let old = directive
                .old_path
                .clone()
                .ok_or_else(|| PatchError::validation("Rename directive requires an old path"))?;
            let new = directive
                .new_path
                .clone()
                .ok_or_else(|| PatchError::validation("Rename directive requires a new path"))?;
            if old == new {
                return Err(PatchError::validation(
                    "Rename directive's old and new path must differ",
                ));
            }
            if !seen_old_paths.insert(old.clone()) {
                return Err(PatchError::validation(format!(
                    "duplicate old path: {}",
                    old.display()
                )));
            }
            if new_path_owners.contains_key(&new) {
                return Err(PatchError::validation(format!(
                    "duplicate new path: {}",
                    new.display()
                )));
            }
            new_path_owners.insert(new, Operation::Rename);
        }
        Operation::Copy => {
            let old = directive
                .old_path
                .clone()
                .ok_or_else(|| PatchError::validation("Copy directive requires an old path"))?;
            let new = directive
                .new_path
                .clone()
                .ok_or_else(|| PatchError::validation("Copy directive requires a new path"))?;
            if old == new {
                return Err(PatchError::validation(
                    "Copy directive's old and new path must differ",
                ));
            }
            if new_path_owners.contains_key(&new) {
                return Err(PatchError::validation(format!(
                    "duplicate new path: {}",
                    new.display()
                )));
            }
            new_path_owners.insert(new, Operation::Copy);
        }
    }
    Ok(())
}

fn validate_hunk_count(directive: &Directive) -> Result<(), PatchError> {
    match directive.op {
        Operation::Add | Operation::Delete | Operation::Modify => {
            if directive.hunks.is_empty() {
                return Err(PatchError::validation(format!(
                    "{:?} directive requires at least one hunk",
                    directive.op
                )));
            }
        }
        Operation::Rename | Operation::Copy => {}
    }
    Ok(())
}

fn validate_hunk_shape(op: Operation, hunk: &Hunk) -> Result<(), PatchError> {
    if hunk.lines.is_empty() {
        return Err(PatchError::validation("hunk has no lines"));
    }

    for line in &hunk.lines {
        if let Line::Context(s) | Line::Addition(s) | Line::Deletion(s) = line {
            if s.contains('\r') {
                return Err(PatchError::validation("carriage return in hunk line"));
            }
        }
    }

    check_marker_placement(&hunk.lines)?;

    let context_count = count_kind(hunk, |l| matches!(l, Line::Context(_)));
    let addition_count = count_kind(hunk, |l| matches!(l, Line::Addition(_)));
    let deletion_count = count_kind(hunk, |l| matches!(l, Line::Deletion(_)));

    match op {
        Operation::Add => {
            if context_count > 0 || deletion_count > 0 {
                return Err(PatchError::validation(
                    "Add hunk may only contain Addition lines",
                ));
            }
            if addition_count == 0 {
                return Err(PatchError::validation("Add hunk requires at least one Addition line"));
            }
        }
        Operation::Delete => {
            if context_count > 0 || addition_count > 0 {
                return Err(PatchError::validation(
                    "Delete hunk may only contain Deletion lines",
                ));
            }
            if deletion_count == 0 {
                return Err(PatchError::validation("Delete hunk requires at least one Deletion line"));
            }
        }
        Operation::Modify | Operation::Rename | Operation::Copy => {
            if addition_count == 0 && deletion_count == 0 {
                return Err(PatchError::validation(
                    "hunk requires at least one Addition or Deletion line",
                ));
            }
        }
    }

    if let Some(old_range) = hunk.header.old_range {
        if old_range.len != (context_count + deletion_count) as u32 {
            return Err(PatchError::validation(
                "hunk header old range length does not match content",
            ));
        }
    }
    if let Some(new_range) = hunk.header.new_range {
        if new_range.len != (context_count + addition_count) as u32 {
            return Err(PatchError::validation(
                "hunk header new range length does not match content",
            ));
        }
    }

    Ok(())
}

fn count_kind(hunk: &Hunk, pred: impl Fn(&Line) -> bool) -> usize {
    hunk.lines.iter().filter(|l| pred(l)).count()
}

fn check_marker_placement(lines: &[Line]) -> Result<(), PatchError> {
    let mut seen_old_marker = false;
    let mut seen_new_marker = false;

    for (i, line) in lines.iter().enumerate() {
        if !matches!(line, Line::NoNewlineMarker) {
            if seen_old_marker && matches!(line, Line::Deletion(_)) {
                return Err(PatchError::validation(
                    "no-newline marker must be the final entry for its side",
                ));
            }
            continue;
        }

        let preceding = lines[..i]
            .iter()
            .rev()
            .find(|l| !matches!(l, Line::NoNewlineMarker));
        let is_old_side = matches!(preceding, Some(Line::Deletion(_)));

        if is_old_side {
            if seen_old_marker {
                return Err(PatchError::validation(
                    "duplicate no-newline marker for old side",
                ));
            }
            seen_old_marker = true;
        } else {
            if seen_new_marker {
                return Err(PatchError::validation(
                    "duplicate no-newline marker for new side",
                ));
            }
            if i != lines.len() - 1 {
                return Err(PatchError::validation(
                    "no-newline marker must be the final entry for its side",
                ));
            }
            seen_new_marker = true;
        }
    }
    Ok(())
}

fn validate_metadata(directive: &Directive) -> Result<(), PatchError> {
    let metadata = &directive.metadata;

    if metadata.rename_from.is_some() || metadata.rename_to.is_some() {
        if directive.op != Operation::Rename {
            return Err(PatchError::validation(
                "rename_from/rename_to only valid on a Rename directive",
            ));
        }
    }
    if metadata.copy_from.is_some() || metadata.copy_to.is_some() {
        if directive.op != Operation::Copy {
            return Err(PatchError::validation(
                "copy_from/copy_to only valid on a Copy directive",
            ));
        }
    }
    check_path_match(&metadata.rename_from, &directive.old_path, "rename_from")?;
    check_path_match(&metadata.rename_to, &directive.new_path, "rename_to")?;
    check_path_match(&metadata.copy_from, &directive.old_path, "copy_from")?;
    check_path_match(&metadata.copy_to, &directive.new_path, "copy_to")?;

    if metadata.similarity_index.is_some() || metadata.dissimilarity_index.is_some() {
        if !matches!(directive.op, Operation::Rename | Operation::Copy) {
            return Err(PatchError::validation(
                "similarity_index/dissimilarity_index only valid on Rename or Copy",
            ));
        }
    }

    if metadata.is_binary {
        return Err(PatchError::validation("binary payloads are not supported"));
    }

    if let Some(mode_change) = metadata.mode_change {
        if directive.op == Operation::Add && mode_change.old_mode.is_some() {
            return Err(PatchError::validation("Add directive must not set an old mode"));
        }
        if directive.op == Operation::Delete && mode_change.new_mode.is_some() {
            return Err(PatchError::validation("Delete directive must not set a new mode"));
        }
    }

    Ok(())
}

fn check_path_match(
    value: &Option<String>,
    path: &Option<PathBuf>,
    field: &str,
) -> Result<(), PatchError> {
    let Some(value) = value else { return Ok(()) };
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("a/")
        .or_else(|| trimmed.strip_prefix("b/"))
        .unwrap_or(trimmed);
    let expected = path.as_ref().map(|p| p.to_string_lossy().to_string());
    if expected.as_deref() != Some(stripped) {
        return Err(PatchError::validation(format!(
            "{field} does not match directive path"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Hunk, HunkHeader, LineRange};
    use std::path::PathBuf;

    fn add_directive(new: &str, additions: &[&str]) -> Directive {
        let mut d = Directive::new(Operation::Add);
        d.new_path = Some(PathBuf::from(new));
        let mut hunk = Hunk::new(HunkHeader::default());
        for a in additions {
            hunk.lines.push(Line::Addition(a.to_string()));
        }
        d.hunks.push(hunk);
        d
    }

    #[test]
    fn rejects_duplicate_add_target() {
        let plan = Plan {
            title: None,
            directives: vec![add_directive("a.txt", &["x"]), add_directive("a.txt", &["y"])],
        };
        assert!(matches!(validate(&plan), Err(PatchError::ValidationFailed(_))));
    }

    #[test]
    fn allows_add_then_modify_upgrade() {
        let mut modify = Directive::new(Operation::Modify);
        modify.old_path = Some(PathBuf::from("a.txt"));
        modify.new_path = Some(PathBuf::from("a.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Addition("more".to_string()));
        modify.hunks.push(hunk);

        let plan = Plan {
            title: None,
            directives: vec![add_directive("a.txt", &["x"]), modify],
        };
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn rejects_modify_after_modify() {
        let mut modify = Directive::new(Operation::Modify);
        modify.old_path = Some(PathBuf::from("a.txt"));
        modify.new_path = Some(PathBuf::from("a.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Addition("more".to_string()));
        modify.hunks.push(hunk);

        let plan = Plan {
            title: None,
            directives: vec![modify.clone(), modify],
        };
        assert!(matches!(validate(&plan), Err(PatchError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_add_hunk_with_context() {
        let mut d = Directive::new(Operation::Add);
        d.new_path = Some(PathBuf::from("a.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Context("ctx".to_string()));
        hunk.lines.push(Line::Addition("x".to_string()));
        d.hunks.push(hunk);

        let plan = Plan {
            title: None,
            directives: vec![d],
        };
        assert!(matches!(validate(&plan), Err(PatchError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_header_length_mismatch() {
        let mut d = Directive::new(Operation::Modify);
        d.old_path = Some(PathBuf::from("a.txt"));
        d.new_path = Some(PathBuf::from("a.txt"));
        let mut hunk = Hunk::new(HunkHeader {
            old_range: Some(LineRange { start: 1, len: 5 }),
            new_range: Some(LineRange { start: 1, len: 1 }),
            section: None,
        });
        hunk.lines.push(Line::Deletion("x".to_string()));
        hunk.lines.push(Line::Addition("y".to_string()));
        d.hunks.push(hunk);

        let plan = Plan {
            title: None,
            directives: vec![d],
        };
        assert!(matches!(validate(&plan), Err(PatchError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_carriage_return() {
        let mut d = Directive::new(Operation::Add);
        d.new_path = Some(PathBuf::from("a.txt"));
        let mut hunk = Hunk::new(HunkHeader::default());
        hunk.lines.push(Line::Addition("x\r".to_string()));
        d.hunks.push(hunk);

        let plan = Plan {
            title: None,
            directives: vec![d],
        };
        assert!(matches!(validate(&plan), Err(PatchError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_binary_directive_with_no_hunks() {
        let mut d = Directive::new(Operation::Rename);
        d.old_path = Some(PathBuf::from("x.png"));
        d.new_path = Some(PathBuf::from("y.png"));
        d.metadata.is_binary = true;

        let plan = Plan {
            title: None,
            directives: vec![d],
        };
        assert!(matches!(validate(&plan), Err(PatchError::ValidationFailed(_))));
    }
}
