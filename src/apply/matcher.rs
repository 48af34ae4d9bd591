//! Trim-variant enumeration and the hunk-location algorithm.

use crate::config::{ApplyConfig, Whitespace};
use crate::error::PatchError;
use crate::model::{Hunk, Line};

use super::buffer::Buffer;

/// The two line sequences derived from a hunk body, plus the trailing-
/// newline hints carried by any `NoNewlineMarker`.
pub struct HunkTransform {
    expected: Vec<String>,
    replacement: Vec<String>,
    leading_context: usize,
    trailing_context: usize,
    expected_trailing_newline: Option<bool>,
    replacement_trailing_newline: Option<bool>,
}

/// One `(leading, trailing)` trim amount to try when locating a hunk.
#[derive(Debug, Clone, Copy)]
pub struct TrimVariant {
    pub leading: usize,
    pub trailing: usize,
}

impl HunkTransform {
    pub fn from_hunk(hunk: &Hunk) -> Self {
        let mut expected = Vec::new();
        let mut replacement = Vec::new();
        let mut expected_trailing_newline = None;
        let mut replacement_trailing_newline = None;
        let mut last_was_deletion = false;

        for line in &hunk.lines {
            match line {
                Line::Context(s) => {
                    expected.push(s.clone());
                    replacement.push(s.clone());
                    last_was_deletion = false;
                }
                Line::Deletion(s) => {
                    expected.push(s.clone());
                    last_was_deletion = true;
                }
                Line::Addition(s) => {
                    replacement.push(s.clone());
                    last_was_deletion = false;
                }
                Line::NoNewlineMarker => {
                    if last_was_deletion {
                        expected_trailing_newline = Some(false);
                    } else {
                        replacement_trailing_newline = Some(false);
                    }
                }
            }
        }

        let (leading_context, trailing_context) = boundary_context_counts(&hunk.lines);

        Self {
            expected,
            replacement,
            leading_context,
            trailing_context,
            expected_trailing_newline,
            replacement_trailing_newline,
        }
    }

    /// Trim variants in the required order: ascending total trim, ties
    /// broken by smaller leading trim.
    pub fn variants(&self, tolerance: u32) -> Vec<TrimVariant> {
        let tolerance = tolerance as usize;
        let mut variants = Vec::new();
        for total in 0..=tolerance {
            for leading in 0..=total {
                let trailing = total - leading;
                if leading > self.leading_context || trailing > self.trailing_context {
                    continue;
                }
                variants.push(TrimVariant { leading, trailing });
            }
        }
        variants
    }

    pub fn expected_for(&self, variant: &TrimVariant) -> &[String] {
        &self.expected[variant.leading..self.expected.len() - variant.trailing]
    }

    pub fn replacement_for(&self, variant: &TrimVariant) -> &[String] {
        &self.replacement[variant.leading..self.replacement.len() - variant.trailing]
    }
}

fn boundary_context_counts(lines: &[Line]) -> (usize, usize) {
    let content: Vec<&Line> = lines
        .iter()
        .filter(|l| !matches!(l, Line::NoNewlineMarker))
        .collect();

    let mut leading = 0;
    for line in &content {
        if matches!(line, Line::Context(_)) {
            leading += 1;
        } else {
            break;
        }
    }
    let mut trailing = 0;
    for line in content.iter().rev() {
        if matches!(line, Line::Context(_)) {
            trailing += 1;
        } else {
            break;
        }
    }
    if leading + trailing > content.len() {
        let total = content.len();
        (leading.min(total), total - leading.min(total))
    } else {
        (leading, trailing)
    }
}

fn lines_match(buffer: &[String], expected: &[String], start: usize, whitespace: Whitespace) -> bool {
    expected
        .iter()
        .enumerate()
        .all(|(i, e)| whitespace.lines_equal(&buffer[start + i], e))
}

/// Finds where `expected` belongs in `buffer`, applying the header
/// pre-emption rule before falling back to an exhaustive, ambiguity-
/// rejecting scan. Returns `Ok(None)` when this variant doesn't match
/// anywhere, so the caller can try the next trim variant.
fn locate(
    buffer: &[String],
    expected: &[String],
    old_range_start: Option<u32>,
    new_range_start: Option<u32>,
    whitespace: Whitespace,
) -> Result<Option<usize>, PatchError> {
    let len = buffer.len();

    if expected.is_empty() {
        let idx = match new_range_start {
            Some(start) => (start as usize).saturating_sub(1).min(len),
            None => len,
        };
        return Ok(Some(idx));
    }

    if expected.len() > len {
        return Ok(None);
    }
    let max_start = len - expected.len();

    if let Some(start) = old_range_start {
        let candidate = (start as usize).saturating_sub(1).min(max_start);
        if lines_match(buffer, expected, candidate, whitespace) {
            return Ok(Some(candidate));
        }
    }

    let mut found = None;
    let mut ambiguous = false;
    for idx in 0..=max_start {
        if lines_match(buffer, expected, idx, whitespace) {
            if found.is_some() {
                ambiguous = true;
                break;
            }
            found = Some(idx);
        }
    }
    if ambiguous {
        return Err(PatchError::validation("ambiguous hunk match"));
    }
    Ok(found)
}

/// Applies one hunk to `buffer` in place, trying trim variants in order
/// until one locates unambiguously, or failing with a context mismatch.
pub fn apply_hunk(buffer: &mut Buffer, hunk: &Hunk, config: &ApplyConfig) -> Result<(), PatchError> {
    let transform = HunkTransform::from_hunk(hunk);
    let old_range_start = hunk.header.old_range.map(|r| r.start);
    let new_range_start = hunk.header.new_range.map(|r| r.start);

    for variant in transform.variants(config.context_tolerance) {
        let expected = transform.expected_for(&variant);
        let replacement = transform.replacement_for(&variant);
        if let Some(idx) = locate(
            &buffer.lines,
            expected,
            old_range_start,
            new_range_start,
            config.whitespace,
        )? {
            mutate(
                buffer,
                idx,
                expected.len(),
                replacement,
                transform.expected_trailing_newline,
                transform.replacement_trailing_newline,
            );
            return Ok(());
        }
    }

    Err(PatchError::validation("context mismatch"))
}

fn mutate(
    buffer: &mut Buffer,
    idx: usize,
    expected_len: usize,
    replacement: &[String],
    expected_trailing_newline: Option<bool>,
    replacement_trailing_newline: Option<bool>,
) {
    let original_touched_end = idx + expected_len == buffer.lines.len();
    buffer
        .lines
        .splice(idx..idx + expected_len, replacement.iter().cloned());
    let new_touches_end = idx + replacement.len() == buffer.lines.len();

    if new_touches_end {
        if let Some(value) = replacement_trailing_newline {
            buffer.has_trailing_newline = value;
            return;
        }
    }
    if original_touched_end && expected_trailing_newline.is_some() {
        buffer.has_trailing_newline = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HunkHeader, LineRange};

    fn hunk(old_range: Option<LineRange>, new_range: Option<LineRange>, lines: Vec<Line>) -> Hunk {
        Hunk {
            header: HunkHeader {
                old_range,
                new_range,
                section: None,
            },
            lines,
        }
    }

    #[test]
    fn exact_context_match_replaces_in_place() {
        let mut buffer = Buffer::from_text("Hello\nWorld\n");
        let h = hunk(
            Some(LineRange { start: 1, len: 2 }),
            Some(LineRange { start: 1, len: 2 }),
            vec![
                Line::Deletion("Hello".into()),
                Line::Addition("Hello there".into()),
                Line::Context("World".into()),
            ],
        );
        apply_hunk(&mut buffer, &h, &ApplyConfig::default()).unwrap();
        assert_eq!(buffer.encode(), "Hello there\nWorld\n");
    }

    #[test]
    fn header_disambiguates_among_duplicate_matches() {
        let mut buffer = Buffer::from_text("foo\nbar\nbaz\nbar\nqux");
        let h = hunk(
            Some(LineRange { start: 4, len: 1 }),
            Some(LineRange { start: 4, len: 1 }),
            vec![Line::Deletion("bar".into()), Line::Addition("BAR".into())],
        );
        apply_hunk(&mut buffer, &h, &ApplyConfig::default()).unwrap();
        assert_eq!(buffer.encode(), "foo\nbar\nbaz\nBAR\nqux");
    }

    #[test]
    fn ambiguous_without_disambiguator_fails() {
        let mut buffer = Buffer::from_text("beta\nbeta\nbeta\nbeta\nbeta\nbeta");
        let h = hunk(
            None,
            None,
            vec![Line::Deletion("beta".into()), Line::Addition("gamma".into())],
        );
        let err = apply_hunk(&mut buffer, &h, &ApplyConfig::default()).unwrap_err();
        match err {
            PatchError::ValidationFailed(msg) => assert!(msg.contains("ambiguous hunk match")),
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn context_tolerance_allows_drifted_boundary() {
        let mut buffer = Buffer::from_text("one\ntwo\nthree\nfour\n");
        let h = hunk(
            None,
            None,
            vec![
                Line::Context("two-drifted".into()),
                Line::Deletion("three".into()),
                Line::Addition("THREE".into()),
            ],
        );
        let config = ApplyConfig::default().with_context_tolerance(1);
        apply_hunk(&mut buffer, &h, &config).unwrap();
        assert_eq!(buffer.encode(), "one\ntwo\nTHREE\nfour\n");
    }

    #[test]
    fn context_mismatch_without_tolerance_fails() {
        let mut buffer = Buffer::from_text("one\ntwo\nthree\nfour\n");
        let h = hunk(
            None,
            None,
            vec![
                Line::Context("two-drifted".into()),
                Line::Deletion("three".into()),
                Line::Addition("THREE".into()),
            ],
        );
        let err = apply_hunk(&mut buffer, &h, &ApplyConfig::default()).unwrap_err();
        match err {
            PatchError::ValidationFailed(msg) => assert!(msg.contains("context mismatch")),
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn insertion_with_no_expected_uses_new_range_start() {
        let mut buffer = Buffer::from_text("a\nb\nc\n");
        let h = hunk(
            None,
            Some(LineRange { start: 2, len: 1 }),
            vec![Line::Addition("inserted".into())],
        );
        apply_hunk(&mut buffer, &h, &ApplyConfig::default()).unwrap();
        assert_eq!(buffer.encode(), "a\ninserted\nb\nc\n");
    }

    #[test]
    fn ignore_all_whitespace_mode_tolerates_reindentation() {
        let mut buffer = Buffer::from_text("  Hello\nWorld\n");
        let h = hunk(
            None,
            None,
            vec![Line::Deletion("Hello".into()), Line::Addition("Hi".into())],
        );
        let config = ApplyConfig::default().with_whitespace(Whitespace::IgnoreAll);
        apply_hunk(&mut buffer, &h, &config).unwrap();
        assert_eq!(buffer.encode(), "Hi\nWorld\n");
    }
}
