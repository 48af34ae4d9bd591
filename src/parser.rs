//! Turns a token stream into a `Plan`.

use std::path::PathBuf;

use crate::error::PatchError;
use crate::model::{Directive, FileModeChange, Hunk, HunkHeader, IndexLine, Line, LineRange, Metadata, Operation, Plan};
use crate::mode::parse_mode;
use crate::token::{Token, Tokenizer};

/// Parses complete patch text (including the `Begin Patch`/`End Patch`
/// envelope) into a `Plan`.
pub fn parse(text: &str) -> Result<Plan, PatchError> {
    let tokens = Tokenizer::new(text).tokenize()?;
    Parser::new().run(tokens)
}

struct Parser<'a> {
    plan: Plan,
    pending_header: Option<&'a str>,
    pending_metadata: Vec<&'a str>,
    current: Option<Directive>,
    current_hunk: Option<Hunk>,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        Self {
            plan: Plan::new(),
            pending_header: None,
            pending_metadata: Vec::new(),
            current: None,
            current_hunk: None,
        }
    }

    fn run(mut self, tokens: Vec<Token<'a>>) -> Result<Plan, PatchError> {
        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            match token {
                Token::Header(h) => {
                    self.finalize_directive();
                    if self.plan.title.is_none() {
                        self.plan.title = Some(header_text(h).to_string());
                    }
                    self.pending_header = Some(h);
                    self.pending_metadata.clear();
                }
                Token::Metadata(m) => self.push_metadata(m),
                Token::FileOld(old_raw) => {
                    self.finalize_directive();
                    let new_raw = match iter.next() {
                        Some(Token::FileNew(r)) => r,
                        _ => {
                            return Err(PatchError::malformed(
                                "--- line not followed by a +++ line",
                            ))
                        }
                    };
                    self.start_explicit_directive(old_raw, new_raw)?;
                }
                Token::FileNew(_) => {
                    return Err(PatchError::malformed("+++ line without preceding --- line"));
                }
                Token::HunkHeader(h) => {
                    self.finalize_hunk();
                    if self.current.is_none() {
                        self.start_implicit_directive()?;
                    }
                    let header = parse_hunk_header(h)?;
                    self.current_hunk = Some(Hunk::new(header));
                }
                Token::Context(c) => self.push_line(Line::Context(c.to_string()))?,
                Token::Addition(c) => self.push_line(Line::Addition(c.to_string()))?,
                Token::Deletion(c) => self.push_line(Line::Deletion(c.to_string()))?,
                Token::NoNewlineMarker => self.push_line(Line::NoNewlineMarker)?,
                Token::Other(o) => {
                    return Err(PatchError::malformed(format!(
                        "unrecognized line in patch body: {o:?}"
                    )))
                }
            }
        }
        self.finalize_directive();
        Ok(self.plan)
    }

    fn push_metadata(&mut self, line: &'a str) {
        if let Some(ref mut directive) = self.current {
            apply_metadata_line(&mut directive.metadata, line);
            directive.metadata.raw_lines.push(line.to_string());
        } else {
            self.pending_metadata.push(line);
        }
    }

    fn drain_pending_metadata(&mut self, metadata: &mut Metadata) {
        for line in self.pending_metadata.drain(..) {
            apply_metadata_line(metadata, line);
            metadata.raw_lines.push(line.to_string());
        }
    }

    fn start_explicit_directive(&mut self, old_raw: &str, new_raw: &str) -> Result<(), PatchError> {
        let old_path = interpret_path(old_raw);
        let new_path = interpret_path(new_raw);
        let op = infer_operation(self.pending_header, &old_path, &new_path);

        let mut directive = Directive::new(op);
        directive.old_path = old_path;
        directive.new_path = new_path;
        directive.raw_header = self.pending_header.map(|s| s.to_string());
        self.drain_pending_metadata(&mut directive.metadata);
        self.current = Some(directive);
        Ok(())
    }

    fn start_implicit_directive(&mut self) -> Result<(), PatchError> {
        let header = self
            .pending_header
            .ok_or_else(|| PatchError::malformed("hunk header with no preceding file header"))?;
        let (op, old_path, new_path) = infer_implicit(header)?;

        let mut directive = Directive::new(op);
        directive.old_path = old_path;
        directive.new_path = new_path;
        directive.raw_header = Some(header.to_string());
        self.drain_pending_metadata(&mut directive.metadata);
        self.current = Some(directive);
        Ok(())
    }

    fn push_line(&mut self, line: Line) -> Result<(), PatchError> {
        match self.current_hunk {
            Some(ref mut hunk) => {
                hunk.lines.push(line);
                Ok(())
            }
            None => Err(PatchError::malformed("hunk body line outside of a hunk")),
        }
    }

    fn finalize_hunk(&mut self) {
        if let Some(hunk) = self.current_hunk.take() {
            if let Some(ref mut directive) = self.current {
                directive.hunks.push(hunk);
            }
        }
    }

    fn finalize_directive(&mut self) {
        self.finalize_hunk();
        if let Some(directive) = self.current.take() {
            self.plan.directives.push(directive);
        }
    }
}

fn header_text(header: &str) -> &str {
    header.strip_prefix("*** ").unwrap_or(header).trim()
}

fn interpret_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed == "/dev/null" {
        return None;
    }
    let stripped = trimmed
        .strip_prefix("a/")
        .or_else(|| trimmed.strip_prefix("b/"))
        .unwrap_or(trimmed);
    Some(PathBuf::from(stripped))
}

fn infer_operation(
    pending_header: Option<&str>,
    old: &Option<PathBuf>,
    new: &Option<PathBuf>,
) -> Operation {
    if let Some(h) = pending_header {
        if header_text(h).to_lowercase().contains("copy") {
            return Operation::Copy;
        }
    }
    match (old, new) {
        (None, Some(_)) => Operation::Add,
        (Some(_), None) => Operation::Delete,
        (Some(o), Some(n)) if o == n => Operation::Modify,
        (Some(_), Some(_)) => Operation::Rename,
        (None, None) => Operation::Modify,
    }
}

fn strip_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(s[prefix.len()..].trim())
    } else {
        None
    }
}

fn infer_implicit(
    header: &str,
) -> Result<(Operation, Option<PathBuf>, Option<PathBuf>), PatchError> {
    let body = header_text(header);

    if let Some(rest) = strip_ci(body, "add file:") {
        return Ok((Operation::Add, None, interpret_path(rest)));
    }
    if let Some(rest) = strip_ci(body, "update file:") {
        let path = interpret_path(rest);
        return Ok((Operation::Modify, path.clone(), path));
    }
    if let Some(rest) = strip_ci(body, "delete file:") {
        return Ok((Operation::Delete, interpret_path(rest), None));
    }
    if let Some(rest) = strip_ci(body, "rename file:") {
        let (old_s, new_s) = rest
            .split_once("->")
            .ok_or_else(|| PatchError::malformed(format!("malformed rename header: {header}")))?;
        return Ok((
            Operation::Rename,
            interpret_path(old_s.trim()),
            interpret_path(new_s.trim()),
        ));
    }
    if let Some(rest) = strip_ci(body, "copy file:") {
        let (old_s, new_s) = rest
            .split_once("->")
            .ok_or_else(|| PatchError::malformed(format!("malformed copy header: {header}")))?;
        return Ok((
            Operation::Copy,
            interpret_path(old_s.trim()),
            interpret_path(new_s.trim()),
        ));
    }

    Err(PatchError::malformed(format!(
        "unrecognized implicit directive header: {header}"
    )))
}

fn parse_hunk_header(line: &str) -> Result<HunkHeader, PatchError> {
    let trimmed = line.trim_end();
    if trimmed == "@@" {
        return Ok(HunkHeader::default());
    }

    let content = trimmed
        .strip_prefix("@@ ")
        .ok_or_else(|| PatchError::malformed(format!("invalid hunk header: {line}")))?;
    let (ranges, section) = content
        .split_once(" @@")
        .ok_or_else(|| PatchError::malformed(format!("invalid hunk header: {line}")))?;

    let mut parts = ranges.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PatchError::malformed(format!("invalid hunk header: {line}")))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PatchError::malformed(format!("invalid hunk header: {line}")))?;
    if parts.next().is_some() {
        return Err(PatchError::malformed(format!("invalid hunk header: {line}")));
    }

    let old_range = Some(parse_line_range(old_part, '-', line)?);
    let new_range = Some(parse_line_range(new_part, '+', line)?);
    let section = {
        let trimmed_section = section.trim();
        if trimmed_section.is_empty() {
            None
        } else {
            Some(trimmed_section.to_string())
        }
    };

    Ok(HunkHeader {
        old_range,
        new_range,
        section,
    })
}

fn parse_line_range(part: &str, sign: char, original: &str) -> Result<LineRange, PatchError> {
    let stripped = part
        .strip_prefix(sign)
        .ok_or_else(|| PatchError::malformed(format!("invalid hunk header: {original}")))?;
    let (start_s, len_s) = match stripped.split_once(',') {
        Some((s, l)) => (s, Some(l)),
        None => (stripped, None),
    };
    let start: u32 = start_s
        .parse()
        .map_err(|_| PatchError::malformed(format!("invalid hunk header: {original}")))?;
    let len: u32 = match len_s {
        Some(l) => l
            .parse()
            .map_err(|_| PatchError::malformed(format!("invalid hunk header: {original}")))?,
        None => 1,
    };
    Ok(LineRange { start, len })
}

fn apply_metadata_line(metadata: &mut Metadata, line: &str) {
    if let Some(rest) = line.strip_prefix("index ") {
        metadata.index = parse_index_line(rest);
    } else if let Some(rest) = line.strip_prefix("similarity index ") {
        metadata.similarity_index = parse_percent(rest);
    } else if let Some(rest) = line.strip_prefix("dissimilarity index ") {
        metadata.dissimilarity_index = parse_percent(rest);
    } else if let Some(rest) = line.strip_prefix("old mode ") {
        metadata.mode_change.get_or_insert_with(FileModeChange::default).old_mode = parse_mode(rest);
    } else if let Some(rest) = line.strip_prefix("new mode ") {
        metadata.mode_change.get_or_insert_with(FileModeChange::default).new_mode = parse_mode(rest);
    } else if let Some(rest) = line.strip_prefix("deleted file mode ") {
        metadata.mode_change.get_or_insert_with(FileModeChange::default).old_mode = parse_mode(rest);
    } else if let Some(rest) = line.strip_prefix("new file mode ") {
        metadata.mode_change.get_or_insert_with(FileModeChange::default).new_mode = parse_mode(rest);
    } else if let Some(rest) = line.strip_prefix("new file executable mode ") {
        metadata.mode_change.get_or_insert_with(FileModeChange::default).new_mode = parse_mode(rest);
    } else if let Some(rest) = line.strip_prefix("deleted file executable mode ") {
        metadata.mode_change.get_or_insert_with(FileModeChange::default).old_mode = parse_mode(rest);
    } else if let Some(rest) = line.strip_prefix("mode change ") {
        let cleaned = rest.replace("=>", " ").replace('>', " ");
        let mut parts = cleaned.split_whitespace();
        let change = metadata.mode_change.get_or_insert_with(FileModeChange::default);
        change.old_mode = parts.next().and_then(parse_mode);
        change.new_mode = parts.next().and_then(parse_mode);
    } else if let Some(rest) = line.strip_prefix("rename from ") {
        metadata.rename_from = Some(rest.trim().to_string());
    } else if let Some(rest) = line.strip_prefix("rename to ") {
        metadata.rename_to = Some(rest.trim().to_string());
    } else if let Some(rest) = line.strip_prefix("copy from ") {
        metadata.copy_from = Some(rest.trim().to_string());
    } else if let Some(rest) = line.strip_prefix("copy to ") {
        metadata.copy_to = Some(rest.trim().to_string());
    } else if line.starts_with("Binary files ") || line.starts_with("binary files ") {
        metadata.is_binary = true;
    } else if line.starts_with("GIT binary patch") {
        metadata.is_binary = true;
    }
}

fn parse_index_line(rest: &str) -> Option<IndexLine> {
    let (old_hash, remainder) = rest.trim().split_once("..")?;
    let mut parts = remainder.split_whitespace();
    let new_hash = parts.next()?;
    let mode = parts.next().map(|s| s.to_string());
    Some(IndexLine {
        old_hash: old_hash.to_string(),
        new_hash: new_hash.to_string(),
        mode,
    })
}

fn parse_percent(s: &str) -> Option<u8> {
    s.trim().trim_end_matches('%').parse().ok()
}
