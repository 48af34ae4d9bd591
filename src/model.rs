use std::path::PathBuf;

/// An ordered sequence of directives, optionally named.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub title: Option<String>,
    pub directives: Vec<Directive>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What a directive does to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Delete,
    Modify,
    Rename,
    Copy,
}

/// A single file-level change: the operation, the path(s) it touches, and
/// the hunks that carry its content edits.
#[derive(Debug, Clone)]
pub struct Directive {
    pub op: Operation,
    pub old_path: Option<PathBuf>,
    pub new_path: Option<PathBuf>,
    pub hunks: Vec<Hunk>,
    pub metadata: Metadata,
    /// The raw header line this directive was parsed from, kept for error
    /// messages and round-tripping.
    pub raw_header: Option<String>,
}

impl Directive {
    pub fn new(op: Operation) -> Self {
        Self {
            op,
            old_path: None,
            new_path: None,
            hunks: Vec::new(),
            metadata: Metadata::default(),
            raw_header: None,
        }
    }

    /// The path this directive is keyed by for uniqueness bookkeeping on
    /// the "consumes an old path" side.
    pub fn old_key(&self) -> Option<&PathBuf> {
        self.old_path.as_ref()
    }

    /// The path this directive is keyed by for uniqueness bookkeeping on
    /// the "produces a new path" side.
    pub fn new_key(&self) -> Option<&PathBuf> {
        self.new_path.as_ref()
    }
}

/// A 1-based, length-counted span in either the old or new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub len: u32,
}

/// The `@@ -a,b +c,d @@ section` line introducing a hunk. Either range may
/// be absent (a pure insertion has no old range; a pure deletion has no
/// meaningful new range in some dialects) and the section heading is free
/// text carried only for display.
#[derive(Debug, Clone, Default)]
pub struct HunkHeader {
    pub old_range: Option<LineRange>,
    pub new_range: Option<LineRange>,
    pub section: Option<String>,
}

/// A contiguous block of context/addition/deletion lines plus the header
/// that located them in the original file.
#[derive(Debug, Clone)]
pub struct Hunk {
    pub header: HunkHeader,
    pub lines: Vec<Line>,
}

impl Hunk {
    pub fn new(header: HunkHeader) -> Self {
        Self {
            header,
            lines: Vec::new(),
        }
    }
}

/// A single line inside a hunk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Context(String),
    Addition(String),
    Deletion(String),
    /// Marks that the line immediately preceding it in the hunk body has no
    /// trailing newline in the file it belongs to.
    NoNewlineMarker,
}

/// The `index` line's two blob hashes and the shared mode, when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLine {
    pub old_hash: String,
    pub new_hash: String,
    pub mode: Option<String>,
}

/// An old/new mode pair from a `old mode` / `new mode` metadata pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileModeChange {
    pub old_mode: Option<u32>,
    pub new_mode: Option<u32>,
}

/// Everything parsed from a directive's metadata lines that isn't a path or
/// a hunk: index hashes, mode changes, rename/copy similarity bookkeeping,
/// and binary-file markers.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub index: Option<IndexLine>,
    pub mode_change: Option<FileModeChange>,
    pub similarity_index: Option<u8>,
    pub dissimilarity_index: Option<u8>,
    pub rename_from: Option<String>,
    pub rename_to: Option<String>,
    pub copy_from: Option<String>,
    pub copy_to: Option<String>,
    pub is_binary: bool,
    /// The original metadata lines, kept verbatim for diagnostics.
    pub raw_lines: Vec<String>,
}
