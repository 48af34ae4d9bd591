//! Line-level tokenization and the `Begin Patch` / `End Patch` envelope.

use crate::error::PatchError;

const BEGIN_MARKER: &str = "*** Begin Patch";
const END_MARKER: &str = "*** End Patch";

const METADATA_PREFIXES: &[&str] = &[
    "index ",
    "old mode ",
    "new mode ",
    "deleted file mode ",
    "new file mode ",
    "mode change ",
    "similarity index ",
    "dissimilarity index ",
    "rename from ",
    "rename to ",
    "copy from ",
    "copy to ",
    "new file executable mode ",
    "deleted file executable mode ",
    "Binary files ",
    "binary files ",
    "GIT binary patch",
];

/// One classified line of input. Everything outside the `Begin Patch`/`End
/// Patch` envelope is dropped before tokens are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// A `*** ...` header line (other than the begin/end markers).
    Header(&'a str),
    /// A `--- <path>` line; `None` if the payload was `/dev/null`.
    FileOld(&'a str),
    /// A `+++ <path>` line; `None` if the payload was `/dev/null`.
    FileNew(&'a str),
    /// A recognized metadata line, kept verbatim.
    Metadata(&'a str),
    HunkHeader(&'a str),
    Context(&'a str),
    Addition(&'a str),
    Deletion(&'a str),
    NoNewlineMarker,
    /// A line inside the envelope that matches no recognized shape.
    Other(&'a str),
}

/// Walks patch text line by line, enforcing the envelope and classifying
/// every line inside it.
pub struct Tokenizer<'a> {
    lines: std::str::Split<'a, char>,
    inside: bool,
    seen_begin: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            // Split on '\n' rather than `str::lines()`, which strips a
            // trailing '\r' from CRLF-terminated lines and would hide a
            // forbidden carriage return from the validator's CR check.
            lines: text.split('\n'),
            inside: false,
            seen_begin: false,
        }
    }

    /// Tokenizes the whole input eagerly, returning the envelope-enclosed
    /// tokens in order.
    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>, PatchError> {
        let mut tokens = Vec::new();
        while let Some(line) = self.lines.next() {
            if let Some(token) = self.classify(line)? {
                tokens.push(token);
            }
        }
        if self.inside {
            return Err(PatchError::malformed("missing end marker"));
        }
        if !self.seen_begin {
            return Err(PatchError::malformed("missing end marker"));
        }
        Ok(tokens)
    }

    fn classify(&mut self, line: &'a str) -> Result<Option<Token<'a>>, PatchError> {
        if line == BEGIN_MARKER {
            if self.inside {
                return Err(PatchError::malformed("nested *** Begin Patch"));
            }
            self.inside = true;
            self.seen_begin = true;
            return Ok(None);
        }
        if line == END_MARKER {
            if !self.inside {
                return Err(PatchError::malformed("*** End Patch without Begin Patch"));
            }
            self.inside = false;
            return Ok(None);
        }
        if !self.inside {
            return Ok(None);
        }

        if line.starts_with("*** ") {
            return Ok(Some(Token::Header(line)));
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            return Ok(Some(Token::FileOld(rest)));
        }
        if let Some(rest) = line.strip_prefix("+++ ") {
            return Ok(Some(Token::FileNew(rest)));
        }
        if METADATA_PREFIXES.iter().any(|p| line.starts_with(p)) {
            return Ok(Some(Token::Metadata(line)));
        }
        if line.starts_with("@@") {
            return Ok(Some(Token::HunkHeader(line)));
        }
        if line == "\\ No newline at end of file" {
            return Ok(Some(Token::NoNewlineMarker));
        }
        if let Some(rest) = line.strip_prefix('+') {
            return Ok(Some(Token::Addition(rest)));
        }
        if let Some(rest) = line.strip_prefix('-') {
            return Ok(Some(Token::Deletion(rest)));
        }
        if let Some(rest) = line.strip_prefix(' ') {
            return Ok(Some(Token::Context(rest)));
        }

        // A genuinely blank line has no diff-role prefix; callers reject it
        // as a malformed hunk body line rather than treating it as context.
        Ok(Some(Token::Other(line)))
    }
}
