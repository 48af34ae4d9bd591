//! The in-memory representation of a file while hunks are applied to it.

use crate::error::PatchError;

/// A file's content as a line sequence plus whether it ends in `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub lines: Vec<String>,
    pub has_trailing_newline: bool,
}

impl Buffer {
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            has_trailing_newline: false,
        }
    }

    pub fn load(bytes: &[u8]) -> Result<Self, PatchError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| PatchError::io("file contents are not valid UTF-8"))?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }
        let has_trailing_newline = text.ends_with('\n');
        let content = if has_trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };
        let lines = if content.is_empty() && has_trailing_newline {
            vec![String::new()]
        } else {
            content.split('\n').map(|s| s.to_string()).collect()
        };
        Self {
            lines,
            has_trailing_newline,
        }
    }

    pub fn encode(&self) -> String {
        let mut s = self.lines.join("\n");
        if self.has_trailing_newline {
            s.push('\n');
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_trailing_newline() {
        let buf = Buffer::from_text("a\nb\n");
        assert_eq!(buf.lines, vec!["a", "b"]);
        assert!(buf.has_trailing_newline);
        assert_eq!(buf.encode(), "a\nb\n");
    }

    #[test]
    fn round_trips_missing_trailing_newline() {
        let buf = Buffer::from_text("a\nb");
        assert_eq!(buf.lines, vec!["a", "b"]);
        assert!(!buf.has_trailing_newline);
        assert_eq!(buf.encode(), "a\nb");
    }

    #[test]
    fn empty_text_is_empty_buffer() {
        let buf = Buffer::from_text("");
        assert!(buf.lines.is_empty());
        assert!(!buf.has_trailing_newline);
        assert_eq!(buf.encode(), "");
    }

    #[test]
    fn bare_newline_is_one_blank_line() {
        let buf = Buffer::from_text("\n");
        assert_eq!(buf.lines, vec![""]);
        assert!(buf.has_trailing_newline);
        assert_eq!(buf.encode(), "\n");
    }

    #[test]
    fn rejects_non_utf8() {
        let err = Buffer::load(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, PatchError::IOFailure(_)));
    }
}
