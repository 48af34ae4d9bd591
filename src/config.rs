/// How context lines are compared when locating a hunk in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whitespace {
    /// Lines must match byte-for-byte.
    #[default]
    Exact,
    /// Leading/trailing whitespace and internal run-length differences are
    /// ignored; lines are compared with all whitespace stripped.
    IgnoreAll,
}

impl Whitespace {
    pub fn lines_equal(&self, a: &str, b: &str) -> bool {
        match self {
            Whitespace::Exact => a == b,
            Whitespace::IgnoreAll => {
                let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
                strip(a) == strip(b)
            }
        }
    }
}

/// Tunables for the hunk applicator.
#[derive(Debug, Clone, Copy)]
pub struct ApplyConfig {
    pub whitespace: Whitespace,
    /// How many leading and/or trailing context lines may be trimmed from a
    /// hunk's expected block when searching for a match. 0 means context
    /// must match in full.
    pub context_tolerance: u32,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            whitespace: Whitespace::Exact,
            context_tolerance: 0,
        }
    }
}

impl ApplyConfig {
    pub fn with_whitespace(mut self, whitespace: Whitespace) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn with_context_tolerance(mut self, tolerance: u32) -> Self {
        self.context_tolerance = tolerance;
        self
    }
}
