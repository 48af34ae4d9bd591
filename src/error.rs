use std::fmt;

/// The three ways a patch can fail to apply.
///
/// `Malformed` covers syntactic problems found by the tokenizer or parser.
/// `ValidationFailed` covers semantic problems discoverable without touching
/// a store. `IOFailure` covers everything the store capability, UTF-8
/// decoding, or sandboxing can raise.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("malformed patch: {0}")]
    Malformed(String),
    #[error("patch validation failed: {0}")]
    ValidationFailed(String),
    #[error("I/O failure: {0}")]
    IOFailure(String),
}

impl PatchError {
    pub fn malformed(msg: impl fmt::Display) -> Self {
        PatchError::Malformed(msg.to_string())
    }

    pub fn validation(msg: impl fmt::Display) -> Self {
        PatchError::ValidationFailed(msg.to_string())
    }

    pub fn io(msg: impl fmt::Display) -> Self {
        PatchError::IOFailure(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
