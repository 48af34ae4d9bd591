//! sentinel-patch: parse, validate, and apply sentinel-wrapped unified diffs.
//!
//! This crate provides tools to:
//! - Tokenize and parse a `*** Begin Patch` / `*** End Patch` envelope into a
//!   structured [`model::Plan`]
//! - Validate the plan's cross-directive invariants before anything touches
//!   disk
//! - Apply the plan's hunks against a pluggable [`store::Store`] capability
//!
//! # Architecture
//!
//! The crate is organized as a four-stage pipeline:
//!
//! - [`token`] - tokenizes raw text inside the envelope
//! - [`parser`] - turns tokens into a [`model::Plan`]
//! - [`validate`] - checks cross-directive invariants with no I/O
//! - [`apply`] - mutates a [`store::Store`] hunk by hunk
//!
//! # Example
//!
//! ```ignore
//! use sentinel_patch::{apply_patch_text, config::ApplyConfig, store::FsStore};
//!
//! let mut store = FsStore;
//! apply_patch_text(patch_text, &mut store, &ApplyConfig::default())?;
//! ```

pub mod apply;
pub mod cli;
pub mod config;
pub mod error;
pub mod mode;
pub mod model;
pub mod parser;
pub mod store;
pub mod token;
pub mod validate;

use config::ApplyConfig;
use error::PatchError;
use store::Store;

/// Parses, validates, and applies a patch document in one call.
pub fn apply_patch_text(text: &str, store: &mut dyn Store, config: &ApplyConfig) -> Result<(), PatchError> {
    let plan = parser::parse(text)?;
    validate::validate(&plan)?;
    apply::apply_plan(&plan, store, config)
}
