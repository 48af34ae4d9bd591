use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "apply-patch")]
#[command(about = "Parse, validate, and apply sentinel-wrapped unified diffs")]
#[command(version)]
pub struct Cli {
    /// Suppress all but error-level log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse, validate, and apply a patch against a sandboxed directory
    Apply(ApplyArgs),
    /// Parse and validate a patch without touching any store
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Directory the patch's paths are confined to
    #[arg(long)]
    pub root: PathBuf,

    /// Patch file to read; reads from stdin when omitted
    #[arg(long)]
    pub patch: Option<PathBuf>,

    /// Line-equality mode used while locating hunks
    #[arg(long, value_enum, default_value = "exact")]
    pub whitespace: WhitespaceArg,

    /// Maximum total leading+trailing context lines a hunk may drop
    #[arg(long, default_value_t = 0)]
    pub context_tolerance: u32,

    /// Parse, validate, and report what would happen without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Patch file to read; reads from stdin when omitted
    #[arg(long)]
    pub patch: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum WhitespaceArg {
    /// Lines must match byte-for-byte
    Exact,
    /// Leading/trailing whitespace is ignored when comparing lines
    IgnoreAll,
}

impl From<WhitespaceArg> for crate::config::Whitespace {
    fn from(value: WhitespaceArg) -> Self {
        match value {
            WhitespaceArg::Exact => crate::config::Whitespace::Exact,
            WhitespaceArg::IgnoreAll => crate::config::Whitespace::IgnoreAll,
        }
    }
}
