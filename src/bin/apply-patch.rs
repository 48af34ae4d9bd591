use std::io::Read;
use std::path::Path;

use clap::Parser;
use log::LevelFilter;

use sentinel_patch::cli::{ApplyArgs, CheckArgs, Cli, Command};
use sentinel_patch::config::ApplyConfig;
use sentinel_patch::model::{Operation, Plan};
use sentinel_patch::store::{FsStore, SandboxStore};
use sentinel_patch::{parser, validate};

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Apply(args) => run_apply(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn read_patch_text(patch: &Option<std::path::PathBuf>) -> Result<String, String> {
    match patch {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {e}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("reading stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let text = read_patch_text(&args.patch)?;
    let plan = parser::parse(&text).map_err(|e| e.to_string())?;
    validate::validate(&plan).map_err(|e| e.to_string())?;
    log::info!("patch is well-formed: {} directive(s)", plan.directives.len());
    Ok(())
}

fn run_apply(args: ApplyArgs) -> Result<(), String> {
    let text = read_patch_text(&args.patch)?;
    let plan = parser::parse(&text).map_err(|e| e.to_string())?;
    validate::validate(&plan).map_err(|e| e.to_string())?;

    for line in summary_lines(&plan) {
        println!("{line}");
    }

    if args.dry_run {
        return Ok(());
    }

    let config = ApplyConfig::default()
        .with_whitespace(args.whitespace.into())
        .with_context_tolerance(args.context_tolerance);
    let mut store: SandboxStore<FsStore> = SandboxStore::new(FsStore, &args.root);
    sentinel_patch::apply::apply_plan(&plan, &mut store, &config).map_err(|e| e.to_string())
}

fn summary_lines(plan: &Plan) -> Vec<String> {
    plan.directives
        .iter()
        .map(|d| {
            let verb = match d.op {
                Operation::Add => "Added file",
                Operation::Delete => "Deleted file",
                Operation::Modify => "Updated file",
                Operation::Rename => "Renamed file",
                Operation::Copy => "Copied file",
            };
            let path = d
                .new_path
                .as_ref()
                .or(d.old_path.as_ref())
                .map(|p| display_path(p))
                .unwrap_or_default();
            match d.op {
                Operation::Rename | Operation::Copy => format!(
                    "{verb}: {} -> {}",
                    d.old_path.as_ref().map(|p| display_path(p)).unwrap_or_default(),
                    path
                ),
                _ => format!("{verb}: {path}"),
            }
        })
        .collect()
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
