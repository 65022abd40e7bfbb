use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod capabilities;
mod cli;
mod component;
mod descriptor;
mod extensions;
mod lock;
mod manifest;
mod paths;
mod provenance;
mod secrets;
mod util;

use cli::{Command, LockArgs, ManifestArgs, RootArgs};
use manifest::ManifestOptions;
use provenance::SystemProvenance;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Stderr logging; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Manifest(args) => cmd_manifest(&args),
        Command::Lock(args) => cmd_lock(&args),
    }
}

fn cmd_manifest(args: &ManifestArgs) -> Result<()> {
    let options = ManifestOptions::from_args(args);
    let summary = manifest::run(&options)?;
    println!(
        "Wrote {} with {} secret requirements.",
        summary.manifest_path.display(),
        summary.secret_requirements
    );
    if summary.capabilities_cached > 0 {
        println!(
            "Bundled {} capability descriptors.",
            summary.capabilities_cached
        );
    }
    if let Some(bridge) = &summary.bridge_path {
        println!("Wrote secret bridge to {}", bridge.display());
    }
    Ok(())
}

fn cmd_lock(args: &LockArgs) -> Result<()> {
    let summary = lock::update_lock(&args.dist, &args.lock, &SystemProvenance::default())?;
    println!(
        "Updated {} with {} pack entries.",
        summary.lock_path.display(),
        summary.entries
    );
    Ok(())
}
