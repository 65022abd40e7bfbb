//! CLI argument parsing for the pack metadata tools.
//!
//! Path defaults are applied when arguments are resolved into options, not
//! here, so that `--help` shows the flags exactly as an author writes them.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default directory scanned for built pack artifacts.
pub const DEFAULT_DIST_DIR: &str = "dist/packs";
/// Default lock document path.
pub const DEFAULT_LOCK_PATH: &str = "packs.lock.json";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "packmeta",
    version,
    about = "Pack manifest aggregation and artifact lock maintenance",
    after_help = "Examples:\n  packmeta manifest --pack-dir packs/messaging-slack --include-capabilities-cache\n  packmeta manifest --pack-dir packs/messaging-slack --secrets-out dist/slack.secrets.json\n  packmeta lock --dist dist/packs --lock packs.lock.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Manifest(ManifestArgs),
    Lock(LockArgs),
}

/// Manifest aggregation inputs for a single pack.
#[derive(Parser, Debug)]
#[command(about = "Aggregate pack.yaml and component descriptors into pack.manifest.json")]
pub struct ManifestArgs {
    /// Pack directory containing pack.yaml and/or pack.manifest.json
    #[arg(long, value_name = "DIR")]
    pub pack_dir: PathBuf,

    /// Component registry (defaults to ../../components from the pack dir)
    #[arg(long, value_name = "DIR")]
    pub components_dir: Option<PathBuf>,

    /// Version to stamp into the manifest, overriding pack.yaml
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Output path (defaults to pack.manifest.json in the pack dir)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the reconciled secret requirements for secret provisioning
    #[arg(long, value_name = "PATH")]
    pub secrets_out: Option<PathBuf>,

    /// Copy capabilities_v1.json from components into the pack and index them
    #[arg(long)]
    pub include_capabilities_cache: bool,
}

/// Lock refresh inputs.
#[derive(Parser, Debug)]
#[command(about = "Digest built .gtpack artifacts into the lock file")]
pub struct LockArgs {
    /// Directory containing .gtpack artifacts
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DIST_DIR)]
    pub dist: PathBuf,

    /// Lock file to refresh
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOCK_PATH)]
    pub lock: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn lock_defaults_apply() {
        let args = RootArgs::try_parse_from(["packmeta", "lock"]).expect("parse");
        let Command::Lock(lock) = args.command else {
            panic!("expected lock command");
        };
        assert_eq!(lock.dist, PathBuf::from(DEFAULT_DIST_DIR));
        assert_eq!(lock.lock, PathBuf::from(DEFAULT_LOCK_PATH));
    }

    #[test]
    fn manifest_requires_pack_dir() {
        assert!(RootArgs::try_parse_from(["packmeta", "manifest"]).is_err());
        let args = RootArgs::try_parse_from([
            "packmeta",
            "manifest",
            "--pack-dir",
            "packs/demo",
            "--include-capabilities-cache",
            "--verbose",
        ])
        .expect("parse");
        assert!(args.verbose);
        let Command::Manifest(manifest) = args.command else {
            panic!("expected manifest command");
        };
        assert!(manifest.include_capabilities_cache);
        assert!(manifest.components_dir.is_none());
    }
}
