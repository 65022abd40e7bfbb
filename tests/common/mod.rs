//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch workspace laid out like a pack repository:
/// `packs/<pack>/` next to a `components/` registry.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    #[allow(dead_code)]
    pub fn pack_dir(&self, pack: &str) -> PathBuf {
        self.root().join("packs").join(pack)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, contents.as_bytes()).expect("write file");
        path
    }

    #[allow(dead_code)]
    pub fn component(&self, id: &str, descriptor: &str) {
        self.write(
            &format!("components/{id}/component.manifest.json"),
            descriptor,
        );
    }

    pub fn read_json(&self, rel: &str) -> Value {
        let path = self.root().join(rel);
        let bytes = fs::read(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
        serde_json::from_slice(&bytes).expect("parse JSON output")
    }

    /// Run `packmeta` with the workspace as the working directory.
    pub fn packmeta(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_packmeta"))
            .args(args)
            .current_dir(self.root())
            .env_remove("RUST_LOG")
            .output()
            .expect("run packmeta")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
