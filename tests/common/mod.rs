//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Sources in `<tmp>/src` (the working directory of every run) and an empty
/// build base in `<tmp>/build`.
pub struct SourceTree {
    temp: TempDir,
}

impl SourceTree {
    /// `sol.py` (a stdin echo script), `tests/{1,2}.in` and `doc.pdf`.
    pub fn new() -> Self {
        let tree = Self {
            temp: tempfile::tempdir().expect("create temp dir"),
        };
        tree.write("sol.py", b"#!/bin/sh\ncat\n");
        tree.write("tests/1.in", b"1 2\n");
        tree.write("tests/2.in", b"3 4\n");
        tree.write("doc.pdf", b"%PDF-1.4 statement\n");
        std::fs::create_dir_all(tree.base()).expect("create base");
        tree
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn src(&self) -> PathBuf {
        self.root().join("src")
    }

    pub fn base(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.src().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(&path, contents).expect("write source file");
        path
    }

    #[cfg(unix)]
    pub fn make_executable(&self, rel: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.src().join(rel);
        let mut perms = std::fs::metadata(&path).expect("stat").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod");
    }

    /// The binary, run from the source directory.
    pub fn iotapack(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_iotapack"));
        cmd.current_dir(self.src()).env_remove("RUST_LOG");
        cmd
    }

    /// `iotapack pack <args> --base <build>`.
    pub fn pack(&self, args: &[&str]) -> Command {
        let mut cmd = self.iotapack();
        cmd.arg("pack").args(args).arg("--base").arg(self.base());
        cmd
    }
}

/// Sorted paths below `root`, directories suffixed with `/`.
pub fn listing(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).expect("read dir") {
            let path = entry.expect("dir entry").path();
            let rel = path
                .strip_prefix(root)
                .expect("strip root")
                .to_string_lossy()
                .replace('\\', "/");
            if path.is_dir() {
                out.push(format!("{rel}/"));
                walk(root, &path, out);
            } else {
                out.push(rel);
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}
