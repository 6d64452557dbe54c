//! Shared fixtures for unit tests.
use crate::config::{PackageConfig, PackageManifest};
use crate::generate::{RunStatus, SolutionRunner};
use anyhow::Result;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents).expect("write file");
}

/// Sorted paths of every file and directory below `root`, relative to it.
pub fn tree_listing(root: &Path) -> Vec<String> {
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

/// Source artifacts in `<tmp>/src` and an empty build base in `<tmp>/build`.
pub struct Fixture {
    _temp: TempDir,
    pub src: PathBuf,
    pub base: PathBuf,
}

impl Fixture {
    /// `sol.py`, `tests/{1,2}.in`, a stray `tests/notes.txt`, and `doc.pdf`.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src");
        let base = temp.path().join("build");
        write_file(&src.join("sol.py"), b"#!/usr/bin/env python3\nprint(sum(map(int, input().split())))\n");
        write_file(&src.join("tests/1.in"), b"1 2\n");
        write_file(&src.join("tests/2.in"), b"3 4\n");
        write_file(&src.join("tests/notes.txt"), b"not an input\n");
        write_file(&src.join("doc.pdf"), b"%PDF-1.4 fake statement\n");
        std::fs::create_dir_all(&base).expect("create base");
        Self {
            _temp: temp,
            src,
            base,
        }
    }

    pub fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.src.join(rel);
        write_file(&path, contents);
        path
    }

    pub fn manifest(&self) -> PackageManifest {
        PackageManifest {
            name: "abc".to_string(),
            model: PathBuf::from("sol.py"),
            lang: "py".to_string(),
            inputs: PathBuf::from("tests"),
            doc: PathBuf::from("doc.pdf"),
            ..PackageManifest::default()
        }
    }

    pub fn resolve(&self, manifest: &PackageManifest) -> PackageConfig {
        manifest.resolve(&self.src).expect("resolve manifest")
    }

    pub fn config(&self) -> PackageConfig {
        self.resolve(&self.manifest())
    }
}

/// Runner that answers `out:<input bytes>` and fails on chosen input names.
#[derive(Default)]
pub struct EchoRunner {
    pub fail_on: BTreeSet<String>,
    pub calls: RefCell<Vec<PathBuf>>,
}

impl EchoRunner {
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_on: names.iter().map(|name| name.to_string()).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl SolutionRunner for EchoRunner {
    fn run(&self, _program: &Path, stdin: &Path, stdout: &Path) -> Result<RunStatus> {
        self.calls.borrow_mut().push(stdin.to_path_buf());
        let input = std::fs::read(stdin)?;
        let name = stdin
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.fail_on.contains(&name) {
            std::fs::write(stdout, b"partial")?;
            return Ok(RunStatus {
                success: false,
                code: Some(1),
            });
        }
        let mut out = b"out:".to_vec();
        out.extend_from_slice(&input);
        std::fs::write(stdout, out)?;
        Ok(RunStatus {
            success: true,
            code: Some(0),
        })
    }
}
