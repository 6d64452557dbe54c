//! Command handlers.
//!
//! Each handler turns CLI arguments into a validated `PackageConfig` (or an
//! archive path) and hands off to the core. The process working directory
//! is read here and nowhere else; the core only sees explicit paths.
use crate::archive::extract_archive;
use crate::cli::{BuildArgs, PackArgs, RunFlags, UnpackArgs};
use crate::config::{load_manifest, manifest_source_root, PackageManifest};
use crate::generate::ProcessRunner;
use crate::pipeline::{self, PackReport};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub fn run_pack(args: PackArgs) -> Result<()> {
    let cwd = current_dir()?;
    let base = resolve_base(&cwd, args.run.base.as_deref());
    let mut manifest = PackageManifest {
        name: args.name,
        model: args.model,
        lang: args.lang,
        inputs: args.inputs,
        doc: args.doc,
        cfg: args.cfg,
        addsol: args.addsol,
        pdfsrc: args.pdfsrc,
        checker: args.checker,
        ..PackageManifest::default()
    };
    apply_run_flags(&mut manifest, &args.run);
    let config = manifest.resolve(&cwd)?;
    let report = pipeline::run(&config, &base, &ProcessRunner)?;
    emit_report(&report, args.run.json)
}

pub fn run_build(args: BuildArgs) -> Result<()> {
    let cwd = current_dir()?;
    let base = resolve_base(&cwd, args.run.base.as_deref());
    let manifest_path = cwd.join(&args.manifest);
    let mut manifest = load_manifest(&manifest_path)?;
    apply_run_flags(&mut manifest, &args.run);
    let config = manifest.resolve(&manifest_source_root(&manifest_path))?;
    let report = pipeline::run(&config, &base, &ProcessRunner)?;
    emit_report(&report, args.run.json)
}

pub fn run_unpack(args: UnpackArgs) -> Result<()> {
    let cwd = current_dir()?;
    let dest = resolve_base(&cwd, args.dest.as_deref());
    let written = extract_archive(&cwd.join(&args.archive), &dest)?;
    tracing::info!(entries = written.len(), dest = %dest.display(), "archive extracted");
    Ok(())
}

/// CLI flags only ever switch stages on; they never override a manifest's `true`.
fn apply_run_flags(manifest: &mut PackageManifest, flags: &RunFlags) {
    manifest.outputs |= flags.outputs;
    manifest.zip |= flags.zip;
    manifest.fullcleanup |= flags.full_cleanup;
    manifest.normalize_line_endings |= flags.normalize_line_endings;
}

fn resolve_base(cwd: &Path, base: Option<&Path>) -> PathBuf {
    match base {
        Some(base) => cwd.join(base),
        None => cwd.to_path_buf(),
    }
}

fn current_dir() -> Result<PathBuf> {
    env::current_dir().context("resolve current directory")
}

fn emit_report(report: &PackReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("serialize run report")?;
        println!("{text}");
    }
    Ok(())
}
