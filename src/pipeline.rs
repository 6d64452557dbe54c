//! Package pipeline orchestration.
//!
//! Stages run in a fixed order: reset, stage, generate outputs, normalize
//! line endings, archive. Optional stages are gated by `PipelineFlags`.
//! Transient files are removed once the stages finish, whether or not they
//! succeeded; the package tree itself is only removed after a successful
//! archive when full cleanup is requested.
use crate::archive::write_package_archive;
use crate::config::{InputsSource, PackageConfig};
use crate::generate::{generate_outputs, solution_program, GeneratedOutput, SolutionRunner};
use crate::layout::PackageLayout;
use crate::normalize::normalize_file;
use crate::reset::reset_workspace;
use crate::staging::{stage_package, StagedFile};
use crate::util::display_path;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Summary of one pipeline run.
#[derive(Debug, Serialize)]
pub struct PackReport {
    pub identifier: String,
    pub package_root: PathBuf,
    pub staged: Vec<StagedFile>,
    pub generated: Vec<GeneratedOutput>,
    pub normalized: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub removed_transients: Vec<PathBuf>,
    pub package_removed: bool,
    pub elapsed_ms: u128,
}

/// Build the package described by `config` under `base`.
pub fn run(
    config: &PackageConfig,
    base: &Path,
    runner: &dyn SolutionRunner,
) -> Result<PackReport> {
    let start = Instant::now();
    let layout = PackageLayout::new(base, &config.identifier);
    let mut transients = Vec::new();

    let staged = run_stages(config, &layout, runner, &mut transients);
    if let Err(cleanup_err) = cleanup_transients(&transients, base) {
        if staged.is_ok() {
            return Err(cleanup_err);
        }
        tracing::error!("{cleanup_err:#}");
    }
    let mut report = staged?;
    report.removed_transients = transients;

    if config.flags.full_cleanup && report.archive.is_some() {
        tracing::info!("cleaning up build directory...");
        reset_workspace(layout.root())?;
        report.package_removed = true;
    }

    report.elapsed_ms = start.elapsed().as_millis();
    tracing::info!("[!] done in: {:.3}s", start.elapsed().as_secs_f64());
    Ok(report)
}

fn run_stages(
    config: &PackageConfig,
    layout: &PackageLayout,
    runner: &dyn SolutionRunner,
    transients: &mut Vec<PathBuf>,
) -> Result<PackReport> {
    let flags = config.flags;

    // Resolved before anything is deleted so a missing binary leaves the old tree intact.
    let program = if flags.outputs {
        if let InputsSource::Generator(generator) = &config.inputs {
            return Err(anyhow!(
                "cannot generate outputs from generator program {}",
                generator.display()
            ));
        }
        Some(solution_program(&config.model, config.language)?)
    } else {
        None
    };

    ensure_sources_survive_reset(config, layout)?;
    reset_workspace(layout.root())?;
    let staging = stage_package(config, layout, transients)?;

    let generation = program
        .as_deref()
        .map(|program| generate_outputs(runner, program, layout, &staging.inputs));

    let mut normalized = Vec::new();
    if flags.normalize_line_endings {
        let inputs = staging.inputs.iter().map(|input| input.path.as_path());
        let outputs = generation
            .iter()
            .flat_map(|report| report.outputs.iter().map(|out| out.output.as_path()));
        for path in inputs.chain(outputs) {
            if normalize_file(path)? {
                normalized.push(path.to_path_buf());
            }
        }
    }

    if let Some(err) = generation.as_ref().and_then(|report| report.failure_error()) {
        return Err(err);
    }

    let archive = if flags.archive {
        tracing::info!("zipping...");
        Some(write_package_archive(layout).context("write package archive")?)
    } else {
        None
    };

    Ok(PackReport {
        identifier: config.identifier.clone(),
        package_root: layout.root().to_path_buf(),
        staged: staging.staged,
        generated: generation.map(|report| report.outputs).unwrap_or_default(),
        normalized,
        archive,
        removed_transients: Vec::new(),
        package_removed: false,
        elapsed_ms: 0,
    })
}

/// Sources inside the package tree would be deleted by the reset before they
/// are copied.
fn ensure_sources_survive_reset(config: &PackageConfig, layout: &PackageLayout) -> Result<()> {
    let Ok(root) = fs::canonicalize(layout.root()) else {
        return Ok(());
    };
    for (label, source) in config.sources() {
        let resolved = fs::canonicalize(source)
            .with_context(|| format!("resolve {label} {}", source.display()))?;
        if resolved.starts_with(&root) {
            return Err(anyhow!(
                "{label} {} lies inside the package directory {}, which is removed before staging",
                source.display(),
                root.display()
            ));
        }
    }
    Ok(())
}

fn cleanup_transients(transients: &[PathBuf], base: &Path) -> Result<()> {
    if transients.is_empty() {
        return Ok(());
    }
    tracing::info!("cleaning up...");
    for path in transients {
        tracing::info!("## {}", display_path(path, Some(base)));
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("remove {}", path.display()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
