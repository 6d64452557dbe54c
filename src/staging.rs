//! Artifact staging into the canonical package layout.
//!
//! Every source is copied (never moved) to a destination derived by
//! `PackageLayout`. Destinations are tracked for the whole run so a second
//! write to the same path fails instead of silently replacing a file.
use crate::archive::wrap_html_statement;
use crate::config::{InputsSource, PackageConfig};
use crate::layout::{PackageLayout, HTML_ZIP_EXT, INPUT_SUFFIX, PACKAGE_SUBDIRS};
use crate::util::{display_path, file_ext, file_name_str};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Role a staged file plays in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagedRole {
    Statement,
    Model,
    Input,
    Generator,
    Config,
    Solution,
    StatementSource,
    Checker,
}

/// A copied source and where it landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    pub role: StagedRole,
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// A staged test input, keyed by its original file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    pub name: String,
    pub path: PathBuf,
}

/// Everything the later pipeline stages need from staging.
#[derive(Debug, Default)]
pub struct StagingOutcome {
    pub staged: Vec<StagedFile>,
    pub inputs: Vec<StagedInput>,
}

/// Copies sources into the layout and rejects duplicate destinations.
pub struct Stager<'a> {
    layout: &'a PackageLayout,
    destinations: BTreeSet<PathBuf>,
    staged: Vec<StagedFile>,
}

impl<'a> Stager<'a> {
    pub fn new(layout: &'a PackageLayout) -> Self {
        Self {
            layout,
            destinations: BTreeSet::new(),
            staged: Vec::new(),
        }
    }

    /// Copy `source` to `dest` byte-for-byte.
    pub fn stage(&mut self, role: StagedRole, source: &Path, dest: PathBuf) -> Result<()> {
        if !self.destinations.insert(dest.clone()) {
            return Err(anyhow!(
                "staging collision: {} was already staged in this run",
                dest.display()
            ));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let base = self.layout.base();
        tracing::info!(
            "{} --> {}",
            display_path(source, Some(base)),
            display_path(&dest, Some(base))
        );
        fs::copy(source, &dest)
            .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
        self.staged.push(StagedFile {
            role,
            source: source.to_path_buf(),
            dest,
        });
        Ok(())
    }

    pub fn into_staged(self) -> Vec<StagedFile> {
        self.staged
    }
}

/// Create the package root and its four fixed subdirectories.
pub fn create_layout(layout: &PackageLayout) -> Result<()> {
    for subdir in PACKAGE_SUBDIRS {
        let dir = layout.root().join(subdir);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(())
}

/// Stage every role of `config` into `layout`.
///
/// Transient files created along the way (the HTML statement wrapper) are
/// pushed onto `transients` as soon as they exist, so the caller can remove
/// them even when a later role fails.
pub fn stage_package(
    config: &PackageConfig,
    layout: &PackageLayout,
    transients: &mut Vec<PathBuf>,
) -> Result<StagingOutcome> {
    create_layout(layout)?;
    let mut stager = Stager::new(layout);

    stage_statement(&mut stager, config, layout, transients)?;
    stager.stage(
        StagedRole::Model,
        &config.model,
        layout.model_path(config.language.extension()),
    )?;

    let inputs = match &config.inputs {
        InputsSource::Directory(dir) => stage_input_dir(&mut stager, layout, dir)?,
        InputsSource::Generator(generator) => {
            stager.stage(
                StagedRole::Generator,
                generator,
                layout.generator_path(file_ext(generator)),
            )?;
            Vec::new()
        }
    };

    let extras = &config.extras;
    if let Some(cfg) = &extras.config {
        stager.stage(StagedRole::Config, cfg, layout.config_path())?;
    }
    for solution in &extras.solutions {
        let dest = layout.solution_path(file_name_str(solution)?);
        stager.stage(StagedRole::Solution, solution, dest)?;
    }
    if let Some(source) = &extras.statement_source {
        let dest = layout.statement_source_path(file_name_str(source)?);
        stager.stage(StagedRole::StatementSource, source, dest)?;
    }
    if let Some(checker) = &extras.checker {
        stager.stage(
            StagedRole::Checker,
            checker,
            layout.checker_path(file_ext(checker)),
        )?;
    }

    Ok(StagingOutcome {
        staged: stager.into_staged(),
        inputs,
    })
}

fn stage_statement(
    stager: &mut Stager<'_>,
    config: &PackageConfig,
    layout: &PackageLayout,
    transients: &mut Vec<PathBuf>,
) -> Result<()> {
    let statement = &config.statement;
    let ext = file_ext(statement);
    if ext.eq_ignore_ascii_case("html") {
        let wrapper = layout.statement_wrapper_path();
        wrap_html_statement(statement, &wrapper)
            .with_context(|| format!("wrap {} into a zip", statement.display()))?;
        transients.push(wrapper.clone());
        return stager.stage(
            StagedRole::Statement,
            &wrapper,
            layout.statement_path(HTML_ZIP_EXT),
        );
    }
    let dest_ext = if ext.eq_ignore_ascii_case("zip") {
        HTML_ZIP_EXT
    } else {
        ext
    };
    stager.stage(StagedRole::Statement, statement, layout.statement_path(dest_ext))
}

fn stage_input_dir(
    stager: &mut Stager<'_>,
    layout: &PackageLayout,
    dir: &Path,
) -> Result<Vec<StagedInput>> {
    tracing::info!(
        "looking for inputs in {}",
        display_path(dir, Some(layout.base()))
    );
    let mut inputs = Vec::new();
    for (name, source) in discover_inputs(dir)? {
        let dest = layout.input_path(&name);
        stager.stage(StagedRole::Input, &source, dest.clone())?;
        inputs.push(StagedInput { name, path: dest });
    }
    if inputs.is_empty() {
        tracing::warn!(dir = %dir.display(), "no {INPUT_SUFFIX} files found");
    }
    Ok(inputs)
}

/// Non-hidden files in `dir` named `*.in`, sorted lexicographically by name.
pub fn discover_inputs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        // Hidden files (editor backups, `._*` resource forks) are never inputs.
        if name.starts_with('.') {
            continue;
        }
        if name.len() > INPUT_SUFFIX.len() && name.ends_with(INPUT_SUFFIX) {
            found.push((name, path));
        }
    }
    found.sort();
    Ok(found)
}

/// Every regular file below `root`, sorted by path.
pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
