//! Expected-output generation.
//!
//! The model solution is run once per staged input with the input file on
//! stdin and stdout captured into `out/`. Process execution sits behind
//! `SolutionRunner` so tests (or other execution strategies) can stand in for
//! a real child process.
//!
//! Failure policy: every input is attempted. A failed input leaves no output
//! file behind and is recorded in the report; the caller decides whether the
//! run as a whole fails.
use crate::config::Language;
use crate::layout::PackageLayout;
use crate::staging::StagedInput;
use crate::util::{display_path, set_published_mode};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Exit information from one solution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    pub code: Option<i32>,
}

/// Run `program` with stdin read from `stdin` and stdout written to `stdout`.
///
/// Stderr is not captured. Implementations block until the program exits.
pub trait SolutionRunner {
    fn run(&self, program: &Path, stdin: &Path, stdout: &Path) -> Result<RunStatus>;
}

/// Runs the solution as a local child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl SolutionRunner for ProcessRunner {
    fn run(&self, program: &Path, stdin: &Path, stdout: &Path) -> Result<RunStatus> {
        let input = File::open(stdin).with_context(|| format!("open {}", stdin.display()))?;
        let output =
            File::create(stdout).with_context(|| format!("create {}", stdout.display()))?;
        let status = Command::new(program)
            .stdin(Stdio::from(input))
            .stdout(Stdio::from(output))
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("launch {}", program.display()))?;
        Ok(RunStatus {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// Resolve what to execute for a model solution.
///
/// Scripts run by path. Compiled languages need a binary next to the source,
/// named like the source without its extension; nothing is compiled here.
pub fn solution_program(model: &Path, language: Language) -> Result<PathBuf> {
    match language {
        Language::Py => Ok(model.to_path_buf()),
        Language::Cpp => {
            let mut binary = model.with_extension("");
            if !std::env::consts::EXE_SUFFIX.is_empty() {
                binary.set_extension(std::env::consts::EXE_EXTENSION);
            }
            if !binary.is_file() {
                return Err(anyhow!(
                    "compiled model solution {} not found (compile {} first)",
                    binary.display(),
                    model.display()
                ));
            }
            Ok(binary)
        }
    }
}

/// An output produced for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedOutput {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// An input whose solution run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    pub input: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct GenerationReport {
    pub outputs: Vec<GeneratedOutput>,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationReport {
    /// Error naming every failed input, if any failed.
    pub fn failure_error(&self) -> Option<anyhow::Error> {
        if self.failures.is_empty() {
            return None;
        }
        let details = self
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.input.display(), failure.reason))
            .collect::<Vec<_>>()
            .join("; ");
        Some(anyhow!(
            "output generation failed for {} of {} inputs: {details}",
            self.failures.len(),
            self.failures.len() + self.outputs.len()
        ))
    }
}

/// Run `program` on every input, writing `out/<id><stem>.out` for each success.
pub fn generate_outputs(
    runner: &dyn SolutionRunner,
    program: &Path,
    layout: &PackageLayout,
    inputs: &[StagedInput],
) -> GenerationReport {
    let mut report = GenerationReport::default();
    for input in inputs {
        let output = layout.output_path(&input.name);
        match generate_one(runner, program, layout, &input.path, &output) {
            Ok(()) => report.outputs.push(GeneratedOutput {
                input: input.path.clone(),
                output,
            }),
            Err(err) => {
                let reason = format!("{err:#}");
                tracing::error!(input = %input.path.display(), "{reason}");
                report.failures.push(GenerationFailure {
                    input: input.path.clone(),
                    reason,
                });
            }
        }
    }
    report
}

fn generate_one(
    runner: &dyn SolutionRunner,
    program: &Path,
    layout: &PackageLayout,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let base = layout.base();
    tracing::info!(
        "$ {} < {} > {}",
        shell_words::quote(&display_path(program, Some(base))),
        shell_words::quote(&display_path(input, Some(base))),
        shell_words::quote(&display_path(output, Some(base)))
    );

    let out_dir = output
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", output.display()))?;
    let capture = tempfile::Builder::new()
        .prefix(".iotapack-")
        .suffix(".out.tmp")
        .tempfile_in(out_dir)
        .with_context(|| format!("create capture file in {}", out_dir.display()))?;

    let status = runner.run(program, input, capture.path())?;
    if !status.success {
        let code = status
            .code
            .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
        return Err(anyhow!("{} exited with {code}", program.display()));
    }
    set_published_mode(capture.as_file(), output)?;
    capture
        .persist(output)
        .map_err(|err| err.error)
        .with_context(|| format!("persist {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
