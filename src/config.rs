//! Package configuration.
//!
//! Both CLI entrypoints funnel into a `PackageManifest`, which is resolved
//! against a source root and validated into an immutable `PackageConfig`.
//! Nothing downstream re-checks what is validated here.
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Model solution language tags accepted by the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Py,
    Cpp,
}

impl Language {
    pub fn parse(tag: &str) -> Result<Self> {
        match tag.trim() {
            "py" => Ok(Self::Py),
            "cpp" => Ok(Self::Cpp),
            other => Err(anyhow!(
                "unsupported language tag {other:?} (expected \"py\" or \"cpp\")"
            )),
        }
    }

    /// Extension of the staged model solution (`<id>.<ext>`).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Py => "py",
            Self::Cpp => "cpp",
        }
    }
}

/// Where test inputs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputsSource {
    /// Directory of `*.in` files.
    Directory(PathBuf),
    /// Single generator program.
    Generator(PathBuf),
}

impl InputsSource {
    fn detect(path: PathBuf) -> Result<Self> {
        if path.is_dir() {
            Ok(Self::Directory(path))
        } else if path.is_file() {
            Ok(Self::Generator(path))
        } else {
            Err(anyhow!("inputs source {} does not exist", path.display()))
        }
    }
}

/// Optional auxiliary files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extras {
    pub config: Option<PathBuf>,
    pub checker: Option<PathBuf>,
    pub solutions: Vec<PathBuf>,
    pub statement_source: Option<PathBuf>,
}

/// Toggles for the optional pipeline stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineFlags {
    pub outputs: bool,
    pub archive: bool,
    pub full_cleanup: bool,
    pub normalize_line_endings: bool,
}

impl PipelineFlags {
    /// Line endings are rewritten by default only where the native convention is CRLF.
    pub fn native_normalization() -> bool {
        cfg!(windows)
    }
}

/// Validated, immutable description of one package run.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub identifier: String,
    pub model: PathBuf,
    pub language: Language,
    pub inputs: InputsSource,
    pub statement: PathBuf,
    pub extras: Extras,
    pub flags: PipelineFlags,
}

impl PackageConfig {
    /// Every source path with the role it is staged as.
    pub fn sources(&self) -> Vec<(&'static str, &Path)> {
        let inputs = match &self.inputs {
            InputsSource::Directory(dir) => ("inputs directory", dir.as_path()),
            InputsSource::Generator(generator) => ("generator", generator.as_path()),
        };
        let mut sources = vec![
            ("statement", self.statement.as_path()),
            ("model solution", self.model.as_path()),
            inputs,
        ];
        let extras = &self.extras;
        sources.extend(extras.config.as_deref().map(|path| ("config", path)));
        sources.extend(
            extras
                .solutions
                .iter()
                .map(|path| ("additional solution", path.as_path())),
        );
        sources.extend(
            extras
                .statement_source
                .as_deref()
                .map(|path| ("statement source", path)),
        );
        sources.extend(extras.checker.as_deref().map(|path| ("checker", path)));
        sources
    }
}

/// Serialized form of a package description.
///
/// Field names follow the CLI flags so a manifest reads like a saved command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    pub name: String,
    pub model: PathBuf,
    pub lang: String,
    pub inputs: PathBuf,
    pub doc: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addsol: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdfsrc: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker: Option<PathBuf>,
    #[serde(default)]
    pub outputs: bool,
    #[serde(default)]
    pub zip: bool,
    #[serde(default)]
    pub fullcleanup: bool,
    #[serde(default)]
    pub normalize_line_endings: bool,
}

/// Load a manifest from disk.
pub fn load_manifest(path: &Path) -> Result<PackageManifest> {
    let bytes = fs::read(path).with_context(|| format!("read manifest {}", path.display()))?;
    let manifest: PackageManifest = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse manifest {}", path.display()))?;
    Ok(manifest)
}

/// Directory that relative manifest paths resolve against.
pub fn manifest_source_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl PackageManifest {
    /// Resolve every path against `source_root` and validate the result.
    pub fn resolve(&self, source_root: &Path) -> Result<PackageConfig> {
        validate_identifier(&self.name)?;
        let language = Language::parse(&self.lang)?;

        let model = require_file(source_root, &self.model, "model solution")?;
        let statement = require_file(source_root, &self.doc, "statement")?;
        let inputs = InputsSource::detect(source_root.join(&self.inputs))?;

        let extras = Extras {
            config: self
                .cfg
                .as_deref()
                .map(|path| require_file(source_root, path, "config"))
                .transpose()?,
            checker: self
                .checker
                .as_deref()
                .map(|path| require_file(source_root, path, "checker"))
                .transpose()?,
            solutions: self
                .addsol
                .iter()
                .map(|path| require_file(source_root, path, "additional solution"))
                .collect::<Result<Vec<_>>>()?,
            statement_source: self
                .pdfsrc
                .as_deref()
                .map(|path| require_file(source_root, path, "statement source"))
                .transpose()?,
        };

        let flags = PipelineFlags {
            outputs: self.outputs,
            archive: self.zip,
            full_cleanup: self.fullcleanup,
            normalize_line_endings: self.normalize_line_endings
                || PipelineFlags::native_normalization(),
        };
        if flags.full_cleanup && !flags.archive {
            return Err(anyhow!(
                "full cleanup removes the package directory and requires zipping"
            ));
        }
        if flags.outputs {
            if let InputsSource::Generator(generator) = &inputs {
                return Err(anyhow!(
                    "cannot generate outputs: inputs source {} is a generator program, not a directory of .in files",
                    generator.display()
                ));
            }
        }

        Ok(PackageConfig {
            identifier: self.name.clone(),
            model,
            language,
            inputs,
            statement,
            extras,
            flags,
        })
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid identifier regex"))
}

/// Identifiers become directory names and file-name prefixes, so only a
/// portable character set is accepted.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(anyhow!("problem identifier must be non-empty"));
    }
    if !identifier_pattern().is_match(identifier) {
        return Err(anyhow!(
            "problem identifier {identifier:?} may only contain ASCII letters, digits, '_' and '-'"
        ));
    }
    Ok(())
}

fn require_file(source_root: &Path, path: &Path, label: &str) -> Result<PathBuf> {
    let resolved = source_root.join(path);
    if !resolved.is_file() {
        return Err(anyhow!("{label} {} does not exist", resolved.display()));
    }
    Ok(resolved)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
