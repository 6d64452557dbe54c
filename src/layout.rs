//! Typed paths into a package layout.
//!
//! Every canonical file name is derived here so the stager, the generator,
//! and the archiver agree on the tree without passing strings around.
use std::path::{Path, PathBuf};

/// Fixed subdirectories of every package, in archive marker order.
pub const PACKAGE_SUBDIRS: [&str; 4] = ["doc", "prog", "in", "out"];

/// Suffix that marks a file in an inputs directory as a test input.
pub const INPUT_SUFFIX: &str = ".in";

/// Suffix given to generated outputs.
pub const OUTPUT_SUFFIX: &str = ".out";

/// Destination extension signalling an HTML statement packed in a zip.
pub const HTML_ZIP_EXT: &str = "html.zip";

/// Convenience wrapper for locating package artifacts.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    identifier: String,
    root: PathBuf,
}

impl PackageLayout {
    /// Layout for `identifier`, rooted at `<base>/<identifier>`.
    pub fn new(base: &Path, identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            root: base.join(identifier),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Return the package root (`<id>/`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the directory holding the package root.
    pub fn base(&self) -> &Path {
        self.root.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Return the `doc/` directory path.
    pub fn doc_dir(&self) -> PathBuf {
        self.root.join("doc")
    }

    /// Return the `prog/` directory path.
    pub fn prog_dir(&self) -> PathBuf {
        self.root.join("prog")
    }

    /// Return the `in/` directory path.
    pub fn in_dir(&self) -> PathBuf {
        self.root.join("in")
    }

    /// Return the `out/` directory path.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Return `doc/<id>zad.<ext>`.
    pub fn statement_path(&self, ext: &str) -> PathBuf {
        self.doc_dir().join(self.prefixed("zad", ext))
    }

    /// Return `prog/<id>.<ext>`.
    pub fn model_path(&self, ext: &str) -> PathBuf {
        self.prog_dir().join(self.prefixed("", ext))
    }

    /// Return `prog/<id>ingen.<ext>`.
    pub fn generator_path(&self, ext: &str) -> PathBuf {
        self.prog_dir().join(self.prefixed("ingen", ext))
    }

    /// Return `prog/<id>chk.<ext>`.
    pub fn checker_path(&self, ext: &str) -> PathBuf {
        self.prog_dir().join(self.prefixed("chk", ext))
    }

    /// Return `in/<id><input file name>`.
    pub fn input_path(&self, input_name: &str) -> PathBuf {
        self.in_dir().join(format!("{}{input_name}", self.identifier))
    }

    /// Return `out/<id><stem>.out` for an input named `<stem>.in`.
    pub fn output_path(&self, input_name: &str) -> PathBuf {
        let stem = input_name.strip_suffix(INPUT_SUFFIX).unwrap_or(input_name);
        self.out_dir()
            .join(format!("{}{stem}{OUTPUT_SUFFIX}", self.identifier))
    }

    /// Return `config.yml` at the package root.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yml")
    }

    /// Return `prog/<file name>` for an additional solution.
    pub fn solution_path(&self, file_name: &str) -> PathBuf {
        self.prog_dir().join(file_name)
    }

    /// Return `doc/<file name>` for the statement source.
    pub fn statement_source_path(&self, file_name: &str) -> PathBuf {
        self.doc_dir().join(file_name)
    }

    /// Return `<base>/<id>.zip`.
    pub fn archive_path(&self) -> PathBuf {
        self.base().join(format!("{}.zip", self.identifier))
    }

    /// Return the transient HTML wrapper path `<base>/<id>doc.tmp.html.zip`.
    pub fn statement_wrapper_path(&self) -> PathBuf {
        self.base()
            .join(format!("{}doc.tmp.{HTML_ZIP_EXT}", self.identifier))
    }

    fn prefixed(&self, role: &str, ext: &str) -> String {
        if ext.is_empty() {
            format!("{}{role}", self.identifier)
        } else {
            format!("{}{role}.{ext}", self.identifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_follow_identifier_prefix() {
        let layout = PackageLayout::new(Path::new("/work"), "abc");
        assert_eq!(layout.root(), Path::new("/work/abc"));
        assert_eq!(
            layout.statement_path("pdf"),
            PathBuf::from("/work/abc/doc/abczad.pdf")
        );
        assert_eq!(
            layout.statement_path(HTML_ZIP_EXT),
            PathBuf::from("/work/abc/doc/abczad.html.zip")
        );
        assert_eq!(layout.model_path("py"), PathBuf::from("/work/abc/prog/abc.py"));
        assert_eq!(
            layout.generator_path("cpp"),
            PathBuf::from("/work/abc/prog/abcingen.cpp")
        );
        assert_eq!(
            layout.checker_path("cpp"),
            PathBuf::from("/work/abc/prog/abcchk.cpp")
        );
        assert_eq!(layout.input_path("1.in"), PathBuf::from("/work/abc/in/abc1.in"));
        assert_eq!(
            layout.output_path("1.in"),
            PathBuf::from("/work/abc/out/abc1.out")
        );
        assert_eq!(layout.config_path(), PathBuf::from("/work/abc/config.yml"));
        assert_eq!(layout.archive_path(), PathBuf::from("/work/abc.zip"));
    }

    #[test]
    fn extensionless_sources_keep_bare_names() {
        let layout = PackageLayout::new(Path::new("/work"), "abc");
        assert_eq!(
            layout.generator_path(""),
            PathBuf::from("/work/abc/prog/abcingen")
        );
    }
}
