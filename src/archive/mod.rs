//! Package archives.
//!
//! Archives are deterministic zip files: entries are written in sorted order
//! with a fixed timestamp, so the same tree always produces the same bytes.
//! The same writer produces the single-entry HTML statement wrapper.
//!
//! Invariants:
//! - Directory markers for the fixed package subdirectories come first, even
//!   when a subdirectory is empty.
//! - Entry names use `/` separators and are relative to the package's parent,
//!   so an archive unpacks to a single `<id>/` directory.
use crate::layout::{PackageLayout, PACKAGE_SUBDIRS};
use crate::staging::collect_files_recursive;
use crate::util::set_published_mode;
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Entry name of the HTML document inside a statement wrapper.
pub const HTML_INDEX_ENTRY: &str = "index.html";

/// One decoded archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Name as a relative path, `None` when it would escape the extraction root.
    pub enclosed: Option<PathBuf>,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Zip the package tree at `layout.root()` into `layout.archive_path()`.
///
/// The archive is written to a temporary file next to its destination and
/// renamed into place only once it is complete.
pub fn write_package_archive(layout: &PackageLayout) -> Result<PathBuf> {
    let root = layout.root();
    if !root.is_dir() {
        return Err(anyhow!("package tree {} does not exist", root.display()));
    }
    let archive_path = layout.archive_path();
    let files = collect_files_recursive(root)?;

    write_atomically(&archive_path, |out| {
        let mut zip = ZipWriter::new(out);
        for subdir in PACKAGE_SUBDIRS {
            zip.add_directory(format!("{}/{subdir}/", layout.identifier()), entry_options())?;
        }
        for file in &files {
            let name = entry_name(layout.base(), file)?;
            let bytes = fs::read(file).with_context(|| format!("read {}", file.display()))?;
            zip.start_file(name, entry_options())
                .with_context(|| format!("archive {}", file.display()))?;
            zip.write_all(&bytes)
                .with_context(|| format!("archive {}", file.display()))?;
        }
        zip.finish().context("finish archive")?;
        Ok(())
    })?;

    tracing::info!(
        archive = %archive_path.display(),
        files = files.len(),
        "archive written"
    );
    Ok(archive_path)
}

/// Wrap a single HTML document into a zip holding only `index.html`.
pub fn wrap_html_statement(html: &Path, dest: &Path) -> Result<()> {
    let bytes = fs::read(html).with_context(|| format!("read {}", html.display()))?;
    write_atomically(dest, |out| {
        let mut zip = ZipWriter::new(out);
        zip.start_file(HTML_INDEX_ENTRY, entry_options())?;
        zip.write_all(&bytes)
            .with_context(|| format!("archive {}", html.display()))?;
        zip.finish().context("finish statement wrapper")?;
        Ok(())
    })
}

/// Decode every entry of the archive at `path`, in central directory order.
pub fn read_archive(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(path).with_context(|| format!("open archive {}", path.display()))?;
    decode_archive(file).with_context(|| format!("decode archive {}", path.display()))
}

/// Extract the archive at `archive` below `dest`, returning created paths.
///
/// Entry names that are absolute or climb out of `dest` are rejected before
/// anything is written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let entries = read_archive(archive)?;
    let mut targets = Vec::with_capacity(entries.len());
    for entry in &entries {
        match &entry.enclosed {
            Some(rel) if is_plain_relative(rel) => targets.push(dest.join(rel)),
            _ => return Err(anyhow!("refusing to extract unsafe entry {:?}", entry.name)),
        }
    }
    for (entry, target) in entries.iter().zip(&targets) {
        if entry.is_dir() {
            fs::create_dir_all(target).with_context(|| format!("create {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(target, &entry.data)
                .with_context(|| format!("write {}", target.display()))?;
        }
        tracing::info!("{} --> {}", entry.name, target.display());
    }
    Ok(targets)
}

fn decode_archive<R: Read + Seek>(reader: R) -> Result<Vec<ArchiveEntry>> {
    let mut zip = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        let name = file.name().to_string();
        let enclosed = file.enclosed_name().map(Path::to_path_buf);
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .with_context(|| format!("read entry {name:?}"))?;
        entries.push(ArchiveEntry {
            name,
            enclosed,
            data,
        });
    }
    Ok(entries)
}

/// Deflated, with the DOS epoch as timestamp so output is reproducible.
fn entry_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn write_atomically<F>(dest: &Path, write_body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(".iotapack-")
        .suffix(".zip.tmp")
        .tempfile_in(parent)
        .with_context(|| format!("create temporary archive in {}", parent.display()))?;
    {
        let mut out = BufWriter::new(tmp.as_file());
        write_body(&mut out)?;
        out.flush()
            .with_context(|| format!("write archive {}", dest.display()))?;
    }
    set_published_mode(tmp.as_file(), dest)?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync archive {}", dest.display()))?;
    tmp.persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("persist archive {}", dest.display()))?;
    Ok(())
}

/// Archive entry name of `path`, relative to `base` with `/` separators.
fn entry_name(base: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(base)
        .with_context(|| format!("{} is outside {}", path.display(), base.display()))?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| anyhow!("{} is not valid UTF-8", path.display()))?,
            ),
            _ => return Err(anyhow!("unexpected component in {}", rel.display())),
        }
    }
    Ok(parts.join("/"))
}
