use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::Path;

/// Mode given to files the tool publishes (outputs, archives).
#[cfg(unix)]
const PUBLISHED_MODE: u32 = 0o644;

/// Render `path` relative to `base` when possible, for trace lines.
pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

/// Last extension of `path` without the dot, or `""` when there is none.
pub fn file_ext(path: &Path) -> &str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
}

/// File name of `path` as UTF-8.
pub fn file_name_str(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} has no UTF-8 file name", path.display()))
}

/// Make a file created through `tempfile` (mode 0600) readable like one
/// created by a shell redirect. No-op off unix.
pub fn set_published_mode(file: &File, path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use anyhow::Context;
        use std::os::unix::fs::PermissionsExt;

        file.set_permissions(std::fs::Permissions::from_mode(PUBLISHED_MODE))
            .with_context(|| format!("set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = (file, path);
    Ok(())
}
