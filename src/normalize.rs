//! CRLF to LF rewriting for test data.
//!
//! The judge compares outputs byte-for-byte with LF line endings, so inputs
//! and outputs produced on CRLF platforms are rewritten in place.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Replace every `\r\n` terminator with `\n`.
///
/// A run of `\r` bytes directly before `\n` is dropped as a whole. Lone `\r`
/// bytes elsewhere are preserved.
pub fn crlf_to_lf(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        if byte == b'\n' {
            while out.last() == Some(&b'\r') {
                out.pop();
            }
        }
        out.push(byte);
    }
    out
}

/// Rewrite `path` in place. Returns whether the file changed.
pub fn normalize_file(path: &Path) -> Result<bool> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let normalized = crlf_to_lf(&bytes);
    if normalized == bytes {
        return Ok(false);
    }
    fs::write(path, &normalized).with_context(|| format!("write {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        removed = bytes.len() - normalized.len(),
        "normalized line endings"
    );
    Ok(true)
}
