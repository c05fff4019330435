//! Utility functions for the CLI.

use std::path::{Path, PathBuf};

/// Extension used for raw DEFLATE streams.
pub const EXTENSION: &str = "deflate";

/// Default output path for compression: `<input>.deflate`.
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}

/// Default output path for decompression: `<input>` minus `.deflate`.
pub fn decompressed_path(input: &Path) -> Result<PathBuf, String> {
    if input.extension().is_some_and(|ext| ext == EXTENSION) {
        Ok(input.with_extension(""))
    } else {
        Err(format!(
            "cannot derive output name for {} (no .{} extension); use --output",
            input.display(),
            EXTENSION
        ))
    }
}

/// Space savings of `compressed` relative to `original`, as a percentage.
pub fn format_ratio(original: usize, compressed: usize) -> String {
    if original == 0 {
        return "-".to_string();
    }
    format!(
        "{:.1}%",
        (1.0 - compressed as f64 / original as f64) * 100.0
    )
}
