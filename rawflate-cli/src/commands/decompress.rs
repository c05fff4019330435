//! Decompress command implementation.

use super::CmdResult;
use crate::utils::decompressed_path;
use rawflate_deflate::{decompress, decompress_with_limit};
use std::fs;
use std::path::Path;

pub fn cmd_decompress(input: &Path, output: Option<&Path>, limit: Option<usize>) -> CmdResult {
    let data = fs::read(input)?;
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => decompressed_path(input)?,
    };

    let decompressed = match limit {
        Some(limit) => decompress_with_limit(&data, limit)?,
        None => decompress(&data)?,
    };

    fs::write(&output, &decompressed)?;

    println!(
        "{} -> {} ({} -> {} bytes)",
        input.display(),
        output.display(),
        data.len(),
        decompressed.len()
    );
    Ok(())
}
