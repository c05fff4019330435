//! Compress command implementation.

use super::CmdResult;
use crate::utils::{compressed_path, format_ratio};
use rawflate_deflate::Deflater;
use std::fs;
use std::path::Path;
use std::time::Instant;

pub fn cmd_compress(input: &Path, output: Option<&Path>, level: u8) -> CmdResult {
    let data = fs::read(input)?;
    let output = output.map_or_else(|| compressed_path(input), Path::to_path_buf);

    let start = Instant::now();
    let compressed = Deflater::new(level).compress(&data);
    tracing::info!(
        input = %input.display(),
        level,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "compressed"
    );

    fs::write(&output, &compressed)?;

    println!(
        "{} -> {} ({} -> {} bytes, {})",
        input.display(),
        output.display(),
        data.len(),
        compressed.len(),
        format_ratio(data.len(), compressed.len())
    );
    Ok(())
}
