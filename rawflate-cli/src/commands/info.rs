//! Info command implementation.

use super::CmdResult;
use crate::utils::format_ratio;
use rawflate_deflate::{BlockInfo, Inflater};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Machine-readable stream report.
#[derive(Debug, Serialize)]
struct StreamReport {
    file: String,
    compressed_size: usize,
    consumed_bytes: usize,
    decompressed_size: usize,
    blocks: Vec<BlockReport>,
}

#[derive(Debug, Serialize)]
struct BlockReport {
    kind: &'static str,
    is_final: bool,
    output_len: usize,
}

impl From<&BlockInfo> for BlockReport {
    fn from(block: &BlockInfo) -> Self {
        Self {
            kind: block.kind.name(),
            is_final: block.is_final,
            output_len: block.output_len,
        }
    }
}

pub fn cmd_info(input: &Path, json: bool) -> CmdResult {
    let data = fs::read(input)?;

    let mut inflater = Inflater::new();
    inflater.inflate(&data)?;

    let report = StreamReport {
        file: input.display().to_string(),
        compressed_size: data.len(),
        consumed_bytes: inflater.consumed_bytes(),
        decompressed_size: inflater.output().len(),
        blocks: inflater.blocks().iter().map(BlockReport::from).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Stream Information");
    println!("==================");
    println!("File: {}", report.file);
    println!("Compressed size: {} bytes", report.compressed_size);
    if report.consumed_bytes < report.compressed_size {
        println!(
            "Stream ends at byte {} ({} trailing bytes)",
            report.consumed_bytes,
            report.compressed_size - report.consumed_bytes
        );
    }
    println!("Decompressed size: {} bytes", report.decompressed_size);
    println!(
        "Space savings: {}",
        format_ratio(report.decompressed_size, report.consumed_bytes)
    );
    println!();
    println!("{:>5} {:>8} {:>6} {:>12}", "Block", "Type", "Final", "Output");
    println!("{}", "-".repeat(34));
    for (i, block) in report.blocks.iter().enumerate() {
        println!(
            "{:>5} {:>8} {:>6} {:>12}",
            i,
            block.kind,
            if block.is_final { "yes" } else { "" },
            block.output_len
        );
    }

    Ok(())
}
