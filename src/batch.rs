use crate::commit::{commit, Outcome, OverwritePolicy};
use crate::compress::{CompressionParameters, Compressor};
use crate::error::Result;
use crate::outpath;
use crate::scan::ScanResult;
use crate::utils::{calculate_compression_ratio, file_size, format_file_size};
use crate::{info, verbose, warn};
use std::fs;
use std::time::{Duration, Instant};

/// Knobs fixed for the whole run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_root: std::path::PathBuf,
    pub keep_structure: bool,
    pub policy: OverwritePolicy,
    pub dry_run: bool,
}

/// Aggregate numbers for the final recap. Only files whose output exists
/// at the end contribute to the byte totals, so the compression ratio
/// reflects what is actually on disk.
#[derive(Debug, Default, Clone)]
pub struct RunStatistics {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub compressed_files: u32,
    pub skipped_files: u32,
    pub failed_files: u32,
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn total_files(&self) -> u32 {
        self.compressed_files + self.skipped_files + self.failed_files
    }
}

/// Drive the whole run: one file at a time, in plan order. Per-file
/// failures are reported and counted but never abort the loop.
pub fn run(
    plan: &ScanResult,
    config: &RunConfig,
    params: &CompressionParameters,
    compressor: &dyn Compressor,
) -> RunStatistics {
    let mut stats = RunStatistics::default();
    let start = Instant::now();
    let total = plan.files.len();

    for (index, input) in plan.files.iter().enumerate() {
        let dest = outpath::resolve(
            input,
            plan.root.as_deref(),
            &config.output_root,
            config.keep_structure,
        );

        if config.dry_run {
            info!(
                "({}/{}) {} -> {}",
                index + 1,
                total,
                input.display(),
                dest.display()
            );
            continue;
        }

        let input_size = match file_size(input) {
            Some(size) if size > 0 => size,
            _ => {
                warn!("({}/{}) cannot read {}, skipping", index + 1, total, input.display());
                stats.failed_files += 1;
                continue;
            }
        };
        stats.input_bytes += input_size;

        info!(
            "({}/{}) {} -> {}",
            index + 1,
            total,
            input.display(),
            dest.display()
        );

        if let Some(parent) = dest.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("cannot create {}: {}", parent.display(), e);
                stats.input_bytes -= input_size;
                stats.failed_files += 1;
                continue;
            }
        }

        let result = commit(
            |path| -> Result<u64> {
                compressor.compress(input, path, params)?;
                Ok(fs::metadata(path)?.len())
            },
            &dest,
            config.policy,
        );

        match result {
            Ok(Outcome::Written(bytes)) => {
                stats.output_bytes += bytes;
                stats.compressed_files += 1;
                verbose!(
                    "{} -> {} [{:.1}%]",
                    format_file_size(input_size),
                    format_file_size(bytes),
                    calculate_compression_ratio(input_size, bytes)
                );
            }
            Ok(Outcome::Skipped) => {
                // The untouched file is what remains on disk, so its
                // size is the output size for this input.
                stats.output_bytes += file_size(&dest).unwrap_or(0);
                stats.skipped_files += 1;
                info!("{} [SKIPPED]", dest.display());
            }
            Ok(Outcome::Discarded) => {
                stats.input_bytes -= input_size;
                stats.skipped_files += 1;
                info!("Resulting file is bigger. Skipping.");
            }
            Ok(Outcome::Failed) => {
                stats.input_bytes -= input_size;
                stats.failed_files += 1;
            }
            Err(e) => {
                warn!("{}: {}", input.display(), e);
                stats.input_bytes -= input_size;
                stats.failed_files += 1;
            }
        }
    }

    stats.elapsed = start.elapsed();
    stats
}

/// Final recap printed after the loop. Suppressed entirely in quiet mode
/// via the logging macros.
pub fn print_summary(stats: &RunStatistics, dry_run: bool) {
    if dry_run {
        return;
    }
    info!("-------------------------------");
    info!(
        "Compressed {} files ({} skipped, {} failed) in {:.2}s",
        stats.compressed_files,
        stats.skipped_files,
        stats.failed_files,
        stats.elapsed.as_secs_f64()
    );
    if stats.input_bytes > 0 {
        info!(
            "{} -> {} [{:.1}%]",
            format_file_size(stats.input_bytes),
            format_file_size(stats.output_bytes),
            calculate_compression_ratio(stats.input_bytes, stats.output_bytes)
        );
    }
}
