use crate::error::{PressError, Result};
use crate::warn;
use std::path::{absolute, Path, PathBuf};

/// Compute the destination for one input file.
///
/// Without `keep_structure` every destination lands directly in
/// `output_root` under the input's base name, so files from different
/// subdirectories can collide there; the collision resolver arbitrates.
/// With `keep_structure` the input's path relative to `scan_root` is
/// re-rooted under `output_root`.
pub fn resolve(
    file: &Path,
    scan_root: Option<&Path>,
    output_root: &Path,
    keep_structure: bool,
) -> PathBuf {
    if keep_structure {
        if let Some(root) = scan_root {
            if let Ok(relative) = file.strip_prefix(root) {
                return output_root.join(relative);
            }
        }
    }

    match file.file_name() {
        Some(name) => output_root.join(name),
        None => output_root.to_path_buf(),
    }
}

/// Reject configurations where the output folder sits inside the tree
/// being scanned: with `recursive` enabled the run would re-discover its
/// own outputs and grow without bound. The two roots being identical is
/// allowed (in-place overwrite, arbitrated per file).
pub fn check_not_nested(output_root: &Path, scan_root: &Path, recursive: bool) -> Result<()> {
    if !recursive {
        return Ok(());
    }

    let output_abs = absolute(output_root).unwrap_or_else(|_| output_root.to_path_buf());
    let scan_abs = absolute(scan_root).unwrap_or_else(|_| scan_root.to_path_buf());

    if output_abs != scan_abs && output_abs.starts_with(&scan_abs) {
        return Err(PressError::OutputNestedInInput {
            output: output_abs,
            input: scan_abs,
        });
    }
    Ok(())
}

/// Demote flag combinations that cannot be honored. Demotions warn and
/// continue; only the nesting guard is fatal.
pub fn normalize_flags(
    mut recursive: bool,
    mut keep_structure: bool,
    input_is_directory: bool,
    loose_file_count: usize,
) -> (bool, bool) {
    if recursive && !input_is_directory {
        warn!("--recursive has no effect on file inputs");
        recursive = false;
    }
    if keep_structure && !recursive {
        warn!("--keep-structure has no effect without --recursive");
        keep_structure = false;
    }
    if keep_structure && !input_is_directory && loose_file_count > 1 {
        warn!("cannot keep the folder structure with multiple input files");
        keep_structure = false;
    }
    (recursive, keep_structure)
}
