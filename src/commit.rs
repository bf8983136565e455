use crate::error::Result;
use crate::info;
use clap::ValueEnum;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// How an already-existing destination file is handled. Attached once per
/// run and applied to every collision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OverwritePolicy {
    /// Never overwrite an existing file.
    #[value(name = "none")]
    Skip,
    /// Ask before overwriting.
    #[value(name = "prompt")]
    Prompt,
    /// Overwrite only when the new file is smaller.
    #[value(name = "bigger")]
    PreferSmaller,
    /// Always overwrite.
    #[value(name = "all")]
    All,
}

/// Result of one commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The output exists at the final path, with its size in bytes.
    Written(u64),
    /// The existing file was kept untouched without running the writer.
    Skipped,
    /// The candidate was produced but thrown away (not smaller).
    Discarded,
    /// The writer failed; any partial output was removed.
    Failed,
}

/// Run `write_fn` against the destination, honoring the overwrite policy.
///
/// When the destination already exists the candidate is written to a
/// `.tmp` sibling and renamed over the original only on success, so the
/// destination is never observable in a partially written state and an
/// interrupted run cannot corrupt a pre-existing file.
pub fn commit<F>(write_fn: F, final_path: &Path, policy: OverwritePolicy) -> Result<Outcome>
where
    F: FnOnce(&Path) -> Result<u64>,
{
    commit_with_confirm(write_fn, final_path, policy, || ask_overwrite(final_path))
}

fn commit_with_confirm<F, C>(
    write_fn: F,
    final_path: &Path,
    policy: OverwritePolicy,
    confirm: C,
) -> Result<Outcome>
where
    F: FnOnce(&Path) -> Result<u64>,
    C: FnOnce() -> bool,
{
    if !final_path.exists() {
        return match write_fn(final_path) {
            Ok(bytes) => Ok(Outcome::Written(bytes)),
            Err(e) => {
                // Never leave a truncated file behind at the final path.
                let _ = fs::remove_file(final_path);
                Err(e)
            }
        };
    }

    match policy {
        OverwritePolicy::Skip => return Ok(Outcome::Skipped),
        OverwritePolicy::Prompt => {
            if !confirm() {
                return Ok(Outcome::Skipped);
            }
        }
        OverwritePolicy::PreferSmaller | OverwritePolicy::All => {}
    }

    let tmp_path = tmp_sibling(final_path);
    let bytes = match write_fn(&tmp_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
    };

    if policy == OverwritePolicy::PreferSmaller {
        let existing = fs::metadata(final_path)?.len();
        if bytes >= existing {
            fs::remove_file(&tmp_path)?;
            return Ok(Outcome::Discarded);
        }
    }

    fs::rename(&tmp_path, final_path)?;
    Ok(Outcome::Written(bytes))
}

/// Sibling temporary path: the final name with a `.tmp` suffix appended.
fn tmp_sibling(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Interactive confirmation; anything but an explicit yes means no.
fn ask_overwrite(final_path: &Path) -> bool {
    info!("Overwrite {}? [y/N]", final_path.display());
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES")
}
