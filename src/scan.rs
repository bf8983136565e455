use crate::error::{PressError, Result};
use crate::warn;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What the command line handed us: either loose files or a single
/// directory root. A run never mixes the two.
#[derive(Debug, Clone)]
pub enum InputSpec {
    Files(Vec<PathBuf>),
    Directory(PathBuf),
}

impl InputSpec {
    /// Classify the positional arguments. At most one directory is
    /// accepted, and it cannot be combined with loose files.
    pub fn from_args(args: &[PathBuf]) -> Result<Self> {
        if args.is_empty() {
            return Err(PressError::NoInputFiles);
        }

        let dirs: Vec<&PathBuf> = args.iter().filter(|p| p.is_dir()).collect();
        match dirs.len() {
            0 => Ok(InputSpec::Files(args.to_vec())),
            1 if args.len() == 1 => Ok(InputSpec::Directory(args[0].clone())),
            _ => Err(PressError::MixedInputs),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, InputSpec::Directory(_))
    }
}

/// Flat, ordered list of input files plus the resolved root used for
/// relative-path computation. Built once per run, read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    pub root: Option<PathBuf>,
}

/// Resolve the input specification into concrete files.
///
/// Loose files are kept in argument order and `recursive` is demoted with
/// a warning. A directory is enumerated depth-first in file-name order so
/// a fixed filesystem state always yields the same plan; symbolic links
/// are followed, and a link loop is reported and skipped rather than
/// aborting the run.
pub fn plan(inputs: &InputSpec, recursive: bool) -> Result<ScanResult> {
    match inputs {
        InputSpec::Files(files) => {
            if recursive {
                warn!("--recursive has no effect on file inputs");
            }
            Ok(ScanResult {
                files: files.clone(),
                root: None,
            })
        }
        InputSpec::Directory(root) => {
            let root = root
                .canonicalize()
                .map_err(|_| PressError::CannotOpen(root.clone()))?;
            if !root.is_dir() {
                return Err(PressError::NotADirectory(root));
            }

            let mut walker = WalkDir::new(&root)
                .follow_links(true)
                .sort_by_file_name();
            if !recursive {
                walker = walker.max_depth(1);
            }

            let mut files = Vec::new();
            for entry in walker {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!("skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                let path = entry.path();
                if entry.file_type().is_file() && is_image_file(path) {
                    files.push(path.to_path_buf());
                }
            }

            Ok(ScanResult {
                files,
                root: Some(root),
            })
        }
    }
}

/// Extension-based filter applied while scanning a directory. Explicitly
/// listed files bypass this and fail per-file instead.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tiff" | "gif"
            )
        })
        .unwrap_or(false)
}

fn read_first_bytes(path: &Path, count: usize) -> Option<Vec<u8>> {
    let mut file = File::open(path).ok()?;
    let mut buffer = vec![0; count];
    match file.read_exact(&mut buffer) {
        Ok(_) => Some(buffer),
        Err(_) => None,
    }
}

/// Magic-byte check used by the compression dispatch; extensions lie.
pub fn is_jpeg_file(path: &Path) -> bool {
    match read_first_bytes(path, 16) {
        Some(buffer) => infer::image::is_jpeg(&buffer),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        File::create(path).unwrap().write_all(b"x").unwrap();
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("test.jpg")));
        assert!(is_image_file(Path::new("test.JPEG")));
        assert!(is_image_file(Path::new("test.png")));
        assert!(is_image_file(Path::new("test.webp")));
        assert!(!is_image_file(Path::new("test.txt")));
        assert!(!is_image_file(Path::new("test")));
    }

    #[test]
    fn test_input_spec_rejects_empty() {
        let result = InputSpec::from_args(&[]);
        assert!(matches!(result, Err(PressError::NoInputFiles)));
    }

    #[test]
    fn test_input_spec_rejects_mixed_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.jpg");
        touch(&file);

        let args = vec![temp_dir.path().to_path_buf(), file];
        let result = InputSpec::from_args(&args);
        assert!(matches!(result, Err(PressError::MixedInputs)));
    }

    #[test]
    fn test_input_spec_single_directory() {
        let temp_dir = TempDir::new().unwrap();
        let spec = InputSpec::from_args(&[temp_dir.path().to_path_buf()]).unwrap();
        assert!(spec.is_directory());
    }

    #[test]
    fn test_plan_keeps_file_argument_order() {
        let temp_dir = TempDir::new().unwrap();
        let b = temp_dir.path().join("b.jpg");
        let a = temp_dir.path().join("a.jpg");
        touch(&b);
        touch(&a);

        let spec = InputSpec::Files(vec![b.clone(), a.clone()]);
        let result = plan(&spec, false).unwrap();
        assert_eq!(result.files, vec![b, a]);
        assert!(result.root.is_none());
    }

    #[test]
    fn test_plan_directory_non_recursive_skips_subdirs() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&temp_dir.path().join("a.jpg"));
        touch(&sub.join("b.jpg"));

        let spec = InputSpec::Directory(temp_dir.path().to_path_buf());
        let result = plan(&spec, false).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].file_name().unwrap(), "a.jpg");
        assert!(result.root.is_some());
    }

    #[test]
    fn test_plan_directory_recursive_descends() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&temp_dir.path().join("a.jpg"));
        touch(&sub.join("b.jpg"));
        touch(&sub.join("notes.txt"));

        let spec = InputSpec::Directory(temp_dir.path().to_path_buf());
        let result = plan(&spec, true).unwrap();
        let names: Vec<_> = result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_plan_directory_order_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("c.jpg"));
        touch(&temp_dir.path().join("a.jpg"));
        touch(&temp_dir.path().join("b.jpg"));

        let spec = InputSpec::Directory(temp_dir.path().to_path_buf());
        let first = plan(&spec, false).unwrap();
        let second = plan(&spec, false).unwrap();
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn test_plan_missing_root_fails() {
        let spec = InputSpec::Directory(PathBuf::from("/nonexistent/root"));
        let result = plan(&spec, true);
        assert!(matches!(result, Err(PressError::CannotOpen(_))));
    }

    #[test]
    fn test_is_jpeg_file_rejects_fake_data() {
        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("fake.jpg");
        File::create(&fake)
            .unwrap()
            .write_all(b"definitely not a jpeg....")
            .unwrap();
        assert!(!is_jpeg_file(&fake));
    }
}
