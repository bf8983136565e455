use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of the lossless JPEG transcoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("cannot open input file {0}: {1}")]
    CannotOpenInput(PathBuf, std::io::Error),

    #[error("cannot open output file {0}: {1}")]
    CannotOpenOutput(PathBuf, std::io::Error),

    #[error("unsupported or corrupt JPEG stream: {0}")]
    UnsupportedFormat(String),

    #[error("failed to carry over encoding parameters: {0}")]
    HeaderParity(String),
}

#[derive(Debug, Error)]
pub enum PressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("lossless transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("no input files")]
    NoInputFiles,

    #[error("cannot mix a directory with loose input files")]
    MixedInputs,

    #[error("cannot open input root: {0}")]
    CannotOpen(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("output folder {output} is nested inside the input folder {input}")]
    OutputNestedInInput { output: PathBuf, input: PathBuf },

    #[error("failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),
}

impl PressError {
    /// Exit code for fatal configuration errors, reported before any file
    /// is processed. Per-file errors never reach the process exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            PressError::InvalidQuality(_) => 1,
            PressError::NoInputFiles => 2,
            PressError::MixedInputs => 3,
            PressError::CannotOpen(_) | PressError::NotADirectory(_) => 4,
            PressError::OutputNestedInInput { .. } => 5,
            PressError::DirectoryCreationFailed(_) => 6,
            _ => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, PressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_have_distinct_exit_codes() {
        let errors = [
            PressError::InvalidQuality(120),
            PressError::NoInputFiles,
            PressError::MixedInputs,
            PressError::CannotOpen(PathBuf::from("/x")),
            PressError::OutputNestedInInput {
                output: PathBuf::from("/a/b"),
                input: PathBuf::from("/a"),
            },
            PressError::DirectoryCreationFailed(PathBuf::from("/out")),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 6);
    }

    #[test]
    fn test_not_a_directory_shares_open_failure_code() {
        assert_eq!(
            PressError::NotADirectory(PathBuf::from("/x")).exit_code(),
            PressError::CannotOpen(PathBuf::from("/x")).exit_code()
        );
    }
}
