pub mod batch;
pub mod cli;
pub mod commit;
pub mod compress;
pub mod error;
pub mod logger;
pub mod lossless;
pub mod outpath;
pub mod scan;
pub mod utils;

pub use batch::{run, RunConfig, RunStatistics};
pub use commit::{commit, Outcome, OverwritePolicy};
pub use compress::{CompressionParameters, Compressor, ImageCompressor};
pub use error::{PressError, Result, TranscodeError};
pub use lossless::transcode;
pub use outpath::{check_not_nested, normalize_flags, resolve};
pub use scan::{is_image_file, is_jpeg_file, plan, InputSpec, ScanResult};
pub use utils::{calculate_compression_ratio, format_file_size};
