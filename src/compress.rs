use crate::error::{PressError, Result};
use crate::lossless;
use crate::scan::is_jpeg_file;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Per-run compression settings. Owned by the run and passed by
/// reference to each file operation, never mutated mid-run.
#[derive(Debug, Clone)]
pub struct CompressionParameters {
    /// 0 selects the lossless path; 1-100 is the lossy quality.
    pub quality: u8,
    pub keep_metadata: bool,
}

impl CompressionParameters {
    pub fn new(quality: u8, keep_metadata: bool) -> Result<Self> {
        if quality > 100 {
            return Err(PressError::InvalidQuality(quality));
        }
        Ok(Self {
            quality,
            keep_metadata,
        })
    }

    pub fn is_lossless(&self) -> bool {
        self.quality == 0
    }
}

/// The per-file compression capability the orchestrator drives. The
/// batch loop only needs paths in, an output file out.
pub trait Compressor {
    fn compress(&self, input: &Path, output: &Path, params: &CompressionParameters) -> Result<()>;
}

/// Default implementation: lossless coefficient transcode for quality 0,
/// otherwise a pixel re-encode at the requested quality followed by the
/// same lossless optimize pass, with the original input acting as the
/// metadata donor for the freshly encoded file.
pub struct ImageCompressor;

impl Compressor for ImageCompressor {
    fn compress(&self, input: &Path, output: &Path, params: &CompressionParameters) -> Result<()> {
        if !is_jpeg_file(input) {
            return Err(PressError::UnsupportedFormat(input.to_path_buf()));
        }

        if params.is_lossless() {
            lossless::transcode(input, output, params.keep_metadata, input)?;
            return Ok(());
        }

        let img = image::ImageReader::open(input)?.decode()?;
        // Encode fully in memory so the optimize pass reads a complete
        // file from disk, never a partially flushed one.
        let mut encoded = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut encoded), params.quality)
            .encode_image(&img)?;
        fs::write(output, &encoded)?;

        // The re-encode stripped the source markers; the optimize pass
        // restores them from the original file.
        lossless::transcode(output, output, params.keep_metadata, input)?;
        Ok(())
    }
}
