//! Lossless JPEG transcoding.
//!
//! The input's quantized DCT coefficients are read without any inverse
//! transform, then written back through a fresh encoder configured for
//! optimized Huffman tables and a progressive scan layout. Pixel data is
//! never reconstructed, so the output decodes to exactly the same samples
//! as the input while usually shrinking by a few percent.

use crate::error::TranscodeError;
use mozjpeg_sys::*;
use std::cell::Cell;
use std::fs;
use std::mem;
use std::os::raw::{c_int, c_ulong};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::ptr;

const MARKER_COM: c_int = 0xFE;
const MARKER_APP0: c_int = 0xE0;
const MARKER_APP14: c_int = 0xEE;

/// One captured metadata segment.
#[derive(Debug, Clone)]
pub struct Marker {
    pub kind: u8,
    pub payload: Vec<u8>,
}

impl Marker {
    /// Segments the encoder regenerates itself and that must not be
    /// duplicated from the source: the JFIF identification APP0 and the
    /// Adobe colorspace-transform APP14.
    fn is_redundant(&self) -> bool {
        (self.kind as c_int == MARKER_APP0 && self.payload.starts_with(b"JFIF\0"))
            || (self.kind as c_int == MARKER_APP14 && self.payload.starts_with(b"Adobe"))
    }
}

/// Ordered metadata segments captured from one source file's header.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    /// Copy the saved-marker chain out of a decompressor into owned
    /// storage, so the set outlives the codec session.
    unsafe fn capture(src: &jpeg_decompress_struct) -> Self {
        let mut markers = Vec::new();
        let mut node = src.marker_list;
        while !node.is_null() {
            let payload = if (*node).data.is_null() {
                Vec::new()
            } else {
                std::slice::from_raw_parts((*node).data, (*node).data_length as usize).to_vec()
            };
            markers.push(Marker {
                kind: (*node).marker,
                payload,
            });
            node = (*node).next;
        }
        MarkerSet { markers }
    }

    /// Replay the preserved segments into the new container, suppressing
    /// the ones the encoder already wrote.
    unsafe fn write_to(&self, dst: &mut jpeg_compress_struct) {
        for marker in self.markers.iter().filter(|m| !m.is_redundant()) {
            jpeg_write_marker(
                dst,
                marker.kind as c_int,
                marker.payload.as_ptr(),
                marker.payload.len() as u32,
            );
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Losslessly re-encode `input` into `output` as an optimized progressive
/// JPEG. With `keep_metadata` the APPn/COM segments of `metadata_donor`
/// (usually `input` itself) are carried over.
///
/// The function writes exactly to `output` and never renames over other
/// paths; callers that need atomic replacement route it through the
/// collision resolver's temp-path discipline.
pub fn transcode(
    input: &Path,
    output: &Path,
    keep_metadata: bool,
    metadata_donor: &Path,
) -> Result<(), TranscodeError> {
    let in_buffer = fs::read(input)
        .map_err(|e| TranscodeError::CannotOpenInput(input.to_path_buf(), e))?;

    // A donor different from the input needs its own header-only pass.
    let donor_markers = if keep_metadata && metadata_donor != input {
        let donor_buffer = fs::read(metadata_donor)
            .map_err(|e| TranscodeError::CannotOpenInput(metadata_donor.to_path_buf(), e))?;
        Some(read_marker_set(&donor_buffer)?)
    } else {
        None
    };

    let out_buffer = transplant(&in_buffer, keep_metadata, donor_markers)?;

    fs::write(output, &out_buffer)
        .map_err(|e| TranscodeError::CannotOpenOutput(output.to_path_buf(), e))?;
    Ok(())
}

/// Header-only read of a donor file, capturing its metadata segments.
fn read_marker_set(buffer: &[u8]) -> Result<MarkerSet, TranscodeError> {
    catch_unwind(AssertUnwindSafe(|| unsafe {
        let mut src_err: jpeg_error_mgr = mem::zeroed();
        let mut src = DecompressGuard::new(&mut src_err);
        save_app_markers(src.inner());
        jpeg_mem_src(src.inner(), buffer.as_ptr(), buffer.len() as c_ulong);
        jpeg_read_header(src.inner(), true as boolean);
        MarkerSet::capture(src.inner())
    }))
    .map_err(|payload| TranscodeError::UnsupportedFormat(panic_message(payload)))
}

/// Coefficient transplant: decode headers and coefficients, copy the
/// critical encoding parameters, re-encode progressively.
fn transplant(
    in_buffer: &[u8],
    keep_metadata: bool,
    donor_markers: Option<MarkerSet>,
) -> Result<Vec<u8>, TranscodeError> {
    // Distinguishes a rejected input from a failed parameter carry-over
    // when the codec bails out.
    let header_done = Cell::new(false);

    catch_unwind(AssertUnwindSafe(|| unsafe {
        let mut src_err: jpeg_error_mgr = mem::zeroed();
        let mut dst_err: jpeg_error_mgr = mem::zeroed();
        let mut src = DecompressGuard::new(&mut src_err);
        let mut dst = CompressGuard::new(&mut dst_err);

        // Marker interest must be registered before the header scan or
        // the payloads are discarded during parsing.
        if keep_metadata {
            save_app_markers(src.inner());
        }
        jpeg_mem_src(src.inner(), in_buffer.as_ptr(), in_buffer.len() as c_ulong);
        jpeg_read_header(src.inner(), true as boolean);

        // Quantized frequency-domain blocks; no pixel reconstruction.
        let coef_arrays = jpeg_read_coefficients(src.inner());
        header_done.set(true);

        let own_markers = if keep_metadata && donor_markers.is_none() {
            Some(MarkerSet::capture(src.inner()))
        } else {
            None
        };

        // Sampling, quantization tables and dimensions carry over; the
        // entropy-coding arrangement deliberately does not.
        jpeg_copy_critical_parameters(src.inner(), dst.inner());
        (*dst.inner()).optimize_coding = true as boolean;
        jpeg_simple_progression(dst.inner());

        let mut dest = MemDest::default();
        jpeg_mem_dest(dst.inner(), &mut dest.buf, &mut dest.size);
        jpeg_write_coefficients(dst.inner(), coef_arrays);

        if let Some(markers) = donor_markers.as_ref().or(own_markers.as_ref()) {
            markers.write_to(dst.inner());
        }

        jpeg_finish_compress(dst.inner());
        jpeg_finish_decompress(src.inner());

        dest.to_vec()
    }))
    .map_err(|payload| {
        let message = panic_message(payload);
        if header_done.get() {
            TranscodeError::HeaderParity(message)
        } else {
            TranscodeError::UnsupportedFormat(message)
        }
    })
}

unsafe fn save_app_markers(src: &mut jpeg_decompress_struct) {
    jpeg_save_markers(src, MARKER_COM, 0xFFFF);
    for n in 0..16 {
        jpeg_save_markers(src, MARKER_APP0 + n, 0xFFFF);
    }
}

/// Decompressor with an unwinding error handler; destruction is
/// idempotent so the guard also covers the panic path.
struct DecompressGuard {
    info: jpeg_decompress_struct,
}

impl DecompressGuard {
    unsafe fn new(err: &mut jpeg_error_mgr) -> Self {
        let mut info: jpeg_decompress_struct = mem::zeroed();
        info.common.err = jpeg_std_error(err);
        (*info.common.err).error_exit = Some(unwinding_error_exit);
        jpeg_create_decompress(&mut info);
        DecompressGuard { info }
    }

    fn inner(&mut self) -> &mut jpeg_decompress_struct {
        &mut self.info
    }
}

impl Drop for DecompressGuard {
    fn drop(&mut self) {
        unsafe {
            jpeg_destroy_decompress(&mut self.info);
        }
    }
}

struct CompressGuard {
    info: jpeg_compress_struct,
}

impl CompressGuard {
    unsafe fn new(err: &mut jpeg_error_mgr) -> Self {
        let mut info: jpeg_compress_struct = mem::zeroed();
        info.common.err = jpeg_std_error(err);
        (*info.common.err).error_exit = Some(unwinding_error_exit);
        jpeg_create_compress(&mut info);
        CompressGuard { info }
    }

    fn inner(&mut self) -> &mut jpeg_compress_struct {
        &mut self.info
    }
}

impl Drop for CompressGuard {
    fn drop(&mut self) {
        unsafe {
            jpeg_destroy_compress(&mut self.info);
        }
    }
}

/// Output buffer owned by libjpeg's memory destination; freed here so the
/// panic path cannot leak it.
struct MemDest {
    buf: *mut u8,
    size: c_ulong,
}

impl Default for MemDest {
    fn default() -> Self {
        MemDest {
            buf: ptr::null_mut(),
            size: 0,
        }
    }
}

impl MemDest {
    unsafe fn to_vec(&self) -> Vec<u8> {
        if self.buf.is_null() {
            return Vec::new();
        }
        std::slice::from_raw_parts(self.buf, self.size as usize).to_vec()
    }
}

impl Drop for MemDest {
    fn drop(&mut self) {
        if !self.buf.is_null() {
            unsafe {
                libc::free(self.buf.cast());
            }
        }
    }
}

/// Error handler that unwinds into `catch_unwind` instead of letting
/// libjpeg terminate the process. Never returns normally.
unsafe extern "C-unwind" fn unwinding_error_exit(cinfo: &mut jpeg_common_struct) {
    panic!(
        "{}",
        formatted_message(cinfo).unwrap_or_else(|| "unknown JPEG codec error".to_string())
    );
}

unsafe fn formatted_message(cinfo: &mut jpeg_common_struct) -> Option<String> {
    let err = cinfo.err.as_ref()?;
    let format = err.format_message?;
    // JMSG_LENGTH_MAX in libjpeg.
    let mut buffer = [0u8; 80];
    format(cinfo, &mut buffer);
    let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    Some(String::from_utf8_lossy(&buffer[..len]).into_owned())
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown JPEG codec error".to_string()
    }
}
