use crate::commit::OverwritePolicy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-press",
    about = "A lossless-first batch JPEG compression tool",
    long_about = "img-press recompresses JPEG files in batch. At the default quality of 0 \
                  it performs a fully lossless optimization pass (progressive re-encoding \
                  with optimized entropy coding, identical pixels guaranteed); at 1-100 it \
                  re-encodes the pixels at the requested quality first.",
    version,
    after_help = "EXAMPLES:\n  \
    img-press -o ./compressed photo1.jpg photo2.jpg\n  \
    img-press -o ./compressed -R -S ./photos\n  \
    img-press -o ./compressed -q 80 -e ./photos\n  \
    img-press -o ./compressed --dry-run -R ./photos"
)]
pub struct Args {
    #[arg(
        short = 'q',
        long,
        default_value_t = 0,
        help = "Compression quality (0-100, default: 0)",
        long_help = "Quality from 1 (lowest) to 100 (highest). \
                     0 selects lossless optimization: the image is rewritten as a \
                     progressive JPEG with optimized Huffman tables and byte-identical pixels."
    )]
    pub quality: u8,

    #[arg(
        short = 'e',
        long = "exif",
        help = "Keep EXIF and other metadata markers",
        long_help = "Carry the input's metadata markers (EXIF, ICC, XMP, comments) over to \
                     the output. Without this flag all ancillary markers are dropped."
    )]
    pub keep_metadata: bool,

    #[arg(short = 'o', long, help = "Output folder")]
    pub output: PathBuf,

    #[arg(
        short = 'R',
        long,
        help = "Scan subfolders when the input is a folder",
        long_help = "When the input is a folder, descend into its subfolders instead of \
                     processing only the top level. Has no effect on file inputs."
    )]
    pub recursive: bool,

    #[arg(
        short = 'S',
        long,
        help = "Mirror the input folder structure, use with -R",
        long_help = "Re-create each file's path relative to the scanned folder under the \
                     output folder instead of flattening everything into it."
    )]
    pub keep_structure: bool,

    #[arg(
        short = 'O',
        long,
        value_enum,
        default_value = "bigger",
        help = "Overwrite policy for existing output files",
        long_help = "What to do when the destination file already exists: \
                     'none' never overwrites, 'prompt' asks, 'bigger' overwrites only \
                     when the new file is smaller, 'all' always overwrites."
    )]
    pub overwrite: OverwritePolicy,

    #[arg(
        short = 'd',
        long,
        help = "Show output paths without compressing anything"
    )]
    pub dry_run: bool,

    #[arg(short = 'Q', long, help = "Suppress all console output")]
    pub quiet: bool,

    #[arg(long, help = "Print per-file size details")]
    pub verbose: bool,

    #[arg(
        help = "Input files, or a single folder",
        long_help = "Either a list of files or exactly one folder. A folder cannot be \
                     mixed with loose files."
    )]
    pub files: Vec<PathBuf>,
}
