use clap::Parser;
use img_press::cli::Args;
use img_press::compress::{CompressionParameters, ImageCompressor};
use img_press::error::{PressError, Result};
use img_press::{batch, error, info, logger, outpath, scan, utils};
use std::fs;
use std::process;

fn main() {
    let args = Args::parse();
    logger::set_quiet_mode(args.quiet);
    logger::set_verbose_mode(args.verbose);

    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(e.exit_code());
    }
}

fn run(args: Args) -> Result<()> {
    let params = CompressionParameters::new(args.quality, args.keep_metadata)?;
    let inputs = scan::InputSpec::from_args(&args.files)?;
    let (recursive, keep_structure) = outpath::normalize_flags(
        args.recursive,
        args.keep_structure,
        inputs.is_directory(),
        args.files.len(),
    );

    let spinner = utils::collection_spinner(args.quiet);
    let plan = scan::plan(&inputs, recursive)?;
    spinner.finish_and_clear();

    if let Some(root) = &plan.root {
        outpath::check_not_nested(&args.output, root, recursive)?;
    }
    // A dry run reports destinations only; it must not touch the disk.
    if !args.dry_run {
        fs::create_dir_all(&args.output)
            .map_err(|_| PressError::DirectoryCreationFailed(args.output.clone()))?;
    }

    if plan.files.is_empty() {
        info!("No files to compress.");
        return Ok(());
    }

    let config = batch::RunConfig {
        output_root: args.output,
        keep_structure,
        policy: args.overwrite,
        dry_run: args.dry_run,
    };
    let stats = batch::run(&plan, &config, &params, &ImageCompressor);
    batch::print_summary(&stats, config.dry_run);
    Ok(())
}
