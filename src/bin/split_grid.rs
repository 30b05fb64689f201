use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use bench_image_reorg::grid::{GridShape, split_grid};
use bench_image_reorg::logging;

#[derive(Parser, Debug)]
#[command(
    name = "split_grid",
    about = "Split a composite grid image into its non-black sub-images",
    version
)]
struct Cli {
    /// Composite image to split
    image: PathBuf,

    /// Grid layout as <columns>x<rows>
    #[arg(long, short = 'g', default_value = "2x2")]
    grid: GridShape,

    /// Directory the tiles are written to
    #[arg(long = "scratch-dir", short = 'o')]
    scratch_dir: PathBuf,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, None)?;

    if !cli.image.is_file() {
        return Err(format!("Not a file: {}", cli.image.display()).into());
    }

    let written = split_grid(&cli.image, cli.grid, &cli.scratch_dir)?;
    if written.is_empty() {
        eprintln!("Every tile of {} is black, nothing written", cli.image.display());
    }
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
