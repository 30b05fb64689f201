use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;

use bench_image_reorg::ReorgConfig;
use bench_image_reorg::logging;
use bench_image_reorg::materialize::MaterializeMode;
use bench_image_reorg::placement::ImageKind;
use bench_image_reorg::reorganize::{BatchOptions, FuzzyMode, MatchStrategy, run_batch};
use bench_image_reorg::report::{render_dir_report, render_structure, render_summary};
use bench_image_reorg::rules::{Overrides, RunRules};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MatchByArg {
    #[value(name = "prompt")]
    Prompt,
    #[value(name = "index")]
    Index,
}

impl From<MatchByArg> for MatchStrategy {
    fn from(value: MatchByArg) -> Self {
        match value {
            MatchByArg::Prompt => MatchStrategy::Prompt,
            MatchByArg::Index => MatchStrategy::Index,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FuzzyArg {
    #[value(name = "auto")]
    Auto,
    #[value(name = "on")]
    On,
    #[value(name = "off")]
    Off,
}

impl From<FuzzyArg> for FuzzyMode {
    fn from(value: FuzzyArg) -> Self {
        match value {
            FuzzyArg::Auto => FuzzyMode::Auto,
            FuzzyArg::On => FuzzyMode::On,
            FuzzyArg::Off => FuzzyMode::Off,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "reorganize",
    about = "Reorganize generated benchmark images by prompt or index matching",
    version
)]
struct Cli {
    /// Source directories containing sample_XXXXX folders
    #[arg(long = "source-dirs", num_args = 1.., required = true)]
    source_dirs: Vec<PathBuf>,

    /// Output directory for reorganized images
    #[arg(long = "output-dir")]
    output_dir: PathBuf,

    /// Directory containing the benchmark CSV manifests
    #[arg(long = "benchmark-dir", default_value = ".")]
    benchmark_dir: PathBuf,

    /// Copy files instead of creating symlinks
    #[arg(long)]
    copy: bool,

    /// Override the model name inferred from the directory name
    #[arg(long = "model-name")]
    model_name: Option<String>,

    /// Override the checkpoint inferred from the directory name
    #[arg(long)]
    checkpoint: Option<String>,

    /// Mark the images as grids (output to 'grids' instead of 'non-grids')
    #[arg(long)]
    grid: bool,

    /// How samples are paired with manifest rows
    #[arg(long = "match-by", value_enum, default_value = "prompt")]
    match_by: MatchByArg,

    /// Containment matching for expanded prompts; `auto` follows the rules
    #[arg(long, value_enum, default_value = "auto")]
    fuzzy: FuzzyArg,

    /// JSON file replacing the built-in directory-name rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let rules = match &cli.rules {
        Some(path) => RunRules::load(path)?,
        None => RunRules::default(),
    };
    let config = ReorgConfig::default();
    let strategy = MatchStrategy::from(cli.match_by);
    let mode = MaterializeMode::from_copy_flag(cli.copy);
    let image_kind = ImageKind::from_grid_flag(cli.grid);

    let options = BatchOptions {
        output_dir: cli.output_dir.clone(),
        benchmark_dir: cli.benchmark_dir.clone(),
        mode,
        image_kind,
        strategy,
        fuzzy: cli.fuzzy.into(),
        overrides: Overrides {
            model_name: cli.model_name.clone(),
            checkpoint: cli.checkpoint.clone(),
        },
    };

    println!("Output directory: {}", options.output_dir.display());
    println!("Image type: {image_kind}");
    println!(
        "Using {}",
        match mode {
            MaterializeMode::Copy => "copies",
            MaterializeMode::Symlink => "symlinks",
        }
    );
    println!("Processing {} source directories", cli.source_dirs.len());

    let summary = run_batch(&cli.source_dirs, &options, &rules, &config)?;

    for report in &summary.reports {
        println!("\n{}", report.source.display());
        print!("{}", render_dir_report(report, strategy));
    }
    print!("{}", render_summary(&summary, &options.output_dir, mode, strategy));
    print!(
        "{}",
        render_structure(&options.output_dir, &config.destination_extension)
    );

    Ok(())
}
