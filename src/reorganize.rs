//! Per-directory and batch reorganization.

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::config::ReorgConfig;
use crate::error::{ReorgError, Result};
use crate::manifest::{self, BenchmarkRecord};
use crate::matcher::{self, MatchOutcome, MissingFile, Sample};
use crate::materialize::{self, MaterializeMode};
use crate::placement::{self, Category, ImageKind, PlacementKey};
use crate::rules::{Overrides, RunMetadata, RunRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Match `prompt.txt` against the manifest prompts.
    #[default]
    Prompt,
    /// The Nth sample directory is the Nth manifest row.
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuzzyMode {
    /// On for the models listed in the rules' `fuzzy_models`.
    #[default]
    Auto,
    On,
    Off,
}

impl FuzzyMode {
    pub fn resolve(self, inferred: bool) -> bool {
        match self {
            FuzzyMode::Auto => inferred,
            FuzzyMode::On => true,
            FuzzyMode::Off => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedSample {
    pub name: String,
    pub preview: String,
}

/// Counters for one source directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirStats {
    pub created: usize,
    /// Missing input files, unknown categories and occupied destinations.
    pub skipped: usize,
    /// Prompt strategy: samples whose transcript matched nothing.
    pub unmatched: usize,
    /// Index strategy: samples past the end of the manifest.
    pub extra: usize,
    pub bytes_copied: u64,
    pub unmatched_samples: Vec<UnmatchedSample>,
}

impl DirStats {
    fn add(&mut self, other: &DirStats) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.unmatched += other.unmatched;
        self.extra += other.extra;
        self.bytes_copied += other.bytes_copied;
    }
}

/// Settings shared by every source directory of a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub benchmark_dir: PathBuf,
    pub mode: MaterializeMode,
    pub image_kind: ImageKind,
    pub strategy: MatchStrategy,
    pub fuzzy: FuzzyMode,
    pub overrides: Overrides,
}

#[derive(Debug, Clone)]
pub struct DirReport {
    pub source: PathBuf,
    pub metadata: RunMetadata,
    pub stats: DirStats,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<DirReport>,
    /// Directories skipped entirely, with the reason.
    pub skipped_dirs: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn totals(&self) -> DirStats {
        let mut totals = DirStats::default();
        for report in &self.reports {
            totals.add(&report.stats);
        }
        totals
    }
}

/// Outcome of materializing one matched sample.
enum Placed {
    Created(u64),
    Skipped,
}

/// Resolves the category, then materializes at the path `destination`
/// builds. Unknown categories and occupied destinations are skips; every
/// other error aborts the run.
fn place(
    image: &Path,
    record: &BenchmarkRecord,
    mode: MaterializeMode,
    destination: impl FnOnce(Category) -> PathBuf,
) -> Result<Placed> {
    let category = match Category::resolve(&record.category, &record.id) {
        Ok(category) => category,
        Err(e) => {
            warn!("{e}");
            return Ok(Placed::Skipped);
        }
    };
    match materialize::materialize(image, &destination(category), mode) {
        Ok(outcome) => Ok(Placed::Created(outcome.bytes_copied)),
        Err(e @ ReorgError::DestinationOccupied(_)) => {
            warn!("{e}, skipping ID {}", record.id);
            Ok(Placed::Skipped)
        }
        Err(e) => Err(e),
    }
}

fn record_placement(stats: &mut DirStats, placed: Placed) {
    match placed {
        Placed::Created(bytes) => {
            stats.created += 1;
            stats.bytes_copied += bytes;
        }
        Placed::Skipped => stats.skipped += 1,
    }
}

fn log_missing(sample: &Sample, missing: MissingFile, config: &ReorgConfig) {
    let file = match missing {
        MissingFile::Image => &config.image_file,
        MissingFile::Prompt => &config.prompt_file,
    };
    warn!("No {file} in {}", sample.name);
}

fn log_progress(done: usize, total: usize, config: &ReorgConfig) {
    if config.progress_every > 0 && done % config.progress_every == 0 {
        info!("Processed {done}/{total} samples...");
    }
}

/// Places every sample of `source` by prompt matching under
/// `<output_dir>/<model>/<kind>/<checkpoint>/<language>/<category>/`.
pub fn reorganize_by_prompt(
    source: &Path,
    output_dir: &Path,
    manifest_path: &Path,
    key: &PlacementKey,
    fuzzy: bool,
    mode: MaterializeMode,
    config: &ReorgConfig,
) -> Result<DirStats> {
    let index = manifest::load_prompt_index(manifest_path)?;
    info!("Loaded {} prompts from {}", index.len(), manifest_path.display());
    if fuzzy {
        info!("Using fuzzy matching (for expanded prompts)");
    }

    let samples = matcher::discover_samples(source, &config.sample_prefix)?;
    info!("Found {} sample directories", samples.len());

    let mut stats = DirStats::default();
    for sample in &samples {
        match matcher::match_by_prompt(sample, &index, fuzzy, config)? {
            MatchOutcome::Matched(record) => {
                let placed = place(&sample.image_path(config), &record, mode, |category| {
                    placement::prompt_destination(
                        output_dir,
                        key,
                        category,
                        &record.id,
                        &config.destination_extension,
                    )
                })?;
                record_placement(&mut stats, placed);
            }
            MatchOutcome::Unmatched { preview } => {
                debug!("{}: no manifest prompt matches", sample.name);
                stats.unmatched += 1;
                stats.unmatched_samples.push(UnmatchedSample {
                    name: sample.name.clone(),
                    preview,
                });
            }
            MatchOutcome::MissingInput(missing) => {
                log_missing(sample, missing, config);
                stats.skipped += 1;
            }
            MatchOutcome::OutOfRange => stats.extra += 1,
        }
        log_progress(sample.position + 1, samples.len(), config);
    }
    Ok(stats)
}

/// Places every sample of `source` by position under
/// `<output_dir>/<category>/<model>/`.
pub fn reorganize_by_index(
    source: &Path,
    output_dir: &Path,
    manifest_path: &Path,
    model_name: &str,
    mode: MaterializeMode,
    config: &ReorgConfig,
) -> Result<DirStats> {
    let records = manifest::load_records(manifest_path)?;
    info!("Loaded {} records from {}", records.len(), manifest_path.display());

    let samples = matcher::discover_samples(source, &config.sample_prefix)?;
    info!("Found {} sample directories", samples.len());

    let mut stats = DirStats::default();
    for sample in &samples {
        match matcher::match_by_index(sample, &records, config) {
            MatchOutcome::Matched(record) => {
                let placed = place(&sample.image_path(config), &record, mode, |category| {
                    placement::index_destination(
                        output_dir,
                        model_name,
                        category,
                        &record.id,
                        &config.destination_extension,
                    )
                })?;
                record_placement(&mut stats, placed);
            }
            MatchOutcome::MissingInput(missing) => {
                log_missing(sample, missing, config);
                stats.skipped += 1;
            }
            MatchOutcome::OutOfRange => stats.extra += 1,
            MatchOutcome::Unmatched { .. } => stats.unmatched += 1,
        }
        log_progress(sample.position + 1, samples.len(), config);
    }
    if stats.extra > 0 {
        info!(
            "{} samples beyond the {} manifest records",
            stats.extra,
            records.len()
        );
    }
    Ok(stats)
}

fn dir_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}

/// Reorganizes each source directory in turn.
///
/// A missing source directory or manifest is logged and recorded in
/// [`BatchSummary::skipped_dirs`]; the batch continues. Filesystem errors
/// while placing samples abort the batch.
pub fn run_batch(
    sources: &[PathBuf],
    options: &BatchOptions,
    rules: &RunRules,
    config: &ReorgConfig,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for source in sources {
        let name = dir_name(source);
        info!("Processing: {name}");

        let mut metadata = rules.infer(&name, &options.overrides)?;
        metadata.fuzzy = options.fuzzy.resolve(metadata.fuzzy);
        let manifest_path = options.benchmark_dir.join(&metadata.manifest_file);

        info!("  Model name: {}", metadata.model_name);
        info!("  Checkpoint: {}", metadata.checkpoint);
        info!("  Language: {}", metadata.language);
        info!("  Image type: {}", options.image_kind);
        info!("  Fuzzy matching: {}", metadata.fuzzy);
        info!("  Benchmark: {}", metadata.manifest_file);

        let result = if !manifest_path.is_file() {
            Err(ReorgError::ManifestNotFound(manifest_path.clone()))
        } else if !source.is_dir() {
            Err(ReorgError::SourceNotFound(source.clone()))
        } else {
            match options.strategy {
                MatchStrategy::Prompt => {
                    let key = PlacementKey {
                        model_name: metadata.model_name.clone(),
                        image_kind: options.image_kind,
                        checkpoint: metadata.checkpoint.clone(),
                        language: metadata.language,
                    };
                    reorganize_by_prompt(
                        source,
                        &options.output_dir,
                        &manifest_path,
                        &key,
                        metadata.fuzzy,
                        options.mode,
                        config,
                    )
                }
                MatchStrategy::Index => reorganize_by_index(
                    source,
                    &options.output_dir,
                    &manifest_path,
                    &metadata.model_name,
                    options.mode,
                    config,
                ),
            }
        };

        match result {
            Ok(stats) => summary.reports.push(DirReport {
                source: source.clone(),
                metadata,
                stats,
            }),
            Err(e) if e.is_recoverable() => {
                error!("{e}");
                summary.skipped_dirs.push((source.clone(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}
