//! Operator-facing text: per-directory results, batch totals and the final
//! output tree.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use bytesize::ByteSize;
use walkdir::WalkDir;

use crate::materialize::MaterializeMode;
use crate::reorganize::{BatchSummary, DirReport, DirStats, MatchStrategy};

const RULE: &str = "================================================================================";

fn unmatched_label(strategy: MatchStrategy) -> &'static str {
    match strategy {
        MatchStrategy::Prompt => "Unmatched prompts",
        MatchStrategy::Index => "Extra samples",
    }
}

fn unmatched_count(stats: &DirStats, strategy: MatchStrategy) -> usize {
    match strategy {
        MatchStrategy::Prompt => stats.unmatched,
        MatchStrategy::Index => stats.extra,
    }
}

pub fn render_dir_report(report: &DirReport, strategy: MatchStrategy) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    if !stats.unmatched_samples.is_empty() {
        let _ = writeln!(
            out,
            "\n  Discarded {} samples with no matching prompt:",
            stats.unmatched_samples.len()
        );
        for sample in &stats.unmatched_samples {
            let _ = writeln!(out, "    - {}: {}...", sample.name, sample.preview);
        }
    }

    let _ = writeln!(out, "\n  Results for {}:", report.metadata.model_name);
    let _ = writeln!(out, "    Created: {}", stats.created);
    let _ = writeln!(out, "    Skipped: {}", stats.skipped);
    let _ = writeln!(
        out,
        "    {}: {}",
        unmatched_label(strategy),
        unmatched_count(stats, strategy)
    );
    out
}

pub fn render_summary(
    summary: &BatchSummary,
    output_dir: &Path,
    mode: MaterializeMode,
    strategy: MatchStrategy,
) -> String {
    let totals = summary.totals();
    let mut out = String::new();

    let _ = writeln!(out, "\n{RULE}\nSUMMARY\n{RULE}");
    let _ = writeln!(out, "Total created: {}", totals.created);
    let _ = writeln!(out, "Total skipped: {}", totals.skipped);
    let _ = writeln!(
        out,
        "Total {}: {}",
        unmatched_label(strategy).to_lowercase(),
        unmatched_count(&totals, strategy)
    );
    if mode == MaterializeMode::Copy {
        let _ = writeln!(out, "Total copied: {}", ByteSize::b(totals.bytes_copied));
    }
    if !summary.skipped_dirs.is_empty() {
        let _ = writeln!(out, "Skipped source directories: {}", summary.skipped_dirs.len());
        for (dir, reason) in &summary.skipped_dirs {
            let _ = writeln!(out, "  - {}: {reason}", dir.display());
        }
    }
    let _ = writeln!(out, "\nReorganized images in: {}", output_dir.display());
    out
}

/// Indented listing of every directory under `root`. Directories holding
/// `*.<extension>` entries show their count instead of a trailing slash.
pub fn render_structure(root: &Path, extension: &str) -> String {
    let mut out = String::from("\nFinal structure:\n");
    if !root.is_dir() {
        return out;
    }

    let dirs = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir());

    for entry in dirs {
        let indent = "  ".repeat(entry.depth());
        let name = entry.file_name().to_string_lossy();
        let count = count_entries(entry.path(), extension);
        if count > 0 {
            let _ = writeln!(out, "{indent}{name}: {count} images");
        } else {
            let _ = writeln!(out, "{indent}{name}/");
        }
    }
    out
}

fn count_entries(dir: &Path, extension: &str) -> usize {
    let Ok(read) = fs::read_dir(dir) else {
        return 0;
    };
    read.filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(extension))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Language;
    use crate::reorganize::UnmatchedSample;
    use crate::rules::RunMetadata;
    use std::path::PathBuf;

    fn report(stats: DirStats) -> DirReport {
        DirReport {
            source: PathBuf::from("run_ckpt=1"),
            metadata: RunMetadata {
                model_name: "omni".into(),
                checkpoint: "1".into(),
                language: Language::En,
                manifest_file: "OneIG-Bench.csv".into(),
                fuzzy: false,
            },
            stats,
        }
    }

    #[test]
    fn unmatched_samples_are_listed_for_prompt_runs() {
        let stats = DirStats {
            created: 2,
            unmatched: 1,
            unmatched_samples: vec![UnmatchedSample {
                name: "sample_3".into(),
                preview: "a blue whale".into(),
            }],
            ..DirStats::default()
        };
        let text = render_dir_report(&report(stats), MatchStrategy::Prompt);
        assert!(text.contains("    - sample_3: a blue whale..."));
        assert!(text.contains("Created: 2"));
        assert!(text.contains("Unmatched prompts: 1"));
    }

    #[test]
    fn summary_sums_directories_and_reports_bytes_in_copy_mode() {
        let summary = BatchSummary {
            reports: vec![
                report(DirStats {
                    created: 1,
                    extra: 2,
                    bytes_copied: 1024,
                    ..DirStats::default()
                }),
                report(DirStats {
                    created: 3,
                    skipped: 1,
                    bytes_copied: 1024,
                    ..DirStats::default()
                }),
            ],
            skipped_dirs: vec![(
                PathBuf::from("gone"),
                "source directory not found: gone".into(),
            )],
        };
        let text = render_summary(
            &summary,
            Path::new("out"),
            MaterializeMode::Copy,
            MatchStrategy::Index,
        );
        assert!(text.contains("Total created: 4"));
        assert!(text.contains("Total skipped: 1"));
        assert!(text.contains("Total extra samples: 2"));
        assert!(text.contains("Total copied:"));
        assert!(text.contains("  - gone: source directory not found: gone"));
    }

    #[test]
    fn structure_counts_images_per_leaf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let leaf = dir.path().join("omni/non-grids/1/en/human");
        fs::create_dir_all(&leaf).expect("mkdir");
        fs::write(leaf.join("001.webp"), b"").expect("write");
        fs::write(leaf.join("002.webp"), b"").expect("write");
        fs::write(leaf.join("notes.txt"), b"").expect("write");

        let text = render_structure(dir.path(), "webp");
        assert!(text.contains("  omni/\n    non-grids/\n"));
        assert!(text.contains("          human: 2 images"));
    }
}
