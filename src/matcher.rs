//! Decides which benchmark record a generated sample belongs to.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ReorgConfig;
use crate::error::Result;
use crate::manifest::{BenchmarkRecord, PromptIndex};

/// One generated sample directory, e.g. `sample_00042/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: String,
    pub dir: PathBuf,
    /// 0-based position in the sorted directory listing.
    pub position: usize,
}

impl Sample {
    pub fn image_path(&self, config: &ReorgConfig) -> PathBuf {
        self.dir.join(&config.image_file)
    }

    pub fn prompt_path(&self, config: &ReorgConfig) -> PathBuf {
        self.dir.join(&config.prompt_file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFile {
    Image,
    Prompt,
}

/// Per-sample matching result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(BenchmarkRecord),
    /// No manifest prompt equals or is contained in the transcript.
    Unmatched { preview: String },
    MissingInput(MissingFile),
    /// The sample's position lies past the end of the manifest.
    OutOfRange,
}

/// Lists the child directories of `dir` whose names start with `prefix`,
/// sorted by name.
pub fn discover_samples(dir: &Path, prefix: &str) -> Result<Vec<Sample>> {
    let mut found: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?.to_string();
            name.starts_with(prefix).then_some((name, p))
        })
        .collect();
    found.sort();

    Ok(found
        .into_iter()
        .enumerate()
        .map(|(position, (name, dir))| Sample {
            name,
            dir,
            position,
        })
        .collect())
}

/// Looks `transcript` up in the index.
///
/// Exact lookup first. With `fuzzy`, falls back to the first manifest prompt
/// (in manifest order) that is a substring of the transcript.
pub fn find_prompt_match<'a>(
    transcript: &str,
    index: &'a PromptIndex,
    fuzzy: bool,
) -> Option<&'a BenchmarkRecord> {
    if let Some(record) = index.get(transcript) {
        return Some(record);
    }
    if !fuzzy {
        return None;
    }
    index
        .iter()
        .find(|(prompt, _)| transcript.contains(*prompt))
        .map(|(_, record)| record)
}

/// Matches a sample by the text of its prompt transcript.
pub fn match_by_prompt(
    sample: &Sample,
    index: &PromptIndex,
    fuzzy: bool,
    config: &ReorgConfig,
) -> Result<MatchOutcome> {
    if !sample.image_path(config).is_file() {
        return Ok(MatchOutcome::MissingInput(MissingFile::Image));
    }
    let prompt_path = sample.prompt_path(config);
    if !prompt_path.is_file() {
        return Ok(MatchOutcome::MissingInput(MissingFile::Prompt));
    }

    let raw = fs::read_to_string(&prompt_path)?;
    let transcript = raw.trim();
    Ok(match find_prompt_match(transcript, index, fuzzy) {
        Some(record) => MatchOutcome::Matched(record.clone()),
        None => MatchOutcome::Unmatched {
            preview: transcript.chars().take(config.preview_chars).collect(),
        },
    })
}

/// Matches a sample to the manifest row at the same position.
pub fn match_by_index(
    sample: &Sample,
    records: &[BenchmarkRecord],
    config: &ReorgConfig,
) -> MatchOutcome {
    let Some(record) = records.get(sample.position) else {
        return MatchOutcome::OutOfRange;
    };
    if !sample.image_path(config).is_file() {
        return MatchOutcome::MissingInput(MissingFile::Image);
    }
    MatchOutcome::Matched(record.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, prompt: &str) -> BenchmarkRecord {
        BenchmarkRecord {
            id: id.to_string(),
            category: "Portrait".to_string(),
            prompt: Some(prompt.to_string()),
        }
    }

    fn build_index(prompts: &[(&str, &str)]) -> PromptIndex {
        let mut index = PromptIndex::new();
        for (id, prompt) in prompts {
            index.insert(prompt.to_string(), record(id, prompt));
        }
        index
    }

    #[test]
    fn exact_match_beats_containment() {
        let index = build_index(&[("001", "a cat"), ("002", "a cat on a mat")]);
        let hit = find_prompt_match("a cat on a mat", &index, true).expect("match");
        assert_eq!(hit.id, "002");
    }

    #[test]
    fn containment_requires_fuzzy() {
        let index = build_index(&[("001", "A woman smiling")]);
        let text = "A woman smiling, high quality, 4k";
        assert!(find_prompt_match(text, &index, false).is_none());
        assert_eq!(find_prompt_match(text, &index, true).map(|r| r.id.as_str()), Some("001"));
    }

    #[test]
    fn fuzzy_returns_first_in_manifest_order() {
        let index = build_index(&[("001", "a red apple"), ("002", "apple"), ("003", "red")]);
        let hit =
            find_prompt_match("photo of a red apple on a table", &index, true).expect("match");
        assert_eq!(hit.id, "001");

        let index = build_index(&[("003", "red"), ("002", "apple"), ("001", "a red apple")]);
        let hit =
            find_prompt_match("photo of a red apple on a table", &index, true).expect("match");
        assert_eq!(hit.id, "003");
    }

    #[test]
    fn fuzzy_does_not_match_unrelated_text() {
        let index = build_index(&[("001", "a lighthouse at dusk")]);
        assert!(find_prompt_match("a lighthouse", &index, true).is_none());
    }

    #[test]
    fn index_match_is_positional() {
        let records = vec![record("001", "x"), record("002", "y")];
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReorgConfig::default();
        for name in ["sample_0", "sample_1", "sample_2"] {
            let d = dir.path().join(name);
            fs::create_dir_all(&d).expect("mkdir");
            fs::write(d.join(&config.image_file), b"png").expect("write");
        }

        let samples = discover_samples(dir.path(), &config.sample_prefix).expect("discover");
        let outcomes: Vec<MatchOutcome> = samples
            .iter()
            .map(|s| match_by_index(s, &records, &config))
            .collect();
        assert_eq!(outcomes[0], MatchOutcome::Matched(records[0].clone()));
        assert_eq!(outcomes[1], MatchOutcome::Matched(records[1].clone()));
        assert_eq!(outcomes[2], MatchOutcome::OutOfRange);
    }

    #[test]
    fn discovery_ignores_other_entries_and_sorts() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["sample_2", "other", "sample_0", "sample_1"] {
            fs::create_dir_all(dir.path().join(name)).expect("mkdir");
        }
        fs::write(dir.path().join("sample_file.txt"), b"").expect("write");

        let samples = discover_samples(dir.path(), "sample_").expect("discover");
        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["sample_0", "sample_1", "sample_2"]);
        assert!(samples.iter().enumerate().all(|(i, s)| s.position == i));
    }

    #[test]
    fn missing_transcript_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ReorgConfig::default();
        let sample_dir = dir.path().join("sample_0");
        fs::create_dir_all(&sample_dir).expect("mkdir");
        fs::write(sample_dir.join(&config.image_file), b"png").expect("write");
        let sample = Sample {
            name: "sample_0".into(),
            dir: sample_dir,
            position: 0,
        };

        let outcome = match_by_prompt(&sample, &PromptIndex::new(), false, &config).expect("match");
        assert_eq!(outcome, MatchOutcome::MissingInput(MissingFile::Prompt));
    }
}
