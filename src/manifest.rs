//! Benchmark manifest loading.
//!
//! A manifest is a CSV file with at least `id` and `category` columns and,
//! for prompt matching, a `prompt_en` or `prompt_cn` column.

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use log::{debug, warn};

use crate::error::{ReorgError, Result};

const ID_COLUMN: &str = "id";
const CATEGORY_COLUMN: &str = "category";
const PROMPT_EN_COLUMN: &str = "prompt_en";
const PROMPT_CN_COLUMN: &str = "prompt_cn";

/// One row of a benchmark manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRecord {
    pub id: String,
    pub category: String,
    pub prompt: Option<String>,
}

/// Prompt text to record lookup.
///
/// A prompt that appears several times in the manifest maps to the record of
/// its last row, but keeps the manifest position of its first row for the
/// ordered scan used by fuzzy matching.
#[derive(Debug, Default, Clone)]
pub struct PromptIndex {
    positions: HashMap<String, usize>,
    entries: Vec<(String, BenchmarkRecord)>,
}

impl PromptIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` under `prompt`, overwriting any earlier record for the
    /// same prompt. Empty prompts are ignored.
    pub fn insert(&mut self, prompt: String, record: BenchmarkRecord) {
        if prompt.is_empty() {
            return;
        }
        match self.positions.get(&prompt) {
            Some(&pos) => self.entries[pos].1 = record,
            None => {
                self.positions.insert(prompt.clone(), self.entries.len());
                self.entries.push((prompt, record));
            }
        }
    }

    pub fn get(&self, prompt: &str) -> Option<&BenchmarkRecord> {
        self.positions.get(prompt).map(|&pos| &self.entries[pos].1)
    }

    /// Prompts and their records in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BenchmarkRecord)> {
        self.entries.iter().map(|(p, r)| (p.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Columns {
    id: usize,
    category: usize,
    prompt_en: Option<usize>,
    prompt_cn: Option<usize>,
}

impl Columns {
    fn from_headers(path: &Path, headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let id = find(ID_COLUMN).ok_or_else(|| ReorgError::MissingColumn {
            path: path.to_path_buf(),
            column: ID_COLUMN,
        })?;
        let category = find(CATEGORY_COLUMN).ok_or_else(|| ReorgError::MissingColumn {
            path: path.to_path_buf(),
            column: CATEGORY_COLUMN,
        })?;
        Ok(Self {
            id,
            category,
            prompt_en: find(PROMPT_EN_COLUMN),
            prompt_cn: find(PROMPT_CN_COLUMN),
        })
    }

    fn field<'r>(row: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| row.get(i)).unwrap_or("")
    }

    /// `prompt_en` wins when it is non-empty, otherwise `prompt_cn`.
    fn prompt(&self, row: &StringRecord) -> String {
        let en = Self::field(row, self.prompt_en);
        let raw = if en.is_empty() {
            Self::field(row, self.prompt_cn)
        } else {
            en
        };
        raw.trim().to_string()
    }
}

/// Reads every well-formed record of the manifest in row order.
///
/// Rows with an empty `id` or `category` are skipped with a warning.
pub fn load_records(path: &Path) -> Result<Vec<BenchmarkRecord>> {
    if !path.is_file() {
        return Err(ReorgError::ManifestNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns = Columns::from_headers(path, reader.headers()?)?;

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let id = Columns::field(&row, Some(columns.id)).trim();
        let category = Columns::field(&row, Some(columns.category)).trim();
        if id.is_empty() || category.is_empty() {
            // +2: header line plus 1-based numbering
            warn!(
                "{}: row {} has an empty id or category, skipping",
                path.display(),
                line + 2
            );
            continue;
        }
        let prompt = columns.prompt(&row);
        records.push(BenchmarkRecord {
            id: id.to_string(),
            category: category.to_string(),
            prompt: (!prompt.is_empty()).then_some(prompt),
        });
    }

    debug!("{}: {} records", path.display(), records.len());
    Ok(records)
}

/// Loads the manifest keyed by prompt text. Rows without a prompt are left out.
pub fn load_prompt_index(path: &Path) -> Result<PromptIndex> {
    let mut index = PromptIndex::new();
    for record in load_records(path)? {
        if let Some(prompt) = record.prompt.clone() {
            index.insert(prompt, record);
        }
    }
    Ok(index)
}
