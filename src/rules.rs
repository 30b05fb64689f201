//! Run metadata inferred from a source directory's name.
//!
//! Every table below is evaluated top to bottom and the first rule that
//! matches wins; the `default_*` value applies when none does. The built-in
//! tables can be replaced with a JSON file of the same shape, for example:
//!
//! ```json
//! {
//!   "model_rules": [{ "contains": ["_ep_", "ep-cfg"], "value": "omni-ep" }],
//!   "default_model": "omni",
//!   "checkpoint_patterns": ["ckpt=(\\d+)"],
//!   "language_rules": [{ "contains": ["_zh_"], "value": "zh" }],
//!   "manifests": { "en": "OneIG-Bench.csv", "zh": "OneIG-Bench-ZH.csv" },
//!   "fuzzy_models": ["omni-ep"]
//! }
//! ```
//!
//! Missing keys keep their built-in values.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::Result;
use crate::placement::Language;

/// Yields `value` when the directory name contains any of `contains`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule<T> {
    pub contains: Vec<String>,
    pub value: T,
}

impl<T> Rule<T> {
    pub fn new(contains: &[&str], value: T) -> Self {
        Self {
            contains: contains.iter().map(|s| s.to_string()).collect(),
            value,
        }
    }

    fn matches(&self, dir_name: &str) -> bool {
        self.contains.iter().any(|needle| dir_name.contains(needle.as_str()))
    }
}

fn first_match<'a, T>(rules: &'a [Rule<T>], dir_name: &str) -> Option<&'a T> {
    rules.iter().find(|r| r.matches(dir_name)).map(|r| &r.value)
}

/// Manifest file name per benchmark language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestFiles {
    pub en: String,
    pub zh: String,
}

impl ManifestFiles {
    pub fn for_language(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Zh => &self.zh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunRules {
    pub model_rules: Vec<Rule<String>>,
    pub default_model: String,
    /// Regexes whose first capture group is the checkpoint.
    pub checkpoint_patterns: Vec<String>,
    pub default_checkpoint: String,
    pub language_rules: Vec<Rule<Language>>,
    pub default_language: Language,
    pub manifests: ManifestFiles,
    /// Models whose pipelines expand prompts, so containment matching is on.
    pub fuzzy_models: Vec<String>,
}

impl Default for RunRules {
    fn default() -> Self {
        Self {
            model_rules: vec![Rule::new(
                &["_ep_", "ep-cfg", "bench_en_ep"],
                "omni-ep".to_string(),
            )],
            default_model: "omni".to_string(),
            checkpoint_patterns: vec![r"ckpt=(\d+)".to_string()],
            default_checkpoint: "unknown".to_string(),
            language_rules: vec![Rule::new(&["_zh_", "bench_zh"], Language::Zh)],
            default_language: Language::En,
            manifests: ManifestFiles {
                en: "OneIG-Bench.csv".to_string(),
                zh: "OneIG-Bench-ZH.csv".to_string(),
            },
            fuzzy_models: vec!["omni-ep".to_string()],
        }
    }
}

/// Values supplied on the command line take precedence over inference.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model_name: Option<String>,
    pub checkpoint: Option<String>,
}

/// Everything a source directory's name determines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub model_name: String,
    pub checkpoint: String,
    pub language: Language,
    pub manifest_file: String,
    pub fuzzy: bool,
}

impl RunRules {
    /// Reads a JSON rule table and checks its patterns compile.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let rules: RunRules = serde_json::from_str(&raw)?;
        rules.compile_checkpoint_patterns()?;
        Ok(rules)
    }

    fn compile_checkpoint_patterns(&self) -> Result<Vec<Regex>> {
        self.checkpoint_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(Into::into))
            .collect()
    }

    pub fn model_name(&self, dir_name: &str) -> String {
        first_match(&self.model_rules, dir_name)
            .unwrap_or(&self.default_model)
            .clone()
    }

    pub fn checkpoint(&self, dir_name: &str) -> Result<String> {
        for pattern in self.compile_checkpoint_patterns()? {
            if let Some(m) = pattern.captures(dir_name).and_then(|c| c.get(1)) {
                return Ok(m.as_str().to_string());
            }
        }
        Ok(self.default_checkpoint.clone())
    }

    pub fn language(&self, dir_name: &str) -> Language {
        first_match(&self.language_rules, dir_name)
            .copied()
            .unwrap_or(self.default_language)
    }

    pub fn is_fuzzy_model(&self, model_name: &str) -> bool {
        self.fuzzy_models.iter().any(|m| m == model_name)
    }

    /// Resolves model, checkpoint, language, manifest and fuzzy mode.
    pub fn infer(&self, dir_name: &str, overrides: &Overrides) -> Result<RunMetadata> {
        let model_name = match &overrides.model_name {
            Some(name) => name.clone(),
            None => self.model_name(dir_name),
        };
        let checkpoint = match &overrides.checkpoint {
            Some(ckpt) => ckpt.clone(),
            None => self.checkpoint(dir_name)?,
        };
        let language = self.language(dir_name);
        Ok(RunMetadata {
            fuzzy: self.is_fuzzy_model(&model_name),
            manifest_file: self.manifests.for_language(language).to_string(),
            model_name,
            checkpoint,
            language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_classify_directory_names() {
        let rules = RunRules::default();
        let meta = rules
            .infer("gen_bench_zh_ep_ckpt=15000_cfg4", &Overrides::default())
            .expect("infer");
        assert_eq!(meta.model_name, "omni-ep");
        assert_eq!(meta.checkpoint, "15000");
        assert_eq!(meta.language, Language::Zh);
        assert_eq!(meta.manifest_file, "OneIG-Bench-ZH.csv");
        assert!(meta.fuzzy);

        let meta = rules.infer("gen_bench_en", &Overrides::default()).expect("infer");
        assert_eq!(meta.model_name, "omni");
        assert_eq!(meta.checkpoint, "unknown");
        assert_eq!(meta.language, Language::En);
        assert_eq!(meta.manifest_file, "OneIG-Bench.csv");
        assert!(!meta.fuzzy);
    }

    #[test]
    fn overrides_win_and_drive_fuzzy_mode() {
        let rules = RunRules::default();
        let overrides = Overrides {
            model_name: Some("omni-v2".into()),
            checkpoint: Some("20000".into()),
        };
        let meta = rules.infer("bench_en_ep_ckpt=15000", &overrides).expect("infer");
        assert_eq!(meta.model_name, "omni-v2");
        assert_eq!(meta.checkpoint, "20000");
        assert!(!meta.fuzzy);
    }

    #[test]
    fn first_rule_wins() {
        let rules = RunRules {
            model_rules: vec![
                Rule::new(&["ep"], "first".to_string()),
                Rule::new(&["_ep_"], "second".to_string()),
            ],
            ..RunRules::default()
        };
        assert_eq!(rules.model_name("run_ep_x"), "first");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        fs::write(
            &path,
            r#"{ "model_rules": [{ "contains": ["flux"], "value": "flux-dev" }],
                 "language_rules": [{ "contains": ["-cn"], "value": "zh" }] }"#,
        )
        .expect("write");

        let rules = RunRules::load(&path).expect("load");
        assert_eq!(rules.model_name("flux_ckpt=1"), "flux-dev");
        assert_eq!(rules.language("run-cn"), Language::Zh);
        assert_eq!(rules.default_model, "omni");
        assert_eq!(rules.manifests, RunRules::default().manifests);
    }

    #[test]
    fn bad_pattern_is_rejected_at_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.json");
        fs::write(&path, r#"{ "checkpoint_patterns": ["ckpt=(\\d+"] }"#).expect("write");
        assert!(matches!(
            RunRules::load(&path),
            Err(crate::error::ReorgError::Pattern(_))
        ));
    }
}
