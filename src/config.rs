const SAMPLE_PREFIX: &str = "sample_";
const IMAGE_FILE: &str = "image.png";
const PROMPT_FILE: &str = "prompt.txt";
const DESTINATION_EXTENSION: &str = "webp";
const PROGRESS_EVERY: usize = 200;
const PREVIEW_CHARS: usize = 80;

/// File-layout parameters shared by both reorganization strategies.
///
/// Controls how sample directories are recognised, which files inside them
/// are read, and how destination entries are named.
#[derive(Debug, Clone)]
pub struct ReorgConfig {
    pub sample_prefix: String,
    pub image_file: String,
    pub prompt_file: String,
    pub destination_extension: String,
    /// Log a progress line every this many samples; 0 disables it.
    pub progress_every: usize,
    /// Characters of an unmatched transcript kept for the report.
    pub preview_chars: usize,
}

impl Default for ReorgConfig {
    fn default() -> Self {
        Self {
            sample_prefix: SAMPLE_PREFIX.to_string(),
            image_file: IMAGE_FILE.to_string(),
            prompt_file: PROMPT_FILE.to_string(),
            destination_extension: DESTINATION_EXTENSION.to_string(),
            progress_every: PROGRESS_EVERY,
            preview_chars: PREVIEW_CHARS,
        }
    }
}
