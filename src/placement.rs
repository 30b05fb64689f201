//! Destination path construction. Everything here is pure: no filesystem
//! access, same inputs always give the same path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ReorgError;

/// Semantic benchmark category, with the subfolder it is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Anime,
    Portrait,
    Object,
    Text,
    Reasoning,
    Multilingualism,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Anime,
        Category::Portrait,
        Category::Object,
        Category::Text,
        Category::Reasoning,
        Category::Multilingualism,
    ];

    /// Label used in the manifest's `category` column.
    pub fn label(self) -> &'static str {
        match self {
            Category::Anime => "Anime_Stylization",
            Category::Portrait => "Portrait",
            Category::Object => "General_Object",
            Category::Text => "Text_Rendering",
            Category::Reasoning => "Knowledge_Reasoning",
            Category::Multilingualism => "Multilingualism",
        }
    }

    pub fn subfolder(self) -> &'static str {
        match self {
            Category::Anime => "anime",
            Category::Portrait => "human",
            Category::Object => "object",
            Category::Text => "text",
            Category::Reasoning => "reasoning",
            Category::Multilingualism => "multilingualism",
        }
    }

    /// Resolves a manifest label, reporting `id` on failure.
    pub fn resolve(label: &str, id: &str) -> Result<Self, ReorgError> {
        label.parse::<Category>().map_err(|_| ReorgError::UnknownCategory {
            id: id.to_string(),
            category: label.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownLabel;

impl FromStr for Category {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or(UnknownLabel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageKind {
    Grid,
    #[default]
    NonGrid,
}

impl ImageKind {
    pub fn from_grid_flag(grid: bool) -> Self {
        if grid {
            ImageKind::Grid
        } else {
            ImageKind::NonGrid
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            ImageKind::Grid => "grids",
            ImageKind::NonGrid => "non-grids",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Run-wide part of a destination, fixed for one source directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlacementKey {
    pub model_name: String,
    pub image_kind: ImageKind,
    pub checkpoint: String,
    pub language: Language,
}

impl PlacementKey {
    /// `<root>/<model>/<grids|non-grids>/<checkpoint>/<language>`
    pub fn run_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.model_name)
            .join(self.image_kind.dir_name())
            .join(&self.checkpoint)
            .join(self.language.code())
    }
}

fn file_name(id: &str, extension: &str) -> String {
    format!("{id}.{extension}")
}

/// Destination for prompt-matched samples:
/// `<root>/<model>/<grids|non-grids>/<checkpoint>/<language>/<category>/<id>.<ext>`.
pub fn prompt_destination(
    root: &Path,
    key: &PlacementKey,
    category: Category,
    id: &str,
    extension: &str,
) -> PathBuf {
    key.run_dir(root)
        .join(category.subfolder())
        .join(file_name(id, extension))
}

/// Destination for index-matched samples: `<root>/<category>/<model>/<id>.<ext>`.
pub fn index_destination(
    root: &Path,
    model_name: &str,
    category: Category,
    id: &str,
    extension: &str,
) -> PathBuf {
    root.join(category.subfolder())
        .join(model_name)
        .join(file_name(id, extension))
}
