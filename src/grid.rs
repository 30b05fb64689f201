//! Splits a composite grid image into its sub-images.
//!
//! Generators that emit several candidates per prompt often composite them
//! into one file (2x2 is typical) and pad unused cells with pure black.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{DynamicImage, GenericImageView};
use log::info;

use crate::error::{ReorgError, Result};

const TILE_EXTENSION: &str = "jpg";

/// Upper bound on `columns * rows`.
pub const MAX_TILES: u32 = 4096;

/// Number of columns and rows in a composite image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub columns: u32,
    pub rows: u32,
}

impl GridShape {
    pub fn new(columns: u32, rows: u32) -> Result<Self> {
        let cells = columns.checked_mul(rows).unwrap_or(u32::MAX);
        if cells == 0 || cells > MAX_TILES {
            return Err(ReorgError::InvalidGridShape(format!("{columns}x{rows}")));
        }
        Ok(Self { columns, rows })
    }

    pub fn cells(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Tile size by integer division; remainder pixels fall outside every tile.
    pub fn tile_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width / self.columns, height / self.rows)
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self { columns: 2, rows: 2 }
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

impl FromStr for GridShape {
    type Err = ReorgError;

    /// Parses `<columns>x<rows>`, e.g. `2x2` or `3x1`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReorgError::InvalidGridShape(s.to_string());
        let (columns, rows) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let columns = columns.trim().parse().map_err(|_| invalid())?;
        let rows = rows.trim().parse().map_err(|_| invalid())?;
        GridShape::new(columns, rows).map_err(|_| invalid())
    }
}

/// One cell of a split grid.
#[derive(Debug, Clone)]
pub struct Tile {
    pub row: u32,
    pub column: u32,
    pub image: DynamicImage,
}

/// True when every pixel's RGB channels are zero.
///
/// Pixels are read as RGBA whatever the source format, so alpha is ignored:
/// a fully transparent black tile counts as black, and so does a luma tile
/// whose every sample is zero. A check that compared raw pixel tuples
/// against `(0, 0, 0)` would never discard RGBA or grayscale tiles.
pub fn is_black(image: &DynamicImage) -> bool {
    image
        .pixels()
        .all(|(_, _, px)| px[0] == 0 && px[1] == 0 && px[2] == 0)
}

/// Cuts `image` into `shape.columns * shape.rows` tiles in row-major order.
pub fn split_tiles(image: &DynamicImage, shape: GridShape) -> Vec<Tile> {
    let (tile_w, tile_h) = shape.tile_size(image.width(), image.height());
    let mut tiles = Vec::with_capacity(shape.cells());
    for row in 0..shape.rows {
        for column in 0..shape.columns {
            tiles.push(Tile {
                row,
                column,
                image: image.crop_imm(column * tile_w, row * tile_h, tile_w, tile_h),
            });
        }
    }
    tiles
}

/// Tiles of `image` that are not entirely black, in row-major order.
///
/// `source` only labels the log line for each discarded tile.
pub fn kept_tiles(image: &DynamicImage, shape: GridShape, source: &Path) -> Vec<Tile> {
    split_tiles(image, shape)
        .into_iter()
        .filter(|tile| {
            let black = is_black(&tile.image);
            if black {
                info!(
                    "Detected a black image at position ({},{}) in {}",
                    tile.row,
                    tile.column,
                    source.display()
                );
            }
            !black
        })
        .collect()
}

/// Splits the composite image at `path` and writes every non-black tile into
/// `scratch_dir` as `0.jpg`, `1.jpg`, ... Numbering only counts written tiles.
///
/// Returns the written paths in order.
pub fn split_grid(path: &Path, shape: GridShape, scratch_dir: &Path) -> Result<Vec<PathBuf>> {
    let image = image::open(path)?;
    fs::create_dir_all(scratch_dir)?;

    let mut written = Vec::new();
    for (n, tile) in kept_tiles(&image, shape, path).into_iter().enumerate() {
        let out = scratch_dir.join(format!("{n}.{TILE_EXTENSION}"));
        // JPEG has no alpha channel.
        DynamicImage::ImageRgb8(tile.image.to_rgb8()).save(&out)?;
        written.push(out);
    }
    Ok(written)
}
