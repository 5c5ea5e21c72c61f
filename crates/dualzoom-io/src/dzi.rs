//! Deep Zoom Image (DZI) descriptors and pyramid geometry.
//!
//! A DZI pyramid is a `<name>.dzi` XML descriptor next to a `<name>_files/`
//! directory holding one sub-directory per level. Level `max_level` is the
//! full-resolution image; every level below halves both dimensions (rounding
//! up) until level 0 is a single pixel. Each level is cut into
//! `tile_size`-pixel tiles named `<col>_<row>.<format>`, each extended by
//! `overlap` pixels into its neighbours.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DZI_NAMESPACE: &str = "http://schemas.microsoft.com/deepzoom/2008";

#[derive(Error, Debug)]
pub enum DziError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed DZI descriptor: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("DZI descriptor is missing {0}")]
    MissingField(&'static str),

    #[error("DZI field {field} has invalid value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid pyramid settings: {0}")]
    Settings(String),
}

/// Contents of a `.dzi` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DziDescriptor {
    /// Tile file extension, e.g. `jpg`.
    pub format: String,
    pub overlap: u32,
    pub tile_size: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixel rectangle of a tile within its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DziDescriptor {
    pub fn new(width: u32, height: u32, tile_size: u32, overlap: u32, format: &str) -> Self {
        Self {
            format: format.to_string(),
            overlap,
            tile_size,
            width,
            height,
        }
    }

    /// Highest pyramid level: `ceil(log2(max(width, height)))`.
    pub fn max_level(&self) -> u32 {
        let largest = self.width.max(self.height);
        if largest <= 1 {
            0
        } else {
            u32::BITS - (largest - 1).leading_zeros()
        }
    }

    /// Number of levels including level 0.
    pub fn level_count(&self) -> u32 {
        self.max_level() + 1
    }

    /// Image dimensions at `level`, each side rounded up and at least 1.
    pub fn level_dimensions(&self, level: u32) -> (u32, u32) {
        let shift = self.max_level().saturating_sub(level);
        (scale_down(self.width, shift), scale_down(self.height, shift))
    }

    /// Tile columns and rows at `level`.
    pub fn tile_grid(&self, level: u32) -> (u32, u32) {
        let (w, h) = self.level_dimensions(level);
        (w.div_ceil(self.tile_size), h.div_ceil(self.tile_size))
    }

    /// Area cropped for tile `(col, row)` at `level`, overlap included.
    pub fn tile_rect(&self, level: u32, col: u32, row: u32) -> TileRect {
        let (w, h) = self.level_dimensions(level);
        let (w, h) = (u64::from(w), u64::from(h));
        let tile = u64::from(self.tile_size);
        let overlap = u64::from(self.overlap);
        // Start is clamped to the level so it fits back into u32.
        let x = (u64::from(col) * tile).min(w);
        let y = (u64::from(row) * tile).min(h);
        let x0 = x.saturating_sub(overlap);
        let y0 = y.saturating_sub(overlap);
        let x1 = (x + tile + overlap).min(w);
        let y1 = (y + tile + overlap).min(h);
        TileRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        }
    }

    /// Total number of tiles across all levels.
    pub fn tile_count(&self) -> u64 {
        (0..self.level_count())
            .map(|level| {
                let (cols, rows) = self.tile_grid(level);
                u64::from(cols) * u64::from(rows)
            })
            .sum()
    }

    /// Serialize as a Deep Zoom 2008 XML document.
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version='1.0' encoding='utf-8'?>\n\
             <Image xmlns=\"{ns}\" Format=\"{format}\" Overlap=\"{overlap}\" TileSize=\"{tile_size}\">\n  \
             <Size Height=\"{height}\" Width=\"{width}\" />\n\
             </Image>\n",
            ns = DZI_NAMESPACE,
            format = self.format,
            overlap = self.overlap,
            tile_size = self.tile_size,
            height = self.height,
            width = self.width,
        )
    }

    /// Parse a descriptor document.
    pub fn parse(xml: &str) -> Result<Self, DziError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        if root.tag_name().name() != "Image" {
            return Err(DziError::MissingField("Image element"));
        }

        let size = root
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "Size")
            .ok_or(DziError::MissingField("Size element"))?;

        let format = root
            .attribute("Format")
            .ok_or(DziError::MissingField("Format"))?
            .to_string();

        let descriptor = Self {
            format,
            overlap: number(root.attribute("Overlap"), "Overlap")?,
            tile_size: number(root.attribute("TileSize"), "TileSize")?,
            width: number(size.attribute("Width"), "Width")?,
            height: number(size.attribute("Height"), "Height")?,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Checks the tile maths relies on: a non-empty image and a positive
    /// tile size larger than the overlap.
    pub fn validate(&self) -> Result<(), DziError> {
        if let Some(problem) = tiling_problem(self.tile_size, self.overlap) {
            log::warn!("Rejecting DZI descriptor: {}", problem);
            let (field, value) = if self.tile_size == 0 {
                ("TileSize", self.tile_size)
            } else {
                ("Overlap", self.overlap)
            };
            return Err(DziError::InvalidField {
                field,
                value: value.to_string(),
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(DziError::InvalidField {
                field: "Size",
                value: format!("{}x{}", self.width, self.height),
            });
        }
        Ok(())
    }

    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, DziError> {
        let text = std::str::from_utf8(bytes).map_err(|_| DziError::InvalidField {
            field: "document",
            value: "non-UTF-8 bytes".to_string(),
        })?;
        Self::parse(text)
    }

    pub fn read(path: &Path) -> Result<Self, DziError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), DziError> {
        fs::write(path, self.to_xml())?;
        Ok(())
    }
}

/// Why `tile_size`/`overlap` cannot be cut into tiles, if they cannot.
pub(crate) fn tiling_problem(tile_size: u32, overlap: u32) -> Option<String> {
    if tile_size == 0 {
        Some("tile size must be positive".to_string())
    } else if overlap >= tile_size {
        Some(format!(
            "overlap {} must be smaller than tile size {}",
            overlap, tile_size
        ))
    } else {
        None
    }
}

fn scale_down(dim: u32, shift: u32) -> u32 {
    if shift >= u32::BITS {
        return 1;
    }
    let divisor = 1u64 << shift;
    u64::from(dim).div_ceil(divisor).max(1) as u32
}

fn number(raw: Option<&str>, field: &'static str) -> Result<u32, DziError> {
    let raw = raw.ok_or(DziError::MissingField(field))?;
    raw.trim().parse().map_err(|_| DziError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

/// `<dir>/<name>_files`, the tile root for descriptor `<dir>/<name>.dzi`.
pub fn tiles_dir(descriptor_path: &Path) -> PathBuf {
    let stem = descriptor_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    descriptor_path.with_file_name(format!("{}_files", stem))
}

/// Relative URL/path of a tile under a descriptor named `name`.
pub fn tile_key(name: &str, level: u32, col: u32, row: u32, format: &str) -> String {
    format!("{}_files/{}/{}_{}.{}", name, level, col, row, format)
}
