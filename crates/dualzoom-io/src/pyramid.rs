use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::dzi::{tiles_dir, tiling_problem, DziDescriptor, DziError};

/// Encoding used for tile files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    Jpg,
    Png,
}

impl TileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Jpg => "jpg",
            TileFormat::Png => "png",
        }
    }
}

impl std::str::FromStr for TileFormat {
    type Err = DziError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(TileFormat::Jpg),
            "png" => Ok(TileFormat::Png),
            other => Err(DziError::Settings(format!(
                "unsupported tile format '{}' (supported: jpg, png)",
                other
            ))),
        }
    }
}

/// Cuts a source image into a Deep Zoom pyramid on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeepZoomCreator {
    pub tile_size: u32,
    pub overlap: u32,
    pub format: TileFormat,
    /// JPEG quality, 1-100. Ignored for PNG.
    pub quality: u8,
}

impl Default for DeepZoomCreator {
    fn default() -> Self {
        Self {
            tile_size: 254,
            overlap: 1,
            format: TileFormat::Jpg,
            quality: 85,
        }
    }
}

impl DeepZoomCreator {
    fn validate(&self) -> Result<(), DziError> {
        if let Some(problem) = tiling_problem(self.tile_size, self.overlap) {
            return Err(DziError::Settings(problem));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(DziError::Settings(format!(
                "quality {} outside 1-100",
                self.quality
            )));
        }
        Ok(())
    }

    /// Build the pyramid for the image at `source`, writing the descriptor to
    /// `destination` (a `.dzi` path) and tiles next to it.
    pub fn create(&self, source: &Path, destination: &Path) -> Result<DziDescriptor, DziError> {
        log::info!("Creating DZI from {}", source.display());
        let image = image::open(source)?;
        self.create_from_image(&image, destination)
    }

    pub fn create_from_image(
        &self,
        image: &DynamicImage,
        destination: &Path,
    ) -> Result<DziDescriptor, DziError> {
        self.validate()?;

        let (width, height) = image.dimensions();
        let descriptor = DziDescriptor::new(
            width,
            height,
            self.tile_size,
            self.overlap,
            self.format.extension(),
        );
        log::info!(
            "Source image {}x{}, pyramid with max level {}",
            width,
            height,
            descriptor.max_level()
        );

        let files_dir = tiles_dir(destination);
        fs::create_dir_all(&files_dir)?;

        for level in 0..descriptor.level_count() {
            let (lw, lh) = descriptor.level_dimensions(level);
            log::debug!("Level {}: {}x{}", level, lw, lh);

            let resized;
            let level_image = if level == descriptor.max_level() {
                image
            } else {
                resized = image.resize_exact(lw, lh, FilterType::Lanczos3);
                &resized
            };

            let level_dir = files_dir.join(level.to_string());
            fs::create_dir_all(&level_dir)?;
            self.write_level_tiles(level_image, &descriptor, level, &level_dir)?;
        }

        descriptor.write(destination)?;
        log::info!(
            "DZI creation complete: {} ({} tiles)",
            destination.display(),
            descriptor.tile_count()
        );
        Ok(descriptor)
    }

    fn write_level_tiles(
        &self,
        level_image: &DynamicImage,
        descriptor: &DziDescriptor,
        level: u32,
        level_dir: &Path,
    ) -> Result<(), DziError> {
        let (cols, rows) = descriptor.tile_grid(level);
        for row in 0..rows {
            for col in 0..cols {
                let rect = descriptor.tile_rect(level, col, row);
                let tile = level_image.crop_imm(rect.x, rect.y, rect.width, rect.height);
                let path = level_dir.join(format!("{}_{}.{}", col, row, self.format.extension()));
                self.save_tile(&tile, &path)?;
            }
        }
        Ok(())
    }

    fn save_tile(&self, tile: &DynamicImage, path: &Path) -> Result<(), DziError> {
        match self.format {
            TileFormat::Jpg => {
                let mut writer = BufWriter::new(File::create(path)?);
                let encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
                DynamicImage::ImageRgb8(tile.to_rgb8()).write_with_encoder(encoder)?;
            }
            TileFormat::Png => tile.save_with_format(path, ImageFormat::Png)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_png_pyramid_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("sample1.dzi");
        let creator = DeepZoomCreator {
            format: TileFormat::Png,
            ..Default::default()
        };
        let d = creator.create_from_image(&gradient(600, 300), &dest).unwrap();

        assert_eq!(d.max_level(), 10);
        assert_eq!(DziDescriptor::read(&dest).unwrap(), d);

        let files = tmp.path().join("sample1_files");
        assert_eq!(count_files(&files), 11);
        assert_eq!(count_files(&files.join("10")), 6);
        assert_eq!(count_files(&files.join("0")), 1);

        // Second column of the full-resolution level starts one pixel early.
        let tile = image::open(files.join("10").join("1_0.png")).unwrap();
        assert_eq!(tile.dimensions(), (256, 255));
        assert_eq!(tile.to_rgb8().get_pixel(0, 0), &Rgb([253, 0, 128]));

        let smallest = image::open(files.join("0").join("0_0.png")).unwrap();
        assert_eq!(smallest.dimensions(), (1, 1));
    }

    #[test]
    fn test_jpeg_tiles_decode() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("slide.dzi");
        let d = DeepZoomCreator::default()
            .create_from_image(&gradient(300, 200), &dest)
            .unwrap();
        assert_eq!(d.format, "jpg");
        let tile = image::open(tmp.path().join("slide_files/9/1_0.jpg")).unwrap();
        assert_eq!(tile.dimensions(), (47, 200));
    }

    #[test]
    fn test_create_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("input.png");
        gradient(40, 30).save(&source).unwrap();
        let d = DeepZoomCreator::default()
            .create(&source, &tmp.path().join("out.dzi"))
            .unwrap();
        assert_eq!((d.width, d.height), (40, 30));
        assert!(tmp.path().join("out_files/6/0_0.jpg").exists());
    }

    #[test]
    fn test_rejects_bad_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let creator = DeepZoomCreator {
            tile_size: 4,
            overlap: 4,
            ..Default::default()
        };
        let err = creator
            .create_from_image(&gradient(8, 8), &tmp.path().join("x.dzi"))
            .unwrap_err();
        assert!(matches!(err, DziError::Settings(_)));
    }

    #[test]
    fn test_tile_format_parse() {
        assert_eq!("JPEG".parse::<TileFormat>().unwrap(), TileFormat::Jpg);
        assert!("webp".parse::<TileFormat>().is_err());
    }
}
