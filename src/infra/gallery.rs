// ============================================================
// Layer 6 — Image Gallery
// ============================================================
// A 5 × 5 grid of corpus images, each tile captioned with its
// class name (and, after training, the predicted class). Tile i
// shows image `offset + i` together with label `offset + i`.
//
// Like the metrics chart, the gallery is decoration: plotters
// errors are logged and the image is skipped.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::domain::corpus::{class_name, RawImages, IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH};

pub const GRID_SIDE:    usize = 5;
pub const GALLERY_SIZE: usize = GRID_SIDE * GRID_SIDE;

/// Image index shown first by default
pub const DEFAULT_OFFSET: usize = 500;

const PIXEL_SCALE:  u32 = 4;
const CAPTION_SIZE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryTile {
    pub index:     usize,
    pub label:     usize,
    pub predicted: Option<usize>,
}

impl GalleryTile {
    pub fn caption(&self) -> String {
        match self.predicted {
            Some(p) if p == self.label => format!("{} ✓", class_name(self.label)),
            Some(p) => format!("{} (true: {})", class_name(p), class_name(self.label)),
            None    => class_name(self.label).to_string(),
        }
    }
}

/// Up to 25 tiles starting at `offset`; each tile pairs an image
/// with the label at the same index
pub fn tiles(labels: &[u8], offset: usize) -> Vec<GalleryTile> {
    labels
        .iter()
        .enumerate()
        .skip(offset)
        .take(GALLERY_SIZE)
        .map(|(index, &label)| GalleryTile { index, label: label as usize, predicted: None })
        .collect()
}

/// Attach predictions, in tile order
pub fn with_predictions(tiles: Vec<GalleryTile>, predicted: &[usize]) -> Vec<GalleryTile> {
    tiles
        .into_iter()
        .zip(predicted)
        .map(|(tile, &p)| GalleryTile { predicted: Some(p), ..tile })
        .collect()
}

pub struct ImageGallery {
    path: PathBuf,
}

impl ImageGallery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Draw `tiles`; returns the written path, or None when
    /// nothing was drawn
    pub fn render(&self, images: &RawImages, tiles: &[GalleryTile]) -> Option<PathBuf> {
        if tiles.is_empty() {
            tracing::warn!("No images to show; skipping '{}'", self.path.display());
            return None;
        }

        match self.draw(images, tiles) {
            Ok(()) => {
                tracing::info!("Saved {} images to '{}'", tiles.len(), self.path.display());
                Some(self.path.clone())
            }
            Err(e) => {
                tracing::warn!("Could not render '{}': {}", self.path.display(), e);
                None
            }
        }
    }

    fn draw(&self, images: &RawImages, tiles: &[GalleryTile]) -> Result<(), String> {
        let tile_w = IMAGE_WIDTH as u32 * PIXEL_SCALE;
        let tile_h = IMAGE_HEIGHT as u32 * PIXEL_SCALE + CAPTION_SIZE + 6;
        let size   = (tile_w * GRID_SIDE as u32 + 16, tile_h * GRID_SIDE as u32);

        let root = BitMapBackend::new(&self.path, size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| format!("backend error: {e}"))?;

        let cells = root.split_evenly((GRID_SIDE, GRID_SIDE));
        for (cell, tile) in cells.iter().zip(tiles) {
            let pixels = images
                .image(tile.index)
                .ok_or_else(|| format!("image {} out of range", tile.index))?;

            let cell = cell
                .titled(&tile.caption(), ("sans-serif", CAPTION_SIZE))
                .map_err(|e| format!("caption error: {e}"))?;

            for (row, col, color) in scaled_pixels(pixels) {
                cell.draw_pixel((col, row), &color)
                    .map_err(|e| format!("pixel error: {e}"))?;
            }
        }

        root.present().map_err(|e| format!("write error: {e}"))?;
        Ok(())
    }
}

/// (row, column, colour) of every output pixel of one upscaled image
fn scaled_pixels(pixels: &[u8]) -> impl Iterator<Item = (i32, i32, RGBColor)> + '_ {
    let scale = PIXEL_SCALE as usize;
    let side  = IMAGE_WIDTH * scale;
    (0..IMAGE_HEIGHT * scale).flat_map(move |row| {
        (0..side).map(move |col| {
            let at = ((row / scale) * IMAGE_WIDTH + col / scale) * IMAGE_CHANNELS;
            let rgb = RGBColor(pixels[at], pixels[at + 1], pixels[at + 2]);
            (row as i32, col as i32, rgb)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::corpus::IMAGE_SIZE;

    #[test]
    fn test_tiles_pair_image_and_label_indices() {
        let labels: Vec<u8> = (0..600).map(|i| (i % 10) as u8).collect();
        let t = tiles(&labels, DEFAULT_OFFSET);

        assert_eq!(t.len(), GALLERY_SIZE);
        for (i, tile) in t.iter().enumerate() {
            assert_eq!(tile.index, 500 + i);
            assert_eq!(tile.label, labels[500 + i] as usize);
        }
    }

    #[test]
    fn test_tiles_clip_at_end() {
        let labels = vec![3u8; 30];
        assert_eq!(tiles(&labels, 20).len(), 10);
        assert!(tiles(&labels, 30).is_empty());
        assert!(tiles(&labels, 500).is_empty());
    }

    #[test]
    fn test_captions() {
        let tile = GalleryTile { index: 0, label: 3, predicted: None };
        assert_eq!(tile.caption(), "cat");

        let right = with_predictions(vec![tile], &[3]);
        assert_eq!(right[0].caption(), "cat ✓");

        let wrong = with_predictions(vec![tile], &[5]);
        assert_eq!(wrong[0].caption(), "dog (true: cat)");
    }

    #[test]
    fn test_scaled_pixels_repeat_source_pixel() {
        let mut pixels = vec![0u8; IMAGE_SIZE];
        pixels[0..3].copy_from_slice(&[255, 128, 7]);

        let out: Vec<_> = scaled_pixels(&pixels).collect();
        assert_eq!(out.len(), IMAGE_SIZE / 3 * 16);
        assert_eq!(out[0].2, RGBColor(255, 128, 7));
        // Row 3, column 3 is still inside the first source pixel
        assert_eq!(out[3 * 128 + 3].2, RGBColor(255, 128, 7));
        assert_eq!(out[4].2, RGBColor(0, 0, 0));
    }

    #[test]
    fn test_no_tiles_draws_nothing() {
        let dir     = tempfile::tempdir().unwrap();
        let gallery = ImageGallery::new(dir.path().join("samples.png"));
        let images  = RawImages::from_pixels(vec![0; IMAGE_SIZE]).unwrap();

        assert!(gallery.render(&images, &[]).is_none());
        assert!(!gallery.path().exists());
    }

    #[test]
    fn test_full_grid_written_to_png() {
        let dir     = tempfile::tempdir().unwrap();
        let gallery = ImageGallery::new(dir.path().join("samples.png"));
        let pixels: Vec<u8> = (0..30 * IMAGE_SIZE).map(|i| (i % 251) as u8).collect();
        let images  = RawImages::from_pixels(pixels).unwrap();
        let labels: Vec<u8> = (0..30).map(|i| (i % 10) as u8).collect();

        let grid = with_predictions(tiles(&labels, 5), &[1; GALLERY_SIZE]);
        assert_eq!(grid.len(), GALLERY_SIZE);

        let written = gallery.render(&images, &grid);
        assert_eq!(written.as_deref(), Some(gallery.path()));
        assert!(gallery.path().is_file());
        assert!(std::fs::metadata(gallery.path()).unwrap().len() > 0);
    }
}
