//! Captured canvas images and tolerant comparison.
//!
//! Fixture convention: a frame matches its baseline when at most
//! [`FIXTURE_MAX_DIFF_PIXELS`] pixels differ by more than [`FIXTURE_THRESHOLD`].

use std::path::Path;

use anyhow::{Context, Result};

use crate::canvas::CanvasSize;

/// Per-channel tolerance, as a fraction of full scale.
pub const FIXTURE_THRESHOLD: f32 = 0.2;

/// Pixels allowed to exceed the tolerance.
pub const FIXTURE_MAX_DIFF_PIXELS: usize = 100;

/// An RGBA8 image, rows top to bottom, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    size: CanvasSize,
    rgba: Vec<u8>,
}

/// Outcome of [`Snapshot::diff`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SnapshotDiff {
    pub differing_pixels: usize,
    pub total_pixels: usize,
}

impl SnapshotDiff {
    pub fn within(self, max_differing_pixels: usize) -> bool {
        self.differing_pixels <= max_differing_pixels
    }

    /// Applies the fixture convention.
    pub fn matches_fixture(self) -> bool {
        self.within(FIXTURE_MAX_DIFF_PIXELS)
    }
}

impl Snapshot {
    pub fn new(size: CanvasSize, rgba: Vec<u8>) -> Result<Self> {
        let expected = size.pixel_count() * 4;
        anyhow::ensure!(
            rgba.len() as u64 == expected,
            "snapshot of {}x{} needs {expected} bytes, got {}",
            size.width,
            size.height,
            rgba.len()
        );
        Ok(Self { size, rgba })
    }

    /// A snapshot where every pixel is `color`.
    pub fn filled(size: CanvasSize, color: [u8; 4]) -> Self {
        let rgba = color.repeat(size.pixel_count() as usize);
        Self { size, rgba }
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Returns the pixel at `(x, y)`; `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        let p = &self.rgba[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Counts pixels where any channel differs by more than `threshold`
    /// (0..1 of full scale).
    pub fn diff(&self, other: &Snapshot, threshold: f32) -> Result<SnapshotDiff> {
        anyhow::ensure!(
            self.size == other.size,
            "snapshot sizes differ: {}x{} vs {}x{}",
            self.size.width,
            self.size.height,
            other.size.width,
            other.size.height
        );

        let tolerance = (threshold.clamp(0.0, 1.0) * 255.0).round() as u8;
        let differing_pixels = self
            .rgba
            .chunks_exact(4)
            .zip(other.rgba.chunks_exact(4))
            .filter(|(a, b)| a.iter().zip(b.iter()).any(|(x, y)| x.abs_diff(*y) > tolerance))
            .count();

        Ok(SnapshotDiff {
            differing_pixels,
            total_pixels: self.size.pixel_count() as usize,
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        image::save_buffer(
            path,
            &self.rgba,
            self.size.width,
            self.size.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("failed to write snapshot {}", path.display()))
    }

    pub fn load_png(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?
            .to_rgba8();
        let size = CanvasSize::new(img.width(), img.height());
        Self::new(size, img.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> CanvasSize {
        CanvasSize::new(4, 2)
    }

    #[test]
    fn filled_snapshot_has_color_everywhere() {
        let s = Snapshot::filled(size(), [1, 2, 3, 4]);
        assert_eq!(s.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(s.pixel(3, 1), Some([1, 2, 3, 4]));
        assert_eq!(s.pixel(4, 0), None);
    }

    #[test]
    fn wrong_byte_count_is_rejected() {
        assert!(Snapshot::new(size(), vec![0; 31]).is_err());
    }

    #[test]
    fn diff_counts_pixels_past_threshold() {
        let a = Snapshot::filled(size(), [0, 0, 0, 255]);
        let mut rgba = a.rgba().to_vec();
        // Pixel 0: small change, within 0.2.
        rgba[0] = 40;
        // Pixel 5: large change.
        rgba[5 * 4 + 1] = 200;
        let b = Snapshot::new(size(), rgba).unwrap();

        let d = a.diff(&b, FIXTURE_THRESHOLD).unwrap();
        assert_eq!(d.differing_pixels, 1);
        assert_eq!(d.total_pixels, 8);
        assert!(d.within(1));
        assert!(!d.within(0));

        assert_eq!(a.diff(&b, 0.0).unwrap().differing_pixels, 2);
    }

    #[test]
    fn diff_rejects_mismatched_sizes() {
        let a = Snapshot::filled(size(), [0; 4]);
        let b = Snapshot::filled(CanvasSize::new(2, 4), [0; 4]);
        assert!(a.diff(&b, 0.2).is_err());
    }

    #[test]
    fn png_preserves_pixels() {
        let mut rgba = Snapshot::filled(size(), [10, 20, 30, 255]).rgba().to_vec();
        rgba[4..8].copy_from_slice(&[255, 0, 0, 0]);
        let s = Snapshot::new(size(), rgba).unwrap();

        let path = std::env::temp_dir().join(format!("fieldview-snapshot-{}.png", std::process::id()));
        s.save_png(&path).unwrap();
        let loaded = Snapshot::load_png(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, s);
    }
}
