//! Image loading and region utilities

use crate::Result;
use crate::bbox::BBox;
use anyhow::Context;
use image::{DynamicImage, RgbImage, RgbaImage, imageops};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load any supported image file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        image::open(&path).with_context(|| format!("Failed to open image: {:?}", path.as_ref()))
    }

    /// Load image as 8-bit RGB
    pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
        Ok(Self::load(path)?.to_rgb8())
    }

    /// Drop the alpha channel from a camera frame
    pub fn rgba_to_rgb(rgba_image: &RgbaImage) -> RgbImage {
        let (width, height) = rgba_image.dimensions();
        let mut rgb_image = RgbImage::new(width, height);

        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            rgb_image.put_pixel(x, y, image::Rgb([pixel[0], pixel[1], pixel[2]]));
        }

        rgb_image
    }

    /// Copy out the part of `image` covered by `bbox`, clipped to the image.
    /// `None` when the clipped region is empty.
    pub fn crop_to_bbox(image: &RgbImage, bbox: &BBox) -> Option<RgbImage> {
        let (x, y, width, height) = bbox.clamp_to(image.width(), image.height())?;
        Some(imageops::crop_imm(image, x, y, width, height).to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_rgb_conversion() {
        let rgba_img = RgbaImage::from_pixel(5, 4, image::Rgba([10, 20, 30, 128]));
        let rgb_img = ImageUtils::rgba_to_rgb(&rgba_img);

        assert_eq!(rgba_img.dimensions(), rgb_img.dimensions());
        assert_eq!(rgb_img.get_pixel(4, 3), &image::Rgb([10, 20, 30]));
    }

    #[test]
    fn test_crop_to_bbox() {
        let img = RgbImage::from_fn(10, 10, |x, y| image::Rgb([x as u8, y as u8, 0]));

        let crop = ImageUtils::crop_to_bbox(&img, &BBox::new(8, 2, 5, 3, 0.9)).expect("crop");
        assert_eq!(crop.dimensions(), (2, 3));
        assert_eq!(crop.get_pixel(0, 0), &image::Rgb([8, 2, 0]));

        assert!(ImageUtils::crop_to_bbox(&img, &BBox::new(0, 0, 0, 0, 0.9)).is_none());
    }

    #[test]
    fn test_load_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3])).save(&path)?;

        let loaded = ImageUtils::load_rgb(&path)?;
        assert_eq!(loaded.dimensions(), (3, 2));
        assert!(ImageUtils::load_rgb(dir.path().join("missing.png")).is_err());
        Ok(())
    }
}
