//! Utility modules

pub mod image;

pub use self::image::ImageUtils;
