//! Conversions from decoded images into grayscale frames

use std::path::Path;

use cover_core::Frame;
use image::{DynamicImage, GrayImage};
use crate::error::{EngineError, EngineResult};

pub fn frame_from_luma(img: GrayImage) -> EngineResult<Frame> {
    let (width, height) = img.dimensions();
    Ok(Frame::new(width as usize, height as usize, img.into_raw())?)
}

/// Colour input is reduced to luma before anything else sees it
pub fn frame_from_image(img: &DynamicImage) -> EngineResult<Frame> {
    frame_from_luma(img.to_luma8())
}

pub fn load_frame(path: &Path) -> EngineResult<Frame> {
    let img = image::open(path).map_err(|source| EngineError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    frame_from_image(&img)
}
