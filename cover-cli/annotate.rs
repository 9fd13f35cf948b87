use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cover_engine::MatchResult;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const BOX_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: i32 = 2;

/// Write a copy of `source` into `out_dir` with the detection box drawn on it.
///
/// Returns `None` when there is nothing to draw.
pub fn write_annotated(source: &Path, result: &MatchResult, out_dir: &Path) -> Result<Option<PathBuf>> {
    let b = result.bounding_box();
    if b.is_empty() {
        return Ok(None);
    }

    let mut canvas: RgbImage = image::open(source)
        .with_context(|| format!("reopening {}", source.display()))?
        .to_rgb8();
    for inset in 0..BOX_THICKNESS {
        let width = b.width.saturating_sub(2 * inset as u32);
        let height = b.height.saturating_sub(2 * inset as u32);
        if width == 0 || height == 0 {
            break;
        }
        draw_hollow_rect_mut(&mut canvas, Rect::at(b.x + inset, b.y + inset).of_size(width, height), BOX_COLOUR);
    }

    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let name = source.file_name().context("image path has no file name")?;
    let out = out_dir.join(name);
    canvas.save(&out).with_context(|| format!("saving {}", out.display()))?;
    Ok(Some(out))
}
