use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Serialize;

use crate::error::CardError;
use super::image::ensure_not_empty;

/// 读取图片并统一转成8位RGB，读取失败在任何处理之前报错
pub fn load_rgb_image(path: &Path) -> crate::error::Result<RgbImage> {
    let img = image::open(path).map_err(|source| CardError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = img.to_rgb8();
    ensure_not_empty(&rgb)?;
    Ok(rgb)
}

pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    img.save(path)
        .with_context(|| format!("Failed to save image: {path:?}"))
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create file: {path:?}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}
