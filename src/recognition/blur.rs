use image::GrayImage;
use log::debug;

use crate::error::Result;
use crate::my_utils::image::{ensure_not_empty, laplacian};
use crate::my_utils::math::variance;
use crate::recognition::engine::Engine;

/// 拉普拉斯响应在非零像素上的方差
///
/// 图像全黑时返回0
pub fn laplacian_variance(gray: &GrayImage) -> Result<f64> {
    ensure_not_empty(gray)?;
    let lap = laplacian(gray);
    let values: Vec<f64> = lap
        .iter()
        .zip(gray.as_raw().iter())
        .filter(|(_, &p)| p != 0)
        .map(|(&l, _)| l as f64)
        .collect();
    Ok(variance(&values).unwrap_or(0.0))
}

/// 高频能量不足即判定为模糊
pub fn is_blurred(gray: &GrayImage, variance_threshold: f64) -> Result<bool> {
    let variance = laplacian_variance(gray)?;
    debug!("laplacian variance {variance:.3}, threshold {variance_threshold}");
    Ok(variance <= variance_threshold)
}

pub trait RecBlur {
    /// 按配置的阈值判断灰度图是否模糊
    fn rec_blur(&self, gray: &GrayImage) -> Result<bool>;
}

impl RecBlur for Engine {
    fn rec_blur(&self, gray: &GrayImage) -> Result<bool> {
        is_blurred(gray, self.config().blur.variance_threshold)
    }
}
