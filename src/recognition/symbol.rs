use image::{imageops, GrayImage, RgbImage};
use imageproc::filter::median_filter;
use log::debug;

use crate::config::SymbolArgs;
use crate::models::card::{CardSymbol, ShapeDescriptor, SymbolRule};
use crate::my_utils::image::mean_intensity;
use crate::my_utils::math::{hu_moments, log_scale};
use crate::recognition::engine::Engine;

/// 大于阈值置255，其余置0
fn binarize(gray: &GrayImage, thresh: u8) -> GrayImage {
    let mut out = gray.clone();
    out.pixels_mut()
        .for_each(|p| p.0[0] = if p.0[0] > thresh { 255 } else { 0 });
    out
}

/// 符号掩码：中值滤波 -> 均值加偏移的二值化 -> 中值滤波
pub fn symbol_mask(gray: &GrayImage, args: &SymbolArgs) -> GrayImage {
    let thresh = (mean_intensity(gray) + args.threshold_offset).clamp(0, 255) as u8;
    let pre = args.pre_median_window / 2;
    let post = args.post_median_window / 2;
    let mask = binarize(&median_filter(gray, pre, pre), thresh);
    median_filter(&mask, post, post)
}

/// 掩码的对数尺度Hu矩
pub fn shape_descriptor(gray: &GrayImage, args: &SymbolArgs) -> ShapeDescriptor {
    let mask = symbol_mask(gray, args);
    ShapeDescriptor(hu_moments(&mask).map(log_scale))
}

/// 按顺序匹配规则表，先命中先返回
///
/// 区间表是按单精度的矩值标定的，比较前先把矩值舍入到f32
pub fn classify_symbol(rules: &[SymbolRule], fallback: CardSymbol, mom2: f64, mom3: f64) -> CardSymbol {
    let (mom2, mom3) = (mom2 as f32 as f64, mom3 as f32 as f64);
    rules
        .iter()
        .find(|rule| rule.matches(mom2, mom3))
        .map(|rule| rule.symbol)
        .unwrap_or(fallback)
}

pub trait RecSymbol {
    /// 识别摆正后卡片上的符号，同时返回形状描述子
    fn rec_symbol(&self, card: &RgbImage) -> (CardSymbol, ShapeDescriptor);
}

impl RecSymbol for Engine {
    fn rec_symbol(&self, card: &RgbImage) -> (CardSymbol, ShapeDescriptor) {
        let args = &self.config().symbol;
        let descriptor = shape_descriptor(&imageops::grayscale(card), args);
        let symbol = classify_symbol(&args.rules, args.fallback, descriptor.mom2(), descriptor.mom3());
        debug!(
            "mom2={:.4} mom3={:.4} -> {symbol}",
            descriptor.mom2(),
            descriptor.mom3()
        );
        (symbol, descriptor)
    }
}
