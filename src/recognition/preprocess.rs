use image::{imageops, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::median_filter;
use log::debug;

use crate::config::EdgeArgs;
use crate::error::Result;
use crate::models::engine_rec::Preprocessed;
use crate::my_utils::image::{ensure_not_empty, unsharp_mask};
use crate::recognition::blur::RecBlur;
use crate::recognition::engine::Engine;

pub trait RecPreprocess {
    /// 灰度化并根据模糊程度选择不同的锐化、滤波和边缘参数
    fn preprocess(&self, img: &RgbImage) -> Result<Preprocessed>;
}

impl RecPreprocess for Engine {
    fn preprocess(&self, img: &RgbImage) -> Result<Preprocessed> {
        ensure_not_empty(img)?;
        let args = &self.config().image_process;
        let gray = imageops::grayscale(img);
        let blurred = self.rec_blur(&gray)?;

        let (gray, edge_args): (_, &EdgeArgs) = if blurred {
            // 模糊图先多次锐化，对比度被放大后用更紧的canny阈值
            let sharpened = unsharp_mask(&gray, &args.sharpen);
            (sharpened, &args.blurred_edges)
        } else {
            (gray, &args.sharp_edges)
        };

        let radius = edge_args.median_window / 2;
        let gray = median_filter(&gray, radius, radius);
        let edges = canny(&gray, edge_args.canny_low, edge_args.canny_high);
        debug!(
            "preprocess: blurred={blurred}, median window {}, canny {}/{}",
            edge_args.median_window, edge_args.canny_low, edge_args.canny_high
        );

        Ok(Preprocessed { gray, edges, blurred })
    }
}
