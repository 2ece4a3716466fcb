use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use crate::error::{CardError, Result};
use crate::models::card::{CardPoint, CardRegion};
use crate::recognition::engine::Engine;

/// 把四边形透视变换到 width x height 的标准矩形，四边形以外填黑
///
/// 角点依次对应目标矩形的左上、右上、右下、左下
pub fn warp_card(img: &RgbImage, corners: &[CardPoint; 4], width: u32, height: u32) -> Result<RgbImage> {
    for i in 0..4 {
        let side = corners[i].distance(&corners[(i + 1) % 4]);
        if !(side >= 1.0) {
            return Err(CardError::DegenerateGeometry(format!(
                "side {i} of quadrilateral {corners:?} is {side} px long"
            )));
        }
    }

    let (w, h) = (width as f32, height as f32);
    let from = corners.map(|p| (p.x, p.y));
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let projection = Projection::from_control_points(from, to).ok_or_else(|| {
        CardError::DegenerateGeometry(format!("no perspective transform for {corners:?}"))
    })?;

    let mut out = RgbImage::new(width, height);
    warp_into(img, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
    Ok(out)
}

pub trait RecRectify {
    /// 按竖版角点顺序摆正卡片
    fn rectify(&self, img: &RgbImage, region: &CardRegion) -> Result<RgbImage>;
}

impl RecRectify for Engine {
    fn rectify(&self, img: &RgbImage, region: &CardRegion) -> Result<RgbImage> {
        let frame = &self.config().card_frame;
        warp_card(img, &region.portrait_corners(), frame.width, frame.height)
    }
}
