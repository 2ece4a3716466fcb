use image::{imageops, RgbImage};
use log::debug;

use crate::error::Result;
use crate::models::card::CardColor;
use crate::my_utils::image::{apply_disc_mask, channel_means, crop_image, threshold_channels, unsharp_mask};
use crate::recognition::blur::RecBlur;
use crate::recognition::engine::Engine;

/// 由二值化后的通道均值(R,G,B)判断颜色，均值大于等于band视为该通道点亮
pub fn color_from_means(means: [f64; 3], band: f64) -> CardColor {
    let [red, green, blue] = means;
    if blue >= band {
        CardColor::Blue
    } else if green >= band {
        if red >= band {
            CardColor::Yellow
        } else {
            CardColor::Green
        }
    } else {
        CardColor::Red
    }
}

pub trait RecColor {
    /// 识别摆正后卡片的颜色
    fn rec_color(&self, card: &RgbImage) -> Result<CardColor>;
}

impl RecColor for Engine {
    fn rec_color(&self, card: &RgbImage) -> Result<CardColor> {
        let args = &self.config().color;

        let masked;
        let source = match &args.disc_mask {
            Some(disc) => {
                masked = apply_disc_mask(card, disc);
                &masked
            }
            None => card,
        };
        let mut window = crop_image(source, &args.window);

        // 模糊与否看整张卡片
        if self.rec_blur(&imageops::grayscale(card))? {
            window = unsharp_mask(&window, &args.sharpen);
        }

        let binary = threshold_channels(&window, args.threshold);
        let means = channel_means(&binary);
        let color = color_from_means(means, args.band);
        debug!(
            "channel means r={:.1} g={:.1} b={:.1} -> {color}",
            means[0], means[1], means[2]
        );
        Ok(color)
    }
}
