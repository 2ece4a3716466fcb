use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use log::{info, warn};

use crate::config::AnnotateArgs;
use crate::models::card::{Card, CardPoint};

const BOX_COLOR: Rgb<u8> = Rgb([255, 125, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const SYSTEM_FONTS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn load_font(path: &Path) -> Result<FontVec> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read font: {path:?}"))?;
    FontVec::try_from_vec(data).map_err(|_| anyhow!("Failed to parse font: {path:?}"))
}

/// 按配置加载字体，未配置时依次尝试常见的系统字体
pub fn label_font(args: &AnnotateArgs) -> Result<Option<FontVec>> {
    if let Some(path) = &args.font_path {
        return load_font(path).map(Some);
    }
    for path in SYSTEM_FONTS {
        if let Ok(font) = load_font(Path::new(path)) {
            info!("Loaded system font: {path}");
            return Ok(Some(font));
        }
    }
    warn!("No font found, card labels are left out of the annotated image; set annotate.font_path or pass --font");
    Ok(None)
}

/// 通过平移多画几条线得到粗线
fn draw_thick_line(img: &mut RgbImage, p1: CardPoint, p2: CardPoint, thickness: u32, color: Rgb<u8>) {
    let half = (thickness / 2) as i32;
    for offset in -half..=half {
        let offset = offset as f32;
        draw_line_segment_mut(img, (p1.x + offset, p1.y), (p2.x + offset, p2.y), color);
        draw_line_segment_mut(img, (p1.x, p1.y + offset), (p2.x, p2.y + offset), color);
    }
}

/// 在原图副本上画出每张卡片的外框、中心点和标签，再缩放到输出尺寸
///
/// 没有字体时只画外框和中心点
pub fn draw_cards(img: &RgbImage, cards: &[Card], args: &AnnotateArgs, font: Option<&FontVec>) -> RgbImage {
    let mut canvas = img.clone();
    for card in cards {
        let corners = &card.region.corners;
        for i in 0..4 {
            draw_thick_line(&mut canvas, corners[i], corners[(i + 1) % 4], args.line_thickness, BOX_COLOR);
        }
        let center = (card.center.x.round() as i32, card.center.y.round() as i32);
        draw_filled_circle_mut(&mut canvas, center, args.marker_radius, LABEL_COLOR);
        if let Some(font) = font {
            let x = center.0 + args.marker_radius * 2;
            draw_text_mut(&mut canvas, LABEL_COLOR, x, center.1, PxScale::from(args.font_scale), font, &card.label());
        }
    }
    imageops::resize(&canvas, args.width, args.height, FilterType::Triangle)
}
