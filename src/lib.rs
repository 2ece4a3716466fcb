pub mod recognition;
pub mod models;
pub mod my_utils;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests {
    use anyhow::{Ok, Result};
    use image::{imageops, Rgb, RgbImage};
    use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

    use super::*;
    use config::Config;
    use models::card::{Card, CardColor, CardSymbol, Interval, SymbolRule};
    use recognition::engine::Engine;

    const CARD_W: u32 = 300;
    const CARD_H: u32 = 400;

    /// 纯色卡片，中心有一块白色矩形作为符号
    fn make_card(fill: Rgb<u8>, patch_w: u32, patch_h: u32) -> RgbImage {
        let (x0, y0) = ((CARD_W - patch_w) / 2, (CARD_H - patch_h) / 2);
        RgbImage::from_fn(CARD_W, CARD_H, |x, y| {
            if (x0..x0 + patch_w).contains(&x) && (y0..y0 + patch_h).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                fill
            }
        })
    }

    fn engine_for_synthetic() -> Result<Engine> {
        let mut config = Config::default();
        config.locate.min_card_area = 100_000.0;
        // 按白色矩形的长宽比区分：2:1 -> 1，3:1 -> 8，正方形落到兜底
        config.symbol.rules = vec![
            SymbolRule::new(CardSymbol::One, vec![Interval::open(6.4, 6.9)], vec![Interval::unbounded()]),
            SymbolRule::new(CardSymbol::Eight, vec![Interval::open(5.8, 6.3)], vec![Interval::unbounded()]),
        ];
        Ok(Engine::new(config)?)
    }

    fn mean_abs_diff(a: &RgbImage, b: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> f64 {
        let mut total = 0u64;
        let mut count = 0u64;
        for y in ys {
            for x in xs.clone() {
                let (pa, pb) = (a.get_pixel(x, y), b.get_pixel(x, y));
                for ch in 0..3 {
                    total += (pa[ch] as i32 - pb[ch] as i32).unsigned_abs() as u64;
                }
                count += 3;
            }
        }
        total as f64 / count as f64
    }

    /// 把卡片绕(cx, cy)旋转后画到黑色画布上
    fn place_rotated(canvas: &mut RgbImage, art: &RgbImage, cx: f32, cy: f32, degrees: f32) {
        let (s, c) = degrees.to_radians().sin_cos();
        let (w, h) = (art.width() as f32, art.height() as f32);
        let from = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let to = from.map(|(x, y)| {
            let (dx, dy) = (x - w / 2.0, y - h / 2.0);
            (cx + dx * c - dy * s, cy + dx * s + dy * c)
        });
        let projection = Projection::from_control_points(from, to).unwrap();
        warp_into(art, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), canvas);
    }

    fn find_card_at(cards: &[Card], x: f32, y: f32) -> &Card {
        cards
            .iter()
            .find(|card| (card.center.x - x).abs() < 20.0 && (card.center.y - y).abs() < 20.0)
            .unwrap_or_else(|| panic!("no card near ({x}, {y})"))
    }

    #[test]
    fn test_four_card_deal() -> Result<()> {
        let deal = [
            (50, 50, make_card(Rgb([255, 90, 90]), 120, 60), CardColor::Red, CardSymbol::One),
            (410, 50, make_card(Rgb([90, 220, 90]), 80, 80), CardColor::Green, CardSymbol::Stop),
            (50, 510, make_card(Rgb([200, 200, 60]), 60, 120), CardColor::Yellow, CardSymbol::One),
            (410, 510, make_card(Rgb([90, 160, 255]), 150, 50), CardColor::Blue, CardSymbol::Eight),
        ];
        let mut canvas = RgbImage::new(760, 960);
        for (x, y, art, _, _) in &deal {
            imageops::replace(&mut canvas, art, *x, *y);
        }

        let engine = engine_for_synthetic()?;
        let cards = engine.recognize_exact(&canvas, 4)?;
        assert_eq!(cards.len(), 4);
        for (x, y, _, color, symbol) in &deal {
            let (cx, cy) = (*x as f32 + 150.0, *y as f32 + 200.0);
            let card = find_card_at(&cards, cx, cy);
            assert_eq!(card.color, *color, "card at ({x}, {y})");
            assert_eq!(card.symbol, *symbol, "card at ({x}, {y}), descriptor {:?}", card.descriptor);
            assert_eq!(card.label(), format!("{color} {symbol}"));
            assert_eq!(card.image.dimensions(), (CARD_W, CARD_H));
            // 中心点在卡片内
            assert!(card.center.x > *x as f32 && card.center.x < (*x + 300) as f32);
            assert!(card.center.y > *y as f32 && card.center.y < (*y + 400) as f32);
        }

        // 期望数量不对时报错
        let err = engine.recognize_exact(&canvas, 3).unwrap_err();
        assert!(matches!(err, error::CardError::CardCount { expected: 3, found: 4 }));
        Ok(())
    }

    #[test]
    fn test_rectify_round_trip() -> Result<()> {
        let mut art = RgbImage::from_pixel(CARD_W, CARD_H, Rgb([200, 200, 60]));
        for y in 80..240 {
            for x in 60..180 {
                art.put_pixel(x, y, Rgb([30, 30, 160]));
            }
        }
        let mut canvas = RgbImage::new(900, 900);
        place_rotated(&mut canvas, &art, 450.0, 450.0, 20.0);

        let engine = engine_for_synthetic()?;
        let regions = engine.locate(&canvas)?;
        assert_eq!(regions.len(), 1);
        assert!((regions[0].angle - 20.0).abs() < 2.0, "angle {}", regions[0].angle);

        let card = engine.recognize_card(&canvas, regions[0])?;
        let diff = mean_abs_diff(&card.image, &art, 20..280, 20..380);
        assert!(diff < 15.0, "mean abs diff {diff}");
        Ok(())
    }

    #[test]
    fn test_half_turn_rectifies_to_half_turn() -> Result<()> {
        let mut art = make_card(Rgb([90, 220, 90]), 120, 60);
        for y in 20..100 {
            for x in 20..80 {
                art.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        let mut canvas = RgbImage::new(900, 900);
        place_rotated(&mut canvas, &art, 450.0, 450.0, 35.0);
        let turned = imageops::rotate180(&canvas);

        let engine = engine_for_synthetic()?;
        let first = engine.recognize_exact(&canvas, 1)?;
        let second = engine.recognize_exact(&turned, 1)?;
        let expected = imageops::rotate180(&first[0].image);
        let diff = mean_abs_diff(&second[0].image, &expected, 20..280, 20..380);
        assert!(diff < 15.0, "mean abs diff {diff}");
        Ok(())
    }
}
