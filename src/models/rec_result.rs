/*
    输出结构
*/

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::card::{Card, CardColor, CardPoint, CardSymbol};

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputRec {
    pub image_size: ImageSize,
    pub cards: Vec<CardRec>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageSize {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardRec {
    pub index: usize,
    pub center: CardPoint,
    pub corners: [CardPoint; 4],
    pub color: CardColor,
    pub symbol: CardSymbol,
    pub label: String,
}

impl OutputRec {
    pub fn new(img: &RgbImage, cards: &[Card]) -> Self {
        let cards = cards
            .iter()
            .enumerate()
            .map(|(index, card)| CardRec {
                index,
                center: card.center,
                corners: card.region.corners,
                color: card.color,
                symbol: card.symbol,
                label: card.label(),
            })
            .collect();
        OutputRec {
            image_size: ImageSize {
                w: img.width(),
                h: img.height(),
            },
            cards,
        }
    }
}
