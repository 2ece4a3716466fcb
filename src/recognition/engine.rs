use image::RgbImage;
use log::{debug, info};

use crate::config::Config;
use crate::error::{CardError, Result};
use crate::models::card::{Card, CardRegion};
use crate::my_utils::image::ensure_not_empty;
use crate::recognition::color::RecColor;
use crate::recognition::localize::RecLocate;
use crate::recognition::preprocess::RecPreprocess;
use crate::recognition::rectify::RecRectify;
use crate::recognition::symbol::RecSymbol;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    /// 校验配置后构建引擎
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Engine { config })
    }

    /// 跨模块实现trait的时候访问不到成员变量，需要调用此函数
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 找出图中所有卡片区域，顺序为轮廓被发现的顺序
    pub fn locate(&self, img: &RgbImage) -> Result<Vec<CardRegion>> {
        ensure_not_empty(img)?;
        let processed = self.preprocess(img)?;
        let regions = self.locate_cards(&processed.edges);
        info!(
            "located {} card(s) in {}x{} image (blurred: {})",
            regions.len(),
            img.width(),
            img.height(),
            processed.blurred
        );
        Ok(regions)
    }

    /// 摆正单张卡片并识别颜色和符号
    pub fn recognize_card(&self, img: &RgbImage, region: CardRegion) -> Result<Card> {
        let card_img = self.rectify(img, &region)?;
        let color = self.rec_color(&card_img)?;
        let (symbol, descriptor) = self.rec_symbol(&card_img);
        debug!(
            "card at ({:.1}, {:.1}): {color} {symbol}",
            region.center.x, region.center.y
        );
        Ok(Card {
            center: region.center,
            region,
            image: card_img,
            color,
            symbol,
            descriptor,
        })
    }

    /// 识别图中所有卡片
    pub fn recognize(&self, img: &RgbImage) -> Result<Vec<Card>> {
        let regions = self.locate(img)?;
        self.recognize_regions(img, regions)
    }

    /// 卡片数量必须等于expected，数量不对时不做后续识别
    pub fn recognize_exact(&self, img: &RgbImage, expected: usize) -> Result<Vec<Card>> {
        let regions = self.locate(img)?;
        if regions.len() != expected {
            return Err(CardError::CardCount {
                expected,
                found: regions.len(),
            });
        }
        self.recognize_regions(img, regions)
    }

    #[cfg(not(feature = "parallel"))]
    fn recognize_regions(&self, img: &RgbImage, regions: Vec<CardRegion>) -> Result<Vec<Card>> {
        regions
            .into_iter()
            .map(|region| self.recognize_card(img, region))
            .collect()
    }

    // 每张卡片互不相关，并行后collect保持原顺序
    #[cfg(feature = "parallel")]
    fn recognize_regions(&self, img: &RgbImage, regions: Vec<CardRegion>) -> Result<Vec<Card>> {
        regions
            .into_par_iter()
            .map(|region| self.recognize_card(img, region))
            .collect()
    }
}
