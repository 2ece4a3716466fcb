//! 卡片相关的结构体

use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::my_utils::math::euclidean_distance;

/// 图像坐标系下的点，x向右，y向下
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct CardPoint {
    pub x: f32,
    pub y: f32,
}

impl CardPoint {
    pub fn new(x: f32, y: f32) -> Self {
        CardPoint { x, y }
    }

    pub fn distance(&self, other: &CardPoint) -> f32 {
        euclidean_distance((self.x, self.y), (other.x, other.y))
    }
}

/// 轮廓的最小外接旋转矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardRegion {
    /// 顺时针排列，从最上方的角点开始（同高取最左）
    pub corners: [CardPoint; 4],
    /// 四个角点的均值，用来放置标签
    pub center: CardPoint,
    /// 边 0->1 的长度
    pub width: f32,
    /// 边 0->3 的长度
    pub height: f32,
    /// 边 0->1 的角度，单位度
    pub angle: f32,
    /// 原始轮廓围成的面积
    pub contour_area: f64,
}

impl CardRegion {
    /// 由有序角点构建区域
    pub fn from_corners(corners: [CardPoint; 4], contour_area: f64) -> Self {
        let center = CardPoint::new(
            corners.iter().map(|p| p.x).sum::<f32>() / 4.0,
            corners.iter().map(|p| p.y).sum::<f32>() / 4.0,
        );
        let width = corners[0].distance(&corners[1]);
        let height = corners[0].distance(&corners[3]);
        let angle = (corners[1].y - corners[0].y)
            .atan2(corners[1].x - corners[0].x)
            .to_degrees();
        CardRegion {
            corners,
            center,
            width,
            height,
            angle,
            contour_area,
        }
    }

    /// 映射到竖版目标矩形时使用的角点顺序
    ///
    /// 边 0->1 比边 0->3 短时直接使用，否则整体错位一格，
    /// 保证长边总是对应目标矩形的高。
    pub fn portrait_corners(&self) -> [CardPoint; 4] {
        let c = &self.corners;
        if c[0].distance(&c[1]) < c[0].distance(&c[3]) {
            *c
        } else {
            [c[3], c[0], c[1], c[2]]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardColor {
    Blue,
    Green,
    Yellow,
    Red,
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardColor::Blue => "Blue",
            CardColor::Green => "Green",
            CardColor::Yellow => "Yellow",
            CardColor::Red => "Red",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardSymbol {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "8")]
    Eight,
    Reverse,
    Stop,
}

impl fmt::Display for CardSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardSymbol::Zero => "0",
            CardSymbol::One => "1",
            CardSymbol::Eight => "8",
            CardSymbol::Reverse => "Reverse",
            CardSymbol::Stop => "Stop",
        };
        f.write_str(name)
    }
}

/// 七个对数化的Hu不变矩
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptor(pub [f64; 7]);

impl ShapeDescriptor {
    pub fn mom2(&self) -> f64 {
        self.0[1]
    }

    pub fn mom3(&self) -> f64 {
        self.0[2]
    }
}

/// 数值区间，边界缺省表示无界
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub min_inclusive: bool,
    #[serde(default)]
    pub max_inclusive: bool,
}

impl Interval {
    /// (min, max)
    pub fn open(min: f64, max: f64) -> Self {
        Interval {
            min: Some(min),
            max: Some(max),
            min_inclusive: false,
            max_inclusive: false,
        }
    }

    /// [min, max]
    pub fn closed(min: f64, max: f64) -> Self {
        Interval {
            min: Some(min),
            max: Some(max),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// (-inf, max]
    pub fn at_most(max: f64) -> Self {
        Interval {
            min: None,
            max: Some(max),
            min_inclusive: false,
            max_inclusive: true,
        }
    }

    pub fn unbounded() -> Self {
        Interval {
            min: None,
            max: None,
            min_inclusive: false,
            max_inclusive: false,
        }
    }

    /// NaN不属于任何区间
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let above_min = match self.min {
            Some(min) if self.min_inclusive => value >= min,
            Some(min) => value > min,
            None => true,
        };
        let below_max = match self.max {
            Some(max) if self.max_inclusive => value <= max,
            Some(max) => value < max,
            None => true,
        };
        above_min && below_max
    }
}

/// 符号判定规则：mom2 和 mom3 各自落在任一区间内即命中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRule {
    pub symbol: CardSymbol,
    pub mom2: Vec<Interval>,
    pub mom3: Vec<Interval>,
}

impl SymbolRule {
    pub fn new(symbol: CardSymbol, mom2: Vec<Interval>, mom3: Vec<Interval>) -> Self {
        SymbolRule { symbol, mom2, mom3 }
    }

    pub fn matches(&self, mom2: f64, mom3: f64) -> bool {
        self.mom2.iter().any(|r| r.contains(mom2)) && self.mom3.iter().any(|r| r.contains(mom3))
    }
}

/// 最终输出的一张卡片
#[derive(Debug, Clone)]
pub struct Card {
    pub center: CardPoint,
    pub region: CardRegion,
    /// 摆正后的标准尺寸图
    pub image: RgbImage,
    pub color: CardColor,
    pub symbol: CardSymbol,
    pub descriptor: ShapeDescriptor,
}

impl Card {
    /// "<Color> <Symbol>"
    pub fn label(&self) -> String {
        format!("{} {}", self.color, self.symbol)
    }
}
