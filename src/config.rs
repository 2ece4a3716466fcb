use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::{CardError, Result};
use crate::models::card::{CardSymbol, Interval, SymbolRule};

/// 模糊判定参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlurArgs {
    /// 拉普拉斯响应的方差，小于等于该值视为模糊
    pub variance_threshold: f64,
}

/// 反锐化掩模参数，sharpened = (1+alpha)*src - alpha*blurred
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SharpenArgs {
    pub passes: u32,
    pub alpha: f32,
    pub sigma: f32,
    /// 高斯核边长，为空时按sigma自动确定
    #[serde(default)]
    pub kernel_size: Option<u32>,
}

/// 中值滤波+canny参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EdgeArgs {
    /// 中值滤波窗口边长，奇数
    pub median_window: u32,
    pub canny_low: f32,
    pub canny_high: f32,
}

/// 图片预处理参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageProcess {
    /// 模糊图的锐化参数
    pub sharpen: SharpenArgs,
    /// 模糊图锐化后的边缘参数
    pub blurred_edges: EdgeArgs,
    /// 清晰图的边缘参数
    pub sharp_edges: EdgeArgs,
    /// 边缘图膨胀次数
    pub dilate_passes: u32,
    /// 膨胀半径，1对应3x3的方形核
    pub dilate_radius: u8,
}

/// 卡片定位参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CardLocate {
    /// 轮廓面积下限，单位像素²，按参考分辨率标定
    pub min_card_area: f64,
    /// 设置后按原图面积的比例计算面积下限，替代min_card_area
    #[serde(default)]
    pub min_card_area_ratio: Option<f64>,
}

impl CardLocate {
    pub fn area_threshold(&self, width: u32, height: u32) -> f64 {
        match self.min_card_area_ratio {
            Some(ratio) => ratio * width as f64 * height as f64,
            None => self.min_card_area,
        }
    }
}

/// 摆正后的标准卡片尺寸（竖版）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CardFrame {
    pub width: u32,
    pub height: u32,
}

/// 标准卡片坐标系下的矩形窗口
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Window {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// 标准卡片坐标系下的圆形区域
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Disc {
    pub cx: i32,
    pub cy: i32,
    pub radius: i32,
}

/// 颜色识别参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColorArgs {
    pub window: Window,
    /// 裁剪前只保留符号所在的圆，为空时不做遮罩
    #[serde(default)]
    pub disc_mask: Option<Disc>,
    pub sharpen: SharpenArgs,
    /// 各通道二值化阈值
    pub threshold: u8,
    /// 通道均值大于等于该值视为该通道有颜色
    pub band: f64,
}

/// 符号识别参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SymbolArgs {
    /// 二值化阈值 = 灰度均值 + offset
    pub threshold_offset: i32,
    pub pre_median_window: u32,
    pub post_median_window: u32,
    /// 按顺序匹配，先命中先返回
    pub rules: Vec<SymbolRule>,
    /// 所有规则都不命中时的结果
    pub fallback: CardSymbol,
}

/// 结果渲染参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnnotateArgs {
    pub width: u32,
    pub height: u32,
    pub line_thickness: u32,
    pub marker_radius: i32,
    /// ttf字体，为空时尝试系统字体，都没有则不写标签
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    pub font_scale: f32,
}

/// 配置参数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub blur: BlurArgs,
    pub image_process: ImageProcess,
    pub locate: CardLocate,
    pub card_frame: CardFrame,
    pub color: ColorArgs,
    pub symbol: SymbolArgs,
    pub annotate: AnnotateArgs,
}

/// 经验拟合的符号区间表，数值需保持原样
pub fn default_symbol_rules() -> Vec<SymbolRule> {
    vec![
        SymbolRule::new(
            CardSymbol::Zero,
            vec![Interval::at_most(5.1), Interval::closed(7.35, 7.6)],
            vec![Interval::closed(7.0, 7.1), Interval::open(11.5, 14.2)],
        ),
        SymbolRule::new(
            CardSymbol::One,
            vec![Interval::open(5.65, 5.8), Interval::open(5.9, 6.66)],
            vec![
                Interval::open(8.3, 8.4),
                Interval::open(8.6, 9.35),
                Interval::open(9.36, 9.7),
            ],
        ),
        SymbolRule::new(
            CardSymbol::Eight,
            vec![Interval::open(5.8, 5.9), Interval::open(7.25, 7.74)],
            vec![Interval::open(8.5, 8.7), Interval::open(10.5, 11.2)],
        ),
        SymbolRule::new(
            CardSymbol::Reverse,
            vec![Interval::open(5.9, 6.36)],
            vec![Interval::open(8.4, 8.6), Interval::open(11.6, 13.1)],
        ),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            blur: BlurArgs {
                variance_threshold: 10.0,
            },
            image_process: ImageProcess {
                sharpen: SharpenArgs {
                    passes: 3,
                    alpha: 4.0,
                    sigma: 2.0,
                    kernel_size: None,
                },
                blurred_edges: EdgeArgs {
                    median_window: 5,
                    canny_low: 140.0,
                    canny_high: 255.0,
                },
                sharp_edges: EdgeArgs {
                    median_window: 7,
                    canny_low: 100.0,
                    canny_high: 200.0,
                },
                dilate_passes: 2,
                dilate_radius: 1,
            },
            locate: CardLocate {
                min_card_area: 300000.0,
                min_card_area_ratio: None,
            },
            card_frame: CardFrame {
                width: 300,
                height: 400,
            },
            color: ColorArgs {
                window: Window {
                    x: 30,
                    y: 30,
                    w: 80,
                    h: 80,
                },
                disc_mask: Some(Disc {
                    cx: 70,
                    cy: 65,
                    radius: 45,
                }),
                sharpen: SharpenArgs {
                    passes: 3,
                    alpha: 4.0,
                    sigma: 1.0,
                    kernel_size: Some(3),
                },
                threshold: 90,
                band: 150.0,
            },
            symbol: SymbolArgs {
                threshold_offset: 40,
                pre_median_window: 7,
                post_median_window: 5,
                rules: default_symbol_rules(),
                fallback: CardSymbol::Stop,
            },
            annotate: AnnotateArgs {
                width: 1080,
                height: 640,
                line_thickness: 15,
                marker_radius: 12,
                font_path: None,
                font_scale: 60.0,
            },
        }
    }
}

// 全局默认配置
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default);

impl Config {
    /// 读取yaml配置文件并校验
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Config> {
        let file = File::open(path).with_context(|| format!("Failed to open config file: {path:?}"))?;
        let reader = BufReader::new(file);
        let config: Config = serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse config: {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let frame = &self.card_frame;
        if frame.width == 0 || frame.height == 0 {
            return Err(CardError::Config(format!(
                "card frame must not be empty, got {}x{}",
                frame.width, frame.height
            )));
        }
        let window = &self.color.window;
        let fits = |start: u32, len: u32, limit: u32| len > 0 && start.checked_add(len).is_some_and(|end| end <= limit);
        if !fits(window.x, window.w, frame.width) || !fits(window.y, window.h, frame.height) {
            return Err(CardError::Config(format!(
                "color window {window:?} does not fit into the {}x{} card frame",
                frame.width, frame.height
            )));
        }
        let windows = [
            ("image_process.blurred_edges.median_window", self.image_process.blurred_edges.median_window),
            ("image_process.sharp_edges.median_window", self.image_process.sharp_edges.median_window),
            ("symbol.pre_median_window", self.symbol.pre_median_window),
            ("symbol.post_median_window", self.symbol.post_median_window),
        ];
        for (name, size) in windows {
            if size % 2 == 0 {
                return Err(CardError::Config(format!("{name} must be odd, got {size}")));
            }
        }
        for (name, edges) in [
            ("image_process.blurred_edges", &self.image_process.blurred_edges),
            ("image_process.sharp_edges", &self.image_process.sharp_edges),
        ] {
            if !(edges.canny_low >= 0.0 && edges.canny_low <= edges.canny_high) {
                return Err(CardError::Config(format!(
                    "{name}: canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                    edges.canny_low, edges.canny_high
                )));
            }
        }
        for (name, sharpen) in [("image_process.sharpen", &self.image_process.sharpen), ("color.sharpen", &self.color.sharpen)] {
            if !(sharpen.sigma > 0.0) {
                return Err(CardError::Config(format!("{name}.sigma must be positive")));
            }
            if matches!(sharpen.kernel_size, Some(size) if size % 2 == 0) {
                return Err(CardError::Config(format!("{name}.kernel_size must be odd")));
            }
        }
        let annotate = &self.annotate;
        if annotate.width == 0 || annotate.height == 0 || !(annotate.font_scale > 0.0) {
            return Err(CardError::Config(format!(
                "annotate needs a non-empty output size and a positive font scale, got {}x{} at {}",
                annotate.width, annotate.height, annotate.font_scale
            )));
        }
        if let Some(ratio) = self.locate.min_card_area_ratio {
            if !(0.0..1.0).contains(&ratio) {
                return Err(CardError::Config(format!(
                    "locate.min_card_area_ratio must be in [0, 1), got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DEFAULT_CONFIG.validate().is_ok());
    }

    #[test]
    fn shipped_yaml_matches_defaults() -> anyhow::Result<()> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
        let config = Config::from_yaml_file(&path)?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn yaml_round_trip() -> anyhow::Result<()> {
        let text = serde_yaml::to_string(&Config::default())?;
        let parsed: Config = serde_yaml::from_str(&text)?;
        assert_eq!(parsed, Config::default());
        Ok(())
    }

    #[test]
    fn rejects_window_outside_frame() {
        let mut config = Config::default();
        config.color.window = Window { x: 250, y: 30, w: 80, h: 80 };
        assert!(matches!(config.validate(), Err(CardError::Config(_))));
    }

    #[test]
    fn rejects_window_offset_past_u32() {
        let mut config = Config::default();
        config.color.window = Window { x: u32::MAX - 10, y: 30, w: 80, h: 80 };
        assert!(matches!(config.validate(), Err(CardError::Config(_))));
        let mut config = Config::default();
        config.color.window = Window { x: 30, y: u32::MAX, w: 80, h: 80 };
        assert!(matches!(config.validate(), Err(CardError::Config(_))));
    }

    #[test]
    fn rejects_inverted_canny_thresholds() {
        let mut config = Config::default();
        config.image_process.blurred_edges.canny_low = 300.0;
        assert!(matches!(config.validate(), Err(CardError::Config(_))));

        let mut config = Config::default();
        config.image_process.sharp_edges.canny_low = 210.0;
        config.image_process.sharp_edges.canny_high = 200.0;
        assert!(matches!(config.validate(), Err(CardError::Config(_))));

        // 相等是允许的
        let mut config = Config::default();
        config.image_process.sharp_edges.canny_low = 200.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_canny_in_yaml_fails_at_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.image_process.sharp_edges.canny_low = 250.0;
        std::fs::write(&path, serde_yaml::to_string(&config)?)?;
        let err = Config::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<CardError>(), Some(CardError::Config(_))));
        Ok(())
    }

    #[test]
    fn rejects_even_median_window() {
        let mut config = Config::default();
        config.symbol.pre_median_window = 6;
        assert!(matches!(config.validate(), Err(CardError::Config(_))));
    }

    #[test]
    fn area_threshold_can_follow_resolution() {
        let mut locate = Config::default().locate;
        assert_eq!(locate.area_threshold(4000, 3000), 300000.0);
        locate.min_card_area_ratio = Some(0.025);
        assert_eq!(locate.area_threshold(4000, 3000), 300000.0);
        assert_eq!(locate.area_threshold(2000, 1500), 75000.0);
    }
}
