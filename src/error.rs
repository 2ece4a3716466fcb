use std::path::PathBuf;

use thiserror::Error;

/// 识别流程中的错误
#[derive(Debug, Error)]
pub enum CardError {
    /// 图片不存在或无法解码
    #[error("failed to load image {path:?}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// 检测到的卡片数量和期望数量不一致
    #[error("expected {expected} cards, found {found}")]
    CardCount { expected: usize, found: usize },

    #[error("degenerate card geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CardError>;
