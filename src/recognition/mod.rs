//! 识别流程，按数据流顺序排列

pub mod blur;
pub mod preprocess;
pub mod localize;
pub mod rectify;
pub mod color;
pub mod symbol;
pub mod annotate;
pub mod engine;
