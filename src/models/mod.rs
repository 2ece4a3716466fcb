//! 定义输入输出和公用结构体

pub mod card;
pub mod rec_result;

/// 定义引擎各阶段之间传递的结构体
pub mod engine_rec {
    use image::GrayImage;

    /// 预处理的产物
    #[derive(Debug, Clone)]
    pub struct Preprocessed {
        /// 处理后的灰度图（模糊时为锐化+中值滤波后的结果）
        pub gray: GrayImage,
        /// canny边缘图，0或255
        pub edges: GrayImage,
        /// 原图是否被判定为模糊
        pub blurred: bool,
    }
}
