use image::{GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use imageproc::filter::{gaussian_blur_f32, separable_filter_equal};

use crate::config::{Disc, SharpenArgs, Window};
use crate::error::{CardError, Result};

/// 零尺寸图片不能进入识别流程
pub fn ensure_not_empty<I: GenericImageView>(img: &I) -> Result<()> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(CardError::EmptyImage { width, height });
    }
    Ok(())
}

/// reflect-101 边界，…cb|abcd|cb…
fn reflect101(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }
    i as usize
}

/// 四邻域拉普拉斯响应，按行展开
pub fn laplacian(gray: &GrayImage) -> Vec<f32> {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let src = gray.as_raw();
    let at = |x: i64, y: i64| src[reflect101(y, h) * w as usize + reflect101(x, w)] as f32;
    let mut out = Vec::with_capacity(src.len());
    for y in 0..h {
        for x in 0..w {
            out.push(at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y));
        }
    }
    out
}

/// 归一化的一维高斯核
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let r = (size / 2) as i32;
    let kernel: Vec<f32> = (-r..=r)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.into_iter().map(|k| k / sum).collect()
}

/// 逐通道转成f32平面做高斯模糊，按原像素排列返回，边界按复制处理
///
/// 在f32上计算，避免imageproc写回u8时截断小数
pub fn gaussian_blur_planes<P>(img: &ImageBuffer<P, Vec<u8>>, args: &SharpenArgs) -> Vec<f32>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = img.dimensions();
    let c = P::CHANNEL_COUNT as usize;
    let kernel = args.kernel_size.map(|size| gaussian_kernel(size, args.sigma));
    let src = img.as_raw();
    let mut out = vec![0f32; src.len()];
    for ch in 0..c {
        let plane: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_raw(w, h, src.iter().skip(ch).step_by(c).map(|&v| v as f32).collect())
                .unwrap_or_else(|| ImageBuffer::new(w, h));
        let blurred = match &kernel {
            Some(kernel) => separable_filter_equal(&plane, kernel),
            None => gaussian_blur_f32(&plane, args.sigma),
        };
        for (i, v) in blurred.as_raw().iter().enumerate() {
            out[i * c + ch] = *v;
        }
    }
    out
}

/// (1+alpha)*img - alpha*blurred，四舍五入后截断到0~255
pub fn add_weighted<P>(img: &ImageBuffer<P, Vec<u8>>, blurred: &[f32], alpha: f32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let mut out = img.clone();
    {
        let dst: &mut [u8] = &mut out;
        for (o, &b) in dst.iter_mut().zip(blurred.iter()) {
            let v = (1.0 + alpha) * *o as f32 - alpha * b;
            *o = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// 多次反锐化掩模，每次都在上一次的结果上进行
pub fn unsharp_mask<P>(img: &ImageBuffer<P, Vec<u8>>, args: &SharpenArgs) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let mut out = img.clone();
    for _ in 0..args.passes {
        let blurred = gaussian_blur_planes(&out, args);
        out = add_weighted(&out, &blurred, args.alpha);
    }
    out
}

/// 每个通道单独二值化，大于阈值为255
pub fn threshold_channels(img: &RgbImage, thresh: u8) -> RgbImage {
    let mut out = img.clone();
    out.pixels_mut().for_each(|pixel| {
        for v in pixel.0.iter_mut() {
            *v = if *v > thresh { 255 } else { 0 };
        }
    });
    out
}

/// 各通道均值，顺序为R,G,B
pub fn channel_means(img: &RgbImage) -> [f64; 3] {
    let mut sums = [0u64; 3];
    for pixel in img.pixels() {
        for (sum, v) in sums.iter_mut().zip(pixel.0) {
            *sum += v as u64;
        }
    }
    let n = (img.width() as u64 * img.height() as u64).max(1) as f64;
    sums.map(|s| s as f64 / n)
}

/// 整数灰度均值
pub fn mean_intensity(gray: &GrayImage) -> i32 {
    let n = gray.as_raw().len() as u64;
    if n == 0 {
        return 0;
    }
    let sum: u64 = gray.as_raw().iter().map(|&v| v as u64).sum();
    (sum / n) as i32
}

/**
 * 截取图像
 */
pub fn crop_image(input_image: &RgbImage, window: &Window) -> RgbImage {
    let (width, height) = (window.w, window.h);
    let mut cropped_image = RgbImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let src_x = window.x + x;
            let src_y = window.y + y;
            if src_x < input_image.width() && src_y < input_image.height() {
                cropped_image.put_pixel(x, y, *input_image.get_pixel(src_x, src_y));
            }
        }
    }
    cropped_image
}

/// 圆外置黑
pub fn apply_disc_mask(img: &RgbImage, disc: &Disc) -> RgbImage {
    let mut out = img.clone();
    let r2 = (disc.radius as i64).pow(2);
    out.enumerate_pixels_mut().for_each(|(x, y, pixel)| {
        let dx = x as i64 - disc.cx as i64;
        let dy = y as i64 - disc.cy as i64;
        if dx * dx + dy * dy > r2 {
            *pixel = Rgb([0, 0, 0]);
        }
    });
    out
}
