use std::cmp::Ordering;

use image::GrayImage;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::models::card::CardPoint;

/// 欧氏距离
pub fn euclidean_distance(point1: (f32, f32), point2: (f32, f32)) -> f32 {
    let dx = point2.0 - point1.0;
    let dy = point2.1 - point1.1;

    (dx.powi(2) + dy.powi(2)).sqrt()
}

// 计算向量的均值
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// 总体方差
pub fn variance(data: &[f64]) -> Option<f64> {
    let mean = mean(data)?;
    Some(data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64)
}

/// 点集的最小面积外接矩形（旋转卡壳），返回未排序的四个角点
///
/// 凸包少于三个点或者面积为0时返回None
pub fn min_area_rect(points: &[Point<i32>]) -> Option<[CardPoint; 4]> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }
    let pts: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();

    let mut best: Option<(f64, [(f64, f64); 4])> = None;
    for i in 0..pts.len() {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % pts.len()];
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        // 以当前凸包边为u轴
        let (ux, uy) = (dx / len, dy / len);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
        let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
        for &(px, py) in pts.iter() {
            let u = px * ux + py * uy;
            let v = px * vx + py * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.map_or(true, |(best_area, _)| area < best_area) {
            let corner = |u: f64, v: f64| (u * ux + v * vx, u * uy + v * vy);
            best = Some((
                area,
                [
                    corner(min_u, min_v),
                    corner(max_u, min_v),
                    corner(max_u, max_v),
                    corner(min_u, max_v),
                ],
            ));
        }
    }

    let (area, corners) = best?;
    if area <= 0.0 {
        return None;
    }
    Some(corners.map(|(x, y)| CardPoint::new(x as f32, y as f32)))
}

/// 将矩形角点排成顺时针（y轴向下），起点为最上方的点，同高取最左
pub fn order_clockwise_from_top(corners: [CardPoint; 4]) -> [CardPoint; 4] {
    const EPS: f32 = 1e-3;
    let mut corners = corners;
    let signed: f32 = (0..4)
        .map(|i| {
            let p = corners[i];
            let q = corners[(i + 1) % 4];
            p.x * q.y - q.x * p.y
        })
        .sum();
    if signed < 0.0 {
        corners.reverse();
    }

    let top = (0..4)
        .min_by(|&a, &b| {
            let (pa, pb) = (corners[a], corners[b]);
            if (pa.y - pb.y).abs() <= EPS {
                pa.x.partial_cmp(&pb.x).unwrap_or(Ordering::Equal)
            } else {
                pa.y.partial_cmp(&pb.y).unwrap_or(Ordering::Equal)
            }
        })
        .unwrap_or(0);
    corners.rotate_left(top);
    corners
}

/// 灰度图的七个Hu不变矩，像素值直接作为权重
///
/// 全黑图像所有矩都为0
pub fn hu_moments(gray: &GrayImage) -> [f64; 7] {
    let (mut m00, mut m10, mut m01) = (0f64, 0f64, 0f64);
    for (x, y, p) in gray.enumerate_pixels() {
        let v = p.0[0] as f64;
        if v == 0.0 {
            continue;
        }
        m00 += v;
        m10 += x as f64 * v;
        m01 += y as f64 * v;
    }
    if m00 == 0.0 {
        return [0.0; 7];
    }
    let (cx, cy) = (m10 / m00, m01 / m00);

    // 中心矩
    let (mut mu20, mut mu11, mut mu02) = (0f64, 0f64, 0f64);
    let (mut mu30, mut mu21, mut mu12, mut mu03) = (0f64, 0f64, 0f64, 0f64);
    for (x, y, p) in gray.enumerate_pixels() {
        let v = p.0[0] as f64;
        if v == 0.0 {
            continue;
        }
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        mu20 += dx * dx * v;
        mu11 += dx * dy * v;
        mu02 += dy * dy * v;
        mu30 += dx * dx * dx * v;
        mu21 += dx * dx * dy * v;
        mu12 += dx * dy * dy * v;
        mu03 += dy * dy * dy * v;
    }

    // 归一化中心矩
    let s2 = m00.powi(2);
    let s3 = m00.powf(2.5);
    let (n20, n11, n02) = (mu20 / s2, mu11 / s2, mu02 / s2);
    let (n30, n21, n12, n03) = (mu30 / s3, mu21 / s3, mu12 / s3, mu03 / s3);

    let t0 = n30 + n12;
    let t1 = n21 + n03;
    let q0 = n30 - 3.0 * n12;
    let q1 = 3.0 * n21 - n03;

    [
        n20 + n02,
        (n20 - n02).powi(2) + 4.0 * n11 * n11,
        q0 * q0 + q1 * q1,
        t0 * t0 + t1 * t1,
        q0 * t0 * (t0 * t0 - 3.0 * t1 * t1) + q1 * t1 * (3.0 * t0 * t0 - t1 * t1),
        (n20 - n02) * (t0 * t0 - t1 * t1) + 4.0 * n11 * t0 * t1,
        q1 * t0 * (t0 * t0 - 3.0 * t1 * t1) - q0 * t1 * (3.0 * t0 * t0 - t1 * t1),
    ]
}

/// -sign(h)*log10(|h|)，压缩Hu矩的动态范围；h为0时得到+inf
pub fn log_scale(h: f64) -> f64 {
    -h.signum() * h.abs().log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{imageops, Luma};

    fn rect_points(x0: i32, y0: i32, w: i32, h: i32) -> Vec<Point<i32>> {
        let mut points = Vec::new();
        for x in x0..x0 + w {
            points.push(Point::new(x, y0));
        }
        for y in y0..y0 + h {
            points.push(Point::new(x0 + w, y));
        }
        for x in (x0 + 1..=x0 + w).rev() {
            points.push(Point::new(x, y0 + h));
        }
        for y in (y0 + 1..=y0 + h).rev() {
            points.push(Point::new(x0, y));
        }
        points
    }

    #[test]
    fn min_area_rect_axis_aligned() {
        let corners = min_area_rect(&rect_points(10, 20, 30, 40)).unwrap();
        let ordered = order_clockwise_from_top(corners);
        assert_eq!(
            ordered,
            [
                CardPoint::new(10.0, 20.0),
                CardPoint::new(40.0, 20.0),
                CardPoint::new(40.0, 60.0),
                CardPoint::new(10.0, 60.0),
            ]
        );
    }

    #[test]
    fn min_area_rect_rotated_diamond() {
        // 45度的正方形
        let diamond = [Point::new(50, 0), Point::new(100, 50), Point::new(50, 100), Point::new(0, 50)];
        let ordered = order_clockwise_from_top(min_area_rect(&diamond).unwrap());
        let expected = [(50.0, 0.0), (100.0, 50.0), (50.0, 100.0), (0.0, 50.0)];
        for (p, (x, y)) in ordered.iter().zip(expected) {
            assert_relative_eq!(p.x, x, epsilon = 1e-3);
            assert_relative_eq!(p.y, y, epsilon = 1e-3);
        }
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let line: Vec<Point<i32>> = (0..20).map(|i| Point::new(i, 2 * i)).collect();
        assert!(min_area_rect(&line).is_none());
    }

    #[test]
    fn ordering_fixes_counter_clockwise_input() {
        let ccw = [
            CardPoint::new(0.0, 10.0),
            CardPoint::new(5.0, 10.0),
            CardPoint::new(5.0, 0.0),
            CardPoint::new(0.0, 0.0),
        ];
        let ordered = order_clockwise_from_top(ccw);
        assert_eq!(ordered[0], CardPoint::new(0.0, 0.0));
        assert_eq!(ordered[1], CardPoint::new(5.0, 0.0));
        assert_eq!(ordered[2], CardPoint::new(5.0, 10.0));
        assert_eq!(ordered[3], CardPoint::new(0.0, 10.0));
    }

    #[test]
    fn hu_moments_of_solid_rectangle() {
        let mut img = GrayImage::new(100, 100);
        for y in 40..60 {
            for x in 30..70 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let hu = hu_moments(&img);
        // (w²-h²)/(12*I*w*h) 的平方，离散化误差互相抵消
        let expected = (1600.0f64 - 400.0) / (12.0 * 255.0 * 800.0);
        assert_relative_eq!(hu[1], expected * expected, max_relative = 1e-9);
        assert!(hu[2].abs() < 1e-15);
    }

    #[test]
    fn hu_moments_are_rotation_invariant() {
        let mut img = GrayImage::new(64, 48);
        for y in 5..40 {
            for x in 10..20 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 30..40 {
            for x in 20..50 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let hu = hu_moments(&img);
        let rotated = hu_moments(&imageops::rotate90(&img));
        for (a, b) in hu.iter().zip(rotated.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-6, epsilon = 1e-30);
        }
    }

    #[test]
    fn empty_image_has_zero_moments() {
        assert_eq!(hu_moments(&GrayImage::new(10, 10)), [0.0; 7]);
    }

    #[test]
    fn log_scale_keeps_sign() {
        assert_relative_eq!(log_scale(1e-3), 3.0, epsilon = 1e-12);
        assert_relative_eq!(log_scale(-1e-3), -3.0, epsilon = 1e-12);
        assert_eq!(log_scale(0.0), f64::INFINITY);
    }

    #[test]
    fn variance_of_constant_is_zero() {
        assert_eq!(variance(&[3.0, 3.0, 3.0]), Some(0.0));
        assert_eq!(variance(&[]), None);
        assert_eq!(variance(&[1.0, 3.0]), Some(1.0));
    }
}
