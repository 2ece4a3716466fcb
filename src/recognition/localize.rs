use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::geometry::contour_area;
use imageproc::morphology::dilate;
use log::debug;

use crate::models::card::CardRegion;
use crate::my_utils::math::{min_area_rect, order_clockwise_from_top};
use crate::recognition::engine::Engine;

/// 膨胀边缘图，弥合边缘上的小缺口
pub fn dilate_edges(edges: &GrayImage, passes: u32, radius: u8) -> GrayImage {
    let mut out = edges.clone();
    for _ in 0..passes {
        out = dilate(&out, Norm::LInf, radius);
    }
    out
}

/// 只保留最外层轮廓
pub fn external_contours(edges: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .collect()
}

/// 面积达标的轮廓拟合成卡片区域，面积不足或矩形退化时返回None
pub fn fit_card_region(contour: &Contour<i32>, min_area: f64) -> Option<CardRegion> {
    let area = contour_area(&contour.points).abs();
    if area < min_area {
        return None;
    }
    let corners = match min_area_rect(&contour.points) {
        Some(corners) => order_clockwise_from_top(corners),
        None => {
            debug!("contour with area {area:.0} has no proper bounding rectangle");
            return None;
        }
    };
    let region = CardRegion::from_corners(corners, area);
    if region.width < 1.0 || region.height < 1.0 {
        debug!("drop degenerate rectangle {}x{}", region.width, region.height);
        return None;
    }
    Some(region)
}

pub trait RecLocate {
    /// 从边缘图中找出所有卡片区域，顺序为轮廓被发现的顺序
    fn locate_cards(&self, edges: &GrayImage) -> Vec<CardRegion>;
}

impl RecLocate for Engine {
    fn locate_cards(&self, edges: &GrayImage) -> Vec<CardRegion> {
        let process = &self.config().image_process;
        let dilated = dilate_edges(edges, process.dilate_passes, process.dilate_radius);
        let min_area = self.config().locate.area_threshold(edges.width(), edges.height());

        let contours = external_contours(&dilated);
        let regions: Vec<CardRegion> = contours
            .iter()
            .filter_map(|contour| fit_card_region(contour, min_area))
            .collect();
        debug!(
            "{} external contours, {} above area {min_area:.0}",
            contours.len(),
            regions.len()
        );
        regions
    }
}
