//! ROI 与通道提取 - 每个候选区域输出绿/红通道均值序列

use super::frame::Frame;
use serde::Serialize;
use std::fmt;

/// 候选区域（中心 + 四个偏移），顺序即枚举顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    Center,
    PlusX,
    MinusX,
    PlusY,
    MinusY,
}

pub const REGION_ORDER: [RegionKind; 5] = [
    RegionKind::Center,
    RegionKind::PlusX,
    RegionKind::MinusX,
    RegionKind::PlusY,
    RegionKind::MinusY,
];

impl RegionKind {
    pub fn index(self) -> usize {
        match self {
            RegionKind::Center => 0,
            RegionKind::PlusX => 1,
            RegionKind::MinusX => 2,
            RegionKind::PlusY => 3,
            RegionKind::MinusY => 4,
        }
    }

    /// Offset direction as fractions of (width, height).
    fn direction(self) -> (f64, f64) {
        match self {
            RegionKind::Center => (0.0, 0.0),
            RegionKind::PlusX => (1.0, 0.0),
            RegionKind::MinusX => (-1.0, 0.0),
            RegionKind::PlusY => (0.0, 1.0),
            RegionKind::MinusY => (0.0, -1.0),
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "roi{}", self.index())
    }
}

/// 包含边界的像素矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.x1 < self.x0 || self.y1 < self.y0
    }
}

/// 五个候选区域，半宽 max(24, min(w, h) / 8)，偏移为宽/高的 `grid_offset`
pub fn candidate_regions(width: u32, height: u32, grid_offset: f64) -> [Region; 5] {
    let w = width as f64;
    let h = height as f64;
    let (cx, cy) = (w / 2.0, h / 2.0);
    let half = (w.min(h) / 8.0).max(24.0).round() as i64;

    REGION_ORDER.map(|kind| {
        let (dx, dy) = kind.direction();
        let cx2 = (cx + dx * grid_offset * w).round() as i64;
        let cy2 = (cy + dy * grid_offset * h).round() as i64;
        Region {
            kind,
            x0: (cx2 - half).max(0),
            y0: (cy2 - half).max(0),
            x1: (cx2 + half).min(width as i64 - 1),
            y1: (cy2 + half).min(height as i64 - 1),
        }
    })
}

/// 一个区域在所有保留帧上的通道序列
#[derive(Debug, Clone)]
pub struct RegionSeries {
    pub region: Region,
    pub green: Vec<f64>,
    pub red: Vec<f64>,
}

impl RegionSeries {
    pub fn green_minus_red(&self) -> Vec<f64> {
        minus(&self.green, &self.red)
    }
}

/// Element-wise `a - b` over the shorter length.
pub fn minus(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// 区域内步长 2 网格上的绿/红均值
///
/// 跳过绿色 >= `saturation_cutoff` 的像素；若全部饱和（闪光灯很强时常见）
/// 则不做排除重新扫描，仍然得到一个可用的均值。没有任何采样点时返回 (0, 0)。
pub fn region_means(frame: &Frame, region: &Region, saturation_cutoff: u8) -> (f64, f64) {
    let scan = |exclude_saturated: bool| {
        let (mut gs, mut rs, mut n) = (0u64, 0u64, 0u64);
        if region.is_empty() {
            return (gs, rs, n);
        }
        for y in (region.y0..=region.y1).step_by(2) {
            for x in (region.x0..=region.x1).step_by(2) {
                let Some([r, g, _]) = frame.rgb_at(x as usize, y as usize) else {
                    continue;
                };
                if exclude_saturated && g >= saturation_cutoff {
                    continue;
                }
                gs += g as u64;
                rs += r as u64;
                n += 1;
            }
        }
        (gs, rs, n)
    };

    let (mut gs, mut rs, mut n) = scan(true);
    if n == 0 {
        (gs, rs, n) = scan(false);
    }

    if n == 0 {
        (0.0, 0.0)
    } else {
        (gs as f64 / n as f64, rs as f64 / n as f64)
    }
}

/// 对每个候选区域提取绿/红序列，长度等于帧数
pub fn extract_region_series(
    frames: &[Frame],
    regions: &[Region],
    saturation_cutoff: u8,
) -> Vec<RegionSeries> {
    regions
        .iter()
        .map(|region| {
            let (green, red) = frames
                .iter()
                .map(|frame| region_means(frame, region, saturation_cutoff))
                .unzip();
            RegionSeries {
                region: *region,
                green,
                red,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_regions_layout() {
        let regions = candidate_regions(200, 200, 0.12);
        // half = max(24, 25) = 25，偏移 24 像素
        assert_eq!(
            regions[0],
            Region { kind: RegionKind::Center, x0: 75, y0: 75, x1: 125, y1: 125 }
        );
        assert_eq!((regions[1].x0, regions[1].x1), (99, 149));
        assert_eq!((regions[2].x0, regions[2].x1), (51, 101));
        assert_eq!((regions[3].y0, regions[3].y1), (99, 149));
        assert_eq!((regions[4].y0, regions[4].y1), (51, 101));
        let kinds: Vec<_> = regions.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, REGION_ORDER.to_vec());
    }

    #[test]
    fn test_small_frame_regions_are_clamped() {
        let regions = candidate_regions(40, 30, 0.12);
        for region in &regions {
            assert!(region.x0 >= 0 && region.y0 >= 0);
            assert!(region.x1 <= 39 && region.y1 <= 29);
            assert!(!region.is_empty());
        }
    }

    #[test]
    fn test_region_means_uniform() {
        let frame = Frame::filled(64, 64, [180, 90, 10], 0);
        let region = candidate_regions(64, 64, 0.12)[0];
        assert_eq!(region_means(&frame, &region, 250), (90.0, 180.0));
    }

    #[test]
    fn test_saturated_pixels_are_excluded() {
        let mut frame = Frame::filled(64, 64, [100, 100, 0], 0);
        for y in 0..64 {
            for x in 0..32 {
                frame.set_rgb(x, y, [200, 255, 0]);
            }
        }
        let region = Region { kind: RegionKind::Center, x0: 0, y0: 0, x1: 63, y1: 63 };
        // 左半边饱和，被排除
        assert_eq!(region_means(&frame, &region, 250), (100.0, 100.0));
    }

    #[test]
    fn test_fully_saturated_region_falls_back() {
        let frame = Frame::filled(64, 64, [240, 252, 0], 0);
        let region = candidate_regions(64, 64, 0.12)[0];
        assert_eq!(region_means(&frame, &region, 250), (252.0, 240.0));
    }

    #[test]
    fn test_degenerate_region_yields_zero() {
        let frame = Frame::filled(16, 16, [50, 60, 70], 0);
        let empty = Region { kind: RegionKind::Center, x0: 10, y0: 10, x1: 5, y1: 5 };
        assert_eq!(region_means(&frame, &empty, 250), (0.0, 0.0));

        let outside = Region { kind: RegionKind::PlusX, x0: 100, y0: 100, x1: 120, y1: 120 };
        assert_eq!(region_means(&frame, &outside, 250), (0.0, 0.0));
    }

    #[test]
    fn test_extract_region_series_and_difference() {
        let frames: Vec<Frame> = (0..5)
            .map(|i| Frame::filled(48, 48, [100, 120 + i as u8, 0], i * 33_333))
            .collect();
        let regions = candidate_regions(48, 48, 0.12);
        let series = extract_region_series(&frames, &regions, 250);

        assert_eq!(series.len(), 5);
        for s in &series {
            assert_eq!(s.green, vec![120.0, 121.0, 122.0, 123.0, 124.0]);
            assert_eq!(s.red, vec![100.0; 5]);
            assert_eq!(s.green_minus_red(), vec![20.0, 21.0, 22.0, 23.0, 24.0]);
        }
    }

    #[test]
    fn test_minus_uses_shorter_length() {
        assert_eq!(minus(&[5.0, 6.0, 7.0], &[1.0, 1.0]), vec![4.0, 5.0]);
        assert!(minus(&[], &[1.0]).is_empty());
    }
}
