use super::frame::Frame;
use crate::core::config::{FNV_OFFSET_BASIS, FNV_PRIME};

/// 中心小区域哈希去重器
///
/// 只对画面中心一小块（步长 5 的网格、绿色通道）计算 FNV-1a 风格哈希，
/// 与上一保留帧哈希相同即视为重复。这是近似相等过滤：中心区域以外的变化
/// 不参与比较，因此可能被当作重复丢弃。
#[derive(Debug, Default)]
pub struct FrameDeduplicator {
    last_kept_hash: Option<u64>,
    kept: usize,
    dropped: usize,
}

/// 去重决策结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    Keep(u64),
    Duplicate(u64),
}

impl DedupDecision {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DedupDecision::Duplicate(_))
    }
}

impl FrameDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 判断并记录：不同于上一保留帧则保留
    pub fn check(&mut self, frame: &Frame) -> DedupDecision {
        let hash = Self::quick_roi_hash(frame);
        if self.last_kept_hash == Some(hash) {
            self.dropped += 1;
            return DedupDecision::Duplicate(hash);
        }
        self.last_kept_hash = Some(hash);
        self.kept += 1;
        DedupDecision::Keep(hash)
    }

    pub fn kept(&self) -> usize {
        self.kept
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// 计算中心区域哈希
    pub fn quick_roi_hash(frame: &Frame) -> u64 {
        let (x0, y0, x1, y1) = Self::hash_region(frame.width, frame.height);

        let mut acc = FNV_OFFSET_BASIS;
        for y in (y0..=y1).step_by(5) {
            for x in (x0..=x1).step_by(5) {
                if let Some(g) = frame.green_at(x, y) {
                    acc = (acc ^ g as u64).wrapping_mul(FNV_PRIME);
                }
            }
        }
        acc
    }

    /// Inclusive bounds of the hashed sub-region.
    pub fn hash_region(width: u32, height: u32) -> (usize, usize, usize, usize) {
        let w = width as i64;
        let h = height as i64;
        let (cx, cy) = (w / 2, h / 2);
        let half = (w.min(h) / 16).max(10);

        let x0 = (cx - half).max(0);
        let x1 = (cx + half).min(w - 1).max(0);
        let y0 = (cy - half).max(0);
        let y1 = (cy + half).min(h - 1).max(0);
        (x0 as usize, y0 as usize, x1 as usize, y1 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_frame(width: u32, height: u32, fill: u8) -> Frame {
        Frame::filled(width, height, [fill, fill, fill], 0)
    }

    #[test]
    fn test_identical_frames_keep_one() {
        let mut dedup = FrameDeduplicator::new();
        let frame1 = create_test_frame(100, 100, 128);
        let frame2 = frame1.clone();

        assert!(!dedup.check(&frame1).is_duplicate());
        assert!(dedup.check(&frame2).is_duplicate());
        assert_eq!(dedup.kept(), 1);
        assert_eq!(dedup.dropped(), 1);
    }

    #[test]
    fn test_green_change_in_center_keeps() {
        let mut dedup = FrameDeduplicator::new();
        let frame1 = create_test_frame(100, 100, 100);
        let frame2 = create_test_frame(100, 100, 101);

        assert!(!dedup.check(&frame1).is_duplicate());
        assert!(!dedup.check(&frame2).is_duplicate());
        assert_eq!(dedup.kept(), 2);
    }

    #[test]
    fn test_change_outside_hash_region_is_deduplicated() {
        // 中心区域以外的变化不参与哈希，按预期会被丢弃
        let mut dedup = FrameDeduplicator::new();
        let frame1 = create_test_frame(100, 100, 100);
        let mut frame2 = frame1.clone();
        for x in 0..20 {
            frame2.set_rgb(x, 0, [255, 255, 255]);
        }

        dedup.check(&frame1);
        assert!(dedup.check(&frame2).is_duplicate());
    }

    #[test]
    fn test_red_and_blue_are_ignored() {
        let frame1 = Frame::filled(64, 64, [10, 90, 10], 0);
        let frame2 = Frame::filled(64, 64, [200, 90, 200], 0);
        assert_eq!(
            FrameDeduplicator::quick_roi_hash(&frame1),
            FrameDeduplicator::quick_roi_hash(&frame2)
        );
    }

    #[test]
    fn test_only_previous_kept_frame_is_compared() {
        let mut dedup = FrameDeduplicator::new();
        let a = create_test_frame(64, 64, 50);
        let b = create_test_frame(64, 64, 60);

        assert!(!dedup.check(&a).is_duplicate());
        assert!(!dedup.check(&b).is_duplicate());
        // A 再次出现：与上一保留帧 B 不同，保留
        assert!(!dedup.check(&a).is_duplicate());
    }

    #[test]
    fn test_hash_region_bounds() {
        // 100x100: half = max(10, 6) = 10
        assert_eq!(FrameDeduplicator::hash_region(100, 100), (40, 40, 60, 60));
        // 640x480: half = 30
        assert_eq!(FrameDeduplicator::hash_region(640, 480), (290, 210, 350, 270));
        // 小于区域的帧被裁剪
        assert_eq!(FrameDeduplicator::hash_region(8, 8), (0, 0, 7, 7));
    }

    #[test]
    fn test_empty_frame_hash_is_offset_basis() {
        let frame = Frame::new(0, 0, vec![], 0);
        assert_eq!(FrameDeduplicator::quick_roi_hash(&frame), FNV_OFFSET_BASIS);
    }

    #[test]
    fn test_clear() {
        let mut dedup = FrameDeduplicator::new();
        let frame = create_test_frame(32, 32, 10);
        dedup.check(&frame);
        dedup.clear();
        assert_eq!(dedup.kept(), 0);
        assert!(!dedup.check(&frame).is_duplicate());
    }
}
