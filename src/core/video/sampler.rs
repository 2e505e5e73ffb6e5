//! 帧采样控制器 - 按固定时间步长请求帧，去重后累积保留序列

use super::deduplicator::FrameDeduplicator;
use super::frame::Frame;
use super::source::{grab_frame, OpenError, VideoFrameSource};
use crate::core::config::SamplingConfig;
use log::{debug, info, warn};
use std::time::Duration;

/// 采样结果：保留帧与对齐的时间戳（秒）
#[derive(Debug, Clone, Default)]
pub struct SampledClip {
    pub frames: Vec<Frame>,
    pub timestamps_secs: Vec<f64>,
    pub window_us: u64,
    pub requested: usize,
    pub misses: usize,
    pub duplicates: usize,
}

impl SampledClip {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 要求时间戳严格递增后再去重，返回是否保留
    ///
    /// 乱序帧不进入去重器，避免其哈希顶替最后一个保留帧。
    pub fn push_frame(&mut self, dedup: &mut FrameDeduplicator, frame: Frame) -> bool {
        let ts_secs = frame.timestamp_secs();
        let monotonic = self.timestamps_secs.last().map_or(true, |&last| ts_secs > last);
        if !monotonic || dedup.check(&frame).is_duplicate() {
            self.duplicates += 1;
            return false;
        }
        self.frames.push(frame);
        self.timestamps_secs.push(ts_secs);
        true
    }

    /// Time covered by the kept frames, in seconds.
    pub fn span_secs(&self) -> f64 {
        match (self.timestamps_secs.first(), self.timestamps_secs.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

pub struct FrameSampler<'a> {
    config: &'a SamplingConfig,
}

impl<'a> FrameSampler<'a> {
    pub fn new(config: &'a SamplingConfig) -> Self {
        Self { config }
    }

    /// 打开来源并采样整段分析窗口，句柄总会被关闭
    pub fn sample<S: VideoFrameSource>(
        &self,
        source: &S,
        reference: &str,
    ) -> Result<SampledClip, OpenError> {
        let handle = Self::open_with_fallbacks(source, reference)?;

        let duration_us = self.probe_duration(source, &handle);
        if duration_us.is_none() {
            warn!("⚠️ Duration unavailable; proceeding with fixed sampling window.");
        }
        let window_us = self.analysis_window_us(duration_us);

        let clip = self.sample_window(source, &handle, window_us);
        source.close(handle);
        Ok(clip)
    }

    /// Tries `reference` as given, then with a `file://` scheme stripped.
    pub fn open_with_fallbacks<S: VideoFrameSource>(
        source: &S,
        reference: &str,
    ) -> Result<S::Handle, OpenError> {
        let mut candidates = vec![reference];
        if let Some(path) = reference.strip_prefix("file://") {
            candidates.push(path);
        }

        let mut last_err = None;
        for candidate in candidates {
            match source.open(candidate) {
                Ok(handle) => return Ok(handle),
                Err(e) => {
                    debug!("Open attempt failed for {}: {}", candidate, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| OpenError::NotFound(reference.to_string())))
    }

    /// 时长元数据在录制刚结束时可能滞后，短暂重试
    pub fn probe_duration<S: VideoFrameSource>(
        &self,
        source: &S,
        handle: &S::Handle,
    ) -> Option<u64> {
        let attempts = self.config.duration_probe_attempts.max(1);
        for attempt in 0..attempts {
            if let Some(duration) = source.probe_duration_us(handle).filter(|&d| d > 0) {
                return Some(duration);
            }
            if attempt + 1 < attempts && self.config.duration_probe_interval_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.config.duration_probe_interval_ms));
            }
        }
        None
    }

    pub fn analysis_window_us(&self, duration_us: Option<u64>) -> u64 {
        match duration_us {
            Some(d) if d > 0 => d.min(self.config.max_window_us),
            _ => self.config.fallback_window_us,
        }
    }

    /// Requests `settle_offset .. settle_offset + window` every `step_us`.
    pub fn sample_window<S: VideoFrameSource>(
        &self,
        source: &S,
        handle: &S::Handle,
        window_us: u64,
    ) -> SampledClip {
        let mut clip = SampledClip {
            window_us,
            ..Default::default()
        };
        let mut dedup = FrameDeduplicator::new();
        let step_us = self.config.step_us.max(1);
        let end_us = self.config.settle_offset_us + window_us;

        let mut t_us = self.config.settle_offset_us;
        while t_us < end_us {
            clip.requested += 1;
            match grab_frame(source, handle, t_us) {
                None => clip.misses += 1,
                Some(frame) => {
                    clip.push_frame(&mut dedup, frame);
                }
            }
            t_us += step_us;
        }

        info!(
            "🎞️ Sampled {} frames ({} requested, {} missed, {} duplicates) over {:.2}s window",
            clip.frames.len(),
            clip.requested,
            clip.misses,
            clip.duplicates,
            window_us as f64 / 1_000_000.0
        );
        clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::{MemoryFrameSource, SeekMode};
    use std::cell::Cell;

    fn no_wait_config() -> SamplingConfig {
        SamplingConfig {
            duration_probe_interval_ms: 0,
            ..Default::default()
        }
    }

    fn distinct_frames(count: u64, spacing_us: u64) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::filled(32, 32, [0, (i % 250) as u8, 0], i * spacing_us))
            .collect()
    }

    #[test]
    fn test_out_of_order_frame_does_not_replace_last_hash() {
        let mut dedup = FrameDeduplicator::new();
        let mut clip = SampledClip::default();

        assert!(clip.push_frame(&mut dedup, Frame::filled(32, 32, [0, 10, 0], 1_000_000)));
        // 新内容但时间倒退
        assert!(!clip.push_frame(&mut dedup, Frame::filled(32, 32, [0, 20, 0], 500_000)));
        // 与第一帧内容相同，仍应判为重复
        assert!(!clip.push_frame(&mut dedup, Frame::filled(32, 32, [0, 10, 0], 2_000_000)));

        assert_eq!(clip.len(), 1);
        assert_eq!(clip.duplicates, 2);
        assert_eq!(dedup.kept(), 1);
        assert_eq!(clip.timestamps_secs, vec![1.0]);
    }

    #[test]
    fn test_window_selection() {
        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        assert_eq!(sampler.analysis_window_us(Some(8_000_000)), 8_000_000);
        assert_eq!(sampler.analysis_window_us(Some(45_000_000)), 15_000_000);
        assert_eq!(sampler.analysis_window_us(Some(0)), 12_000_000);
        assert_eq!(sampler.analysis_window_us(None), 12_000_000);
    }

    #[test]
    fn test_samples_every_step_from_settle_offset() {
        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        // 30 fps 的 10 秒片段，每次请求都命中不同帧
        let source =
            MemoryFrameSource::new(distinct_frames(300, 33_333)).with_duration_us(10_000_000);

        let clip = sampler.sample(&source, "clip").expect("sample");
        assert_eq!(clip.window_us, 10_000_000);
        // ceil(10_000_000 / 33_333) 次请求
        assert_eq!(clip.requested, 301);
        assert_eq!(clip.misses, 0);
        assert!(clip.len() > 250);
        assert!(clip.timestamps_secs[0] >= 0.49 && clip.timestamps_secs[0] <= 0.51);
        assert!(clip.timestamps_secs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_identical_frames_are_deduplicated() {
        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        let frames: Vec<Frame> = (0..100)
            .map(|i| Frame::filled(32, 32, [5, 5, 5], i * 100_000))
            .collect();
        let source = MemoryFrameSource::new(frames).with_duration_us(10_000_000);

        let clip = sampler.sample(&source, "clip").expect("sample");
        assert_eq!(clip.len(), 1);
        assert_eq!(clip.duplicates, clip.requested - 1);
    }

    #[test]
    fn test_slow_source_keeps_capture_timestamps() {
        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        let source =
            MemoryFrameSource::new(distinct_frames(40, 200_000)).with_duration_us(8_000_000);

        let clip = sampler.sample(&source, "clip").expect("sample");
        assert_eq!(clip.len(), 38);
        assert!((clip.timestamps_secs[0] - 0.4).abs() < 1e-9);
        assert!((clip.span_secs() - 7.4).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_duration_uses_fallback_window() {
        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        let source = MemoryFrameSource::new(distinct_frames(10, 33_333));

        let clip = sampler.sample(&source, "clip").expect("sample");
        assert_eq!(clip.window_us, 12_000_000);
    }

    #[test]
    fn test_misses_are_skipped() {
        struct Sparse;
        impl VideoFrameSource for Sparse {
            type Handle = ();
            fn open(&self, _reference: &str) -> Result<(), OpenError> {
                Ok(())
            }
            fn probe_duration_us(&self, _handle: &()) -> Option<u64> {
                Some(1_000_000)
            }
            fn frame_at(&self, _handle: &(), t: u64, _mode: SeekMode) -> Option<Frame> {
                // 只有偶数个步长处有帧
                let step = (t - 500_000) / 33_333;
                (step % 2 == 0).then(|| Frame::filled(16, 16, [0, step as u8, 0], t))
            }
        }

        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        let clip = sampler.sample(&Sparse, "sparse").expect("sample");
        assert_eq!(clip.requested, 31);
        assert_eq!(clip.misses, 15);
        assert_eq!(clip.len(), 16);
    }

    #[test]
    fn test_open_falls_back_to_stripped_path() {
        struct PathOnly;
        impl VideoFrameSource for PathOnly {
            type Handle = String;
            fn open(&self, reference: &str) -> Result<String, OpenError> {
                if reference.starts_with("file://") {
                    Err(OpenError::Unsupported(reference.to_string()))
                } else {
                    Ok(reference.to_string())
                }
            }
            fn probe_duration_us(&self, _handle: &String) -> Option<u64> {
                None
            }
            fn frame_at(&self, _handle: &String, _t: u64, _mode: SeekMode) -> Option<Frame> {
                None
            }
        }

        let handle =
            FrameSampler::open_with_fallbacks(&PathOnly, "file:///sdcard/hr.mp4").expect("open");
        assert_eq!(handle, "/sdcard/hr.mp4");
    }

    #[test]
    fn test_open_failure_propagates() {
        let source = MemoryFrameSource::new(vec![]);
        let config = no_wait_config();
        let result = FrameSampler::new(&config).sample(&source, "file:///missing.mp4");
        assert!(matches!(result, Err(OpenError::Empty(_))));
    }

    #[test]
    fn test_duration_probe_retries() {
        struct LaggyMetadata {
            calls: Cell<u32>,
        }
        impl VideoFrameSource for LaggyMetadata {
            type Handle = ();
            fn open(&self, _reference: &str) -> Result<(), OpenError> {
                Ok(())
            }
            fn probe_duration_us(&self, _handle: &()) -> Option<u64> {
                let calls = self.calls.get() + 1;
                self.calls.set(calls);
                if calls < 3 {
                    Some(0)
                } else {
                    Some(9_000_000)
                }
            }
            fn frame_at(&self, _handle: &(), _t: u64, _mode: SeekMode) -> Option<Frame> {
                None
            }
        }

        let config = no_wait_config();
        let sampler = FrameSampler::new(&config);
        let source = LaggyMetadata { calls: Cell::new(0) };
        assert_eq!(sampler.probe_duration(&source, &()), Some(9_000_000));
        assert_eq!(source.calls.get(), 3);
    }
}
