//! 帧来源抽象 - 解码器/相机由外部实现，核心只依赖这个接口

use super::frame::Frame;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Source not found: {0}")]
    NotFound(String),
    #[error("Source contains no frames: {0}")]
    Empty(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unsupported source: {0}")]
    Unsupported(String),
}

/// 取帧方式，按 `SEEK_FALLBACK_ORDER` 依次尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// 最近的关键帧（很多设备只暴露关键帧）
    ClosestSync,
    /// 最近的任意帧
    Closest,
    PreviousSync,
    NextSync,
}

pub const SEEK_FALLBACK_ORDER: [SeekMode; 4] = [
    SeekMode::ClosestSync,
    SeekMode::Closest,
    SeekMode::PreviousSync,
    SeekMode::NextSync,
];

pub trait VideoFrameSource {
    type Handle;

    fn open(&self, reference: &str) -> Result<Self::Handle, OpenError>;

    /// Container duration if known. Advisory only.
    fn probe_duration_us(&self, handle: &Self::Handle) -> Option<u64>;

    /// Best-effort lookup of the frame nearest `timestamp_us`; may return `None`.
    fn frame_at(&self, handle: &Self::Handle, timestamp_us: u64, mode: SeekMode) -> Option<Frame>;

    fn close(&self, _handle: Self::Handle) {}
}

/// 依次尝试各个取帧方式，返回第一个成功的结果
pub fn grab_frame<S: VideoFrameSource>(
    source: &S,
    handle: &S::Handle,
    timestamp_us: u64,
) -> Option<Frame> {
    SEEK_FALLBACK_ORDER
        .iter()
        .find_map(|&mode| source.frame_at(handle, timestamp_us, mode))
}

/// 内存帧来源：已解码的帧按时间戳排序
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    frames: Vec<Frame>,
    duration_us: Option<u64>,
}

impl MemoryFrameSource {
    pub fn new(mut frames: Vec<Frame>) -> Self {
        frames.sort_by_key(|f| f.timestamp_us);
        Self {
            frames,
            duration_us: None,
        }
    }

    pub fn with_duration_us(mut self, duration_us: u64) -> Self {
        self.duration_us = Some(duration_us);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn index_for(&self, timestamp_us: u64, mode: SeekMode) -> Option<usize> {
        let n = self.frames.len();
        if n == 0 {
            return None;
        }
        // 第一个时间戳 >= t 的位置
        let next = self.frames.partition_point(|f| f.timestamp_us < timestamp_us);
        match mode {
            SeekMode::ClosestSync | SeekMode::Closest => {
                if next == 0 {
                    Some(0)
                } else if next == n {
                    Some(n - 1)
                } else {
                    let before = timestamp_us - self.frames[next - 1].timestamp_us;
                    let after = self.frames[next].timestamp_us - timestamp_us;
                    Some(if after < before { next } else { next - 1 })
                }
            }
            SeekMode::PreviousSync => {
                if next < n && self.frames[next].timestamp_us == timestamp_us {
                    Some(next)
                } else {
                    next.checked_sub(1)
                }
            }
            SeekMode::NextSync => (next < n).then_some(next),
        }
    }
}

impl VideoFrameSource for MemoryFrameSource {
    type Handle = ();

    fn open(&self, reference: &str) -> Result<(), OpenError> {
        if self.frames.is_empty() {
            return Err(OpenError::Empty(reference.to_string()));
        }
        Ok(())
    }

    fn probe_duration_us(&self, _handle: &()) -> Option<u64> {
        self.duration_us
    }

    fn frame_at(&self, _handle: &(), timestamp_us: u64, mode: SeekMode) -> Option<Frame> {
        self.index_for(timestamp_us, mode)
            .map(|idx| self.frames[idx].clone())
    }
}

/// 目录帧序列来源：按文件名排序的 PNG/JPEG/BMP 帧，固定帧率
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    fps: f64,
}

#[derive(Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    fps: f64,
}

impl ImageSequence {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl ImageSequenceSource {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    fn is_frame_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"))
            .unwrap_or(false)
    }

    fn index_for(
        &self,
        sequence: &ImageSequence,
        timestamp_us: u64,
        mode: SeekMode,
    ) -> Option<usize> {
        let n = sequence.paths.len();
        if n == 0 {
            return None;
        }
        let position = timestamp_us as f64 * sequence.fps / 1_000_000.0;
        let last = (n - 1) as f64;
        let index = match mode {
            SeekMode::ClosestSync | SeekMode::Closest => position.round().min(last),
            SeekMode::PreviousSync => position.floor().min(last),
            SeekMode::NextSync => {
                let next = position.ceil();
                if next > last {
                    return None;
                }
                next
            }
        };
        Some(index as usize)
    }
}

impl VideoFrameSource for ImageSequenceSource {
    type Handle = ImageSequence;

    fn open(&self, reference: &str) -> Result<ImageSequence, OpenError> {
        if !(self.fps > 0.0) {
            return Err(OpenError::Unsupported(format!("invalid fps {}", self.fps)));
        }
        let dir = Path::new(reference);
        if !dir.is_dir() {
            return Err(OpenError::NotFound(reference.to_string()));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && Self::is_frame_file(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(OpenError::Empty(reference.to_string()));
        }
        paths.sort();

        debug!("📂 Image sequence opened: {} frames @ {} fps", paths.len(), self.fps);
        Ok(ImageSequence {
            paths,
            fps: self.fps,
        })
    }

    fn probe_duration_us(&self, sequence: &ImageSequence) -> Option<u64> {
        let secs = sequence.paths.len() as f64 / sequence.fps;
        (secs > 0.0).then(|| (secs * 1_000_000.0).round() as u64)
    }

    fn frame_at(
        &self,
        sequence: &ImageSequence,
        timestamp_us: u64,
        mode: SeekMode,
    ) -> Option<Frame> {
        let index = self.index_for(sequence, timestamp_us, mode)?;
        let path = &sequence.paths[index];
        match image::open(path) {
            Ok(img) => {
                let ts = (index as f64 / sequence.fps * 1_000_000.0).round() as u64;
                Some(Frame::from_image(img.to_rgba8(), ts))
            }
            Err(e) => {
                warn!("⚠️ Failed to decode frame {:?}: {}", path, e);
                None
            }
        }
    }
}
