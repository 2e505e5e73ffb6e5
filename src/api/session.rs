//! 实时心率采集会话 - 相机帧直接推入，结束时估算

use crate::api::models::{HeartRateReport, SessionStats};
use crate::core::config::HeartRateConfig;
use crate::core::heart_rate::estimate_from_clip;
use crate::core::video::{FrameDeduplicator, RawFrame, SampledClip};
use flutter_rust_bridge::frb;
use log::{debug, info, warn};
use std::sync::Mutex;

#[derive(Default)]
struct SessionState {
    dedup: FrameDeduplicator,
    clip: SampledClip,
    received: u64,
}

/// 实时心率会话 - 去重后累积 YUV 相机帧
///
/// ```dart
/// final session = HeartRateSession.create();
/// session.pushFrames(frames: yuvFrames);
/// final report = await session.finish();
/// ```
#[frb(opaque)]
pub struct HeartRateSession {
    config: HeartRateConfig,
    state: Mutex<SessionState>,
}

impl HeartRateSession {
    #[frb(sync)]
    pub fn create() -> Self {
        crate::init_logging();
        info!("🎬 HeartRateSession: created");
        Self {
            config: HeartRateConfig::shared().clone(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// 推入一批相机帧，返回目前累计保留的帧数
    #[frb]
    pub fn push_frames(&self, frames: Vec<RawFrame>) -> u64 {
        let Ok(mut state) = self.state.lock() else {
            warn!("⚠️ HeartRateSession poisoned, dropping {} frames", frames.len());
            return 0;
        };
        let SessionState { dedup, clip, received } = &mut *state;

        let batch_len = frames.len();
        let mut kept = 0;
        for raw in frames {
            *received += 1;
            if clip.push_frame(dedup, raw.to_frame()) {
                kept += 1;
            }
        }
        debug!("Session batch: {} frames, {} kept", batch_len, kept);
        clip.len() as u64
    }

    #[frb(sync, getter)]
    pub fn stats(&self) -> SessionStats {
        match self.state.lock() {
            Ok(state) => SessionStats {
                received_frames: state.received,
                kept_frames: state.clip.len() as u64,
                duplicate_frames: state.clip.duplicates as u64,
                span_secs: state.clip.span_secs(),
            },
            Err(_) => {
                warn!("⚠️ HeartRateSession poisoned, stats unavailable");
                SessionStats::default()
            }
        }
    }

    /// 对已累积的帧做估算，会话内容保留
    #[frb]
    pub fn finish(&self) -> HeartRateReport {
        match self.state.lock() {
            Ok(state) => estimate_from_clip(&state.clip, &self.config).into(),
            Err(e) => {
                warn!("⚠️ HeartRateSession poisoned: {}", e);
                HeartRateReport::error("SessionPoisoned", e.to_string())
            }
        }
    }

    #[frb(sync)]
    pub fn reset(&self) {
        match self.state.lock() {
            Ok(mut state) => *state = SessionState::default(),
            Err(_) => warn!("⚠️ HeartRateSession poisoned, reset ignored"),
        }
    }
}

impl Drop for HeartRateSession {
    fn drop(&mut self) {
        info!("🗑️ HeartRateSession: released");
    }
}
