//! 指尖视频心率估算
//!
//! 采样 -> 区域/通道序列 -> 预处理打分 -> 选最优候选 -> 估算链

pub mod estimators;
pub mod selector;

pub use estimators::{
    bpm_by_autocorr, bpm_by_goertzel, bpm_by_peak_count, estimate_bpm, goertzel_power,
};
pub use selector::{
    autocorr_strength, lag_range, score_candidates, select_best, Candidate, CandidateTag, Channel,
};

use crate::core::config::HeartRateConfig;
use crate::core::error::VitalsError;
use crate::core::video::{
    candidate_regions, extract_region_series, FrameSampler, OpenError, SampledClip,
    VideoFrameSource,
};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EstimationMethod {
    Autocorrelation,
    Goertzel,
    PeakCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateEstimate {
    pub bpm: u32,
    pub method: EstimationMethod,
    pub candidate: CandidateTag,
    /// 胜出候选的自相关强度
    pub score: f64,
}

/// 完整流程：打开来源、采样、估算
pub fn estimate_heart_rate<S: VideoFrameSource>(
    source: &S,
    reference: &str,
    config: &HeartRateConfig,
) -> Result<HeartRateEstimate, VitalsError> {
    let clip = FrameSampler::new(&config.sampling).sample(source, reference)?;
    estimate_from_clip(&clip, config)
}

/// Runs ROI extraction, candidate selection and the estimator chain on an
/// already sampled clip.
pub fn estimate_from_clip(
    clip: &SampledClip,
    config: &HeartRateConfig,
) -> Result<HeartRateEstimate, VitalsError> {
    let Some(first) = clip.frames.first() else {
        return Err(OpenError::Empty("no frames decoded".into()).into());
    };
    if clip.len() < config.min_kept_frames {
        return Err(VitalsError::InsufficientFrames {
            kept: clip.len(),
            required: config.min_kept_frames,
        });
    }
    let span_secs = clip.span_secs();
    if span_secs < config.min_span_secs {
        return Err(VitalsError::WindowTooShort {
            span_secs,
            required_secs: config.min_span_secs,
        });
    }

    let regions = candidate_regions(first.width, first.height, config.roi_grid_offset);
    let series = extract_region_series(&clip.frames, &regions, config.saturation_cutoff);
    let candidates = score_candidates(&series, &clip.timestamps_secs, config);
    info!(
        "🧪 {} usable candidates from {} frames ({:.2}s)",
        candidates.len(),
        clip.len(),
        span_secs
    );

    let best = select_best(candidates).ok_or(VitalsError::FlatSignal)?;
    info!("🏆 Best candidate {} score={:.3}", best.tag, best.score);
    estimate_bpm(&best, config)
}

/// 对外入口：返回心率，无法估算时记录原因并返回 0
pub fn estimate_heart_rate_bpm<S: VideoFrameSource>(source: &S, reference: &str) -> u32 {
    match estimate_heart_rate(source, reference, HeartRateConfig::shared()) {
        Ok(estimate) => estimate.bpm,
        Err(e) => {
            warn!("⚠️ No heart rate for {}: {} ({})", reference, e, e.kind());
            0
        }
    }
}
