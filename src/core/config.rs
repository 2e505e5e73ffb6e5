//! 估算参数 - 经验常量集中在这里，便于单独调整和测试

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted heart rate (BPM).
pub const MIN_BPM: f64 = 40.0;
/// Highest accepted heart rate (BPM).
pub const MAX_BPM: f64 = 210.0;
/// Uniform rate every channel series is resampled to.
pub const TARGET_SAMPLE_RATE_HZ: f64 = 30.0;

pub const MIN_KEPT_FRAMES: usize = 24;
pub const MIN_SPAN_SECS: f64 = 6.0;

/// Green values at or above this are treated as flash-saturated.
pub const SATURATION_CUTOFF: u8 = 250;
pub const ROI_GRID_OFFSET: f64 = 0.12;

pub const AUTOCORR_MIN_STRENGTH: f64 = 0.05;
pub const GOERTZEL_STEP_HZ: f64 = 0.05;
pub const PEAK_PERCENTILE: f64 = 0.60;
pub const MIN_PEAK_SPACING_SECS: f64 = 0.30;
pub const MIN_PEAKS: usize = 3;

pub const SETTLE_OFFSET_US: u64 = 500_000;
pub const SAMPLE_STEP_US: u64 = 33_333;
pub const MAX_WINDOW_US: u64 = 15_000_000;
pub const FALLBACK_WINDOW_US: u64 = 12_000_000;
pub const DURATION_PROBE_ATTEMPTS: u32 = 6;
pub const DURATION_PROBE_INTERVAL_MS: u64 = 100;

/// FNV-1a style accumulator used by the frame hash.
pub const FNV_OFFSET_BASIS: u64 = 1_469_598_103_934_665_603;
pub const FNV_PRIME: u64 = 1_099_511_628_211;

pub const CROSSING_THRESHOLD: f32 = 0.15;
pub const CROSSING_INITIAL_REFERENCE: f32 = 10.0;
pub const RESPIRATION_WINDOW_SECS: f64 = 45.0;
/// Two threshold crossings per breath, per minute: 60 / 2.
pub const BREATHS_PER_CROSSING_MINUTE: f64 = 30.0;

static DEFAULT_HEART_RATE_CONFIG: Lazy<HeartRateConfig> = Lazy::new(HeartRateConfig::default);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 帧采样参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// 跳过开头，等待自动曝光稳定
    pub settle_offset_us: u64,
    pub step_us: u64,
    pub max_window_us: u64,
    /// 无法获取时长时使用的固定窗口
    pub fallback_window_us: u64,
    pub duration_probe_attempts: u32,
    pub duration_probe_interval_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            settle_offset_us: SETTLE_OFFSET_US,
            step_us: SAMPLE_STEP_US,
            max_window_us: MAX_WINDOW_US,
            fallback_window_us: FALLBACK_WINDOW_US,
            duration_probe_attempts: DURATION_PROBE_ATTEMPTS,
            duration_probe_interval_ms: DURATION_PROBE_INTERVAL_MS,
        }
    }
}

/// 心率估算参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeartRateConfig {
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub target_sample_rate_hz: f64,
    pub min_kept_frames: usize,
    pub min_span_secs: f64,
    pub saturation_cutoff: u8,
    pub roi_grid_offset: f64,
    pub autocorr_min_strength: f64,
    pub goertzel_step_hz: f64,
    pub peak_percentile: f64,
    pub min_peak_spacing_secs: f64,
    pub min_peaks: usize,
    pub sampling: SamplingConfig,
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            min_bpm: MIN_BPM,
            max_bpm: MAX_BPM,
            target_sample_rate_hz: TARGET_SAMPLE_RATE_HZ,
            min_kept_frames: MIN_KEPT_FRAMES,
            min_span_secs: MIN_SPAN_SECS,
            saturation_cutoff: SATURATION_CUTOFF,
            roi_grid_offset: ROI_GRID_OFFSET,
            autocorr_min_strength: AUTOCORR_MIN_STRENGTH,
            goertzel_step_hz: GOERTZEL_STEP_HZ,
            peak_percentile: PEAK_PERCENTILE,
            min_peak_spacing_secs: MIN_PEAK_SPACING_SECS,
            min_peaks: MIN_PEAKS,
            sampling: SamplingConfig::default(),
        }
    }
}

impl HeartRateConfig {
    /// Shared immutable defaults.
    pub fn shared() -> &'static HeartRateConfig {
        &DEFAULT_HEART_RATE_CONFIG
    }

    /// 从 JSON 覆盖部分字段，缺省字段使用默认值
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HeartRateConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_bpm > 0.0 && self.min_bpm < self.max_bpm) {
            return Err(ConfigError::Invalid(format!(
                "bpm range [{}, {}] is empty",
                self.min_bpm, self.max_bpm
            )));
        }
        if self.target_sample_rate_hz <= 0.0 {
            return Err(ConfigError::Invalid("target_sample_rate_hz must be positive".into()));
        }
        if self.goertzel_step_hz <= 0.0 {
            return Err(ConfigError::Invalid("goertzel_step_hz must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.peak_percentile) {
            return Err(ConfigError::Invalid("peak_percentile must be within [0, 1]".into()));
        }
        if self.sampling.step_us == 0 {
            return Err(ConfigError::Invalid("sampling.step_us must be non-zero".into()));
        }
        Ok(())
    }

    /// Whether `bpm` falls inside the accepted physiological band.
    pub fn accepts(&self, bpm: u32) -> bool {
        let bpm = bpm as f64;
        bpm >= self.min_bpm && bpm <= self.max_bpm
    }
}

/// 呼吸频率归一化窗口
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum RespirationWindow {
    /// 固定窗口（秒）
    Fixed(f64),
    /// 由首尾时间戳推算，无效时回退到 45 秒
    Measured,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RespirationConfig {
    pub crossing_threshold: f32,
    pub initial_reference: f32,
    pub window: RespirationWindow,
}

impl Default for RespirationConfig {
    fn default() -> Self {
        Self {
            crossing_threshold: CROSSING_THRESHOLD,
            initial_reference: CROSSING_INITIAL_REFERENCE,
            window: RespirationWindow::Fixed(RESPIRATION_WINDOW_SECS),
        }
    }
}

impl RespirationConfig {
    pub fn with_window_secs(window_secs: f64) -> Self {
        Self {
            window: RespirationWindow::Fixed(window_secs),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
