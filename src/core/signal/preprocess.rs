//! 信号预处理：去趋势 -> 平滑 -> 均匀重采样 -> 带限 -> 标准化

use super::filters::{highpass, moving_average, zscore};

/// 少于此样本数的序列不可用
pub const MIN_RAW_SAMPLES: usize = 10;
/// 重采样输出的最小长度
pub const MIN_UNIFORM_SAMPLES: usize = 64;

const SMOOTHING_WINDOW: usize = 5;

/// A uniformly sampled, band-limited, z-scored waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedSignal {
    pub samples: Vec<f64>,
    pub sample_rate: f64,
}

impl PreprocessedSignal {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// Returns `None` when the series is shorter than 10 samples or its
/// timestamps do not line up.
pub fn preprocess(raw: &[f64], times_secs: &[f64], target_rate: f64) -> Option<PreprocessedSignal> {
    if raw.len() < MIN_RAW_SAMPLES || raw.len() != times_secs.len() || target_rate <= 0.0 {
        return None;
    }

    // 长窗口去趋势（光照/运动漂移）+ 轻度平滑
    let detrended = highpass(raw, (raw.len() / 10).max(15));
    let smoothed = moving_average(&detrended, SMOOTHING_WINDOW);

    let uniform = resample_uniform(&smoothed, times_secs, target_rate);

    // 粗带限：约 1 秒高通，约 0.2 秒低通
    let hp_window = (target_rate.round() as usize).max(3);
    let lp_window = ((target_rate * 0.2).round() as usize).max(3);
    let band = moving_average(&highpass(&uniform, hp_window), lp_window);

    Some(PreprocessedSignal {
        samples: zscore(&band),
        sample_rate: target_rate,
    })
}

/// 线性插值到 `t0 + i / rate` 的均匀网格
///
/// 输出长度为 `max(64, round((t1 - t0) * rate))`，超出原时间范围的点保持端点值。
pub fn resample_uniform(values: &[f64], times_secs: &[f64], rate: f64) -> Vec<f64> {
    let (Some(&t0), Some(&t1)) = (times_secs.first(), times_secs.last()) else {
        return Vec::new();
    };
    if values.len() != times_secs.len() {
        return Vec::new();
    }

    let n = (((t1 - t0) * rate).round() as usize).max(MIN_UNIFORM_SAMPLES);
    let last = times_secs.len() - 1;
    let dt = 1.0 / rate;

    let mut out = Vec::with_capacity(n);
    let mut j = 0;
    for i in 0..n {
        let ti = t0 + i as f64 * dt;
        while j + 1 < times_secs.len() && times_secs[j + 1] < ti {
            j += 1;
        }
        let j2 = (j + 1).min(last);
        let (ta, tb) = (times_secs[j], times_secs[j2]);
        let (xa, xb) = (values[j], values[j2]);
        let a = if tb > ta {
            ((ti - ta) / (tb - ta)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(xa + a * (xb - xa));
    }
    out
}
