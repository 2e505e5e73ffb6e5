//! 心率估算链：自相关 -> Goertzel 扫频 -> 峰值计数

use super::selector::{autocorrelation, lag_range, Candidate};
use super::{EstimationMethod, HeartRateEstimate};
use crate::core::config::HeartRateConfig;
use crate::core::error::VitalsError;
use crate::core::signal::percentile;
use log::{debug, info, warn};
use std::f64::consts::PI;

/// 自相关峰对应的心率
///
/// 只接受严格位于搜索范围内部的滞后 (`min_lag < lag < max_lag - 1`)，
/// 且相关系数需超过 `min_strength`。
pub fn bpm_by_autocorr(x: &[f64], sample_rate: f64, config: &HeartRateConfig) -> Option<u32> {
    let (min_lag, max_lag) = lag_range(sample_rate, config.min_bpm, config.max_bpm);
    let values = autocorrelation(x, min_lag, max_lag)?;

    let (best_lag, _) = values
        .into_iter()
        .filter(|&(lag, ac)| {
            lag > min_lag && lag + 1 < max_lag && ac > config.autocorr_min_strength
        })
        .fold((0usize, 0.0), |(best_lag, best), (lag, ac)| {
            if ac > best {
                (lag, ac)
            } else {
                (best_lag, best)
            }
        });

    if best_lag == 0 {
        return None;
    }
    Some((60.0 / (best_lag as f64 / sample_rate)).round() as u32)
}

/// Power of `x` at `freq_hz` via the two-pole Goertzel recurrence.
pub fn goertzel_power(x: &[f64], sample_rate: f64, freq_hz: f64) -> f64 {
    let w = 2.0 * PI * freq_hz / sample_rate;
    let coeff = 2.0 * w.cos();
    let (mut s1, mut s2) = (0.0, 0.0);
    for &v in x {
        let s0 = v + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    let re = s1 - s2 * w.cos();
    let im = s2 * w.sin();
    re * re + im * im
}

/// 在 `[min_bpm, max_bpm]` 上按固定步长扫频，取功率最大的频率
pub fn bpm_by_goertzel(x: &[f64], sample_rate: f64, config: &HeartRateConfig) -> Option<u32> {
    if x.is_empty() {
        return None;
    }
    let hi = config.max_bpm / 60.0 + 1e-9;
    let mut freq = config.min_bpm / 60.0;
    let (mut best_freq, mut best_power) = (0.0, 0.0);

    // 步长累加，和逐点相乘得到的频率略有不同
    while freq <= hi {
        let power = goertzel_power(x, sample_rate, freq);
        if power > best_power {
            best_power = power;
            best_freq = freq;
        }
        freq += config.goertzel_step_hz;
    }

    (best_power > 0.0).then(|| (best_freq * 60.0).round() as u32)
}

/// 高于分位阈值的局部极大值计数
pub fn bpm_by_peak_count(x: &[f64], sample_rate: f64, config: &HeartRateConfig) -> Option<u32> {
    if x.len() < 3 {
        return None;
    }
    let threshold = percentile(x, config.peak_percentile);
    let min_spacing = ((config.min_peak_spacing_secs * sample_rate).round() as usize).max(1);

    let mut peaks = 0usize;
    let mut last_peak: Option<usize> = None;
    for i in 1..x.len() - 1 {
        let is_peak = x[i] > threshold && x[i] > x[i - 1] && x[i] >= x[i + 1];
        let spaced = last_peak.map_or(true, |last| i - last >= min_spacing);
        if is_peak && spaced {
            peaks += 1;
            last_peak = Some(i);
        }
    }

    if peaks < config.min_peaks {
        return None;
    }
    let duration_secs = x.len() as f64 / sample_rate;
    Some((peaks as f64 / duration_secs * 60.0).round() as u32)
}

/// 依次尝试三种方法，返回第一个落在生理范围内的结果
pub fn estimate_bpm(
    candidate: &Candidate,
    config: &HeartRateConfig,
) -> Result<HeartRateEstimate, VitalsError> {
    let x = &candidate.signal.samples;
    let fs = candidate.signal.sample_rate;

    let accept = |method: EstimationMethod, bpm: Option<u32>| {
        let bpm = bpm.unwrap_or(0);
        debug!("{:?} -> {} BPM", method, bpm);
        config.accepts(bpm).then(|| HeartRateEstimate {
            bpm,
            method,
            candidate: candidate.tag,
            score: candidate.score,
        })
    };

    let autocorr = bpm_by_autocorr(x, fs, config);
    if let Some(estimate) = accept(EstimationMethod::Autocorrelation, autocorr) {
        info!(
            "💓 HR {} BPM via autocorrelation ({}, score={:.3})",
            estimate.bpm, candidate.tag, candidate.score
        );
        return Ok(estimate);
    }

    let goertzel = bpm_by_goertzel(x, fs, config);
    if let Some(estimate) = accept(EstimationMethod::Goertzel, goertzel) {
        info!(
            "💓 HR {} BPM via Goertzel ({}, score={:.3})",
            estimate.bpm, candidate.tag, candidate.score
        );
        return Ok(estimate);
    }

    let peaks = bpm_by_peak_count(x, fs, config);
    if let Some(estimate) = accept(EstimationMethod::PeakCount, peaks) {
        info!(
            "💓 HR {} BPM via peak count ({}, score={:.3})",
            estimate.bpm, candidate.tag, candidate.score
        );
        return Ok(estimate);
    }

    warn!("⚠️ All estimators out of range for {}", candidate.tag);
    Err(VitalsError::OutOfRange {
        candidate: candidate.tag,
        score: candidate.score,
        autocorr: autocorr.unwrap_or(0),
        goertzel: goertzel.unwrap_or(0),
        peaks: peaks.unwrap_or(0),
    })
}
