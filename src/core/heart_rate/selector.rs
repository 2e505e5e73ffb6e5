//! 候选选择 - 5 个区域 × 3 个通道，按自相关强度挑出最周期的一个

use crate::core::config::HeartRateConfig;
use crate::core::signal::{preprocess, std_dev, PreprocessedSignal};
use crate::core::video::{RegionKind, RegionSeries};
use log::debug;
use serde::Serialize;
use std::fmt;

/// 低于此标准差视为平坦，不参与选择
const FLAT_SD: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    Green,
    Red,
    GreenMinusRed,
}

pub const CHANNEL_ORDER: [Channel; 3] = [Channel::Green, Channel::Red, Channel::GreenMinusRed];

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Green => "G",
            Channel::Red => "R",
            Channel::GreenMinusRed => "G-R",
        };
        f.write_str(name)
    }
}

/// Identifies a candidate as `<channel>@<region>`, e.g. `G@roi0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CandidateTag {
    pub region: RegionKind,
    pub channel: Channel,
}

impl fmt::Display for CandidateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.channel, self.region)
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub tag: CandidateTag,
    pub signal: PreprocessedSignal,
    pub score: f64,
}

/// 自相关搜索的滞后范围 `(min_lag, max_lag)`，单位为样本
pub fn lag_range(sample_rate: f64, min_bpm: f64, max_bpm: f64) -> (usize, usize) {
    let min_lag = ((sample_rate * 60.0 / max_bpm).round() as usize).max(1);
    let max_lag = ((sample_rate * 60.0 / min_bpm).round() as usize).max(min_lag + 2);
    (min_lag, max_lag)
}

/// Normalized autocorrelation at each lag in `min_lag..=max_lag`.
///
/// Returns `None` when the series is too short for the range or has no
/// variance.
pub(crate) fn autocorrelation(
    x: &[f64],
    min_lag: usize,
    max_lag: usize,
) -> Option<Vec<(usize, f64)>> {
    if x.len() <= max_lag + 2 {
        return None;
    }
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    let den: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    if den <= 1e-9 {
        return None;
    }

    let values = (min_lag..=max_lag)
        .map(|lag| {
            let num: f64 = x
                .iter()
                .zip(&x[lag..])
                .map(|(a, b)| (a - mean) * (b - mean))
                .sum();
            (lag, num / den)
        })
        .collect();
    Some(values)
}

/// 周期性强度：搜索范围内归一化自相关的最大值（下限 0）
pub fn autocorr_strength(x: &[f64], sample_rate: f64, config: &HeartRateConfig) -> f64 {
    let (min_lag, max_lag) = lag_range(sample_rate, config.min_bpm, config.max_bpm);
    autocorrelation(x, min_lag, max_lag)
        .map(|values| values.into_iter().fold(0.0, |best, (_, ac)| f64::max(best, ac)))
        .unwrap_or(0.0)
}

/// 预处理并打分全部候选，顺序为区域优先、通道其次；平坦或不可用的序列被跳过
pub fn score_candidates(
    series: &[RegionSeries],
    times_secs: &[f64],
    config: &HeartRateConfig,
) -> Vec<Candidate> {
    let fs = config.target_sample_rate_hz;
    let mut candidates = Vec::with_capacity(series.len() * CHANNEL_ORDER.len());

    for region_series in series {
        for channel in CHANNEL_ORDER {
            let tag = CandidateTag {
                region: region_series.region.kind,
                channel,
            };
            let raw = match channel {
                Channel::Green => region_series.green.clone(),
                Channel::Red => region_series.red.clone(),
                Channel::GreenMinusRed => region_series.green_minus_red(),
            };

            let Some(signal) = preprocess(&raw, times_secs, fs) else {
                debug!("Candidate {} unusable: {} samples", tag, raw.len());
                continue;
            };
            if signal.is_empty() || std_dev(&signal.samples) < FLAT_SD {
                debug!("Candidate {} is flat, skipped", tag);
                continue;
            }

            let score = autocorr_strength(&signal.samples, fs, config);
            debug!("Candidate {} score={:.3}", tag, score);
            candidates.push(Candidate { tag, signal, score });
        }
    }
    candidates
}

/// 选出得分最高者；并列时保留先出现的
pub fn select_best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .fold((-1.0, None), |(best_score, best), candidate| {
            if candidate.score > best_score {
                (candidate.score, Some(candidate))
            } else {
                (best_score, best)
            }
        })
        .1
}
