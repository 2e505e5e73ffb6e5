//! 生命体征 API - 指尖视频心率 + 加速度计呼吸频率

use crate::api::models::HeartRateReport;
use crate::core::config::{HeartRateConfig, RespirationConfig, RespirationWindow};
use crate::core::heart_rate::{self, estimate_heart_rate};
use crate::core::respiration;
use crate::core::video::ImageSequenceSource;
use flutter_rust_bridge::frb;
use log::{error, info, warn};
use rayon::prelude::*;

/// 从帧目录估算心率，无结果时返回 0
///
/// ```dart
/// final bpm = estimateHeartRateFromFrames(dir: framesDir, fps: 30);
/// ```
#[frb(sync)]
pub fn estimate_heart_rate_from_frames(dir: String, fps: f64) -> u32 {
    crate::init_logging();
    info!("💓 Estimating heart rate from {} @ {} fps", dir, fps);
    heart_rate::estimate_heart_rate_bpm(&ImageSequenceSource::new(fps), &dir)
}

/// 带诊断信息的心率分析；`config_json` 可覆盖部分参数
#[frb]
pub fn analyze_heart_rate(dir: String, fps: f64, config_json: Option<String>) -> HeartRateReport {
    crate::init_logging();

    let config = match config_json.as_deref().map(HeartRateConfig::from_json) {
        None => HeartRateConfig::shared().clone(),
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            error!("❌ Invalid heart rate config: {}", e);
            return HeartRateReport::error("InvalidConfig", e.to_string());
        }
    };

    analyze_with(&dir, fps, &config)
}

/// 批量分析多个片段，每个片段单线程处理，片段之间并行
#[frb]
pub fn analyze_heart_rate_batch(dirs: Vec<String>, fps: f64) -> Vec<HeartRateReport> {
    crate::init_logging();
    let config = HeartRateConfig::shared();
    let num_threads = num_cpus::get().min(4);
    info!("📦 Batch analysis: {} clips on {} threads", dirs.len(), num_threads);

    match rayon::ThreadPoolBuilder::new().num_threads(num_threads).build() {
        Ok(pool) => {
            pool.install(|| dirs.par_iter().map(|dir| analyze_with(dir, fps, config)).collect())
        }
        Err(e) => {
            warn!("⚠️ Thread pool unavailable ({}), analyzing sequentially", e);
            dirs.iter().map(|dir| analyze_with(dir, fps, config)).collect()
        }
    }
}

fn analyze_with(dir: &str, fps: f64, config: &HeartRateConfig) -> HeartRateReport {
    let result = estimate_heart_rate(&ImageSequenceSource::new(fps), dir, config);
    if let Err(e) = &result {
        warn!("⚠️ {}: {}", dir, e);
    }
    result.into()
}

/// 加速度计呼吸频率（45 秒窗口），无结果时返回 0
#[frb(sync)]
pub fn estimate_respiratory_rate(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>, t_nanos: Vec<i64>) -> u32 {
    respiration::estimate_respiratory_rate(&x, &y, &z, &t_nanos)
}

/// 指定归一化窗口（秒）；`window_secs <= 0` 时按时间戳推算
#[frb(sync)]
pub fn estimate_respiratory_rate_with_window(
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    t_nanos: Vec<i64>,
    window_secs: f64,
) -> u32 {
    let config = if window_secs > 0.0 {
        RespirationConfig::with_window_secs(window_secs)
    } else {
        RespirationConfig {
            window: RespirationWindow::Measured,
            ..Default::default()
        }
    };

    match respiration::estimate_respiratory_rate_with(&x, &y, &z, &t_nanos, &config) {
        Ok(rate) => rate,
        Err(e) => {
            warn!("⚠️ No respiratory rate: {}", e);
            0
        }
    }
}
