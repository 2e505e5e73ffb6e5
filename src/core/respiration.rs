//! 加速度计呼吸频率估算 - 统计合加速度幅值的阈值跳变次数

use crate::core::config::{
    RespirationConfig, RespirationWindow, BREATHS_PER_CROSSING_MINUTE, RESPIRATION_WINDOW_SECS,
};
use crate::core::error::VitalsError;
use log::{debug, info, warn};

/// 对外入口：45 秒窗口，无法估算时返回 0
pub fn estimate_respiratory_rate(x: &[f32], y: &[f32], z: &[f32], timestamps_ns: &[i64]) -> u32 {
    match estimate_respiratory_rate_with(x, y, z, timestamps_ns, &RespirationConfig::default()) {
        Ok(rate) => rate,
        Err(e) => {
            warn!("⚠️ No respiratory rate: {}", e);
            0
        }
    }
}

pub fn estimate_respiratory_rate_with(
    x: &[f32],
    y: &[f32],
    z: &[f32],
    timestamps_ns: &[i64],
    config: &RespirationConfig,
) -> Result<u32, VitalsError> {
    if x.is_empty() || y.is_empty() || z.is_empty() {
        return Err(VitalsError::DegenerateInput(format!(
            "empty accelerometer axis (x={}, y={}, z={})",
            x.len(),
            y.len(),
            z.len()
        )));
    }

    let crossings = count_crossings(x, y, z, config.crossing_threshold, config.initial_reference);
    let window_secs = window_secs(config.window, timestamps_ns);
    let rate = (crossings as f64 / window_secs * BREATHS_PER_CROSSING_MINUTE).trunc() as u32;
    info!("🫁 {} crossings over {:.1}s -> {} breaths/min", crossings, window_secs, rate);
    Ok(rate)
}

/// 从第二个样本开始，幅值与上一个幅值之差超过阈值即计一次
pub fn count_crossings(
    x: &[f32],
    y: &[f32],
    z: &[f32],
    threshold: f32,
    initial_reference: f32,
) -> usize {
    let n = x.len().min(y.len()).min(z.len());
    let mut prev = initial_reference;
    let mut crossings = 0;
    for i in 1..n {
        let current = magnitude(x[i], y[i], z[i]);
        if (prev - current).abs() > threshold {
            crossings += 1;
        }
        prev = current;
    }
    crossings
}

/// 平方和在 f64 中计算，开方后再转回 f32
fn magnitude(x: f32, y: f32, z: f32) -> f32 {
    let (x, y, z) = (x as f64, y as f64, z as f64);
    (x * x + y * y + z * z).sqrt() as f32
}

fn window_secs(window: RespirationWindow, timestamps_ns: &[i64]) -> f64 {
    match window {
        RespirationWindow::Fixed(secs) if secs > 0.0 => secs,
        RespirationWindow::Fixed(secs) => {
            warn!("⚠️ Invalid respiration window {}s, using default", secs);
            RESPIRATION_WINDOW_SECS
        }
        RespirationWindow::Measured => match (timestamps_ns.first(), timestamps_ns.last()) {
            (Some(&first), Some(&last)) if last > first => (last - first) as f64 / 1e9,
            _ => {
                debug!("Timestamps unusable for measured window, using default");
                RESPIRATION_WINDOW_SECS
            }
        },
    }
}
