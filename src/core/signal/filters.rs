//! 基础滤波与统计

/// Causal trailing moving average. Samples before the window fills keep
/// their raw value; output length equals input length.
pub fn moving_average(src: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return src.to_vec();
    }
    let mut out = Vec::with_capacity(src.len());
    let mut acc = 0.0;
    for (i, &v) in src.iter().enumerate() {
        acc += v;
        if i >= window {
            acc -= src[i - window];
        }
        out.push(if i + 1 >= window { acc / window as f64 } else { v });
    }
    out
}

/// 减去滑动均值（去趋势 / 高通）
pub fn highpass(src: &[f64], window: usize) -> Vec<f64> {
    let trend = moving_average(src, window);
    src.iter().zip(&trend).map(|(x, t)| x - t).collect()
}

pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population standard deviation.
pub fn std_dev(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    let var = x.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / x.len() as f64;
    var.sqrt()
}

/// 零均值单位方差；标准差过小时原样返回
pub fn zscore(x: &[f64]) -> Vec<f64> {
    let mu = mean(x);
    let sd = std_dev(x);
    if sd > 1e-9 {
        x.iter().map(|v| (v - mu) / sd).collect()
    } else {
        x.to_vec()
    }
}

/// Linear-interpolated percentile, `p` in `[0, 1]`.
pub fn percentile(x: &[f64], p: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let last = (sorted.len() - 1) as f64;
    let idx = (last * p).clamp(0.0, last);
    let (i0, i1) = (idx.floor() as usize, idx.ceil() as usize);
    if i0 == i1 {
        sorted[i0]
    } else {
        sorted[i0] + (idx - i0 as f64) * (sorted[i1] - sorted[i0])
    }
}
