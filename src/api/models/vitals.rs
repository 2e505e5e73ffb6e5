use crate::core::error::VitalsError;
use crate::core::heart_rate::HeartRateEstimate;
use serde::{Deserialize, Serialize};

/// 心率分析结果，FRB 友好：成功与失败都用同一个扁平结构表示
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateReport {
    /// 0 表示无结果
    pub bpm: u32,
    /// Autocorrelation / Goertzel / PeakCount
    pub method: Option<String>,
    /// 胜出候选，如 `G@roi0`
    pub candidate: Option<String>,
    pub score: f64,
    pub error_type: Option<String>,
    pub message: Option<String>,
}

impl HeartRateReport {
    pub fn is_ok(&self) -> bool {
        self.error_type.is_none()
    }

    pub fn error(error_type: &str, message: String) -> Self {
        Self {
            error_type: Some(error_type.to_string()),
            message: Some(message),
            ..Default::default()
        }
    }
}

impl From<HeartRateEstimate> for HeartRateReport {
    fn from(estimate: HeartRateEstimate) -> Self {
        Self {
            bpm: estimate.bpm,
            method: Some(format!("{:?}", estimate.method)),
            candidate: Some(estimate.candidate.to_string()),
            score: estimate.score,
            error_type: None,
            message: None,
        }
    }
}

impl From<VitalsError> for HeartRateReport {
    fn from(err: VitalsError) -> Self {
        let mut report = Self::error(err.kind(), err.to_string());
        if let VitalsError::OutOfRange { candidate, score, .. } = &err {
            report.candidate = Some(candidate.to_string());
            report.score = *score;
        }
        report
    }
}

impl From<Result<HeartRateEstimate, VitalsError>> for HeartRateReport {
    fn from(result: Result<HeartRateEstimate, VitalsError>) -> Self {
        match result {
            Ok(estimate) => estimate.into(),
            Err(err) => err.into(),
        }
    }
}

/// 实时采集会话统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub received_frames: u64,
    pub kept_frames: u64,
    pub duplicate_frames: u64,
    pub span_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::heart_rate::{CandidateTag, Channel, EstimationMethod};
    use crate::core::video::RegionKind;

    fn tag() -> CandidateTag {
        CandidateTag {
            region: RegionKind::PlusX,
            channel: Channel::GreenMinusRed,
        }
    }

    #[test]
    fn test_report_from_estimate() {
        let report = HeartRateReport::from(Ok::<_, VitalsError>(HeartRateEstimate {
            bpm: 72,
            method: EstimationMethod::Goertzel,
            candidate: tag(),
            score: 0.42,
        }));

        assert!(report.is_ok());
        assert_eq!(report.bpm, 72);
        assert_eq!(report.method.as_deref(), Some("Goertzel"));
        assert_eq!(report.candidate.as_deref(), Some("G-R@roi1"));
    }

    #[test]
    fn test_report_from_out_of_range() {
        let report = HeartRateReport::from(Err::<HeartRateEstimate, _>(VitalsError::OutOfRange {
            candidate: tag(),
            score: 0.3,
            autocorr: 0,
            goertzel: 35,
            peaks: 230,
        }));

        assert!(!report.is_ok());
        assert_eq!(report.bpm, 0);
        assert_eq!(report.error_type.as_deref(), Some("OutOfRangeEstimate"));
        assert_eq!(report.candidate.as_deref(), Some("G-R@roi1"));
        assert_eq!(report.score, 0.3);
        assert!(report.message.unwrap_or_default().contains("Goertzel=35"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = HeartRateReport::from(VitalsError::FlatSignal);
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["bpm"], 0);
        assert_eq!(json["error_type"], "InsufficientSignal");
        assert!(json["method"].is_null());
    }
}
