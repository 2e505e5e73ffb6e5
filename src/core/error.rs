use crate::core::heart_rate::CandidateTag;
use crate::core::video::OpenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] OpenError),
    #[error("Insufficient frames: kept {kept}, need {required}")]
    InsufficientFrames { kept: usize, required: usize },
    #[error("Sampled window too short: {span_secs:.2}s, need {required_secs:.2}s")]
    WindowTooShort { span_secs: f64, required_secs: f64 },
    #[error("No usable ROI/channel (flat signal across candidates)")]
    FlatSignal,
    #[error(
        "No valid BPM in physiological range (AC={autocorr}, Goertzel={goertzel}, Peaks={peaks}) \
         best={candidate} score={score:.3}"
    )]
    OutOfRange {
        candidate: CandidateTag,
        score: f64,
        autocorr: u32,
        goertzel: u32,
        peaks: u32,
    },
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}

impl VitalsError {
    /// Short machine-readable kind for the host app.
    pub fn kind(&self) -> &'static str {
        match self {
            VitalsError::Acquisition(_) => "AcquisitionFailure",
            VitalsError::InsufficientFrames { .. }
            | VitalsError::WindowTooShort { .. }
            | VitalsError::FlatSignal => "InsufficientSignal",
            VitalsError::OutOfRange { .. } => "OutOfRangeEstimate",
            VitalsError::DegenerateInput(_) => "DegenerateInput",
        }
    }
}
