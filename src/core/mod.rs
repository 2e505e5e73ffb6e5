pub mod config;
pub mod error;
pub mod heart_rate;
pub mod respiration;
pub mod signal;
pub mod video;

pub use config::{
    ConfigError, HeartRateConfig, RespirationConfig, RespirationWindow, SamplingConfig,
};
pub use error::VitalsError;
