pub mod vitals;

pub use vitals::{HeartRateReport, SessionStats};
