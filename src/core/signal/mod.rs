pub mod filters;
pub mod preprocess;

pub use filters::{highpass, mean, moving_average, percentile, std_dev, zscore};
pub use preprocess::{preprocess, resample_uniform, PreprocessedSignal};
