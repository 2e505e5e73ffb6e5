pub mod deduplicator;
pub mod frame;
pub mod roi;
pub mod sampler;
pub mod source;

pub use deduplicator::{DedupDecision, FrameDeduplicator};
pub use frame::{Frame, RawFrame};
pub use roi::{
    candidate_regions, extract_region_series, Region, RegionKind, RegionSeries, REGION_ORDER,
};
pub use sampler::{FrameSampler, SampledClip};
pub use source::{
    grab_frame, ImageSequence, ImageSequenceSource, MemoryFrameSource, OpenError, SeekMode,
    VideoFrameSource, SEEK_FALLBACK_ORDER,
};
