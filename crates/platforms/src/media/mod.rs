pub mod video_descriptor;

pub use video_descriptor::{CdnUrls, CdnVariant, Owner, StreamProtocol, StreamUrls, VideoDescriptor};
