pub mod challenge;
pub mod error;
pub mod fetcher;
pub mod platform_extractor;
pub mod platforms;
pub mod session;

pub use challenge::{AttemptFailure, resolve_with_challenge};
pub use error::ExtractorError;
pub use fetcher::{HttpFetcher, PageFetcher, PageResponse, build_client};
pub use platform_extractor::{Extractor, PlatformExtractor};
pub use session::SessionState;
