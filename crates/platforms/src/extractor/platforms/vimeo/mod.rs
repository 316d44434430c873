mod builder;
pub mod models;

pub use builder::{Vimeo, normalize_url, page_url, video_id_from_url};
