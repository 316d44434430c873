pub mod vimeo;

pub use vimeo::Vimeo;
