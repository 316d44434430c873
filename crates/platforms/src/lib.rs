//! Stream metadata extraction for embedded video players.
//!
//! A platform extractor fetches a player page, pulls the embedded
//! configuration out of it and turns it into a [`media::VideoDescriptor`].
//! Session challenges (a cookie round-trip before the real page is served)
//! are answered once per attempt through [`extractor::challenge`].

pub mod extractor;
pub mod media;
