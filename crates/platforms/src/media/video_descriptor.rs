use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extractor::error::ExtractorError;

/// Delivery protocol of a candidate stream URL.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    /// Segmented HTTP (HLS playlist).
    Hls,
    /// Adaptive manifest (DASH).
    Dash,
}

impl StreamProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamProtocol::Hls => "hls",
            StreamProtocol::Dash => "dash",
        }
    }
}

impl fmt::Display for StreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which CDN a URL was published under.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CdnVariant {
    Primary,
    Alternate,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CdnUrls {
    pub primary: Option<String>,
    pub alternate: Option<String>,
}

impl CdnUrls {
    pub fn get(&self, variant: CdnVariant) -> Option<&str> {
        match variant {
            CdnVariant::Primary => self.primary.as_deref(),
            CdnVariant::Alternate => self.alternate.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.alternate.is_none()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUrls {
    pub hls: CdnUrls,
    pub dash: CdnUrls,
}

impl StreamUrls {
    pub fn get(&self, protocol: StreamProtocol, variant: CdnVariant) -> Option<&str> {
        match protocol {
            StreamProtocol::Hls => self.hls.get(variant),
            StreamProtocol::Dash => self.dash.get(variant),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hls.is_empty() && self.dash.is_empty()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    pub id: u64,
    pub name: String,
}

/// Everything needed to acquire one video, as published by its player page.
///
/// Only built through [`VideoDescriptor::new`], which refuses a descriptor
/// without a single stream URL. Fields are read through accessors.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VideoDescriptor {
    id: u64,
    title: String,
    duration_secs: u64,
    width: u32,
    height: u32,
    qualities: Vec<String>,
    thumbnails: BTreeMap<String, String>,
    owner: Owner,
    streams: StreamUrls,
}

/// Order in which candidate URLs are tried when a single one is needed.
const STREAM_PREFERENCE: [(StreamProtocol, CdnVariant); 4] = [
    (StreamProtocol::Hls, CdnVariant::Primary),
    (StreamProtocol::Hls, CdnVariant::Alternate),
    (StreamProtocol::Dash, CdnVariant::Primary),
    (StreamProtocol::Dash, CdnVariant::Alternate),
];

impl VideoDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        title: impl Into<String>,
        duration_secs: u64,
        width: u32,
        height: u32,
        qualities: Vec<String>,
        thumbnails: BTreeMap<String, String>,
        owner: Owner,
        streams: StreamUrls,
    ) -> Result<Self, ExtractorError> {
        if streams.is_empty() {
            return Err(ExtractorError::NoStreamsFound);
        }

        Ok(Self {
            id,
            title: title.into(),
            duration_secs,
            width,
            height,
            qualities,
            thumbnails,
            owner,
            streams,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rounded to whole seconds; zero when the page does not say.
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Quality labels in the order the player lists them, e.g. "1080p".
    pub fn qualities(&self) -> &[String] {
        &self.qualities
    }

    /// Thumbnail URLs keyed by size label ("base", "640", ...).
    pub fn thumbnails(&self) -> &BTreeMap<String, String> {
        &self.thumbnails
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn streams(&self) -> &StreamUrls {
        &self.streams
    }

    pub fn stream_url(&self, protocol: StreamProtocol, variant: CdnVariant) -> Option<&str> {
        self.streams.get(protocol, variant)
    }

    /// The URL handed to the stream acquirer: HLS before DASH, primary CDN
    /// before alternate.
    pub fn preferred_stream(&self) -> Option<(StreamProtocol, CdnVariant, &str)> {
        STREAM_PREFERENCE.iter().find_map(|&(protocol, variant)| {
            self.stream_url(protocol, variant)
                .map(|url| (protocol, variant, url))
        })
    }

    pub fn preferred_stream_url(&self) -> Option<&str> {
        self.preferred_stream().map(|(_, _, url)| url)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for VideoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" by {} ({}s, {}x{})",
            self.id, self.title, self.owner.name, self.duration_secs, self.width, self.height
        )
    }
}
