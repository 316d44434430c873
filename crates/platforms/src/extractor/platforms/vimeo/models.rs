use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `window.playerConfig` object embedded in a player page.
///
/// Only the fields we read are modelled; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct PlayerConfig {
    pub request: PlayerRequest,
    pub video: VideoInfo,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: PlayerFiles,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerFiles {
    #[serde(default)]
    pub dash: Option<StreamFiles>,
    #[serde(default)]
    pub hls: Option<StreamFiles>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamFiles {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cdns: FxHashMap<String, CdnEntry>,
    #[serde(default)]
    pub default_cdn: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub streams: Vec<StreamEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CdnEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub avc_url: Option<String>,
}

impl CdnEntry {
    /// The AVC variant when published, the generic url otherwise.
    pub fn best_url(&self) -> Option<&str> {
        [self.avc_url.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamEntry {
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    // seconds, sometimes fractional
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbs: BTreeMap<String, String>,
    #[serde(default)]
    pub owner: Option<OwnerInfo>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_config_tolerates_missing_optional_sections() {
        let json = r#"{
  "request": { "files": { "hls": { "cdns": { "fastly_skyfire": { "url": "https://b/42.m3u8" } } } } },
  "video": { "id": 42, "duration": 119.6 }
}"#;
        let config: PlayerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.video.id, 42);
        assert!(config.video.owner.is_none());
        assert!(config.request.files.dash.is_none());

        let hls = config.request.files.hls.unwrap();
        assert_eq!(hls.cdns["fastly_skyfire"].best_url(), Some("https://b/42.m3u8"));
    }

    #[test]
    fn explicit_nulls_read_as_missing() {
        let json = r#"{
  "request": { "files": null },
  "video": { "id": 9, "title": null, "thumbs": null, "owner": { "id": null, "name": null } }
}"#;
        let config: PlayerConfig = serde_json::from_str(json).unwrap();

        assert!(config.request.files.hls.is_none());
        assert!(config.video.title.is_none());
        assert!(config.video.thumbs.is_empty());
        let owner = config.video.owner.unwrap();
        assert!(owner.id.is_none() && owner.name.is_none());
    }

    #[test]
    fn cdn_entry_prefers_avc_url() {
        let entry = CdnEntry {
            url: Some("https://a/plain".into()),
            avc_url: Some("https://a/avc".into()),
        };
        assert_eq!(entry.best_url(), Some("https://a/avc"));

        let empty = CdnEntry {
            url: Some(String::new()),
            avc_url: None,
        };
        assert_eq!(empty.best_url(), None);
    }
}
