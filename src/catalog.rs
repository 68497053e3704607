use async_trait::async_trait;
use serde::{Serialize, Serializer};

/// Result taxonomy used by the upstream catalog. Only songs and videos can
/// be played or downloaded; every other kind is dropped from search output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    Song,
    Video,
    Album,
    Artist,
    Playlist,
    Other,
}

impl ItemKind {
    pub fn is_playable(self) -> bool {
        matches!(self, ItemKind::Song | ItemKind::Video)
    }
}

/// A raw search item as the catalog reports it, before projection. Optional
/// fields stay optional here; defaults are applied only when projecting.
#[derive(Clone, Debug)]
pub struct CatalogItem {
    pub kind: ItemKind,
    pub name: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_secs: Option<u64>,
    pub thumbnails: Vec<String>,
    pub video_id: Option<String>,
}

/// Duration in whole seconds when the catalog reports one, serialized as the
/// literal string "Unknown" otherwise. The output field is never null.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackDuration(pub Option<u64>);

impl Serialize for TrackDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(secs) => serializer.serialize_u64(secs),
            None => serializer.serialize_str("Unknown"),
        }
    }
}

/// The normalized search-result shape served to the web client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub duration: TrackDuration,
    pub thumbnail: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl Track {
    /// Projects a raw item into the output shape. Each fallback applies
    /// independently; a missing artist does not affect the duration field.
    /// Returns None when the item carries no video id, since `id` must be
    /// non-empty in every emitted track.
    fn project(item: CatalogItem) -> Option<Track> {
        let video_id = item.video_id.filter(|id| !id.is_empty())?;
        Some(Track {
            id: video_id.clone(),
            title: item
                .name
                .or(item.title)
                .unwrap_or_else(|| "Unknown".to_string()),
            artist: item.artist.unwrap_or_else(|| "Unknown".to_string()),
            duration: TrackDuration(item.duration_secs),
            thumbnail: item.thumbnails.into_iter().next().unwrap_or_default(),
            video_id,
            kind: item.kind,
        })
    }
}

/// Keeps playable items in upstream relevance order, truncates to `limit`,
/// and projects the survivors. Items without a video id are not playable.
pub fn project_playable(items: Vec<CatalogItem>, limit: usize) -> Vec<Track> {
    items
        .into_iter()
        .filter(|item| {
            item.kind.is_playable() && item.video_id.as_deref().is_some_and(|id| !id.is_empty())
        })
        .take(limit)
        .filter_map(Track::project)
        .collect()
}

/// The external catalog-search capability. The concrete client is built once
/// behind the single-flight initializer and only borrowed per call.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<CatalogItem>>;
    async fn artist(&self, browse_id: &str) -> anyhow::Result<serde_json::Value>;
}
