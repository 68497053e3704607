use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde_json::{json, Value};
use tracing::debug;

use crate::catalog::{Catalog, CatalogItem, ItemKind};

const MUSIC_HOME: &str = "https://music.youtube.com/";
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Client for the YouTube Music web API.
///
/// Built once per process behind the single-flight initializer; after
/// construction it is only read, never mutated.
pub struct YtMusicClient {
    http: reqwest::Client,
    api_key: String,
    client_version: String,
    visitor_data: Option<String>,
}

impl YtMusicClient {
    /// Fetches the web-player page and scrapes the API key and client
    /// version out of the embedded config blob. This is the slow,
    /// network-bound setup the initializer guards.
    pub async fn connect() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(ORIGIN, HeaderValue::from_static("https://music.youtube.com"));
        headers.insert(REFERER, HeaderValue::from_static(MUSIC_HOME));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;

        let html = http
            .get(MUSIC_HOME)
            .send()
            .await
            .context("fetch bootstrap page")?
            .error_for_status()
            .context("bootstrap page status")?
            .text()
            .await
            .context("read bootstrap page")?;

        let api_key = scrape_config_value(&html, "INNERTUBE_API_KEY")
            .context("INNERTUBE_API_KEY missing from bootstrap page")?;
        let client_version = scrape_config_value(&html, "INNERTUBE_CLIENT_VERSION")
            .context("INNERTUBE_CLIENT_VERSION missing from bootstrap page")?;
        let visitor_data = scrape_config_value(&html, "VISITOR_DATA");

        debug!(%client_version, "catalog client ready");

        Ok(Self {
            http,
            api_key,
            client_version,
            visitor_data,
        })
    }

    fn post(&self, endpoint: &str, body: Value) -> reqwest::RequestBuilder {
        let url = format!(
            "https://music.youtube.com/youtubei/v1/{endpoint}?key={}&prettyPrint=false",
            self.api_key
        );
        let mut req = self
            .http
            .post(url)
            .header("X-Youtube-Client-Name", "67")
            .header("X-Youtube-Client-Version", self.client_version.as_str());
        if let Some(v) = self.visitor_data.as_deref() {
            req = req.header("X-Goog-Visitor-Id", v);
        }
        req.json(&body)
    }

    fn request_context(&self) -> Value {
        json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": self.client_version,
                }
            }
        })
    }
}

#[async_trait]
impl Catalog for YtMusicClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<CatalogItem>> {
        let mut body = self.request_context();
        body["query"] = Value::String(query.to_string());

        let response: Value = self
            .post("search", body)
            .send()
            .await
            .context("search request")?
            .error_for_status()
            .context("search status")?
            .json()
            .await
            .context("parse search response")?;

        Ok(collect_search_items(&response))
    }

    async fn artist(&self, browse_id: &str) -> anyhow::Result<Value> {
        let mut body = self.request_context();
        body["browseId"] = Value::String(browse_id.to_string());

        self.post("browse", body)
            .send()
            .await
            .context("artist request")?
            .error_for_status()
            .context("artist status")?
            .json()
            .await
            .context("parse artist response")
    }
}

/// Walks a search response, classifying each result shelf by its category
/// label and flattening the items in page order.
fn collect_search_items(response: &Value) -> Vec<CatalogItem> {
    let mut items = Vec::new();
    walk(response, &mut |node| {
        let Some(shelf) = node.get("musicShelfRenderer") else {
            return;
        };
        let kind = shelf
            .pointer("/title/runs/0/text")
            .and_then(Value::as_str)
            .map(kind_for_category)
            .unwrap_or(ItemKind::Other);
        let Some(contents) = shelf.get("contents").and_then(Value::as_array) else {
            return;
        };
        for entry in contents {
            if let Some(renderer) = entry.get("musicResponsiveListItemRenderer") {
                items.push(parse_list_item(renderer, kind));
            }
        }
    });
    items
}

fn kind_for_category(label: &str) -> ItemKind {
    match label {
        "Songs" | "Top result" => ItemKind::Song,
        "Videos" => ItemKind::Video,
        "Albums" => ItemKind::Album,
        "Artists" => ItemKind::Artist,
        l if l.contains("playlists") => ItemKind::Playlist,
        _ => ItemKind::Other,
    }
}

fn parse_list_item(renderer: &Value, kind: ItemKind) -> CatalogItem {
    // Video ids show up in a few places depending on the renderer variant.
    let video_id = renderer
        .pointer("/playlistItemData/videoId")
        .or_else(|| renderer.pointer("/navigationEndpoint/watchEndpoint/videoId"))
        .or_else(|| {
            renderer.pointer(
                "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/videoId",
            )
        })
        .and_then(Value::as_str)
        .map(str::to_string);

    let name = renderer
        .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
        .and_then(Value::as_str)
        .map(str::to_string);

    // The second flex column holds "Artist • Album • 3:45" style runs.
    let byline = renderer
        .pointer("/flexColumns/1/musicResponsiveListItemFlexColumnRenderer/text/runs")
        .and_then(Value::as_array);

    let artist = byline.and_then(|runs| {
        runs.iter()
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .find(|text| *text != " • " && !text.is_empty())
            .map(str::to_string)
    });

    let duration_secs = byline.and_then(|runs| {
        runs.iter()
            .rev()
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .find_map(parse_length_text)
    });

    let thumbnails = renderer
        .pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(Value::as_array)
        .map(|thumbs| {
            thumbs
                .iter()
                .filter_map(|t| t.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    CatalogItem {
        kind,
        name,
        title: None,
        artist,
        duration_secs,
        thumbnails,
        video_id,
    }
}

/// Parses length text like "3:45" or "1:02:10" into seconds.
fn parse_length_text(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.split(':').collect();
    match parts.len() {
        2 => {
            let mins: u64 = parts[0].trim().parse().ok()?;
            let secs: u64 = parts[1].parse().ok()?;
            Some(mins * 60 + secs)
        }
        3 => {
            let hours: u64 = parts[0].trim().parse().ok()?;
            let mins: u64 = parts[1].parse().ok()?;
            let secs: u64 = parts[2].parse().ok()?;
            Some(hours * 3600 + mins * 60 + secs)
        }
        _ => None,
    }
}

/// Looks for `"KEY":"value"` occurrences in the initial config payload.
fn scrape_config_value(html: &str, key: &str) -> Option<String> {
    let needle = format!("\"{key}\":\"");
    let start = html.find(&needle)? + needle.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn walk<F: FnMut(&Value)>(value: &Value, visit: &mut F) {
    visit(value);
    match value {
        Value::Array(entries) => {
            for entry in entries {
                walk(entry, visit);
            }
        }
        Value::Object(fields) => {
            for field in fields.values() {
                walk(field, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_fixture() -> Value {
        json!({
            "contents": {
                "tabbedSearchResultsRenderer": {
                    "tabs": [{
                        "tabRenderer": {
                            "content": {
                                "sectionListRenderer": {
                                    "contents": [
                                        {
                                            "musicShelfRenderer": {
                                                "title": { "runs": [{ "text": "Songs" }] },
                                                "contents": [{
                                                    "musicResponsiveListItemRenderer": {
                                                        "playlistItemData": { "videoId": "dQw4w9WgXcQ" },
                                                        "thumbnail": {
                                                            "musicThumbnailRenderer": {
                                                                "thumbnail": { "thumbnails": [{ "url": "https://img/1.jpg" }] }
                                                            }
                                                        },
                                                        "flexColumns": [
                                                            {
                                                                "musicResponsiveListItemFlexColumnRenderer": {
                                                                    "text": { "runs": [{ "text": "Never Gonna Give You Up" }] }
                                                                }
                                                            },
                                                            {
                                                                "musicResponsiveListItemFlexColumnRenderer": {
                                                                    "text": { "runs": [
                                                                        { "text": "Rick Astley" },
                                                                        { "text": " • " },
                                                                        { "text": "3:33" }
                                                                    ] }
                                                                }
                                                            }
                                                        ]
                                                    }
                                                }]
                                            }
                                        },
                                        {
                                            "musicShelfRenderer": {
                                                "title": { "runs": [{ "text": "Albums" }] },
                                                "contents": [{
                                                    "musicResponsiveListItemRenderer": {
                                                        "flexColumns": [{
                                                            "musicResponsiveListItemFlexColumnRenderer": {
                                                                "text": { "runs": [{ "text": "Whenever You Need Somebody" }] }
                                                            }
                                                        }]
                                                    }
                                                }]
                                            }
                                        }
                                    ]
                                }
                            }
                        }
                    }]
                }
            }
        })
    }

    #[test]
    fn shelves_are_classified_and_flattened_in_order() {
        let items = collect_search_items(&search_fixture());
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].kind, ItemKind::Song);
        assert_eq!(items[0].video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(items[0].name.as_deref(), Some("Never Gonna Give You Up"));
        assert_eq!(items[0].artist.as_deref(), Some("Rick Astley"));
        assert_eq!(items[0].duration_secs, Some(213));
        assert_eq!(items[0].thumbnails, vec!["https://img/1.jpg".to_string()]);

        assert_eq!(items[1].kind, ItemKind::Album);
        assert_eq!(items[1].video_id, None);
    }

    #[test]
    fn length_text_parses_both_forms() {
        assert_eq!(parse_length_text("3:45"), Some(225));
        assert_eq!(parse_length_text("1:02:10"), Some(3730));
        assert_eq!(parse_length_text("Rick Astley"), None);
        assert_eq!(parse_length_text(""), None);
    }

    #[test]
    fn config_values_are_scraped_from_page_source() {
        let html = r#"ytcfg.set({"INNERTUBE_API_KEY":"AIzaSyExample","INNERTUBE_CLIENT_VERSION":"1.20260801.01.00"});"#;
        assert_eq!(
            scrape_config_value(html, "INNERTUBE_API_KEY").as_deref(),
            Some("AIzaSyExample")
        );
        assert_eq!(
            scrape_config_value(html, "INNERTUBE_CLIENT_VERSION").as_deref(),
            Some("1.20260801.01.00")
        );
        assert_eq!(scrape_config_value(html, "VISITOR_DATA"), None);
    }
}
