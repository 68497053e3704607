use tracing::debug;

use crate::catalog::{project_playable, Catalog, Track};
use crate::error::ApiError;
use crate::init::SingleFlight;

/// Runs one catalog search: validate the query, wait for the shared client,
/// issue the upstream call, then filter and project the results.
///
/// Upstream failures are reported to the caller with their message, never
/// collapsed into an empty result list.
pub async fn search_tracks<C>(
    catalog: &SingleFlight<C>,
    query: &str,
    limit: usize,
) -> Result<Vec<Track>, ApiError>
where
    C: Catalog + 'static,
{
    if query.trim().is_empty() {
        return Err(ApiError::Validation("Search query is required"));
    }

    let client = catalog.get().await?;
    let items = client
        .search(query)
        .await
        .map_err(|e| ApiError::upstream("Search failed", e))?;
    debug!("{} raw items for {query:?}", items.len());

    Ok(project_playable(items, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, ItemKind};
    use async_trait::async_trait;

    struct StubCatalog {
        items: Vec<CatalogItem>,
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<CatalogItem>> {
            Ok(self.items.clone())
        }

        async fn artist(&self, _browse_id: &str) -> anyhow::Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl Catalog for FailingCatalog {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<CatalogItem>> {
            Err(anyhow::anyhow!("upstream exploded"))
        }

        async fn artist(&self, _browse_id: &str) -> anyhow::Result<serde_json::Value> {
            Err(anyhow::anyhow!("upstream exploded"))
        }
    }

    fn stub_flight(items: Vec<CatalogItem>) -> SingleFlight<StubCatalog> {
        SingleFlight::new(move || {
            let items = items.clone();
            async move { Ok(StubCatalog { items }) }
        })
    }

    fn item(kind: ItemKind, video_id: Option<&str>, name: &str) -> CatalogItem {
        CatalogItem {
            kind,
            name: Some(name.to_string()),
            title: None,
            artist: Some("Artist".to_string()),
            duration_secs: Some(180),
            thumbnails: vec!["t.jpg".to_string()],
            video_id: video_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_setup() {
        let flight = stub_flight(vec![]);
        let err = search_tracks(&flight, "", 20).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        // Validation short-circuits; the client was never built.
        assert!(!flight.is_ready());
    }

    #[tokio::test]
    async fn whitespace_query_is_rejected() {
        let flight = stub_flight(vec![]);
        let err = search_tracks(&flight, "   ", 20).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn zero_limit_returns_empty() {
        let flight = stub_flight(vec![item(ItemKind::Song, Some("v1"), "A")]);
        let tracks = search_tracks(&flight, "x", 0).await.unwrap();
        assert!(tracks.is_empty());
    }

    #[tokio::test]
    async fn mixed_kinds_are_filtered_in_upstream_order() {
        let flight = stub_flight(vec![
            item(ItemKind::Song, Some("v1"), "A"),
            item(ItemKind::Album, None, "An Album"),
            item(ItemKind::Video, Some("v2"), "B"),
            item(ItemKind::Playlist, None, "Mix"),
        ]);

        let tracks = search_tracks(&flight, "a", 20).await.unwrap();
        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["v1", "v2"]);
    }

    #[tokio::test]
    async fn identical_calls_yield_identical_results() {
        let flight = stub_flight(vec![
            item(ItemKind::Song, Some("v1"), "A"),
            item(ItemKind::Video, Some("v2"), "B"),
        ]);

        let first = search_tracks(&flight, "query", 10).await.unwrap();
        let second = search_tracks(&flight, "query", 10).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_with_message() {
        let flight: SingleFlight<FailingCatalog> =
            SingleFlight::new(|| async { Ok(FailingCatalog) });

        let err = search_tracks(&flight, "x", 20).await.unwrap_err();
        match err {
            ApiError::Upstream { context, message } => {
                assert_eq!(context, "Search failed");
                assert!(message.contains("upstream exploded"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
