//! `reqwest` implementation of [`BackendApi`].
//!
//! # Design
//! - Endpoint URLs come from [`ClientConfig`] so prefixes stay configurable.
//! - Non-success responses are classified once: 404 becomes
//!   [`ApiError::NotFound`], everything else [`ApiError::Rejected`] carrying the
//!   backend's `detail` text when present.
//! - Bodies are read as bytes and decoded with `serde_json` so decode failures
//!   keep their endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use streamdock_config::ClientConfig;
use streamdock_model::{
    DownloadableItem, EnqueueStatus, ListBody, MediaId, NewSeasonNotice, NewWatchlistEntry,
    QueueSnapshot, SeasonEnqueueReport, WatchlistEntry, WatchlistRemoval, WatchlistSeasonUpdate,
};
use streamdock_view::stream_path;
use tracing::{debug, warn};
use url::Url;

use crate::api::BackendApi;
use crate::error::{ApiError, ApiResult};

/// HTTP client for the download backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: Arc<ClientConfig>,
}

#[derive(Deserialize)]
struct PathBody {
    path: String,
}

impl HttpBackend {
    /// Build a client that applies the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be initialised.
    pub fn new(config: Arc<ClientConfig>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Network {
                endpoint: config.base_url.to_string(),
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { client, config })
    }

    /// Wrap an already configured client, e.g. one carrying default headers.
    #[must_use]
    pub const fn with_client(client: Client, config: Arc<ClientConfig>) -> Self {
        Self { client, config }
    }

    /// Configuration the backend was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn execute(&self, url: Url, request: RequestBuilder) -> ApiResult<Response> {
        let endpoint = url.path().to_string();
        debug!(%endpoint, "sending backend request");
        let response = request.send().await.map_err(|err| ApiError::Network {
            endpoint: endpoint.clone(),
            message: err.to_string(),
        })?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify(endpoint, response).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let endpoint = url.path().to_string();
        let response = self.execute(url.clone(), self.client.get(url)).await?;
        decode(&endpoint, response).await
    }

    async fn delete(&self, url: Url) -> ApiResult<()> {
        self.execute(url.clone(), self.client.delete(url))
            .await
            .map(drop)
    }

    async fn post_json<B: serde::Serialize + Sync>(&self, url: Url, body: &B) -> ApiResult<()> {
        self.execute(url.clone(), self.client.post(url).json(body))
            .await
            .map(drop)
    }

    async fn enqueue(&self, url: Url) -> ApiResult<EnqueueStatus> {
        let endpoint = url.path().to_string();
        match self.get_json::<EnqueueStatus>(url).await? {
            EnqueueStatus::Error { detail } => Err(ApiError::Rejected {
                endpoint,
                status: None,
                message: detail.unwrap_or_else(|| "backend reported an error".to_string()),
            }),
            status => Ok(status),
        }
    }
}

/// Absolute URL the backend streams a stored file from.
///
/// Returns `None` when the path has no usable basename.
#[must_use]
pub fn stream_url(config: &ClientConfig, file_path: &str) -> Option<Url> {
    stream_path(file_path).map(|relative| config.server_url(&relative))
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> ApiResult<T> {
    let body = response.bytes().await.map_err(|err| ApiError::Network {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

/// Decode each record on its own; one bad record must not hide the rest.
fn decode_records<T: DeserializeOwned>(endpoint: &str, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(endpoint, index, error = %err, "skipping undecodable record");
                None
            }
        })
        .collect()
}

async fn classify(endpoint: String, response: Response) -> ApiError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let message = problem_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound { endpoint, message }
    } else {
        ApiError::Rejected {
            endpoint,
            status: Some(status.as_u16()),
            message,
        }
    }
}

fn problem_detail(body: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        match value.get("detail") {
            Some(Value::String(detail)) => return Some(detail.clone()),
            Some(other) => return Some(other.to_string()),
            None => {}
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn list_items(&self) -> ApiResult<Vec<DownloadableItem>> {
        let url = self.config.server_url("path/get");
        let endpoint = url.path().to_string();
        let records: Vec<Value> = self.get_json(url).await?;
        Ok(decode_records(&endpoint, records))
    }

    async fn queue_status(&self) -> ApiResult<QueueSnapshot> {
        self.get_json(self.config.api_url("downloads/status")).await
    }

    async fn delete_movie(&self, id: &MediaId) -> ApiResult<()> {
        let mut url = self.config.server_url("delete/movie");
        url.query_pairs_mut().append_pair("movie_id", id.as_str());
        self.delete(url).await
    }

    async fn delete_episode(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
    ) -> ApiResult<()> {
        let mut url = self.config.server_url("delete/episode");
        url.query_pairs_mut()
            .append_pair("series_id", series_id.as_str())
            .append_pair("season_number", &season.to_string())
            .append_pair("episode_number", &episode.to_string());
        self.delete(url).await
    }

    async fn enqueue_movie(&self, id: &MediaId, slug: &str) -> ApiResult<EnqueueStatus> {
        let mut url = self.config.api_url("download/film");
        url.query_pairs_mut()
            .append_pair("id", id.as_str())
            .append_pair("slug", slug);
        self.enqueue(url).await
    }

    async fn enqueue_episode(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
        slug: &str,
    ) -> ApiResult<EnqueueStatus> {
        let mut url = self.config.api_url("download/episode");
        url.query_pairs_mut()
            .append_pair("n_s", &season.to_string())
            .append_pair("n_ep", &episode.to_string())
            .append_pair("titleID", series_id.as_str())
            .append_pair("slug", slug);
        self.enqueue(url).await
    }

    async fn enqueue_season(
        &self,
        series_id: &MediaId,
        season: u32,
        slug: &str,
    ) -> ApiResult<SeasonEnqueueReport> {
        let mut url = self.config.api_url("download/season");
        url.query_pairs_mut()
            .append_pair("season", &season.to_string())
            .append_pair("titleID", series_id.as_str())
            .append_pair("slug", slug);
        self.get_json(url).await
    }

    async fn watchlist(&self) -> ApiResult<Vec<WatchlistEntry>> {
        self.get_json::<ListBody<WatchlistEntry>>(self.config.server_url("watchlist/get"))
            .await
            .map(ListBody::into_items)
    }

    async fn add_watchlist(&self, entry: &NewWatchlistEntry) -> ApiResult<()> {
        self.post_json(self.config.server_url("watchlist/add"), entry)
            .await
    }

    async fn update_watchlist(&self, update: &WatchlistSeasonUpdate) -> ApiResult<()> {
        self.post_json(self.config.server_url("watchlist/update"), update)
            .await
    }

    async fn remove_watchlist(&self, removal: &WatchlistRemoval) -> ApiResult<()> {
        self.post_json(self.config.server_url("watchlist/remove"), removal)
            .await
    }

    async fn check_new_seasons(&self) -> ApiResult<Vec<NewSeasonNotice>> {
        self.get_json::<ListBody<NewSeasonNotice>>(self.config.server_url("watchlist/check"))
            .await
            .map(ListBody::into_items)
    }

    async fn movie_path(&self, id: &MediaId) -> ApiResult<String> {
        let mut url = self.config.server_url("path/movie");
        url.query_pairs_mut().append_pair("id", id.as_str());
        self.get_json::<PathBody>(url).await.map(|body| body.path)
    }

    async fn episode_path(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
    ) -> ApiResult<String> {
        let mut url = self.config.server_url("path/episode");
        url.query_pairs_mut()
            .append_pair("id", series_id.as_str())
            .append_pair("season", &season.to_string())
            .append_pair("episode", &episode.to_string());
        self.get_json::<PathBody>(url).await.map(|body| body.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use streamdock_model::{DownloadStatus, MediaType};

    fn backend_for(server: &MockServer) -> HttpBackend {
        let base_url = server.base_url().parse().expect("mock server url");
        HttpBackend::new(Arc::new(ClientConfig::new(base_url))).expect("client builds")
    }

    #[tokio::test]
    async fn list_and_queue_use_their_surfaces() {
        let server = MockServer::start_async().await;
        let items = server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(200).json_body(json!([
                {"id": 7, "type": "movie", "slug": "heat", "status": "completed", "path": "/media/heat.mp4"},
                {"id": "s1", "type": "tv", "slug": "dark", "n_s": 1, "n_ep": 2, "status": "pending"}
            ]));
        });
        let queue = server.mock(|when, then| {
            when.method(GET).path("/api/downloads/status");
            then.status(200).json_body(json!({
                "current_download": null,
                "queue": []
            }));
        });

        let backend = backend_for(&server);
        let listed = backend.list_items().await.expect("items decode");
        let status = backend.queue_status().await.expect("queue decodes");

        items.assert();
        queue.assert();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, MediaId::from(7));
        assert_eq!(listed[0].status, DownloadStatus::Completed);
        assert_eq!(listed[1].media_type, MediaType::Episode);
        assert!(status.current_download.is_none());
        assert_eq!(status.depth(), 0);
    }

    #[tokio::test]
    async fn deletes_send_expected_query() {
        let server = MockServer::start_async().await;
        let movie = server.mock(|when, then| {
            when.method(DELETE)
                .path("/server/delete/movie")
                .query_param("movie_id", "m1");
            then.status(204);
        });
        let episode = server.mock(|when, then| {
            when.method(DELETE)
                .path("/server/delete/episode")
                .query_param("series_id", "s9")
                .query_param("season_number", "2")
                .query_param("episode_number", "5");
            then.status(200).json_body(json!({"message": "deleted"}));
        });

        let backend = backend_for(&server);
        backend
            .delete_movie(&MediaId::from("m1"))
            .await
            .expect("movie delete");
        backend
            .delete_episode(&MediaId::from("s9"), 2, 5)
            .await
            .expect("episode delete");
        movie.assert();
        episode.assert();
    }

    #[tokio::test]
    async fn missing_item_maps_to_not_found_with_detail() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/server/delete/movie");
            then.status(404).json_body(json!({"detail": "Film non trovato"}));
        });

        let err = backend_for(&server)
            .delete_movie(&MediaId::from("gone"))
            .await
            .expect_err("404 should fail");
        assert_eq!(
            err,
            ApiError::NotFound {
                endpoint: "/server/delete/movie".into(),
                message: "Film non trovato".into(),
            }
        );
    }

    #[tokio::test]
    async fn enqueue_requests_use_backend_parameter_names() {
        let server = MockServer::start_async().await;
        let film = server.mock(|when, then| {
            when.method(GET)
                .path("/api/download/film")
                .query_param("id", "m1")
                .query_param("slug", "heat");
            then.status(200).json_body(json!({"status": "queued"}));
        });
        let episode = server.mock(|when, then| {
            when.method(GET)
                .path("/api/download/episode")
                .query_param("n_s", "1")
                .query_param("n_ep", "3")
                .query_param("titleID", "s1")
                .query_param("slug", "dark");
            then.status(200)
                .json_body(json!({"status": "completed", "path": "/media/dark-s01e03.mp4"}));
        });
        let season = server.mock(|when, then| {
            when.method(GET)
                .path("/api/download/season")
                .query_param("season", "2")
                .query_param("titleID", "s1")
                .query_param("slug", "dark");
            then.status(200).json_body(json!({
                "status": "queued",
                "episodes": [
                    {"episode": 1, "status": "queued"},
                    {"episode": 2, "status": "completed"}
                ]
            }));
        });

        let backend = backend_for(&server);
        let id = MediaId::from("s1");
        assert_eq!(
            backend
                .enqueue_movie(&MediaId::from("m1"), "heat")
                .await
                .expect("film"),
            EnqueueStatus::Queued
        );
        assert!(matches!(
            backend.enqueue_episode(&id, 1, 3, "dark").await.expect("episode"),
            EnqueueStatus::Completed { path: Some(_) }
        ));
        let report = backend.enqueue_season(&id, 2, "dark").await.expect("season");
        assert_eq!(report.episodes.len(), 2);
        assert_eq!(report.newly_queued(), 1);
        film.assert();
        episode.assert();
        season.assert();
    }

    #[tokio::test]
    async fn enqueue_error_body_is_rejected() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/download/film");
            then.status(200)
                .json_body(json!({"status": "error", "detail": "no source available"}));
        });

        let err = backend_for(&server)
            .enqueue_movie(&MediaId::from("m1"), "heat")
            .await
            .expect_err("error status should fail");
        assert_eq!(
            err,
            ApiError::Rejected {
                endpoint: "/api/download/film".into(),
                status: None,
                message: "no source available".into(),
            }
        );
    }

    #[tokio::test]
    async fn watchlist_mutations_post_json_bodies() {
        let server = MockServer::start_async().await;
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/server/watchlist/add")
                .json_body(json!({"name": "dark", "url": "dark", "season": 3}));
            then.status(200).json_body(json!({"message": "added"}));
        });
        let update = server.mock(|when, then| {
            when.method(POST)
                .path("/server/watchlist/update")
                .json_body(json!({"url": "dark", "season": 4}));
            then.status(200);
        });
        let remove = server.mock(|when, then| {
            when.method(POST)
                .path("/server/watchlist/remove")
                .json_body(json!({"name": "dark"}));
            then.status(200);
        });

        let backend = backend_for(&server);
        backend
            .add_watchlist(&NewWatchlistEntry::new("dark", 3))
            .await
            .expect("add");
        backend
            .update_watchlist(&WatchlistSeasonUpdate {
                url: "dark".into(),
                season: 4,
            })
            .await
            .expect("update");
        backend
            .remove_watchlist(&WatchlistRemoval {
                name: "dark".into(),
            })
            .await
            .expect("remove");
        add.assert();
        update.assert();
        remove.assert();
    }

    #[tokio::test]
    async fn duplicate_watchlist_add_is_rejected_with_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/server/watchlist/add");
            then.status(400)
                .json_body(json!({"detail": "Il titolo è già nella watchlist"}));
        });

        let err = backend_for(&server)
            .add_watchlist(&NewWatchlistEntry::new("dark", 3))
            .await
            .expect_err("duplicate add should fail");
        assert!(matches!(
            err,
            ApiError::Rejected { status: Some(400), ref message, .. }
                if message == "Il titolo è già nella watchlist"
        ));
    }

    #[tokio::test]
    async fn message_bodies_decode_as_empty_lists() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/server/watchlist/get");
            then.status(200)
                .json_body(json!({"message": "La watchlist è vuota"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/server/watchlist/check");
            then.status(200).json_body(json!([
                {"name": "dark", "title_url": "dark", "season": 3, "nNewSeason": 1}
            ]));
        });

        let backend = backend_for(&server);
        assert!(backend.watchlist().await.expect("watchlist").is_empty());
        let notices = backend.check_new_seasons().await.expect("check");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].new_seasons, 1);
    }

    #[tokio::test]
    async fn path_lookups_return_stored_paths() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/server/path/movie")
                .query_param("id", "m1");
            then.status(200).json_body(json!({"path": "/media/Heat (1995).mp4"}));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/server/path/episode")
                .query_param("id", "s1")
                .query_param("season", "1")
                .query_param("episode", "2");
            then.status(200).json_body(json!({"path": "/media/dark/S01E02.mp4"}));
        });

        let backend = backend_for(&server);
        assert_eq!(
            backend.movie_path(&MediaId::from("m1")).await.expect("movie path"),
            "/media/Heat (1995).mp4"
        );
        assert_eq!(
            backend
                .episode_path(&MediaId::from("s1"), 1, 2)
                .await
                .expect("episode path"),
            "/media/dark/S01E02.mp4"
        );
    }

    #[tokio::test]
    async fn server_errors_carry_status_and_body_text() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/downloads/status");
            then.status(503).body("maintenance");
        });

        let err = backend_for(&server)
            .queue_status()
            .await
            .expect_err("503 should fail");
        assert_eq!(
            err,
            ApiError::Rejected {
                endpoint: "/api/downloads/status".into(),
                status: Some(503),
                message: "maintenance".into(),
            }
        );
    }

    #[tokio::test]
    async fn malformed_bodies_are_decode_errors() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(200).body("<html>not json</html>");
        });

        let err = backend_for(&server)
            .list_items()
            .await
            .expect_err("html should not decode");
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn undecodable_records_are_skipped_not_fatal() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(200).json_body(json!([
                {"id": "m1", "type": "movie", "slug": "heat", "status": "completed"},
                {"id": "a1", "type": "anime", "status": "pending"},
                {"id": "s1", "type": "tv", "slug": "dark", "season": 1, "n_s": 1,
                 "episode": 3, "n_ep": 3, "status": "queued"},
                "not an object"
            ]));
        });

        let items = backend_for(&server)
            .list_items()
            .await
            .expect("valid records survive");

        let identities: Vec<_> = items.iter().map(DownloadableItem::identity).collect();
        assert_eq!(
            identities,
            vec![
                streamdock_model::ItemIdentity::movie("m1"),
                streamdock_model::ItemIdentity::episode("s1", 1, 3),
            ]
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let base_url = "http://127.0.0.1:9".parse().expect("url");
        let backend =
            HttpBackend::new(Arc::new(ClientConfig::new(base_url))).expect("client builds");
        let err = backend.list_items().await.expect_err("nothing listens");
        assert!(matches!(err, ApiError::Network { ref endpoint, .. } if endpoint == "/server/path/get"));
    }

    #[test]
    fn stream_url_strips_directories_and_encodes() {
        let config = ClientConfig::new("http://media.local:8000".parse().expect("url"));
        let url = stream_url(&config, "/srv/media/Heat (1995).mp4").expect("streamable");
        assert_eq!(
            url.as_str(),
            "http://media.local:8000/server/downloaded/Heat%20%281995%29.mp4"
        );
        assert!(stream_url(&config, "/srv/media/..").is_none());
    }
}
