use streamdock_model::{EnqueueRequest, ItemIdentity, MediaId};
use streamdock_view::DownloadsView;
use tracing::debug;

use crate::cli::{GetCommand, OutputFormat, TargetCommand};
use crate::client::{AppContext, CliResult};
use crate::output::{render_downloads, render_outcome};

pub(crate) async fn handle_ls(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let snapshot = ctx.poller.refresh_now().await?;
    let view = DownloadsView::build(&snapshot);
    debug!(
        items = snapshot.items.len(),
        queued = snapshot.queue.depth(),
        "snapshot fetched"
    );
    render_downloads(&view, ctx.poller.current().freshness, format)
}

pub(crate) async fn handle_delete(
    ctx: &AppContext,
    target: &TargetCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let identity = target.identity();
    let outcome = ctx.dispatcher.delete_item(&identity).await?;
    render_outcome("delete", &identity.to_string(), &outcome, format)
}

pub(crate) async fn handle_get(
    ctx: &AppContext,
    command: GetCommand,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        GetCommand::Movie(args) => {
            let request = EnqueueRequest::new(ItemIdentity::movie(args.id), args.slug);
            let outcome = ctx.dispatcher.enqueue(&request).await?;
            render_outcome("get", &request.identity.to_string(), &outcome, format)
        }
        GetCommand::Episode(args) => {
            let identity = ItemIdentity::episode(args.id, args.season, args.episode);
            let request = EnqueueRequest::new(identity, args.slug);
            let outcome = ctx.dispatcher.enqueue(&request).await?;
            render_outcome("get", &request.identity.to_string(), &outcome, format)
        }
        GetCommand::Season(args) => {
            let series_id = MediaId::new(args.id);
            let outcome = ctx
                .dispatcher
                .enqueue_season(&series_id, args.season, &args.slug)
                .await?;
            let target = format!("tv:{series_id}:S{:02}", args.season);
            render_outcome("get", &target, &outcome, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{EpisodeArgs, GetMovieArgs, GetSeasonArgs, MovieArgs};
    use crate::client::test_context;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_empty_snapshot(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
        let items = server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(200).json_body(json!([]));
        });
        let queue = server.mock(|when, then| {
            when.method(GET).path("/api/downloads/status");
            then.status(200)
                .json_body(json!({"current_download": null, "queue": []}));
        });
        (items, queue)
    }

    #[tokio::test]
    async fn ls_fetches_items_and_queue() {
        let server = MockServer::start_async().await;
        let items = server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(200).json_body(json!([
                {"id": "m1", "type": "movie", "slug": "heat", "status": "completed",
                 "path": "/media/Heat.mp4"}
            ]));
        });
        let queue = server.mock(|when, then| {
            when.method(GET).path("/api/downloads/status");
            then.status(200)
                .json_body(json!({"current_download": null, "queue": []}));
        });

        let ctx = test_context(&server);
        handle_ls(&ctx, OutputFormat::Json).await.expect("ls succeeds");

        items.assert();
        queue.assert();
        assert_eq!(ctx.poller.current().revision, 1);
    }

    #[tokio::test]
    async fn ls_surfaces_backend_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(500).json_body(json!({"detail": "database locked"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/downloads/status");
            then.status(200)
                .json_body(json!({"current_download": null, "queue": []}));
        });

        let ctx = test_context(&server);
        let err = handle_ls(&ctx, OutputFormat::Table)
            .await
            .expect_err("ls fails");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("database locked"));
    }

    #[tokio::test]
    async fn delete_resyncs_after_success() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(DELETE)
                .path("/server/delete/movie")
                .query_param("movie_id", "m1");
            then.status(200).json_body(json!({"message": "deleted"}));
        });
        let (items, queue) = mock_empty_snapshot(&server);

        let ctx = test_context(&server);
        let target = TargetCommand::Movie(MovieArgs { id: "m1".into() });
        handle_delete(&ctx, &target, OutputFormat::Table)
            .await
            .expect("delete succeeds");

        delete.assert();
        items.assert();
        queue.assert();
    }

    #[tokio::test]
    async fn delete_rejects_zero_episode_without_calling_backend() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/server/delete/episode");
            then.status(200);
        });

        let ctx = test_context(&server);
        let target = TargetCommand::Episode(EpisodeArgs {
            id: "s1".into(),
            season: 1,
            episode: 0,
        });
        let err = handle_delete(&ctx, &target, OutputFormat::Table)
            .await
            .expect_err("invalid identity");
        assert_eq!(err.exit_code(), 2);
        delete.assert_hits(0);
    }

    #[tokio::test]
    async fn get_movie_enqueues_and_refreshes() {
        let server = MockServer::start_async().await;
        let enqueue = server.mock(|when, then| {
            when.method(GET)
                .path("/api/download/film")
                .query_param("id", "m1")
                .query_param("slug", "heat");
            then.status(200).json_body(json!({"status": "queued"}));
        });
        let (items, _queue) = mock_empty_snapshot(&server);

        let ctx = test_context(&server);
        let command = GetCommand::Movie(GetMovieArgs {
            id: "m1".into(),
            slug: "heat".into(),
        });
        handle_get(&ctx, command, OutputFormat::Json)
            .await
            .expect("enqueue succeeds");

        enqueue.assert();
        items.assert();
    }

    #[tokio::test]
    async fn get_season_reports_backend_rejection() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/download/season");
            then.status(502).json_body(json!({"detail": "catalog unreachable"}));
        });

        let ctx = test_context(&server);
        let command = GetCommand::Season(GetSeasonArgs {
            id: "s1".into(),
            season: 2,
            slug: "dark".into(),
        });
        let err = handle_get(&ctx, command, OutputFormat::Table)
            .await
            .expect_err("backend rejects");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("catalog unreachable"));
    }
}
