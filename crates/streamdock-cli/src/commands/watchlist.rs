use streamdock_client::BackendApi;
use streamdock_model::NewWatchlistEntry;

use crate::cli::{OutputFormat, WatchlistCommand};
use crate::client::{AppContext, CliResult};
use crate::output::{render_notices, render_outcome, render_watchlist};

pub(crate) async fn handle_watchlist(
    ctx: &AppContext,
    command: WatchlistCommand,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        WatchlistCommand::Ls => {
            let entries = ctx.backend.watchlist().await?;
            render_watchlist(&entries, format)
        }
        WatchlistCommand::Add(args) => {
            let mut entry = NewWatchlistEntry::new(args.slug.trim(), args.seasons);
            if let Some(url) = args.url {
                entry = entry.with_title_url(url);
            }
            let outcome = ctx.dispatcher.add_watchlist(&entry).await?;
            render_outcome("watchlist add", &entry.slug, &outcome, format)
        }
        WatchlistCommand::Remove(args) => {
            let outcome = ctx.dispatcher.remove_watchlist(&args.slug).await?;
            render_outcome("watchlist remove", args.slug.trim(), &outcome, format)
        }
        WatchlistCommand::Check => {
            let notices = ctx.backend.check_new_seasons().await?;
            render_notices(&notices, format)
        }
        WatchlistCommand::Sync => {
            let outcome = ctx.dispatcher.sync_new_seasons().await?;
            render_outcome("watchlist sync", "watchlist", &outcome, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{WatchlistAddArgs, WatchlistRemoveArgs};
    use crate::client::test_context;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_snapshot(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/server/path/get");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/downloads/status");
            then.status(200)
                .json_body(json!({"current_download": null, "queue": []}));
        });
    }

    #[tokio::test]
    async fn ls_accepts_message_body_as_empty() {
        let server = MockServer::start_async().await;
        let list = server.mock(|when, then| {
            when.method(GET).path("/server/watchlist/get");
            then.status(200)
                .json_body(json!({"message": "Nessun titolo nella watchlist"}));
        });

        let ctx = test_context(&server);
        handle_watchlist(&ctx, WatchlistCommand::Ls, OutputFormat::Table)
            .await
            .expect("list succeeds");
        list.assert();
    }

    #[tokio::test]
    async fn add_posts_entry_with_custom_url() {
        let server = MockServer::start_async().await;
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/server/watchlist/add")
                .json_body(json!({"name": "dark", "url": "tv/dark", "season": 3}));
            then.status(200).json_body(json!({"message": "added"}));
        });
        mock_snapshot(&server);

        let ctx = test_context(&server);
        let command = WatchlistCommand::Add(WatchlistAddArgs {
            slug: " dark ".into(),
            seasons: 3,
            url: Some("tv/dark".into()),
        });
        handle_watchlist(&ctx, command, OutputFormat::Json)
            .await
            .expect("add succeeds");
        add.assert();
    }

    #[tokio::test]
    async fn duplicate_add_fails_with_backend_detail() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/server/watchlist/add");
            then.status(400)
                .json_body(json!({"detail": "already in the watchlist"}));
        });

        let ctx = test_context(&server);
        let command = WatchlistCommand::Add(WatchlistAddArgs {
            slug: "dark".into(),
            seasons: 3,
            url: None,
        });
        let err = handle_watchlist(&ctx, command, OutputFormat::Table)
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("already in the watchlist"));
    }

    #[tokio::test]
    async fn remove_of_unknown_series_is_not_an_error() {
        let server = MockServer::start_async().await;
        let remove = server.mock(|when, then| {
            when.method(POST)
                .path("/server/watchlist/remove")
                .json_body(json!({"name": "dark"}));
            then.status(404).json_body(json!({"detail": "not found"}));
        });
        mock_snapshot(&server);

        let ctx = test_context(&server);
        let command = WatchlistCommand::Remove(WatchlistRemoveArgs {
            slug: "dark".into(),
        });
        handle_watchlist(&ctx, command, OutputFormat::Table)
            .await
            .expect("already gone");
        remove.assert();
    }

    #[tokio::test]
    async fn sync_records_each_notice() {
        let server = MockServer::start_async().await;
        let check = server.mock(|when, then| {
            when.method(GET).path("/server/watchlist/check");
            then.status(200).json_body(json!([
                {"name": "dark", "title_url": "tv/dark", "season": 3, "nNewSeason": 1}
            ]));
        });
        let update = server.mock(|when, then| {
            when.method(POST)
                .path("/server/watchlist/update")
                .json_body(json!({"url": "tv/dark", "season": 3}));
            then.status(200).json_body(json!({"message": "updated"}));
        });
        mock_snapshot(&server);

        let ctx = test_context(&server);
        handle_watchlist(&ctx, WatchlistCommand::Sync, OutputFormat::Table)
            .await
            .expect("sync succeeds");
        check.assert();
        update.assert();
    }
}
