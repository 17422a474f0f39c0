use streamdock_client::{BackendApi, stream_url};

use crate::cli::{OutputFormat, PlayArgs, TargetCommand};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{MediaLocation, render_location};

pub(crate) fn handle_play(
    ctx: &AppContext,
    args: &PlayArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let url = stream_url(&ctx.config, &args.path).ok_or_else(|| {
        CliError::validation(format!("'{}' has no file name to stream", args.path))
    })?;
    let location = MediaLocation {
        file_path: Some(args.path.clone()),
        stream_url: Some(url.to_string()),
    };
    render_location(&location, format)
}

pub(crate) async fn handle_path(
    ctx: &AppContext,
    target: &TargetCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let identity = target.identity();
    identity
        .validate()
        .map_err(|err| CliError::validation(err.to_string()))?;

    let file_path = match identity.episode_numbers() {
        Some((season, episode)) => {
            ctx.backend
                .episode_path(&identity.id, season, episode)
                .await?
        }
        None => ctx.backend.movie_path(&identity.id).await?,
    };
    let location = MediaLocation {
        stream_url: stream_url(&ctx.config, &file_path).map(|url| url.to_string()),
        file_path: Some(file_path),
    };
    render_location(&location, format)
}
