//! Argument parsing, logging setup, and command dispatch.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use streamdock_config::{ClientConfig, parse_base_url};
use streamdock_model::{ItemIdentity, MediaId};
use streamdock_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::{downloads, media, watch, watchlist};

const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments, executes the requested command, and reports
/// failures on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: LogFormat::parse_or_infer(cli.log_format.as_deref()),
        build_sha: option_env!("STREAMDOCK_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    match dispatch(cli, &trace_id).await {
        Ok(()) => {
            debug!(command = command_name, trace_id = %trace_id, "command finished");
            0
        }
        Err(err) => {
            debug!(command = command_name, trace_id = %trace_id, "command failed");
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<()> {
    let config = cli.connection.resolve()?;
    let ctx = AppContext::connect(config, trace_id)?;

    match cli.command {
        Command::Ls => downloads::handle_ls(&ctx, cli.output).await,
        Command::Watch(args) => watch::handle_watch(&ctx, args, cli.output).await,
        Command::Delete(target) => downloads::handle_delete(&ctx, &target, cli.output).await,
        Command::Get(request) => downloads::handle_get(&ctx, request, cli.output).await,
        Command::Watchlist(command) => {
            watchlist::handle_watchlist(&ctx, command, cli.output).await
        }
        Command::Play(args) => media::handle_play(&ctx, &args, cli.output),
        Command::Path(target) => media::handle_path(&ctx, &target, cli.output).await,
    }
}

#[derive(Parser)]
#[command(
    name = "streamdock",
    about = "Browse, queue, and manage downloads on a streamdock backend"
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "STREAMDOCK_LOG_LEVEL",
        default_value = DEFAULT_CLI_LOG_LEVEL
    )]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "STREAMDOCK_LOG_FORMAT")]
    pub(crate) log_format: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Flags layered over the `STREAMDOCK_*` environment configuration.
#[derive(Args, Debug, Default)]
pub(crate) struct ConnectionArgs {
    #[arg(long, global = true, value_parser = parse_base_url)]
    pub(crate) base_url: Option<Url>,
    #[arg(long, global = true)]
    pub(crate) api_prefix: Option<String>,
    #[arg(long, global = true)]
    pub(crate) server_prefix: Option<String>,
    #[arg(long, global = true, help = "Per-request timeout in seconds")]
    pub(crate) timeout: Option<u64>,
}

impl ConnectionArgs {
    pub(crate) fn resolve(&self) -> CliResult<ClientConfig> {
        self.apply(ClientConfig::from_env()?)
    }

    pub(crate) fn apply(&self, mut config: ClientConfig) -> CliResult<ClientConfig> {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(prefix) = &self.api_prefix {
            config.endpoints.api_prefix.clone_from(prefix);
        }
        if let Some(prefix) = &self.server_prefix {
            config.endpoints.server_prefix.clone_from(prefix);
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.validate().map_err(CliError::from)
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch once and list movies, series, and the queue.
    Ls,
    /// Keep polling and re-render on every change until interrupted.
    Watch(WatchArgs),
    /// Delete a downloaded movie or episode.
    #[command(subcommand)]
    Delete(TargetCommand),
    /// Request a download.
    #[command(subcommand)]
    Get(GetCommand),
    /// Manage tracked series.
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
    /// Print the stream URL for a stored file path.
    Play(PlayArgs),
    /// Look up the stored file of a download.
    #[command(subcommand)]
    Path(TargetCommand),
}

#[derive(Subcommand, Debug)]
pub(crate) enum TargetCommand {
    Movie(MovieArgs),
    Episode(EpisodeArgs),
}

impl TargetCommand {
    pub(crate) fn identity(&self) -> ItemIdentity {
        match self {
            Self::Movie(args) => ItemIdentity::movie(args.id.as_str()),
            Self::Episode(args) => {
                ItemIdentity::episode(args.id.as_str(), args.season, args.episode)
            }
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct MovieArgs {
    pub(crate) id: String,
}

#[derive(Args, Debug)]
pub(crate) struct EpisodeArgs {
    pub(crate) id: String,
    pub(crate) season: u32,
    pub(crate) episode: u32,
}

#[derive(Subcommand, Debug)]
pub(crate) enum GetCommand {
    Movie(GetMovieArgs),
    Episode(GetEpisodeArgs),
    Season(GetSeasonArgs),
}

#[derive(Args, Debug)]
pub(crate) struct GetMovieArgs {
    pub(crate) id: String,
    pub(crate) slug: String,
}

#[derive(Args, Debug)]
pub(crate) struct GetEpisodeArgs {
    pub(crate) id: String,
    pub(crate) season: u32,
    pub(crate) episode: u32,
    pub(crate) slug: String,
}

#[derive(Args, Debug)]
pub(crate) struct GetSeasonArgs {
    pub(crate) id: String,
    pub(crate) season: u32,
    pub(crate) slug: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum WatchlistCommand {
    Ls,
    Add(WatchlistAddArgs),
    Remove(WatchlistRemoveArgs),
    /// List tracked series with seasons newer than recorded.
    Check,
    /// Record every new season reported by `check`.
    Sync,
}

#[derive(Args, Debug)]
pub(crate) struct WatchlistAddArgs {
    pub(crate) slug: String,
    pub(crate) seasons: u32,
    #[arg(long, help = "Catalog URL of the series; defaults to the slug")]
    pub(crate) url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct WatchlistRemoveArgs {
    pub(crate) slug: String,
}

#[derive(Args, Debug)]
pub(crate) struct PlayArgs {
    pub(crate) path: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct WatchArgs {
    #[arg(long, help = "Follow one item and poll faster while it downloads")]
    pub(crate) id: Option<String>,
    #[arg(long = "type", value_enum, default_value_t = MediaKind::Movie)]
    pub(crate) media_type: MediaKind,
    #[arg(long)]
    pub(crate) season: Option<u32>,
    #[arg(long)]
    pub(crate) episode: Option<u32>,
    #[arg(long, help = "Exit after this many published snapshots")]
    pub(crate) count: Option<u64>,
}

impl WatchArgs {
    /// The followed item, if any, checked for a complete identity.
    pub(crate) fn selection(&self) -> CliResult<Option<ItemIdentity>> {
        let Some(id) = &self.id else {
            if self.season.is_some() || self.episode.is_some() {
                return Err(CliError::validation("--season/--episode require --id"));
            }
            return Ok(None);
        };
        let identity = ItemIdentity {
            id: MediaId::from(id.as_str()),
            media_type: self.media_type.into(),
            season: self.season,
            episode: self.episode,
        };
        identity
            .validate()
            .map_err(|err| CliError::validation(err.to_string()))?;
        Ok(Some(identity))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum MediaKind {
    #[default]
    Movie,
    Tv,
}

impl From<MediaKind> for streamdock_model::MediaType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Movie => Self::Movie,
            MediaKind::Tv => Self::Episode,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ls => "ls",
        Command::Watch(_) => "watch",
        Command::Delete(TargetCommand::Movie(_)) => "delete_movie",
        Command::Delete(TargetCommand::Episode(_)) => "delete_episode",
        Command::Get(GetCommand::Movie(_)) => "get_movie",
        Command::Get(GetCommand::Episode(_)) => "get_episode",
        Command::Get(GetCommand::Season(_)) => "get_season",
        Command::Watchlist(WatchlistCommand::Ls) => "watchlist_ls",
        Command::Watchlist(WatchlistCommand::Add(_)) => "watchlist_add",
        Command::Watchlist(WatchlistCommand::Remove(_)) => "watchlist_remove",
        Command::Watchlist(WatchlistCommand::Check) => "watchlist_check",
        Command::Watchlist(WatchlistCommand::Sync) => "watchlist_sync",
        Command::Play(_) => "play",
        Command::Path(TargetCommand::Movie(_)) => "path_movie",
        Command::Path(TargetCommand::Episode(_)) => "path_episode",
    }
}
