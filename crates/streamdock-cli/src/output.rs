//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use serde::Serialize;
use streamdock_client::{ActionOutcome, PollState};
use streamdock_events::Freshness;
use streamdock_model::{ItemIdentity, NewSeasonNotice, WatchlistEntry};
use streamdock_view::{DownloadsView, ItemView, PrimaryAction};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Stored file of a download and where it can be streamed from.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MediaLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stream_url: Option<String>,
}

#[derive(Serialize)]
struct DownloadsReport<'a> {
    freshness: Freshness,
    #[serde(flatten)]
    view: &'a DownloadsView,
}

#[derive(Serialize)]
struct WatchFrame<'a> {
    revision: u64,
    freshness: Freshness,
    #[serde(skip_serializing_if = "Option::is_none")]
    view: Option<&'a DownloadsView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<&'a ItemView>,
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    action: &'a str,
    target: &'a str,
    result: &'a ActionOutcome,
}

pub(crate) fn render_downloads(
    view: &DownloadsView,
    freshness: Freshness,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&DownloadsReport { freshness, view }),
        OutputFormat::Table => {
            print!("{}", format_downloads(view, freshness));
            Ok(())
        }
    }
}

pub(crate) fn render_watch_frame(
    state: &PollState,
    selection: Option<&ItemIdentity>,
    format: OutputFormat,
) -> CliResult<()> {
    let view = state.snapshot.as_deref().map(DownloadsView::build);
    let selected = view
        .as_ref()
        .zip(selection)
        .and_then(|(view, identity)| view.find(identity));

    match format {
        OutputFormat::Json => {
            let frame = WatchFrame {
                revision: state.revision,
                freshness: state.freshness,
                view: if selection.is_some() { None } else { view.as_ref() },
                selected,
            };
            let text = serde_json::to_string(&frame)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("== revision {} ({}) ==", state.revision, state.freshness);
            match (view.as_ref(), selection) {
                (None, _) => println!("waiting for the first snapshot"),
                (Some(_), Some(identity)) => match selected {
                    Some(item) => println!("{}", item_row(item)),
                    None => println!("{identity}: not known to the backend"),
                },
                (Some(view), None) => print!("{}", format_downloads(view, state.freshness)),
            }
        }
    }
    Ok(())
}

pub(crate) fn render_outcome(
    action: &str,
    target: &str,
    outcome: &ActionOutcome,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&OutcomeReport {
            action,
            target,
            result: outcome,
        }),
        OutputFormat::Table => {
            print!("{}", format_outcome(action, target, outcome));
            Ok(())
        }
    }
}

pub(crate) fn render_watchlist(entries: &[WatchlistEntry], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("watchlist is empty");
                return Ok(());
            }
            println!("{:<32} {:>7} {:<10} URL", "SERIES", "SEASONS", "ADDED");
            for entry in entries {
                let added = entry
                    .added_on
                    .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string());
                println!(
                    "{:<32} {:>7} {:<10} {}",
                    entry.series_slug,
                    entry.tracked_season_count,
                    added,
                    entry.title_url.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}

pub(crate) fn render_notices(notices: &[NewSeasonNotice], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&notices),
        OutputFormat::Table => {
            if notices.is_empty() {
                println!("no new seasons");
            }
            for notice in notices {
                println!("{}", notice_line(notice));
            }
            Ok(())
        }
    }
}

pub(crate) fn render_location(location: &MediaLocation, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(location),
        OutputFormat::Table => {
            if let Some(path) = &location.file_path {
                println!("file: {path}");
            }
            match &location.stream_url {
                Some(url) => println!("stream: {url}"),
                None => println!("stream: unavailable"),
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn format_downloads(view: &DownloadsView, freshness: Freshness) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "fetched {} ({freshness})",
        view.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    match &view.current {
        Some(current) => {
            let _ = writeln!(out, "now: {}", item_row(current));
        }
        None => {
            let _ = writeln!(out, "now: idle");
        }
    }

    if !view.queue.is_empty() {
        let _ = writeln!(out, "queue:");
        for entry in &view.queue {
            let _ = writeln!(
                out,
                "  {:>2}. {} ({})",
                entry.position, entry.title, entry.identity
            );
        }
    }

    if !view.movies.is_empty() {
        let _ = writeln!(out, "movies:");
        let _ = writeln!(out, "  {}", header_row());
        for movie in &view.movies {
            let _ = writeln!(out, "  {}", item_row(movie));
        }
    }

    for group in &view.series {
        let _ = writeln!(out, "series: {} [{}]", group.title, group.slug);
        for episode in &group.episodes {
            let _ = writeln!(out, "  {}", item_row(episode));
        }
    }

    if !view.ungroupable.is_empty() {
        let ids = view
            .ungroupable
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "ungroupable: {ids}");
    }
    out
}

fn header_row() -> String {
    format!("{:<24} {:<32} {:<16} ACTION", "ID", "TITLE", "STATUS")
}

pub(crate) fn item_row(item: &ItemView) -> String {
    let status = if item.state.badge_text.is_empty() {
        "-"
    } else {
        item.state.badge_text.as_str()
    };
    format!(
        "{:<24} {:<32} {:<16} {}",
        item.identity.to_string(),
        item.title,
        status,
        action_cell(&item.state.primary_action)
    )
}

fn action_cell(action: &PrimaryAction) -> String {
    match action {
        PrimaryAction::Play { stream_path } => format!("play {stream_path}"),
        PrimaryAction::Retry => "retry".to_string(),
        PrimaryAction::Enqueue => "enqueue".to_string(),
        PrimaryAction::None => "-".to_string(),
    }
}

fn notice_line(notice: &NewSeasonNotice) -> String {
    format!(
        "{}: season {} available ({} new)",
        notice.name, notice.season, notice.new_seasons
    )
}

pub(crate) fn format_outcome(action: &str, target: &str, outcome: &ActionOutcome) -> String {
    let mut out = String::new();
    match outcome {
        ActionOutcome::Applied => {
            let _ = writeln!(out, "{action} {target}: done");
        }
        ActionOutcome::AlreadyGone => {
            let _ = writeln!(
                out,
                "{action} {target}: not found on the backend, nothing changed"
            );
        }
        ActionOutcome::Enqueued(status) => {
            let _ = writeln!(out, "{action} {target}: {}", status.label());
        }
        ActionOutcome::SeasonQueued(report) => {
            let _ = writeln!(
                out,
                "{action} {target}: {} of {} episodes newly queued",
                report.newly_queued(),
                report.episodes.len()
            );
            for episode in &report.episodes {
                let _ = writeln!(
                    out,
                    "  E{:02} {}",
                    episode.episode,
                    episode.status.as_str()
                );
            }
        }
        ActionOutcome::SeasonsSynced(notices) => {
            let _ = writeln!(out, "recorded {} new season(s)", notices.len());
            for notice in notices {
                let _ = writeln!(out, "  {}", notice_line(notice));
            }
        }
    }
    out
}
