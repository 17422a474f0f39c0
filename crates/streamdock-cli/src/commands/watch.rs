use std::time::Duration;

use streamdock_client::PollState;
use streamdock_config::ClientConfig;
use streamdock_events::{Event, Freshness};
use streamdock_model::ItemIdentity;
use tracing::{debug, info, warn};

use crate::cli::{OutputFormat, WatchArgs};
use crate::client::{AppContext, CliResult};
use crate::output::render_watch_frame;

pub(crate) async fn handle_watch(
    ctx: &AppContext,
    args: WatchArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let selection = args.selection()?;
    let mut events = ctx.events.subscribe(None);
    let mut cadence = ctx.config.cadence.list;
    let guard = ctx.poller.scoped(cadence);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut frames = 0_u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("watch interrupted");
                break;
            }
            next = events.next() => {
                let Some(envelope) = next else { break };
                match envelope.event {
                    Event::SnapshotPublished { revision, .. } => {
                        let state = guard.current();
                        render_watch_frame(&state, selection.as_ref(), format)?;
                        frames += 1;

                        let wanted = cadence_for(&ctx.config, selection.as_ref(), &state);
                        if wanted != cadence {
                            debug!(
                                revision,
                                interval_ms = u64::try_from(wanted.as_millis()).unwrap_or(u64::MAX),
                                "switching poll cadence"
                            );
                            cadence = wanted;
                            guard.start(cadence);
                        }
                        if args.count.is_some_and(|limit| frames >= limit) {
                            break;
                        }
                    }
                    Event::FreshnessChanged { freshness } if freshness != Freshness::Fresh => {
                        render_watch_frame(&guard.current(), selection.as_ref(), format)?;
                    }
                    Event::PollFailed {
                        consecutive_failures,
                        message,
                    } => {
                        warn!(consecutive_failures, error = %message, "poll failed");
                    }
                    _ => {}
                }
            }
        }
    }

    drop(guard);
    let totals = ctx.metrics.snapshot();
    info!(
        published = totals.cycles_published,
        failed = totals.cycles_failed,
        cancelled = totals.cycles_cancelled,
        "watch finished"
    );
    Ok(())
}

/// Poll faster while the followed item is the one downloading.
fn cadence_for(
    config: &ClientConfig,
    selection: Option<&ItemIdentity>,
    state: &PollState,
) -> Duration {
    let following_active = selection
        .zip(state.snapshot.as_deref())
        .is_some_and(|(identity, snapshot)| snapshot.queue.is_current(identity));
    if following_active {
        config.cadence.detail
    } else {
        config.cadence.list
    }
}
