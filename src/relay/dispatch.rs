//! Runs the relay for one event and delivers whatever it produced.

use log::{Level, error, info, log};

use crate::error::{RelayError, Result};
use crate::types::ChatEvent;

use super::{Outcome, Relay, ReplySink};

/// Handles `event` and sends the reply through `sink`.
///
/// Backend failures are logged and answered with an apology. Delivery
/// failures are logged and returned, never retried.
pub async fn dispatch(relay: &Relay, sink: &dyn ReplySink, event: &ChatEvent) -> Result<()> {
    info!(
        "Received message from {} ({})",
        event.sender_nick, event.sender_id
    );

    let outcome = relay.handle_event(event).await;
    if let Outcome::Apologized { cause, .. } = &outcome {
        log!(
            recovered_level(cause),
            "Completion request for {} failed: {}",
            event.sender_nick,
            cause
        );
    }

    let Some(text) = outcome.reply() else {
        return Ok(());
    };

    if let Err(e) = sink.reply(event, text).await {
        error!("Failed to send reply to {}: {}", event.sender_nick, e);
        return Err(e);
    }

    info!(
        "Replied to {} ({})",
        event.sender_nick,
        outcome.kind()
    );
    Ok(())
}

/// Backend outages are expected and logged as warnings; anything else a
/// provider returns points at a bug or misconfiguration.
fn recovered_level(cause: &RelayError) -> Level {
    if cause.is_completion_failure() {
        Level::Warn
    } else {
        Level::Error
    }
}
