//! Server-Sent Events support

use crate::transcript::Transcript;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

/// Stream every published transcript snapshot, starting with the current one
pub fn sse_stream(
    snapshots: watch::Receiver<Transcript>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = WatchStream::new(snapshots).map(|transcript| Ok(snapshot_event(&transcript)));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn snapshot_event(transcript: &Transcript) -> Event {
    let data = serde_json::json!({
        "type": "snapshot",
        "subject": transcript.subject,
        "turns": transcript.turns,
        "phase": transcript.phase,
        "busy": transcript.is_busy(),
    });
    Event::default().event("snapshot").data(data.to_string())
}

