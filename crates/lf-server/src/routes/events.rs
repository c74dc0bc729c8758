//! Server-Sent Events (SSE) handler.
//!
//! Subscribes to the [`lf_core::events::EventBus`], optionally filters by
//! event type, replays recent events for late joiners, and sends keepalive
//! heartbeats. The stream ends after the engine announces it has closed.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;

use lf_core::events::{self, EventPayload};

use crate::context::AppContext;

/// Optional query parameter for type filtering.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Comma-separated event types, e.g. `segment_finalized,part_finalized`.
    pub types: Option<String>,
}

/// GET /api/events -- SSE stream of engine events.
pub async fn events_handler(
    State(ctx): State<AppContext>,
    Query(params): Query<EventsQuery>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let filter = parse_types(params.types.as_deref());

    // Replay recent events for late joiners.
    let recent = ctx.event_bus.recent_events(50);
    let mut rx = ctx.event_bus.subscribe();
    let already_closed = ctx.engine.is_closed();

    let stream = async_stream::stream! {
        for event in recent.into_iter().rev() {
            if matches_type(&event.payload, &filter) {
                if let Some(sse) = to_sse(&event) {
                    yield Ok(sse);
                }
            }
        }

        if already_closed {
            return;
        }

        // Heartbeat interval.
        let mut heartbeat = tokio::time::interval(Duration::from_secs(15));

        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let closed = matches!(event.payload, EventPayload::EngineClosed);
                            if matches_type(&event.payload, &filter) {
                                if let Some(sse) = to_sse(&event) {
                                    yield Ok(sse);
                                }
                            }
                            if closed {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            tracing::debug!("SSE client lagged by {n} events");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            break;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    yield Ok(Event::default()
                        .event("heartbeat")
                        .data(r#"{"type":"heartbeat"}"#));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_sse(event: &events::Event) -> Option<Event> {
    let data = serde_json::to_string(event).ok()?;
    Some(Event::default().event(type_name(&event.payload)).data(data))
}

/// The serialized `type` tag of a payload.
fn type_name(payload: &EventPayload) -> &'static str {
    match payload {
        EventPayload::SegmentFinalized { .. } => "segment_finalized",
        EventPayload::SegmentEvicted { .. } => "segment_evicted",
        EventPayload::PartFinalized { .. } => "part_finalized",
        EventPayload::InitSegmentUpdated { .. } => "init_segment_updated",
        EventPayload::EngineClosed => "engine_closed",
    }
}

fn parse_types(raw: Option<&str>) -> Option<Vec<String>> {
    let types: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    (!types.is_empty()).then_some(types)
}

fn matches_type(payload: &EventPayload, filter: &Option<Vec<String>>) -> bool {
    let Some(types) = filter else {
        return true;
    };
    let name = type_name(payload);
    types.iter().any(|t| t == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::SegmentId;

    #[test]
    fn type_name_matches_serde_tag() {
        let payload = EventPayload::SegmentFinalized {
            segment_id: SegmentId::new(1),
            duration_secs: 1.0,
            size: 10,
            parts: 0,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], type_name(&payload));

        let json = serde_json::to_value(&EventPayload::EngineClosed).unwrap();
        assert_eq!(json["type"], "engine_closed");
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(parse_types(None).is_none());
        assert!(parse_types(Some(" , ")).is_none());
        assert!(matches_type(&EventPayload::EngineClosed, &None));
    }

    #[test]
    fn filter_selects_listed_types() {
        let filter = parse_types(Some("part_finalized, engine_closed"));
        assert!(matches_type(&EventPayload::EngineClosed, &filter));
        assert!(!matches_type(
            &EventPayload::InitSegmentUpdated { size: 4 },
            &filter
        ));
    }
}
