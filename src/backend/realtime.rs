// src/backend/realtime.rs
//
// Change feed over the backend's realtime websocket (Phoenix channel framing).
// Every insert, update or delete on the subscribed page's rows fires the
// callback; the caller reloads the whole page. There is no merge step.

use super::{ChangeCallback, Subscription};
use crate::annotation::PageId;
use crate::app_config::BackendConfig;
use crate::error::ProofError;
use futures::{future, stream, SinkExt, StreamExt};
use gloo::timers::future::IntervalStream;
use gloo_net::websocket::{futures::WebSocket, Message, WebSocketError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wasm_bindgen_futures::spawn_local;

const HEARTBEAT_MS: u32 = 30_000;

#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

enum Incoming {
    Tick,
    Frame(Result<Message, WebSocketError>),
    Closed,
    Unsubscribed,
}

fn socket_url(config: &BackendConfig) -> Result<String, ProofError> {
    let base = config.url.trim_end_matches('/');
    let host = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        return Err(ProofError::Config(format!(
            "backend url {:?} is not http(s)",
            config.url
        )));
    };
    Ok(format!(
        "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
        host, config.anon_key
    ))
}

fn topic_for(page_id: &PageId) -> String {
    format!("realtime:page-{}", page_id)
}

fn join_frame(config: &BackendConfig, page_id: &PageId) -> Frame {
    Frame {
        topic: topic_for(page_id),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "postgres_changes": [{
                    "event": "*",
                    "schema": "public",
                    "table": config.table,
                    "filter": format!("page_id=eq.{}", page_id),
                }]
            },
            "access_token": config.anon_key,
        }),
        reference: Some("1".to_string()),
    }
}

fn heartbeat_frame(reference: u64) -> Frame {
    Frame {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Whether a raw text frame reports a row change on `topic`.
fn is_row_change(text: &str, topic: &str) -> bool {
    match serde_json::from_str::<Frame>(text) {
        Ok(frame) => {
            frame.topic == topic
                && matches!(
                    frame.event.as_str(),
                    "postgres_changes" | "INSERT" | "UPDATE" | "DELETE"
                )
        }
        Err(e) => {
            log::debug!("Ignoring unparseable realtime frame: {}", e);
            false
        }
    }
}

pub fn subscribe(
    config: &BackendConfig,
    page_id: &PageId,
    on_change: ChangeCallback,
) -> Result<Subscription, ProofError> {
    let url = socket_url(config)?;
    let socket = WebSocket::open(&url)
        .map_err(|e| ProofError::PersistenceFailure(format!("websocket: {}", e)))?;
    let join = serde_json::to_string(&join_frame(config, page_id))?;
    let topic = topic_for(page_id);
    let (mut subscription, active) = Subscription::new();
    let unsubscribed = subscription.close_signal();
    let page = page_id.clone();

    spawn_local(async move {
        let (mut sink, source) = socket.split();
        if let Err(e) = sink.send(Message::Text(join)).await {
            log::warn!("Could not join realtime channel for page {}: {}", page, e);
            return;
        }
        log::info!("Subscribed to changes for page {}", page);

        let ticks = IntervalStream::new(HEARTBEAT_MS).map(|_| Incoming::Tick);
        let frames = source
            .map(Incoming::Frame)
            .chain(stream::once(future::ready(Incoming::Closed)));
        let dropped = stream::once(unsubscribed).map(|_| Incoming::Unsubscribed);
        let mut events = stream::select(stream::select(ticks, frames), dropped).boxed_local();
        let mut next_ref = 1u64;

        while let Some(event) = events.next().await {
            if !active.get() {
                break;
            }
            match event {
                Incoming::Tick => {
                    next_ref += 1;
                    let beat = match serde_json::to_string(&heartbeat_frame(next_ref)) {
                        Ok(beat) => beat,
                        Err(_) => continue,
                    };
                    if let Err(e) = sink.send(Message::Text(beat)).await {
                        log::warn!("Realtime heartbeat failed: {}", e);
                        break;
                    }
                }
                Incoming::Frame(Ok(Message::Text(text))) => {
                    if is_row_change(&text, &topic) {
                        log::debug!("Remote change on page {}", page);
                        on_change();
                    }
                }
                Incoming::Frame(Ok(Message::Bytes(_))) => {}
                Incoming::Frame(Err(e)) => {
                    log::warn!("Realtime connection error: {}", e);
                    break;
                }
                Incoming::Closed => {
                    log::info!("Realtime connection closed by server");
                    break;
                }
                Incoming::Unsubscribed => break,
            }
        }
        let _ = sink.close().await;
        log::debug!("Stopped listening for changes on page {}", page);
    });

    Ok(subscription)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            url: url.to_string(),
            anon_key: "k".to_string(),
            table: "comments".to_string(),
            bucket: "attachments".to_string(),
            realtime: true,
        }
    }

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url(&config("https://abc.example.co/")).unwrap(),
            "wss://abc.example.co/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
        assert!(socket_url(&config("ftp://nope")).is_err());
    }

    #[test]
    fn test_join_frame_filters_page() {
        let frame = join_frame(&config("https://x"), &PageId::from("42"));
        let text = serde_json::to_value(&frame).unwrap();
        assert_eq!(text["event"], "phx_join");
        assert_eq!(text["ref"], "1");
        assert_eq!(
            text["payload"]["config"]["postgres_changes"][0]["filter"],
            "page_id=eq.42"
        );
    }

    #[test]
    fn test_row_change_detection() {
        let topic = topic_for(&PageId::from("42"));
        let change = r#"{"topic":"realtime:page-42","event":"postgres_changes","payload":{"data":{"type":"DELETE"}},"ref":null}"#;
        assert!(is_row_change(change, &topic));
        let reply = r#"{"topic":"realtime:page-42","event":"phx_reply","payload":{},"ref":"1"}"#;
        assert!(!is_row_change(reply, &topic));
        let other = r#"{"topic":"realtime:page-7","event":"INSERT","payload":{}}"#;
        assert!(!is_row_change(other, &topic));
        assert!(!is_row_change("not json", &topic));
    }
}
