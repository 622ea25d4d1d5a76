// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event intake from the dispatch boundary.
//!
//! The external framework connects to the controller's Unix socket and
//! writes one JSON-encoded [`Event`] per line; each line is acknowledged
//! with a one-line JSON reply. The listener only parses and forwards —
//! ordering, redelivery and everything stateful belong to the event loop.

use jac_core::Event;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Accept connections and forward parsed events until the channel closes.
pub async fn run_listener(listener: UnixListener, tx: mpsc::Sender<Event>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    handle_connection(stream, tx).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                return;
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, tx: mpsc::Sender<Event>) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let ack = match serde_json::from_str::<Event>(&line) {
            Ok(event) => {
                debug!(event = event.name(), "event received");
                if tx.send(event).await.is_err() {
                    // Event loop gone; the controller is shutting down.
                    return;
                }
                r#"{"ok":true}"#.to_string()
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed event");
                format!(r#"{{"ok":false,"error":{}}}"#, serde_json::json!(e.to_string()))
            }
        };
        if write.write_all(format!("{ack}\n").as_bytes()).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
