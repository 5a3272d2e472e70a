//! Event agent – drives a [`WireService`] from a stream of JSON frames.
//!
//! ## Role
//!
//! The signal engine joins the host as an external signal participant: the
//! host forwards block events, the agent answers with power events. Frames
//! are newline-delimited JSON, read from stdin and written to stdout, so the
//! binary composes with whatever transport the host side speaks.
//!
//! ## Event contract (inbound)
//!
//! | Subject                      | Payload              | Effect                 |
//! |------------------------------|----------------------|------------------------|
//! | `wire.block.placed`          | x, y, z, block_id    | place + propagate      |
//! | `wire.block.broken`          | x, y, z, block_id    | remove + propagate     |
//! | `wire.block.neighbor_changed`| x, y, z              | recompute cell         |
//! | `wire.power.set`             | x, y, z, level       | clamped override       |
//! | `wire.cmd.power_level`       | x, y, z              | reply with level       |
//! | `wire.cmd.stats`             | *(empty)*            | reply with `WireStats` |
//! | `wire.cmd.snapshot`          | *(empty)*            | reply with snapshot    |
//!
//! ## Event contract (outbound)
//!
//! | Subject               | Payload type                  |
//! |-----------------------|-------------------------------|
//! | `wire.power.changed`  | `WireEvent<PowerChanged>`     |
//! | `wire.power.level`    | `WireEvent<PowerLevelReply>`  |
//! | `wire.stats`          | `WireEvent<WireStats>`        |
//! | `wire.snapshot`       | `WireEvent<WireSnapshot>`     |

use crate::protocol::Frame;
use crate::service::WireService;
use anyhow::{Context, Result};
use bytes::Bytes;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Config for WireAgent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WireAgentConfig {
    /// Participant ID advertised to the host.
    pub participant_id: String,
    /// Buffered frames between the reader and the dispatcher.
    pub event_capacity: usize,
}

impl Default for WireAgentConfig {
    fn default() -> Self {
        Self {
            participant_id: "redwire-service".into(),
            event_capacity: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// WireAgent
// ---------------------------------------------------------------------------

/// Wraps a [`WireService`] and drives it from inbound frames.
///
/// Call [`WireAgent::run`] inside a Tokio task to start the agent.
pub struct WireAgent {
    config: WireAgentConfig,
    service: Arc<Mutex<WireService>>,
}

impl WireAgent {
    pub fn new(config: WireAgentConfig, service: Arc<Mutex<WireService>>) -> Self {
        Self { config, service }
    }

    /// Start the agent. Reads frames from stdin, dispatches them through the
    /// service, publishes outbound frames on stdout, and runs until stdin
    /// closes or SIGINT arrives.
    pub async fn run(self) -> Result<()> {
        info!(
            "WireAgent active as '{}' (capacity {})",
            self.config.participant_id, self.config.event_capacity
        );

        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(self.config.event_capacity);
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Bytes>(self.config.event_capacity);

        // Reader: stdin lines → inbound channel.
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        if inbound_tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read frame: {}", e);
                        break;
                    }
                }
            }
        });

        // Writer: outbound channel → stdout.
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = stdout.write_all(&frame).await {
                    warn!("Failed to publish frame: {}", e);
                    break;
                }
                if let Err(e) = stdout.flush().await {
                    warn!("Failed to flush frames: {}", e);
                    break;
                }
            }
        });

        tokio::select! {
            _ = pump(self.service.clone(), inbound_rx, outbound_tx) => {
                info!("WireAgent input closed, shutting down");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("WireAgent shutting down (SIGINT)");
            }
        }

        reader.abort();
        writer
            .await
            .context("Outbound writer task failed during shutdown")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch loop
// ---------------------------------------------------------------------------

/// Drain inbound lines into the service until either channel closes.
///
/// Split from [`WireAgent::run`] so the dispatch path can be exercised over
/// plain channels without touching process stdio.
pub async fn pump(
    service: Arc<Mutex<WireService>>,
    mut inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<Bytes>,
) {
    while let Some(line) = inbound.recv().await {
        for frame in dispatch_line(&service, &line) {
            if outbound.send(frame).await.is_err() {
                return;
            }
        }
    }
}

/// Decode one line, dispatch it, and serialise the resulting frames.
///
/// Malformed lines and dispatch errors are logged and swallowed — one bad
/// frame must not stall the event stream.
pub fn dispatch_line(service: &Mutex<WireService>, line: &str) -> Vec<Bytes> {
    let frame = match serde_json::from_str::<Frame>(line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Discarding malformed frame: {}", e);
            return Vec::new();
        }
    };

    // Hold the lock only for dispatch, then serialise outside it.
    let outcome = { service.lock().handle_frame(frame) };

    match outcome {
        Ok(frames) => frames.iter().filter_map(encode_frame).collect(),
        Err(e) => {
            warn!("Dispatch error: {}", e);
            Vec::new()
        }
    }
}

/// Serialise `frame` as one newline-terminated transport line.
fn encode_frame(frame: &Frame) -> Option<Bytes> {
    match serde_json::to_vec(frame) {
        Ok(mut payload) => {
            payload.push(b'\n');
            Some(Bytes::from(payload))
        }
        Err(e) => {
            warn!("Failed to serialise frame for {}: {}", frame.subject, e);
            None
        }
    }
}
