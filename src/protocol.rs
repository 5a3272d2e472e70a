//! `wire.*` protocol.
//!
//! This module owns **every message that crosses the service boundary**
//! between the signal engine and any consumer (game host, debug console,
//! another server…).
//!
//! ## Subject namespaces
//!
//! | Namespace      | Direction          | Carried by          |
//! |----------------|--------------------|---------------------|
//! | `wire.block.*` | host → engine      | event frame         |
//! | `wire.power.*` | both               | event frame         |
//! | `wire.cmd.*`   | host → engine      | request frame       |
//!
//! ## Design rules
//!
//! 1. Every struct must be `Serialize + Deserialize` with snake_case JSON.
//! 2. No engine-internal state leaks out (store handles, registries, etc.).
//! 3. Positions travel as raw `x, y, z` integers.
//! 4. Every outbound event includes `frame: u64` and `session: String`.
//! 5. Power levels are reported with the previous value so consumers can
//!    render transitions without keeping their own mirror.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::BlockPos;

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
///
/// The `session` field lets multiplexed clients distinguish worlds.
/// The `frame` field is the sequence number of the external event that
/// produced the payload, so clients can order interleaved streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent<T> {
    pub session: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> WireEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport frame
// ---------------------------------------------------------------------------

/// One line on the wire: a subject plus an arbitrary JSON payload.
///
/// Inbound frames carry the raw message structs below; outbound frames carry
/// a [`WireEvent`]-wrapped payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub subject: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Block events  (subjects: wire.block.*)
// ---------------------------------------------------------------------------

/// Host reports a block placed into the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockPlacedMsg {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Block identity of the placed block (e.g. `exampleplugin:wire`).
    pub block_id: String,
}

/// Host reports a block removed from the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockBrokenMsg {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Block identity of the broken block.
    pub block_id: String,
}

/// Host reports that something adjacent to this position changed for reasons
/// the engine cannot see (a source toggled, an attribute edit, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborChangedMsg {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

// ---------------------------------------------------------------------------
// Power events  (subjects: wire.power.*)
// ---------------------------------------------------------------------------

/// Explicit power override (debug consoles, tests).
///
/// The level is clamped into `[0, 15]` before storing; writes to positions
/// that are not wires are discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPowerMsg {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub level: i32,
}

/// A wire cell's power level changed during a stabilization pass.
///
/// One event per net change: a cell revisited while a cascade is still in
/// flight reports only its final level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerChanged {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub level: u8,
    pub previous: u8,
}

impl PowerChanged {
    pub fn new(pos: BlockPos, level: u8, previous: u8) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            level,
            previous,
        }
    }

    pub fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Command requests  (host → engine, request-reply via wire.cmd.*)
// ---------------------------------------------------------------------------

/// Request the current power level at a position (reply: [`PowerLevelReply`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdPowerLevel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Request a stats snapshot (reply: `WireStats` JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdStats {}

/// Request a full network snapshot (reply: [`WireSnapshot`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdSnapshot {}

/// Reply to [`CmdPowerLevel`]. Positions without a wire answer level 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLevelReply {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub level: u8,
}

// ---------------------------------------------------------------------------
// Snapshot  (subject: wire.snapshot)
// ---------------------------------------------------------------------------

/// One wire cell in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCellState {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub level: u8,
}

/// Full network state sent on initial connect or after reconnect.
///
/// `digest` is an md5 over the canonical (sorted) cell list; clients that
/// already hold a snapshot with the same digest can skip rehydration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSnapshot {
    pub wires: Vec<WireCellState>,
    pub digest: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Faults at the protocol boundary.
///
/// The propagation engine itself has no failure mode; everything that can go
/// wrong happens while decoding what a collaborator sent us.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("invalid payload for {subject}: {source}")]
    InvalidPayload {
        subject: String,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

/// All subjects used by the wire protocol, as constants.
pub mod subjects {
    pub const BLOCK_PLACED: &str = "wire.block.placed";
    pub const BLOCK_BROKEN: &str = "wire.block.broken";
    pub const NEIGHBOR_CHANGED: &str = "wire.block.neighbor_changed";

    pub const SET_POWER: &str = "wire.power.set";
    pub const POWER_CHANGED: &str = "wire.power.changed";
    pub const POWER_LEVEL: &str = "wire.power.level";

    pub const SNAPSHOT: &str = "wire.snapshot";
    pub const STATS: &str = "wire.stats";

    pub const CMD_POWER_LEVEL: &str = "wire.cmd.power_level";
    pub const CMD_STATS: &str = "wire.cmd.stats";
    pub const CMD_SNAPSHOT: &str = "wire.cmd.snapshot";
}
