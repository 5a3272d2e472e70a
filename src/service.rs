//! WireService – protocol dispatch over the engine, envelopes, snapshots.

use crate::block::World;
use crate::engine::{PropagationOutcome, WireEngine};
use crate::protocol::{
    subjects, BlockBrokenMsg, BlockPlacedMsg, CmdPowerLevel, Frame, NeighborChangedMsg,
    PowerChanged, PowerLevelReply, SetPowerMsg, WireCellState, WireError, WireEvent, WireSnapshot,
};
use crate::store::BlockStore;
use crate::types::{BlockPos, WireServiceConfig, WireStats};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub struct WireService {
    config: WireServiceConfig,
    world: Arc<World>,
    engine: WireEngine,
    frame_count: u64,
}

impl WireService {
    pub fn new(config: WireServiceConfig, world: Arc<World>) -> Self {
        let engine = WireEngine::new(world.clone());
        Self {
            config,
            world,
            engine,
            frame_count: 0,
        }
    }

    pub fn config(&self) -> &WireServiceConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Typed operations (for embedding the service without a transport)
    // -----------------------------------------------------------------------

    /// Host placed a block: record it in the store, then propagate.
    pub fn block_placed(&mut self, pos: BlockPos, block_id: &str) -> Vec<WireEvent<PowerChanged>> {
        self.world.blocks.place(pos, block_id);
        let outcome = self.engine.on_placed(pos);
        self.wrap(outcome)
    }

    /// Host broke a block: drop it from the store, then propagate.
    pub fn block_broken(&mut self, pos: BlockPos) -> Vec<WireEvent<PowerChanged>> {
        if !self.world.blocks.remove(pos) {
            debug!("Broken block at {} was not tracked", pos);
        }
        let outcome = self.engine.on_broken(pos);
        self.wrap(outcome)
    }

    /// Host reports an external change next to `pos`.
    pub fn neighbor_changed(&mut self, pos: BlockPos) -> Vec<WireEvent<PowerChanged>> {
        let outcome = self.engine.on_neighbor_changed(pos);
        self.wrap(outcome)
    }

    /// Explicit power override (clamped; non-wires discarded).
    pub fn set_power(&mut self, pos: BlockPos, level: i32) -> Vec<WireEvent<PowerChanged>> {
        let outcome = self.engine.set_power(pos, level);
        self.wrap(outcome)
    }

    /// Read-only power query; positions without a wire answer 0.
    pub fn power_level(&self, pos: BlockPos) -> u8 {
        self.engine.power_level(pos)
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    /// Build a full-network [`WireSnapshot`] for a reconnecting client.
    ///
    /// Cells are sorted by position so the digest is stable for equal state.
    pub fn build_snapshot(&self) -> WireSnapshot {
        let mut wires: Vec<WireCellState> = self
            .world
            .blocks
            .positions()
            .into_iter()
            .filter(|pos| self.world.is_wire(*pos))
            .map(|pos| WireCellState {
                x: pos.x,
                y: pos.y,
                z: pos.z,
                level: self.world.blocks.power(pos),
            })
            .collect();
        wires.sort_by_key(|c| (c.x, c.y, c.z));

        let digest = match serde_json::to_vec(&wires) {
            Ok(bytes) => format!("{:x}", md5::compute(&bytes)),
            Err(e) => {
                warn!("Failed to serialise snapshot body for digest: {}", e);
                String::new()
            }
        };

        WireSnapshot { wires, digest }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> WireStats {
        let positions = self.world.blocks.positions();
        let mut wire_cells = 0;
        let mut powered_cells = 0;
        for pos in &positions {
            if self.world.is_wire(*pos) {
                wire_cells += 1;
                if self.world.blocks.power(*pos) > 0 {
                    powered_cells += 1;
                }
            }
        }

        WireStats {
            wire_cells,
            powered_cells,
            total_blocks: positions.len(),
            total_frames: self.frame_count,
            total_recomputes: self.engine.recompute_count(),
        }
    }

    // -----------------------------------------------------------------------
    // Frame dispatch
    // -----------------------------------------------------------------------

    /// Decode one inbound frame, apply it, and return the outbound frames.
    ///
    /// Unknown subjects and malformed payloads are collaborator faults and
    /// surface as [`WireError`]; the engine operations themselves cannot
    /// fail.
    pub fn handle_frame(&mut self, frame: Frame) -> Result<Vec<Frame>, WireError> {
        match frame.subject.as_str() {
            subjects::BLOCK_PLACED => {
                let msg: BlockPlacedMsg = decode(&frame)?;
                let events = self.block_placed(BlockPos::new(msg.x, msg.y, msg.z), &msg.block_id);
                Ok(power_frames(&events))
            }
            subjects::BLOCK_BROKEN => {
                let msg: BlockBrokenMsg = decode(&frame)?;
                let events = self.block_broken(BlockPos::new(msg.x, msg.y, msg.z));
                Ok(power_frames(&events))
            }
            subjects::NEIGHBOR_CHANGED => {
                let msg: NeighborChangedMsg = decode(&frame)?;
                let events = self.neighbor_changed(BlockPos::new(msg.x, msg.y, msg.z));
                Ok(power_frames(&events))
            }
            subjects::SET_POWER => {
                let msg: SetPowerMsg = decode(&frame)?;
                let events = self.set_power(BlockPos::new(msg.x, msg.y, msg.z), msg.level);
                Ok(power_frames(&events))
            }
            subjects::CMD_POWER_LEVEL => {
                let msg: CmdPowerLevel = decode(&frame)?;
                let pos = BlockPos::new(msg.x, msg.y, msg.z);
                let reply = PowerLevelReply {
                    x: pos.x,
                    y: pos.y,
                    z: pos.z,
                    level: self.power_level(pos),
                };
                let frame_no = self.next_frame();
                Ok(reply_frame(
                    subjects::POWER_LEVEL,
                    &WireEvent::new(self.config.session.clone(), frame_no, reply),
                ))
            }
            subjects::CMD_STATS => {
                let stats = self.stats();
                let frame_no = self.next_frame();
                Ok(reply_frame(
                    subjects::STATS,
                    &WireEvent::new(self.config.session.clone(), frame_no, stats),
                ))
            }
            subjects::CMD_SNAPSHOT => {
                let snapshot = self.build_snapshot();
                let frame_no = self.next_frame();
                Ok(reply_frame(
                    subjects::SNAPSHOT,
                    &WireEvent::new(self.config.session.clone(), frame_no, snapshot),
                ))
            }
            other => Err(WireError::UnknownSubject(other.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Envelope helpers
    // -----------------------------------------------------------------------

    fn next_frame(&mut self) -> u64 {
        self.frame_count += 1;
        self.frame_count
    }

    /// Stamp one frame number on every change produced by a single event.
    fn wrap(&mut self, outcome: PropagationOutcome) -> Vec<WireEvent<PowerChanged>> {
        let frame = self.next_frame();
        outcome
            .changed
            .into_iter()
            .map(|change| WireEvent::new(self.config.session.clone(), frame, change))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Frame helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(frame: &Frame) -> Result<T, WireError> {
    serde_json::from_value(frame.payload.clone()).map_err(|e| WireError::InvalidPayload {
        subject: frame.subject.clone(),
        source: e,
    })
}

fn power_frames(events: &[WireEvent<PowerChanged>]) -> Vec<Frame> {
    events
        .iter()
        .filter_map(|event| outbound(subjects::POWER_CHANGED, event))
        .collect()
}

fn reply_frame<T: Serialize>(subject: &str, event: &WireEvent<T>) -> Vec<Frame> {
    outbound(subject, event).into_iter().collect()
}

/// Serialise one outbound envelope into a transport frame.
///
/// Serialisation failures are logged and swallowed — a single bad event
/// should not take down the dispatch path.
fn outbound<T: Serialize>(subject: &str, event: &WireEvent<T>) -> Option<Frame> {
    match serde_json::to_value(event) {
        Ok(payload) => Some(Frame {
            subject: subject.to_string(),
            payload,
        }),
        Err(e) => {
            warn!("Failed to serialise event for {}: {}", subject, e);
            None
        }
    }
}
