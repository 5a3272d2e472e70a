//! Core signal types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Signal constants
// ---------------------------------------------------------------------------

/// Maximum signal strength a wire can carry (like redstone: 15).
pub const MAX_SIGNAL_STRENGTH: u8 = 15;

/// Signal decay applied per wire-to-wire hop.
pub const SIGNAL_DECAY: u8 = 1;

/// Clamp an externally supplied power level into `[0, MAX_SIGNAL_STRENGTH]`.
///
/// Out-of-range levels are not an error; callers may hand in anything and
/// get the nearest representable level back.
pub fn clamp_power(level: i32) -> u8 {
    level.clamp(0, MAX_SIGNAL_STRENGTH as i32) as u8
}

// ---------------------------------------------------------------------------
// Lattice positions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The six orthogonally adjacent positions, in a fixed order:
    /// east, west, up, down, south, north.
    pub fn adjacent(&self) -> [BlockPos; 6] {
        [
            BlockPos::new(self.x + 1, self.y, self.z),
            BlockPos::new(self.x - 1, self.y, self.z),
            BlockPos::new(self.x, self.y + 1, self.z),
            BlockPos::new(self.x, self.y - 1, self.z),
            BlockPos::new(self.x, self.y, self.z + 1),
            BlockPos::new(self.x, self.y, self.z - 1),
        ]
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireStats {
    pub wire_cells: usize,
    pub powered_cells: usize,
    pub total_blocks: usize,
    pub total_frames: u64,
    pub total_recomputes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireServiceConfig {
    /// Session label stamped on every outbound envelope.
    pub session: String,
    /// Block id classified as a wire.
    pub wire_block: String,
    /// Block ids that supply full signal to adjacent wires.
    pub power_source_blocks: Vec<String>,
    /// Block ids tagged as direct power (buttons, levers, …).
    pub direct_power_blocks: Vec<String>,
}

impl Default for WireServiceConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            wire_block: "exampleplugin:wire".into(),
            power_source_blocks: vec!["exampleplugin:power_source".into()],
            direct_power_blocks: vec![
                "exampleplugin:button".into(),
                "exampleplugin:lever".into(),
            ],
        }
    }
}
