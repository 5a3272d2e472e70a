//! Block store subsystem: BlockStore trait, in-memory implementation, and the
//! property-map adapter over host block-attribute storage.

use crate::types::{clamp_power, BlockPos};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can answer "what block is here" and hold a per-block power
/// attribute.
///
/// The store owns block *existence*; the engine only reads identity and
/// reads/writes the power attribute. Absent coordinates answer neutral
/// defaults (`None`, power 0); most of an unbounded lattice is empty and
/// that is a valid steady state, not an error.
///
/// The `as_any` method enables downcasting from `Arc<dyn BlockStore>` to a
/// concrete type when implementation-specific access is needed.
pub trait BlockStore: Send + Sync {
    /// Block identity at `pos`, `None` when the coordinate is empty.
    fn block_id(&self, pos: BlockPos) -> Option<String>;

    /// Current power attribute at `pos`; empty coordinates read as 0.
    fn power(&self, pos: BlockPos) -> u8;

    /// Store a power level, clamped into `[0, 15]`.
    ///
    /// Writes to an empty coordinate are discarded; returns whether the
    /// write landed.
    fn set_power(&self, pos: BlockPos, level: i32) -> bool;

    /// Put a block at `pos`, replacing whatever was there. Power resets to 0.
    fn place(&self, pos: BlockPos, block_id: &str);

    /// Remove the block at `pos` along with its attributes; returns whether
    /// a block existed.
    fn remove(&self, pos: BlockPos) -> bool;

    /// Every occupied coordinate (snapshot and stats support).
    fn positions(&self) -> Vec<BlockPos>;

    /// Downcast support (implement by returning `self`).
    fn as_any(&self) -> &dyn Any;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StoredBlock {
    id: String,
    power: u8,
}

/// Map-backed store for tests and standalone runs.
pub struct InMemoryBlocks {
    cells: RwLock<HashMap<BlockPos, StoredBlock>>,
}

impl InMemoryBlocks {
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }
}

impl Default for InMemoryBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for InMemoryBlocks {
    fn block_id(&self, pos: BlockPos) -> Option<String> {
        self.cells.read().get(&pos).map(|b| b.id.clone())
    }

    fn power(&self, pos: BlockPos) -> u8 {
        self.cells.read().get(&pos).map(|b| b.power).unwrap_or(0)
    }

    fn set_power(&self, pos: BlockPos, level: i32) -> bool {
        let mut cells = self.cells.write();
        match cells.get_mut(&pos) {
            Some(block) => {
                block.power = clamp_power(level);
                true
            }
            None => false,
        }
    }

    fn place(&self, pos: BlockPos, block_id: &str) {
        self.cells.write().insert(
            pos,
            StoredBlock {
                id: block_id.to_string(),
                power: 0,
            },
        );
    }

    fn remove(&self, pos: BlockPos) -> bool {
        self.cells.write().remove(&pos).is_some()
    }

    fn positions(&self) -> Vec<BlockPos> {
        self.cells.read().keys().copied().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Property-backed store
// ---------------------------------------------------------------------------

/// Attribute key the power level is stored under.
pub const POWER_PROPERTY: &str = "power";

#[derive(Debug)]
struct PropertyBlock {
    id: String,
    properties: HashMap<String, serde_json::Value>,
}

/// Adapter over per-block attribute storage, the mechanism host worlds use
/// for arbitrary block data.
///
/// The power level is not a dedicated field here. It lives under the
/// [`POWER_PROPERTY`] key next to whatever else the host attached to the
/// block, and the attribute value is ground truth.
pub struct PropertyBlocks {
    blocks: RwLock<HashMap<BlockPos, PropertyBlock>>,
}

impl PropertyBlocks {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Place a block together with pre-existing host attributes.
    pub fn place_with(
        &self,
        pos: BlockPos,
        block_id: &str,
        properties: HashMap<String, serde_json::Value>,
    ) {
        self.blocks.write().insert(
            pos,
            PropertyBlock {
                id: block_id.to_string(),
                properties,
            },
        );
    }

    /// Read an arbitrary attribute (not just power).
    pub fn property(&self, pos: BlockPos, key: &str) -> Option<serde_json::Value> {
        self.blocks
            .read()
            .get(&pos)
            .and_then(|b| b.properties.get(key).cloned())
    }

    /// Write an arbitrary attribute; discarded when no block exists.
    pub fn set_property(&self, pos: BlockPos, key: &str, value: serde_json::Value) -> bool {
        let mut blocks = self.blocks.write();
        match blocks.get_mut(&pos) {
            Some(block) => {
                block.properties.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }
}

impl Default for PropertyBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for PropertyBlocks {
    fn block_id(&self, pos: BlockPos) -> Option<String> {
        self.blocks.read().get(&pos).map(|b| b.id.clone())
    }

    fn power(&self, pos: BlockPos) -> u8 {
        self.blocks
            .read()
            .get(&pos)
            .and_then(|b| b.properties.get(POWER_PROPERTY))
            .and_then(|v| v.as_i64())
            .map(|v| clamp_power(v as i32))
            .unwrap_or(0)
    }

    fn set_power(&self, pos: BlockPos, level: i32) -> bool {
        let mut blocks = self.blocks.write();
        match blocks.get_mut(&pos) {
            Some(block) => {
                block.properties.insert(
                    POWER_PROPERTY.to_string(),
                    serde_json::Value::from(clamp_power(level)),
                );
                true
            }
            None => false,
        }
    }

    fn place(&self, pos: BlockPos, block_id: &str) {
        self.place_with(pos, block_id, HashMap::new());
    }

    fn remove(&self, pos: BlockPos) -> bool {
        self.blocks.write().remove(&pos).is_some()
    }

    fn positions(&self) -> Vec<BlockPos> {
        self.blocks.read().keys().copied().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
