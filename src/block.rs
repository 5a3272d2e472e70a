//! Block classification subsystem: signal tags, block definitions and their
//! registry, plus the top-level `World` data container.

use crate::store::BlockStore;
use crate::types::{BlockPos, WireServiceConfig};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Signal tags
// ---------------------------------------------------------------------------

/// How a block participates in signal propagation.
///
/// The tags are independent: a block may be both a plain power source and a
/// direct power source, and both checks are applied during recomputation.
/// A default-constructed value is the neutral "does not participate" answer
/// used for unknown and absent blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalTags {
    /// Carries signal with per-hop decay.
    pub wire: bool,
    /// Supplies full signal to adjacent wires, no decay on the source edge.
    pub power_source: bool,
    /// Direct power (buttons, levers …); also supplies full signal.
    pub direct_power: bool,
}

impl SignalTags {
    pub const NONE: SignalTags = SignalTags {
        wire: false,
        power_source: false,
        direct_power: false,
    };

    pub const WIRE: SignalTags = SignalTags {
        wire: true,
        power_source: false,
        direct_power: false,
    };

    pub const POWER_SOURCE: SignalTags = SignalTags {
        wire: false,
        power_source: true,
        direct_power: false,
    };

    pub const DIRECT_POWER: SignalTags = SignalTags {
        wire: false,
        power_source: false,
        direct_power: true,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

// ---------------------------------------------------------------------------
// Block definition
// ---------------------------------------------------------------------------

/// A single block type known to the signal engine.
#[derive(Debug)]
pub struct BlockDef {
    /// Namespaced block identity (e.g. `exampleplugin:wire`).
    pub id: String,
    /// Signal participation of this block type.
    pub tags: SignalTags,
    /// Arbitrary metadata (asset path, display name, …).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BlockDef {
    pub fn new(id: impl Into<String>, tags: SignalTags) -> Self {
        Self {
            id: id.into(),
            tags,
            metadata: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps block identities to their signal tags.
///
/// Identity strings are resolved to a closed tag set exactly once per query;
/// nothing downstream compares block id strings.
pub struct BlockRegistry {
    definitions: HashMap<String, BlockDef>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Build a registry from service configuration.
    pub fn from_config(config: &WireServiceConfig) -> Self {
        let mut registry = Self::new();
        registry.insert(BlockDef::new(config.wire_block.clone(), SignalTags::WIRE));
        for id in &config.power_source_blocks {
            registry.insert(BlockDef::new(id.clone(), SignalTags::POWER_SOURCE));
        }
        for id in &config.direct_power_blocks {
            registry.insert(BlockDef::new(id.clone(), SignalTags::DIRECT_POWER));
        }
        registry
    }

    pub fn insert(&mut self, def: BlockDef) {
        self.definitions.insert(def.id.clone(), def);
    }

    pub fn remove(&mut self, id: &str) -> Option<BlockDef> {
        self.definitions.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&BlockDef> {
        self.definitions.get(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Signal tags for a block identity; unknown ids classify neutral.
    pub fn classify(&self, id: &str) -> SignalTags {
        self.definitions
            .get(id)
            .map(|def| def.tags)
            .unwrap_or(SignalTags::NONE)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// World (data container)
// ---------------------------------------------------------------------------

/// The world data layer the engine reads: block existence and attributes via
/// the store, block meaning via the registry.
pub struct World {
    pub blocks: Arc<dyn BlockStore>,
    pub registry: BlockRegistry,
}

impl World {
    pub fn new(blocks: Arc<dyn BlockStore>, registry: BlockRegistry) -> Self {
        Self { blocks, registry }
    }

    /// Classification of whatever occupies `pos`; empty answers neutral.
    pub fn classify_at(&self, pos: BlockPos) -> SignalTags {
        match self.blocks.block_id(pos) {
            Some(id) => self.registry.classify(&id),
            None => SignalTags::NONE,
        }
    }

    pub fn is_wire(&self, pos: BlockPos) -> bool {
        self.classify_at(pos).wire
    }
}
