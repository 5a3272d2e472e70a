//! WireEngine – power recomputation, neighbor cascading, and fixed-point
//! stabilization.
//!
//! ## Propagation model
//!
//! A wire cell's power is the maximum over what its six neighbors offer:
//! an adjacent wire offers its own level minus one hop of decay, an adjacent
//! power source (plain or direct) offers the full signal with no decay.
//! Every public entry point recomputes the affected cell(s) and cascades to
//! neighbors whose cached level is now stale, repeating until no cell
//! changes. Decay makes long cascades lose at least one unit per hop and a
//! "no change" cell never reschedules its neighbors, so the pass terminates
//! on any finite network (rings included) within diameter times signal-range
//! recomputations.
//!
//! Cascading runs on an explicit worklist, never the call stack. Cells
//! already queued in the current pass are not queued twice, but a cell whose
//! inputs change again after it was processed is re-queued; both are
//! required for a correct fixed point.

use crate::block::World;
use crate::protocol::PowerChanged;
use crate::store::BlockStore;
use crate::types::{BlockPos, MAX_SIGNAL_STRENGTH, SIGNAL_DECAY};
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Propagation outcome
// ---------------------------------------------------------------------------

/// Net result of one public engine operation, after the network stabilized.
///
/// `changed` holds one entry per cell whose level differs from before the
/// operation, in first-changed order. Cells that changed and changed back
/// while the cascade was in flight are not reported.
#[derive(Debug, Default)]
pub struct PropagationOutcome {
    pub changed: Vec<PowerChanged>,
}

impl PropagationOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Accumulates per-cell changes across a stabilization pass, coalescing
/// repeated writes to the same cell down to the net transition.
#[derive(Default)]
struct ChangeSet {
    entries: Vec<PowerChanged>,
    seen: HashMap<BlockPos, usize>,
}

impl ChangeSet {
    fn record(&mut self, pos: BlockPos, previous: u8, level: u8) {
        match self.seen.get(&pos) {
            Some(&i) => self.entries[i].level = level,
            None => {
                self.seen.insert(pos, self.entries.len());
                self.entries.push(PowerChanged::new(pos, level, previous));
            }
        }
    }

    fn finish(mut self) -> PropagationOutcome {
        self.entries.retain(|c| c.level != c.previous);
        PropagationOutcome {
            changed: self.entries,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct WireEngine {
    world: Arc<World>,
    recompute_count: u64,
}

impl WireEngine {
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            recompute_count: 0,
        }
    }

    /// Current power at `pos`; positions without a wire answer 0.
    pub fn power_level(&self, pos: BlockPos) -> u8 {
        self.world.blocks.power(pos)
    }

    /// Total cell recomputations performed since construction.
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// A block newly occupies `pos` (already inserted into the store).
    ///
    /// A placed wire starts at power 0 and pulls from its neighbors; placing
    /// anything else (a source, an inert block) re-pulls the adjacent wires
    /// instead, since one of their inputs just appeared.
    pub fn on_placed(&mut self, pos: BlockPos) -> PropagationOutcome {
        if self.world.is_wire(pos) {
            self.world.blocks.set_power(pos, 0);
            debug!("Wire placed at {} with initial power level 0", pos);
            self.stabilize([pos])
        } else {
            self.stabilize(pos.adjacent())
        }
    }

    /// The block at `pos` is gone (already removed from the store).
    ///
    /// Every surviving wire neighbor lost an input and is recomputed.
    pub fn on_broken(&mut self, pos: BlockPos) -> PropagationOutcome {
        debug!("Block broken at {}, re-pulling wire neighbors", pos);
        self.stabilize(pos.adjacent())
    }

    /// Something adjacent to `pos` changed outside the engine's view.
    pub fn on_neighbor_changed(&mut self, pos: BlockPos) -> PropagationOutcome {
        self.stabilize([pos])
    }

    /// Explicit external override.
    ///
    /// Clamps and stores the level, then cascades exactly like an internally
    /// computed change. A connected network may therefore recompute the
    /// overridden cell again; the override persists only where it is
    /// consistent with the cell's inputs (always, for isolated cells).
    /// Writes to positions that are not wires are discarded.
    pub fn set_power(&mut self, pos: BlockPos, level: i32) -> PropagationOutcome {
        if !self.world.is_wire(pos) {
            debug!("Ignoring set_power at {}: not a wire", pos);
            return PropagationOutcome::none();
        }

        let previous = self.world.blocks.power(pos);
        self.world.blocks.set_power(pos, level);
        let stored = self.world.blocks.power(pos);
        debug!("Wire at {} set to power level {}", pos, stored);

        let mut changes = ChangeSet::default();
        if stored != previous {
            changes.record(pos, previous, stored);
        }
        self.stabilize_into(&mut changes, pos.adjacent());
        changes.finish()
    }

    // -----------------------------------------------------------------------
    // Stabilization
    // -----------------------------------------------------------------------

    fn stabilize(&mut self, seeds: impl IntoIterator<Item = BlockPos>) -> PropagationOutcome {
        let mut changes = ChangeSet::default();
        self.stabilize_into(&mut changes, seeds);
        changes.finish()
    }

    /// Worklist fixed-point iteration: recompute each queued wire, and when
    /// its level changes re-queue its wire neighbors, until the queue drains.
    fn stabilize_into(
        &mut self,
        changes: &mut ChangeSet,
        seeds: impl IntoIterator<Item = BlockPos>,
    ) {
        let mut queue: VecDeque<BlockPos> = VecDeque::new();
        let mut scheduled: HashSet<BlockPos> = HashSet::new();

        for seed in seeds {
            if self.world.is_wire(seed) && scheduled.insert(seed) {
                queue.push_back(seed);
            }
        }

        while let Some(pos) = queue.pop_front() {
            scheduled.remove(&pos);
            self.recompute_count += 1;

            let current = self.world.blocks.power(pos);
            let target = self.recompute_target(pos);
            if target == current {
                continue;
            }

            self.world.blocks.set_power(pos, target as i32);
            changes.record(pos, current, target);
            debug!("Updated wire at {} to power level {}", pos, target);

            for neighbor in pos.adjacent() {
                if self.world.is_wire(neighbor) && scheduled.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// The level `pos` should hold given its neighbors right now.
    fn recompute_target(&self, pos: BlockPos) -> u8 {
        let mut max_power = 0u8;

        for neighbor in pos.adjacent() {
            let tags = self.world.classify_at(neighbor);

            if tags.wire {
                let carried = self.world.blocks.power(neighbor).saturating_sub(SIGNAL_DECAY);
                if carried > max_power {
                    max_power = carried;
                }
            } else if tags.power_source {
                max_power = MAX_SIGNAL_STRENGTH;
            }

            // Direct power is an independent tag; checked even for blocks
            // that also matched above.
            if tags.direct_power {
                max_power = MAX_SIGNAL_STRENGTH;
            }
        }

        max_power.min(MAX_SIGNAL_STRENGTH)
    }
}
