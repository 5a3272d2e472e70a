//! WireEngine unit tests

#[cfg(test)]
mod tests {
    use redwire::block::{BlockDef, BlockRegistry, SignalTags, World};
    use redwire::engine::WireEngine;
    use redwire::store::{BlockStore, InMemoryBlocks};
    use redwire::types::{BlockPos, MAX_SIGNAL_STRENGTH};
    use std::sync::Arc;

    const WIRE: &str = "test:wire";
    const GENERATOR: &str = "test:generator";
    const LEVER: &str = "test:lever";

    fn make_world() -> (Arc<World>, Arc<InMemoryBlocks>) {
        let blocks = Arc::new(InMemoryBlocks::new());
        let mut registry = BlockRegistry::new();
        registry.insert(BlockDef::new(WIRE, SignalTags::WIRE));
        registry.insert(BlockDef::new(GENERATOR, SignalTags::POWER_SOURCE));
        registry.insert(BlockDef::new(LEVER, SignalTags::DIRECT_POWER));
        let world = Arc::new(World::new(blocks.clone() as Arc<dyn BlockStore>, registry));
        (world, blocks)
    }

    fn p(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(x, y, z)
    }

    /// Insert the block into the store and run the placement path, the way
    /// the service does for a host placement event.
    fn place(engine: &mut WireEngine, blocks: &InMemoryBlocks, pos: BlockPos, id: &str) {
        blocks.place(pos, id);
        engine.on_placed(pos);
    }

    fn break_block(engine: &mut WireEngine, blocks: &InMemoryBlocks, pos: BlockPos) {
        blocks.remove(pos);
        engine.on_broken(pos);
    }

    // -----------------------------------------------------------------------
    // Decay chain
    // -----------------------------------------------------------------------

    #[test]
    fn wire_adjacent_to_source_carries_full_signal() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        place(&mut engine, &blocks, p(1, 0, 0), WIRE);

        assert_eq!(engine.power_level(p(1, 0, 0)), MAX_SIGNAL_STRENGTH);
    }

    #[test]
    fn chain_decays_one_per_hop() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        for x in 1..=3 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        assert_eq!(engine.power_level(p(1, 0, 0)), 15);
        assert_eq!(engine.power_level(p(2, 0, 0)), 14);
        assert_eq!(engine.power_level(p(3, 0, 0)), 13);
    }

    #[test]
    fn long_chain_decays_to_zero_past_signal_range() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        for x in 1..=20 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        // Distance d from the source (d = 1 is adjacent): 15, 14, … 1, 0, 0…
        for x in 1..=20i32 {
            let expected = (MAX_SIGNAL_STRENGTH as i32 - (x - 1)).max(0) as u8;
            assert_eq!(
                engine.power_level(p(x, 0, 0)),
                expected,
                "wire at x={} should sit at {}",
                x,
                expected
            );
        }
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    #[test]
    fn breaking_middle_wire_disconnects_the_tail() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        for x in 1..=3 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        break_block(&mut engine, &blocks, p(2, 0, 0));

        assert_eq!(engine.power_level(p(1, 0, 0)), 15);
        assert_eq!(engine.power_level(p(3, 0, 0)), 0);
    }

    #[test]
    fn breaking_the_only_source_drains_the_chain() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        for x in 1..=5 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        break_block(&mut engine, &blocks, p(0, 0, 0));

        for x in 1..=5 {
            assert_eq!(engine.power_level(p(x, 0, 0)), 0, "wire at x={}", x);
        }
    }

    #[test]
    fn breaking_the_middle_wire_reports_only_the_tail_change() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        for x in 1..=3 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        blocks.remove(p(2, 0, 0));
        let outcome = engine.on_broken(p(2, 0, 0));

        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].pos(), p(3, 0, 0));
        assert_eq!(outcome.changed[0].previous, 13);
        assert_eq!(outcome.changed[0].level, 0);
    }

    // -----------------------------------------------------------------------
    // Source placement order
    // -----------------------------------------------------------------------

    #[test]
    fn placing_a_source_next_to_dead_wires_charges_them() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        for x in 1..=3 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }
        assert_eq!(engine.power_level(p(1, 0, 0)), 0);

        blocks.place(p(0, 0, 0), GENERATOR);
        let outcome = engine.on_placed(p(0, 0, 0));

        assert_eq!(outcome.changed.len(), 3);
        assert_eq!(engine.power_level(p(1, 0, 0)), 15);
        assert_eq!(engine.power_level(p(2, 0, 0)), 14);
        assert_eq!(engine.power_level(p(3, 0, 0)), 13);
    }

    #[test]
    fn direct_power_blocks_charge_adjacent_wires() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(1, 0, 0), WIRE);
        place(&mut engine, &blocks, p(0, 0, 0), LEVER);

        assert_eq!(engine.power_level(p(1, 0, 0)), MAX_SIGNAL_STRENGTH);
    }

    #[test]
    fn combined_source_tags_still_supply_full_signal() {
        let mut both = SignalTags::POWER_SOURCE;
        both.direct_power = true;

        let blocks = Arc::new(InMemoryBlocks::new());
        let mut registry = BlockRegistry::new();
        registry.insert(BlockDef::new(WIRE, SignalTags::WIRE));
        registry.insert(BlockDef::new("test:beacon", both));
        let world = Arc::new(World::new(blocks.clone() as Arc<dyn BlockStore>, registry));
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(1, 0, 0), WIRE);
        place(&mut engine, &blocks, p(0, 0, 0), "test:beacon");

        assert_eq!(engine.power_level(p(1, 0, 0)), MAX_SIGNAL_STRENGTH);
    }

    // -----------------------------------------------------------------------
    // Branches and rings
    // -----------------------------------------------------------------------

    #[test]
    fn junction_takes_the_strongest_input() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        // Two sources feeding the same junction from different distances.
        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        place(&mut engine, &blocks, p(1, 0, 0), WIRE);
        place(&mut engine, &blocks, p(2, 0, 0), WIRE);
        place(&mut engine, &blocks, p(2, 0, 1), WIRE);
        place(&mut engine, &blocks, p(2, 0, 2), GENERATOR);

        // Junction at (2,0,0): 13 via the chain, 14 via the short arm.
        assert_eq!(engine.power_level(p(2, 0, 1)), 15);
        assert_eq!(engine.power_level(p(2, 0, 0)), 14);
        assert_eq!(engine.power_level(p(1, 0, 0)), 15);
    }

    #[test]
    fn ring_stabilizes_along_the_shortest_path() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(-1, 0, 0), GENERATOR);
        // 2×2 ring in the XZ plane, one corner adjacent to the source.
        place(&mut engine, &blocks, p(0, 0, 0), WIRE);
        place(&mut engine, &blocks, p(1, 0, 0), WIRE);
        place(&mut engine, &blocks, p(1, 0, 1), WIRE);
        place(&mut engine, &blocks, p(0, 0, 1), WIRE);

        assert_eq!(engine.power_level(p(0, 0, 0)), 15);
        assert_eq!(engine.power_level(p(1, 0, 0)), 14);
        assert_eq!(engine.power_level(p(0, 0, 1)), 14);
        assert_eq!(engine.power_level(p(1, 0, 1)), 13);
    }

    // -----------------------------------------------------------------------
    // Explicit overrides
    // -----------------------------------------------------------------------

    #[test]
    fn set_power_clamps_out_of_range_levels() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), WIRE);

        engine.set_power(p(0, 0, 0), 99);
        assert_eq!(engine.power_level(p(0, 0, 0)), 15);

        engine.set_power(p(0, 0, 0), -5);
        assert_eq!(engine.power_level(p(0, 0, 0)), 0);
    }

    #[test]
    fn set_power_on_a_non_wire_is_discarded() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);

        let outcome = engine.set_power(p(0, 0, 0), 7);
        assert!(outcome.is_empty());
        assert_eq!(engine.power_level(p(0, 0, 0)), 0);

        let outcome = engine.set_power(p(9, 9, 9), 7);
        assert!(outcome.is_empty());
    }

    #[test]
    fn sourceless_override_collapses_back_to_the_fixed_point() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        for x in 0..=2 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        // The override cascades like any computed change; with no source
        // sustaining it, the only fixed point of the network is all-zero.
        engine.set_power(p(0, 0, 0), 15);
        for x in 0..=2 {
            assert_eq!(engine.power_level(p(x, 0, 0)), 0, "wire at x={}", x);
        }
    }

    // -----------------------------------------------------------------------
    // Idempotence
    // -----------------------------------------------------------------------

    #[test]
    fn neighbor_changed_on_a_stable_network_is_a_no_op() {
        let (world, blocks) = make_world();
        let mut engine = WireEngine::new(world);

        place(&mut engine, &blocks, p(0, 0, 0), GENERATOR);
        for x in 1..=4 {
            place(&mut engine, &blocks, p(x, 0, 0), WIRE);
        }

        for x in 1..=4 {
            let outcome = engine.on_neighbor_changed(p(x, 0, 0));
            assert!(outcome.is_empty(), "wire at x={} should not change", x);
        }
    }

    #[test]
    fn neighbor_changed_on_empty_space_is_a_no_op() {
        let (world, _blocks) = make_world();
        let mut engine = WireEngine::new(world);

        let outcome = engine.on_neighbor_changed(p(5, 5, 5));
        assert!(outcome.is_empty());
        assert_eq!(engine.power_level(p(5, 5, 5)), 0);
    }
}
