//! Redwire Signal Engine
//!
//! A wire (redstone-like) power propagation engine for a voxel world,
//! running as a standalone event participant.
//!
//! ## Architecture
//!
//! ```text
//! WireAgent  (agent.rs)
//!   └── WireService  (service.rs)  ← frame dispatch, envelopes, snapshots
//!         └── WireEngine  (engine.rs) ← propagation / stabilization
//!               └── World  (block.rs) ← classification + store access
//!                     ├── InMemoryBlocks  (store.rs)
//!                     └── PropertyBlocks  (store.rs)
//! ```
//!
//! `WireEngine` recomputes wire power to a fixed point after every block
//! event. `WireAgent` speaks the `wire.*` protocol over newline-delimited
//! JSON so a game host can delegate signal authority to this process.

// Protocol types are always available (no server feature needed).
pub mod protocol;
pub mod types;

// Server-side modules require the `server` feature.
#[cfg(feature = "server")]
pub mod agent;
#[cfg(feature = "server")]
pub mod block;
#[cfg(feature = "server")]
pub mod engine;
#[cfg(feature = "server")]
pub mod service;
#[cfg(feature = "server")]
pub mod store;

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use agent::{WireAgent, WireAgentConfig};
#[cfg(feature = "server")]
pub use block::{BlockDef, BlockRegistry, SignalTags, World};
#[cfg(feature = "server")]
pub use engine::{PropagationOutcome, WireEngine};
#[cfg(feature = "server")]
pub use service::WireService;
#[cfg(feature = "server")]
pub use store::{BlockStore, InMemoryBlocks, PropertyBlocks};
pub use types::{BlockPos, WireServiceConfig, WireStats, MAX_SIGNAL_STRENGTH, SIGNAL_DECAY};
