//! redwire-server binary
//!
//! Starts the signal engine and connects it to the host as an external
//! signal participant speaking NDJSON frames over stdio.
//!
//! ## Configuration (flags / env, plus TOML via `config` crate)
//!
//! | Key                        | Default             | Description                    |
//! |----------------------------|---------------------|--------------------------------|
//! | `REDWIRE_SESSION`          | `default`           | Session label on envelopes     |
//! | `REDWIRE_PARTICIPANT_ID`   | `redwire-service`   | Participant ID                 |
//! | `REDWIRE_EVENT_CAPACITY`   | `256`               | Frame buffer between tasks     |
//! | `REDWIRE_CONFIG`           | *(none)*            | Optional TOML for block ids    |

use anyhow::{Context, Result};
use clap::Parser;
use redwire::{
    agent::{WireAgent, WireAgentConfig},
    block::{BlockRegistry, World},
    service::WireService,
    store::{BlockStore, InMemoryBlocks},
    types::WireServiceConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "redwire-server", about = "Redwire Signal Engine", version)]
struct Args {
    /// Session label stamped on outbound envelopes
    #[arg(long, env = "REDWIRE_SESSION", default_value = "default")]
    session: String,

    /// Participant ID advertised to the host
    #[arg(long, env = "REDWIRE_PARTICIPANT_ID", default_value = "redwire-service")]
    participant_id: String,

    /// Frame buffer between reader, dispatcher, and writer
    #[arg(long, env = "REDWIRE_EVENT_CAPACITY", default_value_t = 256)]
    event_capacity: usize,

    /// Optional TOML file overriding block ids and session defaults
    #[arg(long, env = "REDWIRE_CONFIG")]
    config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("redwire=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let service_config = load_service_config(args.config.as_deref(), &args.session)?;

    log::info!(
        "Starting redwire-server (session='{}', wire_block='{}', sources={}, direct={})",
        service_config.session,
        service_config.wire_block,
        service_config.power_source_blocks.len(),
        service_config.direct_power_blocks.len(),
    );

    // Build world data layer
    let blocks: Arc<dyn BlockStore> = Arc::new(InMemoryBlocks::new());
    let registry = BlockRegistry::from_config(&service_config);
    let world = Arc::new(World::new(blocks, registry));

    let service = Arc::new(parking_lot::Mutex::new(WireService::new(
        service_config,
        world,
    )));

    // Agent config
    let agent_config = WireAgentConfig {
        participant_id: args.participant_id,
        event_capacity: args.event_capacity,
    };

    // Run until shutdown
    WireAgent::new(agent_config, service).run().await
}

// ---------------------------------------------------------------------------
// Config layering
// ---------------------------------------------------------------------------

/// Defaults ← optional TOML file ← `--session` flag.
fn load_service_config(path: Option<&Path>, session: &str) -> Result<WireServiceConfig> {
    let mut builder = config::Config::builder().add_source(
        config::Config::try_from(&WireServiceConfig::default())
            .context("Failed to seed configuration defaults")?,
    );

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let mut cfg: WireServiceConfig = builder
        .build()
        .context("Failed to assemble configuration")?
        .try_deserialize()
        .context("Invalid configuration contents")?;
    cfg.session = session.to_string();
    Ok(cfg)
}
