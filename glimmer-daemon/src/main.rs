mod dbus;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use glimmer_core::{CacheStore, Config, SearchCoordinator};
use glimmer_providers::default_chain;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zbus::ConnectionBuilder;

use crate::dbus::{BusSink, ENGINE_PATH, Engine, forward_sink_events};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = Config::default_path()?;
    let config = Arc::new(Config::load(&config_path));
    let cache = CacheStore::open(CacheStore::default_path()?);

    let (events, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = BusSink::new(events, Arc::clone(&results));

    let coordinator = Arc::new(SearchCoordinator::new(
        default_chain(&config, &cache),
        Arc::new(sink),
    ));

    let engine = Engine::new(
        Arc::clone(&coordinator),
        config,
        config_path,
        cache,
        results,
    );

    // Owning the well-known name is the single-instance lock; a second
    // daemon fails here and exits non-zero.
    let connection = ConnectionBuilder::session()?
        .name("org.glimmer.Engine")?
        .serve_at(ENGINE_PATH, engine)?
        .build()
        .await
        .context("could not acquire org.glimmer.Engine; is another instance running?")?;

    tokio::spawn(forward_sink_events(connection.clone(), event_rx));

    // Populate with favorite applications.
    coordinator.search("");

    info!("glimmer engine is running");
    std::future::pending::<()>().await;
    Ok(())
}
