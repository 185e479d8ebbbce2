use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use glimmer_core::{
    Activation, CacheStore, Config, ResultItem, ResultSink, SearchCoordinator, activate,
};
use glimmer_providers::default_chain;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};
use zbus::object_server::SignalContext;
use zbus::zvariant::Type;
use zbus::{Connection, interface};

pub const ENGINE_PATH: &str = "/org/glimmer/Engine1";

/// A result item flattened for the bus: optional fields become empty
/// strings, the kind becomes its tag.
#[derive(Debug, Clone, Type, Serialize, Deserialize)]
pub struct EngineResultItem {
    pub label: String,
    pub kind: String,
    pub payload: String,
    pub selectable: bool,
}

impl From<&ResultItem> for EngineResultItem {
    fn from(item: &ResultItem) -> Self {
        Self {
            label: item.label.clone(),
            kind: item.kind.tag().to_string(),
            payload: item.kind.payload().unwrap_or_default(),
            selectable: item.selectable,
        }
    }
}

/// What the coordinator pushed at the sink, in acceptance order.
pub enum SinkEvent {
    Searching,
    Replace(Vec<ResultItem>),
}

/// Result sink that remembers the last accepted set (for index-based
/// activation) and forwards every event to the signal emitter. A single
/// forwarder task drains the channel, so signal order matches acceptance
/// order.
pub struct BusSink {
    events: UnboundedSender<SinkEvent>,
    results: Arc<Mutex<Vec<ResultItem>>>,
}

impl BusSink {
    pub fn new(events: UnboundedSender<SinkEvent>, results: Arc<Mutex<Vec<ResultItem>>>) -> Self {
        Self { events, results }
    }
}

impl ResultSink for BusSink {
    fn searching(&self) {
        let _ = self.events.send(SinkEvent::Searching);
    }

    fn replace(&self, items: Vec<ResultItem>) {
        *self.results.lock().expect("result list poisoned") = items.clone();
        let _ = self.events.send(SinkEvent::Replace(items));
    }
}

/// The launcher engine as served on the session bus.
#[derive(Clone)]
pub struct Engine {
    coordinator: Arc<SearchCoordinator>,
    config: Arc<ArcSwap<Config>>,
    config_path: PathBuf,
    cache: CacheStore,
    results: Arc<Mutex<Vec<ResultItem>>>,
}

impl Engine {
    pub fn new(
        coordinator: Arc<SearchCoordinator>,
        config: Arc<Config>,
        config_path: PathBuf,
        cache: CacheStore,
        results: Arc<Mutex<Vec<ResultItem>>>,
    ) -> Self {
        Self {
            coordinator,
            config: Arc::new(ArcSwap::new(config)),
            config_path,
            cache,
            results,
        }
    }

    fn activate_item(&self, item: &ResultItem) {
        let config = self.config.load_full();
        match activate(item, &config) {
            Ok(Activation::ResetCache) => self.reset(),
            Ok(_) => {}
            Err(err) => warn!("activation failed: {err:#}"),
        }
    }

    /// Clear the persisted cache, reload the configuration as a fresh
    /// snapshot, swap in a rebuilt provider chain and repopulate the
    /// favorites view. Runs on a blocking thread; the rebuild rescans the
    /// application directories.
    fn reset(&self) {
        info!("clearing provider cache");
        if let Err(err) = self.cache.clear() {
            warn!("could not clear provider cache: {err:#}");
        }

        let config = Arc::new(Config::load(&self.config_path));
        self.config.store(Arc::clone(&config));
        self.coordinator
            .replace_chain(default_chain(&config, &self.cache));
        self.coordinator.search("");
    }
}

#[interface(name = "org.glimmer.Engine1")]
impl Engine {
    /// Submit a query. Fire-and-forget; results arrive via the
    /// `ResultsChanged` signal. Safe to call on every keystroke.
    async fn search(&self, query: &str) {
        self.coordinator.search(query);
    }

    /// Activate an item from the last delivered result set by position.
    async fn activate(&self, index: u32) {
        let item = {
            let results = self.results.lock().expect("result list poisoned");
            results.get(index as usize).cloned()
        };
        let Some(item) = item else {
            warn!("activation index {index} out of range");
            return;
        };

        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.activate_item(&item));
    }

    /// Clear the provider cache and rebuild the provider chain.
    async fn reset_cache(&self) {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.reset());
    }

    /// A search was submitted and results are on their way.
    #[zbus(signal)]
    async fn searching(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// The accepted result set changed; replaces the displayed list
    /// wholesale. Emitted at most once per accepted search.
    #[zbus(signal)]
    async fn results_changed(
        ctxt: &SignalContext<'_>,
        results: Vec<EngineResultItem>,
    ) -> zbus::Result<()>;
}

/// Drain sink events into bus signals, preserving acceptance order.
pub async fn forward_sink_events(connection: Connection, mut events: UnboundedReceiver<SinkEvent>) {
    let ctxt = match SignalContext::new(&connection, ENGINE_PATH) {
        Ok(ctxt) => ctxt,
        Err(err) => {
            error!("could not build signal context: {err:#}");
            return;
        }
    };

    while let Some(event) = events.recv().await {
        let emitted = match event {
            SinkEvent::Searching => Engine::searching(&ctxt).await,
            SinkEvent::Replace(items) => {
                let rows = items.iter().map(EngineResultItem::from).collect();
                Engine::results_changed(&ctxt, rows).await
            }
        };
        if let Err(err) = emitted {
            warn!("could not emit result signal: {err:#}");
        }
    }
}
