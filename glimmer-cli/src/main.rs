use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::StreamExt;
use serde::Deserialize;
use zbus::zvariant::Type;
use zbus::{Connection, proxy};

#[derive(Debug, Clone, Type, Deserialize)]
struct ResultRow {
    label: String,
    kind: String,
    payload: String,
    selectable: bool,
}

#[proxy(
    interface = "org.glimmer.Engine1",
    default_service = "org.glimmer.Engine",
    default_path = "/org/glimmer/Engine1"
)]
trait Engine {
    async fn search(&self, query: &str) -> zbus::Result<()>;
    async fn activate(&self, index: u32) -> zbus::Result<()>;
    async fn reset_cache(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn results_changed(&self, results: Vec<ResultRow>) -> zbus::Result<()>;
}

#[derive(Parser, Debug)]
#[command(version, about = "Query a running glimmer engine", long_about = None)]
struct Args {
    /// The search term; empty lists favorites
    #[arg(default_value = "")]
    query: String,

    /// Activate the result at this position once results arrive
    #[arg(long)]
    activate: Option<u32>,

    /// Clear the provider cache and rebuild the application index
    #[arg(long)]
    reset_cache: bool,

    /// How long to wait for results, in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let connection = Connection::session().await?;
    let proxy = EngineProxy::new(&connection)
        .await
        .context("is glimmer-daemon running?")?;

    if args.reset_cache {
        proxy.reset_cache().await?;
        println!("Cache reset requested.");
        return Ok(());
    }

    // Subscribe before searching so the delivery cannot be missed.
    let mut results = proxy.receive_results_changed().await?;
    proxy.search(&args.query).await?;

    let signal = tokio::time::timeout(Duration::from_secs(args.timeout), results.next())
        .await
        .context("timed out waiting for results")?
        .context("result signal stream closed")?;
    let signal_args = signal.args()?;
    let rows = signal_args.results();

    if rows.is_empty() {
        println!("No results for '{}'", args.query);
    } else {
        for (index, row) in rows.iter().enumerate() {
            let marker = if row.selectable { ' ' } else { '-' };
            if row.payload.is_empty() {
                println!("{index:3}{marker} [{}] {}", row.kind, row.label);
            } else {
                println!("{index:3}{marker} [{}] {} ({})", row.kind, row.label, row.payload);
            }
        }
    }

    if let Some(index) = args.activate {
        proxy.activate(index).await?;
    }

    Ok(())
}
