//! Request Cycle Example
//!
//! Simulates three requests of a long-lived worker sharing one file
//! backend: a reusable aggregated cache for small per-request lookups,
//! a persistent cache for a larger report, and a transient cache for
//! request-scoped objects.
//!
//! Run with: cargo run --example request_cycle

use eager_cache::{
    BackendFactory, CacheValue, PersistOutcome, PersistentCache, ReusableAggregatedCache,
    TransientCache,
};
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Stand-in for a slow lookup the cache should avoid
fn load_plugin_list() -> serde_json::Value {
    json!(["CoreHome", "Goals", "Ecommerce"])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eager_cache=debug,request_cycle=info")),
        )
        .init();

    println!("=== Eager Cache: Request Cycle ===\n");

    let directory = std::env::temp_dir().join("eager-cache-demo");
    let factory = BackendFactory::new();
    let backend = factory
        .build_backend(
            "chained",
            &json!({
                "backends": ["memory", "file"],
                "file": {"directory": directory}
            }),
        )
        .await?;

    let persistent = PersistentCache::new(backend.clone());
    let mut eager = ReusableAggregatedCache::new();

    for request in 1..=3 {
        println!("--- Request {request} ---");
        eager.populate(backend.clone(), "eagercache").await?;

        let plugins = match eager.get("plugins")?.cloned() {
            Some(plugins) => {
                println!("✅ plugins from aggregated cache: {plugins}");
                plugins
            }
            None => {
                let plugins = load_plugin_list();
                println!("❌ plugins computed: {plugins}");
                eager.set("plugins", plugins.clone())?;
                plugins
            }
        };
        eager.set("last_request", i64::from(request))?;

        let transient = TransientCache::in_memory();
        transient
            .save("request_plugins", CacheValue::object(plugins))
            .await?;

        if persistent.get("report.daily").await?.is_none() {
            persistent
                .set("report.daily", json!({"visits": 1200, "request": request}), Duration::from_secs(3600))
                .await?;
            println!("Stored daily report");
        }

        match eager.persist_if_needed(Duration::from_secs(43_200)).await? {
            PersistOutcome::Saved => println!("Persisted aggregated cache"),
            PersistOutcome::Clean => println!("Aggregated cache unchanged"),
            PersistOutcome::Rejected => println!("Backend refused the aggregated cache"),
        }
        info!(request, keys = eager.len(), "Request finished");
        println!();
    }

    eager.flush_all().await?;
    persistent.flush_all().await?;
    println!("Flushed demo cache in {}", directory.display());

    Ok(())
}
