//! mcache demo
//!
//! Walks through the basic cache operations and a hit-or-miss memoization
//! loop. Cache settings come from `MCACHE_*` environment variables.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcache::{Cache, CacheConfig, CacheError};

#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcache=info,mcache_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: initial_capacity={}, cleanup_interval={:?}",
        config.initial_capacity, config.cleanup_interval
    );

    basic_demo(&config).await?;
    hit_or_miss_demo(&config).await?;

    Ok(())
}

// == Basic Demo ==
async fn basic_demo(config: &CacheConfig) -> Result<()> {
    info!("Demo 1: basic operations");

    let cache: Cache<String> =
        Cache::from_config(config).context("failed to build cache")?;

    cache.set("save indefinitely", "value without expiration".into(), None)?;
    cache.set(
        "save for 1 second",
        "value will expire in 1 second".into(),
        Some(Duration::from_secs(1)),
    )?;

    match cache.has("no such key") {
        Ok(exists) => info!("\"no such key\" exists: {}", exists),
        Err(err) => info!(
            "\"no such key\": {} (not found: {})",
            err,
            err == CacheError::KeyNotFound
        ),
    }

    let value = cache.get("save indefinitely")?;
    info!("\"save indefinitely\" = {}", value);

    if let Err(err) = cache.set("save indefinitely", "overwrite attempt".into(), None) {
        info!("Overwriting a live key is rejected: {}", err);
    }

    tokio::time::sleep(Duration::from_millis(1100)).await;

    match cache.get("save for 1 second") {
        Ok(value) => warn!("\"save for 1 second\" unexpectedly alive: {}", value),
        Err(err) => info!(
            "\"save for 1 second\" after 1+ second pause: {} (expired: {})",
            err,
            err == CacheError::Expired
        ),
    }

    info!("Stats: {}", serde_json::to_string(&cache.stats())?);
    Ok(())
}

// == Hit Or Miss Demo ==
async fn expensive_call() -> String {
    tokio::time::sleep(Duration::from_millis(500)).await;
    "expensive result".to_string()
}

/// The expensive call runs once; every later iteration is a cache hit.
async fn hit_or_miss_demo(config: &CacheConfig) -> Result<()> {
    info!("Demo 2: hit or miss");

    let cache: Cache<String> =
        Cache::from_config(config).context("failed to build cache")?;

    for _ in 0..10 {
        match cache.get("expensive value") {
            Ok(value) => info!("cache hit - {}", value),
            Err(err) if err.is_unavailable() => {
                info!("cache miss, calling expensive_call");
                let value = expensive_call().await;
                cache.set("expensive value", value, None)?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let stats = cache.stats();
    info!(
        "hits={} misses={} hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.hit_rate()
    );
    Ok(())
}
