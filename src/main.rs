//! Slotcache demo
//!
//! Loads a handful of user profiles through a `StructLoader` backed by a
//! slow in-process directory, with several tasks racing for the same keys.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slotcache::error::BoxError;
use slotcache::loader::{hash_key, StructSource};
use slotcache::{CacheConfig, StructLoader};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Profile {
    name: String,
    team: String,
}

/// Stand-in for a remote user directory with noticeable latency.
struct Directory {
    profiles: HashMap<u64, Profile>,
    latency: Duration,
}

impl Directory {
    fn new(latency: Duration) -> Self {
        let profiles = [("ada", "compilers"), ("grace", "runtime"), ("linus", "kernel")]
            .into_iter()
            .map(|(name, team)| {
                let profile = Profile {
                    name: name.to_string(),
                    team: team.to_string(),
                };
                (hash_key(name), profile)
            })
            .collect();

        Self { profiles, latency }
    }
}

impl StructSource<Profile> for Directory {
    fn fetch(&self, key: u64) -> impl Future<Output = Result<Option<Profile>, BoxError>> + Send {
        let profile = self.profiles.get(&key).cloned();
        let latency = self.latency;
        async move {
            tokio::time::sleep(latency).await;
            Ok(profile)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: max_items={}, lifetime={}s, max_record_size={}, add_empty_values={}",
        config.max_items, config.lifetime, config.max_record_size, config.add_empty_values
    );

    let loader: Arc<StructLoader<Profile, _>> = Arc::new(StructLoader::new(
        &config,
        Directory::new(Duration::from_millis(50)),
    )?);

    // Two rounds: the first fills the cache, the second is served from it
    for round in 1..=2 {
        let mut tasks = JoinSet::new();
        for name in ["ada", "grace", "ada", "linus", "nobody", "grace"] {
            let loader = Arc::clone(&loader);
            tasks.spawn(async move { (name, loader.load(hash_key(name)).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            let (name, result) = joined?;
            match result {
                Ok(Some(profile)) => info!("round {}: {} -> {:?}", round, name, profile),
                Ok(None) => info!("round {}: {} -> not available", round, name),
                Err(e) => warn!("round {}: {} failed: {}", round, name, e),
            }
        }
    }

    let stats = loader.stats().await;
    info!("Cache stats: {}", serde_json::to_string(&stats)?);

    Ok(())
}
