// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use std::sync::Arc;

use common::{init_logger, CountingLoader, FixedResolver, Text};
use strata_agents::{CleanupLevel, CleanupState, ResourceAgent};
use strata_core::resource::ResourceKey;
use strata_core::ResourceConfig;
use strata_data::RetentionPool;

#[tokio::test]
async fn test_normal_request_joins_running_low_then_starts_fresh() -> anyhow::Result<()> {
    init_logger();
    let pool = Arc::new(RetentionPool::new());
    let agent = ResourceAgent::with_runtime(ResourceConfig::default(), pool.clone());
    let cleaner = agent.cleaner();

    // --- Low is running: a Normal request observes Low ---
    let low = agent.request_cleanup(CleanupLevel::Low)?;
    let joined = agent.request_cleanup(CleanupLevel::Normal)?;
    assert_eq!(joined.level(), CleanupLevel::Low);
    assert_eq!(cleaner.state(CleanupLevel::Normal), CleanupState::Idle);

    let report = joined.wait().await?;
    assert_eq!(report.level, CleanupLevel::Low);
    assert_eq!(low.wait().await?, report);
    assert_eq!(cleaner.state(CleanupLevel::Low), CleanupState::Idle);
    assert_eq!(cleaner.completed_runs(CleanupLevel::Normal), 0);

    // --- Right after completion, Normal starts fresh ---
    let normal = agent.request_cleanup(CleanupLevel::Normal)?;
    assert_eq!(normal.level(), CleanupLevel::Normal);
    assert_eq!(cleaner.running_level(), Some(CleanupLevel::Normal));
    assert_eq!(normal.wait().await?.level, CleanupLevel::Normal);
    assert_eq!(cleaner.completed_runs(CleanupLevel::Normal), 1);
    assert_eq!(cleaner.completed_runs(CleanupLevel::Low), 1);
    Ok(())
}

#[tokio::test]
async fn test_tiers_release_retained_resources() -> anyhow::Result<()> {
    init_logger();
    let loader = Arc::new(CountingLoader::default());
    let pool = Arc::new(RetentionPool::new());
    let agent = ResourceAgent::with_runtime(ResourceConfig::default(), pool.clone());
    agent.register_resolver(FixedResolver::new("resources", loader.clone()))?;

    let kept = agent.load::<Text>("res://resources/kept").await?;
    drop(agent.load::<Text>("res://resources/dropped").await?);
    assert_eq!(pool.resident_count(), 2);

    // The pool still owns the dropped resource, so Low finds nothing dead.
    let low = agent.request_cleanup(CleanupLevel::Low)?.wait().await?;
    assert_eq!(low.evicted, 0);
    assert!(agent.get_cached("res://resources/dropped")?.is_some());

    // Normal lets the pool release it, then sweeps the dead entry.
    let normal = agent.request_cleanup(CleanupLevel::Normal)?.wait().await?;
    assert_eq!(normal.released, 1);
    assert_eq!(normal.evicted, 1);
    assert_eq!(
        loader.lost(),
        vec![ResourceKey::parse("res://resources/dropped")?.id()]
    );

    // High drops every retention; the kept handle alone keeps its resource alive.
    let high = agent.request_cleanup(CleanupLevel::High)?.wait().await?;
    assert_eq!(high.released, 1);
    assert_eq!(high.evicted, 0);
    assert_eq!(pool.resident_count(), 0);
    assert!(agent.get_cached("res://resources/kept")?.is_some());

    drop(kept);
    let low = agent.request_cleanup(CleanupLevel::Low)?.wait().await?;
    assert_eq!(low.evicted, 1);
    assert!(agent.cache().is_empty());
    Ok(())
}
