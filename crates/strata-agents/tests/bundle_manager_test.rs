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

use common::{catalog, init_logger, no_deps, MemoryStorage};
use strata_agents::BundleManager;
use strata_core::bundle::BundleInfo;
use strata_core::ResourceError;

fn b_with_two_deps() -> Vec<BundleInfo> {
    vec![
        BundleInfo::new("b", ["d1", "d2"]),
        no_deps("d1"),
        no_deps("d2"),
    ]
}

#[tokio::test]
async fn test_dependencies_are_held_once_per_context() -> anyhow::Result<()> {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(storage.clone(), catalog(b_with_two_deps()));

    // --- First open: everything is opened once ---
    let first = manager.open_by_name("b").await?;
    assert_eq!(manager.ref_count("b"), Some(1));
    assert_eq!(manager.ref_count("d1"), Some(1));
    assert_eq!(manager.ref_count("d2"), Some(1));

    // --- Second open: only B's count moves, no backend call ---
    let second = manager.open_by_name("b").await?;
    assert!(first.ptr_eq(&second));
    assert_eq!(manager.ref_count("b"), Some(2));
    assert_eq!(manager.ref_count("d1"), Some(1));
    assert_eq!(manager.ref_count("d2"), Some(1));
    assert_eq!(storage.opens("b"), 1);
    assert_eq!(storage.opens("d1"), 1);
    Ok(())
}

#[tokio::test]
async fn test_release_cascades_exactly_once() -> anyhow::Result<()> {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(storage.clone(), catalog(b_with_two_deps()));
    let handle = manager.open_by_name("b").await?;
    manager.open_by_name("b").await?;

    assert!(manager.release(&handle)?);
    assert_eq!(manager.ref_count("b"), Some(1));
    assert_eq!(storage.closes("b"), 0);
    assert_eq!(manager.ref_count("d1"), Some(1));

    assert!(manager.release(&handle)?);
    assert_eq!(manager.ref_count("b"), None);
    assert_eq!(storage.closes("b"), 1);
    assert_eq!(storage.closes("d1"), 1);
    assert_eq!(storage.closes("d2"), 1);
    assert!(manager.open_bundles().is_empty());

    // A third release finds nothing.
    assert!(!manager.release(&handle)?);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_opens_share_one_backend_call() -> anyhow::Result<()> {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(storage.clone(), catalog(b_with_two_deps()));
    let info = manager.bundle_info("b").expect("b is in the catalog");

    let (a, b) = tokio::join!(manager.open(&info), manager.open(&info));
    let (a, b) = (a?, b?);

    assert!(a.ptr_eq(&b));
    assert_eq!(storage.opens("b"), 1);
    assert_eq!(storage.opens("d1"), 1);
    assert_eq!(manager.ref_count("b"), Some(2));
    assert_eq!(manager.ref_count("d1"), Some(1));
    assert!(!manager.is_opening("b"));
    Ok(())
}

#[tokio::test]
async fn test_cycles_are_detected_before_opening() {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(
        storage.clone(),
        catalog(vec![
            BundleInfo::new("a", ["b"]),
            BundleInfo::new("b", ["c"]),
            BundleInfo::new("c", ["a"]),
            BundleInfo::new("selfish", ["selfish"]),
        ]),
    );

    assert_eq!(
        manager.open_by_name("a").await.unwrap_err(),
        ResourceError::CyclicDependency(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string()
        ])
    );
    assert!(matches!(
        manager.open_by_name("selfish").await,
        Err(ResourceError::CyclicDependency(_))
    ));
    assert_eq!(storage.opens("a") + storage.opens("b") + storage.opens("c"), 0);
}

#[tokio::test]
async fn test_diamond_is_not_a_cycle() -> anyhow::Result<()> {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(
        storage.clone(),
        catalog(vec![
            BundleInfo::new("top", ["left", "right"]),
            BundleInfo::new("left", ["base"]),
            BundleInfo::new("right", ["base"]),
            no_deps("base"),
        ]),
    );

    let top = manager.open_by_name("top").await?;
    assert_eq!(manager.ref_count("base"), Some(2));
    assert_eq!(storage.opens("base"), 1);

    manager.release(&top)?;
    assert!(manager.open_bundles().is_empty());
    assert_eq!(storage.closes("base"), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_backend_open_rolls_back() {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(
        storage.clone(),
        catalog(vec![BundleInfo::new("corrupt", ["d1"]), no_deps("d1")]),
    );

    let (a, b) = tokio::join!(
        manager.open_by_name("corrupt"),
        manager.open_by_name("corrupt")
    );
    assert!(matches!(a, Err(ResourceError::Backend(_))));
    assert!(matches!(b, Err(ResourceError::Backend(_))));
    assert_eq!(storage.opens("corrupt"), 1);
    assert!(manager.open_bundles().is_empty());
    assert_eq!(storage.closes("d1"), 1);
}

#[tokio::test]
async fn test_not_installed_dependency_fails_the_whole_open() {
    init_logger();
    let storage = Arc::new(MemoryStorage {
        missing: vec!["d2".to_string()],
        ..Default::default()
    });
    let manager = BundleManager::new(storage.clone(), catalog(b_with_two_deps()));

    assert_eq!(
        manager.open_by_name("b").await.unwrap_err(),
        ResourceError::NotInstalled("d2".to_string())
    );
    assert_eq!(storage.opens("b"), 0);
    assert_eq!(storage.closes("d1"), 1);
    assert!(manager.open_bundles().is_empty());
}

#[tokio::test]
async fn test_release_from_another_thread_is_rejected() -> anyhow::Result<()> {
    init_logger();
    let storage = Arc::new(MemoryStorage::default());
    let manager = BundleManager::new(storage, catalog(vec![no_deps("solo")]));
    let handle = manager.open_by_name("solo").await?;

    let remote = manager.clone();
    let result = std::thread::spawn(move || remote.release(&handle))
        .join()
        .expect("release thread panicked");

    assert!(matches!(result, Err(ResourceError::WrongThread { .. })));
    assert_eq!(manager.ref_count("solo"), Some(1));
    Ok(())
}
