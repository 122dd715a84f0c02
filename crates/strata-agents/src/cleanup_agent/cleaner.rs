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

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use strata_core::runtime::ResourceRuntime;
use strata_core::{OwnerThread, ResourceResult};
use strata_data::WeakCacheStore;

/// How much work a cleanup pass does. Each level includes the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CleanupLevel {
    /// Sweep dead entries out of the cache.
    Low,
    /// Let the runtime release unreferenced resources, then sweep.
    Normal,
    /// Force a full collection in the runtime, then do a Normal pass.
    High,
}

impl CleanupLevel {
    /// All levels, cheapest first.
    pub const ALL: [CleanupLevel; 3] = [CleanupLevel::Low, CleanupLevel::Normal, CleanupLevel::High];

    fn index(self) -> usize {
        match self {
            CleanupLevel::Low => 0,
            CleanupLevel::Normal => 1,
            CleanupLevel::High => 2,
        }
    }
}

/// The state of one cleanup operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupState {
    /// Not running.
    #[default]
    Idle,
    /// Started and not yet finished.
    Running,
}

/// What a finished cleanup pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    /// The level that actually ran, which may be lower than the one requested.
    pub level: CleanupLevel,
    /// Resources the runtime let go of.
    pub released: usize,
    /// Dead cache entries evicted.
    pub evicted: usize,
}

type SharedCleanup = Shared<BoxFuture<'static, ResourceResult<CleanupReport>>>;

#[derive(Default, Clone, Copy)]
struct CleanupOperation {
    state: CleanupState,
    runs: u64,
}

struct RunningPass {
    id: u64,
    level: CleanupLevel,
    pass: Weak<CleanupPass>,
}

#[derive(Default)]
struct CleanerState {
    operations: [CleanupOperation; 3],
    running: Option<RunningPass>,
    next_pass: u64,
}

impl CleanerState {
    /// Returns the operation of pass `id` to Idle. No-op if `id` is no longer running.
    fn settle(&mut self, id: u64, completed: bool) -> bool {
        if !self.running.as_ref().is_some_and(|running| running.id == id) {
            return false;
        }
        let Some(running) = self.running.take() else {
            return false;
        };
        let operation = &mut self.operations[running.level.index()];
        operation.state = CleanupState::Idle;
        if completed {
            operation.runs += 1;
        }
        true
    }
}

/// One started pass, shared by every handle on it.
struct CleanupPass {
    id: u64,
    level: CleanupLevel,
    future: SharedCleanup,
    state: Weak<Mutex<CleanerState>>,
}

impl Drop for CleanupPass {
    fn drop(&mut self) {
        // Every handle is gone. A pass that never finished must not stay Running.
        let Some(state) = self.state.upgrade() else {
            return;
        };
        if state.lock().settle(self.id, false) {
            log::debug!(
                "TieredCleaner: {:?} cleanup abandoned before finishing",
                self.level
            );
        }
    }
}

/// A handle on a cleanup pass, possibly shared with other requesters.
///
/// The pass makes progress while a handle to it is awaited. If every handle
/// is dropped before the pass finishes, the pass is abandoned and its
/// operation returns to Idle.
#[derive(Clone)]
pub struct CleanupHandle {
    pass: Arc<CleanupPass>,
}

impl CleanupHandle {
    /// The level of the pass this handle follows.
    pub fn level(&self) -> CleanupLevel {
        self.pass.level
    }

    /// Waits for the pass to finish.
    pub async fn wait(self) -> ResourceResult<CleanupReport> {
        self.pass.future.clone().await
    }
}

/// Coordinates the three cleanup operations over a cache and a runtime.
///
/// At most one operation runs at a time. Requesting any level while one is
/// running returns a handle on the running one: a High request made during
/// a Low pass is not escalated, it just observes the Low pass finishing.
/// An operation returns to Idle in the same step that completes its future,
/// so a request made right after completion starts a fresh pass.
pub struct TieredCleaner {
    owner: OwnerThread,
    cache: Arc<WeakCacheStore>,
    runtime: Arc<dyn ResourceRuntime>,
    state: Arc<Mutex<CleanerState>>,
}

impl TieredCleaner {
    /// Creates a cleaner owned by the calling thread.
    pub fn new(cache: Arc<WeakCacheStore>, runtime: Arc<dyn ResourceRuntime>) -> Self {
        Self {
            owner: OwnerThread::current(),
            cache,
            runtime,
            state: Arc::new(Mutex::new(CleanerState::default())),
        }
    }

    /// Starts a pass at `level`, or joins the pass already running.
    pub fn request_cleanup(&self, level: CleanupLevel) -> ResourceResult<CleanupHandle> {
        self.owner.check("TieredCleaner::request_cleanup")?;

        let mut state = self.state.lock();
        if let Some(running) = &state.running {
            if let Some(pass) = running.pass.upgrade() {
                log::debug!(
                    "TieredCleaner: {level:?} requested while {:?} runs, joining it",
                    running.level
                );
                return Ok(CleanupHandle { pass });
            }
            let stale = running.id;
            state.settle(stale, false);
        }

        let id = state.next_pass;
        state.next_pass += 1;
        state.operations[level.index()].state = CleanupState::Running;
        let future = run_cleanup(
            id,
            level,
            self.cache.clone(),
            self.runtime.clone(),
            Arc::downgrade(&self.state),
        )
        .boxed()
        .shared();
        let pass = Arc::new(CleanupPass {
            id,
            level,
            future,
            state: Arc::downgrade(&self.state),
        });
        state.running = Some(RunningPass {
            id,
            level,
            pass: Arc::downgrade(&pass),
        });
        log::info!("TieredCleaner: Starting {level:?} cleanup");

        Ok(CleanupHandle { pass })
    }

    /// The current state of the operation for `level`.
    pub fn state(&self, level: CleanupLevel) -> CleanupState {
        self.state.lock().operations[level.index()].state
    }

    /// The level currently running, if any.
    pub fn running_level(&self) -> Option<CleanupLevel> {
        self.state.lock().running.as_ref().map(|running| running.level)
    }

    /// How many times the operation for `level` has finished.
    pub fn completed_runs(&self, level: CleanupLevel) -> u64 {
        self.state.lock().operations[level.index()].runs
    }
}

async fn run_cleanup(
    id: u64,
    level: CleanupLevel,
    cache: Arc<WeakCacheStore>,
    runtime: Arc<dyn ResourceRuntime>,
    state: Weak<Mutex<CleanerState>>,
) -> ResourceResult<CleanupReport> {
    let mut released = 0;
    if level >= CleanupLevel::High {
        released += runtime.collect().await;
    }
    if level >= CleanupLevel::Normal {
        released += runtime.release_unused().await;
    }
    let swept = cache.sweep_unreferenced();

    if let Some(state) = state.upgrade() {
        state.lock().settle(id, true);
    }

    let evicted = swept?;
    log::info!(
        "TieredCleaner: Finished {level:?} cleanup ({released} released, {evicted} evicted)"
    );
    Ok(CleanupReport {
        level,
        released,
        evicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strata_core::resource::ResourceRef;

    #[derive(Default)]
    struct CountingRuntime {
        releases: AtomicUsize,
        collections: AtomicUsize,
    }

    #[async_trait]
    impl ResourceRuntime for CountingRuntime {
        fn adopt(&self, _resource: &ResourceRef) {}

        async fn release_unused(&self) -> usize {
            self.releases.fetch_add(1, Ordering::SeqCst);
            0
        }

        async fn collect(&self) -> usize {
            self.collections.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    fn cleaner() -> (TieredCleaner, Arc<CountingRuntime>) {
        let runtime = Arc::new(CountingRuntime::default());
        let cleaner = TieredCleaner::new(Arc::new(WeakCacheStore::new()), runtime.clone());
        (cleaner, runtime)
    }

    #[tokio::test]
    async fn test_high_runs_every_tier() {
        let (cleaner, runtime) = cleaner();
        let report = cleaner
            .request_cleanup(CleanupLevel::High)
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(report.level, CleanupLevel::High);
        assert_eq!(runtime.collections.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.releases.load(Ordering::SeqCst), 1);
        assert_eq!(cleaner.completed_runs(CleanupLevel::High), 1);
    }

    #[tokio::test]
    async fn test_low_never_touches_the_runtime() {
        let (cleaner, runtime) = cleaner();
        cleaner
            .request_cleanup(CleanupLevel::Low)
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(runtime.releases.load(Ordering::SeqCst), 0);
        assert_eq!(runtime.collections.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_running_pass_is_shared_without_escalation() {
        let (cleaner, runtime) = cleaner();
        let low = cleaner.request_cleanup(CleanupLevel::Low).unwrap();
        assert_eq!(cleaner.state(CleanupLevel::Low), CleanupState::Running);

        let high = cleaner.request_cleanup(CleanupLevel::High).unwrap();
        assert_eq!(high.level(), CleanupLevel::Low);
        assert_eq!(cleaner.state(CleanupLevel::High), CleanupState::Idle);

        let (a, b) = tokio::join!(low.wait(), high.wait());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(runtime.collections.load(Ordering::SeqCst), 0);
        assert_eq!(cleaner.completed_runs(CleanupLevel::Low), 1);
        assert_eq!(cleaner.running_level(), None);
    }

    #[tokio::test]
    async fn test_dropped_handle_abandons_the_pass() {
        let (cleaner, runtime) = cleaner();
        drop(cleaner.request_cleanup(CleanupLevel::High).unwrap());
        assert_eq!(cleaner.state(CleanupLevel::High), CleanupState::Idle);
        assert_eq!(cleaner.running_level(), None);

        // The next request starts its own level instead of joining a dead High pass.
        let low = cleaner.request_cleanup(CleanupLevel::Low).unwrap();
        assert_eq!(low.level(), CleanupLevel::Low);
        assert_eq!(low.wait().await.unwrap().level, CleanupLevel::Low);
        assert_eq!(runtime.collections.load(Ordering::SeqCst), 0);
        assert_eq!(cleaner.completed_runs(CleanupLevel::High), 0);
        assert_eq!(cleaner.completed_runs(CleanupLevel::Low), 1);
    }

    #[tokio::test]
    async fn test_pass_survives_while_any_handle_remains() {
        let (cleaner, _) = cleaner();
        let first = cleaner.request_cleanup(CleanupLevel::Normal).unwrap();
        let second = cleaner.request_cleanup(CleanupLevel::Low).unwrap();
        drop(first);

        assert_eq!(cleaner.running_level(), Some(CleanupLevel::Normal));
        assert_eq!(second.wait().await.unwrap().level, CleanupLevel::Normal);
        assert_eq!(cleaner.state(CleanupLevel::Normal), CleanupState::Idle);
        assert_eq!(cleaner.completed_runs(CleanupLevel::Normal), 1);
    }
}
