//! Single-flight credential refresh
//!
//! At most one refresh runs at a time. The first request to see an expired
//! credential starts it; every request that sees one while it is running
//! awaits the same shared future and gets the same outcome.
//!
//! The episode runs as its own task, so it settles even when every caller
//! waiting on it has been dropped.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Whether a refresh is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// How a refresh episode settled; every waiter of the episode sees the same value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Failed,
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    episode: u64,
    refresh: SharedRefresh,
}

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    in_flight: Mutex<Option<InFlight>>,
    episodes: AtomicU64,
}

/// Returns the coordinator to [`RefreshState::Idle`] when dropped.
///
/// The refresh future drops it as soon as the refresh call settles, so the
/// reset happens exactly once per episode whatever the outcome.
pub(crate) struct SettleGuard {
    coordinator: Weak<RefreshCoordinator>,
    episode: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            let mut slot = coordinator.slot();
            if slot.as_ref().is_some_and(|f| f.episode == self.episode) {
                *slot = None;
            }
        }
    }
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn state(&self) -> RefreshState {
        if self.slot().is_some() {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Number of refresh episodes started so far
    pub(crate) fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::SeqCst)
    }

    /// Await the in-flight refresh, starting one with `start` if none is running.
    ///
    /// `start` is only called when a new episode begins. The future it returns
    /// is spawned on the runtime and must drop the [`SettleGuard`] once the
    /// refresh call itself has settled.
    pub(crate) async fn run<F, Fut>(self: &Arc<Self>, start: F) -> RefreshOutcome
    where
        F: FnOnce(SettleGuard) -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let refresh = {
            let mut slot = self.slot();
            if let Some(in_flight) = slot.as_ref() {
                debug!(episode = in_flight.episode, "Waiting for in-flight refresh");
                in_flight.refresh.clone()
            } else {
                let episode = self.episodes.fetch_add(1, Ordering::SeqCst) + 1;
                let guard = SettleGuard {
                    coordinator: Arc::downgrade(self),
                    episode,
                };
                let task = tokio::spawn(start(guard));
                let refresh = async move {
                    task.await.unwrap_or_else(|e| {
                        error!(episode, "Refresh task aborted: {e}");
                        RefreshOutcome::Failed
                    })
                }
                .boxed()
                .shared();
                *slot = Some(InFlight {
                    episode,
                    refresh: refresh.clone(),
                });
                info!(episode, "Starting credential refresh");
                refresh
            }
        };

        refresh.await
    }

    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        // The slot is only touched in short non-panicking sections
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_episode() {
        let coordinator = RefreshCoordinator::new();
        let starts = Arc::new(AtomicUsize::new(0));

        let run = |outcome| {
            let coordinator = Arc::clone(&coordinator);
            let starts = Arc::clone(&starts);
            async move {
                coordinator
                    .run(move |guard| {
                        starts.fetch_add(1, Ordering::SeqCst);
                        async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            drop(guard);
                            outcome
                        }
                    })
                    .await
            }
        };

        // The second caller's outcome is never produced; it joins the first episode
        let (a, b, c) = tokio::join!(
            run(RefreshOutcome::Failed),
            run(RefreshOutcome::Refreshed),
            run(RefreshOutcome::Refreshed)
        );

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.episodes(), 1);
        assert_eq!([a, b, c], [RefreshOutcome::Failed; 3]);
        assert_eq!(coordinator.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_state_is_refreshing_until_guard_drops() {
        let coordinator = RefreshCoordinator::new();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .run(move |guard| async move {
                        let _ = release_rx.await;
                        drop(guard);
                        RefreshOutcome::Refreshed
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(coordinator.state(), RefreshState::Refreshing);

        release_tx.send(()).unwrap();
        assert_eq!(handle.await.unwrap(), RefreshOutcome::Refreshed);
        assert_eq!(coordinator.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_episode_settles_after_every_caller_is_gone() {
        let coordinator = RefreshCoordinator::new();
        let settled = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&settled);
        let caller = coordinator.run(move |guard| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
            seen.fetch_add(1, Ordering::SeqCst);
            RefreshOutcome::Failed
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(10), caller)
                .await
                .is_err()
        );
        assert_eq!(coordinator.state(), RefreshState::Refreshing);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(coordinator.state(), RefreshState::Idle);
        assert_eq!(settled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settled_episode_allows_a_new_one() {
        let coordinator = RefreshCoordinator::new();

        for expected in [RefreshOutcome::Failed, RefreshOutcome::Refreshed] {
            let outcome = coordinator
                .run(move |guard| async move {
                    drop(guard);
                    expected
                })
                .await;
            assert_eq!(outcome, expected);
            assert_eq!(coordinator.state(), RefreshState::Idle);
        }

        assert_eq!(coordinator.episodes(), 2);
    }
}
