//! Vision backend lifecycle.
//!
//! The backend must finish an asynchronous load before any analysis runs.
//! [`VisionRuntime`] owns that load and publishes its progress as a
//! [`Readiness`] value on a watch channel. The state only moves
//! `Uninitialized -> Loading -> Ready | Failed`, and the initializer runs at
//! most once per runtime; retrying means building a new runtime.

use std::sync::{Arc, OnceLock};

use strum::{Display, IntoStaticStr};
use tokio::sync::watch;
use tracing::{error, info};

use crate::{
    algorithms::{HsvTables, TableHsvConverter},
    error::{LeafDiagError, Result},
};

#[derive(Debug, Clone, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Readiness {
    Uninitialized,
    Loading,
    Ready,
    Failed(String),
}

impl Readiness {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

/// Resources produced by a successful load.
#[derive(Debug)]
pub struct VisionBackend {
    tables: Arc<HsvTables>,
}

impl VisionBackend {
    pub fn initialize() -> Result<Self> {
        Ok(Self::with_tables(HsvTables::build()))
    }

    pub fn with_tables(tables: HsvTables) -> Self {
        Self { tables: Arc::new(tables) }
    }

    pub fn converter(&self) -> TableHsvConverter {
        TableHsvConverter::new(Arc::clone(&self.tables))
    }
}

#[derive(Debug)]
pub struct VisionRuntime {
    state: Arc<watch::Sender<Readiness>>,
    backend: Arc<OnceLock<Arc<VisionBackend>>>,
}

impl VisionRuntime {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Readiness::Uninitialized);
        Self {
            state: Arc::new(state),
            backend: Arc::new(OnceLock::new()),
        }
    }

    /// Build a runtime and wait for the default backend to load.
    pub async fn load_default() -> Result<Arc<Self>> {
        let runtime = Arc::new(Self::new());
        runtime.load().await?;
        Ok(runtime)
    }

    pub fn readiness(&self) -> Readiness {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.state.borrow() == Readiness::Ready
    }

    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.state.subscribe()
    }

    /// The loaded backend, or `NotReady` before the load has resolved.
    pub fn backend(&self) -> Result<Arc<VisionBackend>> {
        match self.backend.get() {
            Some(backend) if self.is_ready() => Ok(Arc::clone(backend)),
            _ => Err(LeafDiagError::NotReady),
        }
    }

    pub async fn load(&self) -> Result<()> {
        self.load_with(VisionBackend::initialize).await
    }

    /// Run `init` on the blocking pool if no load has started yet, then wait
    /// for the load to resolve.
    ///
    /// The load is driven by a detached task, so dropping this future (for
    /// example on a timeout) does not leave the runtime stuck in `Loading`.
    pub async fn load_with<F>(&self, init: F) -> Result<()>
    where
        F: FnOnce() -> Result<VisionBackend> + Send + 'static,
    {
        let claimed = self.state.send_if_modified(|state| {
            if *state == Readiness::Uninitialized {
                *state = Readiness::Loading;
                true
            } else {
                false
            }
        });

        if claimed {
            info!("Loading vision backend");
            let state = Arc::clone(&self.state);
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                let outcome = match tokio::task::spawn_blocking(init).await {
                    Ok(outcome) => outcome,
                    Err(join_error) => Err(LeafDiagError::InitializationFailed(join_error.to_string())),
                };
                publish(&state, &backend, outcome);
            });
        }

        self.wait_ready().await
    }

    /// Resolve once the load has finished. Does not start a load by itself.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut receiver = self.state.subscribe();
        let resolved = receiver
            .wait_for(Readiness::is_resolved)
            .await
            .map_err(|_| LeafDiagError::NotReady)?
            .clone();

        match resolved {
            Readiness::Failed(reason) => Err(LeafDiagError::InitializationFailed(reason)),
            _ => Ok(()),
        }
    }
}

fn publish(
    state: &watch::Sender<Readiness>,
    slot: &OnceLock<Arc<VisionBackend>>,
    outcome: Result<VisionBackend>,
) {
    match outcome {
        Ok(backend) => {
            let _ = slot.set(Arc::new(backend));
            state.send_replace(Readiness::Ready);
            info!("Vision backend ready");
        }
        Err(err) => {
            let reason = match err {
                LeafDiagError::InitializationFailed(reason) => reason,
                other => other.to_string(),
            };
            error!("Vision backend failed to load: {}", reason);
            state.send_replace(Readiness::Failed(reason));
        }
    }
}

impl Default for VisionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let runtime = VisionRuntime::new();
        assert_eq!(runtime.readiness(), Readiness::Uninitialized);
        assert!(!runtime.is_ready());
        assert!(matches!(runtime.backend(), Err(LeafDiagError::NotReady)));
    }

    #[tokio::test]
    async fn test_load_resolves_ready() {
        let runtime = VisionRuntime::new();
        runtime.load().await.expect("Should load");

        assert_eq!(runtime.readiness(), Readiness::Ready);
        assert!(runtime.backend().is_ok());
    }

    #[tokio::test]
    async fn test_failed_load_is_terminal() {
        let runtime = VisionRuntime::new();
        let err = runtime
            .load_with(|| Err(LeafDiagError::InitializationFailed("missing tables".into())))
            .await
            .unwrap_err();

        assert!(matches!(err, LeafDiagError::InitializationFailed(ref r) if r == "missing tables"));
        assert_eq!(runtime.readiness(), Readiness::Failed("missing tables".into()));
        assert!(matches!(runtime.backend(), Err(LeafDiagError::NotReady)));

        // a second load does not retry
        assert!(runtime.load().await.is_err());
        assert!(!runtime.is_ready());
    }

    #[tokio::test]
    async fn test_initializer_runs_once() {
        let runtime = Arc::new(VisionRuntime::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let runtime = Arc::clone(&runtime);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                runtime
                    .load_with(move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        VisionBackend::initialize()
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("task should not panic").expect("Should load");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(runtime.is_ready());
    }

    #[tokio::test]
    async fn test_abandoned_load_still_resolves() {
        let runtime = VisionRuntime::new();
        let slow_init = || {
            std::thread::sleep(Duration::from_millis(200));
            VisionBackend::initialize()
        };

        let abandoned = timeout(Duration::from_millis(20), runtime.load_with(slow_init)).await;
        assert!(abandoned.is_err(), "load should still be running");
        assert_eq!(runtime.readiness(), Readiness::Loading);

        timeout(Duration::from_secs(5), runtime.load())
            .await
            .expect("load should resolve after the caller gave up")
            .expect("Should load");
        assert!(runtime.readiness().is_resolved());
        assert!(runtime.backend().is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let runtime = Arc::new(VisionRuntime::new());
        let mut receiver = runtime.subscribe();

        let loader = Arc::clone(&runtime);
        tokio::spawn(async move { loader.load().await });

        let state = receiver
            .wait_for(Readiness::is_resolved)
            .await
            .expect("sender alive")
            .clone();
        assert_eq!(state, Readiness::Ready);
    }

    #[test]
    fn test_readiness_names() {
        assert_eq!(Readiness::Uninitialized.to_string(), "uninitialized");
        assert_eq!(Readiness::Failed("x".into()).to_string(), "failed");
    }
}
