//! Lazily loaded, process-wide model handle.
//!
//! The model is expensive to load, so it is built on first use and then
//! shared by every request for the life of the process.
//!
//! # States
//!
//! ```text
//!                 ensure_loaded()
//! Uninitialized ─────────────────▶ Loading ──ok──▶ Ready (terminal)
//!        ▲                          │
//!        │                          err
//!        │                          ▼
//!        └──── next ensure_loaded ─ Failed(reason)
//! ```
//!
//! The transition into `Loading` is a check-and-set under the mutex, so at
//! most one load runs at any time. Callers arriving while a load is in flight
//! return immediately and see the model as unavailable; they never start a
//! second load. The load itself runs on the blocking pool and records its own
//! outcome, so a caller that gives up waiting cannot leave the handle stuck
//! in `Loading`.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::error::{Error, Result};

use super::provider::SharedProvider;
use super::types::LoadStatus;

type Loader = Box<dyn Fn() -> Result<SharedProvider> + Send + Sync>;

enum Slot {
    Uninitialized,
    Loading,
    Ready(SharedProvider),
    Failed(String),
}

struct Inner {
    slot: Mutex<Slot>,
    loader: Loader,
    attempts: AtomicUsize,
}

/// Shared model handle. Cheap to clone; all clones see the same model.
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<Inner>,
}

impl ModelHandle {
    /// Create an uninitialized handle that will build its model with `loader`.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<SharedProvider> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot::Uninitialized),
                loader: Box::new(loader),
                attempts: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a handle that is already `Ready` with `provider`.
    pub fn preloaded(provider: SharedProvider) -> Self {
        let handle = Self::new(|| Err(Error::Other("preloaded handle has no loader".into())));
        *handle.inner.lock() = Slot::Ready(provider);
        handle
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        match &*self.inner.lock() {
            Slot::Uninitialized => LoadStatus::Uninitialized,
            Slot::Loading => LoadStatus::Loading,
            Slot::Ready(_) => LoadStatus::Ready,
            Slot::Failed(reason) => LoadStatus::Failed(reason.clone()),
        }
    }

    /// The loaded provider, if the handle is `Ready`.
    #[must_use]
    pub fn provider(&self) -> Option<SharedProvider> {
        match &*self.inner.lock() {
            Slot::Ready(provider) => Some(Arc::clone(provider)),
            _ => None,
        }
    }

    /// The loaded provider, or `ModelUnavailable`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ModelUnavailable` unless the handle is `Ready`.
    pub fn require(&self) -> Result<SharedProvider> {
        self.provider().ok_or(Error::ModelUnavailable)
    }

    /// Number of load attempts started so far.
    #[must_use]
    pub fn load_attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Start a load if none has succeeded and none is in flight, and wait
    /// for it. Returns the state afterwards.
    ///
    /// Never fails: a failed load is logged and recorded as `Failed`, and the
    /// next call tries again.
    pub async fn ensure_loaded(&self) -> LoadStatus {
        if !self.inner.begin_load() {
            return self.status();
        }

        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || inner.run_load()).await {
            // run_load catches loader panics, so this only fires on runtime shutdown.
            self.inner
                .finish_load(Err(Error::Other(format!("Model load task failed: {e}"))));
        }

        self.status()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check-and-set into `Loading`. Returns true if the caller owns the load.
    fn begin_load(&self) -> bool {
        let mut slot = self.lock();
        match *slot {
            Slot::Uninitialized | Slot::Failed(_) => {
                *slot = Slot::Loading;
                self.attempts.fetch_add(1, Ordering::SeqCst);
                true
            }
            Slot::Loading | Slot::Ready(_) => false,
        }
    }

    fn run_load(&self) {
        tracing::info!("Loading embedding model...");
        let started = Instant::now();

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| (self.loader)()))
            .unwrap_or_else(|_| Err(Error::Other("Model loader panicked".into())));

        if let Ok(provider) = &result {
            let info = provider.info();
            tracing::info!(
                model = %info.model,
                dimensions = info.dimensions,
                elapsed_ms = started.elapsed().as_millis(),
                "Model loaded successfully"
            );
        }

        self.finish_load(result);
    }

    fn finish_load(&self, result: Result<SharedProvider>) {
        let mut slot = self.lock();
        if !matches!(*slot, Slot::Loading) {
            return;
        }

        *slot = match result {
            Ok(provider) => Slot::Ready(provider),
            Err(e) => {
                tracing::error!("Failed to load model: {e}");
                Slot::Failed(e.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::provider::EmbeddingProvider;
    use crate::embeddings::types::ProviderInfo;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    struct Fixed;

    impl EmbeddingProvider for Fixed {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "fixed".into(),
                model: "fixed".into(),
                dimensions: 2,
            }
        }

        fn generate_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn fixed() -> Result<SharedProvider> {
        Ok(Arc::new(Fixed))
    }

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let handle = ModelHandle::new(fixed);
        assert_eq!(handle.status(), LoadStatus::Uninitialized);
        assert!(handle.provider().is_none());
        assert!(matches!(handle.require(), Err(Error::ModelUnavailable)));
        assert_eq!(handle.load_attempts(), 0);
    }

    #[tokio::test]
    async fn test_loads_once_then_reuses() {
        let handle = ModelHandle::new(fixed);

        assert_eq!(handle.ensure_loaded().await, LoadStatus::Ready);
        assert_eq!(handle.ensure_loaded().await, LoadStatus::Ready);
        assert_eq!(handle.ensure_loaded().await, LoadStatus::Ready);

        assert_eq!(handle.load_attempts(), 1);
        assert!(handle.require().is_ok());
    }

    #[tokio::test]
    async fn test_failure_is_retried_on_next_call() {
        let fail = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&fail);
        let handle = ModelHandle::new(move || {
            if flag.load(Ordering::SeqCst) {
                Err(Error::Embedding("disk on fire".into()))
            } else {
                fixed()
            }
        });

        let status = handle.ensure_loaded().await;
        assert!(matches!(status, LoadStatus::Failed(ref r) if r.contains("disk on fire")));
        assert!(handle.provider().is_none());

        let status = handle.ensure_loaded().await;
        assert!(status.needs_load());
        assert_eq!(handle.load_attempts(), 2);

        fail.store(false, Ordering::SeqCst);
        assert_eq!(handle.ensure_loaded().await, LoadStatus::Ready);
        assert_eq!(handle.load_attempts(), 3);
    }

    #[tokio::test]
    async fn test_panicking_loader_is_recorded_as_failure() {
        let handle = ModelHandle::new(|| panic!("loader blew up"));

        let status = handle.ensure_loaded().await;
        assert!(matches!(status, LoadStatus::Failed(ref r) if r.contains("panicked")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_start_one_load() {
        let handle = ModelHandle::new(|| {
            std::thread::sleep(Duration::from_millis(200));
            fixed()
        });

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move { h.ensure_loaded().await }));
        }

        let mut saw_ready = false;
        for task in tasks {
            let status = task.await.unwrap();
            assert!(matches!(status, LoadStatus::Loading | LoadStatus::Ready));
            saw_ready |= status == LoadStatus::Ready;
        }

        assert!(saw_ready);
        assert_eq!(handle.load_attempts(), 1);
        assert_eq!(handle.status(), LoadStatus::Ready);
    }

    #[tokio::test]
    async fn test_preloaded_never_loads() {
        let handle = ModelHandle::preloaded(Arc::new(Fixed));
        assert_eq!(handle.ensure_loaded().await, LoadStatus::Ready);
        assert_eq!(handle.load_attempts(), 0);
    }
}
