//! Shared application state and the pure domain modules behind it.

pub mod broadcast;
pub mod progress;
pub mod scoring;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::progress_store::ProgressStore, error::ServiceError};

pub use self::broadcast::ScoreboardHub;

/// Cheaply clonable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the progress store handle, the
/// scoreboard broadcast hub, and the degraded-mode flag.
pub struct AppState {
    config: AppConfig,
    progress_store: RwLock<Option<Arc<dyn ProgressStore>>>,
    scoreboard: ScoreboardHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let scoreboard = ScoreboardHub::new(config.channel_capacity());
        Arc::new(Self {
            config,
            progress_store: RwLock::new(None),
            scoreboard,
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current progress store, if one is installed.
    pub async fn progress_store(&self) -> Option<Arc<dyn ProgressStore>> {
        let guard = self.progress_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the progress store or fail with the degraded-mode error.
    pub async fn require_progress_store(&self) -> Result<Arc<dyn ProgressStore>, ServiceError> {
        self.progress_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new progress store implementation and leave degraded mode.
    pub async fn install_progress_store(&self, store: Arc<dyn ProgressStore>) {
        {
            let mut guard = self.progress_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current progress store and enter degraded mode.
    pub async fn clear_progress_store(&self) {
        {
            let mut guard = self.progress_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        if self.is_degraded() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub distributing scoreboard snapshots per event.
    pub fn scoreboard(&self) -> &ScoreboardHub {
        &self.scoreboard
    }
}
