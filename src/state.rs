//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the typed config, the shared HTTP client, the directory seam used by
//! the doctor desk, the compiled page templates, and a map of live desks
//! keyed by session token.
//!
//! Desk access goes through closures so the write lock is always released
//! before a handler awaits a remote call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::api::directory::Directory;
use crate::config::AppConfig;
use crate::desk::DoctorDesk;
use crate::views::Views;

// =============================================================================
// DESK ENTRY
// =============================================================================

/// A desk plus the last time a request touched it.
#[derive(Debug, Clone)]
pub struct DeskEntry {
    pub desk: DoctorDesk,
    pub touched: Instant,
}

impl DeskEntry {
    #[must_use]
    pub fn new() -> Self {
        Self { desk: DoctorDesk::new(), touched: Instant::now() }
    }
}

impl Default for DeskEntry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: ApiClient,
    pub directory: Arc<dyn Directory>,
    pub views: Arc<Views>,
    pub desks: Arc<RwLock<HashMap<String, DeskEntry>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, api: ApiClient, directory: Arc<dyn Directory>, views: Views) -> Self {
        Self {
            config: Arc::new(config),
            api,
            directory,
            views: Arc::new(views),
            desks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Run `f` on the desk for `token`, creating it if needed.
    pub async fn with_desk<R>(&self, token: &str, f: impl FnOnce(&mut DoctorDesk) -> R) -> R {
        let mut desks = self.desks.write().await;
        let entry = desks.entry(token.to_owned()).or_default();
        entry.touched = Instant::now();
        f(&mut entry.desk)
    }

    /// Run `f` on an existing desk only. Returns `None` if the desk was
    /// dropped meanwhile (logout or expired session).
    pub async fn update_desk<R>(&self, token: &str, f: impl FnOnce(&mut DoctorDesk) -> R) -> Option<R> {
        let mut desks = self.desks.write().await;
        let entry = desks.get_mut(token)?;
        entry.touched = Instant::now();
        Some(f(&mut entry.desk))
    }

    pub async fn drop_desk(&self, token: &str) {
        if self.desks.write().await.remove(token).is_some() {
            tracing::debug!("doctor desk discarded");
        }
    }
}


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
