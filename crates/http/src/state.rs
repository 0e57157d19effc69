use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rex_core::{Clock, Rule};
use rex_history::HistoryStore;
use rex_triggers::{EventSender, WebhookSource};
use tokio::sync::mpsc;

use crate::rate_limit::RateLimiter;

/// Shared state behind every route. Cheap to clone: everything inside is
/// `Arc`-wrapped.
pub struct AppState<C: Clock> {
    pub rules: Arc<RwLock<Vec<Rule>>>,
    pub webhooks: Arc<RwLock<HashMap<String, Arc<WebhookSource>>>>,
    pub last_run_state: Arc<Mutex<HashMap<String, String>>>,
    pub event_tx: EventSender,
    pub history: Option<Arc<HistoryStore>>,
    /// Nudges the hot-reload watcher to run immediately rather than
    /// waiting out its debounce, backing `POST /api/reload`.
    pub reload_tx: mpsc::Sender<()>,
    pub started_at: std::time::Instant,
    pub health_limiter: Arc<RateLimiter<C>>,
    pub rules_limiter: Arc<RateLimiter<C>>,
    pub history_limiter: Arc<RateLimiter<C>>,
    pub webhook_limiter: Arc<RateLimiter<C>>,
    pub clock: C,
}

impl<C: Clock> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            webhooks: Arc::clone(&self.webhooks),
            last_run_state: Arc::clone(&self.last_run_state),
            event_tx: self.event_tx.clone(),
            history: self.history.clone(),
            reload_tx: self.reload_tx.clone(),
            started_at: self.started_at,
            health_limiter: Arc::clone(&self.health_limiter),
            rules_limiter: Arc::clone(&self.rules_limiter),
            history_limiter: Arc::clone(&self.history_limiter),
            webhook_limiter: Arc::clone(&self.webhook_limiter),
            clock: self.clock.clone(),
        }
    }
}
