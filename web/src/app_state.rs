use std::sync::Arc;

use storage::Database;

use crate::config::Config;
use crate::notifier::Notifier;
use crate::stripe::StripeClient;

/// Shared application state available to all handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: Notifier,
    pub stripe: StripeClient,
    pub config: Arc<Config>,
}
