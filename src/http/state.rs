use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionController;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(controller: Arc<SessionController>, config: Arc<Config>) -> Self {
        Self { controller, config }
    }
}
