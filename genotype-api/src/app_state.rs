use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::search::GenotypeSearch;

#[derive(Clone)]
pub struct AppState {
    search_service: Arc<dyn GenotypeSearch>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(search_service: Arc<dyn GenotypeSearch>, shutdown: CancellationToken) -> Self {
        Self {
            search_service,
            shutdown,
        }
    }

    pub fn search_service(&self) -> &dyn GenotypeSearch {
        self.search_service.as_ref()
    }

    /// Cancelled when the server starts shutting down.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
