use std::sync::Arc;

use crate::usecase::{AccountPorts, AccountService};

/// Shared application state passed to every handler via axum `State`.
pub struct AppState<P: AccountPorts> {
    pub service: Arc<AccountService<P>>,
}

impl<P: AccountPorts> AppState<P> {
    pub fn new(service: AccountService<P>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// Manual impl: `derive` would require `P: Clone`.
impl<P: AccountPorts> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}
