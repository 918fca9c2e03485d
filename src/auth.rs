//! # Session Token Store
//!
//! Holds the access token of the signed-in administrator. The REST transport
//! reads it right before each request through [`AuthProvider`], so signing in or
//! out takes effect on the next request without rebuilding anything.

use resource_list::AuthProvider;
use std::sync::RwLock;
use tracing::info;

/// In-memory slot for the current access token.
#[derive(Debug, Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
            info!("Session token stored");
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
            info!("Session token cleared");
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token().is_some()
    }
}

impl AuthProvider for SessionStore {
    fn access_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }
}
