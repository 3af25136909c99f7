//! Current-user session as an explicit context.
//!
//! A `Session` is created once and handed (cloned) to whatever needs the current user.
//! Clones share state, so `refresh` in one place is seen everywhere.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::user::User;

/// The slice of the API a session needs.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn profile(&self) -> Result<User, ApiError>;
    async fn login_url(&self) -> Result<String, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl ProfileApi for ApiClient {
    async fn profile(&self) -> Result<User, ApiError> {
        ApiClient::profile(self).await
    }

    async fn login_url(&self) -> Result<String, ApiError> {
        self.google_login_url().await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        ApiClient::logout(self).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready(User),
    /// Нет валидной cookie-сессии: пользователя надо отправить на OAuth.
    LoginRequired { authorization_url: String },
}

pub struct Session<A: ProfileApi> {
    api: Arc<A>,
    current: Arc<RwLock<Option<User>>>,
}

impl<A: ProfileApi> Clone for Session<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            current: self.current.clone(),
        }
    }
}

fn is_unauthenticated(err: &ApiError) -> bool {
    match err {
        ApiError::Rejected(_) => true,
        ApiError::Status { status, .. } => *status == 401 || *status == 403,
        _ => false,
    }
}

impl<A: ProfileApi> Session<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn current(&self) -> Option<User> {
        self.current.read().ok().and_then(|g| g.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    fn set(&self, user: Option<User>) {
        if let Ok(mut g) = self.current.write() {
            *g = user;
        }
    }

    /// No-op when a user is already loaded. Otherwise tries the existing cookie session
    /// and falls back to asking for an interactive login.
    pub async fn load(&self) -> Result<LoadOutcome, ApiError> {
        if let Some(user) = self.current() {
            return Ok(LoadOutcome::Ready(user));
        }
        match self.api.profile().await {
            Ok(user) => {
                debug!(username = %user.username, "session restored");
                self.set(Some(user.clone()));
                Ok(LoadOutcome::Ready(user))
            }
            Err(err) if is_unauthenticated(&err) => {
                let authorization_url = self.api.login_url().await?;
                Ok(LoadOutcome::LoginRequired { authorization_url })
            }
            Err(err) => Err(err),
        }
    }

    /// Re-fetches the profile. Any failure clears the local user; only non-auth failures are
    /// reported as errors.
    pub async fn refresh(&self) -> Result<Option<User>, ApiError> {
        match self.api.profile().await {
            Ok(user) => {
                self.set(Some(user.clone()));
                Ok(Some(user))
            }
            Err(err) => {
                self.set(None);
                if is_unauthenticated(&err) {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Local state is cleared unconditionally; the remote logout is best effort.
    pub async fn clear(&self) {
        self.set(None);
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "remote logout failed");
        }
    }
}
