// Login state kept in the shared key-value store.
//
// The HTTP client reads `token` from the same store on every request, so a
// session and a client built over one store stay in sync without wiring.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, AuthApi, AuthResponse, LoginCredentials, SignupData};
use crate::models::User;
use crate::storage::{KeyValueStore, StorageError, LOCAL_BOOKINGS_KEY, TOKEN_KEY, USER_KEY};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct Session {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self { api, storage }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let AuthResponse { token, user } = self.api.login(&credentials).await?;

        self.storage.set(TOKEN_KEY, &token)?;
        self.storage
            .set(USER_KEY, &serde_json::to_string(&user).map_err(StorageError::from)?)?;

        info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    // Signup does not return a token, so a successful signup is followed by a login
    pub async fn signup(&self, data: &SignupData) -> Result<User, SessionError> {
        let created = self.api.signup(data).await?;
        info!(user_id = %created.id, "account created");
        self.login(&data.email, &data.password).await
    }

    // Local bookings belong to the signed-in user and go with the session
    pub fn logout(&self) -> Result<(), SessionError> {
        for key in [TOKEN_KEY, USER_KEY, LOCAL_BOOKINGS_KEY] {
            self.storage.remove(key)?;
        }
        info!("logged out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "could not read stored user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "stored user is malformed");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.storage.get(TOKEN_KEY), Ok(Some(token)) if !token.is_empty())
    }
}
