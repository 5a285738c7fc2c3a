//! Session accessor.
//!
//! The single place that knows who is signed in. Components receive a
//! [`Session`] and ask it for the token; none of them read the store's
//! session entry directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::LoginResponse;
use crate::domain::Role;
use crate::store::{Store, StoreError, keys};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub full_name: String,
    pub email: String,
    pub user_name: String,
    pub role: Role,
    pub token: String,
}

impl SessionUser {
    /// Build a session user from a login response, resolving the role once.
    pub fn from_login(response: LoginResponse, fallback_user_name: &str) -> Self {
        let user_name = response
            .user_name
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| fallback_user_name.to_string());
        Self {
            full_name: response.full_name.unwrap_or_else(|| user_name.clone()),
            email: response.email.unwrap_or_default(),
            role: Role::resolve(response.role.as_deref()),
            token: response.token,
            user_name,
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Access to the current session, backed by the local store.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<Store>,
}

impl Session {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The signed-in user, if any.
    pub async fn current(&self) -> Result<Option<SessionUser>, StoreError> {
        self.store.get(keys::SESSION).await
    }

    /// The bearer token of the signed-in user. Blank tokens count as absent.
    pub async fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .current()
            .await?
            .filter(SessionUser::has_token)
            .map(|u| u.token))
    }

    pub async fn login(&self, user: &SessionUser) -> Result<(), StoreError> {
        self.store.set(keys::SESSION, user).await?;
        info!(user = %user.user_name, role = %user.role, "signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(keys::SESSION).await?;
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_user(token: &str) -> SessionUser {
    SessionUser {
        full_name: "Alex Chen".to_string(),
        email: "alex@example.com".to_string(),
        user_name: "alex".to_string(),
        role: Role::Driver,
        token: token.to_string(),
    }
}
