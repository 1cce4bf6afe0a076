//! Sign-in, sign-out and registration.

use validator::Validate;

use super::Marketplace;
use crate::domain::aggregates::{Credentials, NewUser, User};
use crate::session::{Session, SessionState};
use crate::store::StoreError;
use crate::{Result, StorefrontError};

impl Marketplace {
    pub async fn login(&self, session: &Session, credentials: Credentials) -> Result<SessionState> {
        credentials.validate()?;
        let response = self.store.login(credentials).await.map_err(|e| match e {
            StoreError::Rejected(_) | StoreError::NotFound { .. } => {
                StorefrontError::Validation("Invalid email or password".into())
            }
            e => StorefrontError::write("sign in")(e),
        })?;
        let state = session.sign_in(response).await?;
        tracing::info!(user = %state.user.id, "signed in");
        Ok(state)
    }

    pub async fn logout(&self, session: &Session, session_id: &str) -> Result<()> {
        if let Some(state) = session.sign_out(session_id).await? {
            tracing::info!(user = %state.user.id, "signed out");
        }
        Ok(())
    }

    /// Creates the account without signing in.
    pub async fn register(&self, user: NewUser) -> Result<User> {
        user.validate()?;
        let created = self.store.register(user).await.map_err(|e| match e {
            StoreError::Rejected(message) => StorefrontError::Validation(message),
            e => StorefrontError::write("register")(e),
        })?;
        tracing::info!(user = %created.id, "registered");
        Ok(created)
    }
}
