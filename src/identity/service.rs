use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::repository::UserRepository;
use super::token::TokenConfig;
use super::types::{Identity, LoginResponse};
use crate::shared::AppError;
use crate::store::models::UserModel;

/// Mock identity provider: issues and verifies bearer tokens
///
/// Login is find-or-create by email; the password is accepted but never
/// checked. Real credential verification is explicitly out of scope.
pub struct IdentityService {
    users: Arc<dyn UserRepository + Send + Sync>,
    tokens: TokenConfig,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepository + Send + Sync>, tokens: TokenConfig) -> Self {
        Self { users, tokens }
    }

    /// Logs a user in, creating the account on first sight of the email
    #[instrument(skip(self, _password))]
    pub async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, AppError> {
        let local_part = email.split('@').next().unwrap_or_default();
        if local_part.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }

        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // First login creates the account; display name is the
                // local part of the email
                let user = UserModel::new(local_part.to_string(), email.to_string());
                self.users.create_user(&user).await?;
                info!(user_id = %user.id, "New user created on first login");
                user
            }
        };

        let token = self.tokens.issue_token(user.id.clone())?;
        Ok(LoginResponse { token, user })
    }

    /// Resolves a bearer token into a caller identity
    ///
    /// Missing, invalid, or stale tokens resolve to `Anonymous` rather than
    /// failing the request; protected operations reject Anonymous callers
    /// themselves.
    pub async fn resolve(&self, token: Option<&str>) -> Identity {
        let Some(token) = token else {
            return Identity::Anonymous;
        };

        let claims = match self.tokens.verify_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Invalid bearer token - treating as anonymous");
                return Identity::Anonymous;
            }
        };

        // A token for a user the store no longer knows is as good as no token
        match self.users.find_by_id(&claims.user_id).await {
            Ok(Some(user)) => Identity::Authenticated { user_id: user.id },
            Ok(None) => {
                debug!(user_id = %claims.user_id, "Token for unknown user");
                Identity::Anonymous
            }
            Err(e) => {
                debug!(error = %e, "User lookup failed during identity resolution");
                Identity::Anonymous
            }
        }
    }

    /// Returns the profile of the authenticated caller
    pub async fn me(&self, identity: &Identity) -> Result<UserModel, AppError> {
        let user_id = identity.require()?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::repository::InMemoryUserRepository;

    fn service() -> IdentityService {
        IdentityService::new(Arc::new(InMemoryUserRepository::new()), TokenConfig::new())
    }

    #[tokio::test]
    async fn test_login_creates_user_with_email_prefix_name() {
        let service = service();

        let response = service.login("jane@example.com", "whatever").await.unwrap();
        assert_eq!(response.user.name, "jane");
        assert_eq!(response.user.email, "jane@example.com");
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn test_login_reuses_existing_user() {
        let service = service();

        let first = service.login("jane@example.com", "pw").await.unwrap();
        let second = service.login("jane@example.com", "other-pw").await.unwrap();
        assert_eq!(first.user.id, second.user.id);
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_email() {
        let service = service();

        let result = service.login("not-an-email", "pw").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service.login("@example.com", "pw").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_resolve_round_trip() {
        let service = service();
        let login = service.login("jane@example.com", "pw").await.unwrap();

        let identity = service.resolve(Some(&login.token)).await;
        assert_eq!(
            identity,
            Identity::Authenticated {
                user_id: login.user.id
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_or_invalid_token_is_anonymous() {
        let service = service();

        assert_eq!(service.resolve(None).await, Identity::Anonymous);
        assert_eq!(service.resolve(Some("garbage")).await, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_me_requires_identity() {
        let service = service();
        let login = service.login("jane@example.com", "pw").await.unwrap();

        let me = service
            .me(&Identity::Authenticated {
                user_id: login.user.id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(me.id, login.user.id);

        let result = service.me(&Identity::Anonymous).await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }
}
