use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

use crate::shared::AppError;
use crate::store::models::UserModel;

/// Trait for user lookup and creation
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;

    /// Inserts a user; fails if the email is already taken
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Storage("Email already registered".to_string()));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, email = %user.email, "User created");
        Ok(())
    }
}
