use serde::{Deserialize, Serialize};

use crate::shared::AppError;
use crate::store::models::UserModel;

/// Caller identity resolved from the bearer credential, threaded explicitly
/// through every operation that needs it
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    Authenticated { user_id: String },
}

impl Identity {
    /// Returns the user id or fails the protected operation
    pub fn require(&self) -> Result<&str, AppError> {
        match self {
            Identity::Authenticated { user_id } => Ok(user_id),
            Identity::Anonymous => Err(AppError::Unauthenticated(
                "Authentication required".to_string(),
            )),
        }
    }
}

/// JWT claims carried by an issued token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthClaims {
    pub user_id: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_on_authenticated() {
        let identity = Identity::Authenticated {
            user_id: "u1".to_string(),
        };
        assert_eq!(identity.require().unwrap(), "u1");
    }

    #[test]
    fn test_require_on_anonymous_fails() {
        let result = Identity::Anonymous.require();
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_auth_claims_round_trip() {
        let claims = AuthClaims {
            user_id: "u1".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        let back: AuthClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claims);
    }
}
