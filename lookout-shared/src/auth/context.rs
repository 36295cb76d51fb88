//! Request authentication context
//!
//! The API's JWT layer validates the Bearer token and stores an
//! [`AuthContext`] in the request extensions. Handlers turn it into a
//! [`Viewer`] for the serializers.
//!
//! # Example
//!
//! ```
//! use lookout_shared::auth::context::{bearer_token, AuthContext};
//! use lookout_shared::auth::jwt::{create_token, validate_token, Claims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let secret = "your-secret-key-at-least-32-bytes";
//! let header = format!("Bearer {}", create_token(&Claims::new(Uuid::new_v4()), secret)?);
//!
//! let claims = validate_token(bearer_token(&header)?, secret)?;
//! let auth = AuthContext::from_claims(&claims);
//! assert_eq!(auth.user_id, claims.sub);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::serializers::Viewer;

/// Error extracting credentials from a request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header isn't a Bearer token
    #[error("Invalid authorization format: {0}")]
    InvalidFormat(String),
}

/// Authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }

    /// The viewer serializers compute access flags for
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.user_id)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}
