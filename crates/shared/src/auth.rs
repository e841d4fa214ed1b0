//! Authentication types for JWT and login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// Tenant the token is scoped to.
    pub tenant: i64,
    /// Display name, recorded as the sender/uploader of chat messages and files.
    pub name: String,
    /// User's role within the tenant.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: i64,
        tenant_id: i64,
        name: &str,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            tenant: tenant_id,
            name: name.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.sub
    }

    /// Returns the tenant ID from claims.
    #[must_use]
    pub const fn tenant_id(&self) -> i64 {
        self.tenant
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Access token.
    pub access_token: String,
    /// Token expiration in seconds.
    pub expires_in: i64,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Tenant ID.
    pub tenant_id: i64,
    /// User email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Role within the tenant.
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let expires_at = Utc::now() + Duration::hours(1);
        let claims = Claims::new(3, 42, "Sato", "tenant_admin", expires_at);

        assert_eq!(claims.user_id(), 3);
        assert_eq!(claims.tenant_id(), 42);
        assert_eq!(claims.name, "Sato");
        assert_eq!(claims.role, "tenant_admin");
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }
}
