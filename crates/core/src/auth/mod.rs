//! Password hashing and user roles.

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// Role of a user inside an advisory firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Operator of the whole deployment.
    SystemAdmin,
    /// Firm administrator, manages storage and users.
    TenantAdmin,
    /// Regular staff member working with clients.
    Staff,
}

impl UserRole {
    /// Parses a stored role name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system_admin" => Some(Self::SystemAdmin),
            "tenant_admin" => Some(Self::TenantAdmin),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    /// Stored role name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::TenantAdmin => "tenant_admin",
            Self::Staff => "staff",
        }
    }

    /// Returns true if this role can connect or disconnect storage providers.
    #[must_use]
    pub const fn can_manage_storage(&self) -> bool {
        matches!(self, Self::SystemAdmin | Self::TenantAdmin)
    }

    /// Returns true if this role can delete clients and their records.
    #[must_use]
    pub const fn can_delete_clients(&self) -> bool {
        matches!(self, Self::SystemAdmin | Self::TenantAdmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
