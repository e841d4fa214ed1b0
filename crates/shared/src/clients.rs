//! Request payloads for client records, company info, and chat.

use serde::Deserialize;
use validator::Validate;

/// Create client request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClientRequest {
    /// `individual` or `corporation`.
    #[serde(default = "default_client_type")]
    #[validate(custom(function = "validate_client_type"))]
    pub client_type: String,
    /// Client display name.
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    /// Contact email.
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    /// Contact phone.
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

fn default_client_type() -> String {
    "corporation".to_string()
}

/// Update client request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClientRequest {
    /// `individual` or `corporation`.
    #[validate(custom(function = "validate_client_type"))]
    pub client_type: Option<String>,
    /// Client display name.
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    /// Contact email.
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    /// Contact phone.
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

fn validate_client_type(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "individual" | "corporation" => Ok(()),
        _ => Err(validator::ValidationError::new("client_type")
            .with_message("client_type must be 'individual' or 'corporation'".into())),
    }
}

/// Company basic information for a corporate client.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompanyInfoRequest {
    /// Registered company name.
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    /// Postal code.
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    /// Prefecture.
    #[validate(length(max = 50))]
    pub prefecture: Option<String>,
    /// City, ward and street address.
    #[validate(length(max = 255))]
    pub address: Option<String>,
    /// Building name and room.
    #[validate(length(max = 255))]
    pub building: Option<String>,
    /// Primary phone.
    #[validate(length(max = 50))]
    pub phone1: Option<String>,
    /// Secondary phone.
    #[validate(length(max = 50))]
    pub phone2: Option<String>,
    /// Fax number.
    #[validate(length(max = 50))]
    pub fax: Option<String>,
    /// Company email.
    #[validate(email)]
    pub email: Option<String>,
    /// Person in charge.
    #[validate(length(max = 100))]
    pub contact_person: Option<String>,
    /// Industry.
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    /// Number of employees.
    #[validate(range(min = 0))]
    pub employee_count: Option<i32>,
    /// Corporate number.
    #[validate(length(max = 50))]
    pub corporate_number: Option<String>,
}

/// Post chat message request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostMessageRequest {
    /// Message body.
    #[validate(length(min = 1, max = 10000, message = "message must not be empty"))]
    pub message: String,
}

/// Query parameters for "latest N" listings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitQuery {
    /// Number of rows requested.
    pub limit: Option<u64>,
}

impl LimitQuery {
    /// Largest page any listing returns.
    pub const MAX: u64 = 100;

    /// Requested limit, defaulted and clamped to `1..=MAX`.
    #[must_use]
    pub fn resolve(self, default: u64) -> u64 {
        self.limit.unwrap_or(default).clamp(1, Self::MAX)
    }
}
