use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{UserResponse, UserRole};

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "username must be between 1 and 50 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "password must be between 1 and 128 characters"))]
    pub password: String,
}

// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// Alta de usuario (solo admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 128, message = "password must be between 6 and 128 characters"))]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Attendant
}
