//! Response envelopes handed to the web front end.
//!
//! These mirror the shapes the dashboard forms consume:
//! `{ success: true, user }` or `{ success: false, error }`.

use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SignInResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SignUpResponse {
    pub success: bool,
    #[serde(
        rename = "userId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<User, AuthError>> for SignInResponse {
    fn from(result: Result<User, AuthError>) -> Self {
        match result {
            Ok(user) => Self {
                success: true,
                user: Some(user),
                error: None,
            },
            Err(e) => Self {
                success: false,
                user: None,
                error: Some(e.to_string()),
            },
        }
    }
}

impl From<Result<String, AuthError>> for SignUpResponse {
    fn from(result: Result<String, AuthError>) -> Self {
        match result {
            Ok(user_id) => Self {
                success: true,
                user_id: Some(user_id),
                error: None,
            },
            Err(e) => Self {
                success: false,
                user_id: None,
                error: Some(e.to_string()),
            },
        }
    }
}
