use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
///
/// A token whose `user_id` is missing or not an integer fails to
/// deserialize and is rejected like any other bad token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i64, // owner of every record the bearer touches
    pub exp: i64,     // expires at (unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>, // issued at; tokens carrying only user_id + exp are valid
}
