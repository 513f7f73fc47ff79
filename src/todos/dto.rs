use serde::Deserialize;
use time::OffsetDateTime;

pub const DEFAULT_PRIORITY: &str = "Medium";

/// Body of create and update requests.
///
/// Unknown keys such as `id` or `user_id` are ignored, so identity and
/// ownership always come from the server. On update every omitted field is
/// reset to its default.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    DEFAULT_PRIORITY.to_string()
}
