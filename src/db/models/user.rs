use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::DEFAULT_ECO_LIMIT;

/// Registration input. The plaintext password is salted and hashed before
/// it reaches the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// A stored user, minus credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Per-user settings. Updates overwrite every field unconditionally; there
/// is no partial merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub eco_limit: i64,
    pub alert_email: bool,
    pub alert_push: bool,
    pub theme: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            eco_limit: DEFAULT_ECO_LIMIT,
            alert_email: true,
            alert_push: true,
            theme: "dark".into(),
        }
    }
}
