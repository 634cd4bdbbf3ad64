use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use sha2::{Digest, Sha256};

use crate::db::{
    helpers::{parse_datetime, parse_optional_datetime},
    models::{NewUser, UserAccount, UserSettings},
    Database,
};

fn row_to_account(row: &Row) -> Result<UserAccount> {
    let created_at: String = row.get("created_at")?;
    let last_login: Option<String> = row.get("last_login")?;

    Ok(UserAccount {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        last_login: parse_optional_datetime(last_login, "last_login")?,
    })
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Stored as `salt$digest`.
fn encode_credential(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let salt = hex_encode(&salt);
    let digest = hash_password(&salt, password);
    format!("{salt}${digest}")
}

fn credential_matches(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => hash_password(salt, password) == digest,
        None => false,
    }
}

impl Database {
    /// Create a user together with its default settings row in one
    /// transaction. Returns `None` when the username or email is taken.
    pub async fn create_user(&self, new_user: NewUser) -> Result<Option<i64>> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO users (username, email, password_hash, full_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    new_user.username,
                    new_user.email,
                    encode_credential(&new_user.password),
                    new_user.full_name,
                    Utc::now().to_rfc3339(),
                ],
            );

            let user_id = match inserted {
                Ok(_) => tx.last_insert_rowid(),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            };

            let defaults = UserSettings::default();
            tx.execute(
                "INSERT INTO user_settings (user_id, eco_limit, alert_email, alert_push, theme)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_id,
                    defaults.eco_limit,
                    defaults.alert_email,
                    defaults.alert_push,
                    defaults.theme,
                ],
            )?;

            tx.commit()?;
            Ok(Some(user_id))
        })
        .await
    }

    /// Check credentials; on success update `last_login` and return the
    /// account.
    pub async fn verify_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserAccount>> {
        let username = username.to_string();
        let password = password.to_string();
        self.execute(move |conn| {
            let row: Option<(i64, String)> = conn
                .query_row(
                    "SELECT id, password_hash FROM users WHERE username = ?1",
                    params![username],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((user_id, stored)) = row else {
                return Ok(None);
            };
            if !credential_matches(&stored, &password) {
                return Ok(None);
            }

            conn.execute(
                "UPDATE users SET last_login = ?1 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), user_id],
            )?;

            let mut stmt = conn.prepare(
                "SELECT id, username, email, full_name, created_at, last_login
                 FROM users WHERE id = ?1",
            )?;
            let account = stmt
                .query_row(params![user_id], |row| Ok(row_to_account(row)))??;
            Ok(Some(account))
        })
        .await
    }

    /// Settings for a user, defaults when no row exists yet.
    pub async fn get_settings(&self, user_id: i64) -> Result<UserSettings> {
        self.execute(move |conn| {
            let settings = conn
                .query_row(
                    "SELECT eco_limit, alert_email, alert_push, theme
                     FROM user_settings WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok(UserSettings {
                            eco_limit: row.get(0)?,
                            alert_email: row.get(1)?,
                            alert_push: row.get(2)?,
                            theme: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(settings.unwrap_or_default())
        })
        .await
    }

    /// Full overwrite of every settings field; no partial merge.
    pub async fn update_settings(&self, user_id: i64, settings: UserSettings) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO user_settings (user_id, eco_limit, alert_email, alert_push, theme)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     eco_limit = excluded.eco_limit,
                     alert_email = excluded.alert_email,
                     alert_push = excluded.alert_push,
                     theme = excluded.theme",
                params![
                    user_id,
                    settings.eco_limit,
                    settings.alert_email,
                    settings.alert_push,
                    settings.theme,
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_roundtrip() {
        let stored = encode_credential("hunter2");
        assert!(credential_matches(&stored, "hunter2"));
        assert!(!credential_matches(&stored, "hunter3"));
    }

    #[test]
    fn salts_differ_between_encodings() {
        let a = encode_credential("same");
        let b = encode_credential("same");
        assert_ne!(a, b);
    }
}
