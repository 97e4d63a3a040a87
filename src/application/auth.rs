use crate::error::{PortalError, Result};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Hex SHA-256 digest of an admin password, as stored in configuration.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Admin sessions held in memory. Restarting the server logs admins out.
pub struct SessionManager {
    username: String,
    password_sha256: String,
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new(username: impl Into<String>, password_sha256: impl Into<String>, ttl: Duration) -> Self {
        Self {
            username: username.into(),
            password_sha256: password_sha256.into().trim().to_ascii_lowercase(),
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let digest = password_digest(password);
        // Evaluate both comparisons so timing does not reveal which one failed.
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let password_ok = digest.as_bytes().ct_eq(self.password_sha256.as_bytes());
        if !bool::from(user_ok & password_ok) {
            warn!(username, "Admin login failed");
            return Err(PortalError::Unauthorized);
        }

        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let session = Session {
            token: hex::encode(raw),
            username: self.username.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        info!(username, "Admin logged in");
        Ok(session)
    }

    /// Returns the live session for `token`; expired sessions are dropped.
    pub async fn validate(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if session.expires_at > now => return Some(session.clone()),
                None => return None,
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.expires_at > now);
        None
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(ttl: Duration) -> SessionManager {
        SessionManager::new("asb", password_digest("correct horse"), ttl)
    }

    #[test]
    fn test_password_digest_is_hex_sha256() {
        assert_eq!(
            password_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_login_and_validate() {
        let sessions = manager(Duration::hours(1));
        let session = sessions.login("asb", "correct horse").await.unwrap();
        assert_eq!(session.token.len(), 64);

        let live = sessions.validate(&session.token).await.unwrap();
        assert_eq!(live.username, "asb");
        assert!(sessions.validate("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let sessions = manager(Duration::hours(1));
        assert!(matches!(
            sessions.login("asb", "wrong").await,
            Err(PortalError::Unauthorized)
        ));
        assert!(matches!(
            sessions.login("admin", "correct horse").await,
            Err(PortalError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_purged() {
        let sessions = manager(Duration::seconds(-1));
        let session = sessions.login("asb", "correct horse").await.unwrap();
        assert!(sessions.validate(&session.token).await.is_none());
        assert!(!sessions.revoke(&session.token).await);
    }

    #[tokio::test]
    async fn test_revoke() {
        let sessions = manager(Duration::hours(1));
        let session = sessions.login("asb", "correct horse").await.unwrap();
        assert!(sessions.revoke(&session.token).await);
        assert!(sessions.validate(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn test_credentials_compared_in_full() {
        let sessions = manager(Duration::hours(1));
        for (username, password) in [
            ("as", "correct horse"),
            ("asbx", "correct horse"),
            ("", ""),
            ("asb", "correct hors"),
            ("asb", "correct horse "),
        ] {
            assert!(
                matches!(
                    sessions.login(username, password).await,
                    Err(PortalError::Unauthorized)
                ),
                "{username:?} / {password:?}"
            );
        }
        assert!(sessions.login("asb", "correct horse").await.is_ok());
    }
}
