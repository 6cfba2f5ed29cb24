//! Credentials sign-in and session tokens.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use chrono::{DateTime, Utc};
use db::models::user::User;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid or expired session")]
    InvalidSession,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Claims carried by a session token. `sub` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    secret: SecretString,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(secret: SecretString, session_ttl: Duration) -> Self {
        Self {
            secret,
            session_ttl,
        }
    }

    /// Check a username/password pair and issue a session for it.
    pub async fn sign_in(
        &self,
        pool: &SqlitePool,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let Some(user) = User::find_by_username(pool, username).await? else {
            // keep the timing of unknown users close to wrong passwords
            let _ = hash_password(password);
            warn!(username, "Sign-in failed: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            warn!(username, "Sign-in failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User signed in");
        self.issue(&user)
    }

    pub fn issue(&self, user: &User) -> Result<Session, AuthError> {
        let issued_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let expires_at = issued_at + ttl;
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?;
        Ok(Session {
            token,
            user_id: user.id,
            username: user.username.clone(),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidSession)
    }

    /// Create the initial admin account when no users exist yet.
    pub async fn ensure_admin(
        &self,
        pool: &SqlitePool,
        username: &str,
        password: &SecretString,
    ) -> Result<bool, AuthError> {
        if User::count(pool).await? > 0 {
            return Ok(false);
        }
        User::create(pool, username, &hash_password(password.expose_secret())?).await?;
        info!(username, "Seeded admin user");
        Ok(true)
    }
}

/// Argon2id PHC string (`$argon2id$v=19$...`) with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(AuthError::Hash)
}

/// Checks `password` against a stored PHC string. The digest comparison is
/// constant-time; malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    fn service(ttl: Duration) -> AuthService {
        AuthService::new(SecretString::from("test-secret".to_string()), ttl)
    }

    #[test]
    fn password_hash_round_trip() {
        let stored = hash_password("hunter22").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
        assert!(!verify_password("hunter22", "not-a-hash"));
        // salted: same password, different hash
        assert_ne!(stored, hash_password("hunter22").unwrap());
    }

    #[test]
    fn legacy_salted_sha256_hashes_are_rejected() {
        let legacy = format!("{}:{}", "00".repeat(16), "ab".repeat(32));
        assert!(!verify_password("hunter22", &legacy));
    }

    #[tokio::test]
    async fn sign_in_issues_verifiable_session() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = service(Duration::from_secs(3600));
        let seeded = auth
            .ensure_admin(&db.pool, "admin", &SecretString::from("p@ss".to_string()))
            .await
            .unwrap();
        assert!(seeded);

        let session = auth.sign_in(&db.pool, "admin", "p@ss").await.unwrap();
        let claims = auth.verify(&session.token).unwrap();
        assert_eq!(claims.sub, session.user_id);
        assert_eq!(claims.username, "admin");

        assert!(matches!(
            auth.sign_in(&db.pool, "admin", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in(&db.pool, "nobody", "p@ss").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn admin_is_seeded_only_once() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = service(Duration::from_secs(3600));
        let password = SecretString::from("p@ss".to_string());
        assert!(auth.ensure_admin(&db.pool, "admin", &password).await.unwrap());
        assert!(!auth.ensure_admin(&db.pool, "other", &password).await.unwrap());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let user = User {
            id: Uuid::new_v4(),
            username: "admin".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let session = service(Duration::from_secs(3600)).issue(&user).unwrap();
        let other = AuthService::new(
            SecretString::from("another-secret".to_string()),
            Duration::from_secs(3600),
        );
        assert!(matches!(other.verify(&session.token), Err(AuthError::InvalidSession)));
        assert!(matches!(other.verify("garbage"), Err(AuthError::InvalidSession)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let user = User {
            id: Uuid::new_v4(),
            username: "admin".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let auth = service(Duration::ZERO);
        let session = auth.issue(&user).unwrap();
        // default validation allows 60s of leeway; push exp well past it
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            iat: session.expires_at.timestamp() - 7200,
            exp: session.expires_at.timestamp() - 3600,
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(auth.verify(&stale), Err(AuthError::InvalidSession)));
    }
}
