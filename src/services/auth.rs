//! Accounts and bearer tokens.
//!
//! Tokens are handed out as `"{token_id}|{secret}"`. Only the SHA-256 of the
//! secret is stored, and the hash is compared in constant time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::domain::value_objects::{Email, UserId};
use crate::{EcommerceError, Result, User};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> std::result::Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else { return false };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Split a presented bearer token into its id and secret halves.
pub fn parse_token(token: &str) -> Option<(Uuid, &str)> {
    let (id, secret) = token.trim().split_once('|')?;
    if secret.is_empty() { return None; }
    Some((Uuid::parse_str(id).ok()?, secret))
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub struct AuthService<'a> {
    pool: &'a PgPool,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    pub fn new(pool: &'a PgPool, token_ttl: Duration) -> Self {
        Self { pool, token_ttl }
    }

    #[tracing::instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<UserId> {
        let name = new_user.name.trim();
        if name.is_empty() {
            return Err(EcommerceError::validation_field("name", "The name field is required."));
        }
        let email = Email::parse(&new_user.email)
            .map_err(|_| EcommerceError::validation_field("email", "The email must be a valid email address."))?;
        let password = hash_password(&new_user.password).map_err(|e| EcommerceError::Internal(format!("password hashing failed: {e}")))?;

        let (id,): (UserId,) = sqlx::query_as(
            "INSERT INTO users (name, email, password, phone, address) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(&password)
        .bind(non_blank(new_user.phone))
        .bind(non_blank(new_user.address))
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => EcommerceError::DuplicateEmail,
            other => EcommerceError::Database(other),
        })?;

        tracing::info!(user_id = %id, "user registered");
        Ok(id)
    }

    /// Check credentials and issue a fresh token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let email = Email::parse(email).map_err(|_| EcommerceError::InvalidCredentials)?;
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;
        let user = match user {
            Some(user) if verify_password(password, &user.password) => user,
            _ => return Err(EcommerceError::InvalidCredentials),
        };

        let token_id = Uuid::now_v7();
        let secret = generate_secret();
        sqlx::query("INSERT INTO access_tokens (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)")
            .bind(token_id)
            .bind(user.id)
            .bind(hash_secret(&secret))
            .bind(Utc::now() + self.token_ttl)
            .execute(self.pool)
            .await?;

        tracing::info!(user_id = %user.id, "token issued");
        Ok((user, format!("{token_id}|{secret}")))
    }

    /// Revoke every token of the user.
    pub async fn logout(&self, user_id: UserId) -> Result<u64> {
        let revoked = sqlx::query("DELETE FROM access_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?
            .rows_affected();
        tracing::info!(%user_id, revoked, "user logged out");
        Ok(revoked)
    }

    /// Resolve a bearer token to its user. Unknown, expired and malformed
    /// tokens are all `Unauthenticated`.
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let (token_id, secret) = parse_token(token).ok_or(EcommerceError::Unauthenticated)?;
        let row: Option<(UserId, String)> =
            sqlx::query_as("SELECT user_id, token_hash FROM access_tokens WHERE id = $1 AND expires_at > NOW()")
                .bind(token_id)
                .fetch_optional(self.pool)
                .await?;
        let (user_id, stored_hash) = row.ok_or(EcommerceError::Unauthenticated)?;
        let presented = hash_secret(secret);
        if !bool::from(presented.as_bytes().ct_eq(stored_hash.trim().as_bytes())) {
            return Err(EcommerceError::Unauthenticated);
        }

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(EcommerceError::Unauthenticated)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("12345678").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("12345678", &hash));
        assert!(!verify_password("87654321", &hash));
        assert!(!verify_password("12345678", "not-a-hash"));
    }

    #[test]
    fn test_parse_token() {
        let id = Uuid::new_v4();
        let token = format!("{id}|abc123");
        assert_eq!(parse_token(&token), Some((id, "abc123")));
        assert_eq!(parse_token("abc123"), None);
        assert_eq!(parse_token("not-a-uuid|abc"), None);
        assert_eq!(parse_token(&format!("{id}|")), None);
    }

    #[test]
    fn test_secret_hashing() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 64);
        assert_ne!(secret, generate_secret());
        let hash = hash_secret(&secret);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_secret(&secret));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" 0912 ".into())), Some("0912".into()));
        assert_eq!(non_blank(None), None);
    }
}
