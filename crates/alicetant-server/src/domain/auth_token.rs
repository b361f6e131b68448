use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub token_prefix: String,
    pub rate_limit_per_minute: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// The plaintext token handed to the client exactly once. Only the argon2
/// hash and the lookup prefix are stored.
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub id: Uuid,
    pub token: String,
    pub prefix: String,
}

impl AuthToken {
    pub fn generate(user_id: Uuid) -> (Self, IssuedToken) {
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);

        let token = format!("alice_{}", URL_SAFE_NO_PAD.encode(token_bytes));
        let prefix = token[..12].to_string();

        let salt = SaltString::generate(&mut rand::thread_rng());
        let token_hash = Argon2::default()
            .hash_password(token.as_bytes(), &salt)
            .expect("failed to hash")
            .to_string();

        let id = Uuid::new_v4();

        let auth_token = Self {
            id,
            user_id,
            token_hash,
            token_prefix: prefix.clone(),
            rate_limit_per_minute: 100,
            created_at: Utc::now(),
            expires_at: None,
            revoked_at: None,
            last_used_at: None,
        };

        let issued = IssuedToken { id, token, prefix };

        (auth_token, issued)
    }

    pub fn verify(&self, token: &str) -> bool {
        let parsed = match PasswordHash::new(&self.token_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(token.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn is_valid(&self) -> bool {
        if self.revoked_at.is_some() {
            return false;
        }
        if let Some(expires) = self.expires_at {
            if expires < Utc::now() {
                return false;
            }
        }
        true
    }
}
