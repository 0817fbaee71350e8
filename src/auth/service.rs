//! JWT issuing and verification (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Role claim carried in every token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Agent,
    Admin,
}

impl Role {
    /// Agents and admins may drive transaction status and see the admin
    /// broadcast channel.
    pub fn is_operator(&self) -> bool {
        matches!(self, Role::Agent | Role::Admin)
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,  // user id
    pub role: Role, // authorization role
    pub exp: usize, // expiration time (UTC timestamp)
    pub iat: usize, // issued at
}

pub struct AuthService {
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<String>, token_ttl_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl_hours,
        }
    }

    /// Issue a signed token for a user
    pub fn issue_token(&self, user_id: Uuid, role: Role) -> Result<String, Error> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.token_ttl_hours);
        let claims = Claims {
            sub: user_id,
            role,
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| Error::unauthorized(format!("failed to sign token: {e}")))
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| Error::unauthorized(format!("invalid or expired token: {e}")))?;
        Ok(token_data.claims)
    }
}
