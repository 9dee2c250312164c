//! Session tokens.
//!
//! Sessions are HS256 JWTs carried in an HTTP-only cookie. The token holds
//! only the user id and email; everything else is loaded fresh per request.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attire_core::UserId;

use crate::config::JwtConfig;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "jwtToken";

/// Claims carried in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Errors from signing or verifying session tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// Expired, malformed, or signed with a different key.
    #[error("invalid session token")]
    Invalid,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: u64,
}

impl TokenService {
    /// Build a token service from the JWT configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiration_secs: config.expiration_secs,
        }
    }

    /// Sign a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if encoding fails.
    pub fn sign(&self, user_id: UserId, email: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)] // expiration fits well within i64
        let claims = Claims {
            id: user_id,
            email: email.to_owned(),
            iat: now,
            exp: now + self.expiration_secs as i64,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Sign)
    }

    /// Verify a session token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for expired, malformed, or forged
    /// tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    /// Build the `Set-Cookie` value establishing a session.
    #[must_use]
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            self.expiration_secs
        )
    }

    /// Build the `Set-Cookie` value clearing the session.
    #[must_use]
    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax")
    }
}

/// Extract one cookie's value from a `Cookie` request header.
#[must_use]
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn service() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: SecretString::from("kJ8#mN2$pQ5&rT9*uW3^xZ6!aC4@eF7%"),
            expiration_secs: 3600,
        })
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let svc = service();
        let token = svc.sign(UserId::from(42), "user@example.com").unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.id, UserId::from(42));
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let svc = service();
        let mut token = svc.sign(UserId::from(1), "a@b.com").unwrap();
        token.push('x');

        assert!(matches!(svc.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let token = service().sign(UserId::from(1), "a@b.com").unwrap();
        let other = TokenService::new(&JwtConfig {
            secret: SecretString::from("zY1!wV4$tS7&qP0*nM3^kJ6@hG9%fD2#"),
            expiration_secs: 3600,
        });

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_cookie_value_parses_header() {
        let header = "theme=dark; jwtToken=abc.def.ghi; other=1";
        assert_eq!(cookie_value(header, SESSION_COOKIE), Some("abc.def.ghi"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(TokenService::clear_cookie().contains("Max-Age=0"));
    }
}
