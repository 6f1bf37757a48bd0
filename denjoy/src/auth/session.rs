//! Access token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::Error, types::UserId};

/// Claims of an auth-platform access token. Only the fields this service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,          // Subject (user ID)
    pub exp: i64,             // Expiration time
    #[serde(default)]
    pub email: Option<String>, // User email
    pub aud: String,          // Audience
}

/// Verify and decode a bearer access token
pub fn verify_access_token(token: &str, config: &AuthConfig) -> Result<AccessClaims, Error> {
    let secret = config.jwt_secret.as_deref().ok_or_else(|| Error::ServerMisconfigured {
        setting: "auth.jwt_secret".to_string(),
    })?;

    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.jwt_audience.as_str()]);

    let token_data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: Some("Invalid or expired access token".to_string()),
        },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("verify access token: {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// Sign an access token the way the auth platform does. Used by tests and local tooling.
#[cfg(test)]
pub fn create_access_token(user_id: UserId, email: Option<&str>, config: &AuthConfig) -> Result<String, Error> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let secret = config.jwt_secret.as_deref().ok_or_else(|| Error::ServerMisconfigured {
        setting: "auth.jwt_secret".to_string(),
    })?;
    let claims = AccessClaims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
        email: email.map(str::to_string),
        aud: config.jwt_audience.clone(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| Error::Internal {
        operation: format!("create access token: {e}"),
    })
}
