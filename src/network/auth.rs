//! Token Authentication
//!
//! Validates JWTs issued by the host platform (chat bot backend, identity
//! provider). The server never issues tokens. The `sub` claim carries the
//! host's numeric user id, which becomes the [`PlayerId`].

use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::game::state::PlayerId;

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected issuer claim ("iss"). If None, any issuer accepted.
    pub issuer: Option<String>,
    /// Expected audience claim ("aud"). If None, any audience accepted.
    pub audience: Option<String>,
    /// RS256 public key in PEM format.
    pub public_key_pem: Option<String>,
    /// HS256 shared secret.
    pub secret: Option<String>,
    /// Skip expiry validation (testing only).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Create config from environment variables.
    ///
    /// - `MAFIA_AUTH_ISSUER`, `MAFIA_AUTH_AUDIENCE`: expected claims
    /// - `MAFIA_AUTH_PUBLIC_KEY_PEM`: RS256 key (preferred)
    /// - `MAFIA_AUTH_SECRET`: HS256 secret
    /// - `MAFIA_AUTH_SKIP_EXPIRY`: `true`/`1` disables expiry checks
    pub fn from_env() -> Self {
        Self {
            issuer: std::env::var("MAFIA_AUTH_ISSUER").ok(),
            audience: std::env::var("MAFIA_AUTH_AUDIENCE").ok(),
            public_key_pem: std::env::var("MAFIA_AUTH_PUBLIC_KEY_PEM").ok(),
            secret: std::env::var("MAFIA_AUTH_SECRET").ok(),
            skip_expiry: std::env::var("MAFIA_AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Check if a verification key is configured.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// Claims expected in a host-issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the host's numeric user id.
    pub sub: String,
    /// Expiry timestamp (Unix seconds).
    #[serde(default)]
    pub exp: u64,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Player id named by the subject claim.
    pub fn player_id(&self) -> Result<PlayerId, AuthError> {
        self.sub
            .trim()
            .parse::<i64>()
            .map(PlayerId)
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No verification key configured on server.
    #[error("authentication not configured")]
    NotConfigured,
    /// `hello` carried no token while authentication is required.
    #[error("token required")]
    MissingToken,
    /// Token format is invalid.
    #[error("invalid token format")]
    InvalidFormat,
    /// Token signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// Token has expired.
    #[error("token expired")]
    Expired,
    /// Issuer claim doesn't match expected value.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Audience claim doesn't match expected value.
    #[error("invalid audience")]
    InvalidAudience,
    /// Required claim is missing.
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Subject is not a numeric user id.
    #[error("subject is not a player id: {0}")]
    InvalidSubject(String),
    /// Token names a different player than the one claimed.
    #[error("token is for player {token}, not {claimed}")]
    PlayerMismatch {
        /// Player named by the token.
        token: PlayerId,
        /// Player claimed in `hello`.
        claimed: PlayerId,
    },
    /// JWT decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Validate a JWT token and extract claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let algorithm = if config.public_key_pem.is_some() {
        Algorithm::RS256
    } else {
        Algorithm::HS256
    };

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = std::collections::HashSet::new();

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }

    if let Some(ref audience) = config.audience {
        validation.set_audience(&[audience]);
    } else {
        validation.validate_aud = false;
    }

    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let token_data: TokenData<TokenClaims> = if let Some(ref pem) = config.public_key_pem {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::DecodeError(format!("invalid public key: {}", e)))?;
        decode(token, &key, &validation).map_err(map_jwt_error)?
    } else if let Some(ref secret) = config.secret {
        let key = DecodingKey::from_secret(secret.as_bytes());
        decode(token, &key, &validation).map_err(map_jwt_error)?
    } else {
        return Err(AuthError::NotConfigured);
    };

    let claims = token_data.claims;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub".into()));
    }

    // Strict check, no leeway
    if !config.skip_expiry && claims.exp > 0 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
    }

    Ok(claims)
}

/// Resolve the identity a `hello` may bind to.
///
/// With no key configured the asserted id is taken as-is. Otherwise the
/// token must verify and name the same player.
pub fn authenticate(
    config: &AuthConfig,
    claimed: PlayerId,
    token: Option<&str>,
) -> Result<PlayerId, AuthError> {
    if !config.is_configured() {
        return Ok(claimed);
    }

    let token = token.ok_or(AuthError::MissingToken)?;
    let player = validate_token(token, config)?.player_id()?;
    if player != claimed {
        return Err(AuthError::PlayerMismatch { token: player, claimed });
    }
    Ok(player)
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
