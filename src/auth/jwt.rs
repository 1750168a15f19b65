use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{auth::dto::Claims, config::JwtConfig, error::AppError, state::AppState};

/// HS256 signing material plus the issuer/audience pair every token carries.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        let secret = cfg.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            lifetime: Duration::minutes(cfg.ttl_minutes.max(1)),
        }
    }

    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let issued = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            iat: issued.unix_timestamp() as usize,
            exp: (issued + self.lifetime).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(%user_id, "access token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticated caller. Rejects with `401 Invalid token` when the bearer
/// token is missing, invalid, expired, or names a user that no longer exists.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(AppError::invalid_token)?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            AppError::invalid_token()
        })?;

        match state.users.find_by_id(claims.sub).await {
            Ok(Some(user)) => Ok(AuthUser(user.id)),
            Ok(None) => {
                warn!(user_id = %claims.sub, "token names a deleted user");
                Err(AppError::invalid_token())
            }
            Err(e) => {
                error!(error = %e, "user lookup failed during auth");
                Err(AppError::Internal(e))
            }
        }
    }
}
