use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::Principal;
use serde::{Deserialize, Serialize};

use crate::routes::AppState;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Authenticated principal of the current request, inserted by `require_bearer_token`.
#[derive(Clone, Debug)]
pub struct Caller(pub Principal);

/// Sign an HS256 token for `subject` valid for `ttl`.
pub fn issue_token(secret: &str, subject: &str, ttl: chrono::Duration) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        exp: (now + ttl).timestamp().max(0) as usize,
        iat: Some(now.timestamp().max(0) as usize),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Middleware: resolve the caller from `Authorization: Bearer <token>`.
/// Missing header yields 400; malformed, expired or subject-less tokens yield 401.
pub async fn require_bearer_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path().to_string();

    let Some(authz) = req.headers().get(header::AUTHORIZATION) else {
        tracing::warn!(path = %path, "missing Authorization header");
        return Err(StatusCode::BAD_REQUEST);
    };
    let Some(token) = authz.to_str().ok().and_then(|h| h.strip_prefix("Bearer ")) else {
        tracing::warn!(path = %path, "invalid Authorization format (expect Bearer)");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = match decode::<Claims>(token.trim(), &key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    if claims.sub.trim().is_empty() {
        tracing::warn!(path = %path, "token has an empty subject");
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(Caller(Principal::new(claims.sub)));
    Ok(next.run(req).await)
}
