//! Bearer token authentication for the API.
//!
//! Tokens are minted by the auth service and signed with a shared HMAC secret.
//! Handlers take an [`AuthenticatedUser`] argument; the extractor rejects the
//! request with `401 Unauthorized` before the handler body runs when the token
//! is missing, malformed, expired or signed with another key.

use std::future::{Ready, ready};
use std::str::FromStr;

use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::models::config::ServerConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("unsupported token algorithm `{0}`")]
    UnsupportedAlgorithm(String),

    #[error("authentication settings are not registered")]
    NotConfigured,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UnsupportedAlgorithm(_) | AuthError::NotConfigured => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::UNAUTHORIZED {
            HttpResponse::build(status)
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(json!({ "detail": "Could not validate credentials" }))
        } else {
            log::error!("Authentication failure: {self}");
            HttpResponse::build(status).json(json!({ "detail": "Internal server error" }))
        }
    }
}

/// Key material and algorithm used to verify bearer tokens.
#[derive(Clone)]
pub struct AuthSettings {
    secret: String,
    algorithm: Algorithm,
}

impl AuthSettings {
    /// Accepts only HMAC algorithms since the key is a shared secret.
    pub fn new(secret: impl Into<String>, algorithm: &str) -> Result<Self, AuthError> {
        let parsed = Algorithm::from_str(algorithm.trim())
            .map_err(|_| AuthError::UnsupportedAlgorithm(algorithm.to_string()))?;
        match parsed {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(Self {
                secret: secret.into(),
                algorithm: parsed,
            }),
            _ => Err(AuthError::UnsupportedAlgorithm(algorithm.to_string())),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl TryFrom<&ServerConfig> for AuthSettings {
    type Error = AuthError;

    fn try_from(config: &ServerConfig) -> Result<Self, Self::Error> {
        Self::new(config.secret.clone(), &config.jwt_algorithm)
    }
}

/// Identity of the caller carried in the token claims.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub exp: usize,
}

impl AuthenticatedUser {
    /// Sets the expiration claim relative to now.
    pub fn set_expiration(&mut self, minutes: i64) {
        let exp = Utc::now() + Duration::minutes(minutes);
        self.exp = exp.timestamp().max(0) as usize;
    }

    pub fn from_jwt(token: &str, settings: &AuthSettings) -> Result<Self, AuthError> {
        let validation = Validation::new(settings.algorithm);
        let data = decode::<Self>(
            token,
            &DecodingKey::from_secret(settings.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    pub fn to_jwt(&self, settings: &AuthSettings) -> Result<String, AuthError> {
        let token = encode(
            &Header::new(settings.algorithm),
            self,
            &EncodingKey::from_secret(settings.secret.as_bytes()),
        )?;
        Ok(token)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::MalformedHeader),
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AuthError> {
    let settings = req
        .app_data::<web::Data<AuthSettings>>()
        .ok_or(AuthError::NotConfigured)?;
    let token = bearer_token(req)?;

    AuthenticatedUser::from_jwt(token, settings).map_err(|err| {
        log::warn!("Rejected bearer token: {err}");
        err
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
