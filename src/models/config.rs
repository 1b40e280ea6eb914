//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret used to verify bearer tokens.
    pub secret: String,
    /// Name of the HMAC algorithm tokens are signed with (`HS256`, `HS384`, `HS512`).
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
}
