use serde::{Deserialize, Serialize};

/// Access-token payload minted by the external identity provider. The
/// subject is an opaque user identity string; this service never issues
/// tokens itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // user identity
    pub iat: usize,   // issued at (unix timestamp)
    pub exp: usize,   // expires at (unix timestamp)
    pub iss: String,  // issuer
    pub aud: String,  // audience
}
