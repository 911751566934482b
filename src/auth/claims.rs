use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // normalized email
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
