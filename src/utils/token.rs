use crate::error::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Bearer tokens expire one hour after issuance.
const TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues a signed HS256 bearer token for the given username. Stateless:
/// the token itself carries subject and expiry, nothing is stored.
pub fn issue_token(username: &str, secret: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_owned(),
        iat: now,
        exp: now + TOKEN_TTL_SECONDS,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verifies signature and expiry and returns the subject. Fails closed:
/// any malformed, tampered or expired token is an error.
pub fn decode_token(token: &str, secret: &str) -> Result<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims.sub)
}
