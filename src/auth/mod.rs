//! Bearer token verification.
//!
//! Tokens are RS256-signed JWTs checked against a single PEM trust anchor supplied
//! at startup. The `sub` claim becomes the caller's user id and scopes every
//! storage operation.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// The only signing algorithm accepted.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

const BEARER: &str = "bearer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Caller identity derived from a verified token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.sub }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header")]
    MalformedAuthHeader,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token claims were rejected")]
    InvalidClaims,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Trust anchor is not a usable RSA public key: {0}")]
    InvalidTrustAnchor(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject => AuthError::InvalidClaims,
            _ => AuthError::MalformedToken,
        }
    }
}

/// Verifies bearer tokens against a fixed RSA public key.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenVerifier {
    /// Build a verifier from a PEM-encoded RSA public key.
    pub fn from_rsa_pem(pem: &str) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidTrustAnchor(e.to_string()))?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_nbf = true;
        // `aud` is only checked once an audience is pinned
        validation.validate_aud = false;

        Ok(Self { key, validation })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut verifier = Self::from_rsa_pem(&config.public_key_pem)?.with_leeway(config.leeway_secs);
        if let Some(issuer) = &config.issuer {
            verifier = verifier.with_issuer(issuer);
        }
        if let Some(audience) = &config.audience {
            verifier = verifier.with_audience(audience);
        }
        Ok(verifier)
    }

    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.validation.leeway = secs;
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Verify a raw `Authorization` header value and return the caller identity.
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = extract_bearer_token(header)?;
        self.verify_token(token).map(AuthUser::from)
    }

    /// Verify a bare token (no scheme prefix).
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::MalformedToken);
        }

        Ok(data.claims)
    }
}

/// Pull the token out of `Bearer <token>`; the scheme keyword is case-insensitive.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingAuthHeader)?;

    let scheme = value.get(..BEARER.len()).ok_or(AuthError::MalformedAuthHeader)?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(AuthError::MalformedAuthHeader);
    }

    let rest = &value[BEARER.len()..];
    if !rest.starts_with(|c: char| c.is_ascii_whitespace()) {
        return Err(AuthError::MalformedAuthHeader);
    }

    let token = rest.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedAuthHeader);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const TRUSTED_PRIVATE: &str = include_str!("../../tests/fixtures/trusted_private.pem");
    const TRUSTED_PUBLIC: &str = include_str!("../../tests/fixtures/trusted_public.pem");
    const UNTRUSTED_PRIVATE: &str = include_str!("../../tests/fixtures/untrusted_private.pem");

    fn verifier() -> TokenVerifier {
        TokenVerifier::from_rsa_pem(TRUSTED_PUBLIC).unwrap()
    }

    fn sign(private_pem: &str, claims: serde_json::Value) -> String {
        let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
    }

    fn fresh_claims(sub: &str) -> serde_json::Value {
        json!({ "sub": sub, "iat": Utc::now().timestamp(), "exp": Utc::now().timestamp() + 600 })
    }

    #[test]
    fn trusted_token_yields_subject() {
        let subjects = ["google-oauth2|1234567890", "auth0|abc", "user with spaces"];
        for sub in subjects {
            let token = sign(TRUSTED_PRIVATE, fresh_claims(sub));
            let header = format!("Bearer {}", token);
            let user = verifier().authenticate(Some(&header)).unwrap();
            assert_eq!(user.user_id, sub);
        }
    }

    #[test]
    fn scheme_keyword_is_case_insensitive() {
        let token = sign(TRUSTED_PRIVATE, fresh_claims("u1"));
        for scheme in ["bearer", "BEARER", "BeArEr"] {
            let header = format!("{} {}", scheme, token);
            assert_eq!(verifier().authenticate(Some(&header)).unwrap().user_id, "u1");
        }
    }

    #[test]
    fn foreign_key_is_invalid_signature() {
        let token = sign(UNTRUSTED_PRIVATE, fresh_claims("u1"));
        let header = format!("Bearer {}", token);
        assert_eq!(verifier().authenticate(Some(&header)), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let hs = encode(
            &Header::new(Algorithm::HS256),
            &fresh_claims("u1"),
            &EncodingKey::from_secret(TRUSTED_PUBLIC.as_bytes()),
        )
        .unwrap();
        assert_eq!(verifier().verify_token(&hs), Err(AuthError::InvalidSignature));

        // alg "none" with an empty signature segment
        let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJzdWIiOiJ1MSIsImV4cCI6OTk5OTk5OTk5OX0.";
        assert!(verifier().verify_token(unsigned).is_err());
    }

    #[test]
    fn missing_header_is_reported() {
        assert_eq!(verifier().authenticate(None), Err(AuthError::MissingAuthHeader));
        assert_eq!(verifier().authenticate(Some("")), Err(AuthError::MissingAuthHeader));
        assert_eq!(verifier().authenticate(Some("   ")), Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn non_bearer_headers_are_malformed() {
        for header in ["Basic dXNlcjpwYXNz", "Token abc", "abc.def.ghi", "Bearer", "Bearerabc", "Bearer a b", "Beare"] {
            assert_eq!(
                extract_bearer_token(Some(header)),
                Err(AuthError::MalformedAuthHeader),
                "header {:?}",
                header
            );
        }
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        for token in ["not-a-jwt", "a.b", "a.b.c"] {
            assert_eq!(verifier().verify_token(token), Err(AuthError::MalformedToken), "token {:?}", token);
        }
    }

    #[test]
    fn missing_subject_is_malformed() {
        let no_sub = sign(TRUSTED_PRIVATE, json!({ "exp": Utc::now().timestamp() + 600 }));
        assert_eq!(verifier().verify_token(&no_sub), Err(AuthError::MalformedToken));

        let empty_sub = sign(TRUSTED_PRIVATE, fresh_claims(""));
        assert_eq!(verifier().verify_token(&empty_sub), Err(AuthError::MalformedToken));
    }

    #[test]
    fn expiry_is_enforced() {
        let expired = sign(TRUSTED_PRIVATE, json!({ "sub": "u1", "exp": Utc::now().timestamp() - 3600 }));
        assert_eq!(verifier().verify_token(&expired), Err(AuthError::TokenExpired));

        let no_exp = sign(TRUSTED_PRIVATE, json!({ "sub": "u1" }));
        assert_eq!(verifier().verify_token(&no_exp), Err(AuthError::MalformedToken));
    }

    #[test]
    fn issuer_pinning() {
        let pinned = verifier().with_issuer("https://issuer.example/");
        let mut claims = fresh_claims("u1");
        claims["iss"] = json!("https://someone-else.example/");
        let token = sign(TRUSTED_PRIVATE, claims);
        assert_eq!(pinned.verify_token(&token), Err(AuthError::InvalidClaims));

        let mut claims = fresh_claims("u1");
        claims["iss"] = json!("https://issuer.example/");
        let token = sign(TRUSTED_PRIVATE, claims);
        assert_eq!(pinned.verify_token(&token).unwrap().sub, "u1");
    }

    #[test]
    fn audience_is_ignored_unless_pinned() {
        let mut claims = fresh_claims("auth0|abc");
        claims["aud"] = json!("my-client-id");
        let token = sign(TRUSTED_PRIVATE, claims);
        assert_eq!(verifier().verify_token(&token).unwrap().sub, "auth0|abc");

        let pinned = verifier().with_audience("my-client-id");
        assert_eq!(pinned.verify_token(&token).unwrap().sub, "auth0|abc");

        let other = verifier().with_audience("another-client");
        assert_eq!(other.verify_token(&token), Err(AuthError::InvalidClaims));
    }

    #[test]
    fn not_before_is_enforced() {
        let now = Utc::now().timestamp();
        let early = sign(TRUSTED_PRIVATE, json!({ "sub": "u1", "exp": now + 7200, "nbf": now + 3600 }));
        assert_eq!(verifier().verify_token(&early), Err(AuthError::InvalidClaims));

        let current = sign(TRUSTED_PRIVATE, json!({ "sub": "u1", "exp": now + 7200, "nbf": now - 10 }));
        assert_eq!(verifier().verify_token(&current).unwrap().sub, "u1");
    }

    #[test]
    fn bad_trust_anchor_is_rejected() {
        assert!(matches!(
            TokenVerifier::from_rsa_pem("not a pem"),
            Err(AuthError::InvalidTrustAnchor(_))
        ));
    }
}
