//! Identity gate seam.
//!
//! # Responsibility
//! - Turn a bearer credential into a verified caller identity.
//! - Keep token mechanics out of the aggregate service, which only ever
//!   sees `CallerIdentity`.
//!
//! # Invariants
//! - A `CallerIdentity` is only constructed from a non-blank user id.
//! - Token signatures are compared in constant time.

use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BEARER_PREFIX: &str = "Bearer ";

/// Verified caller identity supplied to owner-scoped operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Wraps an already verified user id. Returns `None` for blank input.
    pub fn new(user_id: impl Into<String>) -> Option<Self> {
        let user_id = user_id.into();
        let trimmed = user_id.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CallerIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity verification failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    MissingToken,
    Malformed,
    BadSignature,
    /// Gate was built without a signing secret.
    MissingSecret,
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "authorization token is missing"),
            Self::Malformed => write!(f, "authorization token is malformed"),
            Self::BadSignature => write!(f, "authorization token signature mismatch"),
            Self::MissingSecret => write!(f, "identity signing secret is not configured"),
        }
    }
}

impl Error for IdentityError {}

/// Verifies bearer credentials on behalf of the core.
pub trait IdentityGate {
    /// Verifies a raw `Authorization` header value.
    fn verify(&self, authorization: &str) -> Result<CallerIdentity, IdentityError>;
}

/// Shared-secret token gate.
///
/// Tokens have the shape `<user_id>.<hex(sha256("<secret>:<user_id>"))>`.
pub struct SharedSecretGate {
    secret: Option<String>,
}

impl SharedSecretGate {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Issues a token for `user_id`. Used by tooling and tests.
    pub fn issue_token(&self, user_id: &CallerIdentity) -> Result<String, IdentityError> {
        let secret = self.secret.as_deref().ok_or(IdentityError::MissingSecret)?;
        Ok(format!(
            "{}.{}",
            user_id.as_str(),
            sign(secret, user_id.as_str())
        ))
    }
}

impl IdentityGate for SharedSecretGate {
    fn verify(&self, authorization: &str) -> Result<CallerIdentity, IdentityError> {
        let secret = self.secret.as_deref().ok_or(IdentityError::MissingSecret)?;
        let raw = authorization.trim_start();
        let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(IdentityError::MissingToken);
        }

        let (user_id, signature) = token.rsplit_once('.').ok_or(IdentityError::Malformed)?;
        let identity = CallerIdentity::new(user_id).ok_or(IdentityError::Malformed)?;
        if identity.as_str() != user_id {
            return Err(IdentityError::Malformed);
        }

        let expected = sign(secret, user_id);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            log::warn!("event=identity_verify module=identity status=error reason=bad_signature");
            return Err(IdentityError::BadSignature);
        }
        Ok(identity)
    }
}

fn sign(secret: &str, user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(user_id.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
