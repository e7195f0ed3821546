//! API key issuance and comparison.
//!
//! A key is the lowercase hex SHA-256 of `"{name}-{unix_nanos}-{n}"`, where `n`
//! is drawn uniformly from `0..2^31-1` using the operating system CSPRNG.
//! The name and time alone are therefore not enough to reproduce a key.

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::project::ProjectName;

/// Length of an issued key (hex-encoded SHA-256).
pub const API_KEY_HEX_LEN: usize = 64;

/// Exclusive upper bound of the random component.
const RANDOM_UPPER_BOUND: u32 = (1 << 31) - 1;

/// Secret bearer token authenticating event submissions for one project.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a presented key.
    ///
    /// Only the length difference is observable through timing.
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

impl core::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Error)]
pub enum KeyIssueError {
    /// The OS entropy source failed. Issuance must not fall back to a weaker generator.
    #[error("secure random source unavailable: {0}")]
    RandomSourceUnavailable(String),
}

/// Derives the secret key for a newly registered project.
pub trait KeyIssuer: Send + Sync {
    fn issue(&self, project_name: &ProjectName) -> Result<ApiKey, KeyIssueError>;
}

impl<K> KeyIssuer for Arc<K>
where
    K: KeyIssuer + ?Sized,
{
    fn issue(&self, project_name: &ProjectName) -> Result<ApiKey, KeyIssueError> {
        (**self).issue(project_name)
    }
}

/// Production issuer backed by the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureKeyIssuer;

impl SecureKeyIssuer {
    pub fn new() -> Self {
        Self
    }
}

impl KeyIssuer for SecureKeyIssuer {
    fn issue(&self, project_name: &ProjectName) -> Result<ApiKey, KeyIssueError> {
        let n = secure_random_below(RANDOM_UPPER_BOUND)?;
        // Out of range only after the year 2262.
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        Ok(derive_key(project_name.as_str(), nanos, n))
    }
}

fn derive_key(project_name: &str, unix_nanos: i64, n: u32) -> ApiKey {
    let material = format!("{project_name}-{unix_nanos}-{n}");
    let digest = Sha256::digest(material.as_bytes());
    ApiKey(hex::encode(digest))
}

/// Uniform draw from `0..bound`.
///
/// Raw 32-bit values at or above the largest multiple of `bound` are redrawn,
/// so `v % bound` carries no modulo bias.
fn secure_random_below(bound: u32) -> Result<u32, KeyIssueError> {
    debug_assert!(bound > 0);
    let zone = u32::MAX - u32::MAX % bound;
    loop {
        let mut buf = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| KeyIssueError::RandomSourceUnavailable(e.to_string()))?;
        let candidate = u32::from_le_bytes(buf);
        if candidate < zone {
            return Ok(candidate % bound);
        }
    }
}
