//! Username/password verification against a single stored record.
//!
//! The record lives in a JSON object `{"username": "...", "password": "..."}`
//! and is read fresh for every verification. Nothing is read unless the
//! request is a POST with a well-formed body.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// The method a login request must use.
pub const LOGIN_METHOD: &str = "POST";

/// Result of one verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Request did not use [`LOGIN_METHOD`].
    MethodNotAllowed,
    /// Body is not JSON, or `username`/`password` are missing or not strings.
    MalformedRequest,
    /// Well-formed request, wrong credentials.
    Mismatch,
    Match,
    /// The stored record could not be read or parsed.
    ServerError,
}

impl VerifyOutcome {
    pub fn is_match(self) -> bool {
        self == Self::Match
    }
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Parse `{"username": <string>, "password": <string>, ...}`. Only an
    /// object is accepted; serde would otherwise also take a two-element
    /// array for the struct.
    fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_slice(raw)?;
        serde_json::from_value(Value::Object(object))
    }
}

#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    path: PathBuf,
}

impl CredentialVerifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check a fully-buffered request body against the stored record.
    pub fn verify(&self, method: &str, body: &[u8]) -> VerifyOutcome {
        if method != LOGIN_METHOD {
            return VerifyOutcome::MethodNotAllowed;
        }

        let submitted = match Credentials::from_slice(body) {
            Ok(submitted) => submitted,
            Err(e) => {
                debug!("login body rejected: {e}");
                return VerifyOutcome::MalformedRequest;
            }
        };

        let stored = match self.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), "credential record unavailable: {e}");
                return VerifyOutcome::ServerError;
            }
        };

        // Both fields are always compared.
        let user_ok = submitted.username == stored.username;
        let pass_ok = submitted.password == stored.password;
        if user_ok & pass_ok {
            VerifyOutcome::Match
        } else {
            VerifyOutcome::Mismatch
        }
    }

    fn load(&self) -> Result<Credentials, String> {
        let raw = fs::read(&self.path).map_err(|e| e.to_string())?;
        Credentials::from_slice(&raw).map_err(|e| e.to_string())
    }
}
