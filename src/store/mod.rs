//! Flat-file JSON access.
//!
//! Both stores re-read their backing file on every call; nothing is cached
//! and nothing is ever written back.

pub mod credentials;
pub mod items;

pub use credentials::{CredentialVerifier, VerifyOutcome};
pub use items::{ItemStore, ReadError};
