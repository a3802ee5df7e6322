//! Sign-in message construction.

use chrono::{SecondsFormat, Utc};
use rand::RngCore;
use serde::Deserialize;
use std::fmt;

/// Nonce length in random bytes (hex-encoded to 96 characters).
const NONCE_BYTES: usize = 48;

/// Parameters of the sign-in message that stay constant across a run.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginParams {
    /// Domain requesting the signature
    #[serde(default = "default_domain")]
    pub domain: String,

    /// URI shown in the message body
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Message version
    #[serde(default = "default_version")]
    pub version: String,

    /// EVM chain id
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

impl Default for LoginParams {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            uri: default_uri(),
            version: default_version(),
            chain_id: default_chain_id(),
        }
    }
}

fn default_domain() -> String {
    "klokapp.ai".into()
}

fn default_uri() -> String {
    "https://klokapp.ai/".into()
}

fn default_version() -> String {
    "1".into()
}

fn default_chain_id() -> u64 {
    1
}

/// An unsigned sign-in message for one attempt.
#[derive(Debug, Clone)]
pub struct LoginMessage {
    pub domain: String,
    pub address: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
}

impl LoginMessage {
    /// Create a message with a fresh nonce and the current timestamp.
    pub fn new(params: &LoginParams, address: String) -> Self {
        Self {
            domain: params.domain.clone(),
            address,
            uri: params.uri.clone(),
            version: params.version.clone(),
            chain_id: params.chain_id,
            nonce: generate_nonce(),
            issued_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl fmt::Display for LoginMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The blank lines stand in for the empty statement section and are
        // part of what the server verifies.
        write!(
            f,
            "{} wants you to sign in with your Ethereum account:\n{}\n\n\nURI: {}\nVersion: {}\nChain ID: {}\nNonce: {}\nIssued At: {}",
            self.domain,
            self.address,
            self.uri,
            self.version,
            self.chain_id,
            self.nonce,
            self.issued_at
        )
    }
}

/// A signed sign-in message ready to submit.
#[derive(Debug, Clone)]
pub struct SignedLogin {
    /// `0x`-prefixed 65-byte personal-sign signature
    pub signature: String,
    /// The exact text that was signed
    pub message: String,
    pub nonce: String,
    pub issued_at: String,
}

/// Generate a random hex nonce.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
