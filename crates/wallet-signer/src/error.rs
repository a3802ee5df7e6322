//! Signer errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl From<alloy::signers::Error> for SignerError {
    fn from(e: alloy::signers::Error) -> Self {
        SignerError::Signing(e.to_string())
    }
}
