//! Wallet identity derived from a raw private key.

use crate::error::SignerError;
use crate::login::{LoginMessage, LoginParams, SignedLogin};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;

/// A parsed signing identity.
///
/// The raw key is kept as a `SecretString` so it never ends up in debug
/// output; it is only exposed when writing the outcome record.
pub struct Identity {
    raw_key: SecretString,
    signer: PrivateKeySigner,
}

impl Identity {
    /// Parse a hex private key, with or without a `0x` prefix.
    pub fn from_private_key(raw_key: &str) -> Result<Self, SignerError> {
        let raw_key = raw_key.trim();
        let signer = PrivateKeySigner::from_str(raw_key)
            .map_err(|e| SignerError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self {
            raw_key: SecretString::new(raw_key.to_string()),
            signer,
        })
    }

    /// The derived account address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-55 checksummed address string.
    pub fn checksum_address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    /// Masked address for log lines.
    pub fn masked_address(&self) -> String {
        mask_address(&self.checksum_address())
    }

    /// Build and sign a fresh sign-in message.
    ///
    /// Every call draws a new nonce and timestamp, so the result must never
    /// be reused across attempts.
    pub fn sign_login(&self, params: &LoginParams) -> Result<SignedLogin, SignerError> {
        let message = LoginMessage::new(params, self.checksum_address());
        let text = message.to_string();
        let signature = self.signer.sign_message_sync(text.as_bytes())?;

        Ok(SignedLogin {
            signature: format!("0x{}", hex::encode(signature.as_bytes())),
            message: text,
            nonce: message.nonce,
            issued_at: message.issued_at,
        })
    }

    /// The raw key exactly as it was supplied (trimmed), for outcome records.
    pub fn expose_raw_key(&self) -> &str {
        self.raw_key.expose_secret()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Shorten an address to `0x1234...abcd`.
pub fn mask_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Signature;

    // Well-known hardhat account #0.
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_derive_address() {
        let identity = Identity::from_private_key(TEST_KEY).unwrap();
        assert_eq!(identity.checksum_address(), TEST_ADDRESS);
    }

    #[test]
    fn test_key_without_prefix() {
        let identity = Identity::from_private_key(&TEST_KEY[2..]).unwrap();
        assert_eq!(identity.checksum_address(), TEST_ADDRESS);
        assert_eq!(identity.expose_raw_key(), &TEST_KEY[2..]);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert!(Identity::from_private_key("not-a-key").is_err());
        assert!(Identity::from_private_key("0x1234").is_err());
        assert!(Identity::from_private_key("").is_err());
        // Zero is not a valid secp256k1 scalar.
        assert!(Identity::from_private_key(&"0".repeat(64)).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let identity = Identity::from_private_key(TEST_KEY).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(&TEST_KEY[2..]));
    }

    #[test]
    fn test_mask_address() {
        assert_eq!(mask_address(TEST_ADDRESS), "0xf39F...2266");
        assert_eq!(mask_address("0x1234"), "0x1234");
    }

    #[test]
    fn test_signature_recovers_signer() {
        let identity = Identity::from_private_key(TEST_KEY).unwrap();
        let login = identity.sign_login(&LoginParams::default()).unwrap();

        assert!(login.signature.starts_with("0x"));
        assert_eq!(login.signature.len(), 2 + 130);

        let bytes = hex::decode(&login.signature[2..]).unwrap();
        let signature = Signature::try_from(bytes.as_slice()).unwrap();
        let recovered = signature
            .recover_address_from_msg(login.message.as_bytes())
            .unwrap();
        assert_eq!(recovered, identity.address());
    }

    #[test]
    fn test_each_login_is_fresh() {
        let identity = Identity::from_private_key(TEST_KEY).unwrap();
        let params = LoginParams::default();

        let first = identity.sign_login(&params).unwrap();
        let second = identity.sign_login(&params).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.message, second.message);
        assert_ne!(first.signature, second.signature);
    }
}
