//! Ethereum wallet identities and sign-in messages.
//!
//! Wraps `alloy`'s local ECDSA signer: parse a raw private key into an
//! [`Identity`], then produce a freshly-nonced [`SignedLogin`] for every
//! authentication attempt.

mod error;
mod identity;
mod login;

pub use error::SignerError;
pub use identity::{mask_address, Identity};
pub use login::{generate_nonce, LoginMessage, LoginParams, SignedLogin};
