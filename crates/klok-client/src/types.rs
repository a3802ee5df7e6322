//! Request and response types for the Klok API.

use serde::{Deserialize, Serialize};
use wallet_signer::SignedLogin;

/// Body of `POST /verify`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    #[serde(rename = "signedMessage")]
    pub signed_message: String,
    pub message: String,
    pub referral_code: String,
}

impl VerifyRequest {
    pub fn new(login: &SignedLogin, referral_code: impl Into<String>) -> Self {
        Self {
            signed_message: login.signature.clone(),
            message: login.message.clone(),
            referral_code: referral_code.into(),
        }
    }
}

/// Response of `POST /verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Response of the IP echo service.
#[derive(Debug, Clone, Deserialize)]
pub struct IpResponse {
    pub ip: String,
}
