//! Klok sign-in API client.

use crate::error::KlokError;
use crate::proxy::ProxyDescriptor;
use crate::types::{IpResponse, VerifyRequest, VerifyResponse};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use wallet_signer::SignedLogin;

/// Connection settings for [`KlokClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Public IP echo endpoint
    pub ip_echo_url: String,
    pub referral_code: String,
    /// `Origin` header sent with every API call
    pub origin: String,
    /// `Referer` header sent with every API call
    pub referer: String,
    /// Timeout for the verify call
    pub timeout: Duration,
    /// Timeout for the IP lookup
    pub ip_lookup_timeout: Duration,
}

/// Klok API client.
///
/// Direct calls share one connection pool and ignore proxy environment
/// variables. Proxied calls get a dedicated reqwest client per proxy, built
/// on first use and reused by later attempts on the same route.
#[derive(Clone)]
pub struct KlokClient {
    client: Client,
    proxied: Arc<Mutex<HashMap<ProxyDescriptor, Client>>>,
    options: ClientOptions,
}

impl KlokClient {
    /// Create a new Klok client.
    pub fn new(mut options: ClientOptions) -> Result<Self, KlokError> {
        options.base_url = options.base_url.trim_end_matches('/').to_string();
        let client = Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            proxied: Arc::new(Mutex::new(HashMap::new())),
            options,
        })
    }

    /// Get the configured API base URL.
    pub fn base_url(&self) -> &str {
        &self.options.base_url
    }

    /// Exchange a signed sign-in message for a session token.
    #[instrument(skip(self, login, proxy), fields(route = %route(proxy)))]
    pub async fn verify(
        &self,
        login: &SignedLogin,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<String, KlokError> {
        let request = VerifyRequest::new(login, &self.options.referral_code);
        let url = format!("{}/verify", self.options.base_url);

        debug!(url = %url, "Sending verify request");

        let response = self
            .http_for(proxy)?
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Origin", &self.options.origin)
            .header("Referer", &self.options.referer)
            .timeout(self.options.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, body = %body, "Verify request rejected");
            return Err(KlokError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: VerifyResponse = serde_json::from_str(&body)?;
        parsed
            .session_token
            .filter(|token| !token.is_empty())
            .ok_or(KlokError::MissingToken)
    }

    /// Look up the public IP seen by the outside world on this route.
    #[instrument(skip(self, proxy), fields(route = %route(proxy)))]
    pub async fn current_ip(&self, proxy: Option<&ProxyDescriptor>) -> Result<String, KlokError> {
        let response = self
            .http_for(proxy)?
            .get(&self.options.ip_echo_url)
            .timeout(self.options.ip_lookup_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KlokError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let ip: IpResponse = response.json().await?;
        Ok(ip.ip)
    }

    fn http_for(&self, proxy: Option<&ProxyDescriptor>) -> Result<Client, KlokError> {
        let Some(p) = proxy else {
            return Ok(self.client.clone());
        };

        let mut proxied = self.proxied.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = proxied.get(p) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .proxy(p.to_reqwest()?)
            .build()
            .map_err(|e| KlokError::Proxy(format!("Failed to build client for {}: {}", p, e)))?;
        debug!(proxy = %p, "Built proxied client");
        proxied.insert(p.clone(), client.clone());
        Ok(client)
    }

    #[cfg(test)]
    pub(crate) fn proxied_clients(&self) -> usize {
        self.proxied.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn route(proxy: Option<&ProxyDescriptor>) -> String {
    proxy.map_or_else(|| "direct".to_string(), |p| p.to_string())
}
