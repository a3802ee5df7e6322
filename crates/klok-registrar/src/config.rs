//! Configuration loaded from environment variables.

use crate::registrar::RunSettings;
use anyhow::{Context, Result};
use klok_client::ClientOptions;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use wallet_signer::LoginParams;

/// Registrar configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Klok API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Egress IP lookup configuration
    #[serde(default)]
    pub ip_lookup: IpLookupConfig,

    /// Sign-in message parameters
    #[serde(default)]
    pub login: LoginParams,

    /// Scheduling and retry configuration
    #[serde(default)]
    pub run: RunConfig,

    /// Input and output files
    #[serde(default)]
    pub files: FilesConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Referral code attached to every registration
    #[serde(default = "default_referral_code")]
    pub referral_code: String,

    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    /// Verify request timeout
    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpLookupConfig {
    /// IP echo endpoint returning `{"ip": "..."}`
    #[serde(default = "default_ip_lookup_url")]
    pub url: String,

    #[serde(default = "default_ip_lookup_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Identities processed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Verify attempts per identity
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between failed attempts
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// One private key per line
    #[serde(default = "default_keys_file")]
    pub keys: PathBuf,

    /// Optional, one proxy URL per line
    #[serde(default = "default_proxies_file")]
    pub proxies: PathBuf,

    /// `address:key:token` lines
    #[serde(default = "default_success_file")]
    pub success: PathBuf,

    /// `address:key` lines
    #[serde(default = "default_failure_file")]
    pub failure: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            referral_code: default_referral_code(),
            origin: default_origin(),
            referer: default_referer(),
            timeout: default_api_timeout(),
        }
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            url: default_ip_lookup_url(),
            timeout: default_ip_lookup_timeout(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            keys: default_keys_file(),
            proxies: default_proxies_file(),
            success: default_success_file(),
            failure: default_failure_file(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("KLOK")
        .prefix_separator("_")
        .separator("__")
        // Referral codes and keys stay strings.
        .try_parsing(false)
}

// Default value functions
fn default_base_url() -> String {
    "https://api1-pp.klokapp.ai/v1".into()
}

fn default_referral_code() -> String {
    "GVJRESB4".into()
}

fn default_origin() -> String {
    "https://klokapp.ai".into()
}

fn default_referer() -> String {
    "https://klokapp.ai/".into()
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_ip_lookup_url() -> String {
    "https://api.ipify.org?format=json".into()
}

fn default_ip_lookup_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_concurrency() -> usize {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> Duration {
    Duration::ZERO
}

fn default_keys_file() -> PathBuf {
    PathBuf::from("priv.txt")
}

fn default_proxies_file() -> PathBuf {
    PathBuf::from("proxies.txt")
}

fn default_success_file() -> PathBuf {
    PathBuf::from("success.txt")
}

fn default_failure_file() -> PathBuf {
    PathBuf::from("fail.txt")
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from `KLOK_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_environment(environment())
    }

    fn from_environment(source: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.run.concurrency == 0 {
            anyhow::bail!("KLOK_RUN__CONCURRENCY must be at least 1");
        }
        if self.run.max_retries == 0 {
            anyhow::bail!("KLOK_RUN__MAX_RETRIES must be at least 1");
        }
        Ok(())
    }

    /// Options for the HTTP client.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api.base_url.clone(),
            ip_echo_url: self.ip_lookup.url.clone(),
            referral_code: self.api.referral_code.clone(),
            origin: self.api.origin.clone(),
            referer: self.api.referer.clone(),
            timeout: self.api.timeout,
            ip_lookup_timeout: self.ip_lookup.timeout,
        }
    }

    /// Settings for the orchestrator.
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            concurrency: self.run.concurrency,
            max_retries: self.run.max_retries,
            retry_delay: self.run.retry_delay,
            login: self.login.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value)?;
        }
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();

        assert_eq!(config.api.base_url, "https://api1-pp.klokapp.ai/v1");
        assert_eq!(config.api.timeout, Duration::from_secs(60));
        assert_eq!(config.ip_lookup.timeout, Duration::from_secs(10));
        assert_eq!(config.run.concurrency, 10);
        assert_eq!(config.run.max_retries, 5);
        assert_eq!(config.run.retry_delay, Duration::ZERO);
        assert_eq!(config.files.keys, PathBuf::from("priv.txt"));
        assert_eq!(config.files.failure, PathBuf::from("fail.txt"));
        assert_eq!(config.login.domain, "klokapp.ai");
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("run.concurrency", "3"),
            ("run.max_retries", "2"),
            ("run.retry_delay", "1500ms"),
            ("api.referral_code", "0123"),
            ("files.proxies", "/tmp/p.txt"),
        ])
        .unwrap();

        assert_eq!(config.run.concurrency, 3);
        assert_eq!(config.run.max_retries, 2);
        assert_eq!(config.run.retry_delay, Duration::from_millis(1500));
        assert_eq!(config.api.referral_code, "0123");
        assert_eq!(config.files.proxies, PathBuf::from("/tmp/p.txt"));

        let settings = config.run_settings();
        assert_eq!(settings.concurrency, 3);
        assert_eq!(config.client_options().referral_code, "0123");
    }

    #[test]
    fn test_environment_requires_prefix() {
        let vars: config::Map<String, String> = [
            ("LOGIN", "not-a-table"),
            ("RUN", "not-a-table"),
            ("FILES", "not-a-table"),
            ("RUN__CONCURRENCY", "99"),
            ("KLOK_RUN__CONCURRENCY", "3"),
            ("KLOK_API__REFERRAL_CODE", "0123"),
            ("KLOK_FILES__SUCCESS", "/tmp/ok.txt"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::from_environment(environment().source(Some(vars))).unwrap();

        assert_eq!(config.run.concurrency, 3);
        assert_eq!(config.api.referral_code, "0123");
        assert_eq!(config.files.success, PathBuf::from("/tmp/ok.txt"));
        assert_eq!(config.login.domain, "klokapp.ai");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(from_pairs(&[("run.concurrency", "0")]).is_err());
        assert!(from_pairs(&[("run.max_retries", "0")]).is_err());
    }
}
