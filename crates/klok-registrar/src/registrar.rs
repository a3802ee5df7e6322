//! Concurrent registration orchestrator.

use crate::proxy_pool::ProxyPool;
use crate::retry::AttemptState;
use crate::sink::{Outcome, ResultSink};
use async_trait::async_trait;
use klok_client::{KlokClient, KlokError, ProxyDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use wallet_signer::{Identity, LoginParams, SignedLogin};

/// Placeholder shown when the egress IP cannot be determined.
const UNKNOWN_IP: &str = "Unknown";

/// Network side of a registration: IP lookup and the sign-in exchange.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Public IP as seen through the given route.
    async fn current_ip(&self, proxy: Option<&ProxyDescriptor>) -> Result<String, KlokError>;

    /// Exchange a signed message for a session token.
    async fn verify(
        &self,
        login: &SignedLogin,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<String, KlokError>;
}

#[async_trait]
impl AuthBackend for KlokClient {
    async fn current_ip(&self, proxy: Option<&ProxyDescriptor>) -> Result<String, KlokError> {
        KlokClient::current_ip(self, proxy).await
    }

    async fn verify(
        &self,
        login: &SignedLogin,
        proxy: Option<&ProxyDescriptor>,
    ) -> Result<String, KlokError> {
        KlokClient::verify(self, login, proxy).await
    }
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Maximum identities in flight at once
    pub concurrency: usize,
    /// Maximum verify attempts per identity
    pub max_retries: u32,
    /// Pause between a failed attempt and the next one
    pub retry_delay: Duration,
    /// Sign-in message parameters
    pub login: LoginParams,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_retries: 5,
            retry_delay: Duration::ZERO,
            login: LoginParams::default(),
        }
    }
}

/// Counts of how each identity ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Token obtained and written to the success file
    pub registered: usize,
    /// Retries exhausted and written to the failure file
    pub failed: usize,
    /// Key could not be parsed; nothing written
    pub rejected: usize,
    /// Outcome could not be written, or the task panicked
    pub errored: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.registered + self.failed + self.rejected + self.errored
    }

    fn count(&mut self, end: TaskEnd) {
        match end {
            TaskEnd::Registered => self.registered += 1,
            TaskEnd::Failed => self.failed += 1,
            TaskEnd::Rejected => self.rejected += 1,
            TaskEnd::Errored => self.errored += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskEnd {
    Registered,
    Failed,
    Rejected,
    Errored,
}

/// Drives every identity through sign-in under a global concurrency cap.
pub struct Registrar<B> {
    backend: Arc<B>,
    sink: Arc<ResultSink>,
    settings: Arc<RunSettings>,
}

impl<B: AuthBackend + 'static> Registrar<B> {
    pub fn new(backend: Arc<B>, sink: Arc<ResultSink>, mut settings: RunSettings) -> Self {
        if settings.concurrency == 0 {
            warn!("Concurrency of 0 requested, using 1");
            settings.concurrency = 1;
        }
        if settings.max_retries == 0 {
            warn!("Retry ceiling of 0 requested, using 1");
            settings.max_retries = 1;
        }

        Self {
            backend,
            sink,
            settings: Arc::new(settings),
        }
    }

    /// Register every key and wait for all of them to finish.
    ///
    /// Tasks start in submission order as slots free up. One identity's
    /// failure never affects another.
    pub async fn run(&self, keys: Vec<String>, proxies: Arc<ProxyPool>) -> RunSummary {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();

        info!(
            identities = keys.len(),
            proxies = proxies.len(),
            concurrency = self.settings.concurrency,
            max_retries = self.settings.max_retries,
            "Starting registration run"
        );

        for (i, raw_key) in keys.into_iter().enumerate() {
            // Acquiring here, before spawning, keeps start order FIFO.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Concurrency limiter closed: {}", e);
                    break;
                }
            };

            let task = IdentityTask {
                raw_key,
                backend: Arc::clone(&self.backend),
                sink: Arc::clone(&self.sink),
                settings: Arc::clone(&self.settings),
                proxies: Arc::clone(&proxies),
            };
            let span = info_span!("identity", idx = i + 1);

            tasks.spawn(
                async move {
                    let _permit = permit;
                    task.run().await
                }
                .instrument(span),
            );

            // Keep the set from growing unbounded on huge inputs.
            while let Some(done) = tasks.try_join_next() {
                summary.count(task_end(done));
            }
        }

        while let Some(done) = tasks.join_next().await {
            summary.count(task_end(done));
        }

        info!(
            registered = summary.registered,
            failed = summary.failed,
            rejected = summary.rejected,
            errored = summary.errored,
            "Registration run complete"
        );

        summary
    }
}

fn task_end(joined: Result<TaskEnd, tokio::task::JoinError>) -> TaskEnd {
    joined.unwrap_or_else(|e| {
        error!("Registration task aborted: {}", e);
        TaskEnd::Errored
    })
}

/// Everything one identity's task owns.
struct IdentityTask<B> {
    raw_key: String,
    backend: Arc<B>,
    sink: Arc<ResultSink>,
    settings: Arc<RunSettings>,
    proxies: Arc<ProxyPool>,
}

impl<B: AuthBackend> IdentityTask<B> {
    async fn run(self) -> TaskEnd {
        let identity = match Identity::from_private_key(&self.raw_key) {
            Ok(identity) => identity,
            Err(e) => {
                error!("Skipping identity: {}", e);
                return TaskEnd::Rejected;
            }
        };
        let masked = identity.masked_address();

        let proxy = self.proxies.next();
        if let Some(p) = proxy {
            info!(proxy = %p, "Assigned proxy for {}", masked);
        }

        let ip = match self.backend.current_ip(proxy).await {
            Ok(ip) => ip,
            Err(e) => {
                match proxy {
                    Some(p) => error!("Failed to get current IP using proxy {}: {}", p, e),
                    None => error!("Failed to get current IP: {}", e),
                }
                UNKNOWN_IP.to_string()
            }
        };
        info!("Current IP for wallet {}: {}", masked, ip);

        let state = self.attempt_loop(&identity, proxy).await;

        let address = identity.checksum_address();
        let raw_key = identity.expose_raw_key().to_string();
        let outcome = match state {
            AttemptState::Succeeded(token) => Outcome::Registered {
                address,
                raw_key,
                token,
            },
            other => {
                let attempts = match other {
                    AttemptState::Exhausted(n) => n,
                    _ => 0,
                };
                error!(
                    "Failed to obtain session token for {} after {} attempts",
                    masked, attempts
                );
                Outcome::Failed { address, raw_key }
            }
        };

        match self.sink.record(&outcome).await {
            Ok(()) if outcome.is_registered() => TaskEnd::Registered,
            Ok(()) => TaskEnd::Failed,
            Err(e) => {
                error!("Failed to record outcome for {}: {}", masked, e);
                TaskEnd::Errored
            }
        }
    }

    /// Run attempts until the state machine reaches a terminal state.
    async fn attempt_loop(
        &self,
        identity: &Identity,
        proxy: Option<&ProxyDescriptor>,
    ) -> AttemptState {
        let masked = identity.masked_address();
        let max_retries = self.settings.max_retries;
        let mut state = AttemptState::Pending.start();

        while let Some(attempt) = state.attempt() {
            let result = match identity.sign_login(&self.settings.login) {
                Ok(login) => self
                    .backend
                    .verify(&login, proxy)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match &result {
                Ok(_) => info!(outcome = "success", attempt, "Register successfully for {}", masked),
                Err(reason) => error!(attempt, max_retries, "Failed for {}: {}", masked, reason),
            }

            state = state.advance(result, max_retries);

            if state.attempt().is_some() {
                info!("Retrying wallet {}...", masked);
                if !self.settings.retry_delay.is_zero() {
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
            }
        }

        state
    }
}
