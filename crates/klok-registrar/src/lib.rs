//! Klok Registrar - bulk, proxy-aware account registration.
//!
//! Every private key in the input becomes one task that:
//! - derives the wallet address
//! - takes the next proxy from a shared round-robin pool (if any)
//! - signs a fresh sign-in message per attempt and exchanges it for a
//!   session token, up to a retry ceiling
//! - appends exactly one line to the success or failure file

pub mod config;
pub mod error;
pub mod input;
pub mod proxy_pool;
pub mod registrar;
pub mod retry;
pub mod sink;

pub use config::Config;
pub use error::{RegistrarError, RegistrarResult};
pub use proxy_pool::ProxyPool;
pub use registrar::{AuthBackend, Registrar, RunSettings, RunSummary};
pub use retry::AttemptState;
pub use sink::{Outcome, ResultSink};
