//! Klok sign-in API client with per-call proxy routing.

mod client;
mod error;
mod proxy;
mod types;

pub use client::{ClientOptions, KlokClient};
pub use error::KlokError;
pub use proxy::{ProxyDescriptor, ProxyProtocol};
pub use types::*;
