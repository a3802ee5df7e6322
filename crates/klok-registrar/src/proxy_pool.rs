//! Round-robin proxy pool shared by all registration tasks.

use klok_client::ProxyDescriptor;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Immutable list of proxies plus one shared rotation cursor.
#[derive(Debug, Default)]
pub struct ProxyPool {
    proxies: Vec<ProxyDescriptor>,
    cursor: AtomicUsize,
}

impl ProxyPool {
    pub fn new(proxies: Vec<ProxyDescriptor>) -> Self {
        Self {
            proxies,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pool with no proxies; every task connects directly.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse raw proxy lines, dropping (and logging) the ones that fail.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = lines
            .into_iter()
            .filter_map(|line| match line.as_ref().parse::<ProxyDescriptor>() {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    warn!("Skipping proxy: {}", e);
                    None
                }
            })
            .collect();

        Self::new(proxies)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Take the next cursor value. Every caller gets a distinct value.
    pub fn next_index(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed)
    }

    /// Next proxy in rotation, or `None` when the pool is empty.
    ///
    /// The cursor is not advanced for an empty pool.
    pub fn next(&self) -> Option<&ProxyDescriptor> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = self.next_index() % self.proxies.len();
        self.proxies.get(index)
    }
}
