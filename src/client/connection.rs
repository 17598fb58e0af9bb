// Connection handle
//
// Wraps the HTTP client that requests go through. Closing a connection is
// dropping it; the shared stats track how many are alive.

use reqwest::Client;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{ClientError, Result};

/// Counters shared by every connection a client opens
#[derive(Debug, Default)]
pub(crate) struct ConnectionStats {
    opened: AtomicU64,
    open: AtomicUsize,
}

impl ConnectionStats {
    pub(crate) fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// A live network session
pub(crate) struct Connection {
    id: u64,
    http: Client,
    stats: Arc<ConnectionStats>,
}

impl Connection {
    /// Build a new HTTP client and register it in `stats`
    pub(crate) fn open(stats: &Arc<ConnectionStats>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::transport("open connection", e))?;

        let id = stats.opened.fetch_add(1, Ordering::SeqCst) + 1;
        stats.open.fetch_add(1, Ordering::SeqCst);
        debug!(connection = id, "Opened connection");

        Ok(Self {
            id,
            http,
            stats: Arc::clone(stats),
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.stats.open.fetch_sub(1, Ordering::SeqCst);
        debug!(connection = self.id, "Closed connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_follow_connection_lifetime() {
        let stats = Arc::new(ConnectionStats::default());

        let first = Connection::open(&stats, None).unwrap();
        let second = Connection::open(&stats, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(stats.opened(), 2);
        assert_eq!(stats.open(), 2);

        drop(first);
        assert_eq!(stats.open(), 1);
        drop(second);
        assert_eq!(stats.open(), 0);
        assert_eq!(stats.opened(), 2);
    }
}
