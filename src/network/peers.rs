use crate::core::{Block, Transaction};
use crate::network::protocol::{
    BroadcastBlock, BroadcastReport, BroadcastTransaction, DeliveryOutcome, BROADCAST_BLOCK_PATH,
    BROADCAST_TRANSACTION_PATH,
};
use crate::{LedgerError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(3);

/// Delivers gossip to a single peer. Implementations report failures through
/// `DeliveryOutcome` instead of returning errors.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn post_transaction(&self, peer: &str, tx: &Transaction) -> DeliveryOutcome;
    async fn post_block(&self, peer: &str, block: &Block) -> DeliveryOutcome;
}

/// JSON over HTTP to `http://<peer>/broadcast-*`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Network(format!("HTTP client error: {}", e)))?;

        Ok(Self { client })
    }

    async fn post<T: Serialize + Sync>(&self, peer: &str, path: &str, body: &T) -> DeliveryOutcome {
        let url = format!("http://{}{}", peer, path);

        let response = match self.client.post(&url).json(body).send().await {
            Ok(response) => response,
            Err(e) => return DeliveryOutcome::Unreachable(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            return DeliveryOutcome::Accepted;
        }

        // Peers answer with the API envelope; fall back to the raw status.
        let reason = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(|e| e.as_str())
                .map(|e| format!("HTTP {}: {}", status, e))
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        if status.is_server_error() {
            DeliveryOutcome::Unreachable(reason)
        } else {
            DeliveryOutcome::Declined(reason)
        }
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn post_transaction(&self, peer: &str, tx: &Transaction) -> DeliveryOutcome {
        self.post(peer, BROADCAST_TRANSACTION_PATH, &BroadcastTransaction::from(tx)).await
    }

    async fn post_block(&self, peer: &str, block: &Block) -> DeliveryOutcome {
        let body = BroadcastBlock { block: block.clone() };
        self.post(peer, BROADCAST_BLOCK_PATH, &body).await
    }
}

/// Best-effort gossip to every known peer, one at a time.
///
/// Each delivery is bounded by `timeout`. Nothing a peer does (refusing,
/// hanging, vanishing) rolls back or fails the local operation.
#[derive(Clone)]
pub struct PeerReconciler {
    transport: Arc<dyn PeerTransport>,
    timeout: Duration,
}

impl PeerReconciler {
    pub fn new(transport: Arc<dyn PeerTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn http(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(timeout)?), timeout))
    }

    pub async fn broadcast_transaction(&self, peers: &BTreeSet<String>, tx: &Transaction) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for peer in peers {
            let outcome = self
                .bounded(peer, self.transport.post_transaction(peer, tx))
                .await;
            log_outcome("transaction", peer, &outcome);
            report.record(peer, outcome);
        }

        report
    }

    pub async fn broadcast_block(&self, peers: &BTreeSet<String>, block: &Block) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for peer in peers {
            let outcome = self
                .bounded(peer, self.transport.post_block(peer, block))
                .await;
            log_outcome(&format!("block {}", block.index), peer, &outcome);
            report.record(peer, outcome);
        }

        report
    }

    async fn bounded<F>(&self, peer: &str, delivery: F) -> DeliveryOutcome
    where
        F: std::future::Future<Output = DeliveryOutcome>,
    {
        match tokio::time::timeout(self.timeout, delivery).await {
            Ok(outcome) => outcome,
            Err(_) => DeliveryOutcome::Unreachable(format!("{} timed out after {:?}", peer, self.timeout)),
        }
    }
}

fn log_outcome(what: &str, peer: &str, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Accepted => log::debug!("📡 Sent {} to {}", what, peer),
        DeliveryOutcome::Declined(reason) => log::warn!("⚠️  Peer {} declined {}: {}", peer, what, reason),
        DeliveryOutcome::Unreachable(reason) => log::warn!("⚠️  Peer {} unreachable for {}: {}", peer, what, reason),
    }
}
