use crate::core::Transaction;
use crate::mining::proof::proof_of_work;
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningStats {
    pub is_mining: bool,
    pub blocks_mined: u64,
    pub searches_cancelled: u64,
    pub last_proof: Option<u64>,
    pub last_search_ms: Option<u64>,
}

/// Runs proof-of-work searches off the async runtime and lets another task
/// stop an in-flight search.
pub struct Miner {
    is_mining: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    blocks_mined: AtomicU64,
    searches_cancelled: AtomicU64,
    // u64::MAX marks "none yet"
    last_proof: AtomicU64,
    last_search_ms: AtomicU64,
    // Parks a search before its first attempt until released or cancelled.
    #[cfg(test)]
    hold: Arc<AtomicBool>,
}

impl Miner {
    pub fn new() -> Self {
        Self {
            is_mining: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            blocks_mined: AtomicU64::new(0),
            searches_cancelled: AtomicU64::new(0),
            last_proof: AtomicU64::new(u64::MAX),
            last_search_ms: AtomicU64::new(u64::MAX),
            #[cfg(test)]
            hold: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Searches for a proof on a blocking worker thread.
    ///
    /// `Ok(None)` means the search was cancelled.
    pub async fn search(&self, transactions: Vec<Transaction>, previous_hash: String) -> Result<Option<u64>> {
        self.cancel.store(false, Ordering::SeqCst);
        self.is_mining.store(true, Ordering::SeqCst);

        log::info!("⛏️  Searching proof over {} pending transaction(s)", transactions.len());

        let cancel = self.cancel.clone();
        #[cfg(test)]
        let hold = self.hold.clone();
        let start_time = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            #[cfg(test)]
            while hold.load(Ordering::SeqCst) && !cancel.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            proof_of_work(&transactions, &previous_hash, &cancel)
        }).await;

        self.is_mining.store(false, Ordering::SeqCst);
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        let proof = outcome.map_err(|e| LedgerError::Mining(format!("Mining worker failed: {}", e)))?;
        match proof {
            Some(proof) => {
                self.last_proof.store(proof, Ordering::Relaxed);
                self.last_search_ms.store(elapsed_ms, Ordering::Relaxed);
                log::info!("✅ Proof {} found in {} ms", proof, elapsed_ms);
            }
            None => {
                self.searches_cancelled.fetch_add(1, Ordering::Relaxed);
                log::info!("🛑 Proof search stopped after {} ms", elapsed_ms);
            }
        }

        Ok(proof)
    }

    /// Raises the stop signal if a search is running. Returns whether one was.
    pub fn cancel(&self) -> bool {
        if self.is_mining.load(Ordering::SeqCst) {
            self.cancel.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub(crate) fn hold_searches(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    pub fn record_block(&self) {
        self.blocks_mined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_mining(&self) -> bool {
        self.is_mining.load(Ordering::SeqCst)
    }

    pub fn get_stats(&self) -> MiningStats {
        let optional = |value: u64| if value == u64::MAX { None } else { Some(value) };

        MiningStats {
            is_mining: self.is_mining(),
            blocks_mined: self.blocks_mined.load(Ordering::Relaxed),
            searches_cancelled: self.searches_cancelled.load(Ordering::Relaxed),
            last_proof: optional(self.last_proof.load(Ordering::Relaxed)),
            last_search_ms: optional(self.last_search_ms.load(Ordering::Relaxed)),
        }
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::proof::valid_proof;

    #[tokio::test]
    async fn test_search_finds_valid_proof() -> Result<()> {
        let miner = Miner::new();
        let txs = vec![Transaction::new("a".to_string(), "b".to_string(), "s".to_string(), 1.0)];

        let proof = miner.search(txs.clone(), "prev".to_string()).await?.unwrap();

        assert!(valid_proof(&txs, "prev", proof));
        let stats = miner.get_stats();
        assert!(!stats.is_mining);
        assert_eq!(stats.last_proof, Some(proof));
        assert_eq!(stats.blocks_mined, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_stops_running_search() -> Result<()> {
        let miner = Arc::new(Miner::new());
        miner.hold_searches(true);

        let searching = miner.clone();
        let search = tokio::spawn(async move { searching.search(vec![], "prev".to_string()).await });
        while !miner.is_mining() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        assert!(miner.cancel());
        assert_eq!(search.await.unwrap()?, None);
        assert_eq!(miner.get_stats().searches_cancelled, 1);

        Ok(())
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let miner = Miner::new();

        assert!(!miner.cancel());
        assert!(!miner.is_mining());
        assert_eq!(miner.get_stats().last_proof, None);
    }

    #[test]
    fn test_record_block() {
        let miner = Miner::new();
        miner.record_block();
        miner.record_block();

        assert_eq!(miner.get_stats().blocks_mined, 2);
    }
}
