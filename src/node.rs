//! Node service: owns the ledger, the wallet, the miner and peer gossip, and
//! serialises every mutation through a single gate.

use crate::core::{Block, Blockchain, ChainInfo, Transaction, MINING_REWARD};
use crate::mining::{Miner, MiningStats};
use crate::network::{BroadcastReport, BroadcastTransaction, PeerReconciler, DEFAULT_PEER_TIMEOUT};
use crate::storage::Database;
use crate::wallet::Wallet;
use crate::{LedgerError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

const CANCEL_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct NodeOptions {
    pub node_id: String,
    pub mining_reward: f64,
    pub peer_timeout: Duration,
    pub bootstrap_peers: Vec<String>,
}

impl NodeOptions {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            mining_reward: MINING_REWARD,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            bootstrap_peers: Vec::new(),
        }
    }
}

pub struct Node {
    blockchain: Arc<RwLock<Blockchain>>,
    wallet: RwLock<Wallet>,
    db: Database,
    miner: Miner,
    reconciler: PeerReconciler,
    // Held for the whole of every mutation, including a proof search.
    gate: Mutex<()>,
}

impl Node {
    /// Opens a node with HTTP gossip.
    pub fn open(db: Database, options: NodeOptions) -> Result<Self> {
        let reconciler = PeerReconciler::http(options.peer_timeout)?;
        Ok(Self::with_reconciler(db, options, reconciler))
    }

    /// Loads the wallet (if one was saved) and the ledger for `options.node_id`.
    pub fn with_reconciler(db: Database, options: NodeOptions, reconciler: PeerReconciler) -> Self {
        let mut wallet = Wallet::new(options.node_id.clone());
        match wallet.load_keys(&db) {
            Ok(true) => log::info!("🔑 Loaded wallet for node {}", options.node_id),
            Ok(false) => log::info!("🔑 No wallet for node {} yet", options.node_id),
            Err(e) => log::warn!("⚠️  Could not load wallet for node {}: {}", options.node_id, e),
        }

        let mut blockchain = Blockchain::new(db.clone(), options.node_id.clone(), wallet.public_key())
            .with_mining_reward(options.mining_reward);

        for peer in &options.bootstrap_peers {
            if let Err(e) = blockchain.add_peer_node(peer) {
                log::warn!("⚠️  Skipping bootstrap peer {:?}: {}", peer, e);
            }
        }

        log::info!("🚀 Node {} ready at height {}", options.node_id, blockchain.last_block().index);

        Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            wallet: RwLock::new(wallet),
            db,
            miner: Miner::new(),
            reconciler,
            gate: Mutex::new(()),
        }
    }

    pub fn blockchain(&self) -> Arc<RwLock<Blockchain>> {
        self.blockchain.clone()
    }

    pub fn miner_stats(&self) -> MiningStats {
        self.miner.get_stats()
    }

    // Reads

    pub async fn chain(&self) -> Vec<Block> {
        self.blockchain.read().await.chain().to_vec()
    }

    pub async fn open_transactions(&self) -> Vec<Transaction> {
        self.blockchain.read().await.open_transactions().to_vec()
    }

    pub async fn peer_nodes(&self) -> BTreeSet<String> {
        self.blockchain.read().await.peer_nodes().clone()
    }

    pub async fn chain_info(&self) -> ChainInfo {
        self.blockchain.read().await.get_chain_info()
    }

    pub async fn public_key(&self) -> Option<String> {
        self.wallet.read().await.public_key()
    }

    /// Balance of `participant`, or of this node's wallet when `None`.
    pub async fn balance(&self, participant: Option<&str>) -> Result<(String, f64)> {
        let participant = match participant {
            Some(participant) => participant.to_string(),
            None => self.public_key().await.ok_or(LedgerError::NoWallet)?,
        };

        let balance = self.blockchain.read().await.get_balance(&participant);
        Ok((participant, balance))
    }

    pub async fn verify_chain(&self) -> bool {
        self.blockchain.read().await.verify_chain()
    }

    pub async fn verify_open_transactions(&self) -> bool {
        self.blockchain.read().await.verify_open_transactions()
    }

    // Wallet

    /// Generates and saves fresh keys, then credits future mining to them.
    pub async fn create_wallet(&self) -> Result<String> {
        let _gate = self.gate.lock().await;

        let public_key = {
            let mut wallet = self.wallet.write().await;
            wallet.create_keys()?;
            wallet.save_keys(&self.db)?;
            wallet.public_key().ok_or(LedgerError::NoWallet)?
        };

        self.blockchain.write().await.set_hosting_node(Some(public_key.clone()));
        Ok(public_key)
    }

    /// Reloads keys from disk; `NoWallet` when none were saved.
    pub async fn load_wallet(&self) -> Result<String> {
        let _gate = self.gate.lock().await;

        let public_key = {
            let mut wallet = self.wallet.write().await;
            if !wallet.load_keys(&self.db)? {
                return Err(LedgerError::NoWallet);
            }
            wallet.public_key().ok_or(LedgerError::NoWallet)?
        };

        self.blockchain.write().await.set_hosting_node(Some(public_key.clone()));
        Ok(public_key)
    }

    // Mutations

    /// Signs a transfer from this node's wallet, queues it and gossips it.
    pub async fn add_transaction(&self, recipient: &str, amount: f64) -> Result<(Transaction, BroadcastReport)> {
        let (tx, peers) = {
            let _gate = self.gate.lock().await;

            let (sender, signature) = {
                let wallet = self.wallet.read().await;
                let sender = wallet.public_key().ok_or(LedgerError::NoWallet)?;
                let signature = wallet.sign_transaction(&sender, recipient, amount)?;
                (sender, signature)
            };

            let mut blockchain = self.blockchain.write().await;
            let tx = blockchain.add_transaction(recipient, &sender, &signature, amount)?;
            (tx, blockchain.peer_nodes().clone())
        };

        let report = self.reconciler.broadcast_transaction(&peers, &tx).await;
        Ok((tx, report))
    }

    /// Admits a transaction gossiped by a peer. Never re-broadcast.
    pub async fn receive_transaction(&self, incoming: BroadcastTransaction) -> Result<Transaction> {
        let _gate = self.gate.lock().await;

        self.blockchain.write().await.add_transaction(
            &incoming.recipient,
            &incoming.sender,
            &incoming.signature,
            incoming.amount,
        )
    }

    /// Mines the pending pool into a new block and gossips it.
    ///
    /// The proof search runs on a blocking worker while reads continue. An
    /// external block arriving mid-search cancels it (`MiningCancelled`).
    pub async fn mine_block(&self) -> Result<(Block, BroadcastReport)> {
        let (block, peers) = {
            let _gate = self.gate.lock().await;

            let job = self.blockchain.read().await.prepare_mining()?;
            let proof = self
                .miner
                .search(job.transactions.clone(), job.previous_hash.clone())
                .await?
                .ok_or(LedgerError::MiningCancelled)?;

            let mut blockchain = self.blockchain.write().await;
            let block = blockchain.commit_mined(job, proof)?;
            self.miner.record_block();
            (block, blockchain.peer_nodes().clone())
        };

        let report = self.reconciler.broadcast_block(&peers, &block).await;
        Ok((block, report))
    }

    /// Validates and appends a block gossiped by a peer. The pending pool is
    /// not touched.
    pub async fn add_external_block(&self, block: Block) -> Result<()> {
        self.blockchain.read().await.check_block(&block)?;

        // A valid successor makes any in-flight search stale; keep stopping
        // it until the gate frees up.
        let _gate = loop {
            if self.miner.cancel() {
                log::info!("🛑 Stopping local mining for incoming block {}", block.index);
            }
            if let Ok(gate) = tokio::time::timeout(CANCEL_POLL, self.gate.lock()).await {
                break gate;
            }
        };

        self.blockchain.write().await.add_block(block)
    }

    pub async fn add_peer(&self, node: &str) -> Result<bool> {
        let _gate = self.gate.lock().await;
        self.blockchain.write().await.add_peer_node(node)
    }

    pub async fn remove_peer(&self, node: &str) -> bool {
        let _gate = self.gate.lock().await;
        self.blockchain.write().await.remove_peer_node(node)
    }
}
