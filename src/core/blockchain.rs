use crate::core::{Block, Transaction};
use crate::consensus::{get_balance, Verification};
use crate::crypto::hash::Hashable;
use crate::mining::proof::{proof_of_work, valid_proof};
use crate::storage::{Database, LedgerState};
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;

pub const MINING_REWARD: f64 = 10.0;

/// Snapshot a proof-of-work search runs against. Committing it fails if the
/// ledger moved on in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningJob {
    pub index: u64,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    pub beneficiary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInfo {
    pub node_id: String,
    pub hosting_node: Option<String>,
    pub height: u64,
    pub tip: String,
    pub open_transactions: usize,
    pub peer_count: usize,
    pub halted: bool,
}

/// A node's ledger: the committed chain, the pending pool and the peer set,
/// persisted after every mutation.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    open_transactions: Vec<Transaction>,
    peer_nodes: BTreeSet<String>,
    hosting_node: Option<String>,
    node_id: String,
    db: Database,
    mining_reward: f64,
    halted: bool,
}

impl Blockchain {
    /// Loads the node's saved state, falling back to a genesis-only ledger
    /// when nothing usable is on disk.
    pub fn new(db: Database, node_id: impl Into<String>, hosting_node: Option<String>) -> Self {
        let node_id = node_id.into();

        let state = match db.load(&node_id) {
            Ok(Some(state)) if !state.chain.is_empty() => state,
            Ok(Some(_)) => {
                log::warn!("⚠️  Saved ledger for node {} has no blocks, starting from genesis", node_id);
                Self::genesis_state()
            }
            Ok(None) => {
                log::info!("📦 No saved ledger for node {}, starting from genesis", node_id);
                Self::genesis_state()
            }
            Err(e) => {
                log::warn!("⚠️  Could not load ledger for node {} ({}), starting from genesis", node_id, e);
                Self::genesis_state()
            }
        };

        let halted = !Verification::verify_chain(&state.chain);
        if halted {
            log::error!("❌ Stored chain for node {} failed verification; mutations are disabled", node_id);
        }

        Self {
            chain: state.chain,
            open_transactions: state.open_transactions,
            peer_nodes: state.peer_nodes,
            hosting_node,
            node_id,
            db,
            mining_reward: MINING_REWARD,
            halted,
        }
    }

    pub fn with_mining_reward(mut self, mining_reward: f64) -> Self {
        self.mining_reward = mining_reward;
        self
    }

    fn genesis_state() -> LedgerState {
        LedgerState {
            chain: vec![Block::genesis()],
            ..LedgerState::default()
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn open_transactions(&self) -> &[Transaction] {
        &self.open_transactions
    }

    pub fn peer_nodes(&self) -> &BTreeSet<String> {
        &self.peer_nodes
    }

    pub fn hosting_node(&self) -> Option<&str> {
        self.hosting_node.as_deref()
    }

    pub fn set_hosting_node(&mut self, hosting_node: Option<String>) {
        self.hosting_node = hosting_node;
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn last_block(&self) -> &Block {
        // The chain always holds at least the genesis block.
        &self.chain[self.chain.len() - 1]
    }

    pub fn get_balance(&self, participant: &str) -> f64 {
        get_balance(participant, &self.chain, &self.open_transactions)
    }

    pub fn owner_balance(&self) -> Option<f64> {
        self.hosting_node.as_deref().map(|owner| self.get_balance(owner))
    }

    pub fn verify_chain(&self) -> bool {
        Verification::verify_chain(&self.chain)
    }

    pub fn verify_open_transactions(&self) -> bool {
        Verification::verify_transactions(&self.open_transactions, |p| self.get_balance(p))
    }

    pub fn get_chain_info(&self) -> ChainInfo {
        ChainInfo {
            node_id: self.node_id.clone(),
            hosting_node: self.hosting_node.clone(),
            height: self.last_block().index,
            tip: self.last_block().hash().to_hex(),
            open_transactions: self.open_transactions.len(),
            peer_count: self.peer_nodes.len(),
            halted: self.halted,
        }
    }

    fn ensure_operational(&self) -> Result<()> {
        if self.halted {
            return Err(LedgerError::ChainCorrupted);
        }
        Ok(())
    }

    /// Signs nothing; `signature` must already cover `(sender, recipient, amount)`.
    pub fn add_transaction(
        &mut self,
        recipient: &str,
        sender: &str,
        signature: &str,
        amount: f64,
    ) -> Result<Transaction> {
        self.ensure_operational()?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let transaction = Transaction::new(
            sender.to_string(),
            recipient.to_string(),
            signature.to_string(),
            amount,
        );

        if let Err(e) = Verification::check_transaction(&transaction, |p| self.get_balance(p), true) {
            log::warn!("🚫 Rejected transaction of {} from {}: {}", amount, sender, e);
            return Err(e);
        }

        self.open_transactions.push(transaction.clone());
        self.save();

        log::info!("💸 Accepted transaction of {} to {}", amount, recipient);
        Ok(transaction)
    }

    pub fn prepare_mining(&self) -> Result<MiningJob> {
        self.ensure_operational()?;
        let beneficiary = self.hosting_node.clone().ok_or(LedgerError::NoWallet)?;

        Ok(MiningJob {
            index: self.chain.len() as u64,
            previous_hash: self.last_block().hash().to_hex(),
            transactions: self.open_transactions.clone(),
            beneficiary,
        })
    }

    /// Seals `job` with `proof`: re-checks pooled signatures, appends the
    /// reward transaction and the block, then clears the pool.
    pub fn commit_mined(&mut self, job: MiningJob, proof: u64) -> Result<Block> {
        self.ensure_operational()?;

        if job.index != self.chain.len() as u64
            || job.previous_hash != self.last_block().hash().to_hex()
            || job.transactions != self.open_transactions
        {
            return Err(LedgerError::StaleWork);
        }

        if !valid_proof(&job.transactions, &job.previous_hash, proof) {
            return Err(LedgerError::InvalidProofOfWork);
        }

        for tx in &job.transactions {
            if let Err(e) = Verification::check_transaction(tx, |p| self.get_balance(p), false) {
                log::warn!("🚫 Refusing to mine: pending transaction from {} failed re-verification", tx.sender);
                return Err(e);
            }
        }

        let mut transactions = job.transactions;
        transactions.push(Transaction::new_reward(job.beneficiary, self.mining_reward));

        let block = Block::new(job.index, job.previous_hash, transactions, proof);
        self.chain.push(block.clone());
        self.open_transactions.clear();
        self.save();

        log::info!("⛏️  Block {} mined with proof {}", block.index, block.proof);
        Ok(block)
    }

    /// Mines on the calling thread. The node service uses `prepare_mining` and
    /// `commit_mined` instead so the search can run elsewhere.
    pub fn mine_block(&mut self) -> Result<Block> {
        let job = self.prepare_mining()?;
        let proof = proof_of_work(&job.transactions, &job.previous_hash, &AtomicBool::new(false))
            .ok_or_else(|| LedgerError::Mining("Proof search exhausted".to_string()))?;
        self.commit_mined(job, proof)
    }

    /// Validates a block received from a peer against the current tip without
    /// mutating anything.
    pub fn check_block(&self, block: &Block) -> Result<()> {
        self.ensure_operational()?;

        let expected = self.chain.len() as u64;
        if block.index != expected {
            return Err(LedgerError::BlockOutOfOrder {
                expected,
                got: block.index,
            });
        }

        let (_, paid) = block.transactions.split_last()
            .ok_or_else(|| LedgerError::MalformedBlock("block has no reward transaction".to_string()))?;
        if paid.iter().any(Transaction::is_reward) {
            return Err(LedgerError::MalformedBlock("reward transaction before the end of the block".to_string()));
        }

        if !valid_proof(block.proof_transactions(), &block.previous_hash, block.proof) {
            return Err(LedgerError::InvalidProofOfWork);
        }

        if block.previous_hash != self.last_block().hash().to_hex() {
            return Err(LedgerError::InvalidBlockLinkage);
        }

        for tx in paid {
            Verification::check_transaction(tx, |p| self.get_balance(p), false)?;
        }

        Ok(())
    }

    /// Appends a block received from a peer once `check_block` passes.
    ///
    /// The pending pool is left as is, even if it holds transactions the block
    /// already carries.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        if let Err(e) = self.check_block(&block) {
            log::warn!("🚫 Rejected block {}: {}", block.index, e);
            return Err(e);
        }

        log::info!("📥 Accepted block {} from peer", block.index);
        self.chain.push(block);
        self.save();
        Ok(())
    }

    /// Returns whether the peer was new.
    pub fn add_peer_node(&mut self, node: &str) -> Result<bool> {
        let node = node.trim();
        if node.is_empty() {
            return Err(LedgerError::InvalidInput("Peer address must not be empty".to_string()));
        }

        let added = self.peer_nodes.insert(node.to_string());
        if added {
            self.save();
            log::info!("🤝 Added peer {}", node);
        }
        Ok(added)
    }

    /// Returns whether the peer was known.
    pub fn remove_peer_node(&mut self, node: &str) -> bool {
        let removed = self.peer_nodes.remove(node.trim());
        if removed {
            self.save();
            log::info!("👋 Removed peer {}", node);
        }
        removed
    }

    /// Full-state rewrite. A failed save is logged; the in-memory ledger stays
    /// authoritative and the next mutation retries.
    fn save(&self) {
        if let Err(e) = self.db.save(&self.node_id, &self.chain, &self.open_transactions, &self.peer_nodes) {
            log::error!("❌ Saving ledger for node {} failed: {}", self.node_id, e);
        }
    }
}
