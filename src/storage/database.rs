use crate::core::{Block, Transaction};
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const CHAIN_FILE_PREFIX: &str = "blockchain";
const WALLET_FILE_PREFIX: &str = "wallet";

/// Everything a node persists: chain, pending pool and peer set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub chain: Vec<Block>,
    pub open_transactions: Vec<Transaction>,
    pub peer_nodes: BTreeSet<String>,
}

/// Hex-encoded key material as stored in a wallet file.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredKeys {
    pub public_key: String,
    pub private_key: String,
}

/// Flat-file store, one set of files per node id.
///
/// Ledger file: three lines of JSON (chain, pending pool, peers).
/// Wallet file: two lines (public key hex, private key hex).
/// Every write goes to a temp file in the same directory and is renamed over
/// the target, so a crash leaves either the old or the new state on disk.
#[derive(Debug, Clone)]
pub struct Database {
    data_dir: PathBuf,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)
            .map_err(|e| LedgerError::Storage(format!("Failed to create data dir {}: {}", data_dir.display(), e)))?;

        Ok(Self { data_dir })
    }

    pub fn ledger_path(&self, node_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}-{}.txt", CHAIN_FILE_PREFIX, node_id))
    }

    pub fn wallet_path(&self, node_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}-{}.txt", WALLET_FILE_PREFIX, node_id))
    }

    // Ledger state

    /// `Ok(None)` when no state was ever saved for `node_id`; `Err` when the
    /// file exists but cannot be read or parsed.
    pub fn load(&self, node_id: &str) -> Result<Option<LedgerState>> {
        let path = self.ledger_path(node_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::Storage(format!("Failed to read {}: {}", path.display(), e))),
        };

        let mut lines = content.lines();

        let chain: Vec<Block> = parse_line(lines.next(), "chain")?;
        let open_transactions: Vec<Transaction> = parse_line(lines.next(), "open transactions")?;
        // Files written before peers were tracked carry only two lines.
        let peer_nodes: BTreeSet<String> = match lines.next() {
            Some(line) if !line.trim().is_empty() => serde_json::from_str(line)
                .map_err(|e| LedgerError::Storage(format!("Malformed peer nodes line: {}", e)))?,
            _ => BTreeSet::new(),
        };

        if chain.is_empty() {
            return Err(LedgerError::Storage("Stored chain has no genesis block".to_string()));
        }

        log::debug!("💾 Loaded {} blocks, {} open transactions, {} peers for node {}",
                   chain.len(), open_transactions.len(), peer_nodes.len(), node_id);

        Ok(Some(LedgerState {
            chain,
            open_transactions,
            peer_nodes,
        }))
    }

    pub fn save(
        &self,
        node_id: &str,
        chain: &[Block],
        open_transactions: &[Transaction],
        peer_nodes: &BTreeSet<String>,
    ) -> Result<()> {
        let mut content = serde_json::to_string(chain)?;
        content.push('\n');
        content.push_str(&serde_json::to_string(open_transactions)?);
        content.push('\n');
        content.push_str(&serde_json::to_string(peer_nodes)?);

        self.write_atomic(&self.ledger_path(node_id), &content)?;

        log::debug!("💾 Saved {} blocks for node {}", chain.len(), node_id);
        Ok(())
    }

    // Wallet keys

    pub fn load_keys(&self, node_id: &str) -> Result<Option<StoredKeys>> {
        let path = self.wallet_path(node_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::Storage(format!("Failed to read {}: {}", path.display(), e))),
        };

        let mut lines = content.lines().map(str::trim);
        match (lines.next(), lines.next()) {
            (Some(public_key), Some(private_key)) if !public_key.is_empty() && !private_key.is_empty() => {
                Ok(Some(StoredKeys {
                    public_key: public_key.to_string(),
                    private_key: private_key.to_string(),
                }))
            }
            _ => Err(LedgerError::Storage(format!("Malformed wallet file {}", path.display()))),
        }
    }

    pub fn save_keys(&self, node_id: &str, keys: &StoredKeys) -> Result<()> {
        let content = format!("{}\n{}", keys.public_key, keys.private_key);
        self.write_atomic(&self.wallet_path(node_id), &content)?;

        log::debug!("💾 Saved wallet keys for node {}", node_id);
        Ok(())
    }

    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let mut file = NamedTempFile::new_in(&self.data_dir)
            .map_err(|e| LedgerError::Storage(format!("Failed to create temp file: {}", e)))?;

        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;

        file.persist(path)
            .map_err(|e| LedgerError::Storage(format!("Failed to replace {}: {}", path.display(), e.error)))?;

        Ok(())
    }
}

fn parse_line<T: serde::de::DeserializeOwned>(line: Option<&str>, what: &str) -> Result<T> {
    let line = line.ok_or_else(|| LedgerError::Storage(format!("Missing {} line", what)))?;
    serde_json::from_str(line)
        .map_err(|e| LedgerError::Storage(format!("Malformed {} line: {}", what, e)))
}
