use blocklink::consensus::Verification;
use blocklink::core::{Block, Blockchain, Transaction};
use blocklink::crypto::hash::Hashable;
use blocklink::mining::valid_proof;
use blocklink::storage::Database;
use blocklink::wallet::Wallet;
use blocklink::LedgerError;
use tempfile::TempDir;

fn wallet(node_id: &str) -> Wallet {
    let mut wallet = Wallet::new(node_id);
    wallet.create_keys().unwrap();
    wallet
}

fn send(blockchain: &mut Blockchain, wallet: &Wallet, recipient: &str, amount: f64) -> blocklink::Result<Transaction> {
    let sender = wallet.public_key().unwrap();
    let signature = wallet.sign_transaction(&sender, recipient, amount)?;
    blockchain.add_transaction(recipient, &sender, &signature, amount)
}

#[test]
fn test_mine_send_mine_scenario() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path()).unwrap();
    let alice = wallet("5000");
    let bob = wallet("5001").public_key().unwrap();
    let owner = alice.public_key().unwrap();
    let mut blockchain = Blockchain::new(db, "5000", Some(owner.clone()));

    // Nothing to spend yet.
    assert!(matches!(
        send(&mut blockchain, &alice, &bob, 50.0),
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert!(blockchain.open_transactions().is_empty());

    blockchain.mine_block().unwrap();
    assert_eq!(blockchain.get_balance(&owner), 10.0);

    let transfer = send(&mut blockchain, &alice, &bob, 5.0).unwrap();
    assert_eq!(blockchain.open_transactions(), &[transfer.clone()]);
    // Pending income does not count yet.
    assert_eq!(blockchain.get_balance(&bob), 0.0);

    let block = blockchain.mine_block().unwrap();
    assert_eq!(block.transactions, vec![transfer, Transaction::new_reward(owner.clone(), 10.0)]);
    assert!(blockchain.open_transactions().is_empty());

    assert!(Verification::verify_chain(blockchain.chain()));
    assert_eq!(blockchain.get_balance(&bob), 5.0);
    assert_eq!(blockchain.get_balance(&owner), 15.0);
}

#[test]
fn test_tampering_with_history_is_detected() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(dir.path()).unwrap();
    let alice = wallet("5000");
    let mut blockchain = Blockchain::new(db, "5000", alice.public_key());
    blockchain.mine_block().unwrap();
    send(&mut blockchain, &alice, "bob", 5.0).unwrap();
    blockchain.mine_block().unwrap();
    blockchain.mine_block().unwrap();

    let mut chain = blockchain.chain().to_vec();
    assert!(Verification::verify_chain(&chain));

    chain[2].transactions[0].amount = 0.5;
    assert!(!Verification::verify_chain(&chain));
}

#[test]
fn test_external_block_leaves_pending_pool_untouched() {
    let dir = TempDir::new().unwrap();
    let alice = wallet("5000");
    let owner = alice.public_key().unwrap();

    // Two nodes with the same wallet share history up to the funding block.
    let mut local = Blockchain::new(Database::new(dir.path().join("a")).unwrap(), "5000", Some(owner.clone()));
    let mut remote = Blockchain::new(Database::new(dir.path().join("b")).unwrap(), "5000", Some(owner.clone()));
    let funding = remote.mine_block().unwrap();
    local.add_block(funding).unwrap();

    let transfer = send(&mut local, &alice, "bob", 3.0).unwrap();
    remote.add_transaction(&transfer.recipient, &transfer.sender, &transfer.signature, transfer.amount).unwrap();
    let block = remote.mine_block().unwrap();
    assert_eq!(block.transactions[0], transfer);

    local.add_block(block.clone()).unwrap();

    assert_eq!(local.last_block(), &block);
    // The already-mined transfer is still pending here.
    assert_eq!(local.open_transactions(), &[transfer]);
    assert!(local.verify_chain());
}

#[test]
fn test_external_block_checks() {
    let dir = TempDir::new().unwrap();
    let alice = wallet("5000");
    let mut local = Blockchain::new(Database::new(dir.path().join("a")).unwrap(), "5000", alice.public_key());
    let mut remote = Blockchain::new(Database::new(dir.path().join("b")).unwrap(), "5000", alice.public_key());
    remote.mine_block().unwrap();
    send(&mut remote, &alice, "bob", 1.0).unwrap();
    let second = remote.mine_block().unwrap();

    // Skipping ahead is refused.
    assert!(matches!(
        local.add_block(second.clone()),
        Err(LedgerError::BlockOutOfOrder { expected: 1, got: 2 })
    ));

    local.add_block(remote.chain()[1].clone()).unwrap();

    let mut forged = second.clone();
    forged.transactions[0].recipient = "mallory".to_string();
    // Re-seal the forged block so only the signature is wrong.
    forged.proof = (0..)
        .find(|p| valid_proof(forged.proof_transactions(), &forged.previous_hash, *p))
        .unwrap();
    assert!(matches!(local.add_block(forged), Err(LedgerError::InvalidSignature)));

    local.add_block(second).unwrap();
    assert_eq!(local.chain().len(), 3);
}

#[test]
fn test_state_is_restored_after_restart() {
    let dir = TempDir::new().unwrap();
    let alice = wallet("5000");
    {
        let mut blockchain = Blockchain::new(Database::new(dir.path()).unwrap(), "5000", alice.public_key());
        blockchain.mine_block().unwrap();
        send(&mut blockchain, &alice, "bob", 2.0).unwrap();
        blockchain.add_peer_node("localhost:5001").unwrap();
    }

    let restored = Blockchain::new(Database::new(dir.path()).unwrap(), "5000", alice.public_key());

    assert_eq!(restored.chain().len(), 2);
    assert_eq!(restored.chain()[1].previous_hash, Block::genesis().hash().to_hex());
    assert_eq!(restored.open_transactions().len(), 1);
    assert_eq!(restored.peer_nodes().iter().collect::<Vec<_>>(), vec!["localhost:5001"]);
    assert!(restored.verify_chain());
    assert!(restored.verify_open_transactions());
}
