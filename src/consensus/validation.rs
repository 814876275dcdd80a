use crate::core::{Block, Transaction};
use crate::crypto::hash::Hashable;
use crate::mining::proof::valid_proof;
use crate::wallet::Wallet;
use crate::{LedgerError, Result};

/// Chain and transaction checks. Stateless; callers pass in the data and a
/// balance lookup.
pub struct Verification;

impl Verification {
    /// Checks that the chain starts at genesis, that every block sits at its own
    /// index, and that blocks 1.. each link to their predecessor with a valid
    /// proof of work.
    pub fn verify_chain(chain: &[Block]) -> bool {
        Self::first_invalid_block(chain).is_none()
    }

    /// Index of the first block that breaks the chain, if any. An empty chain
    /// is missing its genesis block and reports `Some(0)`.
    pub fn first_invalid_block(chain: &[Block]) -> Option<usize> {
        if !chain.first().is_some_and(Block::is_genesis) {
            log::warn!("Chain does not start with the genesis block");
            return Some(0);
        }

        for (index, pair) in chain.windows(2).enumerate() {
            let (previous, block) = (&pair[0], &pair[1]);
            let position = index + 1;

            if block.index != position as u64 {
                log::warn!("Block at position {} claims index {}", position, block.index);
                return Some(position);
            }

            if block.previous_hash != previous.hash().to_hex() {
                log::warn!("Block {} does not link to its predecessor", position);
                return Some(position);
            }

            if block.transactions.is_empty()
                || !valid_proof(block.proof_transactions(), &block.previous_hash, block.proof)
            {
                log::warn!("Proof of work is invalid for block {}", position);
                return Some(position);
            }
        }

        None
    }

    /// Reward transactions always pass. With `check_funds` the amount must be
    /// covered by `balance(sender)`; the signature is always checked.
    pub fn check_transaction<F>(tx: &Transaction, balance: F, check_funds: bool) -> Result<()>
    where
        F: Fn(&str) -> f64,
    {
        if tx.is_reward() {
            return Ok(());
        }

        if check_funds {
            let available = balance(&tx.sender);
            if tx.amount > available {
                return Err(LedgerError::InsufficientFunds {
                    required: tx.amount,
                    available,
                });
            }
        }

        if !Wallet::verify_transaction(tx) {
            return Err(LedgerError::InvalidSignature);
        }

        Ok(())
    }

    pub fn verify_transaction<F>(tx: &Transaction, balance: F, check_funds: bool) -> bool
    where
        F: Fn(&str) -> f64,
    {
        Self::check_transaction(tx, balance, check_funds).is_ok()
    }

    /// Signature check over a whole pool; funds were settled at admission.
    pub fn verify_transactions<F>(open_transactions: &[Transaction], balance: F) -> bool
    where
        F: Fn(&str) -> f64,
    {
        open_transactions
            .iter()
            .all(|tx| Self::verify_transaction(tx, &balance, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::proof::proof_of_work;
    use std::sync::atomic::AtomicBool;

    fn signed(wallet: &Wallet, recipient: &str, amount: f64) -> Transaction {
        let sender = wallet.public_key().unwrap();
        let signature = wallet.sign_transaction(&sender, recipient, amount).unwrap();
        Transaction::new(sender, recipient.to_string(), signature, amount)
    }

    fn mine_onto(chain: &mut Vec<Block>, mut transactions: Vec<Transaction>, miner: &str) {
        let previous_hash = chain.last().unwrap().hash().to_hex();
        let proof = proof_of_work(&transactions, &previous_hash, &AtomicBool::new(false)).unwrap();
        transactions.push(Transaction::new_reward(miner.to_string(), 10.0));
        chain.push(Block::new(chain.len() as u64, previous_hash, transactions, proof));
    }

    fn valid_chain(wallet: &Wallet) -> Vec<Block> {
        let owner = wallet.public_key().unwrap();
        let mut chain = vec![Block::genesis()];
        mine_onto(&mut chain, vec![], &owner);
        mine_onto(&mut chain, vec![signed(wallet, "bob", 5.0)], &owner);
        mine_onto(&mut chain, vec![signed(wallet, "carol", 1.0)], &owner);
        chain
    }

    fn wallet() -> Wallet {
        let mut wallet = Wallet::new("test");
        wallet.create_keys().unwrap();
        wallet
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        assert!(Verification::verify_chain(&[Block::genesis()]));
        assert_eq!(Verification::first_invalid_block(&[]), Some(0));
    }

    #[test]
    fn test_mined_chain_is_valid_and_linked() {
        let chain = valid_chain(&wallet());

        assert!(Verification::verify_chain(&chain));
        for block in chain.iter().skip(1) {
            assert_eq!(block.previous_hash, chain[block.index as usize - 1].hash().to_hex());
        }
    }

    #[test]
    fn test_tampered_transactions_break_the_chain() {
        let mut chain = valid_chain(&wallet());
        chain[2].transactions[0].amount = 500.0;

        assert!(!Verification::verify_chain(&chain));
        // Block 2's own proof no longer holds, or block 3's link broke; either
        // way nothing before block 2 is blamed.
        let first = Verification::first_invalid_block(&chain).unwrap();
        assert!(first == 2 || first == 3);
    }

    #[test]
    fn test_replaced_transaction_list_is_detected() {
        let mut chain = valid_chain(&wallet());
        chain[1].transactions = vec![Transaction::new_reward("mallory".to_string(), 100.0)];

        assert!(!Verification::verify_chain(&chain));
        assert_eq!(Verification::first_invalid_block(&chain), Some(2));
    }

    #[test]
    fn test_tampered_genesis_is_blamed() {
        let mut chain = valid_chain(&wallet());
        chain[0].transactions = vec![Transaction::new_reward("mallory".to_string(), 100.0)];

        assert_eq!(Verification::first_invalid_block(&chain), Some(0));
    }

    #[test]
    fn test_lone_forged_root_is_rejected() {
        let mut root = Block::genesis();
        root.transactions = vec![Transaction::new_reward("mallory".to_string(), 1_000.0)];

        assert!(!Verification::verify_chain(&[root]));

        let mut moved = Block::genesis();
        moved.timestamp = 1.0;
        assert_eq!(Verification::first_invalid_block(&[moved]), Some(0));
    }

    #[test]
    fn test_index_must_match_position() {
        let mut chain = valid_chain(&wallet());
        chain[3].index = 7;

        assert_eq!(Verification::first_invalid_block(&chain), Some(3));

        let mut chain = valid_chain(&wallet());
        chain[1].index = 2;
        let relinked = chain[1].hash().to_hex();
        chain[2].previous_hash = relinked;

        assert_eq!(Verification::first_invalid_block(&chain), Some(1));
    }

    #[test]
    fn test_bad_proof_is_detected() {
        let mut chain = valid_chain(&wallet());
        let block = &mut chain[1];
        block.proof = (0..).find(|p| !valid_proof(&[], &block.previous_hash, *p)).unwrap();
        let relinked = chain[1].hash().to_hex();
        chain[2].previous_hash = relinked;

        assert_eq!(Verification::first_invalid_block(&chain), Some(1));
    }

    #[test]
    fn test_check_transaction_funds_and_signature() {
        let wallet = wallet();
        let tx = signed(&wallet, "bob", 5.0);

        assert!(Verification::check_transaction(&tx, |_| 10.0, true).is_ok());
        assert!(matches!(
            Verification::check_transaction(&tx, |_| 4.0, true),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert!(Verification::check_transaction(&tx, |_| 0.0, false).is_ok());

        let mut forged = tx.clone();
        forged.amount = 6.0;
        assert!(matches!(
            Verification::check_transaction(&forged, |_| 10.0, true),
            Err(LedgerError::InvalidSignature)
        ));
        assert!(!Verification::verify_transaction(&forged, |_| 10.0, false));
    }

    #[test]
    fn test_reward_transaction_always_passes() {
        let reward = Transaction::new_reward("alice".to_string(), 10.0);

        assert!(Verification::verify_transaction(&reward, |_| 0.0, true));
        assert!(Verification::verify_transaction(&reward, |_| 0.0, false));
    }

    #[test]
    fn test_verify_transactions_ignores_funds() {
        let wallet = wallet();
        let pool = vec![signed(&wallet, "bob", 5.0), signed(&wallet, "carol", 500.0)];

        assert!(Verification::verify_transactions(&pool, |_| 0.0));

        let mut forged = pool.clone();
        forged[1].recipient = "mallory".to_string();
        assert!(!Verification::verify_transactions(&forged, |_| 0.0));
    }
}
