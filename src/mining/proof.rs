use crate::core::Transaction;
use crate::crypto::hash::{Canonical, Hash256, canonical_string};
use std::sync::atomic::{AtomicBool, Ordering};

/// Hex prefix a proof hash must carry. Fixed at 8 bits; not adjustable.
pub const PROOF_PREFIX: &str = "00";

const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Hex digest of `canonical(transactions) ++ previous_hash ++ proof`.
pub fn proof_hash(transactions: &[Transaction], previous_hash: &str, proof: u64) -> String {
    let mut guess = canonical_string(&transactions.to_canonical());
    guess.push_str(previous_hash);
    guess.push_str(&proof.to_string());

    Hash256::hash(guess.as_bytes()).to_hex()
}

pub fn valid_proof(transactions: &[Transaction], previous_hash: &str, proof: u64) -> bool {
    proof_hash(transactions, previous_hash, proof).starts_with(PROOF_PREFIX)
}

/// Counts up from zero until `valid_proof` holds.
///
/// Returns `None` when `cancel` is raised or the counter space runs out.
pub fn proof_of_work(transactions: &[Transaction], previous_hash: &str, cancel: &AtomicBool) -> Option<u64> {
    // Rendered once; only the proof suffix changes between attempts.
    let mut prefix = canonical_string(&transactions.to_canonical());
    prefix.push_str(previous_hash);

    let mut proof: u64 = 0;
    loop {
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            log::debug!("Proof-of-work search cancelled at attempt {}", proof);
            return None;
        }

        let guess = format!("{}{}", prefix, proof);
        if Hash256::hash(guess.as_bytes()).to_hex().starts_with(PROOF_PREFIX) {
            return Some(proof);
        }

        proof = proof.checked_add(1)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<Transaction> {
        vec![
            Transaction::new("a".to_string(), "b".to_string(), "s1".to_string(), 5.0),
            Transaction::new("a".to_string(), "c".to_string(), "s2".to_string(), 1.25),
        ]
    }

    #[test]
    fn test_valid_proof_is_deterministic() {
        let txs = pool();
        for proof in 0..64 {
            assert_eq!(valid_proof(&txs, "prev", proof), valid_proof(&txs, "prev", proof));
        }
    }

    #[test]
    fn test_proof_of_work_finds_first_valid_proof() {
        let txs = pool();
        let cancel = AtomicBool::new(false);

        let proof = proof_of_work(&txs, "prev", &cancel).unwrap();

        assert!(valid_proof(&txs, "prev", proof));
        assert!((0..proof).all(|p| !valid_proof(&txs, "prev", p)));
    }

    #[test]
    fn test_proof_of_work_on_empty_pool() {
        let cancel = AtomicBool::new(false);
        let proof = proof_of_work(&[], "", &cancel).unwrap();

        assert!(valid_proof(&[], "", proof));
        assert!(proof_hash(&[], "", proof).starts_with("00"));
    }

    #[test]
    fn test_proof_depends_on_previous_hash() {
        let txs = pool();
        let cancel = AtomicBool::new(false);
        let proof = proof_of_work(&txs, "prev", &cancel).unwrap();

        assert_ne!(proof_hash(&txs, "prev", proof), proof_hash(&txs, "other", proof));
    }

    #[test]
    fn test_cancelled_search_returns_none() {
        let cancel = AtomicBool::new(true);

        assert_eq!(proof_of_work(&pool(), "prev", &cancel), None);
    }
}
