use crate::core::{Block, Transaction};

/// Net balance of `participant`: everything received in committed blocks
/// minus everything sent in committed blocks and in the pending pool.
///
/// Pending income is not counted, pending spending is. Recomputed on every
/// call so a freshly queued transaction lowers the funds available to the
/// next one from the same sender.
pub fn get_balance(participant: &str, chain: &[Block], open_transactions: &[Transaction]) -> f64 {
    let committed = chain.iter().flat_map(|block| block.transactions.iter());

    let mut received = 0.0;
    let mut sent = 0.0;
    for tx in committed {
        if tx.recipient == participant {
            received += tx.amount;
        }
        if tx.sender == participant {
            sent += tx.amount;
        }
    }

    sent += open_transactions
        .iter()
        .filter(|tx| tx.sender == participant)
        .map(|tx| tx.amount)
        .sum::<f64>();

    received - sent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(sender: &str, recipient: &str, amount: f64) -> Transaction {
        Transaction::new(sender.to_string(), recipient.to_string(), String::new(), amount)
    }

    fn block(index: u64, transactions: Vec<Transaction>) -> Block {
        Block {
            index,
            previous_hash: String::new(),
            transactions,
            proof: 0,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_unknown_participant_has_zero() {
        assert_eq!(get_balance("nobody", &[Block::genesis()], &[]), 0.0);
    }

    #[test]
    fn test_committed_income_and_spending() {
        let chain = vec![
            Block::genesis(),
            block(1, vec![Transaction::new_reward("alice".to_string(), 10.0)]),
            block(2, vec![tx("alice", "bob", 4.0), Transaction::new_reward("alice".to_string(), 10.0)]),
        ];

        assert_eq!(get_balance("alice", &chain, &[]), 16.0);
        assert_eq!(get_balance("bob", &chain, &[]), 4.0);
    }

    #[test]
    fn test_pending_spending_counts_but_pending_income_does_not() {
        let chain = vec![
            Block::genesis(),
            block(1, vec![Transaction::new_reward("alice".to_string(), 10.0)]),
        ];
        let pending = vec![tx("alice", "bob", 3.0), tx("alice", "bob", 2.0)];

        assert_eq!(get_balance("alice", &chain, &pending), 5.0);
        assert_eq!(get_balance("bob", &chain, &pending), 0.0);
    }

    #[test]
    fn test_self_transfer_nets_out() {
        let chain = vec![
            Block::genesis(),
            block(1, vec![Transaction::new_reward("alice".to_string(), 10.0)]),
            block(2, vec![tx("alice", "alice", 4.0), Transaction::new_reward("bob".to_string(), 10.0)]),
        ];

        assert_eq!(get_balance("alice", &chain, &[]), 10.0);
    }
}
