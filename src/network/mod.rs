//! Peer gossip over HTTP

pub mod peers;
pub mod protocol;

pub use peers::{HttpTransport, PeerReconciler, PeerTransport, DEFAULT_PEER_TIMEOUT};
pub use protocol::{BroadcastBlock, BroadcastReport, BroadcastTransaction, DeliveryOutcome};
