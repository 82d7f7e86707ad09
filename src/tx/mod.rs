//! Transactions over the byline store.
//!
//! Reads (lookups, relation reads, content queries) run in `ReadOnly`
//! transactions. Byline inserts and updates and relation replacement
//! need `ReadWrite`; backends refuse writes through anything else.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Opaque transaction identifier, unique per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

pub trait Transaction: Send + Sync {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;

    /// May this transaction insert or update bylines and replace relations.
    fn is_writable(&self) -> bool {
        self.mode() == TxMode::ReadWrite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTx(TxMode);

    impl Transaction for FakeTx {
        fn mode(&self) -> TxMode { self.0 }
        fn id(&self) -> TxId { TxId(1) }
    }

    #[test]
    fn test_only_read_write_is_writable() {
        assert!(FakeTx(TxMode::ReadWrite).is_writable());
        assert!(!FakeTx(TxMode::ReadOnly).is_writable());
        assert_eq!(FakeTx(TxMode::ReadOnly).id().to_string(), "tx1");
    }
}
