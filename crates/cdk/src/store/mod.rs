//! Durable counter and proof storage (§4.6, §6.5).
//!
//! Two stores are described separately in the spec — `CounterStore` and
//! `ProofStore` — but both only ever need to change together (every
//! output-producing step advances counters and writes proofs in the same
//! round), so they're modeled here as a single object-safe [`Store`] trait.
//! The spec's `begin`/`commit`/`rollback` primitives are not exposed directly:
//! threading a boxed transaction handle through an async trait object ties it
//! to a lock guard in a way `redb` can't express safely. Instead the one
//! operation that needs cross-table atomicity — marking inputs `SPENT` while
//! inserting new proofs — gets its own dedicated method, [`Store::commit_spend`],
//! which an implementation performs as a single write transaction internally.

pub mod memory;
pub mod redb_store;

use std::collections::HashMap;

use async_trait::async_trait;
use cashu::nuts::Id;
use cashu::{PublicKey, State};
use thiserror::Error;

use crate::types::{ProofInfo, WalletId};

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Errors a [`Store`] implementation can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying `redb` database error
    #[error(transparent)]
    Database(#[from] Box<redb::DatabaseError>),
    /// Underlying `redb` transaction error
    #[error(transparent)]
    Transaction(#[from] Box<redb::TransactionError>),
    /// Underlying `redb` commit error
    #[error(transparent)]
    Commit(#[from] Box<redb::CommitError>),
    /// Underlying `redb` table error
    #[error(transparent)]
    Table(#[from] Box<redb::TableError>),
    /// Underlying `redb` storage error
    #[error(transparent)]
    Storage(#[from] Box<redb::StorageError>),
    /// A stored row failed to (de)serialize
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// `update_proof_state`/`delete_proofs` named a `y` this store has no row for
    #[error("unknown proof: {0}")]
    UnknownProof(String),
}

impl From<redb::DatabaseError> for Error {
    fn from(e: redb::DatabaseError) -> Self {
        Self::Database(Box::new(e))
    }
}

impl From<redb::TransactionError> for Error {
    fn from(e: redb::TransactionError) -> Self {
        Self::Transaction(Box::new(e))
    }
}

impl From<redb::CommitError> for Error {
    fn from(e: redb::CommitError) -> Self {
        Self::Commit(Box::new(e))
    }
}

impl From<redb::TableError> for Error {
    fn from(e: redb::TableError) -> Self {
        Self::Table(Box::new(e))
    }
}

impl From<redb::StorageError> for Error {
    fn from(e: redb::StorageError) -> Self {
        Self::Storage(Box::new(e))
    }
}

/// Durable counter and proof storage for one physical database, shared by
/// every wallet (partitioned by [`WalletId`]) that uses it.
#[async_trait]
pub trait Store: std::fmt::Debug + Send + Sync {
    /// Current counter for `(wallet_id, keyset_id)`; `0` if never advanced.
    async fn get_counter(&self, wallet_id: &WalletId, keyset_id: &Id) -> Result<u32, Error>;

    /// Atomically reserve the next `count` counter values, returning the
    /// first one consumed. Under concurrent callers no value is ever handed
    /// out twice.
    async fn advance_counter(
        &self,
        wallet_id: &WalletId,
        keyset_id: &Id,
        count: u32,
    ) -> Result<u32, Error>;

    /// Overwrite the counter. Used only by `restore()`, which recomputes it
    /// from the highest consumed index rather than advancing incrementally.
    async fn set_counter(&self, wallet_id: &WalletId, keyset_id: &Id, value: u32)
        -> Result<(), Error>;

    /// Every counter this wallet has recorded.
    async fn all_counters(&self, wallet_id: &WalletId) -> Result<HashMap<Id, u32>, Error>;

    /// Upsert proofs by `(wallet_id, secret)`; storing the same proof twice
    /// is a no-op.
    async fn insert_proofs(&self, wallet_id: &WalletId, proofs: Vec<ProofInfo>)
        -> Result<(), Error>;

    /// Proofs for this wallet, optionally filtered to one state.
    async fn list_proofs(
        &self,
        wallet_id: &WalletId,
        state: Option<State>,
    ) -> Result<Vec<ProofInfo>, Error>;

    /// Move the named proofs to `new_state`. Transitions into `SPENT` stamp
    /// `spent_at`.
    async fn update_proof_state(
        &self,
        wallet_id: &WalletId,
        ys: &[PublicKey],
        new_state: State,
    ) -> Result<(), Error>;

    /// Remove the named proofs outright.
    async fn delete_proofs(&self, wallet_id: &WalletId, ys: &[PublicKey]) -> Result<(), Error>;

    /// Proofs tagged with `quote_id`, for crash recovery after `mint()`.
    async fn find_proofs_by_quote(
        &self,
        wallet_id: &WalletId,
        quote_id: &str,
    ) -> Result<Vec<ProofInfo>, Error>;

    /// Mark `spent_ys` `SPENT` and insert `new_proofs` as one atomic unit —
    /// the swap/melt fund-safety invariant (§8 property 8).
    async fn commit_spend(
        &self,
        wallet_id: &WalletId,
        spent_ys: &[PublicKey],
        new_proofs: Vec<ProofInfo>,
    ) -> Result<(), Error>;
}
