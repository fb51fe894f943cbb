//! In-memory [`Store`](super::Store), used by wallet tests.
//!
//! Grounded on the teacher's `MemoryLocalStore` pattern: plain `HashMap`s
//! behind a single `Mutex`, held for the duration of each call so
//! `advance_counter`'s read-then-write stays atomic under concurrent callers.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cashu::nuts::Id;
use cashu::{PublicKey, State};

use super::{Error, Store};
use crate::types::{ProofInfo, WalletId};

#[derive(Debug, Default)]
struct Inner {
    counters: HashMap<(WalletId, Id), u32>,
    proofs: HashMap<(WalletId, PublicKey), ProofInfo>,
}

/// Non-durable [`Store`] backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// A fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_counter(&self, wallet_id: &WalletId, keyset_id: &Id) -> Result<u32, Error> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .counters
            .get(&(*wallet_id, *keyset_id))
            .copied()
            .unwrap_or(0))
    }

    async fn advance_counter(
        &self,
        wallet_id: &WalletId,
        keyset_id: &Id,
        count: u32,
    ) -> Result<u32, Error> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let key = (*wallet_id, *keyset_id);
        let current = inner.counters.get(&key).copied().unwrap_or(0);
        inner.counters.insert(key, current + count);
        Ok(current)
    }

    async fn set_counter(
        &self,
        wallet_id: &WalletId,
        keyset_id: &Id,
        value: u32,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.counters.insert((*wallet_id, *keyset_id), value);
        Ok(())
    }

    async fn all_counters(&self, wallet_id: &WalletId) -> Result<HashMap<Id, u32>, Error> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .counters
            .iter()
            .filter(|((w, _), _)| w == wallet_id)
            .map(|((_, keyset), count)| (*keyset, *count))
            .collect())
    }

    async fn insert_proofs(
        &self,
        wallet_id: &WalletId,
        proofs: Vec<ProofInfo>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        for proof in proofs {
            inner.proofs.insert((*wallet_id, proof.y), proof);
        }
        Ok(())
    }

    async fn list_proofs(
        &self,
        wallet_id: &WalletId,
        state: Option<State>,
    ) -> Result<Vec<ProofInfo>, Error> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .proofs
            .iter()
            .filter(|((w, _), p)| w == wallet_id && state.map_or(true, |s| s == p.state))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn update_proof_state(
        &self,
        wallet_id: &WalletId,
        ys: &[PublicKey],
        new_state: State,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        for y in ys {
            let key = (*wallet_id, *y);
            let proof = inner
                .proofs
                .get_mut(&key)
                .ok_or_else(|| Error::UnknownProof(y.to_hex()))?;
            proof.state = new_state;
            if new_state == State::Spent {
                proof.spent_at = Some(cashu::util::unix_time());
            }
        }
        Ok(())
    }

    async fn delete_proofs(&self, wallet_id: &WalletId, ys: &[PublicKey]) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        for y in ys {
            inner.proofs.remove(&(*wallet_id, *y));
        }
        Ok(())
    }

    async fn find_proofs_by_quote(
        &self,
        wallet_id: &WalletId,
        quote_id: &str,
    ) -> Result<Vec<ProofInfo>, Error> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .proofs
            .iter()
            .filter(|((w, _), p)| w == wallet_id && p.mint_quote_id.as_deref() == Some(quote_id))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn commit_spend(
        &self,
        wallet_id: &WalletId,
        spent_ys: &[PublicKey],
        new_proofs: Vec<ProofInfo>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        for y in spent_ys {
            let key = (*wallet_id, *y);
            if let Some(proof) = inner.proofs.get_mut(&key) {
                proof.state = State::Spent;
                proof.spent_at = Some(cashu::util::unix_time());
            }
        }
        for proof in new_proofs {
            inner.proofs.insert((*wallet_id, proof.y), proof);
        }
        Ok(())
    }
}
