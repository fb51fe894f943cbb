//! `redb`-backed [`Store`], used in production (§6.5: "a durable store with
//! tables ... for proofs ... counters").
//!
//! Grounded on the teacher's `WalletRedbDatabase`/`RedbLocalStore`: one
//! `Arc<Mutex<Database>>`, `TableDefinition` constants, and a write
//! transaction opened and committed per call. Rows are JSON (`serde_json`),
//! matching the teacher's own choice of a string-valued table over a custom
//! binary layout. Every table is keyed by a `"{wallet_id}:{suffix}"` string so
//! one physical file can host many wallets (§4.6 Multi-wallet) without a
//! second index.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cashu::nuts::Id;
use cashu::{PublicKey, State};
use redb::{Database, ReadableTable, TableDefinition};
use tokio::sync::Mutex;

use super::{Error, Store};
use crate::types::{ProofInfo, WalletId};

const COUNTERS_TABLE: TableDefinition<&str, u32> = TableDefinition::new("counters");
const PROOFS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("proofs");

/// `redb`-backed [`Store`].
#[derive(Debug, Clone)]
pub struct RedbStore {
    db: Arc<Mutex<Database>>,
}

impl RedbStore {
    /// Open (creating if absent) the database at `path`.
    pub fn new(path: &Path) -> Result<Self, Error> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
            let _ = write_txn.open_table(PROOFS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    fn counter_key(wallet_id: &WalletId, keyset_id: &Id) -> String {
        format!("{wallet_id}:{keyset_id}")
    }

    fn proof_key(wallet_id: &WalletId, y: &PublicKey) -> String {
        format!("{wallet_id}:{}", y.to_hex())
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn get_counter(&self, wallet_id: &WalletId, keyset_id: &Id) -> Result<u32, Error> {
        let db = self.db.lock().await;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        let key = Self::counter_key(wallet_id, keyset_id);
        Ok(table.get(key.as_str())?.map(|v| v.value()).unwrap_or(0))
    }

    async fn advance_counter(
        &self,
        wallet_id: &WalletId,
        keyset_id: &Id,
        count: u32,
    ) -> Result<u32, Error> {
        // Read and write inside the same `redb` write transaction: `redb`
        // serializes writers across processes, so this is the atomicity
        // boundary the §4.6 advance contract relies on, not the in-process
        // mutex below (which only keeps two tasks in this process from
        // racing to open a second write transaction).
        let db = self.db.lock().await;
        let key = Self::counter_key(wallet_id, keyset_id);

        let write_txn = db.begin_write()?;
        let current = {
            let mut table = write_txn.open_table(COUNTERS_TABLE)?;
            let current = table.get(key.as_str())?.map(|v| v.value()).unwrap_or(0);
            table.insert(key.as_str(), current + count)?;
            current
        };
        write_txn.commit()?;

        Ok(current)
    }

    async fn set_counter(
        &self,
        wallet_id: &WalletId,
        keyset_id: &Id,
        value: u32,
    ) -> Result<(), Error> {
        let db = self.db.lock().await;
        let key = Self::counter_key(wallet_id, keyset_id);
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(COUNTERS_TABLE)?;
            table.insert(key.as_str(), value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn all_counters(&self, wallet_id: &WalletId) -> Result<HashMap<Id, u32>, Error> {
        let db = self.db.lock().await;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        let prefix = format!("{wallet_id}:");

        let mut out = HashMap::new();
        for entry in table.iter()?.flatten() {
            let (k, v) = entry;
            if let Some(rest) = k.value().strip_prefix(&prefix) {
                if let Ok(id) = rest.parse::<Id>() {
                    out.insert(id, v.value());
                }
            }
        }
        Ok(out)
    }

    async fn insert_proofs(
        &self,
        wallet_id: &WalletId,
        proofs: Vec<ProofInfo>,
    ) -> Result<(), Error> {
        let db = self.db.lock().await;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROOFS_TABLE)?;
            for proof in &proofs {
                let key = Self::proof_key(wallet_id, &proof.y);
                table.insert(key.as_str(), serde_json::to_string(proof)?.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn list_proofs(
        &self,
        wallet_id: &WalletId,
        state: Option<State>,
    ) -> Result<Vec<ProofInfo>, Error> {
        let db = self.db.lock().await;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(PROOFS_TABLE)?;
        let prefix = format!("{wallet_id}:");

        let mut out = Vec::new();
        for entry in table.iter()?.flatten() {
            let (k, v) = entry;
            if !k.value().starts_with(&prefix) {
                continue;
            }
            let proof: ProofInfo = serde_json::from_str(v.value())?;
            if state.map_or(true, |s| s == proof.state) {
                out.push(proof);
            }
        }
        Ok(out)
    }

    async fn update_proof_state(
        &self,
        wallet_id: &WalletId,
        ys: &[PublicKey],
        new_state: State,
    ) -> Result<(), Error> {
        let db = self.db.lock().await;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROOFS_TABLE)?;
            for y in ys {
                let key = Self::proof_key(wallet_id, y);
                let raw = table
                    .get(key.as_str())?
                    .ok_or_else(|| Error::UnknownProof(y.to_hex()))?
                    .value()
                    .to_string();
                let mut proof: ProofInfo = serde_json::from_str(&raw)?;
                proof.state = new_state;
                if new_state == State::Spent {
                    proof.spent_at = Some(cashu::util::unix_time());
                }
                table.insert(key.as_str(), serde_json::to_string(&proof)?.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn delete_proofs(&self, wallet_id: &WalletId, ys: &[PublicKey]) -> Result<(), Error> {
        let db = self.db.lock().await;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROOFS_TABLE)?;
            for y in ys {
                let key = Self::proof_key(wallet_id, y);
                table.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn find_proofs_by_quote(
        &self,
        wallet_id: &WalletId,
        quote_id: &str,
    ) -> Result<Vec<ProofInfo>, Error> {
        let db = self.db.lock().await;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(PROOFS_TABLE)?;
        let prefix = format!("{wallet_id}:");

        let mut out = Vec::new();
        for entry in table.iter()?.flatten() {
            let (k, v) = entry;
            if !k.value().starts_with(&prefix) {
                continue;
            }
            let proof: ProofInfo = serde_json::from_str(v.value())?;
            if proof.mint_quote_id.as_deref() == Some(quote_id) {
                out.push(proof);
            }
        }
        Ok(out)
    }

    async fn commit_spend(
        &self,
        wallet_id: &WalletId,
        spent_ys: &[PublicKey],
        new_proofs: Vec<ProofInfo>,
    ) -> Result<(), Error> {
        let db = self.db.lock().await;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROOFS_TABLE)?;

            for y in spent_ys {
                let key = Self::proof_key(wallet_id, y);
                if let Some(raw) = table.get(key.as_str())?.map(|v| v.value().to_string()) {
                    let mut proof: ProofInfo = serde_json::from_str(&raw)?;
                    proof.state = State::Spent;
                    proof.spent_at = Some(cashu::util::unix_time());
                    table.insert(key.as_str(), serde_json::to_string(&proof)?.as_str())?;
                }
            }

            for proof in &new_proofs {
                let key = Self::proof_key(wallet_id, &proof.y);
                table.insert(key.as_str(), serde_json::to_string(proof)?.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cashu::{Amount, CurrencyUnit, MintUrl, Secret};

    use super::*;

    fn wallet_id() -> WalletId {
        WalletId::new(
            &MintUrl::from_str("https://mint.example.com").unwrap(),
            &CurrencyUnit::Sat,
        )
    }

    fn keyset_id() -> Id {
        Id::from_str("009a1f293253e41e").unwrap()
    }

    fn dummy_proof(secret: &str) -> ProofInfo {
        let proof = cashu::Proof::new(
            Amount::from(4),
            keyset_id(),
            Secret::new(secret.to_string()),
            PublicKey::from_hex(
                "02194603ffa36356f4a56b7df9371fc3192472351453ec7398b8da8117e7c3e104",
            )
            .unwrap(),
        );
        ProofInfo::new(
            proof,
            MintUrl::from_str("https://mint.example.com").unwrap(),
            State::Unspent,
            CurrencyUnit::Sat,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_counter_advance_never_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::new(&dir.path().join("wallet.redb")).unwrap();
        let wallet = wallet_id();
        let keyset = keyset_id();

        let first = store.advance_counter(&wallet, &keyset, 1).await.unwrap();
        let second = store.advance_counter(&wallet, &keyset, 1).await.unwrap();
        let third = store.advance_counter(&wallet, &keyset, 5).await.unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(third, 2);
        assert_eq!(store.get_counter(&wallet, &keyset).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_insert_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::new(&dir.path().join("wallet.redb")).unwrap();
        let wallet = wallet_id();

        let proof = dummy_proof("secret-a");
        store
            .insert_proofs(&wallet, vec![proof.clone()])
            .await
            .unwrap();

        let listed = store.list_proofs(&wallet, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].y, proof.y);
    }

    #[tokio::test]
    async fn test_commit_spend_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::new(&dir.path().join("wallet.redb")).unwrap();
        let wallet = wallet_id();

        let input = dummy_proof("secret-in");
        store
            .insert_proofs(&wallet, vec![input.clone()])
            .await
            .unwrap();

        let output = dummy_proof("secret-out");
        store
            .commit_spend(&wallet, &[input.y], vec![output.clone()])
            .await
            .unwrap();

        let unspent = store
            .list_proofs(&wallet, Some(State::Unspent))
            .await
            .unwrap();
        let spent = store
            .list_proofs(&wallet, Some(State::Spent))
            .await
            .unwrap();
        assert_eq!(unspent.len(), 1);
        assert_eq!(unspent[0].y, output.y);
        assert_eq!(spent.len(), 1);
        assert_eq!(spent[0].y, input.y);
    }
}
