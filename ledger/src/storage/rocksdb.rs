//! RocksDB-backed block store.
//!
//! Blocks and chain metadata live in dedicated column families:
//!
//! - `"blocks"`: big-endian height (8 bytes) -> canonical block bytes,
//! - `"meta"`:   the current top height under the fixed key `"top"`.
//!
//! Keying by height preserves insertion order and gives random reads
//! by height for free; the hash-addressed lookups of the query layer
//! walk heights instead.

use std::path::Path;

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};

use crate::types::Block;

use super::{BlockStore, extends_chain};

/// Configuration for [`RocksDbBlockStore`].
#[derive(Clone, Debug)]
pub struct RocksDbConfig {
    /// Filesystem path to the RocksDB database directory.
    pub path: String,
    /// Whether to create the database and missing column families if
    /// they do not yet exist.
    pub create_if_missing: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "data/ledger-db".to_string(),
            create_if_missing: true,
        }
    }
}

/// Storage-level error type.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying RocksDB error.
    RocksDb(rocksdb::Error),
    /// Required column family was not found.
    MissingColumnFamily(&'static str),
    /// Corrupted or malformed metadata (e.g. a top height with the
    /// wrong length).
    CorruptedMeta(&'static str),
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::RocksDb(e)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::RocksDb(e) => write!(f, "rocksdb error: {e}"),
            StorageError::MissingColumnFamily(cf) => write!(f, "missing column family '{cf}'"),
            StorageError::CorruptedMeta(what) => write!(f, "corrupted metadata: {what}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// RocksDB-backed implementation of [`BlockStore`].
pub struct RocksDbBlockStore {
    db: DB,
}

impl RocksDbBlockStore {
    /// Opens (or creates) a RocksDB-backed block store at the given
    /// path, setting up the `"blocks"` and `"meta"` column families.
    pub fn open(cfg: &RocksDbConfig) -> Result<Self, StorageError> {
        let path = Path::new(&cfg.path);

        let mut opts = Options::default();
        opts.create_if_missing(cfg.create_if_missing);
        opts.create_missing_column_families(cfg.create_if_missing);

        let cfs = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new("blocks", Options::default()),
            ColumnFamilyDescriptor::new("meta", Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self { db })
    }

    fn cf_blocks(&self) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle("blocks")
            .ok_or(StorageError::MissingColumnFamily("blocks"))
    }

    fn cf_meta(&self) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle("meta")
            .ok_or(StorageError::MissingColumnFamily("meta"))
    }

    fn encode_block(block: &Block) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(block, cfg)
            .expect("stored block should always be serializable")
    }

    fn decode_block(bytes: &[u8]) -> Option<Block> {
        let cfg = bincode::config::standard();
        let (block, _): (Block, usize) = bincode::serde::decode_from_slice(bytes, cfg).ok()?;
        Some(block)
    }

    fn load_top(&self) -> Result<Option<u64>, StorageError> {
        let cf_meta = self.cf_meta()?;
        match self.db.get_cf(cf_meta, b"top")? {
            None => Ok(None),
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StorageError::CorruptedMeta("top height length"))?;
                Ok(Some(u64::from_be_bytes(arr)))
            }
        }
    }

    fn try_insert(&mut self, block: Block) -> Result<bool, StorageError> {
        let top = self.load_top()?;
        let top_block = match top {
            None => None,
            Some(h) => {
                let cf = self.cf_blocks()?;
                let bytes = self
                    .db
                    .get_cf(cf, h.to_be_bytes())?
                    .ok_or(StorageError::CorruptedMeta("top block missing"))?;
                Some(
                    Self::decode_block(&bytes)
                        .ok_or(StorageError::CorruptedMeta("top block undecodable"))?,
                )
            }
        };

        if !extends_chain(top_block.as_ref(), &block) {
            return Ok(false);
        }

        let cf_blocks = self.cf_blocks()?;
        let cf_meta = self.cf_meta()?;
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, block.height.to_be_bytes(), Self::encode_block(&block));
        batch.put_cf(cf_meta, b"top", block.height.to_be_bytes());
        self.db.write(batch)?;
        Ok(true)
    }

    fn try_drop(&mut self) -> Result<(), StorageError> {
        let top = self.load_top()?.unwrap_or(0);
        let cf_blocks = self.cf_blocks()?;
        let cf_meta = self.cf_meta()?;
        let mut batch = WriteBatch::default();
        for height in 1..=top {
            batch.delete_cf(cf_blocks, height.to_be_bytes());
        }
        batch.delete_cf(cf_meta, b"top");
        self.db.write(batch)?;
        Ok(())
    }
}

impl BlockStore for RocksDbBlockStore {
    fn insert(&mut self, block: Block) -> bool {
        match self.try_insert(block) {
            Ok(inserted) => inserted,
            Err(e) => {
                tracing::error!(error = %e, "block insert failed");
                false
            }
        }
    }

    fn get_by_height(&self, height: u64) -> Option<Block> {
        let cf = self.cf_blocks().ok()?;
        match self.db.get_cf(cf, height.to_be_bytes()) {
            Ok(Some(bytes)) => Self::decode_block(&bytes),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, height, "block read failed");
                None
            }
        }
    }

    fn top_height(&self) -> Option<u64> {
        match self.load_top() {
            Ok(top) => top,
            Err(e) => {
                tracing::error!(error = %e, "top height read failed");
                None
            }
        }
    }

    fn drop_storage(&mut self) {
        if let Err(e) = self.try_drop() {
            tracing::error!(error = %e, "drop storage failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, Hash256, Transaction};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RocksDbBlockStore {
        let cfg = RocksDbConfig {
            path: dir.path().to_string_lossy().to_string(),
            create_if_missing: true,
        };
        RocksDbBlockStore::open(&cfg).expect("open RocksDB")
    }

    fn dummy_tx(counter: u64) -> Transaction {
        Transaction::new(
            AccountId::new("alice", "test"),
            counter,
            1_600_000_000_000,
            Vec::new(),
        )
    }

    #[test]
    fn roundtrip_blocks_and_top_height() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store_in(&tmp);

        let genesis = Block::genesis(0, vec![dummy_tx(0)]);
        let next = Block::produce(2, genesis.hash, 1, vec![dummy_tx(1)]);

        assert!(store.insert(genesis.clone()));
        assert!(store.insert(next.clone()));

        assert_eq!(store.top_height(), Some(2));
        assert_eq!(store.get_by_height(1), Some(genesis));
        assert_eq!(store.get_by_height(2), Some(next));
        assert_eq!(store.get_by_height(3), None);
    }

    #[test]
    fn chain_invariants_hold_across_reopen() {
        let tmp = TempDir::new().expect("create temp dir");
        let genesis = Block::genesis(0, Vec::new());
        let genesis_hash = genesis.hash;

        {
            let mut store = store_in(&tmp);
            assert!(store.insert(genesis));
        }

        let mut reopened = store_in(&tmp);
        assert_eq!(reopened.top_height(), Some(1));

        let broken = Block::produce(2, Hash256::compute(b"elsewhere"), 1, Vec::new());
        assert!(!reopened.insert(broken));

        let next = Block::produce(2, genesis_hash, 1, Vec::new());
        assert!(reopened.insert(next));
    }

    #[test]
    fn drop_storage_removes_everything() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store_in(&tmp);

        let genesis = Block::genesis(0, Vec::new());
        let next = Block::produce(2, genesis.hash, 1, Vec::new());
        assert!(store.insert(genesis));
        assert!(store.insert(next));

        store.drop_storage();
        assert_eq!(store.top_height(), None);
        assert_eq!(store.get_by_height(1), None);

        assert!(store.insert(Block::genesis(5, Vec::new())));
        assert_eq!(store.top_height(), Some(1));
    }
}
