//! Query and submission endpoints over the committed chain.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use ledger::{AccountId, AssetId, Block, BlockQuery, Hash256, Pager, Transaction};

use crate::state::SharedState;

/// Default page size when a query omits `limit`.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// A transaction together with its content hash.
#[derive(Debug, Serialize)]
pub struct TxView {
    pub hash: String,
    pub transaction: Transaction,
}

impl From<Transaction> for TxView {
    fn from(transaction: Transaction) -> Self {
        Self {
            hash: transaction.hash().to_hex(),
            transaction,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BlocksParams {
    /// How many of the newest blocks to return.
    pub n: Option<u32>,
}

/// `GET /blocks?n=10`
///
/// The most recent blocks, newest first.
pub async fn list_blocks(
    State(state): State<SharedState>,
    Query(params): Query<BlocksParams>,
) -> Json<Vec<Block>> {
    let store = state.store.lock().await;
    let blocks = BlockQuery::new(&*store)
        .top_blocks(params.n.unwrap_or(DEFAULT_PAGE_SIZE))
        .collect();
    Json(blocks)
}

/// `GET /transactions/{hash}`
///
/// Looks up one committed transaction by payload hash.
pub async fn get_transaction(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
) -> Result<Json<TxView>, (StatusCode, String)> {
    let hash = parse_hash(&hash)?;
    let store = state.store.lock().await;
    let found = BlockQuery::new(&*store).transactions(&[hash]).next().flatten();
    match found {
        Some(tx) => Ok(Json(tx.into())),
        None => Err((StatusCode::NOT_FOUND, "transaction not found".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of transactions to return.
    pub limit: Option<u32>,
    /// Exclusive cursor: hex hash of the last transaction already seen.
    pub cursor: Option<String>,
    /// Comma-separated asset ids for the asset history query.
    pub assets: Option<String>,
}

/// `GET /accounts/{id}/transactions?limit=&cursor=`
///
/// Newest-first transactions created by the account.
pub async fn account_transactions(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<TxView>>, (StatusCode, String)> {
    let pager = pager_from(&params)?;
    let account = AccountId(id);

    let store = state.store.lock().await;
    let txs = BlockQuery::new(&*store)
        .account_transactions(&account, &pager)
        .map(TxView::from)
        .collect();
    Ok(Json(txs))
}

/// `GET /accounts/{id}/assets/transactions?assets=irh%23test&limit=&cursor=`
///
/// Newest-first transactions where the account participates through
/// one of the listed assets.
pub async fn account_asset_transactions(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<TxView>>, (StatusCode, String)> {
    let pager = pager_from(&params)?;
    let account = AccountId(id);
    let assets: Vec<AssetId> = params
        .assets
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| AssetId(s.to_string()))
        .collect();

    let store = state.store.lock().await;
    let txs = BlockQuery::new(&*store)
        .account_asset_transactions(&account, &assets, &pager)
        .map(TxView::from)
        .collect();
    Ok(Json(txs))
}

/// Response body for `POST /transactions`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub hash: String,
}

/// `POST /transactions`
///
/// Queues a transaction into the local pool; the block producer seals
/// it into a block on its next tick. The response carries the payload
/// hash clients poll with.
pub async fn submit_transaction(
    State(state): State<SharedState>,
    Json(tx): Json<Transaction>,
) -> (StatusCode, Json<SubmitResponse>) {
    let hash = tx.hash();
    state.tx_pool.lock().await.push(tx);
    tracing::info!(hash = %hash.to_hex(), "transaction queued");
    (
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            status: "queued",
            hash: hash.to_hex(),
        }),
    )
}

fn parse_hash(s: &str) -> Result<Hash256, (StatusCode, String)> {
    Hash256::from_hex(s).map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid hash: {e}")))
}

fn pager_from(params: &HistoryParams) -> Result<Pager, (StatusCode, String)> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    match params.cursor.as_deref() {
        None => Ok(Pager::latest(limit)),
        Some(cursor) => Ok(Pager::new(parse_hash(cursor)?, limit)),
    }
}
