//! In-memory stand-in for the BurstChain REST service.
//!
//! Identities are random UUID pairs, chains are created implicitly per
//! `(tenant, chain)` once a dictionary for the chain's collection exists,
//! and every asset write produces a new version with a fresh hash. TQL
//! clauses and map/reduce functions are accepted but not evaluated: a
//! query returns every asset the caller can see.
//!
//! A caller sees an asset when its public id is among the owners, or when
//! a consent contract names it (`consents <public id> ...`) and was
//! installed by one of the owners.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// One version of an asset as returned by `/latest` and hash lookups.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub asset_id: String,
    pub hash: String,
    pub version: u32,
    pub owners: Vec<String>,
    pub signer: String,
    pub asset: Value,
    pub asset_metadata: Value,
}

#[derive(Deserialize)]
pub struct NewAsset {
    pub owners: Vec<String>,
    pub asset: Value,
    #[serde(default)]
    pub asset_metadata: Value,
}

#[derive(Deserialize)]
pub struct AssetUpdate {
    pub asset_id: String,
    pub asset: Value,
    #[serde(default)]
    pub asset_metadata: Value,
}

#[derive(Deserialize)]
pub struct AssetTransfer {
    pub asset_id: String,
    pub owners: Vec<String>,
    pub new_owners: Vec<String>,
    pub new_signer_public_id: String,
}

#[derive(Deserialize)]
pub struct TqlQuery {
    #[serde(rename = "tqlWhereClause")]
    pub tql_where_clause: String,
}

#[derive(Deserialize)]
pub struct MapReduceQuery {
    pub map: String,
    pub reduce: String,
    pub finalize: Option<String>,
    #[serde(rename = "tqlWhereClause")]
    pub tql_where_clause: String,
}

#[derive(Deserialize)]
pub struct SmartContract {
    pub contract: String,
    pub name: String,
    #[serde(default)]
    pub smart_contract_metadata: Value,
    pub smart_contract_type: String,
    pub owners: Vec<String>,
}

#[derive(Clone, Debug)]
struct Consent {
    grantor: String,
    grantee: Option<String>,
}

#[derive(Default)]
struct Chain {
    latest: HashMap<String, Asset>,
    versions: HashMap<String, Asset>,
    contracts: HashMap<String, Asset>,
    consents: Vec<Consent>,
}

impl Chain {
    fn visible_to(&self, asset: &Asset, public_id: &str) -> bool {
        asset.owners.iter().any(|owner| owner == public_id)
            || self
                .consents
                .iter()
                .any(|c| c.grantee.as_deref() == Some(public_id) && asset.owners.contains(&c.grantor))
    }

    fn commit(&mut self, asset: Asset) {
        self.versions.insert(asset.hash.clone(), asset.clone());
        self.latest.insert(asset.asset_id.clone(), asset);
    }

    /// Latest versions visible to `public_id`, ordered by asset id.
    fn visible(&self, public_id: &str) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self
            .latest
            .values()
            .filter(|asset| self.visible_to(asset, public_id))
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        assets
    }
}

#[derive(Default)]
pub struct Ledger {
    dictionaries: HashMap<String, Value>,
    /// private id -> public id
    identities: HashMap<String, String>,
    chains: HashMap<(String, String), Chain>,
}

impl Ledger {
    /// Public id of the caller authorized by `Authorization: ID <private id>`.
    fn caller(&self, headers: &HeaderMap) -> Result<String, StatusCode> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("ID "))
            .and_then(|private_id| self.identities.get(private_id))
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }

    fn chain(&self, tenant: &str, chain: &str) -> Result<&Chain, StatusCode> {
        self.chains
            .get(&(tenant.to_string(), chain.to_string()))
            .ok_or(StatusCode::NOT_FOUND)
    }

    fn chain_mut(&mut self, tenant: &str, chain: &str) -> Result<&mut Chain, StatusCode> {
        if !self.dictionaries.contains_key(chain) {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(self.chains.entry((tenant.to_string(), chain.to_string())).or_default())
    }
}

pub type Db = Arc<RwLock<Ledger>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Ledger::default()));
    Router::new()
        .route("/api/metadata/dictionary", put(put_dictionary))
        .route("/api/burstchain/id/private", get(private_id))
        .route("/api/burstchain/id/public", get(public_id))
        .route("/api/burstchain/{tenant}/{chain}/asset", post(create_asset).put(update_asset))
        .route("/api/burstchain/{tenant}/{chain}/transfer", post(transfer_asset))
        .route("/api/burstchain/{tenant}/{chain}/query", post(query))
        .route("/api/burstchain/{tenant}/{chain}/mapreduce/query", post(map_reduce))
        .route("/api/burstchain/{tenant}/{chain}/smartcontract", post(create_contract))
        .route("/api/burstchain/{tenant}/{chain}/{key}", get(asset_by_hash))
        .route("/api/burstchain/{tenant}/{chain}/{key}/status", get(asset_status))
        .route("/api/burstchain/{tenant}/{chain}/{key}/latest", get(latest_asset))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn new_hash() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn put_dictionary(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(dictionary): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let basic = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Basic "));
    if !basic {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let collection = dictionary
        .get("collection")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    db.write().await.dictionaries.insert(collection.clone(), dictionary);
    Ok(Json(json!({ "message": format!("dictionary {collection} saved") })))
}

async fn private_id(State(db): State<Db>) -> Json<Value> {
    let private_id = Uuid::new_v4().to_string();
    let public_id = Uuid::new_v4().to_string();
    db.write().await.identities.insert(private_id.clone(), public_id);
    Json(json!({ "private_id": private_id }))
}

async fn public_id(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let public_id = db.read().await.caller(&headers)?;
    Ok(Json(json!({ "public_id": public_id })))
}

async fn create_asset(
    State(db): State<Db>,
    Path((tenant, chain)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<NewAsset>,
) -> Result<Json<Value>, StatusCode> {
    let mut ledger = db.write().await;
    let signer = ledger.caller(&headers)?;
    let chain = ledger.chain_mut(&tenant, &chain)?;

    let asset = Asset {
        asset_id: Uuid::new_v4().to_string(),
        hash: new_hash(),
        version: 1,
        owners: input.owners,
        signer,
        asset: input.asset,
        asset_metadata: input.asset_metadata,
    };
    let asset_id = asset.asset_id.clone();
    chain.commit(asset);
    Ok(Json(json!({ "asset_id": asset_id })))
}

async fn update_asset(
    State(db): State<Db>,
    Path((tenant, chain)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<AssetUpdate>,
) -> Result<Json<Value>, StatusCode> {
    let mut ledger = db.write().await;
    let signer = ledger.caller(&headers)?;
    let chain = ledger.chain_mut(&tenant, &chain)?;

    let current = chain.latest.get(&input.asset_id).ok_or(StatusCode::NOT_FOUND)?;
    if !current.owners.contains(&signer) {
        return Err(StatusCode::FORBIDDEN);
    }
    let next = Asset {
        hash: new_hash(),
        version: current.version + 1,
        signer,
        asset: input.asset,
        asset_metadata: input.asset_metadata,
        ..current.clone()
    };
    chain.commit(next);
    Ok(Json(json!({ "asset_id": input.asset_id })))
}

async fn transfer_asset(
    State(db): State<Db>,
    Path((tenant, chain)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<AssetTransfer>,
) -> Result<Json<Value>, StatusCode> {
    let mut ledger = db.write().await;
    let caller = ledger.caller(&headers)?;
    let chain = ledger.chain_mut(&tenant, &chain)?;

    let current = chain.latest.get(&input.asset_id).ok_or(StatusCode::NOT_FOUND)?;
    let mut claimed = input.owners.clone();
    let mut actual = current.owners.clone();
    claimed.sort();
    actual.sort();
    if !actual.contains(&caller) || claimed != actual {
        return Err(StatusCode::FORBIDDEN);
    }
    let next = Asset {
        hash: new_hash(),
        version: current.version + 1,
        owners: input.new_owners,
        signer: input.new_signer_public_id,
        ..current.clone()
    };
    chain.commit(next);
    Ok(Json(json!({ "asset_id": input.asset_id })))
}

async fn query(
    State(db): State<Db>,
    Path((tenant, chain)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<TqlQuery>,
) -> Result<Json<Value>, StatusCode> {
    let ledger = db.read().await;
    let caller = ledger.caller(&headers)?;
    debug!(tql = %input.tql_where_clause, "query");
    let assets = ledger.chain(&tenant, &chain)?.visible(&caller);
    Ok(Json(json!({ "assets": assets })))
}

async fn map_reduce(
    State(db): State<Db>,
    Path((tenant, chain)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<MapReduceQuery>,
) -> Result<Json<Value>, StatusCode> {
    let ledger = db.read().await;
    let caller = ledger.caller(&headers)?;
    debug!(
        map = %input.map,
        reduce = %input.reduce,
        finalize = ?input.finalize,
        tql = %input.tql_where_clause,
        "map/reduce"
    );
    let records: Vec<Value> = ledger
        .chain(&tenant, &chain)?
        .visible(&caller)
        .into_iter()
        .map(|asset| json!({ "_id": asset.asset_id, "value": asset.asset }))
        .collect();
    Ok(Json(json!({ "records": records })))
}

async fn create_contract(
    State(db): State<Db>,
    Path((tenant, chain)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<SmartContract>,
) -> Result<Json<Value>, StatusCode> {
    if input.smart_contract_type != "consent" {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut ledger = db.write().await;
    let grantor = ledger.caller(&headers)?;
    let chain = ledger.chain_mut(&tenant, &chain)?;

    let mut words = input.contract.split_whitespace();
    let grantee = match (words.next(), words.next()) {
        (Some("consents"), Some(public_id)) => Some(public_id.to_string()),
        _ => None,
    };
    chain.consents.push(Consent {
        grantor: grantor.clone(),
        grantee,
    });

    let contract = Asset {
        asset_id: Uuid::new_v4().to_string(),
        hash: new_hash(),
        version: 1,
        owners: input.owners,
        signer: grantor,
        asset: json!({
            "name": input.name,
            "contract": input.contract,
            "smart_contract_type": input.smart_contract_type,
        }),
        asset_metadata: input.smart_contract_metadata,
    };
    let asset_id = contract.asset_id.clone();
    chain.contracts.insert(asset_id.clone(), contract);
    Ok(Json(json!({ "asset_id": asset_id })))
}

async fn asset_status(
    State(db): State<Db>,
    Path((tenant, chain, asset_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let ledger = db.read().await;
    ledger.caller(&headers)?;
    let chain = ledger.chain(&tenant, &chain)?;
    if !chain.latest.contains_key(&asset_id) && !chain.contracts.contains_key(&asset_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "message": format!("asset {asset_id} accepted") })))
}

async fn latest_asset(
    State(db): State<Db>,
    Path((tenant, chain, asset_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let ledger = db.read().await;
    let caller = ledger.caller(&headers)?;
    let chain = ledger.chain(&tenant, &chain)?;
    let asset = chain.latest.get(&asset_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(visible_or_empty(chain, asset, &caller))
}

async fn asset_by_hash(
    State(db): State<Db>,
    Path((tenant, chain, hash)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    let ledger = db.read().await;
    let caller = ledger.caller(&headers)?;
    let chain = ledger.chain(&tenant, &chain)?;
    let asset = chain.versions.get(&hash).ok_or(StatusCode::NOT_FOUND)?;
    Ok(visible_or_empty(chain, asset, &caller))
}

/// Assets the caller cannot see come back as 200 with an empty body.
fn visible_or_empty(chain: &Chain, asset: &Asset, caller: &str) -> Response {
    if chain.visible_to(asset, caller) {
        Json(asset.clone()).into_response()
    } else {
        StatusCode::OK.into_response()
    }
}
