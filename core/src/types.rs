//! Request payloads for the BurstChain API.
//!
//! # Design
//! The payloads borrow from the caller since they only live for the
//! duration of one `send`. Assets, dictionaries and metadata stay opaque
//! `serde_json::Value`s; the service owns their shape. Optional members are
//! serialized as explicit `null`, which is what the service expects.

use serde::Serialize;
use serde_json::Value;

/// Body of `POST .../asset`.
#[derive(Debug, Clone, Serialize)]
pub struct NewAsset<'a> {
    pub owners: &'a [String],
    pub asset: &'a Value,
    pub asset_metadata: Option<&'a Value>,
}

/// Body of `PUT .../asset`.
#[derive(Debug, Clone, Serialize)]
pub struct AssetUpdate<'a> {
    pub asset_id: &'a str,
    pub asset: &'a Value,
    pub asset_metadata: Option<&'a Value>,
}

/// Body of `POST .../transfer`. `owners` must list the current owners.
#[derive(Debug, Clone, Serialize)]
pub struct AssetTransfer<'a> {
    pub asset_id: &'a str,
    pub owners: &'a [String],
    pub new_owners: &'a [String],
    pub new_signer_public_id: &'a str,
}

/// Body of `POST .../query`. The clause is passed through untouched.
#[derive(Debug, Clone, Serialize)]
pub struct TqlQuery<'a> {
    #[serde(rename = "tqlWhereClause")]
    pub tql_where_clause: &'a str,
}

/// Body of `POST .../mapreduce/query`.
#[derive(Debug, Clone, Serialize)]
pub struct MapReduceQuery<'a> {
    pub map: &'a str,
    pub reduce: &'a str,
    pub finalize: Option<&'a str>,
    #[serde(rename = "tqlWhereClause")]
    pub tql_where_clause: &'a str,
}

/// Body of `POST .../smartcontract`.
#[derive(Debug, Clone, Serialize)]
pub struct SmartContract<'a> {
    pub contract: &'a str,
    pub name: &'a str,
    pub smart_contract_metadata: Value,
    pub smart_contract_type: &'static str,
    pub owners: &'a [String],
}
