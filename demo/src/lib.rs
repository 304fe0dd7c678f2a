//! The "hello world" tour of the BurstChain API.
//!
//! `run` walks fourteen steps in order: dictionary, identities, asset
//! lifecycle, transfer, queries, and a consent contract. The first failing
//! call ends the tour; the error has already been logged by the client.

use burstchain_core::{ApiError, RestClient, Transport};
use chrono::{Duration, Local};
use rand::Rng;
use serde_json::{json, Value};
use tracing::{error, info};

pub const COLLECTION: &str = "address";

/// Credentials of the tenant admin, used only for the dictionary.
#[derive(Debug, Clone)]
pub struct Admin {
    pub username: String,
    pub password: String,
}

/// What the tour observed, for callers that want to check it.
#[derive(Debug, Clone, Default)]
pub struct Tour {
    pub private_id: String,
    pub public_id: String,
    pub asset_id: String,
    pub first_hash: Option<String>,
    pub second_private_id: String,
    pub second_public_id: String,
    pub hidden_from_first_owner: bool,
    pub visible_to_new_owner: bool,
    pub where_matches: usize,
    pub select_matches: usize,
    pub map_reduce_records: usize,
    pub consent_id: String,
    pub visible_after_consent: bool,
}

/// Schema of the `address` collection.
pub fn address_dictionary() -> Value {
    json!({
        "collection": COLLECTION,
        "indexes": [{
            "unique": true,
            "attributes": ["id"]
        }],
        "rootnode": {
            "attributes": [
                {"name": "id", "required": true},
                {"name": "addr1"},
                {"name": "addr2"},
                {"name": "city"},
                {"name": "state"},
                {"name": "zip"}
            ]
        }
    })
}

/// Consent contract granting `public_id` sight of Colorado addresses for
/// ten days.
pub fn consent_contract(public_id: &str) -> String {
    let until = (Local::now() + Duration::days(10)).format("%Y-%m-%d %H:%M:%S");
    format!("consents {public_id} for {COLLECTION} when asset.state = 'CO' until Date('{until}')")
}

pub fn run<T: Transport>(
    client: &RestClient<T>,
    admin: &Admin,
    private_id: Option<&str>,
) -> Result<Tour, ApiError> {
    let mut tour = Tour::default();

    // STEP 1 - dictionary for the chain
    let dictionary = address_dictionary();
    let resp = client.put_metadata(&dictionary, &admin.username, &admin.password)?;
    let message = resp.as_ref().and_then(|r| r.get("message")).cloned().unwrap_or(Value::Null);
    info!("PUT dictionary response: {message}");

    // STEP 2 - private id
    tour.private_id = match private_id.filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => client.get_private_id()?,
    };
    info!("Using private id {} for this demo", tour.private_id);

    // STEP 3 - public id
    tour.public_id = client.get_public_id(&tour.private_id)?;
    info!("Using public id {} for this demo", tour.public_id);
    let owners = vec![tour.public_id.clone()];

    // STEP 4 - asset
    let mut asset = json!({
        "id": rand::rng().random_range(1000..=10000u32).to_string(),
        "addr1": "123 Main St",
        "city": "Nowhere",
        "state": "XX",
        "zip": "12345-0000"
    });
    let metadata = json!({"loaded by": "hello world demo"});
    tour.asset_id = client.create_asset(&tour.private_id, COLLECTION, &owners, &asset, Some(&metadata))?;
    info!("Asset created {} for this demo", tour.asset_id);

    // STEP 5 - status
    let accepted = client.get_asset_status(&tour.private_id, COLLECTION, &tour.asset_id)?;
    info!("Status response message {accepted}");

    // STEP 6 - by id
    let resp = client.get_asset_by_id(&tour.private_id, COLLECTION, &tour.asset_id)?;
    tour.first_hash = resp
        .as_ref()
        .and_then(|r| r.get("hash"))
        .and_then(Value::as_str)
        .map(str::to_string);
    info!("ASSET:\n {}", pretty(&resp));

    // STEP 7 - by hash
    let Some(hash) = tour.first_hash.clone() else {
        let err = ApiError::MissingField {
            path: format!("/api/burstchain/{}/{COLLECTION}/{}/latest", client.tenant(), tour.asset_id),
            field: "hash",
        };
        error!("{err}");
        return Err(err);
    };
    let resp = client.get_asset_by_hash(&tour.private_id, COLLECTION, &hash)?;
    info!("ASSET:\n {}", pretty(&resp));

    // STEP 8 - update
    asset["state"] = json!("CO");
    let updated = client.update_asset(&tour.private_id, COLLECTION, &tour.asset_id, &asset, None)?;
    info!("Asset updated {updated} for this demo");

    // STEP 9 - by id again
    let resp = client.get_asset_by_id(&tour.private_id, COLLECTION, &tour.asset_id)?;
    info!("ASSET:\n {}", pretty(&resp));

    // STEP 10 - transfer to a second identity
    tour.second_private_id = client.get_private_id()?;
    tour.second_public_id = client.get_public_id(&tour.second_private_id)?;
    let new_owners = vec![tour.second_public_id.clone()];
    let transferred = client.transfer_asset(
        &tour.private_id,
        COLLECTION,
        &tour.asset_id,
        &owners,
        &new_owners,
        &tour.second_public_id,
    )?;
    info!("transferred asset id {transferred}");

    let resp = client.get_asset_by_id(&tour.private_id, COLLECTION, &tour.asset_id)?;
    tour.hidden_from_first_owner = resp.is_none();
    info!("ASSET should be NULL:\n {}", pretty(&resp));

    let resp = client.get_asset_by_id(&tour.second_private_id, COLLECTION, &tour.asset_id)?;
    tour.visible_to_new_owner = resp.is_some();
    info!("ASSET:\n {}", pretty(&resp));

    // STEP 11 - TQL where clause
    let assets = client.query(&tour.second_private_id, COLLECTION, "WHERE asset.state = 'CO'")?;
    tour.where_matches = assets.as_ref().map_or(0, Vec::len);
    info!("TQL 1 ASSET:\n {}", pretty(&assets));

    // STEP 12 - TQL select
    let assets = client.query(
        &tour.second_private_id,
        COLLECTION,
        "SELECT asset.id FROM address WHERE asset.state = 'CO'",
    )?;
    tour.select_matches = assets.as_ref().map_or(0, Vec::len);
    info!("TQL 2 ASSET:\n {}", pretty(&assets));

    // STEP 13 - map/reduce
    let records = client.map_reduce(
        &tour.second_private_id,
        COLLECTION,
        "function() { emit(this.asset.state, this) }",
        "function(k, v) { return v[0] }",
        None,
        "WHERE asset.state = 'CO' ORDER BY asset.id LIMIT 100",
    )?;
    tour.map_reduce_records = records.as_ref().map_or(0, Vec::len);
    info!("MR ASSET:\n {}", pretty(&records));

    // STEP 14 - consent contract for the first owner
    let contract = consent_contract(&tour.public_id);
    let contract_owners = vec![tour.second_private_id.clone()];
    tour.consent_id = client.create_consent(
        &tour.second_private_id,
        COLLECTION,
        &contract_owners,
        "first consent",
        &contract,
    )?;
    info!("Smart Contract (consent) asset id {} for this demo", tour.consent_id);

    let resp = client.get_asset_by_id(&tour.private_id, COLLECTION, &tour.asset_id)?;
    tour.visible_after_consent = resp.is_some();
    info!("ASSET should be VIEWABLE:\n {}", pretty(&resp));

    Ok(tour)
}

fn pretty<V: serde::Serialize>(value: &V) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
