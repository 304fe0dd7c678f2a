//! Authenticated JSON-over-HTTP client for one BurstChain server and tenant.
//!
//! # Design
//! `RestClient` is bound to a server base URL and a tenant for its whole
//! lifetime and carries no other state between calls. Everything funnels
//! through `send`: it builds an `HttpRequest` (`build_request`), lets the
//! `Transport` execute it, and interprets the `HttpResponse`
//! (`parse_response`). The domain operations only format paths and bodies
//! and pick one field out of the reply.
//!
//! Failures are logged once, where they are detected, and returned. The
//! client never retries and never stops the process.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;
use crate::types::{AssetTransfer, AssetUpdate, MapReduceQuery, NewAsset, SmartContract, TqlQuery};

/// Pass as the `body` of `send` for requests without one.
pub const NO_BODY: Option<&'static Value> = None;

const BASE_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json"),
    ("Accept", "application/json"),
];

const DEFAULT_LOADER: &str = "hello world demo";

pub struct RestClient<T = UreqTransport> {
    server: String,
    tenant: String,
    loader: String,
    transport: T,
}

impl RestClient<UreqTransport> {
    pub fn new(server: &str, tenant: &str) -> Self {
        Self::with_transport(server, tenant, UreqTransport::new())
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(server: &str, tenant: &str, transport: T) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            tenant: tenant.to_string(),
            loader: DEFAULT_LOADER.to_string(),
            transport,
        }
    }

    /// Label recorded as `loaded by` in smart contract metadata.
    pub fn with_loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = loader.into();
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request `send` would issue, without executing it.
    ///
    /// Headers start from `Content-Type` and `Accept` set to
    /// `application/json`. Each extra header replaces a base header of the
    /// same name (ignoring case) or is appended. Basic auth is applied last
    /// and overrides any `Authorization` header.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        extra_headers: &[(&str, &str)],
        body: Option<&B>,
        basic_auth: Option<(&str, &str)>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers: Vec<(String, String)> = BASE_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        for (name, value) in extra_headers {
            set_header(&mut headers, name, value);
        }
        if let Some((username, password)) = basic_auth {
            let token = STANDARD.encode(format!("{username}:{password}"));
            set_header(&mut headers, "Authorization", &format!("Basic {token}"));
        }

        let body = body.map(serde_json::to_string).transpose()?;

        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.server),
            headers,
            body,
        })
    }

    /// Issue one request and return the decoded body, `None` when empty.
    pub fn send<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        extra_headers: &[(&str, &str)],
        body: Option<&B>,
        basic_auth: Option<(&str, &str)>,
    ) -> Result<Option<Value>, ApiError> {
        let result = self
            .build_request(method, path, extra_headers, body, basic_auth)
            .and_then(|request| {
                debug!(method = method.as_str(), url = %request.url, "sending request");
                self.transport
                    .execute(&request)
                    .map_err(|source| ApiError::Transport {
                        path: path.to_string(),
                        source,
                    })
            })
            .and_then(|response| parse_response(path, response));
        logged(result)
    }

    /// `send` authorized by a private id (`Authorization: ID <id>`).
    ///
    /// With no private id (or an empty one) the request carries no
    /// authorization at all.
    pub fn send_with_private_id<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        private_id: Option<&str>,
        body: Option<&B>,
    ) -> Result<Option<Value>, ApiError> {
        match private_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                let value = format!("ID {id}");
                self.send(method, path, &[("Authorization", value.as_str())], body, None)
            }
            None => self.send(method, path, &[], body, None),
        }
    }

    /// Store a data dictionary. Requires the tenant admin's credentials.
    pub fn put_metadata(
        &self,
        dictionary: &Value,
        username: &str,
        password: &str,
    ) -> Result<Option<Value>, ApiError> {
        self.send(
            HttpMethod::Put,
            "/api/metadata/dictionary",
            &[],
            Some(dictionary),
            Some((username, password)),
        )
    }

    /// Mint a new private id.
    pub fn get_private_id(&self) -> Result<String, ApiError> {
        let path = "/api/burstchain/id/private";
        let response = self.send(HttpMethod::Get, path, &[], NO_BODY, None)?;
        string_field(path, response, "private_id")
    }

    /// Fetch the public id paired with `private_id`.
    pub fn get_public_id(&self, private_id: &str) -> Result<String, ApiError> {
        let path = "/api/burstchain/id/public";
        let response = self.send_with_private_id(HttpMethod::Get, path, Some(private_id), NO_BODY)?;
        string_field(path, response, "public_id")
    }

    /// Create an asset on `chain` and return its id.
    pub fn create_asset(
        &self,
        private_id: &str,
        chain: &str,
        owners: &[String],
        asset: &Value,
        asset_metadata: Option<&Value>,
    ) -> Result<String, ApiError> {
        let path = self.chain_path(chain, "asset");
        let body = NewAsset {
            owners,
            asset,
            asset_metadata,
        };
        let response = self.send_with_private_id(HttpMethod::Post, &path, Some(private_id), Some(&body))?;
        string_field(&path, response, "asset_id")
    }

    pub fn get_asset_status(&self, private_id: &str, chain: &str, asset_id: &str) -> Result<String, ApiError> {
        let path = self.chain_path(chain, &format!("{asset_id}/status"));
        let response = self.send_with_private_id(HttpMethod::Get, &path, Some(private_id), NO_BODY)?;
        string_field(&path, response, "message")
    }

    /// Latest version of an asset; `None` when this identity cannot see it.
    pub fn get_asset_by_id(
        &self,
        private_id: &str,
        chain: &str,
        asset_id: &str,
    ) -> Result<Option<Value>, ApiError> {
        let path = self.chain_path(chain, &format!("{asset_id}/latest"));
        self.send_with_private_id(HttpMethod::Get, &path, Some(private_id), NO_BODY)
    }

    pub fn get_asset_by_hash(&self, private_id: &str, chain: &str, hash: &str) -> Result<Option<Value>, ApiError> {
        let path = self.chain_path(chain, hash);
        self.send_with_private_id(HttpMethod::Get, &path, Some(private_id), NO_BODY)
    }

    pub fn update_asset(
        &self,
        private_id: &str,
        chain: &str,
        asset_id: &str,
        asset: &Value,
        asset_metadata: Option<&Value>,
    ) -> Result<String, ApiError> {
        let path = self.chain_path(chain, "asset");
        let body = AssetUpdate {
            asset_id,
            asset,
            asset_metadata,
        };
        let response = self.send_with_private_id(HttpMethod::Put, &path, Some(private_id), Some(&body))?;
        string_field(&path, response, "asset_id")
    }

    /// Hand an asset from `owners` to `new_owners`, signed by the new signer.
    pub fn transfer_asset(
        &self,
        private_id: &str,
        chain: &str,
        asset_id: &str,
        owners: &[String],
        new_owners: &[String],
        new_signer_public_id: &str,
    ) -> Result<String, ApiError> {
        let path = self.chain_path(chain, "transfer");
        let body = AssetTransfer {
            asset_id,
            owners,
            new_owners,
            new_signer_public_id,
        };
        let response = self.send_with_private_id(HttpMethod::Post, &path, Some(private_id), Some(&body))?;
        string_field(&path, response, "asset_id")
    }

    /// Run a TQL query. The clause is sent as-is.
    pub fn query(&self, private_id: &str, chain: &str, tql: &str) -> Result<Option<Vec<Value>>, ApiError> {
        let path = self.chain_path(chain, "query");
        let body = TqlQuery { tql_where_clause: tql };
        let response = self.send_with_private_id(HttpMethod::Post, &path, Some(private_id), Some(&body))?;
        array_field(&path, response, "assets")
    }

    pub fn map_reduce(
        &self,
        private_id: &str,
        chain: &str,
        map: &str,
        reduce: &str,
        finalize: Option<&str>,
        tql: &str,
    ) -> Result<Option<Vec<Value>>, ApiError> {
        let path = self.chain_path(chain, "mapreduce/query");
        let body = MapReduceQuery {
            map,
            reduce,
            finalize,
            tql_where_clause: tql,
        };
        let response = self.send_with_private_id(HttpMethod::Post, &path, Some(private_id), Some(&body))?;
        array_field(&path, response, "records")
    }

    /// Install a consent smart contract and return its asset id.
    pub fn create_consent(
        &self,
        private_id: &str,
        chain: &str,
        owners: &[String],
        name: &str,
        contract: &str,
    ) -> Result<String, ApiError> {
        let path = self.chain_path(chain, "smartcontract");
        let body = SmartContract {
            contract,
            name,
            smart_contract_metadata: json!({ "loaded by": self.loader }),
            smart_contract_type: "consent",
            owners,
        };
        debug!(contract, name, "installing consent contract");
        let response = self.send_with_private_id(HttpMethod::Post, &path, Some(private_id), Some(&body))?;
        string_field(&path, response, "asset_id")
    }

    fn chain_path(&self, chain: &str, tail: &str) -> String {
        format!("/api/burstchain/{}/{chain}/{tail}", self.tenant)
    }
}

impl<T> fmt::Debug for RestClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("server", &self.server)
            .field("tenant", &self.tenant)
            .finish_non_exhaustive()
    }
}

/// Interpret a response: 200 only, empty or `null` body maps to `None`.
pub fn parse_response(path: &str, response: HttpResponse) -> Result<Option<Value>, ApiError> {
    if response.status != 200 {
        return Err(ApiError::Status {
            path: path.to_string(),
            status: response.status,
            body: response.body,
        });
    }
    if response.body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(&response.body).map_err(|source| ApiError::Deserialization {
        path: path.to_string(),
        source,
    })?;
    Ok(match value {
        Value::Null => None,
        value => Some(value),
    })
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        Some(slot) => slot.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

fn logged<V>(result: Result<V, ApiError>) -> Result<V, ApiError> {
    if let Err(err) = &result {
        error!("{err}");
    }
    result
}

fn string_field(path: &str, response: Option<Value>, field: &'static str) -> Result<String, ApiError> {
    let value = response
        .as_ref()
        .and_then(|body| body.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::MissingField {
            path: path.to_string(),
            field,
        });
    logged(value)
}

fn array_field(path: &str, response: Option<Value>, field: &'static str) -> Result<Option<Vec<Value>>, ApiError> {
    let value = match response.and_then(|mut body| body.get_mut(field).map(Value::take)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(ApiError::MissingField {
            path: path.to_string(),
            field,
        }),
    };
    logged(value)
}
