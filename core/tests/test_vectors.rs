//! Verify every domain operation against `test-vectors/operations.json`.
//!
//! Each case names an operation, its arguments, the request the client must
//! emit, a simulated response, and the value the operation must return.
//! Bodies are compared as parsed JSON so field order does not matter.

use std::cell::RefCell;

use burstchain_core::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, RestClient, Transport, TransportError,
};
use serde_json::Value;

/// Replays one canned response and keeps the request it was given.
struct Replay {
    response: HttpResponse,
    seen: RefCell<Vec<HttpRequest>>,
}

impl Transport for Replay {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.borrow_mut().push(request.clone());
        Ok(self.response.clone())
    }
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        other => panic!("unknown method: {other}"),
    }
}

fn s<'a>(args: &'a Value, key: &str) -> &'a str {
    args[key].as_str().unwrap_or_else(|| panic!("missing string arg {key}"))
}

fn strings(args: &Value, key: &str) -> Vec<String> {
    serde_json::from_value(args[key].clone()).unwrap()
}

fn optional(args: &Value, key: &str) -> Option<Value> {
    match &args[key] {
        Value::Null => None,
        value => Some(value.clone()),
    }
}

/// Run the named operation and fold its result into a JSON value.
fn invoke<T: Transport>(client: &RestClient<T>, operation: &str, args: &Value) -> Result<Value, ApiError> {
    let id = |r: Result<String, ApiError>| r.map(Value::String);
    let whole = |r: Result<Option<Value>, ApiError>| r.map(|v| v.unwrap_or(Value::Null));
    let list = |r: Result<Option<Vec<Value>>, ApiError>| r.map(|v| v.map(Value::Array).unwrap_or(Value::Null));

    match operation {
        "put_metadata" => whole(client.put_metadata(&args["dictionary"], s(args, "username"), s(args, "password"))),
        "get_private_id" => id(client.get_private_id()),
        "get_public_id" => id(client.get_public_id(s(args, "private_id"))),
        "create_asset" => id(client.create_asset(
            s(args, "private_id"),
            s(args, "chain"),
            &strings(args, "owners"),
            &args["asset"],
            optional(args, "asset_metadata").as_ref(),
        )),
        "get_asset_status" => id(client.get_asset_status(s(args, "private_id"), s(args, "chain"), s(args, "asset_id"))),
        "get_asset_by_id" => whole(client.get_asset_by_id(s(args, "private_id"), s(args, "chain"), s(args, "asset_id"))),
        "get_asset_by_hash" => whole(client.get_asset_by_hash(s(args, "private_id"), s(args, "chain"), s(args, "hash"))),
        "update_asset" => id(client.update_asset(
            s(args, "private_id"),
            s(args, "chain"),
            s(args, "asset_id"),
            &args["asset"],
            optional(args, "asset_metadata").as_ref(),
        )),
        "transfer_asset" => id(client.transfer_asset(
            s(args, "private_id"),
            s(args, "chain"),
            s(args, "asset_id"),
            &strings(args, "owners"),
            &strings(args, "new_owners"),
            s(args, "new_signer_public_id"),
        )),
        "query" => list(client.query(s(args, "private_id"), s(args, "chain"), s(args, "tql"))),
        "map_reduce" => list(client.map_reduce(
            s(args, "private_id"),
            s(args, "chain"),
            s(args, "map"),
            s(args, "reduce"),
            args["finalize"].as_str(),
            s(args, "tql"),
        )),
        "create_consent" => id(client.create_consent(
            s(args, "private_id"),
            s(args, "chain"),
            &strings(args, "owners"),
            s(args, "name"),
            s(args, "contract"),
        )),
        other => panic!("unknown operation: {other}"),
    }
}

#[test]
fn operation_test_vectors() {
    let raw = include_str!("../../test-vectors/operations.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();
    let tenant = vectors["tenant"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let replay = Replay {
            response: HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().to_string(),
            },
            seen: RefCell::new(Vec::new()),
        };
        let client = RestClient::with_transport(base_url, tenant, &replay);

        // Verify result
        let result = invoke(&client, case["operation"].as_str().unwrap(), &case["args"])
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(result, case["expected_result"], "{name}: result");

        // Verify request
        let seen = replay.seen.borrow();
        assert_eq!(seen.len(), 1, "{name}: exactly one round trip");
        let req = &seen[0];
        let expected = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{base_url}{}", expected["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = serde_json::from_value(expected["headers"].clone()).unwrap();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match &expected["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: no body"),
            body => {
                let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent, body, "{name}: body");
            }
        }
    }
}

#[test]
fn failure_vectors_return_status_errors() {
    let replay = Replay {
        response: HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "boom".to_string(),
        },
        seen: RefCell::new(Vec::new()),
    };
    let client = RestClient::with_transport("http://localhost:3000", "acme", &replay);

    let args = serde_json::json!({
        "private_id": "priv-1",
        "chain": "address",
        "owners": ["pub-1"],
        "asset": {},
        "asset_metadata": null
    });
    let err = invoke(&client, "create_asset", &args).unwrap_err();
    match err {
        ApiError::Status { path, status, body } => {
            assert_eq!(path, "/api/burstchain/acme/address/asset");
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(replay.seen.borrow().len(), 1);
}
