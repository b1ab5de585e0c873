// JSON-RPC client tests against a mock Zabbix frontend

mod common;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{backend_config, rpc_result, API_PATH, TOKEN};
use zabbixbot::config::BackendConfig;
use zabbixbot::zabbix::{JsonRpc, RpcClient, RpcError};

#[tokio::test]
async fn test_call_posts_json_rpc_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("content-type", "application/json-rpc"))
        .respond_with(rpc_result(json!([{"eventid": "1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RpcClient::new(&backend_config(&server)).unwrap();
    let result = client
        .call("problem.get", json!({"groupids": 41}), TOKEN)
        .await
        .unwrap();

    assert_eq!(result, json!([{"eventid": "1"}]));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body,
        json!({
            "jsonrpc": "2.0",
            "method": "problem.get",
            "params": {"groupids": 41},
            "id": 1,
            "auth": TOKEN
        })
    );
}

#[tokio::test]
async fn test_error_object_is_rpc_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": {
                "code": -32602,
                "message": "Invalid params.",
                "data": "Session terminated, re-login, please."
            },
            "id": 1
        })))
        .mount(&server)
        .await;

    let client = RpcClient::new(&backend_config(&server)).unwrap();
    let err = client.call("problem.get", json!({}), "expired").await.unwrap_err();

    assert_eq!(
        err,
        RpcError::RpcFault {
            code: -32602,
            message: "Invalid params.".to_string(),
            data: "Session terminated, re-login, please.".to_string(),
        }
    );
}

#[tokio::test]
async fn test_non_success_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RpcClient::new(&backend_config(&server)).unwrap();
    let err = client.call("trigger.get", json!({}), TOKEN).await.unwrap_err();

    match err {
        RpcError::Transport(msg) => assert!(msg.contains("502"), "{msg}"),
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let client = RpcClient::new(&backend_config(&server)).unwrap();
    let err = client.call("problem.get", json!({}), TOKEN).await.unwrap_err();

    assert!(matches!(err, RpcError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let config = BackendConfig {
        url: "http://127.0.0.1:9/api_jsonrpc.php".to_string(),
        auth_token: TOKEN.to_string(),
        timeout_ms: 2_000,
    };

    let client = RpcClient::new(&config).unwrap();
    let err = client.call("problem.get", json!({}), TOKEN).await.unwrap_err();

    assert!(matches!(err, RpcError::Transport(_)));
}
