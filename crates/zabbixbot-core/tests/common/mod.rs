// Shared test helpers: a wiremock-backed Zabbix JSON-RPC endpoint

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zabbixbot::aggregator::ProblemAggregator;
use zabbixbot::config::BackendConfig;
use zabbixbot::zabbix::RpcClient;

pub const API_PATH: &str = "/zabbix/api_jsonrpc.php";
pub const TOKEN: &str = "static-token";
pub const NOW: i64 = 1_700_000_000;

pub fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        url: format!("{}{API_PATH}", server.uri()),
        auth_token: TOKEN.to_string(),
        timeout_ms: 5_000,
    }
}

pub fn aggregator(server: &MockServer) -> ProblemAggregator {
    let rpc = RpcClient::new(&backend_config(server)).expect("client");
    ProblemAggregator::new(Arc::new(rpc), TOKEN)
}

pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "result": result, "id": 1}))
}

pub fn problem(eventid: &str, objectid: &str, age_secs: i64, severity: u8) -> Value {
    json!({
        "eventid": eventid,
        "source": "0",
        "object": "0",
        "objectid": objectid,
        "clock": (NOW - age_secs).to_string(),
        "ns": "0",
        "r_eventid": "0",
        "r_clock": "0",
        "r_ns": "0",
        "correlationid": "0",
        "userid": "0",
        "name": "problem",
        "acknowledged": "0",
        "severity": severity.to_string(),
        "opdata": "",
        "acknowledges": [],
        "suppression_data": [],
        "suppressed": "0",
        "tags": []
    })
}

pub async fn mount_problems(server: &MockServer, group_id: u64, problems: Value) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({
            "method": "problem.get",
            "params": {"groupids": group_id}
        })))
        .respond_with(rpc_result(problems))
        .mount(server)
        .await;
}

pub async fn mount_trigger(
    server: &MockServer,
    trigger_id: &str,
    description: &str,
    host: &str,
    status: &str,
) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({
            "method": "trigger.get",
            "params": {"triggerids": trigger_id}
        })))
        .respond_with(rpc_result(json!([{
            "triggerid": trigger_id,
            "description": description,
            "status": status,
            "hosts": [{"hostid": "10084", "host": host}]
        }])))
        .mount(server)
        .await;
}
