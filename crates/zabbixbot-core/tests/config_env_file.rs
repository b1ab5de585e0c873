// Configuration loading from dotenv files

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use zabbixbot::config::{Config, DEFAULT_ENV_FILE};

fn env_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const DATA_ENV: &str = "\
BOT_TOKEN=123:abc
api_url=https://zabbix.example.com/zabbix/api_jsonrpc.php
api_token=file-token
AGENT_GROUPS=40,39
API_TIMEOUT=10s
";

#[test]
fn test_values_come_from_file() {
    let file = env_file(DATA_ENV);
    let config = Config::from_sources(Some(file.path()), |_| None).unwrap();

    assert_eq!(config.telegram.bot_token, "123:abc");
    assert_eq!(
        config.backend.url,
        "https://zabbix.example.com/zabbix/api_jsonrpc.php"
    );
    assert_eq!(config.backend.auth_token, "file-token");
    assert_eq!(config.groups.agent_groups, vec![40, 39]);
    assert_eq!(config.groups.ilo_group, 41);
    assert_eq!(config.backend.timeout(), Duration::from_secs(10));
}

#[test]
fn test_environment_overrides_file() {
    let file = env_file(DATA_ENV);
    let env: HashMap<&str, &str> = [("api_token", "env-token"), ("MIN_SEVERITY", "4")]
        .into_iter()
        .collect();

    let config = Config::from_sources(Some(file.path()), |key: &str| {
        env.get(key).map(|value| (*value).to_string())
    })
    .unwrap();

    assert_eq!(config.backend.auth_token, "env-token");
    assert_eq!(config.groups.min_severity, 4);
    assert_eq!(config.telegram.bot_token, "123:abc");
}

#[test]
fn test_missing_file_falls_back_to_environment() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join(DEFAULT_ENV_FILE);
    let env: HashMap<&str, &str> = [
        ("BOT_TOKEN", "1:x"),
        ("API_URL", "http://127.0.0.1/api_jsonrpc.php"),
        ("API_TOKEN", "t"),
    ]
    .into_iter()
    .collect();

    let config = Config::from_sources(Some(missing.as_path()), |key: &str| {
        env.get(key).map(|value| (*value).to_string())
    })
    .unwrap();

    assert_eq!(config.backend.url, "http://127.0.0.1/api_jsonrpc.php");
    assert!(!config.push.is_enabled());
}

#[test]
fn test_missing_required_key_is_reported() {
    let file = env_file("BOT_TOKEN=123:abc\napi_url=https://zabbix.example.com/\n");
    let err = Config::from_sources(Some(file.path()), |_| None).unwrap_err();

    assert!(err.to_string().contains("API_TOKEN"), "{err}");
}

#[test]
fn test_blank_values_count_as_missing() {
    let file = env_file(&format!("{DATA_ENV}api_token=\n"));
    let err = Config::from_sources(Some(file.path()), |key: &str| {
        (key == "API_TOKEN").then(|| "   ".to_string())
    })
    .unwrap_err();

    assert!(err.to_string().contains("API_TOKEN"), "{err}");
}

#[test]
fn test_backend_only_file_loads_without_bot_token() {
    let file = env_file(
        "API_URL=https://zabbix.example.com/zabbix/api_jsonrpc.php\nAPI_TOKEN=file-token\n",
    );
    let config = Config::from_sources(Some(file.path()), |_| None).unwrap();

    assert_eq!(config.backend.auth_token, "file-token");
    assert!(config.telegram.ensure_token().is_err());
}
