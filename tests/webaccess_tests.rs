use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use powergate::{
    directory::MeterTagDirectory,
    error::GatewayError,
    export::CsvExportStore,
    planner::Scope,
    upstream::{Credentials, DataReduction, UpstreamTarget, WebAccessClient},
    Gateway, Operation,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::Duration;

// Fake WebAccess data log: every bucket reads 2, except the first which is "#".
async fn get_data_log(
    Path((project, node)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let expected = format!("Basic {}", STANDARD.encode("admin:secret"));
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if project != "85" || node != "energy" {
        return Ok(Json(json!({"Result": {"Ret": 1, "Total": 0}})));
    }

    let records = body["Records"].as_u64().unwrap_or(0) as usize;
    let data_log: Vec<Value> = body["Tags"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|tag| {
            let mut values = vec!["2".to_string(); records];
            if let Some(first) = values.first_mut() {
                *first = "#".to_string();
            }
            json!({"Name": tag["Name"], "Values": values})
        })
        .collect();

    Ok(Json(json!({"Result": {"Ret": 0, "Total": data_log.len()}, "DataLog": data_log})))
}

async fn spawn_upstream() -> String {
    let app = Router::new().route("/WaWebService/Json/GetDataLog/:project/:node", post(get_data_log));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/WaWebService", addr)
}

fn gateway(root_url: &str, project: &str, export_dir: &std::path::Path) -> Gateway {
    let client = WebAccessClient::new(root_url, Duration::from_secs(5)).unwrap();
    Gateway::new(
        Arc::new(client),
        MeterTagDirectory::from_json(r#"[["kw", "kw1"], "kw", "kw1"]"#).unwrap(),
        UpstreamTarget {
            project: project.to_string(),
            node: "energy".to_string(),
            reduction: DataReduction::Avg,
        },
        CsvExportStore::new(export_dir, "localhost", 8888),
    )
}

fn history(granularity: u32) -> Operation {
    Operation::ConsumptionHistory {
        meter: 0,
        granularity,
        scope: Scope::Day,
        date: NaiveDate::from_ymd_opt(2015, 4, 25).unwrap(),
    }
}

#[tokio::test]
async fn test_history_against_upstream() {
    let root_url = spawn_upstream().await;
    let temp_dir = TempDir::new().unwrap();
    let gateway = gateway(&root_url, "85", temp_dir.path());

    let output = gateway
        .execute(&history(30), &Credentials::new("admin", "secret"))
        .await
        .unwrap();
    let json = serde_json::to_value(&output).unwrap();

    // Two windows, two tags, first bucket of each window is "#"
    assert_eq!(json["sum"], 2 * 2 * 23 * 2);
    assert_eq!(json["energy_consumption_day"][0]["time_0_12"][0], 0);
    assert_eq!(json["energy_consumption_day"][1]["time_12_24"][1], 4);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let root_url = spawn_upstream().await;
    let temp_dir = TempDir::new().unwrap();
    let gateway = gateway(&root_url, "85", temp_dir.path());

    let err = gateway
        .execute(&history(60), &Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::AuthenticationFailed));
    assert_eq!(err.error_code().as_str(), "0005");
}

#[tokio::test]
async fn test_upstream_ret_failure() {
    let root_url = spawn_upstream().await;
    let temp_dir = TempDir::new().unwrap();
    let gateway = gateway(&root_url, "86", temp_dir.path());

    let err = gateway
        .execute(&history(60), &Credentials::new("admin", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let temp_dir = TempDir::new().unwrap();
    let gateway = gateway("http://127.0.0.1:1/WaWebService", "85", temp_dir.path());

    let err = gateway
        .execute(&history(60), &Credentials::new("admin", "secret"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code().as_str(), "0001");
}
