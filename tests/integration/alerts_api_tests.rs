//! Alert query endpoint tests
//!
//! Covers the single-alert fetch and the filtered listing: id prefix filter,
//! regex and set-membership filters, sort order, limits, the from-date
//! window, hidden details and JSONP rendering.

use serde_json::Value;

use crate::common::{alert_doc, alert_in_environment, TestApp};

const BASE: &str = "/alerta/api/v1";

#[tokio::test]
async fn test_get_alert_by_exact_id() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "c7e84a2f-1b3d-4f5a-9c8e-0d2b4f6a8c1e",
        "OPEN",
        "CRITICAL",
        "2024-05-01T10:00:00.000Z",
    ));

    let response = app
        .get(&format!(
            "{}/alerts/alert/c7e84a2f-1b3d-4f5a-9c8e-0d2b4f6a8c1e",
            BASE
        ))
        .await;

    response.assert_ok();
    let envelope = response.envelope();
    assert_eq!(envelope["status"], "ok");
    assert_eq!(envelope["total"], 1);
    assert_eq!(
        envelope["alert"]["id"],
        "c7e84a2f-1b3d-4f5a-9c8e-0d2b4f6a8c1e"
    );
    assert_eq!(envelope["alert"]["severity"], "CRITICAL");
}

#[tokio::test]
async fn test_get_alert_requires_exact_id() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "c7e84a2f-1b3d-4f5a-9c8e-0d2b4f6a8c1e",
        "OPEN",
        "MAJOR",
        "2024-05-01T10:00:00.000Z",
    ));

    // A truncated id only matches the id list filter, never the direct fetch.
    let response = app.get(&format!("{}/alerts/alert/c7e84a2f", BASE)).await;

    response.assert_ok();
    let envelope = response.envelope();
    assert_eq!(envelope["status"], "not found");
    assert!(envelope["alert"].is_null());
}

#[tokio::test]
async fn test_list_id_filter_matches_by_prefix() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "c7e84a2f-1b3d-4f5a-9c8e-0d2b4f6a8c1e",
        "OPEN",
        "MAJOR",
        "2024-05-01T10:00:00.000Z",
    ));
    app.alerts.insert(alert_doc(
        "f0a1b2c3-d4e5-4f60-8a7b-9c0d1e2f3a4b",
        "OPEN",
        "MINOR",
        "2024-05-01T11:00:00.000Z",
    ));

    let response = app.get(&format!("{}/alerts?id=c7e84a2f", BASE)).await;

    response.assert_ok();
    let envelope = response.envelope();
    assert_eq!(envelope["status"], "ok");
    assert_eq!(envelope["total"], 1);
    assert_eq!(
        envelope["alerts"]["alertDetails"][0]["id"],
        "c7e84a2f-1b3d-4f5a-9c8e-0d2b4f6a8c1e"
    );
}

#[tokio::test]
async fn test_get_missing_alert_is_not_found() {
    let app = TestApp::new();

    let response = app.get(&format!("{}/alerts/alert/nonexistent", BASE)).await;

    response.assert_ok();
    let envelope = response.envelope();
    assert_eq!(envelope["status"], "not found");
    assert_eq!(envelope["total"], 0);
    assert!(envelope["alert"].is_null());
}

#[tokio::test]
async fn test_envelope_carries_time_fields() {
    let app = TestApp::new();

    let response = app.get(&format!("{}/alerts", BASE)).await;

    response.assert_ok();
    let envelope = response.envelope();
    let time = envelope["time"].as_str().expect("time must be a string");
    assert!(time.parse::<f64>().is_ok());
    assert_eq!(time.split('.').nth(1).map(str::len), Some(3));
    assert!(envelope["localTime"].as_str().is_some());
}

#[tokio::test]
async fn test_list_counts_severity_only_for_open_alerts() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "a1",
        "OPEN",
        "CRITICAL",
        "2024-05-01T10:00:00.000Z",
    ));
    app.alerts.insert(alert_doc(
        "a2",
        "OPEN",
        "MAJOR",
        "2024-05-01T11:00:00.000Z",
    ));
    app.alerts.insert(alert_doc(
        "a3",
        "CLOSED",
        "CRITICAL",
        "2024-05-01T12:00:00.000Z",
    ));

    let response = app.get(&format!("{}/alerts", BASE)).await;

    response.assert_ok();
    let envelope = response.envelope();
    assert_eq!(envelope["status"], "ok");
    assert_eq!(envelope["total"], 3);
    assert_eq!(envelope["alerts"]["statusCounts"]["open"], 2);
    assert_eq!(envelope["alerts"]["statusCounts"]["closed"], 1);
    // The closed critical alert must not inflate the severity counts
    assert_eq!(envelope["alerts"]["severityCounts"]["critical"], 1);
    assert_eq!(envelope["alerts"]["severityCounts"]["major"], 1);
}

#[tokio::test]
async fn test_list_single_value_filter_is_case_insensitive_regex() {
    let app = TestApp::new();
    app.alerts
        .insert(alert_in_environment("a1", "PROD", "2024-05-01T10:00:00.000Z"));
    app.alerts
        .insert(alert_in_environment("a2", "DEV", "2024-05-01T11:00:00.000Z"));

    // Lowercase value and partial fragment both match PROD
    let response = app.get(&format!("{}/alerts?environment=prod", BASE)).await;
    let envelope = response.envelope();
    assert_eq!(envelope["total"], 1);

    let response = app.get(&format!("{}/alerts?environment=RO", BASE)).await;
    let envelope = response.envelope();
    assert_eq!(envelope["total"], 1);
    assert_eq!(
        envelope["alerts"]["alertDetails"][0]["environment"],
        "PROD"
    );
}

#[tokio::test]
async fn test_list_repeated_filter_is_exact_set_membership() {
    let app = TestApp::new();
    app.alerts
        .insert(alert_in_environment("a1", "PROD", "2024-05-01T10:00:00.000Z"));
    app.alerts
        .insert(alert_in_environment("a2", "DEV", "2024-05-01T11:00:00.000Z"));
    app.alerts.insert(alert_in_environment(
        "a3",
        "PRODUCTION",
        "2024-05-01T12:00:00.000Z",
    ));

    let response = app
        .get(&format!(
            "{}/alerts?environment=PROD&environment=DEV",
            BASE
        ))
        .await;

    // Set membership is exact, so PRODUCTION stays out
    let envelope = response.envelope();
    assert_eq!(envelope["total"], 2);
}

#[tokio::test]
async fn test_list_default_sort_is_newest_first() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "old",
        "OPEN",
        "MINOR",
        "2024-05-01T08:00:00.000Z",
    ));
    app.alerts.insert(alert_doc(
        "new",
        "OPEN",
        "MINOR",
        "2024-05-01T12:00:00.000Z",
    ));
    app.alerts.insert(alert_doc(
        "mid",
        "OPEN",
        "MINOR",
        "2024-05-01T10:00:00.000Z",
    ));

    let response = app.get(&format!("{}/alerts", BASE)).await;

    let envelope = response.envelope();
    let ids: Vec<&str> = envelope["alerts"]["alertDetails"]
        .as_array()
        .unwrap()
        .iter()
        .map(|alert| alert["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn test_list_sort_by_other_field_is_ascending() {
    let app = TestApp::new();
    let mut first = alert_doc("a1", "OPEN", "MINOR", "2024-05-01T10:00:00.000Z");
    first["event"] = Value::String("ZoneFault".to_string());
    let mut second = alert_doc("a2", "OPEN", "MINOR", "2024-05-01T11:00:00.000Z");
    second["event"] = Value::String("NodeDown".to_string());
    app.alerts.insert(first);
    app.alerts.insert(second);

    let response = app.get(&format!("{}/alerts?sort-by=event", BASE)).await;

    let envelope = response.envelope();
    let events: Vec<&str> = envelope["alerts"]["alertDetails"]
        .as_array()
        .unwrap()
        .iter()
        .map(|alert| alert["event"].as_str().unwrap())
        .collect();
    assert_eq!(events, vec!["NodeDown", "ZoneFault"]);
}

#[tokio::test]
async fn test_list_limit_caps_results() {
    let app = TestApp::new();
    for i in 0..5 {
        app.alerts.insert(alert_doc(
            &format!("a{}", i),
            "OPEN",
            "MINOR",
            &format!("2024-05-01T1{}:00:00.000Z", i),
        ));
    }

    let response = app.get(&format!("{}/alerts?limit=2", BASE)).await;

    let envelope = response.envelope();
    assert_eq!(envelope["total"], 2);
    assert_eq!(
        envelope["alerts"]["alertDetails"].as_array().unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_list_from_date_window() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "stale",
        "OPEN",
        "MINOR",
        "2024-05-01T08:00:00.000Z",
    ));
    app.alerts.insert(alert_doc(
        "fresh",
        "OPEN",
        "MINOR",
        "2024-05-01T12:00:00.000Z",
    ));

    let response = app
        .get(&format!(
            "{}/alerts?from-date=2024-05-01T10:00:00.000Z",
            BASE
        ))
        .await;

    let envelope = response.envelope();
    assert_eq!(envelope["total"], 1);
    assert_eq!(envelope["alerts"]["alertDetails"][0]["id"], "fresh");
}

#[tokio::test]
async fn test_hide_alert_details_omits_details_but_keeps_counts() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "a1",
        "OPEN",
        "CRITICAL",
        "2024-05-01T10:00:00.000Z",
    ));

    let response = app
        .get(&format!("{}/alerts?hide-alert-details=true", BASE))
        .await;

    let envelope = response.envelope();
    assert_eq!(envelope["total"], 1);
    assert_eq!(envelope["alerts"]["statusCounts"]["open"], 1);
    assert!(envelope["alerts"].get("alertDetails").is_none());
}

#[tokio::test]
async fn test_jsonp_callback_wraps_body() {
    let app = TestApp::new();

    let response = app.get(&format!("{}/alerts?callback=renderIt", BASE)).await;

    response.assert_ok();
    let content_type = response.headers["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("application/javascript"));

    let text = response.text();
    assert!(text.starts_with("renderIt("));
    assert!(text.ends_with(");"));

    let inner: Value =
        serde_json::from_str(&text["renderIt(".len()..text.len() - 2]).unwrap();
    assert_eq!(inner["response"]["status"], "ok");
}

#[tokio::test]
async fn test_cache_buster_param_is_ignored() {
    let app = TestApp::new();
    app.alerts.insert(alert_doc(
        "a1",
        "OPEN",
        "MINOR",
        "2024-05-01T10:00:00.000Z",
    ));

    let response = app.get(&format!("{}/alerts?_=1714557600000", BASE)).await;

    let envelope = response.envelope();
    assert_eq!(envelope["total"], 1);
}

#[tokio::test]
async fn test_counts_over_full_set_widens_counts_but_truncates_details() {
    let mut config = alerta_dbapi::AppConfig::default();
    config.api.counts_over_full_set = true;
    let app = TestApp::with_config(config);

    for i in 0..4 {
        app.alerts.insert(alert_doc(
            &format!("a{}", i),
            "OPEN",
            "MINOR",
            &format!("2024-05-01T1{}:00:00.000Z", i),
        ));
    }

    let response = app.get(&format!("{}/alerts?limit=2", BASE)).await;

    let envelope = response.envelope();
    assert_eq!(envelope["total"], 4);
    assert_eq!(envelope["alerts"]["statusCounts"]["open"], 4);
    assert_eq!(
        envelope["alerts"]["alertDetails"].as_array().unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_configured_warning_is_surfaced() {
    let mut config = alerta_dbapi::AppConfig::default();
    config.warning = Some("scheduled maintenance at 18:00".to_string());
    let app = TestApp::with_config(config);

    let response = app.get(&format!("{}/alerts", BASE)).await;

    let envelope = response.envelope();
    assert_eq!(envelope["warning"], "scheduled maintenance at 18:00");
}
